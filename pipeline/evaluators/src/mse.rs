use crate::scorer::check_row;
use crate::{ConfusionMatrix, EvalError, Evaluator, ScorerKind};
use tabkit_helpers::{DataError, Float, Schema, Vector};

/// Weighted sums shared by the error-style evaluators.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub(crate) struct WeightedMean<F> {
    width: usize,
    sum: F,
    weight: F,
    rows: usize,
}

impl<F: Float> WeightedMean<F> {
    pub(crate) fn new(width: usize) -> Self {
        WeightedMean {
            width,
            sum: F::zero(),
            weight: F::zero(),
            rows: 0,
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn add(&mut self, error: F, weight: F) {
        self.sum += error * weight;
        self.weight += weight;
        self.rows += 1;
    }

    pub(crate) fn mean(&self) -> Result<F, EvalError> {
        if self.rows == 0 {
            return Err(EvalError::NoInstances);
        }
        if self.weight == F::zero() {
            return Err(EvalError::ZeroWeight);
        }
        Ok(self.sum / self.weight)
    }
}

/// Pairs up the known values of two equally wide vectors.
pub(crate) fn known_pairs<F: Float>(
    target: &Vector<F>,
    prediction: &Vector<F>,
) -> Result<Vec<(F, F)>, EvalError> {
    target
        .iter()
        .zip(prediction.iter())
        .enumerate()
        .map(|(index, pair)| match pair {
            (Some(t), Some(p)) => Ok((t, p)),
            _ => Err(DataError::UnexpectedUnknown { index }.into()),
        })
        .collect()
}

/// Mean squared error of the best prediction, averaged over label values
/// and then over rows weighted by each target's instance weight.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Mse<F: Float> {
    batch: Option<WeightedMean<F>>,
}

impl<F: Float> Mse<F> {
    pub fn new() -> Self {
        Mse { batch: None }
    }
}

impl<F: Float> Evaluator<F> for Mse<F> {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Mse
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn max_desired_size(&self) -> usize {
        1
    }

    fn start_batch(&mut self, labels: &Schema) -> Result<(), EvalError> {
        self.batch = Some(WeightedMean::new(labels.len()));
        Ok(())
    }

    fn evaluate(&mut self, target: &Vector<F>, predictions: &[Vector<F>]) -> Result<(), EvalError> {
        let batch = self.batch.as_mut().ok_or(EvalError::NotStarted(ScorerKind::Mse))?;
        let best = &predictions[..predictions.len().min(1)];
        check_row(batch.width(), target, best)?;

        let pairs = known_pairs(target, &best[0])?;
        let squared: F = pairs.iter().map(|&(t, p)| (t - p) * (t - p)).sum();
        let error = if pairs.is_empty() {
            F::zero()
        } else {
            squared / F::from_count(pairs.len())
        };
        batch.add(error, target.weight());
        Ok(())
    }

    fn calc_scores(&self) -> Result<Vec<F>, EvalError> {
        let batch = self.batch.as_ref().ok_or(EvalError::NoInstances)?;
        Ok(vec![batch.mean()?])
    }

    fn calc_confusions(&self) -> Option<Vec<ConfusionMatrix>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use tabkit_helpers::Column;

    fn two_outputs() -> Schema {
        Schema::new(vec![Column::continuous("y1"), Column::continuous("y2")])
    }

    #[test]
    fn test_mean_over_values_then_rows() {
        let mut mse = Mse::new();
        mse.start_batch(&two_outputs()).unwrap();
        mse.evaluate(&Vector::from_known(vec![0.0, 0.0]), &[Vector::from_known(vec![0.0, 1.0])])
            .unwrap();
        mse.evaluate(&Vector::from_known(vec![1.0, 1.0]), &[Vector::from_known(vec![1.0, 1.0])])
            .unwrap();
        assert_abs_diff_eq!(mse.calc_scores().unwrap()[0], 0.25);
        assert!(!mse.higher_is_better());
        assert!(mse.calc_confusions().is_none());
    }

    #[test]
    fn test_instance_weights() {
        let mut mse = Mse::new();
        mse.start_batch(&two_outputs()).unwrap();
        let heavy = Vector::with_weight(array![Some(0.0), Some(0.0)], 3.0);
        mse.evaluate(&heavy, &[Vector::from_known(vec![2.0, 0.0])]).unwrap();
        mse.evaluate(&Vector::from_known(vec![1.0, 1.0]), &[Vector::from_known(vec![1.0, 1.0])])
            .unwrap();
        // (2.0 * 3 + 0.0 * 1) / 4
        assert_abs_diff_eq!(mse.calc_scores().unwrap()[0], 1.5);
    }

    #[test]
    fn test_only_the_best_prediction_counts() {
        let mut mse = Mse::new();
        mse.start_batch(&two_outputs()).unwrap();
        mse.evaluate(
            &Vector::from_known(vec![1.0, 1.0]),
            &[Vector::from_known(vec![1.0, 3.0]), Vector::from_known(vec![1.0, 1.0])],
        )
        .unwrap();
        assert_abs_diff_eq!(mse.calc_scores().unwrap()[0], 2.0);
    }

    #[test]
    fn test_unknowns_and_empty_batches() {
        let mut mse: Mse<f64> = Mse::new();
        assert!(matches!(mse.calc_scores(), Err(EvalError::NoInstances)));
        mse.start_batch(&two_outputs()).unwrap();
        assert!(matches!(mse.calc_scores(), Err(EvalError::NoInstances)));
        assert!(matches!(
            mse.evaluate(
                &Vector::from_options(vec![Some(1.0), None]),
                &[Vector::from_known(vec![1.0, 1.0])]
            ),
            Err(EvalError::Data(DataError::UnexpectedUnknown { index: 1 }))
        ));
    }

    #[test]
    fn test_zero_total_weight() {
        let mut mse = Mse::new();
        mse.start_batch(&two_outputs()).unwrap();
        let weightless = Vector::with_weight(array![Some(1.0), Some(0.0)], 0.0);
        mse.evaluate(&weightless, &[Vector::from_known(vec![0.0, 0.0])]).unwrap();
        assert!(matches!(mse.calc_scores(), Err(EvalError::ZeroWeight)));

        mse.evaluate(&Vector::from_known(vec![1.0, 1.0]), &[Vector::from_known(vec![1.0, 0.0])])
            .unwrap();
        assert_abs_diff_eq!(mse.calc_scores().unwrap()[0], 0.5);
    }
}
