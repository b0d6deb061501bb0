use crate::mse::{known_pairs, WeightedMean};
use crate::scorer::check_row;
use crate::{ConfusionMatrix, EvalError, Evaluator, ScorerKind};
use ndarray::Array1;
use tabkit_helpers::{Float, Schema, Vector};

/// Cross entropy of the best prediction after a softmax, weighted by each
/// target's instance weight: `-sum(t_i * ln(softmax(p)_i))` over the non-zero
/// target components.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct RelativeEntropy<F: Float> {
    batch: Option<WeightedMean<F>>,
}

impl<F: Float> RelativeEntropy<F> {
    pub fn new() -> Self {
        RelativeEntropy { batch: None }
    }
}

/// `ln(softmax(logits))`, shifted by the largest logit so `exp` cannot
/// overflow.
fn log_softmax<F: Float>(logits: &Array1<F>) -> Array1<F> {
    let max = logits.fold(F::neg_infinity(), |m, &x| if x > m { x } else { m });
    let shifted = logits.mapv(|x| x - max);
    let log_total = shifted.mapv(|x| x.exp()).sum().ln();
    shifted.mapv(|x| x - log_total)
}

pub(crate) fn cross_entropy<F: Float>(targets: &Array1<F>, logits: &Array1<F>) -> F {
    let log_p = log_softmax(logits);
    targets
        .iter()
        .zip(log_p.iter())
        .filter(|(t, _)| **t != F::zero())
        .fold(F::zero(), |acc, (&t, &lp)| acc - t * lp)
}

impl<F: Float> Evaluator<F> for RelativeEntropy<F> {
    fn kind(&self) -> ScorerKind {
        ScorerKind::RelativeEntropy
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
        let batch = self
            .batch
            .as_mut()
            .ok_or(EvalError::NotStarted(ScorerKind::RelativeEntropy))?;
        let best = &predictions[..predictions.len().min(1)];
        check_row(batch.width(), target, best)?;

        let (targets, logits): (Vec<F>, Vec<F>) =
            known_pairs(target, &best[0])?.into_iter().unzip();
        let error = cross_entropy(&Array1::from(targets), &Array1::from(logits));
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
