use crate::scorer::{check_row, check_values, confusions_for, fraction, record, require_nominal};
use crate::{ConfusionMatrix, EvalError, Evaluator, ScorerKind};
use tabkit_helpers::{Float, Schema, Vector};

#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
struct Batch {
    labels: Schema,
    correct: Vec<usize>,
    total: usize,
    confusions: Vec<ConfusionMatrix>,
}

/// Accuracy of the best prediction, one score per label column.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct AccuracyPerColumn {
    batch: Option<Batch>,
}

impl AccuracyPerColumn {
    pub fn new() -> Self {
        AccuracyPerColumn { batch: None }
    }
}

impl<F: Float> Evaluator<F> for AccuracyPerColumn {
    fn kind(&self) -> ScorerKind {
        ScorerKind::AccuracyPerColumn
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn max_desired_size(&self) -> usize {
        1
    }

    fn start_batch(&mut self, labels: &Schema) -> Result<(), EvalError> {
        require_nominal(ScorerKind::AccuracyPerColumn, labels)?;
        self.batch = Some(Batch {
            labels: labels.clone(),
            correct: vec![0; labels.len()],
            total: 0,
            confusions: confusions_for(labels.iter()),
        });
        Ok(())
    }

    fn evaluate(&mut self, target: &Vector<F>, predictions: &[Vector<F>]) -> Result<(), EvalError> {
        let batch = self
            .batch
            .as_mut()
            .ok_or(EvalError::NotStarted(ScorerKind::AccuracyPerColumn))?;
        let best = &predictions[..predictions.len().min(1)];
        check_row(batch.labels.len(), target, best)?;
        check_values(&batch.labels, target, best)?;
        let prediction = &best[0];

        for (c, (column, confusion)) in batch.labels.iter().zip(&mut batch.confusions).enumerate() {
            record(confusion, column, target.value(c), prediction.value(c))?;
            if target.value(c) == prediction.value(c) {
                batch.correct[c] += 1;
            }
        }
        batch.total += 1;
        Ok(())
    }

    fn calc_scores(&self) -> Result<Vec<F>, EvalError> {
        match &self.batch {
            Some(batch) if batch.total > 0 => Ok(batch
                .correct
                .iter()
                .map(|&correct| fraction(correct, batch.total))
                .collect()),
            _ => Err(EvalError::NoInstances),
        }
    }

    fn calc_confusions(&self) -> Option<Vec<ConfusionMatrix>> {
        self.batch.as_ref().map(|b| b.confusions.clone())
    }
}
