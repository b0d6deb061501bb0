use crate::scorer::{check_row, fraction, record};
use crate::{ConfusionMatrix, EvalError, Evaluator, ScorerKind};
use std::collections::BTreeSet;
use tabkit_helpers::{Column, DataError, Float, Schema, Vector};

#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
struct Batch {
    width: usize,
    /// Index and metadata of each named column, in the configured order.
    columns: Vec<(usize, Column)>,
    correct: usize,
    total: usize,
    confusions: Vec<ConfusionMatrix>,
}

/// Exact-match accuracy of the best prediction over a named group of
/// nominal label columns.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct AccuracyOfGroup {
    names: Vec<String>,
    batch: Option<Batch>,
}

impl AccuracyOfGroup {
    pub fn new<I, S>(names: I) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(EvalError::Config(
                "AccuracyOfGroup needs at least one column name".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(EvalError::Config(format!("duplicate column name \"{name}\"")));
            }
        }
        Ok(AccuracyOfGroup { names, batch: None })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl<F: Float> Evaluator<F> for AccuracyOfGroup {
    fn kind(&self) -> ScorerKind {
        ScorerKind::AccuracyOfGroup
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn max_desired_size(&self) -> usize {
        1
    }

    fn start_batch(&mut self, labels: &Schema) -> Result<(), EvalError> {
        let mut columns = Vec::with_capacity(self.names.len());
        for name in &self.names {
            let c = labels
                .column_index(name)
                .ok_or_else(|| DataError::UnknownColumn(name.clone()))?;
            let column = labels.column(c)?;
            if column.is_continuous() {
                return Err(EvalError::ContinuousLabels {
                    evaluator: ScorerKind::AccuracyOfGroup,
                    column: name.clone(),
                });
            }
            columns.push((c, column.clone()));
        }
        self.batch = Some(Batch {
            width: labels.len(),
            confusions: columns
                .iter()
                .map(|(_, column)| ConfusionMatrix::new(column.name()))
                .collect(),
            columns,
            correct: 0,
            total: 0,
        });
        Ok(())
    }

    fn evaluate(&mut self, target: &Vector<F>, predictions: &[Vector<F>]) -> Result<(), EvalError> {
        let batch = self
            .batch
            .as_mut()
            .ok_or(EvalError::NotStarted(ScorerKind::AccuracyOfGroup))?;
        let best = &predictions[..predictions.len().min(1)];
        check_row(batch.width, target, best)?;
        let prediction = &best[0];

        for (c, column) in &batch.columns {
            column.check_value(target.value(*c))?;
            column.check_value(prediction.value(*c))?;
        }
        let mut all_match = true;
        for ((c, column), confusion) in batch.columns.iter().zip(batch.confusions.iter_mut()) {
            record(confusion, column, target.value(*c), prediction.value(*c))?;
            all_match &= target.value(*c) == prediction.value(*c);
        }
        if all_match {
            batch.correct += 1;
        }
        batch.total += 1;
        Ok(())
    }

    fn calc_scores(&self) -> Result<Vec<F>, EvalError> {
        match &self.batch {
            Some(batch) if batch.total > 0 => Ok(vec![fraction(batch.correct, batch.total)]),
            _ => Err(EvalError::NoInstances),
        }
    }

    fn calc_confusions(&self) -> Option<Vec<ConfusionMatrix>> {
        self.batch.as_ref().map(|b| b.confusions.clone())
    }
}
