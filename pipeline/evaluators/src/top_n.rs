use crate::scorer::{check_row, check_values, confusions_for, fraction, record, require_nominal};
use crate::{ConfusionMatrix, EvalError, Evaluator, ScorerKind};
use tabkit_helpers::{Float, Schema, Vector};

/// Checks a list of n values: it must not be empty and every n must be at
/// least 1. Returns the largest n.
pub(crate) fn check_ns(kind: ScorerKind, ns: &[usize]) -> Result<usize, EvalError> {
    if ns.contains(&0) {
        return Err(EvalError::Config(format!("{kind} needs every n to be at least 1, got {ns:?}")));
    }
    ns.iter()
        .copied()
        .max()
        .ok_or_else(|| EvalError::Config(format!("{kind} needs at least one value of n")))
}

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
    confusions: Option<Vec<ConfusionMatrix>>,
}

/// Accuracy of a ranked prediction list: a row counts as correct for a given
/// n if any of the n best predictions equals the target exactly.
///
/// With a single n, confusion matrices are kept as well. For n > 1 every
/// one of the top n predictions is recorded in them.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct TopN {
    ns: Vec<usize>,
    largest: usize,
    batch: Option<Batch>,
}

impl TopN {
    /// Scores are reported in the order of `ns`.
    pub fn new(ns: Vec<usize>) -> Result<Self, EvalError> {
        let largest = check_ns(ScorerKind::TopN, &ns)?;
        Ok(TopN {
            ns,
            largest,
            batch: None,
        })
    }

    pub fn ns(&self) -> &[usize] {
        &self.ns
    }

    fn start(&mut self, kind: ScorerKind, labels: &Schema) -> Result<(), EvalError> {
        require_nominal(kind, labels)?;
        self.batch = Some(Batch {
            labels: labels.clone(),
            correct: vec![0; self.ns.len()],
            total: 0,
            confusions: (self.ns.len() == 1).then(|| confusions_for(labels.iter())),
        });
        Ok(())
    }

    fn accumulate<F: Float>(
        &mut self,
        kind: ScorerKind,
        target: &Vector<F>,
        predictions: &[Vector<F>],
    ) -> Result<(), EvalError> {
        let ns = &self.ns;
        let batch = self.batch.as_mut().ok_or(EvalError::NotStarted(kind))?;
        let top = &predictions[..predictions.len().min(self.largest)];
        check_row(batch.labels.len(), target, top)?;
        check_values(&batch.labels, target, top)?;

        for (i, &n) in ns.iter().enumerate() {
            let candidates = &top[..top.len().min(n)];
            if candidates.iter().any(|p| p == target) {
                batch.correct[i] += 1;
            }
            if let Some(confusions) = batch.confusions.as_mut() {
                for prediction in candidates {
                    for (c, (column, confusion)) in
                        batch.labels.iter().zip(confusions.iter_mut()).enumerate()
                    {
                        record(confusion, column, target.value(c), prediction.value(c))?;
                    }
                }
            }
        }
        batch.total += 1;
        Ok(())
    }

    fn scores<F: Float>(&self) -> Result<Vec<F>, EvalError> {
        match &self.batch {
            Some(batch) if batch.total > 0 => Ok(batch
                .correct
                .iter()
                .map(|&correct| fraction(correct, batch.total))
                .collect()),
            _ => Err(EvalError::NoInstances),
        }
    }

    fn confusions(&self) -> Option<Vec<ConfusionMatrix>> {
        self.batch.as_ref().and_then(|b| b.confusions.clone())
    }
}

impl<F: Float> Evaluator<F> for TopN {
    fn kind(&self) -> ScorerKind {
        ScorerKind::TopN
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn max_desired_size(&self) -> usize {
        self.largest
    }

    fn start_batch(&mut self, labels: &Schema) -> Result<(), EvalError> {
        self.start(ScorerKind::TopN, labels)
    }

    fn evaluate(&mut self, target: &Vector<F>, predictions: &[Vector<F>]) -> Result<(), EvalError> {
        self.accumulate(ScorerKind::TopN, target, predictions)
    }

    fn calc_scores(&self) -> Result<Vec<F>, EvalError> {
        self.scores()
    }

    fn calc_confusions(&self) -> Option<Vec<ConfusionMatrix>> {
        self.confusions()
    }
}

/// Exact-match accuracy of the best prediction over whole label rows.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Accuracy {
    top: TopN,
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::new()
    }
}

impl Accuracy {
    pub fn new() -> Self {
        Accuracy {
            top: TopN {
                ns: vec![1],
                largest: 1,
                batch: None,
            },
        }
    }
}

impl<F: Float> Evaluator<F> for Accuracy {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Accuracy
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn max_desired_size(&self) -> usize {
        1
    }

    fn start_batch(&mut self, labels: &Schema) -> Result<(), EvalError> {
        self.top.start(ScorerKind::Accuracy, labels)
    }

    fn evaluate(&mut self, target: &Vector<F>, predictions: &[Vector<F>]) -> Result<(), EvalError> {
        self.top.accumulate(ScorerKind::Accuracy, target, predictions)
    }

    fn calc_scores(&self) -> Result<Vec<F>, EvalError> {
        self.top.scores()
    }

    fn calc_confusions(&self) -> Option<Vec<ConfusionMatrix>> {
        self.top.confusions()
    }
}
