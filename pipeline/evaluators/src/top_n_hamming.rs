use crate::scorer::{check_row, check_values, confusions_for, record, require_nominal};
use crate::top_n::check_ns;
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
    /// Matching label values summed over rows, one entry per n.
    agreements: Vec<usize>,
    total: usize,
    confusions: Option<Vec<ConfusionMatrix>>,
}

/// Like [`TopN`](crate::TopN), but partially credits the closest of the n
/// best predictions: the score for n is the fraction of label values that
/// candidate gets right, averaged over rows.
///
/// For n = 1 this is the Hamming score of the best prediction.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct TopNHamming {
    ns: Vec<usize>,
    largest: usize,
    batch: Option<Batch>,
}

impl TopNHamming {
    pub fn new(ns: Vec<usize>) -> Result<Self, EvalError> {
        let largest = check_ns(ScorerKind::TopNHamming, &ns)?;
        Ok(TopNHamming {
            ns,
            largest,
            batch: None,
        })
    }

    pub fn ns(&self) -> &[usize] {
        &self.ns
    }
}

/// The candidate agreeing with `target` in the most positions. The earliest
/// one wins ties.
fn closest<'a, F: Float>(target: &Vector<F>, candidates: &'a [Vector<F>]) -> Option<(&'a Vector<F>, usize)> {
    let mut best: Option<(&Vector<F>, usize)> = None;
    for candidate in candidates {
        let agreement = candidate.agreement(target);
        match best {
            Some((_, b)) if b >= agreement => {}
            _ => best = Some((candidate, agreement)),
        }
    }
    best
}

impl<F: Float> Evaluator<F> for TopNHamming {
    fn kind(&self) -> ScorerKind {
        ScorerKind::TopNHamming
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn max_desired_size(&self) -> usize {
        self.largest
    }

    fn start_batch(&mut self, labels: &Schema) -> Result<(), EvalError> {
        require_nominal(ScorerKind::TopNHamming, labels)?;
        if labels.is_empty() {
            return Err(EvalError::Config(
                "TopNHamming needs at least one label column".to_string(),
            ));
        }
        self.batch = Some(Batch {
            labels: labels.clone(),
            agreements: vec![0; self.ns.len()],
            total: 0,
            confusions: (self.ns.len() == 1).then(|| confusions_for(labels.iter())),
        });
        Ok(())
    }

    fn evaluate(&mut self, target: &Vector<F>, predictions: &[Vector<F>]) -> Result<(), EvalError> {
        let batch = self
            .batch
            .as_mut()
            .ok_or(EvalError::NotStarted(ScorerKind::TopNHamming))?;
        let top = &predictions[..predictions.len().min(self.largest)];
        check_row(batch.labels.len(), target, top)?;
        check_values(&batch.labels, target, top)?;

        for (i, &n) in self.ns.iter().enumerate() {
            let candidates = &top[..top.len().min(n)];
            let Some((best, agreement)) = closest(target, candidates) else {
                return Err(EvalError::EmptyPredictions);
            };
            if let Some(confusions) = batch.confusions.as_mut() {
                for (c, (column, confusion)) in
                    batch.labels.iter().zip(confusions.iter_mut()).enumerate()
                {
                    record(confusion, column, target.value(c), best.value(c))?;
                }
            }
            batch.agreements[i] += agreement;
        }
        batch.total += 1;
        Ok(())
    }

    fn calc_scores(&self) -> Result<Vec<F>, EvalError> {
        match &self.batch {
            Some(batch) if batch.total > 0 => {
                let slots = F::from_count(batch.total) * F::from_count(batch.labels.len());
                Ok(batch
                    .agreements
                    .iter()
                    .map(|&a| F::from_count(a) / slots)
                    .collect())
            }
            _ => Err(EvalError::NoInstances),
        }
    }

    fn calc_confusions(&self) -> Option<Vec<ConfusionMatrix>> {
        self.batch.as_ref().and_then(|b| b.confusions.clone())
    }
}
