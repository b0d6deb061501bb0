use crate::{ConfusionMatrix, ScorerKind};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use tabkit_helpers::Float;

/// Formats a score with at most five decimals and no trailing zeros.
pub(crate) fn format_score(score: f64) -> String {
    let text = format!("{score:.5}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// What one evaluator reported at the end of a run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct EvaluatorResult<F: Float> {
    pub scores: Vec<F>,
    pub confusions: Option<Vec<ConfusionMatrix>>,
    pub higher_is_better: bool,
}

/// Results of an evaluation run, keyed by evaluator type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Evaluation<F: Float> {
    results: BTreeMap<ScorerKind, EvaluatorResult<F>>,
}

impl<F: Float> Default for Evaluation<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Evaluation<F> {
    pub fn new() -> Self {
        Evaluation {
            results: BTreeMap::new(),
        }
    }

    /// Stores the result for `kind`, returning any previous one.
    pub fn insert(&mut self, kind: ScorerKind, result: EvaluatorResult<F>) -> Option<EvaluatorResult<F>> {
        self.results.insert(kind, result)
    }

    pub fn result(&self, kind: ScorerKind) -> Option<&EvaluatorResult<F>> {
        self.results.get(&kind)
    }

    pub fn scores(&self, kind: ScorerKind) -> Option<&[F]> {
        self.result(kind).map(|r| r.scores.as_slice())
    }

    /// `None` when `kind` is missing or did not build confusion matrices.
    pub fn confusions(&self, kind: ScorerKind) -> Option<&[ConfusionMatrix]> {
        self.result(kind).and_then(|r| r.confusions.as_deref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = ScorerKind> + '_ {
        self.results.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScorerKind, &EvaluatorResult<F>)> {
        self.results.iter().map(|(&k, r)| (k, r))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// `Accuracy=[0.8], TopN=[0.8, 1]`, sorted by evaluator name.
impl<F: Float> Display for Evaluation<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, (kind, result)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let scores: Vec<String> = result
                .scores
                .iter()
                .map(|s| format_score(s.to_report()))
                .collect();
            write!(f, "{}=[{}]", kind, scores.join(", "))?;
        }
        Ok(())
    }
}
