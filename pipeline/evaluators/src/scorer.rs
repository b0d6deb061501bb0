use crate::{
    Accuracy, AccuracyOfGroup, AccuracyPerColumn, ConfusionMatrix, EvalError, Mse,
    RelativeEntropy, TopN, TopNHamming,
};
use std::fmt::{Display, Formatter};
use tabkit_helpers::{Column, DataError, Float, Schema, Vector};

/// Identifies an evaluator type. Ordered by name, which is the order
/// evaluation results are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum ScorerKind {
    Accuracy,
    AccuracyOfGroup,
    AccuracyPerColumn,
    Mse,
    RelativeEntropy,
    TopN,
    TopNHamming,
}

impl ScorerKind {
    pub fn name(self) -> &'static str {
        match self {
            ScorerKind::Accuracy => "Accuracy",
            ScorerKind::AccuracyOfGroup => "AccuracyOfGroup",
            ScorerKind::AccuracyPerColumn => "AccuracyPerColumn",
            ScorerKind::Mse => "MSE",
            ScorerKind::RelativeEntropy => "RelativeEntropy",
            ScorerKind::TopN => "TopN",
            ScorerKind::TopNHamming => "TopNHamming",
        }
    }
}

impl Display for ScorerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Scores ranked predictions against targets, one batch at a time.
///
/// A batch starts with `start_batch`, which resets all counters and checks
/// the label metadata, then receives any number of `evaluate` calls.
/// `calc_scores` and `calc_confusions` report on everything evaluated since.
pub trait Evaluator<F: Float> {
    fn kind(&self) -> ScorerKind;

    fn higher_is_better(&self) -> bool;

    /// How many ranked predictions per row this evaluator can use.
    fn max_desired_size(&self) -> usize;

    fn start_batch(&mut self, labels: &Schema) -> Result<(), EvalError>;

    /// Accumulates one row. `predictions` are best first and must not be empty.
    fn evaluate(&mut self, target: &Vector<F>, predictions: &[Vector<F>]) -> Result<(), EvalError>;

    fn calc_scores(&self) -> Result<Vec<F>, EvalError>;

    /// One matrix per tracked label column, for evaluators that build them.
    fn calc_confusions(&self) -> Option<Vec<ConfusionMatrix>>;
}

/// Fails with `ContinuousLabels` unless every label column is nominal.
pub(crate) fn require_nominal(kind: ScorerKind, labels: &Schema) -> Result<(), EvalError> {
    match labels.iter().find(|c| c.is_continuous()) {
        Some(column) => Err(EvalError::ContinuousLabels {
            evaluator: kind,
            column: column.name().to_string(),
        }),
        None => Ok(()),
    }
}

/// Checks a target and the predictions an evaluator is about to look at.
pub(crate) fn check_row<F: Float>(
    width: usize,
    target: &Vector<F>,
    predictions: &[Vector<F>],
) -> Result<(), EvalError> {
    if predictions.is_empty() {
        return Err(EvalError::EmptyPredictions);
    }
    for v in std::iter::once(target).chain(predictions) {
        if v.len() != width {
            return Err(DataError::WidthMismatch {
                expected: width,
                actual: v.len(),
            }
            .into());
        }
    }
    Ok(())
}

/// Checks every value of the target and the predictions against its label
/// column, so that a rejected row never reaches the counters.
pub(crate) fn check_values<F: Float>(
    labels: &Schema,
    target: &Vector<F>,
    predictions: &[Vector<F>],
) -> Result<(), EvalError> {
    for v in std::iter::once(target).chain(predictions) {
        for (c, column) in labels.iter().enumerate() {
            column.check_value(v.value(c))?;
        }
    }
    Ok(())
}

pub(crate) fn confusions_for<'a, I>(columns: I) -> Vec<ConfusionMatrix>
where
    I: IntoIterator<Item = &'a Column>,
{
    columns
        .into_iter()
        .map(|c| ConfusionMatrix::new(c.name()))
        .collect()
}

/// Records one target/prediction pair of a nominal column.
pub(crate) fn record<F: Float>(
    confusion: &mut ConfusionMatrix,
    column: &Column,
    target: Option<F>,
    predicted: Option<F>,
) -> Result<(), EvalError> {
    let target = column.value_label(target)?;
    let predicted = column.value_label(predicted)?;
    confusion.increment(&target, &predicted);
    Ok(())
}

pub(crate) fn fraction<F: Float>(count: usize, total: usize) -> F {
    F::from_count(count) / F::from_count(total)
}

/// The closed set of evaluators a runner can drive.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum Scorer<F: Float> {
    Accuracy(Accuracy),
    AccuracyOfGroup(AccuracyOfGroup),
    AccuracyPerColumn(AccuracyPerColumn),
    Mse(Mse<F>),
    RelativeEntropy(RelativeEntropy<F>),
    TopN(TopN),
    TopNHamming(TopNHamming),
}

macro_rules! dispatch {
    ($self:ident, $e:ident => $body:expr) => {
        match $self {
            Scorer::Accuracy($e) => $body,
            Scorer::AccuracyOfGroup($e) => $body,
            Scorer::AccuracyPerColumn($e) => $body,
            Scorer::Mse($e) => $body,
            Scorer::RelativeEntropy($e) => $body,
            Scorer::TopN($e) => $body,
            Scorer::TopNHamming($e) => $body,
        }
    };
}

impl<F: Float> Evaluator<F> for Scorer<F> {
    fn kind(&self) -> ScorerKind {
        dispatch!(self, e => Evaluator::<F>::kind(e))
    }

    fn higher_is_better(&self) -> bool {
        dispatch!(self, e => Evaluator::<F>::higher_is_better(e))
    }

    fn max_desired_size(&self) -> usize {
        dispatch!(self, e => Evaluator::<F>::max_desired_size(e))
    }

    fn start_batch(&mut self, labels: &Schema) -> Result<(), EvalError> {
        dispatch!(self, e => Evaluator::<F>::start_batch(e, labels))
    }

    fn evaluate(&mut self, target: &Vector<F>, predictions: &[Vector<F>]) -> Result<(), EvalError> {
        dispatch!(self, e => Evaluator::<F>::evaluate(e, target, predictions))
    }

    fn calc_scores(&self) -> Result<Vec<F>, EvalError> {
        dispatch!(self, e => Evaluator::<F>::calc_scores(e))
    }

    fn calc_confusions(&self) -> Option<Vec<ConfusionMatrix>> {
        dispatch!(self, e => Evaluator::<F>::calc_confusions(e))
    }
}

impl<F: Float> From<Accuracy> for Scorer<F> {
    fn from(e: Accuracy) -> Self {
        Scorer::Accuracy(e)
    }
}

impl<F: Float> From<AccuracyOfGroup> for Scorer<F> {
    fn from(e: AccuracyOfGroup) -> Self {
        Scorer::AccuracyOfGroup(e)
    }
}

impl<F: Float> From<AccuracyPerColumn> for Scorer<F> {
    fn from(e: AccuracyPerColumn) -> Self {
        Scorer::AccuracyPerColumn(e)
    }
}

impl<F: Float> From<Mse<F>> for Scorer<F> {
    fn from(e: Mse<F>) -> Self {
        Scorer::Mse(e)
    }
}

impl<F: Float> From<RelativeEntropy<F>> for Scorer<F> {
    fn from(e: RelativeEntropy<F>) -> Self {
        Scorer::RelativeEntropy(e)
    }
}

impl<F: Float> From<TopN> for Scorer<F> {
    fn from(e: TopN) -> Self {
        Scorer::TopN(e)
    }
}

impl<F: Float> From<TopNHamming> for Scorer<F> {
    fn from(e: TopNHamming) -> Self {
        Scorer::TopNHamming(e)
    }
}
