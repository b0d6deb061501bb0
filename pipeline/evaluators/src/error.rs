use crate::ScorerKind;
use tabkit_filters::FilterError;
use tabkit_helpers::DataError;
use thiserror::Error;

/// Error type a learner may return from a prediction.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("invalid evaluator configuration: {0}")]
    Config(String),
    #[error("{evaluator} does not work on continuous label column \"{column}\"")]
    ContinuousLabels {
        evaluator: ScorerKind,
        column: String,
    },
    #[error("no instances have been evaluated")]
    NoInstances,
    #[error("the evaluated instances have a total weight of zero")]
    ZeroWeight,
    #[error("the learner returned no predictions")]
    EmptyPredictions,
    #[error("{0} was given a prediction before start_batch")]
    NotStarted(ScorerKind),
    #[error("the learner failed to predict")]
    Learner(#[source] BoxError),
}
