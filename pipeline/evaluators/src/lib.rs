//! Batch scoring of ranked predictions.
//!
//! Every [`Evaluator`] sees the whole batch through the same protocol:
//! `start_batch` once with the label schema, `evaluate` once per row with the
//! target and the learner's predictions (best first), then `calc_scores` and
//! `calc_confusions`. [`EvaluationRunner`] drives several of them at once
//! against a [`Learner`] and gathers the results in an [`Evaluation`].

mod accuracy_of_group;
mod accuracy_per_column;
mod config;
mod confusion;
mod error;
mod evaluation;
mod mse;
mod relative_entropy;
mod runner;
mod scorer;
mod top_n;
mod top_n_hamming;

pub use accuracy_of_group::AccuracyOfGroup;
pub use accuracy_per_column::AccuracyPerColumn;
pub use config::ScorerSpec;
pub use confusion::ConfusionMatrix;
pub use error::{BoxError, EvalError};
pub use evaluation::{Evaluation, EvaluatorResult};
pub use mse::Mse;
pub use relative_entropy::RelativeEntropy;
pub use runner::{EvaluationRunner, FilteredLearner, Learner, RankedModel};
pub use scorer::{Evaluator, Scorer, ScorerKind};
pub use top_n::{Accuracy, TopN};
pub use top_n_hamming::TopNHamming;
