//! Reversible transforms applied to a dataset before a learner sees it.
//!
//! A [`FilterChain`] composes [`FilterStage`]s: the forward direction runs
//! outer to inner, the inverse direction (applied to predictions) runs inner
//! to outer, so `unfilter_label(filter_label(x)) == x` for every stage that
//! supports both directions.

mod chain;
mod config;
mod error;
mod mean_mode;
mod nominal_to_categorical;
mod normalize;
mod reorder_outputs;
mod stage;

pub use chain::FilterChain;
pub use config::FilterSpec;
pub use error::FilterError;
pub use mean_mode::MeanModeUnknownFiller;
pub use nominal_to_categorical::NominalToCategorical;
pub use normalize::{Normalize, BASE, RANGE};
pub use reorder_outputs::{OutputOrder, ReorderOutputs, REVERSE_TOKEN};
pub use stage::{Filter, FilterKind, FilterStage};
