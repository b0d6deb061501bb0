use crate::FilterKind;
use tabkit_helpers::DataError;
use thiserror::Error;

/// Errors raised while training or applying a filter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error(transparent)]
    Data(#[from] DataError),
    /// The filter does not implement the requested direction on this call path.
    #[error("{filter} does not support {operation}")]
    Unsupported {
        filter: FilterKind,
        operation: &'static str,
    },
    #[error("{0} was used before it was initialized")]
    NotInitialized(FilterKind),
    #[error("invalid filter configuration: {0}")]
    Config(String),
}
