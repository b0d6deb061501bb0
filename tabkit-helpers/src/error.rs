use thiserror::Error;

/// Data-shape and metadata errors raised while building or reading a dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("expected a vector of width {expected}, but got width {actual}")]
    WidthMismatch { expected: usize, actual: usize },
    #[error("nominal value {value} in column \"{column}\" is negative")]
    NegativeNominal { column: String, value: f64 },
    #[error("nominal value {value} in column \"{column}\" is out of range (value count {count})")]
    NominalOutOfRange {
        column: String,
        value: f64,
        count: usize,
    },
    #[error("nominal column \"{column}\" needs at least 2 values, got {count}")]
    TooFewValues { column: String, count: usize },
    #[error("column \"{column}\" is continuous where a nominal column is required")]
    NotNominal { column: String },
    #[error("no column named \"{0}\"")]
    UnknownColumn(String),
    #[error("column {index} is out of range for a schema of width {width}")]
    ColumnOutOfRange { index: usize, width: usize },
    #[error("cannot split {requested} label columns from a dataset of width {width}")]
    InvalidSplit { requested: usize, width: usize },
    #[error("unexpected unknown value at position {index}")]
    UnexpectedUnknown { index: usize },
}
