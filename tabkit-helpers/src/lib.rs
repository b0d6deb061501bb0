use ndarray::{NdFloat, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumCast, Signed};
use rand::distr::uniform::SampleUniform;

use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

// Include submodules
mod dataset;
mod error;
mod schema;
mod vector;

// Re-export types from submodules
pub use dataset::Dataset;
pub use error::DataError;
pub use schema::{Column, ColumnKind, Schema, UNKNOWN_VALUE_NAME};
pub use vector::Vector;

pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + SampleUniform
    + ScalarOperand
    + std::marker::Unpin
{
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }

    /// Converts a row or column count. Counts always fit in `f32`/`f64`
    /// (possibly rounded), so this never fails.
    fn from_count(n: usize) -> Self;

    /// Lossy conversion used for diagnostics and reports.
    fn to_report(self) -> f64;
}

impl Float for f32 {
    fn from_count(n: usize) -> Self {
        n as f32
    }

    fn to_report(self) -> f64 {
        self as f64
    }
}

impl Float for f64 {
    fn from_count(n: usize) -> Self {
        n as f64
    }

    fn to_report(self) -> f64 {
        self
    }
}
