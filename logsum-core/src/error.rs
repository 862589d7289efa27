//! Error type shared by every summation variant.

use thiserror::Error;

/// Result alias for summation operations.
pub type SumResult<T> = Result<T, SumError>;

/// Errors raised by the summation variants.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SumError {
    /// The input sequence had no elements.
    ///
    /// The empty sum is mathematically 0, but an empty input almost always
    /// means the caller built the wrong sequence, so it is rejected.
    #[error("input sequence is empty")]
    EmptyInput,

    /// An element was not strictly positive, so its logarithm is undefined.
    #[error("logarithm undefined for element {index} (value {value})")]
    Domain {
        /// 0-based position of the first offending element.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// The log array could not be viewed with the recycling shape.
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl SumError {
    /// Whether this is a domain error (non-positive or NaN element).
    pub fn is_domain(&self) -> bool {
        matches!(self, SumError::Domain { .. })
    }
}
