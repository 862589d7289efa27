//! Harness error type.

use logsum_core::{NestedSession, SumError};
use thiserror::Error;

pub type BenchResult<T> = Result<T, BenchError>;

/// Errors from configuring or running a benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown variant `{0}`")]
    UnknownVariant(String),

    #[error(transparent)]
    Sum(#[from] SumError),

    #[error("profiler: {0}")]
    Profile(#[from] NestedSession),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
