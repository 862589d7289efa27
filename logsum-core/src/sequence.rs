//! Immutable input sequences shared across variant invocations.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{SumError, SumResult};
use crate::variants::validate;

/// An ordered, non-empty sequence of strictly positive values.
///
/// The harness owns one of these per run and lends `&[f64]` views to each
/// variant. There is no mutable access after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSequence {
    values: Vec<f64>,
}

impl InputSequence {
    /// Validate and wrap `values`.
    pub fn new(values: Vec<f64>) -> SumResult<Self> {
        validate(&values)?;
        Ok(Self { values })
    }

    /// The sequence `1, 2, ..., n`.
    pub fn range(n: usize) -> SumResult<Self> {
        if n == 0 {
            return Err(SumError::EmptyInput);
        }
        Ok(Self {
            values: (1..=n).map(|k| k as f64).collect(),
        })
    }

    /// `n` pseudo-random integers in `1..=max`, reproducible from `seed`.
    pub fn random(n: usize, max: u64, seed: u64) -> SumResult<Self> {
        if n == 0 {
            return Err(SumError::EmptyInput);
        }
        let max = max.max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(Self {
            values: (0..n).map(|_| rng.gen_range(1..=max) as f64).collect(),
        })
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: construction rejects empty input.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl AsRef<[f64]> for InputSequence {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl TryFrom<Vec<f64>> for InputSequence {
    type Error = SumError;

    fn try_from(values: Vec<f64>) -> SumResult<Self> {
        Self::new(values)
    }
}

impl TryFrom<&[u64]> for InputSequence {
    type Error = SumError;

    fn try_from(values: &[u64]) -> SumResult<Self> {
        Self::new(values.iter().map(|&v| v as f64).collect())
    }
}
