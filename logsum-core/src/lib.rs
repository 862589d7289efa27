//! # logsum-core
//!
//! Five ways of computing the alternating-sign sum of natural logarithms
//!
//! ```text
//! S(x) = ln x[1] - ln x[2] + ln x[3] - ln x[4] + ...
//! ```
//!
//! All variants return the same value up to rounding. They differ only in how
//! they materialize the sign and log arrays, which is what the benchmark
//! harness in `logsum-bench` measures:
//!
//! - **iterative**: one pass with a scalar accumulator.
//! - **functional**: per-element callable through a generic map, then sum.
//! - **naive_sign**: sign array built by evaluating an expression once per
//!   element (`replicate`), then multiply and sum.
//! - **recycled**: `[+1, -1]` pattern broadcast across the log array.
//! - **filled_sign**: sign array built by a direct constant fill, then
//!   multiply and sum.

pub mod error;
pub mod frames;
pub mod primitives;
pub mod sequence;
pub mod variants;

pub use error::{SumError, SumResult};
pub use frames::{FrameGuard, NestedSession};
pub use primitives::{fill, map_indexed, replicate};
pub use sequence::InputSequence;
pub use variants::{
    approx_eq, filled_sign, find_variant, functional, iterative, log_array, naive_sign, recycled,
    validate, Variant, VariantFn, DEFAULT_TOLERANCE, VARIANTS,
};
