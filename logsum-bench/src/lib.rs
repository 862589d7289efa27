//! # logsum-bench
//!
//! Replicated wall-clock timing of the `logsum-core` variants, a
//! cross-variant agreement check, report rendering (table, CSV, JSON) and a
//! sampling profiler that attributes time to the stages each variant marks.

pub mod config;
pub mod error;
pub mod harness;
pub mod profile;
pub mod report;

pub use config::{BenchConfig, ProfileConfig};
pub use error::{BenchError, BenchResult};
pub use harness::{Harness, Measurement, Outcome, TimingSample, VariantReport};
pub use profile::{FrameStat, ProfileReport, Profiler};
pub use report::{format_duration, Agreement, Report};
