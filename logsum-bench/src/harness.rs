//! Replicated timing of summation variants.
//!
//! Each invocation is bracketed by its own `Instant` read, so a sample
//! covers exactly one call. Variants run one after another on the calling
//! thread against the same borrowed input.

use std::hint::black_box;
use std::time::{Duration, Instant};

use logsum_core::{InputSequence, SumError, Variant};
use tracing::{debug, info, warn};

use crate::config::BenchConfig;
use crate::error::BenchResult;
use crate::report::{format_duration, Report};

/// Wall-clock duration of one invocation of one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimingSample {
    pub elapsed: Duration,
}

/// Samples and result value for a variant that completed every run.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub samples: Vec<TimingSample>,
    /// Value returned by the last invocation.
    pub value: f64,
}

impl Measurement {
    #[inline]
    pub fn replications(&self) -> usize {
        self.samples.len()
    }

    /// Sum of all samples.
    pub fn total(&self) -> Duration {
        self.samples.iter().map(|s| s.elapsed).sum()
    }

    pub fn mean(&self) -> Duration {
        match u32::try_from(self.samples.len()) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total() / count,
            Err(_) => self.total().div_f64(self.samples.len() as f64),
        }
    }

    pub fn min(&self) -> Duration {
        self.samples.iter().map(|s| s.elapsed).min().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().map(|s| s.elapsed).max().unwrap_or_default()
    }

    /// Median sample (lower middle for an even count).
    pub fn median(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<Duration> = self.samples.iter().map(|s| s.elapsed).collect();
        sorted.sort_unstable();
        sorted[(sorted.len() - 1) / 2]
    }
}

/// Result of benchmarking one variant.
#[derive(Debug, Clone)]
pub enum Outcome {
    Measured(Measurement),
    /// The variant returned an error; its measurement was abandoned.
    Failed(SumError),
}

/// One row of a [`Report`].
#[derive(Debug, Clone)]
pub struct VariantReport {
    pub name: &'static str,
    pub expression: &'static str,
    pub outcome: Outcome,
    /// 1-based rank by mean time. `None` for failed variants.
    pub rank: Option<usize>,
    /// Mean time divided by the fastest mean. `None` for failed variants.
    pub relative: Option<f64>,
}

impl VariantReport {
    pub fn measurement(&self) -> Option<&Measurement> {
        match &self.outcome {
            Outcome::Measured(m) => Some(m),
            Outcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SumError> {
        match &self.outcome {
            Outcome::Failed(e) => Some(e),
            Outcome::Measured(_) => None,
        }
    }
}

/// Runs variants according to a [`BenchConfig`].
#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: BenchConfig,
}

impl Harness {
    /// Validate `config` and build a harness for it.
    ///
    /// Rejects, among others, `replications == 0`: every measured variant
    /// must produce at least one sample.
    pub fn new(config: BenchConfig) -> BenchResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Measure every variant against `input` and rank the results.
    ///
    /// A failing variant is recorded as [`Outcome::Failed`] and does not stop
    /// the others.
    pub fn run(&self, variants: &[Variant], input: &InputSequence) -> Report {
        info!(
            n = input.len(),
            variants = variants.len(),
            replications = self.config.replications,
            "starting benchmark run"
        );
        let entries = variants
            .iter()
            .map(|variant| VariantReport {
                name: variant.name,
                expression: variant.expression,
                outcome: self.measure(variant, input.as_slice()),
                rank: None,
                relative: None,
            })
            .collect();
        Report::new(input.len(), entries)
    }

    /// Warm up, then time `replications` consecutive invocations.
    pub fn measure(&self, variant: &Variant, ind: &[f64]) -> Outcome {
        let replications = self.config.replications;
        debug!(
            variant = variant.name,
            warmup = self.config.warmup,
            replications,
            "measuring"
        );

        for _ in 0..self.config.warmup {
            if let Err(err) = variant.call(black_box(ind)) {
                warn!(variant = variant.name, %err, "variant failed during warm-up");
                return Outcome::Failed(err);
            }
        }

        let mut samples = Vec::with_capacity(replications);
        let mut value = f64::NAN;
        for _ in 0..replications {
            let start = Instant::now();
            let result = variant.call(black_box(ind));
            let elapsed = start.elapsed();
            match result {
                Ok(v) => value = black_box(v),
                Err(err) => {
                    warn!(variant = variant.name, %err, "variant failed, measurement abandoned");
                    return Outcome::Failed(err);
                }
            }
            samples.push(TimingSample { elapsed });
        }

        let measurement = Measurement { samples, value };
        info!(
            variant = variant.name,
            mean = %format_duration(measurement.mean()),
            total = %format_duration(measurement.total()),
            value,
            "measured"
        );
        Outcome::Measured(measurement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(nanos: &[u64]) -> Measurement {
        Measurement {
            samples: nanos
                .iter()
                .map(|&n| TimingSample {
                    elapsed: Duration::from_nanos(n),
                })
                .collect(),
            value: 0.0,
        }
    }

    #[test]
    fn test_measurement_statistics() {
        let m = measurement(&[40, 10, 30, 20]);
        assert_eq!(m.replications(), 4);
        assert_eq!(m.total(), Duration::from_nanos(100));
        assert_eq!(m.mean(), Duration::from_nanos(25));
        assert_eq!(m.min(), Duration::from_nanos(10));
        assert_eq!(m.max(), Duration::from_nanos(40));
        assert_eq!(m.median(), Duration::from_nanos(20));
    }

    #[test]
    fn test_empty_measurement_is_zero() {
        let m = measurement(&[]);
        assert_eq!(m.mean(), Duration::ZERO);
        assert_eq!(m.median(), Duration::ZERO);
    }

    #[test]
    fn test_measure_records_exact_replications() {
        let harness = Harness::new(BenchConfig {
            replications: 7,
            warmup: 2,
            ..Default::default()
        })
        .unwrap();
        let variant = logsum_core::find_variant("iterative").unwrap();
        match harness.measure(variant, &[1.0, 2.0, 3.0]) {
            Outcome::Measured(m) => {
                assert_eq!(m.replications(), 7);
                let summed: Duration = m.samples.iter().map(|s| s.elapsed).sum();
                assert_eq!(m.total(), summed);
            }
            Outcome::Failed(e) => panic!("unexpected failure: {e}"),
        }
    }

    #[test]
    fn test_new_rejects_zero_replications() {
        let err = Harness::new(BenchConfig {
            replications: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, crate::BenchError::Config(_)));
    }

    #[test]
    fn test_measure_domain_error() {
        let harness = Harness::default();
        let variant = logsum_core::find_variant("recycled").unwrap();
        let outcome = harness.measure(variant, &[1.0, -2.0]);
        assert!(matches!(outcome, Outcome::Failed(SumError::Domain { index: 1, .. })));
    }
}
