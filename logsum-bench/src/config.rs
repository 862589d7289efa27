//! Benchmark configuration, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the fields it
//! changes:
//!
//! ```json
//! { "n": 100000, "replications": 20, "variants": ["iterative", "naive_sign"] }
//! ```

use std::fs;
use std::path::Path;

use logsum_core::{find_variant, InputSequence, Variant, DEFAULT_TOLERANCE, VARIANTS};
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// What to run and how many times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Input length. The input is `1..=n` unless `seed` is set.
    pub n: usize,
    /// Timed invocations per variant.
    pub replications: usize,
    /// Untimed invocations per variant before timing starts.
    pub warmup: usize,
    /// Relative tolerance for the agreement check.
    pub tolerance: f64,
    /// Variant names to run, in order. Empty means all.
    pub variants: Vec<String>,
    /// Draw the input at random from `1..=n` with this seed.
    pub seed: Option<u64>,
    pub profile: Option<ProfileConfig>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            n: 50_000,
            replications: 100,
            warmup: 1,
            tolerance: DEFAULT_TOLERANCE,
            variants: Vec::new(),
            seed: None,
            profile: None,
        }
    }
}

/// Sampling-profiler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    pub variant: String,
    /// Sampling interval in microseconds.
    pub interval_us: u64,
    /// Invocations of the variant while sampling.
    pub replications: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            variant: "naive_sign".to_string(),
            interval_us: 100,
            replications: 200,
        }
    }
}

impl BenchConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(text: &str) -> BenchResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> BenchResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.n == 0 {
            return Err(BenchError::Config(
                "n must be at least 1 (an empty input hides test-input mistakes)".into(),
            ));
        }
        if self.replications == 0 {
            return Err(BenchError::Config("replications must be at least 1".into()));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(BenchError::Config(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        self.selected_variants()?;
        if let Some(profile) = &self.profile {
            if find_variant(&profile.variant).is_none() {
                return Err(BenchError::UnknownVariant(profile.variant.clone()));
            }
            if profile.interval_us == 0 {
                return Err(BenchError::Config("profile interval must be non-zero".into()));
            }
            if profile.replications == 0 {
                return Err(BenchError::Config(
                    "profile replications must be at least 1".into(),
                ));
            }
        }
        Ok(())
    }

    /// Resolve `variants` against the registry, preserving order.
    pub fn selected_variants(&self) -> BenchResult<Vec<Variant>> {
        if self.variants.is_empty() {
            return Ok(VARIANTS.to_vec());
        }
        self.variants
            .iter()
            .map(|name| {
                find_variant(name)
                    .copied()
                    .ok_or_else(|| BenchError::UnknownVariant(name.clone()))
            })
            .collect()
    }

    /// The input sequence this configuration describes.
    pub fn build_input(&self) -> BenchResult<InputSequence> {
        let input = match self.seed {
            Some(seed) => InputSequence::random(self.n, self.n as u64, seed)?,
            None => InputSequence::range(self.n)?,
        };
        Ok(input)
    }
}
