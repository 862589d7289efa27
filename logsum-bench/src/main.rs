//! Compare the alternating log-sum variants head to head.
//!
//! ```text
//! logsum-bench --n 50000 --reps 100
//! logsum-bench --variant naive_sign --variant filled_sign --format csv
//! logsum-bench --profile naive_sign --profile-interval-us 50
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use logsum_bench::{BenchConfig, Harness, ProfileConfig, Profiler};
use logsum_core::{find_variant, VARIANTS};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "logsum-bench", version, about = "Benchmark the alternating-sign log-sum variants")]
struct Cli {
    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input length.
    #[arg(short, long)]
    n: Option<usize>,

    /// Timed replications per variant.
    #[arg(short, long)]
    reps: Option<usize>,

    /// Untimed warm-up calls per variant.
    #[arg(long)]
    warmup: Option<usize>,

    /// Variant to run (repeatable). Defaults to all.
    #[arg(long = "variant")]
    variants: Vec<String>,

    /// Use random integers in 1..=n drawn with this seed instead of 1..=n.
    #[arg(long)]
    random: Option<u64>,

    /// Relative tolerance for the agreement check.
    #[arg(long)]
    tolerance: Option<f64>,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Run the sampling profiler on this variant after benchmarking.
    #[arg(long)]
    profile: Option<String>,

    #[arg(long)]
    profile_interval_us: Option<u64>,

    #[arg(long)]
    profile_reps: Option<usize>,

    /// List the available variants and exit.
    #[arg(long)]
    list: bool,

    /// More logging (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn resolve_config(&self) -> Result<BenchConfig> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::from_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => BenchConfig::default(),
        };

        if let Some(n) = self.n {
            config.n = n;
        }
        if let Some(reps) = self.reps {
            config.replications = reps;
        }
        if let Some(warmup) = self.warmup {
            config.warmup = warmup;
        }
        if !self.variants.is_empty() {
            config.variants = self.variants.clone();
        }
        if self.random.is_some() {
            config.seed = self.random;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if self.profile.is_some()
            || self.profile_interval_us.is_some()
            || self.profile_reps.is_some()
        {
            let profile = config.profile.get_or_insert_with(ProfileConfig::default);
            if let Some(variant) = &self.profile {
                profile.variant = variant.clone();
            }
            if let Some(interval) = self.profile_interval_us {
                profile.interval_us = interval;
            }
            if let Some(reps) = self.profile_reps {
                profile.replications = reps;
            }
        }

        config.validate().context("invalid benchmark configuration")?;
        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list {
        for v in VARIANTS.iter() {
            println!("{:<12} {}", v.name, v.expression);
        }
        return Ok(());
    }

    let config = cli.resolve_config()?;
    let input = config.build_input().context("building input sequence")?;
    let variants = config.selected_variants()?;
    info!(n = input.len(), seed = ?config.seed, "input ready");

    let harness = Harness::new(config.clone())?;
    let report = harness.run(&variants, &input);

    match cli.format {
        Format::Table => println!("{}", report.render_table()),
        Format::Csv => print!("{}", report.render_csv()),
        Format::Json => println!("{}", report.to_json().context("serializing report")?),
    }

    for failed in report.failures() {
        if let Some(err) = failed.error() {
            warn!(variant = failed.name, %err, "variant did not complete");
        }
    }

    if let Some(profile) = &config.profile {
        let variant = find_variant(&profile.variant)
            .with_context(|| format!("unknown variant `{}`", profile.variant))?;
        let profiler = Profiler::new(Duration::from_micros(profile.interval_us));
        let breakdown = profiler
            .profile_variant(variant, input.as_slice(), profile.replications)
            .with_context(|| format!("profiling `{}`", variant.name))?;
        eprintln!(
            "\nprofile of `{}`: {} samples at {:?}",
            variant.name, breakdown.sample_count, profiler.interval()
        );
        eprintln!("{}", breakdown.render_table());
    }

    if let Some(agreement) = report.agreement("iterative", config.tolerance) {
        if !agreement.is_ok() {
            bail!(
                "variants disagree with `{}` ({:.17}) beyond tolerance {}: {:?} (max relative difference {:e})",
                agreement.reference,
                agreement.reference_value,
                config.tolerance,
                agreement.disagreeing,
                agreement.max_rel_diff
            );
        }
        info!(
            reference = agreement.reference,
            max_rel_diff = agreement.max_rel_diff,
            "all measured variants agree"
        );
    }

    Ok(())
}
