//! Ranked comparison report and its renderings.

use std::fmt::Write as _;
use std::time::Duration;

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use logsum_core::approx_eq;
use serde::Serialize;

use crate::harness::{Outcome, VariantReport};

/// Per-variant results for one input, sorted by mean time.
#[derive(Debug, Clone)]
pub struct Report {
    /// Input length.
    pub n: usize,
    /// Measured variants by ascending mean, then failed variants in run order.
    pub entries: Vec<VariantReport>,
}

/// Outcome of comparing every measured result against a reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Agreement {
    pub reference: &'static str,
    pub reference_value: f64,
    /// Largest `|a - b| / max(1, |a|, |b|)` seen.
    pub max_rel_diff: f64,
    pub disagreeing: Vec<&'static str>,
}

impl Agreement {
    pub fn is_ok(&self) -> bool {
        self.disagreeing.is_empty()
    }
}

impl Report {
    /// Sort, rank and compute relative times.
    pub fn new(n: usize, entries: Vec<VariantReport>) -> Self {
        let (mut measured, failed): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|e| e.measurement().is_some());

        measured.sort_by_key(|e| e.measurement().map(|m| m.mean()).unwrap_or_default());
        let fastest = measured
            .first()
            .and_then(|e| e.measurement())
            .map(|m| m.mean().as_secs_f64());

        for (i, entry) in measured.iter_mut().enumerate() {
            entry.rank = Some(i + 1);
            entry.relative = match (fastest, entry.measurement()) {
                (Some(f), Some(m)) if f > 0.0 => Some(m.mean().as_secs_f64() / f),
                (Some(_), Some(_)) => Some(1.0),
                _ => None,
            };
        }

        measured.extend(failed.into_iter().map(|mut e| {
            e.rank = None;
            e.relative = None;
            e
        }));
        Self {
            n,
            entries: measured,
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariantReport> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn failures(&self) -> impl Iterator<Item = &VariantReport> {
        self.entries.iter().filter(|e| e.error().is_some())
    }

    /// Compare every measured value against `reference` if it was measured,
    /// otherwise against the fastest variant.
    ///
    /// `None` when nothing was measured.
    pub fn agreement(&self, reference: &str, rel_tol: f64) -> Option<Agreement> {
        let base = self
            .get(reference)
            .filter(|e| e.measurement().is_some())
            .or_else(|| self.entries.iter().find(|e| e.measurement().is_some()))?;
        let reference_value = base.measurement()?.value;

        let mut max_rel_diff = 0.0f64;
        let mut disagreeing = Vec::new();
        for entry in &self.entries {
            let Some(m) = entry.measurement() else {
                continue;
            };
            let scale = 1.0f64.max(m.value.abs()).max(reference_value.abs());
            max_rel_diff = max_rel_diff.max((m.value - reference_value).abs() / scale);
            if !approx_eq(m.value, reference_value, rel_tol) {
                disagreeing.push(entry.name);
            }
        }

        Some(Agreement {
            reference: base.name,
            reference_value,
            max_rel_diff,
            disagreeing,
        })
    }

    /// Styled comparison table.
    pub fn render_table(&self) -> Table {
        let mut table = create_table(vec![
            "variant",
            "expression",
            "replications",
            "elapsed",
            "mean",
            "relative",
            "result",
        ]);
        for entry in &self.entries {
            match &entry.outcome {
                Outcome::Measured(m) => {
                    let relative = entry.relative.unwrap_or(1.0);
                    table.add_row(vec![
                        Cell::new(entry.name),
                        Cell::new(entry.expression),
                        Cell::new(m.replications()),
                        Cell::new(format_duration(m.total())),
                        Cell::new(format_duration(m.mean())),
                        format_relative(relative),
                        Cell::new(format!("{:.10}", m.value)),
                    ]);
                }
                Outcome::Failed(err) => {
                    table.add_row(vec![
                        Cell::new(entry.name),
                        Cell::new(entry.expression),
                        Cell::new("-"),
                        Cell::new("-"),
                        Cell::new("-"),
                        Cell::new("-"),
                        Cell::new(err.to_string()).fg(Color::Red),
                    ]);
                }
            }
        }
        table
    }

    /// CSV with a header row, one row per entry, durations in nanoseconds.
    pub fn render_csv(&self) -> String {
        let mut out = String::from(
            "variant,n,replications,total_ns,mean_ns,min_ns,median_ns,max_ns,relative,result,error\n",
        );
        for entry in &self.entries {
            // Writing to a String cannot fail.
            let _ = match &entry.outcome {
                Outcome::Measured(m) => writeln!(
                    out,
                    "{},{},{},{},{},{},{},{},{:.4},{:.15},",
                    entry.name,
                    self.n,
                    m.replications(),
                    m.total().as_nanos(),
                    m.mean().as_nanos(),
                    m.min().as_nanos(),
                    m.median().as_nanos(),
                    m.max().as_nanos(),
                    entry.relative.unwrap_or(1.0),
                    m.value,
                ),
                Outcome::Failed(err) => writeln!(
                    out,
                    "{},{},0,,,,,,,,\"{}\"",
                    entry.name,
                    self.n,
                    err.to_string().replace('"', "\"\"")
                ),
            };
        }
        out
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let view = JsonReport {
            n: self.n,
            entries: self.entries.iter().map(JsonEntry::from).collect(),
        };
        serde_json::to_string_pretty(&view)
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    n: usize,
    entries: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    variant: &'a str,
    expression: &'a str,
    rank: Option<usize>,
    replications: usize,
    total_ns: Option<u64>,
    mean_ns: Option<u64>,
    min_ns: Option<u64>,
    median_ns: Option<u64>,
    max_ns: Option<u64>,
    relative: Option<f64>,
    result: Option<f64>,
    samples_ns: Vec<u64>,
    error: Option<String>,
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl<'a> From<&'a VariantReport> for JsonEntry<'a> {
    fn from(entry: &'a VariantReport) -> Self {
        let m = entry.measurement();
        Self {
            variant: entry.name,
            expression: entry.expression,
            rank: entry.rank,
            replications: m.map_or(0, |m| m.replications()),
            total_ns: m.map(|m| nanos(m.total())),
            mean_ns: m.map(|m| nanos(m.mean())),
            min_ns: m.map(|m| nanos(m.min())),
            median_ns: m.map(|m| nanos(m.median())),
            max_ns: m.map(|m| nanos(m.max())),
            relative: entry.relative,
            result: m.map(|m| m.value),
            samples_ns: m
                .map(|m| m.samples.iter().map(|s| nanos(s.elapsed)).collect())
                .unwrap_or_default(),
            error: entry.error().map(|e| e.to_string()),
        }
    }
}

/// Table with the shared preset and a cyan header row.
pub fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(headers.iter().map(|h| Cell::new(*h).fg(Color::Cyan)));
    table
}

/// Human-readable duration with a unit picked by magnitude.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs >= 1.0 {
        format!("{:.3}s", secs)
    } else if secs >= 1e-3 {
        format!("{:.3}ms", secs * 1e3)
    } else if secs >= 1e-6 {
        format!("{:.3}µs", secs * 1e6)
    } else {
        format!("{}ns", d.as_nanos())
    }
}

fn format_relative(relative: f64) -> Cell {
    let text = format!("{:.2}", relative);
    if relative < 1.5 {
        Cell::new(text).fg(Color::Green)
    } else if relative < 4.0 {
        Cell::new(text).fg(Color::Yellow)
    } else {
        Cell::new(text).fg(Color::Red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{Measurement, TimingSample};
    use logsum_core::SumError;

    fn entry(name: &'static str, mean_ns: u64, value: f64) -> VariantReport {
        VariantReport {
            name,
            expression: name,
            outcome: Outcome::Measured(Measurement {
                samples: vec![
                    TimingSample {
                        elapsed: Duration::from_nanos(mean_ns),
                    };
                    3
                ],
                value,
            }),
            rank: None,
            relative: None,
        }
    }

    fn failed(name: &'static str) -> VariantReport {
        VariantReport {
            name,
            expression: name,
            outcome: Outcome::Failed(SumError::EmptyInput),
            rank: None,
            relative: None,
        }
    }

    fn sample_report() -> Report {
        Report::new(
            4,
            vec![
                entry("slow", 4_000, 1.0),
                failed("broken"),
                entry("fast", 1_000, 1.0),
                entry("middle", 2_000, 1.0 + 1e-12),
            ],
        )
    }

    #[test]
    fn test_sorted_ranked_and_relative() {
        let report = sample_report();
        let names: Vec<_> = report.entries.iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["fast", "middle", "slow", "broken"]);
        assert_eq!(report.get("fast").unwrap().rank, Some(1));
        assert_eq!(report.get("slow").unwrap().rank, Some(3));
        assert_eq!(report.get("broken").unwrap().rank, None);
        assert!((report.get("slow").unwrap().relative.unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_agreement() {
        let report = sample_report();
        let agreement = report.agreement("slow", 1e-9).unwrap();
        assert_eq!(agreement.reference, "slow");
        assert!(agreement.is_ok());
        assert!(agreement.max_rel_diff > 0.0);

        let off = Report::new(2, vec![entry("a", 1, 1.0), entry("b", 2, 2.0)]);
        let agreement = off.agreement("missing", 1e-9).unwrap();
        assert_eq!(agreement.reference, "a");
        assert_eq!(agreement.disagreeing, vec!["b"]);
    }

    #[test]
    fn test_agreement_none_when_nothing_measured() {
        let report = Report::new(1, vec![failed("x")]);
        assert!(report.agreement("x", 1e-9).is_none());
    }

    #[test]
    fn test_csv_has_one_row_per_entry() {
        let csv = sample_report().render_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("variant,n,replications"));
        assert!(lines[1].starts_with("fast,4,3,3000,1000,"));
        assert!(lines[4].starts_with("broken,4,0,"));
        assert!(lines[4].ends_with("\"input sequence is empty\""));
    }

    #[test]
    fn test_json_round_trips_through_value() {
        let json = sample_report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["n"], 4);
        assert_eq!(value["entries"][0]["variant"], "fast");
        assert_eq!(value["entries"][0]["samples_ns"].as_array().unwrap().len(), 3);
        assert_eq!(value["entries"][3]["error"], "input sequence is empty");
    }

    #[test]
    fn test_table_lists_every_variant() {
        let rendered = sample_report().render_table().to_string();
        for name in ["fast", "middle", "slow", "broken"] {
            assert!(rendered.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(Duration::from_nanos(512)), "512ns");
        assert_eq!(format_duration(Duration::from_micros(15)), "15.000µs");
        assert_eq!(format_duration(Duration::from_millis(2)), "2.000ms");
        assert_eq!(format_duration(Duration::from_secs(3)), "3.000s");
    }
}
