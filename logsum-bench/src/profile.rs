//! Sampling profiler over the stage frames marked in `logsum-core`.
//!
//! While the profiled closure runs on the calling thread, a sampler thread
//! copies the frame stack every `interval`. A frame's *self* count is the
//! number of samples with that frame on top of the stack; its *total* count
//! is the number of samples with the frame anywhere in the stack.

use std::collections::BTreeMap;
use std::hint::black_box;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use comfy_table::{Cell, Table};
use logsum_core::frames::{self, Session};
use logsum_core::Variant;
use tracing::{debug, info};

use crate::error::BenchResult;
use crate::report::{create_table, format_duration};

/// Aggregated samples for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStat {
    pub frame: &'static str,
    pub self_samples: usize,
    pub total_samples: usize,
    pub self_time: Duration,
    pub total_time: Duration,
    /// Percentage of all samples with this frame on top.
    pub self_pct: f64,
    /// Percentage of all samples with this frame anywhere in the stack.
    pub total_pct: f64,
}

/// Per-frame breakdown, sorted by self time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileReport {
    pub interval: Duration,
    /// Samples taken while at least one frame was on the stack.
    pub sample_count: usize,
    pub frames: Vec<FrameStat>,
}

impl ProfileReport {
    /// Aggregate raw stack samples (outermost frame first).
    ///
    /// Empty stacks are dropped: they were taken between invocations. A
    /// frame that appears more than once in one stack counts once towards
    /// its total.
    pub fn from_samples(samples: &[Vec<&'static str>], interval: Duration) -> Self {
        let mut counts: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();
        let mut sample_count = 0usize;
        let mut seen: Vec<&'static str> = Vec::new();

        for stack in samples {
            let Some(&top) = stack.last() else {
                continue;
            };
            sample_count += 1;
            counts.entry(top).or_default().0 += 1;

            seen.clear();
            for &frame in stack {
                if !seen.contains(&frame) {
                    seen.push(frame);
                    counts.entry(frame).or_default().1 += 1;
                }
            }
        }

        let pct = |count: usize| {
            if sample_count == 0 {
                0.0
            } else {
                100.0 * count as f64 / sample_count as f64
            }
        };
        let mut frames: Vec<FrameStat> = counts
            .into_iter()
            .map(|(frame, (self_samples, total_samples))| FrameStat {
                frame,
                self_samples,
                total_samples,
                self_time: scaled(interval, self_samples),
                total_time: scaled(interval, total_samples),
                self_pct: pct(self_samples),
                total_pct: pct(total_samples),
            })
            .collect();
        frames.sort_by(|a, b| {
            b.self_samples
                .cmp(&a.self_samples)
                .then(b.total_samples.cmp(&a.total_samples))
                .then(a.frame.cmp(b.frame))
        });

        Self {
            interval,
            sample_count,
            frames,
        }
    }

    pub fn get(&self, frame: &str) -> Option<&FrameStat> {
        self.frames.iter().find(|f| f.frame == frame)
    }

    /// Frames sorted by total time.
    pub fn by_total(&self) -> Vec<&FrameStat> {
        let mut sorted: Vec<&FrameStat> = self.frames.iter().collect();
        sorted.sort_by(|a, b| {
            b.total_samples
                .cmp(&a.total_samples)
                .then(a.frame.cmp(b.frame))
        });
        sorted
    }

    /// Sampled time, `sample_count × interval`.
    pub fn sampling_time(&self) -> Duration {
        scaled(self.interval, self.sample_count)
    }

    pub fn render_table(&self) -> Table {
        let mut table = create_table(vec![
            "frame",
            "self.time",
            "self.pct",
            "total.time",
            "total.pct",
        ]);
        for stat in &self.frames {
            table.add_row(vec![
                Cell::new(stat.frame),
                Cell::new(format_duration(stat.self_time)),
                Cell::new(format!("{:.2}", stat.self_pct)),
                Cell::new(format_duration(stat.total_time)),
                Cell::new(format!("{:.2}", stat.total_pct)),
            ]);
        }
        table
    }
}

fn scaled(interval: Duration, count: usize) -> Duration {
    interval.saturating_mul(u32::try_from(count).unwrap_or(u32::MAX))
}

/// Samples the frame stack at a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct Profiler {
    interval: Duration,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(Duration::from_micros(100))
    }
}

impl Profiler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `f` `reps` times on this thread while sampling its frames.
    ///
    /// Blocks while another thread holds a profiling session. Calling this
    /// from inside a closure that is already being profiled returns
    /// [`BenchError::Profile`](crate::BenchError::Profile) instead of
    /// deadlocking.
    pub fn profile<F: FnMut()>(&self, reps: usize, mut f: F) -> BenchResult<ProfileReport> {
        let session = Session::start()?;
        let stop = AtomicBool::new(false);
        let interval = self.interval;

        let samples = thread::scope(|scope| {
            let sampler = scope.spawn(|| {
                let mut samples = Vec::new();
                while !stop.load(Ordering::Acquire) {
                    thread::sleep(interval);
                    if let Some(stack) = frames::snapshot() {
                        samples.push(stack);
                    }
                }
                samples
            });

            for _ in 0..reps {
                f();
            }
            stop.store(true, Ordering::Release);

            match sampler.join() {
                Ok(samples) => samples,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        });
        drop(session);

        debug!(raw_samples = samples.len(), "sampler stopped");
        Ok(ProfileReport::from_samples(&samples, interval))
    }

    /// Profile `reps` invocations of `variant` on `ind`.
    ///
    /// The variant is called once up front so a domain error is returned
    /// instead of being sampled.
    pub fn profile_variant(
        &self,
        variant: &Variant,
        ind: &[f64],
        reps: usize,
    ) -> BenchResult<ProfileReport> {
        variant.call(ind)?;
        info!(
            variant = variant.name,
            n = ind.len(),
            reps,
            interval = %format_duration(self.interval),
            "profiling"
        );
        let report = self.profile(reps, || {
            let _ = black_box(variant.call(black_box(ind)));
        })?;
        info!(
            variant = variant.name,
            samples = report.sample_count,
            "profile complete"
        );
        Ok(report)
    }
}
