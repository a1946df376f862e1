//! Statistic strategies for the sliding temperature window.
//!
//! Each strategy computes its result over the *pre-trim* window, then
//! drops the oldest sample from both history buffers once the window
//! exceeds the configured size. Trimming lives here, not in the stage:
//! when no strategy is selected the window is left untouched.
//!
//! Strategies are swapped at runtime through [`StrategySlot`], an atomic
//! reference cell — an in-flight pass uses whichever strategy the slot
//! held when the pass reached the statistics stage.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use statrs::statistics::Statistics;

use crate::error::PipelineError;
use crate::types::{StatisticKind, StatisticResult};

/// Pluggable computation over the current window.
pub trait Statistic: Send + Sync {
    /// Compute the result for the current window, then trim it.
    ///
    /// `timestamps` and `values` are the index-aligned history buffers;
    /// implementations may only front-trim them (both in lockstep, so the
    /// alignment invariant holds). Zero samples is a caller bug and fails
    /// with [`PipelineError::EmptyHistory`].
    fn execute(
        &self,
        timestamps: &mut Vec<DateTime<Utc>>,
        values: &mut Vec<f64>,
    ) -> Result<StatisticResult, PipelineError>;
}

/// Drop the oldest sample from both buffers once the window is exceeded.
///
/// Runs after the result is computed, so every result reflects the
/// pre-trim window; applied once per pass this keeps the window at
/// `window_size` samples from the 13th reading on.
fn trim_window(timestamps: &mut Vec<DateTime<Utc>>, values: &mut Vec<f64>, window_size: usize) {
    if values.len() > window_size {
        values.remove(0);
        timestamps.remove(0);
    }
}

// ============================================================================
// Mean / Standard Deviation
// ============================================================================

/// Arithmetic mean and population standard deviation (divide by n).
pub struct MeanStdDev {
    window_size: usize,
}

impl MeanStdDev {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }
}

impl Statistic for MeanStdDev {
    fn execute(
        &self,
        timestamps: &mut Vec<DateTime<Utc>>,
        values: &mut Vec<f64>,
    ) -> Result<StatisticResult, PipelineError> {
        if values.is_empty() {
            return Err(PipelineError::EmptyHistory);
        }
        let mean = Statistics::mean(values.iter());
        let std_dev = Statistics::population_std_dev(values.iter());
        trim_window(timestamps, values, self.window_size);
        Ok(StatisticResult::MeanStdDev { mean, std_dev })
    }
}

// ============================================================================
// Quantiles
// ============================================================================

/// Q1 / median / Q3 with the original system's indexing convention.
///
/// Sort ascending; for window length n, when n is odd take the elements
/// at indices `n/4`, `n/2`, `3n/4` directly; when n is even average the
/// elements at positions `(n/4 − 1, n/4)`, `(n/2 − 1, n/2)`,
/// `(3n/4 − 1, 3n/4)`. This is deliberately *not* a textbook quantile
/// estimator — parity of n (not the quartile position) selects the rule,
/// and a negative position wraps from the end of the sorted window
/// (reachable only at n = 2, where all three quantiles degenerate to the
/// midpoint of the two samples). Preserved as-is from the original logic.
pub struct Quantiles {
    window_size: usize,
}

impl Quantiles {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }
}

/// Index into `sorted` with Python-style wrapping for negative positions.
fn pick(sorted: &[f64], pos: isize) -> f64 {
    let n = sorted.len() as isize;
    sorted[pos.rem_euclid(n) as usize]
}

fn quantile_at(sorted: &[f64], index: usize) -> f64 {
    if sorted.len() % 2 != 0 {
        sorted[index]
    } else {
        (pick(sorted, index as isize - 1) + sorted[index]) / 2.0
    }
}

impl Statistic for Quantiles {
    fn execute(
        &self,
        timestamps: &mut Vec<DateTime<Utc>>,
        values: &mut Vec<f64>,
    ) -> Result<StatisticResult, PipelineError> {
        if values.is_empty() {
            return Err(PipelineError::EmptyHistory);
        }
        let n = values.len();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile_at(&sorted, n / 4);
        let median = quantile_at(&sorted, n / 2);
        let q3 = quantile_at(&sorted, 3 * n / 4);

        trim_window(timestamps, values, self.window_size);
        Ok(StatisticResult::Quantiles { q1, median, q3 })
    }
}

// ============================================================================
// Max / Min
// ============================================================================

/// Maximum and minimum of the window via pairwise comparison reduction.
pub struct MaxMin {
    window_size: usize,
}

impl MaxMin {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }
}

impl Statistic for MaxMin {
    fn execute(
        &self,
        timestamps: &mut Vec<DateTime<Utc>>,
        values: &mut Vec<f64>,
    ) -> Result<StatisticResult, PipelineError> {
        let (first, rest) = values.split_first().ok_or(PipelineError::EmptyHistory)?;
        let (max, min) = rest.iter().fold((*first, *first), |(max, min), &v| {
            (if v > max { v } else { max }, if v < min { v } else { min })
        });
        trim_window(timestamps, values, self.window_size);
        Ok(StatisticResult::MaxMin { max, min })
    }
}

// ============================================================================
// Strategy Slot
// ============================================================================

/// Shared, atomically swappable reference to the active statistic.
///
/// The statistics stage loads it once per pass; controllers store into it
/// from any thread. Readers always observe either the old or the new
/// strategy, never a torn one. The boxed trait object sits behind the
/// `Arc` so the swapped pointer stays thin.
#[derive(Clone, Default)]
pub struct StrategySlot {
    active: Arc<ArcSwapOption<Box<dyn Statistic>>>,
}

impl StrategySlot {
    /// Empty slot — the statistics stage skips computation until a
    /// strategy is selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the named strategy, sized to `window_size` samples.
    pub fn select(&self, kind: StatisticKind, window_size: usize) {
        let statistic: Box<dyn Statistic> = match kind {
            StatisticKind::MeanStdDev => Box::new(MeanStdDev::new(window_size)),
            StatisticKind::Quantiles => Box::new(Quantiles::new(window_size)),
            StatisticKind::MaxMin => Box::new(MaxMin::new(window_size)),
        };
        self.active.store(Some(Arc::new(statistic)));
    }

    /// Install a caller-provided strategy.
    pub fn set(&self, statistic: Box<dyn Statistic>) {
        self.active.store(Some(Arc::new(statistic)));
    }

    /// Remove the active strategy; subsequent passes skip computation.
    pub fn clear(&self) {
        self.active.store(None);
    }

    /// Snapshot of the currently active strategy.
    pub fn load(&self) -> Option<Arc<Box<dyn Statistic>>> {
        self.active.load_full()
    }

    pub fn is_set(&self) -> bool {
        self.active.load().is_some()
    }
}
