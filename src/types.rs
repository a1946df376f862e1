//! Core telemetry types shared across the pipeline.
//!
//! A [`Reading`] is one timestamped sample from the probe. A [`CycleReport`]
//! is the full set of externally observable outcomes of one pipeline pass:
//! the statistic computed over the sliding window (if a strategy is
//! selected) plus the two rule signals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Reading
// ============================================================================

/// One (timestamp, value) temperature sample. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Wall-clock time at which the value was observed (second resolution).
    pub timestamp: DateTime<Utc>,
    /// Observed temperature in degrees Celsius.
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

// ============================================================================
// Statistic Selection & Results
// ============================================================================

/// The selectable statistic strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StatisticKind {
    /// Arithmetic mean and population standard deviation.
    MeanStdDev,
    /// Q1 / median / Q3 over the sorted window.
    Quantiles,
    /// Maximum and minimum of the window.
    MaxMin,
}

impl std::fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatisticKind::MeanStdDev => write!(f, "mean-std-dev"),
            StatisticKind::Quantiles => write!(f, "quantiles"),
            StatisticKind::MaxMin => write!(f, "max-min"),
        }
    }
}

/// Result of one statistic execution over the current window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StatisticResult {
    MeanStdDev { mean: f64, std_dev: f64 },
    Quantiles { q1: f64, median: f64, q3: f64 },
    MaxMin { max: f64, min: f64 },
}

impl StatisticResult {
    /// Which strategy produced this result.
    pub fn kind(&self) -> StatisticKind {
        match self {
            StatisticResult::MeanStdDev { .. } => StatisticKind::MeanStdDev,
            StatisticResult::Quantiles { .. } => StatisticKind::Quantiles,
            StatisticResult::MaxMin { .. } => StatisticKind::MaxMin,
        }
    }
}

impl std::fmt::Display for StatisticResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatisticResult::MeanStdDev { mean, std_dev } => {
                write!(f, "mean={:.2} std_dev={:.2}", mean, std_dev)
            }
            StatisticResult::Quantiles { q1, median, q3 } => {
                write!(f, "q1={:.2} median={:.2} q3={:.2}", q1, median, q3)
            }
            StatisticResult::MaxMin { max, min } => {
                write!(f, "max={:.2} min={:.2}", max, min)
            }
        }
    }
}

// ============================================================================
// Cycle Report
// ============================================================================

/// Observable outcome of one full pipeline pass over the updated history.
///
/// Produced once per accepted reading; the presentation layer consumes
/// this record, the core never formats it beyond structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Timestamp of the reading that triggered the pass.
    pub timestamp: DateTime<Utc>,
    /// Statistic over the pre-trim window, `None` when no strategy is selected.
    pub statistic: Option<StatisticResult>,
    /// Latest value exceeded the configured threshold.
    pub above_threshold: bool,
    /// Value rose more than the configured delta over the rate window.
    pub rapid_increase: bool,
}

impl CycleReport {
    /// Blank report for a pass that has not run any stage yet.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            statistic: None,
            above_threshold: false,
            rapid_increase: false,
        }
    }
}
