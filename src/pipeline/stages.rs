//! Stage handlers — each link of the chain.
//!
//! Every stage performs its own check or computation against the history
//! buffers, records its outcome in the pass report, then delegates to its
//! successor if one is wired. A stage constructed without a successor is
//! terminal and simply returns after its own logic.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::PipelineError;
use crate::stats::StrategySlot;
use crate::types::CycleReport;

/// One link in the fixed-order processing chain.
///
/// Contract: given the index-aligned `(timestamps, values)` buffers,
/// perform this stage's check or computation, mutate only what is
/// documented for the stage, record outcomes in `report`, and invoke the
/// successor if present.
pub trait Stage: Send + Sync {
    fn process(
        &self,
        timestamps: &mut Vec<DateTime<Utc>>,
        values: &mut Vec<f64>,
        report: &mut CycleReport,
    ) -> Result<(), PipelineError>;
}

fn delegate(
    successor: &Option<Box<dyn Stage>>,
    timestamps: &mut Vec<DateTime<Utc>>,
    values: &mut Vec<f64>,
    report: &mut CycleReport,
) -> Result<(), PipelineError> {
    match successor {
        Some(next) => next.process(timestamps, values, report),
        None => Ok(()),
    }
}

// ============================================================================
// Statistics Stage
// ============================================================================

/// Executes the active statistic, if one is selected.
///
/// The statistic call both computes the result (over the pre-trim window)
/// and trims the window; with no strategy selected neither happens and
/// the buffers pass through untouched.
pub struct StatisticsStage {
    strategy: StrategySlot,
    successor: Option<Box<dyn Stage>>,
}

impl StatisticsStage {
    pub fn new(strategy: StrategySlot, successor: Option<Box<dyn Stage>>) -> Self {
        Self { strategy, successor }
    }
}

impl Stage for StatisticsStage {
    fn process(
        &self,
        timestamps: &mut Vec<DateTime<Utc>>,
        values: &mut Vec<f64>,
        report: &mut CycleReport,
    ) -> Result<(), PipelineError> {
        // Single atomic load: the pass computes with whichever strategy
        // was current when it reached this stage, swaps notwithstanding.
        if let Some(statistic) = self.strategy.load() {
            report.statistic = Some(statistic.execute(timestamps, values)?);
        }
        delegate(&self.successor, timestamps, values, report)
    }
}

// ============================================================================
// Threshold Stage
// ============================================================================

/// Flags the latest value when it exceeds the configured threshold.
pub struct ThresholdStage {
    threshold: f64,
    successor: Option<Box<dyn Stage>>,
}

impl ThresholdStage {
    pub fn new(threshold: f64, successor: Option<Box<dyn Stage>>) -> Self {
        Self { threshold, successor }
    }
}

impl Stage for ThresholdStage {
    fn process(
        &self,
        timestamps: &mut Vec<DateTime<Utc>>,
        values: &mut Vec<f64>,
        report: &mut CycleReport,
    ) -> Result<(), PipelineError> {
        if let Some(&latest) = values.last() {
            if latest > self.threshold {
                report.above_threshold = true;
                warn!(value = latest, threshold = self.threshold, "temperature above threshold");
            }
        }
        delegate(&self.successor, timestamps, values, report)
    }
}

// ============================================================================
// Rate-of-Change Stage
// ============================================================================

/// Flags a rise of more than `rate_delta` degrees over the last
/// `rate_window` samples (30 s at the default 5 s cadence).
///
/// With fewer than `rate_window` samples there is nothing to compare
/// against and the stage emits no signal.
pub struct RateOfChangeStage {
    rate_window: usize,
    rate_delta: f64,
    successor: Option<Box<dyn Stage>>,
}

impl RateOfChangeStage {
    pub fn new(rate_window: usize, rate_delta: f64, successor: Option<Box<dyn Stage>>) -> Self {
        Self {
            rate_window,
            rate_delta,
            successor,
        }
    }
}

impl Stage for RateOfChangeStage {
    fn process(
        &self,
        timestamps: &mut Vec<DateTime<Utc>>,
        values: &mut Vec<f64>,
        report: &mut CycleReport,
    ) -> Result<(), PipelineError> {
        let n = values.len();
        if n >= self.rate_window {
            let latest = values[n - 1];
            let past = values[n - self.rate_window];
            let rise = latest - past;
            if rise > self.rate_delta {
                report.rapid_increase = true;
                warn!(
                    rise,
                    over_samples = self.rate_window,
                    "rapid temperature increase"
                );
            }
        }
        delegate(&self.successor, timestamps, values, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StatisticKind, StatisticResult};

    fn buffers(values: &[f64]) -> (Vec<DateTime<Utc>>, Vec<f64>) {
        let base = Utc::now();
        let timestamps = (0..values.len())
            .map(|i| base + chrono::Duration::seconds(5 * i as i64))
            .collect();
        (timestamps, values.to_vec())
    }

    fn report() -> CycleReport {
        CycleReport::new(Utc::now())
    }

    #[test]
    fn threshold_stage_flags_only_above() {
        let stage = ThresholdStage::new(28.0, None);

        let (mut ts, mut values) = buffers(&[30.0]);
        let mut r = report();
        stage.process(&mut ts, &mut values, &mut r).unwrap();
        assert!(r.above_threshold);

        let (mut ts, mut values) = buffers(&[25.0]);
        let mut r = report();
        stage.process(&mut ts, &mut values, &mut r).unwrap();
        assert!(!r.above_threshold);

        // Boundary: equal to the threshold is not above it.
        let (mut ts, mut values) = buffers(&[28.0]);
        let mut r = report();
        stage.process(&mut ts, &mut values, &mut r).unwrap();
        assert!(!r.above_threshold);
    }

    #[test]
    fn rate_stage_flags_increase_over_window() {
        let stage = RateOfChangeStage::new(6, 10.0, None);

        // 26 - 15 = 11 > 10.
        let (mut ts, mut values) = buffers(&[15.0, 28.0, 30.0, 20.0, 27.0, 26.0]);
        let mut r = report();
        stage.process(&mut ts, &mut values, &mut r).unwrap();
        assert!(r.rapid_increase);

        // 23 - 15 = 8, no signal.
        let (mut ts, mut values) = buffers(&[15.0, 28.0, 30.0, 20.0, 27.0, 23.0]);
        let mut r = report();
        stage.process(&mut ts, &mut values, &mut r).unwrap();
        assert!(!r.rapid_increase);
    }

    #[test]
    fn rate_stage_needs_full_lookback() {
        let stage = RateOfChangeStage::new(6, 10.0, None);
        let (mut ts, mut values) = buffers(&[10.0, 25.0, 30.0, 31.0, 32.0]);
        let mut r = report();
        stage.process(&mut ts, &mut values, &mut r).unwrap();
        assert!(!r.rapid_increase);
    }

    #[test]
    fn rate_stage_ignores_decreases() {
        let stage = RateOfChangeStage::new(6, 10.0, None);
        let (mut ts, mut values) = buffers(&[30.0, 28.0, 27.0, 20.0, 18.0, 10.0]);
        let mut r = report();
        stage.process(&mut ts, &mut values, &mut r).unwrap();
        assert!(!r.rapid_increase);
    }

    #[test]
    fn stages_are_independently_invokable_without_successor() {
        let slot = StrategySlot::new();
        slot.select(StatisticKind::MaxMin, 12);
        let stage = StatisticsStage::new(slot, None);

        let (mut ts, mut values) = buffers(&[20.0, 24.0]);
        let mut r = report();
        stage.process(&mut ts, &mut values, &mut r).unwrap();
        assert_eq!(
            r.statistic,
            Some(StatisticResult::MaxMin { max: 24.0, min: 20.0 })
        );
        assert!(!r.above_threshold);
        assert!(!r.rapid_increase);
    }

    #[test]
    fn statistics_stage_propagates_statistic_failure() {
        let slot = StrategySlot::new();
        slot.select(StatisticKind::Quantiles, 12);
        let stage = StatisticsStage::new(slot, None);

        let mut ts = Vec::new();
        let mut values = Vec::new();
        let mut r = report();
        assert!(matches!(
            stage.process(&mut ts, &mut values, &mut r),
            Err(PipelineError::EmptyHistory)
        ));
    }

    #[test]
    fn chain_order_statistics_sees_pre_threshold_window() {
        // A 13-sample window: the statistic computes over all 13, trims
        // to 12, and the threshold stage then judges the same latest value.
        let slot = StrategySlot::new();
        slot.select(StatisticKind::MaxMin, 12);
        let rate = RateOfChangeStage::new(6, 10.0, None);
        let threshold = ThresholdStage::new(28.0, Some(Box::new(rate)));
        let head = StatisticsStage::new(slot, Some(Box::new(threshold)));

        let thirteen = [
            25.0, 28.0, 30.0, 20.0, 27.0, 18.0, 15.0, 19.0, 10.0, 22.0, 31.0, 33.0, 29.0,
        ];
        let (mut ts, mut values) = buffers(&thirteen);
        let mut r = report();
        head.process(&mut ts, &mut values, &mut r).unwrap();

        assert_eq!(
            r.statistic,
            Some(StatisticResult::MaxMin { max: 33.0, min: 10.0 })
        );
        assert_eq!(values.len(), 12);
        assert!(r.above_threshold, "29 > 28 after trim");
    }
}
