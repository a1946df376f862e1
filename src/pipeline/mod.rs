//! The analysis pipeline: an ordered, fixed chain of stages.
//!
//! ```text
//! StatisticsStage ──▶ ThresholdStage ──▶ RateOfChangeStage
//!   (strategy +         (above 28 °C?)     (rose > 10 °C over
//!    window trim)                           the last 6 samples?)
//! ```
//!
//! The chain topology is built once at startup and never rewired; only
//! the statistic strategy inside the first stage is swappable at runtime.
//! One pass runs synchronously on the producer's context per accepted
//! reading, so passes never overlap.

mod stages;

pub use stages::{RateOfChangeStage, Stage, StatisticsStage, ThresholdStage};

use chrono::{DateTime, Utc};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, PipelineError};
use crate::stats::StrategySlot;
use crate::types::CycleReport;

/// The assembled stage chain, entered through its first stage.
pub struct Pipeline {
    head: Box<dyn Stage>,
    strategy: StrategySlot,
}

impl Pipeline {
    /// The standard three-stage chain, wired from the configuration.
    pub fn standard(config: &MonitorConfig) -> Self {
        let strategy = StrategySlot::new();
        let rate = RateOfChangeStage::new(config.rate_window, config.rate_delta, None);
        let threshold = ThresholdStage::new(config.threshold, Some(Box::new(rate)));
        let statistics = StatisticsStage::new(strategy.clone(), Some(Box::new(threshold)));
        Self {
            head: Box::new(statistics),
            strategy,
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Handle for swapping the active statistic at runtime.
    pub fn strategy_slot(&self) -> StrategySlot {
        self.strategy.clone()
    }

    /// Run one full pass over the updated history buffers.
    ///
    /// Invoked by the history store after each append; the returned
    /// report carries every externally observable outcome of the pass.
    pub fn process(
        &self,
        timestamps: &mut Vec<DateTime<Utc>>,
        values: &mut Vec<f64>,
    ) -> Result<CycleReport, PipelineError> {
        let latest = *timestamps.last().ok_or(PipelineError::EmptyHistory)?;
        let mut report = CycleReport::new(latest);
        self.head.process(timestamps, values, &mut report)?;
        Ok(report)
    }
}

/// Assembles a [`Pipeline`] from an explicit head stage.
///
/// Used by tests and custom deployments; production code goes through
/// [`Pipeline::standard`]. Building without a head stage is the fatal
/// misconfiguration case — the aggregator refuses to exist without its
/// chain.
#[derive(Default)]
pub struct PipelineBuilder {
    head: Option<Box<dyn Stage>>,
    strategy: Option<StrategySlot>,
}

impl PipelineBuilder {
    /// Set the first stage of the chain (with its successors already wired).
    pub fn head(mut self, stage: Box<dyn Stage>) -> Self {
        self.head = Some(stage);
        self
    }

    /// Attach the strategy slot shared with the statistics stage.
    pub fn strategy(mut self, slot: StrategySlot) -> Self {
        self.strategy = Some(slot);
        self
    }

    pub fn build(self) -> Result<Pipeline, MonitorError> {
        let head = self.head.ok_or_else(|| {
            MonitorError::Configuration("pipeline built without a head stage".into())
        })?;
        Ok(Pipeline {
            head,
            strategy: self.strategy.unwrap_or_default(),
        })
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

    #[test]
    fn builder_without_head_is_a_configuration_error() {
        assert!(matches!(
            Pipeline::builder().build(),
            Err(MonitorError::Configuration(_))
        ));
    }

    #[test]
    fn standard_chain_without_strategy_skips_statistic_and_trim() {
        let pipeline = Pipeline::standard(&MonitorConfig::default());
        let fourteen: Vec<f64> = (0..14).map(|i| 15.0 + i as f64).collect();
        let (mut ts, mut values) = buffers(&fourteen);

        let report = pipeline.process(&mut ts, &mut values).unwrap();

        assert!(report.statistic.is_none());
        // Trimming is the statistic's responsibility; with none selected
        // the window keeps growing.
        assert_eq!(values.len(), 14);
    }

    #[test]
    fn standard_chain_runs_all_three_stages() {
        let config = MonitorConfig::default();
        let pipeline = Pipeline::standard(&config);
        pipeline
            .strategy_slot()
            .select(StatisticKind::MaxMin, config.window_size);

        // Last value 30 is above the 28 threshold and 15 → 30 over six
        // samples is a 15-degree rise.
        let (mut ts, mut values) = buffers(&[15.0, 28.0, 21.0, 20.0, 27.0, 30.0]);
        let report = pipeline.process(&mut ts, &mut values).unwrap();

        assert_eq!(
            report.statistic,
            Some(StatisticResult::MaxMin { max: 30.0, min: 15.0 })
        );
        assert!(report.above_threshold);
        assert!(report.rapid_increase);
    }

    #[test]
    fn process_on_empty_history_is_rejected() {
        let pipeline = Pipeline::standard(&MonitorConfig::default());
        let mut ts = Vec::new();
        let mut values = Vec::new();
        assert!(matches!(
            pipeline.process(&mut ts, &mut values),
            Err(PipelineError::EmptyHistory)
        ));
    }

    #[test]
    fn report_timestamp_is_latest_reading() {
        let pipeline = Pipeline::standard(&MonitorConfig::default());
        let (mut ts, mut values) = buffers(&[20.0, 22.0, 24.0]);
        let expected = ts[2];
        let report = pipeline.process(&mut ts, &mut values).unwrap();
        assert_eq!(report.timestamp, expected);
    }
}
