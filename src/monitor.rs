//! The monitor — process-wide aggregator with an explicit lifecycle.
//!
//! One `Monitor` owns the history store and the stage chain, wires the
//! notifier on `start()`, and exposes the controller boundary: strategy
//! selection, pause/resume/stop, and termination await. Construction is
//! explicit dependency injection (no global accessor), but the process
//! still enforces a single live instance: a second construction while one
//! exists fails with [`MonitorError::SingletonViolation`], and dropping
//! the monitor releases the claim.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::history::HistoryStore;
use crate::notifier::Notifier;
use crate::pipeline::Pipeline;
use crate::sensor::{SensorController, SensorLoop};
use crate::source::ReadingSource;
use crate::stats::StrategySlot;
use crate::types::{CycleReport, Reading, StatisticKind};

/// Claim flag for the single live monitor in this process.
static MONITOR_LIVE: AtomicBool = AtomicBool::new(false);

/// Aggregator tying the sensor loop, history store and pipeline together.
pub struct Monitor {
    config: MonitorConfig,
    history: HistoryStore,
    strategy: StrategySlot,
    controller: Mutex<Option<Arc<SensorController>>>,
}

impl Monitor {
    /// Start building a monitor over `config`.
    pub fn builder(config: MonitorConfig) -> MonitorBuilder {
        MonitorBuilder {
            config,
            pipeline: None,
        }
    }

    // ------------------------------------------------------------------
    // Controller boundary
    // ------------------------------------------------------------------

    /// Spawn the sensor loop over `source`. At most once per monitor.
    pub fn start(&self, source: Box<dyn ReadingSource>) -> Result<(), MonitorError> {
        let mut guard = lock(&self.controller);
        if guard.is_some() {
            return Err(MonitorError::AlreadyStarted);
        }

        let mut notifier = Notifier::new();
        notifier.subscribe(Arc::new(self.history.clone()));

        let sensor = SensorLoop::new(
            self.config.sensor_name.clone(),
            source,
            notifier,
            self.config.interval(),
        );
        *guard = Some(Arc::new(sensor.start()));
        Ok(())
    }

    /// Select the statistic computed by the first stage. Takes effect on
    /// the next pass; an in-flight pass keeps the strategy it loaded.
    pub fn select_strategy(&self, kind: StatisticKind) {
        self.strategy.select(kind, self.config.window_size);
        info!(strategy = %kind, "statistic strategy selected");
    }

    /// Deselect the statistic; passes skip computation (and trimming).
    pub fn clear_strategy(&self) {
        self.strategy.clear();
        info!("statistic strategy cleared");
    }

    pub fn pause(&self) -> Result<(), MonitorError> {
        self.with_controller(|c| c.pause())
    }

    pub fn resume(&self) -> Result<(), MonitorError> {
        self.with_controller(|c| c.resume())
    }

    pub fn stop(&self) -> Result<(), MonitorError> {
        self.with_controller(|c| c.stop())
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.controller)
            .as_ref()
            .map(|c| c.is_paused())
            .unwrap_or(false)
    }

    /// Block until the sensor loop has confirmed exit, returning its
    /// terminal result. Safe to call while the loop is paused.
    pub async fn await_termination(&self) -> Result<(), MonitorError> {
        let controller = lock(&self.controller)
            .as_ref()
            .cloned()
            .ok_or(MonitorError::NotStarted)?;
        controller.join().await
    }

    // ------------------------------------------------------------------
    // Observable output boundary
    // ------------------------------------------------------------------

    /// Report of the most recent completed pipeline pass.
    pub fn latest_report(&self) -> Option<CycleReport> {
        self.history.latest_report()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.history.timestamps()
    }

    pub fn values(&self) -> Vec<f64> {
        self.history.values()
    }

    pub fn readings(&self) -> Vec<Reading> {
        self.history.readings()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn with_controller(&self, f: impl FnOnce(&SensorController)) -> Result<(), MonitorError> {
        let guard = lock(&self.controller);
        let controller = guard.as_ref().ok_or(MonitorError::NotStarted)?;
        f(controller);
        Ok(())
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        // Best effort: the loop is cooperative, so request exit. The
        // claim is released either way so a fresh monitor can be built.
        if let Some(controller) = lock(&self.controller).as_ref() {
            controller.stop();
        }
        MONITOR_LIVE.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`Monitor`]; the pipeline chain is a required dependency.
pub struct MonitorBuilder {
    config: MonitorConfig,
    pipeline: Option<Pipeline>,
}

impl MonitorBuilder {
    /// Inject the stage chain the aggregator forwards history through.
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Validate, then claim the process-wide instance slot.
    pub fn build(self) -> Result<Monitor, MonitorError> {
        self.config.validate()?;
        let pipeline = self.pipeline.ok_or_else(|| {
            MonitorError::Configuration("monitor built without a pipeline chain".into())
        })?;

        if MONITOR_LIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MonitorError::SingletonViolation);
        }

        let strategy = pipeline.strategy_slot();
        let history = HistoryStore::new(Arc::new(pipeline));
        info!(sensor = %self.config.sensor_name, "monitor created");
        Ok(Monitor {
            config: self.config,
            history,
            strategy,
            controller: Mutex::new(None),
        })
    }
}
