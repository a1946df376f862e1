//! History store — the sole notifier subscriber.
//!
//! Appends every accepted reading to a pair of index-aligned buffers and
//! synchronously runs the full pipeline pass over them before returning.
//! There is exactly one growing history; `timestamps()`, `values()` and
//! `readings()` are three views over the same buffers.
//!
//! The handle is cheap to clone (shared inner state), so the producer
//! task writes through one clone while the controller reads through
//! another. The inner mutex is held for the whole pass, which is what
//! serializes passes: at most one is in flight at any instant.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::PipelineError;
use crate::notifier::Observer;
use crate::pipeline::Pipeline;
use crate::types::{CycleReport, Reading};

struct HistoryInner {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    latest_report: Option<CycleReport>,
}

/// Append-only reading history plus the pipeline it feeds.
#[derive(Clone)]
pub struct HistoryStore {
    pipeline: Arc<Pipeline>,
    inner: Arc<Mutex<HistoryInner>>,
}

impl HistoryStore {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            inner: Arc::new(Mutex::new(HistoryInner {
                timestamps: Vec::new(),
                values: Vec::new(),
                latest_report: None,
            })),
        }
    }

    /// Append `reading` and run the full pipeline pass over the updated
    /// buffers. Does not return until the pass completes; a failing pass
    /// propagates to the publisher with the buffers already updated.
    pub fn update(&self, reading: &Reading) -> Result<CycleReport, PipelineError> {
        let mut inner = self.lock();
        inner.timestamps.push(reading.timestamp);
        inner.values.push(reading.value);
        debug!(value = reading.value, len = inner.values.len(), "reading appended");

        let HistoryInner {
            timestamps,
            values,
            latest_report,
        } = &mut *inner;
        let report = self.pipeline.process(timestamps, values)?;
        *latest_report = Some(report);
        Ok(report)
    }

    /// Timestamps of the retained history, oldest first.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.lock().timestamps.clone()
    }

    /// Values of the retained history, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.lock().values.clone()
    }

    /// Paired view over the same underlying buffers.
    pub fn readings(&self) -> Vec<Reading> {
        let inner = self.lock();
        inner
            .timestamps
            .iter()
            .zip(&inner.values)
            .map(|(&timestamp, &value)| Reading::new(timestamp, value))
            .collect()
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Report of the most recent completed pass.
    pub fn latest_report(&self) -> Option<CycleReport> {
        self.lock().latest_report
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryInner> {
        // Poisoning can only come from a panic inside a pass; the buffers
        // are still index-aligned, so keep serving them.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Observer for HistoryStore {
    fn on_reading(&self, reading: &Reading) -> Result<(), PipelineError> {
        self.update(reading)?;
        Ok(())
    }
}
