//! Synchronous publish/subscribe primitive for sensor readings.
//!
//! Delivery is inline on the publisher's execution context: no queuing,
//! no parallel fan-out. A failing observer is not caught here — the error
//! propagates to the publisher, which owns the decision of what a failed
//! publish cycle means (the sensor loop logs it and moves on).

use std::sync::Arc;

use crate::error::PipelineError;
use crate::types::Reading;

/// Receives each published reading, in registration order.
pub trait Observer: Send + Sync {
    fn on_reading(&self, reading: &Reading) -> Result<(), PipelineError>;
}

/// Holds the subscriber set and fans each reading out to it.
#[derive(Default)]
pub struct Notifier {
    observers: Vec<Arc<dyn Observer>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Duplicate registrations are allowed and each
    /// receives its own delivery; order of registration is preserved.
    pub fn subscribe(&mut self, observer: Arc<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Remove the first registration of `observer` (pointer identity).
    /// No-op when the observer was never subscribed.
    pub fn unsubscribe(&mut self, observer: &Arc<dyn Observer>) {
        // Compare data pointers, not fat pointers: vtable addresses are
        // not stable across codegen units.
        let target = Arc::as_ptr(observer) as *const ();
        if let Some(pos) = self
            .observers
            .iter()
            .position(|o| std::ptr::eq(Arc::as_ptr(o) as *const (), target))
        {
            self.observers.remove(pos);
        }
    }

    /// Number of current registrations.
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    /// Deliver `reading` to every current subscriber, in registration
    /// order, on the caller's context. The first observer failure aborts
    /// the remaining deliveries and propagates to the caller.
    pub fn publish(&self, reading: &Reading) -> Result<(), PipelineError> {
        for observer in &self.observers {
            observer.on_reading(reading)?;
        }
        Ok(())
    }
}
