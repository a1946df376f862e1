//! The sensor loop — a pausable, cancellable periodic producer task.
//!
//! Cycle body: wait-if-paused → check-termination → produce → publish →
//! sleep(interval) → repeat. Cancellation is cooperative: the token is
//! checked at the pause gate and during the interval sleep, never
//! mid-publish, so a pass that has started always completes.
//!
//! Pause semantics: while paused the loop blocks at the gate and produces
//! nothing; the interval timer accumulates no backlog. Resume is
//! edge-triggered — the first reading after resume is produced without an
//! extra wait. `stop()` also releases a paused loop, solely so it can
//! observe the termination flag and exit; it never emits another reading
//! on the way out.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{MonitorError, SourceError};
use crate::notifier::Notifier;
use crate::source::ReadingSource;

/// Owns the source and notifier until started.
pub struct SensorLoop {
    name: String,
    source: Box<dyn ReadingSource>,
    notifier: Notifier,
    interval: Duration,
}

impl SensorLoop {
    pub fn new(
        name: impl Into<String>,
        source: Box<dyn ReadingSource>,
        notifier: Notifier,
        interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            notifier,
            interval,
        }
    }

    /// Begin the periodic cycle on a dedicated task.
    ///
    /// Consumes the loop, so a second `start` on the same loop cannot be
    /// expressed. Must be called from within a tokio runtime.
    pub fn start(self) -> SensorController {
        let cancel = CancellationToken::new();
        let (pause_tx, pause_rx) = watch::channel(false);
        let name = self.name.clone();
        let handle = tokio::spawn(self.run(cancel.clone(), pause_rx));
        info!(sensor = %name, "sensor loop started");
        SensorController {
            name,
            cancel,
            pause_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    async fn run(
        mut self,
        cancel: CancellationToken,
        mut paused: watch::Receiver<bool>,
    ) -> Result<(), SourceError> {
        loop {
            // Pause gate. stop() cancels the token, which also wakes a
            // paused loop so the termination check below can run.
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = paused.wait_for(|p| !*p) => {
                    if changed.is_err() {
                        // Controller dropped; nothing can resume us.
                        break;
                    }
                }
            }
            if cancel.is_cancelled() {
                break;
            }

            let reading = match self.source.next_reading() {
                Ok(reading) => reading,
                Err(e) => {
                    error!(sensor = %self.name, error = %e, "reading source failed, terminating loop");
                    return Err(e);
                }
            };

            // One bad pass aborts this cycle only, not the producer.
            if let Err(e) = self.notifier.publish(&reading) {
                warn!(sensor = %self.name, error = %e, "publish cycle aborted");
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!(sensor = %self.name, "sensor loop stopped");
        Ok(())
    }
}

// ============================================================================
// Controller Handle
// ============================================================================

/// Controller-side handle: pause, resume, stop, join.
pub struct SensorController {
    name: String,
    cancel: CancellationToken,
    pause_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<Result<(), SourceError>>>>,
}

impl SensorController {
    /// Suspend production before the next reading. Idempotent.
    pub fn pause(&self) {
        if self.pause_tx.send(true).is_ok() {
            info!(sensor = %self.name, "sensor paused");
        }
    }

    /// Release the pause; production continues immediately. Idempotent.
    pub fn resume(&self) {
        if self.pause_tx.send(false).is_ok() {
            info!(sensor = %self.name, "sensor resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.pause_tx.borrow()
    }

    /// Mark the loop for termination. Takes effect at the next cycle
    /// boundary; a paused loop is released just far enough to exit.
    pub fn stop(&self) {
        self.cancel.cancel();
        info!(sensor = %self.name, "sensor stop requested");
    }

    /// Wait for confirmed loop exit. Never deadlocks, even when `stop()`
    /// was issued while the loop was paused. Returns the loop's terminal
    /// result; joining an already-joined loop is a no-op.
    pub async fn join(&self) -> Result<(), MonitorError> {
        let handle = {
            let mut guard = match self.handle.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.take()
        };
        match handle {
            Some(handle) => match handle.await {
                Ok(result) => result.map_err(MonitorError::from),
                Err(e) => Err(MonitorError::Join(e.to_string())),
            },
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::notifier::Observer;
    use crate::source::ReplaySource;
    use crate::types::Reading;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter(AtomicUsize);

    impl Observer for Counter {
        fn on_reading(&self, _reading: &Reading) -> Result<(), PipelineError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn counting_loop(values: Vec<f64>, interval_ms: u64) -> (SensorLoop, Arc<Counter>) {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let mut notifier = Notifier::new();
        notifier.subscribe(counter.clone());
        let sensor = SensorLoop::new(
            "test",
            Box::new(ReplaySource::new(values)),
            notifier,
            Duration::from_millis(interval_ms),
        );
        (sensor, counter)
    }

    #[tokio::test]
    async fn produces_first_reading_without_initial_wait() {
        let (sensor, counter) = counting_loop(vec![20.0; 100], 5_000);
        let controller = sensor.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        controller.stop();
        controller.join().await.unwrap();
    }

    #[tokio::test]
    async fn pause_blocks_production_until_resume() {
        let (sensor, counter) = counting_loop(vec![20.0; 1000], 20);
        let controller = sensor.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.pause();
        // Let any in-flight cycle finish its sleep before sampling.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let frozen = counter.0.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), frozen);

        controller.resume();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(counter.0.load(Ordering::SeqCst) > frozen);

        controller.stop();
        controller.join().await.unwrap();
    }

    #[tokio::test]
    async fn stop_while_paused_joins_promptly() {
        let (sensor, counter) = counting_loop(vec![20.0; 1000], 20);
        let controller = sensor.start();
        tokio::time::sleep(Duration::from_millis(60)).await;
        controller.pause();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let produced_at_stop = counter.0.load(Ordering::SeqCst);

        controller.stop();
        tokio::time::timeout(Duration::from_millis(500), controller.join())
            .await
            .expect("join must not deadlock on a paused loop")
            .unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), produced_at_stop);
    }

    #[tokio::test]
    async fn exhausted_source_surfaces_through_join() {
        let (sensor, counter) = counting_loop(vec![20.0, 21.0], 10);
        let controller = sensor.start();
        let result = controller.join().await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        assert!(matches!(
            result,
            Err(MonitorError::Source(SourceError::Exhausted(2)))
        ));
    }

    #[tokio::test]
    async fn double_join_is_a_noop() {
        let (sensor, _counter) = counting_loop(vec![20.0; 10], 10);
        let controller = sensor.start();
        controller.stop();
        let _ = controller.join().await;
        assert!(controller.join().await.is_ok());
    }
}
