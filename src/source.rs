//! Reading sources — the probe boundary.
//!
//! The pipeline treats value generation as an external collaborator: any
//! type implementing [`ReadingSource`] can drive the sensor loop. Two
//! implementations ship with the crate: [`SimulatedProbe`] (seeded uniform
//! temperatures, the original greenhouse simulation) and [`ReplaySource`]
//! (plays back a fixed value sequence, used by tests and replays).

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SourceError;
use crate::types::Reading;

/// Produces one timestamped reading on demand.
///
/// Called from the sensor loop's execution context, once per cycle.
/// Errors terminate the loop and surface through the termination channel.
pub trait ReadingSource: Send {
    fn next_reading(&mut self) -> Result<Reading, SourceError>;
}

// ============================================================================
// Simulated Probe
// ============================================================================

/// Simulated greenhouse temperature probe.
///
/// Draws whole-degree temperatures uniformly from `[min, max]` — common
/// greenhouse crops sit around 18–24 °C, and the original system modeled
/// a ±10 °C band around that range, hence the default 8–34.
pub struct SimulatedProbe {
    rng: StdRng,
    min: i64,
    max: i64,
}

impl SimulatedProbe {
    /// Probe over the given inclusive range, seeded from entropy.
    pub fn new(min: f64, max: f64) -> Self {
        Self::with_rng(min, max, StdRng::from_entropy())
    }

    /// Probe with a fixed seed for reproducible runs.
    pub fn with_seed(min: f64, max: f64, seed: u64) -> Self {
        Self::with_rng(min, max, StdRng::seed_from_u64(seed))
    }

    fn with_rng(min: f64, max: f64, rng: StdRng) -> Self {
        Self {
            rng,
            min: min.floor() as i64,
            max: max.floor() as i64,
        }
    }
}

impl ReadingSource for SimulatedProbe {
    fn next_reading(&mut self) -> Result<Reading, SourceError> {
        let value = self.rng.gen_range(self.min..=self.max) as f64;
        Ok(Reading::new(Utc::now(), value))
    }
}

// ============================================================================
// Replay Source
// ============================================================================

/// Plays back a fixed sequence of values, timestamping each at call time.
///
/// Once the sequence is exhausted the source fails with
/// [`SourceError::Exhausted`], which terminates the sensor loop — useful
/// both as a test double and for bounded replay runs.
pub struct ReplaySource {
    values: std::vec::IntoIter<f64>,
    produced: usize,
}

impl ReplaySource {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: values.into_iter(),
            produced: 0,
        }
    }
}

impl ReadingSource for ReplaySource {
    fn next_reading(&mut self) -> Result<Reading, SourceError> {
        match self.values.next() {
            Some(value) => {
                self.produced += 1;
                Ok(Reading::new(Utc::now(), value))
            }
            None => Err(SourceError::Exhausted(self.produced)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_probe_stays_in_range() {
        let mut probe = SimulatedProbe::with_seed(8.0, 34.0, 42);
        for _ in 0..200 {
            let reading = probe.next_reading().unwrap();
            assert!((8.0..=34.0).contains(&reading.value));
            assert_eq!(reading.value.fract(), 0.0, "probe emits whole degrees");
        }
    }

    #[test]
    fn seeded_probes_are_reproducible() {
        let mut a = SimulatedProbe::with_seed(8.0, 34.0, 7);
        let mut b = SimulatedProbe::with_seed(8.0, 34.0, 7);
        for _ in 0..50 {
            assert_eq!(
                a.next_reading().unwrap().value,
                b.next_reading().unwrap().value
            );
        }
    }

    #[test]
    fn replay_source_exhausts_with_count() {
        let mut source = ReplaySource::new(vec![20.0, 25.0]);
        assert_eq!(source.next_reading().unwrap().value, 20.0);
        assert_eq!(source.next_reading().unwrap().value, 25.0);
        assert!(matches!(
            source.next_reading(),
            Err(SourceError::Exhausted(2))
        ));
    }
}
