//! Error taxonomy for the telemetry pipeline.
//!
//! Fatal-at-startup errors (configuration, singleton violation) abort
//! construction and never recover. Per-cycle errors (a failing pipeline
//! pass) abort that pass only; the producer loop logs them and continues.
//! Producer-side errors (reading generation failure) terminate the sensor
//! loop and are surfaced to the controller through the join handle.

use thiserror::Error;

/// Configuration validation failures. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Reading generation failures at the probe boundary.
///
/// Any of these terminates the sensor loop; the error reaches the
/// controller through [`Monitor::await_termination`](crate::Monitor::await_termination).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("reading source exhausted after {0} readings")]
    Exhausted(usize),

    #[error("reading source failed: {0}")]
    Failed(String),
}

/// Failures inside one pipeline pass. Aborts that pass only.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A statistic was invoked with zero samples. The pipeline only runs
    /// after at least one reading has been appended, so hitting this
    /// indicates a caller bypassed the history store.
    #[error("statistic invoked with an empty history window")]
    EmptyHistory,

    #[error("observer rejected reading: {0}")]
    Observer(String),
}

/// Aggregator lifecycle errors.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The aggregator was built without its stage chain.
    #[error("monitor requires a pipeline chain: {0}")]
    Configuration(String),

    /// A second live aggregator was constructed while one already exists.
    #[error("a monitor instance already exists for this process")]
    SingletonViolation,

    /// `start()` was called on an already running monitor.
    #[error("sensor loop already started")]
    AlreadyStarted,

    /// A lifecycle operation was issued before `start()`.
    #[error("sensor loop not started")]
    NotStarted,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("sensor loop terminated: {0}")]
    Source(#[from] SourceError),

    /// The producer task ended without reporting (panic or runtime
    /// shutdown mid-flight).
    #[error("sensor task failed: {0}")]
    Join(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
