//! thermwatch: periodic temperature telemetry pipeline
//!
//! A simulated probe emits a timestamped reading on a fixed interval; a
//! single aggregator appends each reading to a growing history and runs
//! it through a fixed chain of analysis stages with a bounded sliding
//! window and a runtime-swappable statistic.
//!
//! ## Architecture
//!
//! - **ReadingSource**: produces one (timestamp, value) reading on demand
//! - **SensorLoop**: pausable, cancellable periodic producer task
//! - **Notifier**: synchronous publish/subscribe fan-out
//! - **HistoryStore**: the sole subscriber; append-aligned buffers
//! - **Pipeline**: statistics → threshold → rate-of-change stage chain
//! - **Statistic**: mean/std-dev, quantiles, or max/min over the window
//! - **Monitor**: the aggregator owning the whole lifecycle
//!
//! Data flow: ReadingSource → SensorLoop → Notifier → HistoryStore →
//! Pipeline (Stage₁ → Stage₂ → Stage₃) → Statistic.

pub mod config;
pub mod error;
pub mod history;
pub mod monitor;
pub mod notifier;
pub mod pipeline;
pub mod sensor;
pub mod source;
pub mod stats;
pub mod types;

pub use config::MonitorConfig;
pub use error::{ConfigError, MonitorError, PipelineError, SourceError};
pub use history::HistoryStore;
pub use monitor::{Monitor, MonitorBuilder};
pub use notifier::{Notifier, Observer};
pub use pipeline::{Pipeline, PipelineBuilder, RateOfChangeStage, Stage, StatisticsStage, ThresholdStage};
pub use sensor::{SensorController, SensorLoop};
pub use source::{ReadingSource, ReplaySource, SimulatedProbe};
pub use stats::{MaxMin, MeanStdDev, Quantiles, Statistic, StrategySlot};
pub use types::{CycleReport, Reading, StatisticKind, StatisticResult};
