//! thermwatch — temperature telemetry monitor
//!
//! Non-interactive driver for the telemetry pipeline: starts the
//! simulated probe, runs for a while, demonstrates pause / strategy swap
//! / resume, then stops and waits for confirmed exit. Reports land in the
//! structured log; the presentation layer is intentionally this thin.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 5 s cadence, mean/std-dev, one-minute run
//! cargo run --release -- --run-secs 60
//!
//! # Faster cadence with a reproducible probe and a mid-run strategy swap
//! cargo run --release -- --interval-secs 1 --seed 7 --strategy quantiles \
//!     --swap-to max-min --run-secs 30
//! ```
//!
//! # Environment Variables
//!
//! - `THERMWATCH_CONFIG`: path to a TOML config file
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tracing::info;

use thermwatch::{Monitor, MonitorConfig, Pipeline, SimulatedProbe, StatisticKind};

#[derive(Parser, Debug)]
#[command(name = "thermwatch")]
#[command(about = "Periodic temperature telemetry monitor")]
#[command(version)]
struct CliArgs {
    /// Seconds between readings (overrides config file)
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Alert threshold in degrees Celsius (overrides config file)
    #[arg(long)]
    threshold: Option<f64>,

    /// Statistic computed over the sliding window
    #[arg(long, value_enum, default_value_t = StatisticKind::MeanStdDev)]
    strategy: StatisticKind,

    /// Strategy to swap to at the mid-run checkpoint (omit to keep the first)
    #[arg(long, value_enum)]
    swap_to: Option<StatisticKind>,

    /// Total run time in seconds
    #[arg(long, default_value = "60")]
    run_secs: u64,

    /// Seconds to hold the mid-run pause (0 disables the checkpoint)
    #[arg(long, default_value = "2")]
    pause_secs: u64,

    /// Random seed for a reproducible probe
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    let mut config = MonitorConfig::load();
    if let Some(interval) = args.interval_secs {
        config.interval_secs = interval;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    config.validate().context("invalid configuration")?;

    let probe = match args.seed {
        Some(seed) => SimulatedProbe::with_seed(config.min_value, config.max_value, seed),
        None => SimulatedProbe::new(config.min_value, config.max_value),
    };

    let pipeline = Pipeline::standard(&config);
    let monitor = Monitor::builder(config)
        .pipeline(pipeline)
        .build()
        .context("failed to construct monitor")?;

    monitor.select_strategy(args.strategy);
    monitor
        .start(Box::new(probe))
        .context("failed to start sensor loop")?;

    // First half of the run.
    let half = Duration::from_secs(args.run_secs / 2);
    tokio::time::sleep(half).await;

    // Mid-run checkpoint: pause, optionally swap strategy, resume.
    if args.pause_secs > 0 {
        monitor.pause()?;
        if let Some(report) = monitor.latest_report() {
            info!(
                timestamp = %report.timestamp,
                statistic = ?report.statistic,
                above_threshold = report.above_threshold,
                rapid_increase = report.rapid_increase,
                "checkpoint report"
            );
        }
        if let Some(next) = args.swap_to {
            monitor.select_strategy(next);
        }
        tokio::time::sleep(Duration::from_secs(args.pause_secs)).await;
        monitor.resume()?;
    }

    // Second half, then shut down.
    tokio::time::sleep(half).await;
    monitor.stop()?;
    monitor.await_termination().await?;

    info!(
        samples = monitor.values().len(),
        last_report = ?monitor.latest_report().map(|r| r.timestamp.to_rfc3339()),
        "monitor terminated"
    );
    Ok(())
}
