//! Serve command implementation
//!
//! Builds the orchestrator and runs its schedulers until a shutdown signal
//! arrives.

use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use crate::core::jobs::JobOrchestrator;
use clap::Args;
use futures::future::join_all;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                println!("❌ Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let orchestrator = JobOrchestrator::from_config(&config)?;
        let handles = orchestrator.spawn_schedulers(shutdown.clone());
        tracing::info!(
            concurrency = config.jobs.concurrency,
            monitor_period_seconds = config.monitor.period_seconds,
            "Simplex schedulers running"
        );
        println!("🚀 Simplex running, press Ctrl+C to stop");

        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }

        for result in join_all(handles).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Scheduler task ended abnormally");
            }
        }
        tracing::info!(
            jobs = orchestrator.registry().len(),
            monitored = orchestrator.monitor().monitored_count(),
            "Simplex stopped"
        );
        Ok(EXIT_OK)
    }
}
