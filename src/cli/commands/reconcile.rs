//! Reconcile command implementation
//!
//! Submits one refset reconciliation as a content job and waits for it to
//! reach a terminal status.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_JOB_FAILED, EXIT_OK};
use crate::config::load_config;
use crate::core::jobs::JobOrchestrator;
use crate::core::reconcile::RefsetKind;
use crate::domain::{ConceptId, ExecutionContext, JobStatus};
use clap::Args;
use std::path::Path;

/// Arguments for the reconcile command
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Code system short name
    #[arg(long)]
    pub code_system: String,

    /// Refset concept id
    #[arg(long)]
    pub refset: String,

    /// JSON file with the desired members
    #[arg(long)]
    pub members: String,

    /// Refset type (simple or correlation-map)
    #[arg(long = "type", default_value = "simple")]
    pub refset_type: String,

    /// User the job runs as
    #[arg(long, default_value = "simplex-cli", env = "SIMPLEX_USERNAME")]
    pub username: String,
}

impl ReconcileArgs {
    /// Execute the reconcile command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                println!("❌ Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let refset = match ConceptId::new(&self.refset) {
            Ok(refset) => refset,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let kind: RefsetKind = match self.refset_type.parse() {
            Ok(kind) => kind,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let orchestrator = JobOrchestrator::from_config(&config)?;
        let upload = tokio::fs::File::open(&self.members).await?;
        let filename = Path::new(&self.members)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.members.clone());

        println!(
            "🔄 Reconciling refset {refset} of {} ({kind})",
            self.code_system
        );

        let submitted = orchestrator
            .submit_refset_upload(
                &self.code_system,
                refset.as_str(),
                kind,
                &filename,
                upload,
                ExecutionContext::new(&self.username),
            )
            .await?;
        submitted.handle.await?;

        let snapshot = submitted.job.snapshot();
        println!();
        println!("Job {}: {}", snapshot.id, snapshot.status);
        if let Some(summary) = snapshot.change_summary {
            println!("  Changes: {summary}");
        }
        if let Some(message) = &snapshot.error_message {
            println!("  Message: {message}");
        }

        Ok(match snapshot.status {
            JobStatus::Complete => EXIT_OK,
            JobStatus::Queued | JobStatus::InProgress => EXIT_FATAL,
            _ => EXIT_JOB_FAILED,
        })
    }
}
