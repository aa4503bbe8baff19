//! Job orchestration and refset reconciliation
//!
//! # Modules
//!
//! - [`jobs`] - Job model, registry, bounded executor and the orchestrator
//! - [`monitor`] - Supervision of operations running in other services
//! - [`reconcile`] - Converging stored refset members to desired content
//!
//! # Job Workflow
//!
//! 1. **Submit**: a content job is registered `QUEUED`, an external
//!    operation is started and registered `IN_PROGRESS`
//! 2. **Drive**: the executor runs content work on a bounded pool, the
//!    monitor polls external operations on a fixed delay
//! 3. **Finish**: every job reaches exactly one terminal status
//! 4. **Expire**: jobs older than the expiry age are dropped
//!
//! # Example
//!
//! ```rust,no_run
//! use simplex::config::load_config;
//! use simplex::core::jobs::JobOrchestrator;
//! use simplex::core::reconcile::RefsetKind;
//! use simplex::domain::{ExecutionContext, MemberIntent};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("simplex.toml")?;
//! let orchestrator = JobOrchestrator::from_config(&config)?;
//!
//! let submitted = orchestrator.submit_refset_update(
//!     "SNOMEDCT-XX",
//!     "900000000000509007",
//!     RefsetKind::Simple,
//!     vec![MemberIntent::simple("404684003")],
//!     ExecutionContext::new("author"),
//! );
//! submitted.handle.await?;
//!
//! println!("{}", submitted.job.status());
//! # Ok(())
//! # }
//! ```

pub mod jobs;
pub mod monitor;
pub mod reconcile;
