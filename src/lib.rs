// Simplex - Terminology authoring job orchestration
// Copyright (c) 2025 Simplex Contributors
// Licensed under the MIT License

//! # Simplex - Terminology Authoring Jobs
//!
//! Simplex is the job backend of a terminology authoring tool. Long running
//! work either runs locally on a bounded pool (refset updates from uploaded
//! content) or in another service (classification, validation, release
//! builds, upgrades, translation setup) and is tracked as a job either way.
//!
//! ## Overview
//!
//! This library provides:
//! - **Jobs** with a monotonic status machine, kept per code system and
//!   expired after a week
//! - **Bounded execution** of content jobs with caller context propagation
//! - **Monitoring** of operations started in other services
//! - **Reconciliation** of refset members against desired content, never
//!   deleting released members
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Jobs, monitor and reconciliation engine
//! - [`adapters`] - Terminology server, release, validation and translation clients
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use simplex::config::load_config;
//! use simplex::core::jobs::JobOrchestrator;
//! use simplex::domain::ExecutionContext;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("simplex.toml")?;
//!     let orchestrator = JobOrchestrator::from_config(&config)?;
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     orchestrator.spawn_schedulers(shutdown_rx);
//!
//!     let job = orchestrator
//!         .start_classification("SNOMEDCT-XX", ExecutionContext::new("author"))
//!         .await?;
//!     println!("{} {}", job.id(), job.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::SimplexError`]. When a job
//! fails, [`domain::SimplexError::job_status`] decides its terminal status:
//!
//! ```rust
//! use simplex::domain::{JobStatus, SimplexError};
//!
//! let err = SimplexError::user_content("Column B is empty");
//! assert_eq!(err.job_status(), JobStatus::UserContentError);
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
