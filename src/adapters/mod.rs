//! Integrations with the services Simplex orchestrates.
//!
//! - [`terminology`] - terminology server: refset members, code system
//!   metadata, classification, upgrade and versioning
//! - [`release`] - release service: release candidate builds and publishing
//! - [`validation`] - validation service: content validation reports
//! - [`translation`] - translation platform: language initialisation
//!
//! Each adapter exposes a trait the job and monitor layers depend on, and an
//! HTTP implementation built on `reqwest`. Tests substitute in-memory fakes.
//!
//! ```rust,no_run
//! use simplex::adapters::terminology::{RefsetStore, TerminologyClient};
//! use simplex::config::TerminologyConfig;
//! use simplex::domain::ExecutionContext;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TerminologyClient::new(&TerminologyConfig::default())?;
//! let ctx = ExecutionContext::new("author").with_cookie("session=...");
//! let members = client.load_members(&ctx, "MAIN/SNOMEDCT-XX", "900000000000509007").await?;
//! println!("{} members", members.len());
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod release;
pub mod terminology;
pub mod translation;
pub mod validation;

pub use release::{Build, ReleaseService, ReleaseServiceClient};
pub use terminology::{AuthoringStore, RefsetStore, TerminologyClient};
pub use translation::{LanguageStats, TranslationClient, TranslationPlatform};
pub use validation::{ReportStatus, ValidationReport, ValidationService, ValidationServiceClient};
