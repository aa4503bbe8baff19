//! Monitoring of work done by other services
//!
//! - [`operation`] - the [`ExternalOperation`] contract
//! - [`supervisor`] - the [`OperationMonitor`] that starts and sweeps jobs
//! - [`operations`] - one implementation per operation kind
//! - [`status`] - classification and validation status derived from jobs

pub mod operation;
pub mod operations;
pub mod status;
pub mod supervisor;

pub use operation::{ExternalOperation, OperationPoller};
pub use supervisor::OperationMonitor;
