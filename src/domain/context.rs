//! Error context extension trait
//!
//! Similar to `anyhow::Context` but keeps the [`SimplexError`] type and the
//! wrapped error, so a context-wrapped content error is still classified as a
//! content error when a job ends.
//!
//! # Examples
//!
//! ```rust
//! use simplex::domain::{SimplexError, Result};
//! use simplex::domain::context::ResultExt;
//!
//! fn read_payload(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| format!("Failed to read job payload {path}"))
//! }
//! ```

use crate::domain::errors::SimplexError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation)
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SimplexError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| SimplexError::Context {
            context: context.to_string(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| SimplexError::Context {
            context: f().to_string(),
            source: Box::new(e.into()),
        })
    }
}
