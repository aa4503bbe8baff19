//! Caller identity captured when work is submitted
//!
//! Jobs run on worker tasks and in the monitor sweep, long after the request
//! that created them has finished. The [`ExecutionContext`] is captured at
//! submission and handed explicitly to every work and poll function so calls
//! to other services are made on behalf of the original user.

use crate::config::secret::{secret_string, SecretString};
use secrecy::ExposeSecret;
use std::fmt;

/// How the caller authenticates to downstream services
#[derive(Clone)]
pub enum Credential {
    /// Forwarded single sign-on cookie (`Cookie` header)
    Cookie(SecretString),
    /// Bearer token (`Authorization: Bearer ...`)
    Bearer(SecretString),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cookie(_) => f.write_str("Cookie([REDACTED])"),
            Self::Bearer(_) => f.write_str("Bearer([REDACTED])"),
        }
    }
}

impl Credential {
    /// The header name and value to send with a request
    pub fn header(&self) -> (&'static str, String) {
        match self {
            Self::Cookie(cookie) => ("Cookie", cookie.expose_secret().to_string()),
            Self::Bearer(token) => (
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            ),
        }
    }
}

/// Identity of the user a job runs for
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    username: String,
    credential: Option<Credential>,
}

impl ExecutionContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            credential: None,
        }
    }

    /// Context for scheduled work not started by a user
    ///
    /// Adapters fall back to their configured service account.
    pub fn system() -> Self {
        Self::new("system")
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.credential = Some(Credential::Cookie(secret_string(cookie.into())));
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(Credential::Bearer(secret_string(token.into())));
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}
