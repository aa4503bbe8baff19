//! Result type alias for Simplex

use super::errors::SimplexError;

/// Result type alias for Simplex operations
///
/// # Examples
///
/// ```
/// use simplex::domain::result::Result;
/// use simplex::domain::errors::SimplexError;
///
/// fn failing_function() -> Result<()> {
///     Err(SimplexError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SimplexError>;
