//! Result type alias for Carebook

use super::errors::CarebookError;

/// Result type alias for Carebook operations
///
/// This is a convenience type alias that uses `CarebookError` as the error
/// type. Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use carebook::domain::result::Result;
/// use carebook::domain::errors::CarebookError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(CarebookError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, CarebookError>;
