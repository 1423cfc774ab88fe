//! Error context extension trait
//!
//! A context extension trait similar to `anyhow::Context` that works with
//! `Result<T, CarebookError>`, so library code can add rich context to errors
//! without giving up the typed error.

use crate::domain::errors::CarebookError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
///
/// Provides `.context()` and `.with_context()` methods for adding contextual
/// information to errors. The key difference from anyhow is that this keeps
/// the `CarebookError` type throughout library code.
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// The context is evaluated eagerly; use `.with_context()` if the context
    /// string is expensive to compute.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// The context is computed only if an error occurs.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CarebookError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| {
            let base_error = e.into();
            CarebookError::Other(format!("{context}: {base_error}"))
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let base_error = e.into();
            let context = f();
            CarebookError::Other(format!("{context}: {base_error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::StorageError;

    #[test]
    fn test_context_with_carebook_error() {
        let result: Result<()> = Err(CarebookError::Configuration("Invalid config".to_string()));
        let with_context = result.context("Failed to load configuration");

        assert!(with_context.is_err());
        let err_msg = with_context.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to load configuration"));
        assert!(err_msg.contains("Invalid config"));
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let called_clone = called.clone();

        let result: Result<i32> = Ok(42);
        let with_context = result.with_context(|| {
            called_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            "Expensive context"
        });

        // Context should NOT be evaluated for Ok results
        assert!(with_context.is_ok());
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_context_with_storage_error() {
        let result: Result<()> = Err(StorageError::Query("timeout".to_string()).into());
        let with_context = result.context("Failed to load appointment abc-123");

        assert!(with_context.is_err());
        let err_msg = with_context.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to load appointment abc-123"));
        assert!(err_msg.contains("timeout"));
    }

    #[test]
    fn test_context_chaining() {
        let result: Result<()> = Err(StorageError::Pool("Connection failed".to_string()).into());
        let with_context = result
            .context("Failed to execute query")
            .context("Failed to load payment");

        assert!(with_context.is_err());
        let err_msg = with_context.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to load payment"));
        assert!(err_msg.contains("Failed to execute query"));
        assert!(err_msg.contains("Connection failed"));
    }
}
