//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - JSON-formatted logs
//! - Configurable log levels
//! - Local file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use carebook::logging::init_logging;
//! use carebook::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! // Use tracing macros for logging
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a booking state transition
///
/// # Example
///
/// ```no_run
/// use carebook::log_transition;
/// use carebook::domain::ids::AppointmentId;
///
/// let id = AppointmentId::generate();
/// log_transition!("appointment", &id, "Pending Payment", "Scheduled");
/// ```
#[macro_export]
macro_rules! log_transition {
    ($entity:expr, $id:expr, $from:expr, $to:expr) => {
        tracing::info!(
            entity = $entity,
            id = %$id,
            from = %$from,
            to = %$to,
            "State transition"
        );
    };
}

/// Log a commit rejected by a concurrent writer
///
/// # Example
///
/// ```no_run
/// use carebook::log_commit_conflict;
///
/// log_commit_conflict!("memory", "slot already taken");
/// ```
#[macro_export]
macro_rules! log_commit_conflict {
    ($backend:expr, $reason:expr) => {
        tracing::warn!(
            backend = $backend,
            reason = %$reason,
            "Guarded commit rejected"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use carebook::log_error_with_context;
/// use carebook::domain::CarebookError;
///
/// let error = CarebookError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
