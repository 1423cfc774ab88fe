//! Domain error types
//!
//! The error hierarchy for Carebook. All errors are domain-specific and don't
//! expose third-party types; every booking rule violation maps to exactly one
//! `BookingError` variant so callers can present a precise message.

use crate::domain::ids::{DoctorId, PaymentId, PatientId};
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// Main Carebook error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum CarebookError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Booking rule violations (duplicate bookings, slot conflicts,
    /// disallowed transitions)
    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl CarebookError {
    /// Returns the inner booking error, if this is one
    pub fn as_booking(&self) -> Option<&BookingError> {
        match self {
            CarebookError::Booking(e) => Some(e),
            _ => None,
        }
    }
}

/// Booking rule violations
///
/// Every failed state transition or uniqueness check surfaces as one of these
/// variants. A failed operation never mutates stored state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    /// An active (non-cancelled) booking already exists for the same
    /// patient and target
    #[error("Patient {patient} already has an active booking for {target}")]
    DuplicateBooking { patient: PatientId, target: String },

    /// The requested appointment slot is held by a non-cancelled appointment
    #[error("Doctor {doctor} already has an appointment on {date} at {time}")]
    SlotConflict {
        doctor: DoctorId,
        date: NaiveDate,
        time: NaiveTime,
    },

    /// The payment references neither an appointment nor a test booking
    #[error("Payment {0} is not linked to an appointment or a test booking")]
    UnlinkedPayment(PaymentId),

    /// The payment references both an appointment and a test booking
    #[error("Payment {0} is linked to both an appointment and a test booking")]
    DualLink(PaymentId),

    /// Cancellation requested for a booking that may no longer be cancelled
    #[error("Cancellation not allowed: {0}")]
    CancellationNotAllowed(String),

    /// The requested transition is not an edge of the entity's state machine
    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}

/// Storage backend errors
///
/// Errors raised by the in-memory and PostgreSQL stores. These don't expose
/// driver types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to obtain a connection from the pool
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// A query or statement failed
    #[error("Query failed: {0}")]
    Query(String),

    /// A guarded commit was rejected because a concurrent writer changed
    /// the underlying row
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    Migration(String),

    /// A stored row could not be mapped back to a domain entity
    #[error("Row mapping failed: {0}")]
    Mapping(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for CarebookError {
    fn from(err: std::io::Error) -> Self {
        CarebookError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CarebookError {
    fn from(err: serde_json::Error) -> Self {
        CarebookError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CarebookError {
    fn from(err: toml::de::Error) -> Self {
        CarebookError::Configuration(format!("TOML parse error: {err}"))
    }
}
