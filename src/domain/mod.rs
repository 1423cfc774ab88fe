//! Domain models and types for Carebook.
//!
//! This module contains the entities of the booking/payment lifecycle, the
//! directory records they reference, and the crate's error types.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`PatientId`], [`AppointmentId`],
//!   [`PaymentId`], ...) built on the newtype pattern so different id kinds
//!   cannot be mixed up
//! - **Lifecycle entities** ([`Appointment`], [`TestBooking`], [`Payment`],
//!   [`PatientHistory`], [`Prescription`]) with their status machines
//! - **Directory entities** ([`Patient`], [`Doctor`], [`Lab`],
//!   [`DiagnosticTest`], [`DoctorAvailability`])
//! - **Error types** ([`CarebookError`], [`BookingError`], [`StorageError`])
//!   and the crate-wide [`Result`] alias
//!
//! # Status machines
//!
//! Each status enum carries its own transition table
//! (`valid_transitions` / `can_transition_to` / `is_terminal`); enforcement
//! of those edges lives in [`crate::core::booking`].
//!
//! ```rust
//! use carebook::domain::AppointmentStatus;
//!
//! assert!(AppointmentStatus::PendingPayment.can_transition_to(AppointmentStatus::Scheduled));
//! assert!(!AppointmentStatus::Completed.can_transition_to(AppointmentStatus::Scheduled));
//! ```

pub mod appointment;
pub mod availability;
pub mod context;
pub mod directory;
pub mod errors;
pub mod history;
pub mod ids;
pub mod payment;
pub mod prescription;
pub mod result;
pub mod test_booking;

// Re-export commonly used types for convenience
pub use appointment::{Appointment, AppointmentStatus};
pub use availability::DoctorAvailability;
pub use directory::{BloodGroup, DiagnosticTest, Doctor, Lab, Patient, SampleType, TestCategory};
pub use errors::{BookingError, CarebookError, StorageError};
pub use history::PatientHistory;
pub use ids::{
    AppointmentId, DoctorId, HistoryId, LabId, PatientId, PaymentId, PrescriptionId,
    TestBookingId, TestId,
};
pub use payment::{Payment, PaymentLink, PaymentMethod, PaymentStatus};
pub use prescription::{Prescription, PrescriptionStatus};
pub use result::Result;
pub use test_booking::{TestBooking, TestBookingStatus};
