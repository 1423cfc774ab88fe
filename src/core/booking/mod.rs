//! Booking and payment state management
//!
//! The lifecycle rules (`lifecycle`), slot enumeration (`slots`) and the
//! orchestrating service (`service`).

pub mod lifecycle;
pub mod service;
pub mod slots;

pub use service::{BookingPolicy, BookingService, StatusSummary};
