//! Core business logic
//!
//! This module contains the booking domain's business logic: state machine
//! enforcement, slot enumeration and the booking service that orchestrates
//! guarded commits against the storage layer.

pub mod booking;

pub use booking::{BookingPolicy, BookingService, StatusSummary};
