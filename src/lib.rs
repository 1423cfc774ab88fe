// Carebook - Clinic Booking and Payment State Manager
// Copyright (c) 2025 Carebook Contributors
// Licensed under the MIT License

//! # Carebook - Clinic Booking and Payment State Manager
//!
//! Carebook manages the lifecycle state of clinic bookings: doctor
//! appointments, diagnostic test bookings, and the payments that activate
//! them. Every state change is validated against an explicit state machine
//! and committed atomically, so a clinic's records never end up half-updated.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Booking** appointments and diagnostic tests, with slot-conflict and
//!   duplicate-booking enforcement
//! - **Settling** payments, cascading activation to the linked booking
//! - **Advancing** bookings through their lifecycle (confirm, complete,
//!   cancel, no-show) with typed errors for every disallowed move
//! - **Recording** visit history and prescriptions alongside completion
//!
//! ## Architecture
//!
//! Carebook follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (lifecycle rules, slot enumeration, service)
//! - [`adapters`] - Storage backends (in-memory, PostgreSQL)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use carebook::adapters::memory::MemoryStore;
//! use carebook::core::booking::{BookingPolicy, BookingService};
//! use carebook::domain::directory::{Doctor, Patient};
//! use carebook::domain::payment::PaymentMethod;
//! use chrono::{NaiveDate, NaiveTime};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = BookingService::new(
//!         Arc::new(MemoryStore::new()),
//!         BookingPolicy::default(),
//!     );
//!
//!     let patient = Patient::new("Asha Rao", "9876543210");
//!     let doctor = Doctor::new("Dr. Mehta", "Cardiology", "Cardiologist", 50_000);
//!     service.register_patient(patient.clone()).await?;
//!     service.register_doctor(doctor.clone()).await?;
//!
//!     // Books the visit and its companion payment in one atomic commit
//!     let (appointment, payment) = service
//!         .book_appointment(
//!             &patient.id,
//!             &doctor.id,
//!             NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
//!             NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!             "Routine checkup",
//!             PaymentMethod::Upi,
//!         )
//!         .await?;
//!
//!     // Settling the payment schedules the appointment
//!     service.mark_paid(&payment.id).await?;
//!     println!("Booked appointment {}", appointment.id);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
