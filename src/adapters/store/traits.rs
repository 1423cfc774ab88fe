//! Storage abstraction traits
//!
//! This module defines the trait that storage backends must implement to work
//! with Carebook. Reads are individual methods; every mutation of lifecycle
//! state goes through [`BookingStore::apply`] so the backend can enforce the
//! read-check-write discipline in one atomic unit.

use crate::adapters::store::changeset::Changeset;
use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::availability::DoctorAvailability;
use crate::domain::directory::{DiagnosticTest, Doctor, Lab, Patient};
use crate::domain::history::PatientHistory;
use crate::domain::ids::{AppointmentId, DoctorId, PatientId, PaymentId, TestBookingId, TestId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::prescription::Prescription;
use crate::domain::test_booking::{TestBooking, TestBookingStatus};
use crate::domain::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

/// Storage backend for the booking state manager
///
/// Directory records (patients, doctors, labs, tests, availability) are
/// upserted directly; they are reference data, not lifecycle state. Lifecycle
/// entities are only ever written through [`BookingStore::apply`].
#[async_trait]
pub trait BookingStore: Send + Sync {
    // --- directory ---

    async fn put_patient(&self, patient: Patient) -> Result<()>;
    async fn patient(&self, id: &PatientId) -> Result<Option<Patient>>;

    async fn put_doctor(&self, doctor: Doctor) -> Result<()>;
    async fn doctor(&self, id: &DoctorId) -> Result<Option<Doctor>>;

    async fn put_lab(&self, lab: Lab) -> Result<()>;
    async fn lab(&self, id: &crate::domain::ids::LabId) -> Result<Option<Lab>>;

    async fn put_diagnostic_test(&self, test: DiagnosticTest) -> Result<()>;
    async fn diagnostic_test(&self, id: &TestId) -> Result<Option<DiagnosticTest>>;

    async fn put_availability(&self, availability: DoctorAvailability) -> Result<()>;
    async fn availability(&self, doctor: &DoctorId) -> Result<Option<DoctorAvailability>>;

    // --- lifecycle reads ---

    async fn appointment(&self, id: &AppointmentId) -> Result<Option<Appointment>>;
    async fn test_booking(&self, id: &TestBookingId) -> Result<Option<TestBooking>>;
    async fn payment(&self, id: &PaymentId) -> Result<Option<Payment>>;

    /// The non-cancelled appointment holding (doctor, date, time), if any
    async fn find_active_appointment_for_slot(
        &self,
        doctor: &DoctorId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>>;

    /// An active (non-cancelled, non-finished) appointment between the
    /// patient and doctor, if any
    async fn find_active_appointment_for_patient(
        &self,
        patient: &PatientId,
        doctor: &DoctorId,
    ) -> Result<Option<Appointment>>;

    /// An active (non-cancelled) booking of this test by this patient, if any
    async fn find_active_test_booking(
        &self,
        patient: &PatientId,
        test: &TestId,
    ) -> Result<Option<TestBooking>>;

    /// History records for a patient, newest first
    async fn history_for_patient(&self, patient: &PatientId) -> Result<Vec<PatientHistory>>;

    /// Prescriptions for a patient, newest first
    async fn prescriptions_for_patient(&self, patient: &PatientId) -> Result<Vec<Prescription>>;

    // --- summaries ---

    async fn appointment_status_counts(&self) -> Result<Vec<(AppointmentStatus, u64)>>;
    async fn test_booking_status_counts(&self) -> Result<Vec<(TestBookingStatus, u64)>>;
    async fn payment_status_counts(&self) -> Result<Vec<(PaymentStatus, u64)>>;

    // --- mutation ---

    /// Applies a guarded changeset atomically
    ///
    /// Either every write in the changeset lands or none does. Each guard is
    /// re-verified inside the same transaction; the first violated guard's
    /// error is returned and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the violated guard's error, or a storage error if the commit
    /// itself fails.
    async fn apply(&self, changeset: Changeset) -> Result<()>;
}
