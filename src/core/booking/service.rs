//! Booking service - main orchestrator for booking and payment state
//!
//! All lifecycle mutations go through this service. Each operation follows
//! the same shape: load the entities involved, validate the requested change
//! with the pure lifecycle rules, then commit a guarded changeset so the
//! store re-verifies the same conditions atomically. A failed operation never
//! leaves partial state behind.

use crate::adapters::store::changeset::{Changeset, StoreGuard, StoreWrite};
use crate::adapters::store::traits::BookingStore;
use crate::core::booking::lifecycle;
use crate::core::booking::slots;
use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::availability::DoctorAvailability;
use crate::domain::directory::{DiagnosticTest, Doctor, Lab, Patient};
use crate::domain::errors::{BookingError, CarebookError};
use crate::domain::history::PatientHistory;
use crate::domain::ids::{
    AppointmentId, DoctorId, LabId, PatientId, PaymentId, TestBookingId, TestId,
};
use crate::domain::payment::{Payment, PaymentLink, PaymentMethod, PaymentStatus};
use crate::domain::prescription::Prescription;
use crate::domain::test_booking::{TestBooking, TestBookingStatus};
use crate::domain::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

/// Tunable booking rules
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingPolicy {
    /// Minimum notice, in hours, required to cancel a booking
    ///
    /// Zero (the default) allows cancellation any time before the slot.
    pub min_cancellation_notice_hours: i64,
}

/// Status counts across all three lifecycle entities
#[derive(Debug, Clone, Default)]
pub struct StatusSummary {
    pub appointments: Vec<(AppointmentStatus, u64)>,
    pub test_bookings: Vec<(TestBookingStatus, u64)>,
    pub payments: Vec<(PaymentStatus, u64)>,
}

/// Booking and payment state manager
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    policy: BookingPolicy,
}

impl BookingService {
    /// Creates a service over the given store with the given policy
    pub fn new(store: Arc<dyn BookingStore>, policy: BookingPolicy) -> Self {
        Self { store, policy }
    }

    /// The underlying store, for read-only queries
    pub fn store(&self) -> &Arc<dyn BookingStore> {
        &self.store
    }

    // --- directory ---

    /// Registers or updates a patient record
    pub async fn register_patient(&self, patient: Patient) -> Result<()> {
        self.store.put_patient(patient).await
    }

    /// Registers or updates a doctor record
    pub async fn register_doctor(&self, doctor: Doctor) -> Result<()> {
        self.store.put_doctor(doctor).await
    }

    /// Registers or updates a lab record
    pub async fn register_lab(&self, lab: Lab) -> Result<()> {
        self.store.put_lab(lab).await
    }

    /// Registers or updates a diagnostic test offered by a lab
    pub async fn register_test(&self, test: DiagnosticTest) -> Result<()> {
        self.store.put_diagnostic_test(test).await
    }

    /// Sets a doctor's weekly availability template
    ///
    /// # Errors
    ///
    /// Returns a validation error if the template is inconsistent (inverted
    /// hours, break outside working hours, zero-length slots).
    pub async fn set_availability(&self, availability: DoctorAvailability) -> Result<()> {
        availability.validate()?;
        self.store.put_availability(availability).await
    }

    // --- booking ---

    /// Books an appointment with a doctor
    ///
    /// Creates the appointment in `Pending Payment` together with its
    /// companion payment, priced at the doctor's consultation fee. The two
    /// are committed as one unit: if the slot is taken or the patient
    /// already has an active appointment with this doctor, neither is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown patient or doctor, a validation error
    /// for inactive doctors or slots outside the doctor's availability,
    /// `DuplicateBooking` or `SlotConflict` when the booking rules reject
    /// the request.
    pub async fn book_appointment(
        &self,
        patient_id: &PatientId,
        doctor_id: &DoctorId,
        date: NaiveDate,
        time: NaiveTime,
        reason: impl Into<String>,
        method: PaymentMethod,
    ) -> Result<(Appointment, Payment)> {
        let patient = self.require_patient(patient_id).await?;
        let doctor = self.require_doctor(doctor_id).await?;

        if !doctor.is_active {
            return Err(CarebookError::Validation(format!(
                "Doctor {} is not accepting appointments",
                doctor.id
            )));
        }

        // Working-hours check only applies when a template is on file
        if let Some(availability) = self.store.availability(doctor_id).await? {
            if !slots::is_bookable(&availability, date, time) {
                return Err(CarebookError::Validation(format!(
                    "Doctor {} has no bookable slot on {date} at {time}",
                    doctor.id
                )));
            }
        }

        // Pre-checks give the caller a clean error before we build anything;
        // the guards below repeat them inside the store's transaction
        if self
            .store
            .find_active_appointment_for_patient(patient_id, doctor_id)
            .await?
            .is_some()
        {
            return Err(BookingError::DuplicateBooking {
                patient: patient.id,
                target: format!("doctor {}", doctor.id),
            }
            .into());
        }
        if self
            .store
            .find_active_appointment_for_slot(doctor_id, date, time)
            .await?
            .is_some()
        {
            return Err(BookingError::SlotConflict {
                doctor: doctor.id,
                date,
                time,
            }
            .into());
        }

        let appointment = Appointment::new(patient.id, doctor.id, date, time, reason);
        let payment = Payment::for_appointment(
            patient.id,
            appointment.id,
            doctor.consultation_fee,
            method,
        );

        let changeset = Changeset::new()
            .guard(StoreGuard::SlotFree {
                doctor: doctor.id,
                date,
                time,
            })
            .guard(StoreGuard::NoActiveAppointment {
                patient: patient.id,
                doctor: doctor.id,
            })
            .write(StoreWrite::PutAppointment(appointment.clone()))
            .write(StoreWrite::PutPayment(payment.clone()));
        self.store.apply(changeset).await?;

        tracing::info!(
            appointment = %appointment.id,
            payment = %payment.id,
            doctor = %doctor.id,
            %date,
            %time,
            "Appointment booked"
        );
        Ok((appointment, payment))
    }

    /// Books a diagnostic test at the lab that offers it
    ///
    /// Creates the booking in `Pending Payment` together with its companion
    /// payment, priced at the test's listed price.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown patient or test, a validation error
    /// for inactive tests, `DuplicateBooking` if the patient already has an
    /// active booking for this test.
    pub async fn book_test(
        &self,
        patient_id: &PatientId,
        test_id: &TestId,
        booking_date: NaiveDate,
        method: PaymentMethod,
    ) -> Result<(TestBooking, Payment)> {
        let patient = self.require_patient(patient_id).await?;
        let test = self
            .store
            .diagnostic_test(test_id)
            .await?
            .ok_or_else(|| CarebookError::NotFound(format!("test {test_id}")))?;

        if !test.is_active {
            return Err(CarebookError::Validation(format!(
                "Test {} is no longer offered",
                test.id
            )));
        }

        if self
            .store
            .find_active_test_booking(patient_id, test_id)
            .await?
            .is_some()
        {
            return Err(BookingError::DuplicateBooking {
                patient: patient.id,
                target: format!("test {}", test.id),
            }
            .into());
        }

        let booking = TestBooking::new(patient.id, test.id, test.lab, booking_date);
        let payment =
            Payment::for_test_booking(patient.id, booking.id, test.price, method);

        let changeset = Changeset::new()
            .guard(StoreGuard::NoActiveTestBooking {
                patient: patient.id,
                test: test.id,
            })
            .write(StoreWrite::PutTestBooking(booking.clone()))
            .write(StoreWrite::PutPayment(payment.clone()));
        self.store.apply(changeset).await?;

        tracing::info!(
            booking = %booking.id,
            payment = %payment.id,
            test = %test.id,
            date = %booking_date,
            "Diagnostic test booked"
        );
        Ok((booking, payment))
    }

    // --- payments ---

    /// Marks a payment paid and activates the linked booking
    ///
    /// A `Pending Payment` appointment becomes `Scheduled`; a
    /// `Pending Payment` test booking becomes `Booked`. The payment update
    /// and the cascade commit as one unit. If the booking has already left
    /// `Pending Payment` (for example, it was cancelled while the payment
    /// was in flight) the payment still settles and no cascade happens.
    /// Marking an already-paid payment is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown payments, `UnlinkedPayment` or
    /// `DualLink` for malformed link state.
    pub async fn mark_paid(&self, payment_id: &PaymentId) -> Result<Payment> {
        let payment = self.require_payment(payment_id).await?;
        if payment.status == PaymentStatus::Paid {
            tracing::debug!(payment = %payment.id, "Payment already settled");
            return Ok(payment);
        }

        let link = payment.link()?;
        lifecycle::ensure_payment_settles(payment.status)?;

        let mut changeset = Changeset::new()
            .guard(StoreGuard::PaymentStatusIs {
                id: payment.id,
                expected: payment.status,
            })
            .write(StoreWrite::PutPayment(payment.with_status(PaymentStatus::Paid)));

        match link {
            PaymentLink::Appointment(id) => {
                let appointment = self.require_appointment(&id).await?;
                if appointment.status == AppointmentStatus::PendingPayment {
                    changeset = changeset
                        .guard(StoreGuard::AppointmentStatusIs {
                            id: appointment.id,
                            expected: AppointmentStatus::PendingPayment,
                        })
                        .write(StoreWrite::PutAppointment(
                            appointment.with_status(AppointmentStatus::Scheduled),
                        ));
                } else {
                    tracing::warn!(
                        payment = %payment.id,
                        appointment = %appointment.id,
                        status = %appointment.status,
                        "Payment settled but appointment is not awaiting it; skipping cascade"
                    );
                }
            }
            PaymentLink::TestBooking(id) => {
                let booking = self.require_test_booking(&id).await?;
                if booking.status == TestBookingStatus::PendingPayment {
                    changeset = changeset
                        .guard(StoreGuard::TestBookingStatusIs {
                            id: booking.id,
                            expected: TestBookingStatus::PendingPayment,
                        })
                        .write(StoreWrite::PutTestBooking(
                            booking.with_status(TestBookingStatus::Booked),
                        ));
                } else {
                    tracing::warn!(
                        payment = %payment.id,
                        booking = %booking.id,
                        status = %booking.status,
                        "Payment settled but test booking is not awaiting it; skipping cascade"
                    );
                }
            }
        }

        self.store.apply(changeset).await?;
        tracing::info!(payment = %payment.id, "Payment settled");
        self.require_payment(payment_id).await
    }

    /// Marks a payment failed
    ///
    /// Failed payments stay retryable through [`BookingService::mark_paid`].
    /// Marking an already-failed payment is a no-op; a settled payment
    /// cannot fail.
    pub async fn mark_failed(&self, payment_id: &PaymentId) -> Result<Payment> {
        let payment = self.require_payment(payment_id).await?;
        match payment.status {
            PaymentStatus::Failed => return Ok(payment),
            PaymentStatus::Paid => {
                return Err(BookingError::InvalidTransition {
                    entity: "payment",
                    from: PaymentStatus::Paid.to_string(),
                    to: PaymentStatus::Failed.to_string(),
                }
                .into());
            }
            PaymentStatus::Pending => {}
        }

        let updated = payment.with_status(PaymentStatus::Failed);
        let changeset = Changeset::new()
            .guard(StoreGuard::PaymentStatusIs {
                id: payment.id,
                expected: PaymentStatus::Pending,
            })
            .write(StoreWrite::PutPayment(updated.clone()));
        self.store.apply(changeset).await?;

        tracing::warn!(payment = %payment.id, "Payment marked failed");
        Ok(updated)
    }

    // --- appointment lifecycle ---

    /// Cancels an appointment
    ///
    /// Allowed while the appointment is `Pending Payment` or `Scheduled`,
    /// and only up to the policy's notice period before the slot. `now` is
    /// clinic-local time.
    ///
    /// # Errors
    ///
    /// Returns `CancellationNotAllowed` with the reason.
    pub async fn cancel_appointment(
        &self,
        id: &AppointmentId,
        now: NaiveDateTime,
    ) -> Result<Appointment> {
        let appointment = self.require_appointment(id).await?;
        lifecycle::ensure_appointment_cancellable(
            appointment.status,
            appointment.scheduled_at(),
            now,
            self.policy.min_cancellation_notice_hours,
        )?;

        let updated = appointment.with_status(AppointmentStatus::Cancelled);
        self.commit_appointment(&appointment, updated).await
    }

    /// Confirms an appointment
    ///
    /// Accepted from `Scheduled`, or from `Pending Payment` when the doctor
    /// confirms before the payment has settled.
    pub async fn confirm_appointment(&self, id: &AppointmentId) -> Result<Appointment> {
        let appointment = self.require_appointment(id).await?;
        lifecycle::ensure_appointment_advance(
            appointment.status,
            AppointmentStatus::Confirmed,
        )?;
        let updated = appointment.with_status(AppointmentStatus::Confirmed);
        self.commit_appointment(&appointment, updated).await
    }

    /// Completes an appointment, recording the visit outcome
    ///
    /// Accepted from `Confirmed` or `Scheduled` (a paid visit need not have
    /// been confirmed). The appointment update and the history record commit
    /// as one unit: every completed visit has its history entry.
    pub async fn complete_appointment(
        &self,
        id: &AppointmentId,
        diagnosis: impl Into<String>,
        treatment: impl Into<String>,
        notes: impl Into<String>,
        recorded_date: NaiveDate,
    ) -> Result<(Appointment, PatientHistory)> {
        let appointment = self.require_appointment(id).await?;
        lifecycle::ensure_appointment_advance(
            appointment.status,
            AppointmentStatus::Completed,
        )?;

        let history = PatientHistory::new(
            appointment.patient,
            appointment.doctor,
            appointment.id,
            diagnosis,
            treatment,
            notes,
            recorded_date,
        );
        let updated = appointment.with_status(AppointmentStatus::Completed);

        let changeset = Changeset::new()
            .guard(StoreGuard::AppointmentStatusIs {
                id: appointment.id,
                expected: appointment.status,
            })
            .write(StoreWrite::PutAppointment(updated.clone()))
            .write(StoreWrite::PutHistory(history.clone()));
        self.store.apply(changeset).await?;

        tracing::info!(
            appointment = %updated.id,
            history = %history.id,
            "Appointment completed"
        );
        Ok((updated, history))
    }

    /// Marks a scheduled appointment as a no-show
    pub async fn mark_no_show(&self, id: &AppointmentId) -> Result<Appointment> {
        self.advance_appointment(id, AppointmentStatus::NoShow).await
    }

    // --- test booking lifecycle ---

    /// Cancels a test booking
    ///
    /// Allowed while the booking is `Pending Payment` or `Booked`, up to the
    /// policy's notice period before the collection date.
    pub async fn cancel_test_booking(
        &self,
        id: &TestBookingId,
        now: NaiveDateTime,
    ) -> Result<TestBooking> {
        let booking = self.require_test_booking(id).await?;
        lifecycle::ensure_test_booking_cancellable(
            booking.status,
            booking.scheduled_at(),
            now,
            self.policy.min_cancellation_notice_hours,
        )?;

        let updated = booking.with_status(TestBookingStatus::Cancelled);
        self.commit_test_booking(&booking, updated).await
    }

    /// Completes a booked test, recording the result notes
    pub async fn complete_test_booking(
        &self,
        id: &TestBookingId,
        result_notes: impl Into<String>,
    ) -> Result<TestBooking> {
        let booking = self.require_test_booking(id).await?;
        lifecycle::ensure_test_booking_transition(
            booking.status,
            TestBookingStatus::Completed,
        )?;

        let updated = booking.with_result(result_notes);
        self.commit_test_booking(&booking, updated).await
    }

    // --- prescriptions and queries ---

    /// Issues a prescription against an appointment
    ///
    /// # Errors
    ///
    /// Returns a validation error unless the appointment is `Scheduled`,
    /// `Confirmed` or `Completed`.
    pub async fn add_prescription(
        &self,
        appointment_id: &AppointmentId,
        medicine_name: impl Into<String>,
        dosage: impl Into<String>,
        frequency: impl Into<String>,
        duration: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Result<Prescription> {
        let appointment = self.require_appointment(appointment_id).await?;
        match appointment.status {
            AppointmentStatus::Scheduled
            | AppointmentStatus::Confirmed
            | AppointmentStatus::Completed => {}
            other => {
                return Err(CarebookError::Validation(format!(
                    "Cannot prescribe against a {other} appointment"
                )));
            }
        }

        let prescription = Prescription::new(
            appointment.id,
            appointment.patient,
            appointment.doctor,
            medicine_name,
            dosage,
            frequency,
            duration,
            instructions,
        );
        let changeset =
            Changeset::new().write(StoreWrite::PutPrescription(prescription.clone()));
        self.store.apply(changeset).await?;

        tracing::info!(
            prescription = %prescription.id,
            appointment = %appointment.id,
            "Prescription issued"
        );
        Ok(prescription)
    }

    /// History records for a patient, newest first
    pub async fn patient_history(&self, patient: &PatientId) -> Result<Vec<PatientHistory>> {
        self.store.history_for_patient(patient).await
    }

    /// Prescriptions for a patient, newest first
    pub async fn patient_prescriptions(
        &self,
        patient: &PatientId,
    ) -> Result<Vec<Prescription>> {
        self.store.prescriptions_for_patient(patient).await
    }

    /// The slots a doctor offers on a date, from the availability template
    pub async fn bookable_slots(
        &self,
        doctor: &DoctorId,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>> {
        match self.store.availability(doctor).await? {
            Some(availability) => Ok(slots::bookable_slots(&availability, date)),
            None => Ok(Vec::new()),
        }
    }

    /// Status counts for every lifecycle entity
    pub async fn status_summary(&self) -> Result<StatusSummary> {
        Ok(StatusSummary {
            appointments: self.store.appointment_status_counts().await?,
            test_bookings: self.store.test_booking_status_counts().await?,
            payments: self.store.payment_status_counts().await?,
        })
    }

    // --- helpers ---

    async fn advance_appointment(
        &self,
        id: &AppointmentId,
        next: AppointmentStatus,
    ) -> Result<Appointment> {
        let appointment = self.require_appointment(id).await?;
        lifecycle::ensure_appointment_transition(appointment.status, next)?;
        let updated = appointment.with_status(next);
        self.commit_appointment(&appointment, updated).await
    }

    async fn commit_appointment(
        &self,
        current: &Appointment,
        updated: Appointment,
    ) -> Result<Appointment> {
        let changeset = Changeset::new()
            .guard(StoreGuard::AppointmentStatusIs {
                id: current.id,
                expected: current.status,
            })
            .write(StoreWrite::PutAppointment(updated.clone()));
        self.store.apply(changeset).await?;
        crate::log_transition!("appointment", updated.id, current.status, updated.status);
        Ok(updated)
    }

    async fn commit_test_booking(
        &self,
        current: &TestBooking,
        updated: TestBooking,
    ) -> Result<TestBooking> {
        let changeset = Changeset::new()
            .guard(StoreGuard::TestBookingStatusIs {
                id: current.id,
                expected: current.status,
            })
            .write(StoreWrite::PutTestBooking(updated.clone()));
        self.store.apply(changeset).await?;
        crate::log_transition!("test booking", updated.id, current.status, updated.status);
        Ok(updated)
    }

    async fn require_patient(&self, id: &PatientId) -> Result<Patient> {
        self.store
            .patient(id)
            .await?
            .ok_or_else(|| CarebookError::NotFound(format!("patient {id}")))
    }

    async fn require_doctor(&self, id: &DoctorId) -> Result<Doctor> {
        self.store
            .doctor(id)
            .await?
            .ok_or_else(|| CarebookError::NotFound(format!("doctor {id}")))
    }

    async fn require_appointment(&self, id: &AppointmentId) -> Result<Appointment> {
        self.store
            .appointment(id)
            .await?
            .ok_or_else(|| CarebookError::NotFound(format!("appointment {id}")))
    }

    async fn require_test_booking(&self, id: &TestBookingId) -> Result<TestBooking> {
        self.store
            .test_booking(id)
            .await?
            .ok_or_else(|| CarebookError::NotFound(format!("test booking {id}")))
    }

    async fn require_payment(&self, id: &PaymentId) -> Result<Payment> {
        self.store
            .payment(id)
            .await?
            .ok_or_else(|| CarebookError::NotFound(format!("payment {id}")))
    }

    /// The lab a booking's test belongs to, for display
    pub async fn lab(&self, id: &LabId) -> Result<Option<Lab>> {
        self.store.lab(id).await
    }
}
