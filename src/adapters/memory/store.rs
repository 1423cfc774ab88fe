//! In-memory storage backend
//!
//! Keeps every entity in `HashMap`s behind one mutex. Guard verification and
//! the writes of a changeset happen under a single lock acquisition, which
//! gives the same all-or-nothing semantics the PostgreSQL backend gets from
//! a serializable transaction. Intended for tests and single-process use.

use crate::adapters::store::changeset::{Changeset, StoreGuard, StoreWrite};
use crate::adapters::store::traits::BookingStore;
use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::availability::DoctorAvailability;
use crate::domain::directory::{DiagnosticTest, Doctor, Lab, Patient};
use crate::domain::errors::StorageError;
use crate::domain::history::PatientHistory;
use crate::domain::ids::{
    AppointmentId, DoctorId, HistoryId, LabId, PatientId, PaymentId, PrescriptionId,
    TestBookingId, TestId,
};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::prescription::Prescription;
use crate::domain::test_booking::{TestBooking, TestBookingStatus};
use crate::domain::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    patients: HashMap<PatientId, Patient>,
    doctors: HashMap<DoctorId, Doctor>,
    labs: HashMap<LabId, Lab>,
    tests: HashMap<TestId, DiagnosticTest>,
    availability: HashMap<DoctorId, DoctorAvailability>,
    appointments: HashMap<AppointmentId, Appointment>,
    test_bookings: HashMap<TestBookingId, TestBooking>,
    payments: HashMap<PaymentId, Payment>,
    history: HashMap<HistoryId, PatientHistory>,
    prescriptions: HashMap<PrescriptionId, Prescription>,
}

impl State {
    fn slot_holder(
        &self,
        doctor: &DoctorId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Option<&Appointment> {
        self.appointments.values().find(|a| {
            a.doctor == *doctor && a.date == date && a.time == time && a.status.holds_slot()
        })
    }

    fn active_appointment(
        &self,
        patient: &PatientId,
        doctor: &DoctorId,
    ) -> Option<&Appointment> {
        self.appointments
            .values()
            .find(|a| a.patient == *patient && a.doctor == *doctor && a.status.is_active())
    }

    fn active_test_booking(
        &self,
        patient: &PatientId,
        test: &TestId,
    ) -> Option<&TestBooking> {
        self.test_bookings
            .values()
            .find(|b| b.patient == *patient && b.test == *test && b.status.is_active())
    }

    fn check_guard(&self, guard: &StoreGuard) -> bool {
        match guard {
            StoreGuard::SlotFree { doctor, date, time } => {
                self.slot_holder(doctor, *date, *time).is_none()
            }
            StoreGuard::NoActiveAppointment { patient, doctor } => {
                self.active_appointment(patient, doctor).is_none()
            }
            StoreGuard::NoActiveTestBooking { patient, test } => {
                self.active_test_booking(patient, test).is_none()
            }
            StoreGuard::AppointmentStatusIs { id, expected } => self
                .appointments
                .get(id)
                .is_some_and(|a| a.status == *expected),
            StoreGuard::TestBookingStatusIs { id, expected } => self
                .test_bookings
                .get(id)
                .is_some_and(|b| b.status == *expected),
            StoreGuard::PaymentStatusIs { id, expected } => self
                .payments
                .get(id)
                .is_some_and(|p| p.status == *expected),
        }
    }
}

/// In-memory [`BookingStore`] implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StorageError::Query("state mutex poisoned".to_string()).into())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn put_patient(&self, patient: Patient) -> Result<()> {
        self.locked()?.patients.insert(patient.id, patient);
        Ok(())
    }

    async fn patient(&self, id: &PatientId) -> Result<Option<Patient>> {
        Ok(self.locked()?.patients.get(id).cloned())
    }

    async fn put_doctor(&self, doctor: Doctor) -> Result<()> {
        self.locked()?.doctors.insert(doctor.id, doctor);
        Ok(())
    }

    async fn doctor(&self, id: &DoctorId) -> Result<Option<Doctor>> {
        Ok(self.locked()?.doctors.get(id).cloned())
    }

    async fn put_lab(&self, lab: Lab) -> Result<()> {
        self.locked()?.labs.insert(lab.id, lab);
        Ok(())
    }

    async fn lab(&self, id: &LabId) -> Result<Option<Lab>> {
        Ok(self.locked()?.labs.get(id).cloned())
    }

    async fn put_diagnostic_test(&self, test: DiagnosticTest) -> Result<()> {
        self.locked()?.tests.insert(test.id, test);
        Ok(())
    }

    async fn diagnostic_test(&self, id: &TestId) -> Result<Option<DiagnosticTest>> {
        Ok(self.locked()?.tests.get(id).cloned())
    }

    async fn put_availability(&self, availability: DoctorAvailability) -> Result<()> {
        self.locked()?
            .availability
            .insert(availability.doctor, availability);
        Ok(())
    }

    async fn availability(&self, doctor: &DoctorId) -> Result<Option<DoctorAvailability>> {
        Ok(self.locked()?.availability.get(doctor).cloned())
    }

    async fn appointment(&self, id: &AppointmentId) -> Result<Option<Appointment>> {
        Ok(self.locked()?.appointments.get(id).cloned())
    }

    async fn test_booking(&self, id: &TestBookingId) -> Result<Option<TestBooking>> {
        Ok(self.locked()?.test_bookings.get(id).cloned())
    }

    async fn payment(&self, id: &PaymentId) -> Result<Option<Payment>> {
        Ok(self.locked()?.payments.get(id).cloned())
    }

    async fn find_active_appointment_for_slot(
        &self,
        doctor: &DoctorId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>> {
        Ok(self.locked()?.slot_holder(doctor, date, time).cloned())
    }

    async fn find_active_appointment_for_patient(
        &self,
        patient: &PatientId,
        doctor: &DoctorId,
    ) -> Result<Option<Appointment>> {
        Ok(self.locked()?.active_appointment(patient, doctor).cloned())
    }

    async fn find_active_test_booking(
        &self,
        patient: &PatientId,
        test: &TestId,
    ) -> Result<Option<TestBooking>> {
        Ok(self.locked()?.active_test_booking(patient, test).cloned())
    }

    async fn history_for_patient(&self, patient: &PatientId) -> Result<Vec<PatientHistory>> {
        let state = self.locked()?;
        let mut records: Vec<PatientHistory> = state
            .history
            .values()
            .filter(|h| h.patient == *patient)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.recorded_date.cmp(&a.recorded_date));
        Ok(records)
    }

    async fn prescriptions_for_patient(
        &self,
        patient: &PatientId,
    ) -> Result<Vec<Prescription>> {
        let state = self.locked()?;
        let mut records: Vec<Prescription> = state
            .prescriptions
            .values()
            .filter(|p| p.patient == *patient)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn appointment_status_counts(&self) -> Result<Vec<(AppointmentStatus, u64)>> {
        let state = self.locked()?;
        Ok(AppointmentStatus::all()
            .iter()
            .map(|status| {
                let count = state
                    .appointments
                    .values()
                    .filter(|a| a.status == *status)
                    .count() as u64;
                (*status, count)
            })
            .collect())
    }

    async fn test_booking_status_counts(&self) -> Result<Vec<(TestBookingStatus, u64)>> {
        let state = self.locked()?;
        Ok(TestBookingStatus::all()
            .iter()
            .map(|status| {
                let count = state
                    .test_bookings
                    .values()
                    .filter(|b| b.status == *status)
                    .count() as u64;
                (*status, count)
            })
            .collect())
    }

    async fn payment_status_counts(&self) -> Result<Vec<(PaymentStatus, u64)>> {
        let state = self.locked()?;
        Ok(PaymentStatus::all()
            .iter()
            .map(|status| {
                let count = state
                    .payments
                    .values()
                    .filter(|p| p.status == *status)
                    .count() as u64;
                (*status, count)
            })
            .collect())
    }

    async fn apply(&self, changeset: Changeset) -> Result<()> {
        // Guards and writes share one lock acquisition
        let mut state = self.locked()?;

        for guard in &changeset.guards {
            if !state.check_guard(guard) {
                let violation = guard.violation();
                crate::log_commit_conflict!("memory", violation);
                return Err(violation);
            }
        }

        for write in changeset.writes {
            match write {
                StoreWrite::PutAppointment(a) => {
                    state.appointments.insert(a.id, a);
                }
                StoreWrite::PutTestBooking(b) => {
                    state.test_bookings.insert(b.id, b);
                }
                StoreWrite::PutPayment(p) => {
                    state.payments.insert(p.id, p);
                }
                StoreWrite::PutHistory(h) => {
                    state.history.insert(h.id, h);
                }
                StoreWrite::PutPrescription(p) => {
                    state.prescriptions.insert(p.id, p);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{BookingError, CarebookError};
    use crate::domain::payment::PaymentMethod;

    fn slot() -> (NaiveDate, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_apply_writes_all_or_nothing() {
        let store = MemoryStore::new();
        let (date, time) = slot();
        let doctor = DoctorId::generate();

        let first = Appointment::new(PatientId::generate(), doctor, date, time, "checkup");
        store
            .apply(Changeset::new().write(StoreWrite::PutAppointment(first.clone())))
            .await
            .unwrap();

        // Second writer's guard fails; its payment write must not land
        let second = Appointment::new(PatientId::generate(), doctor, date, time, "checkup");
        let payment = Payment::for_appointment(
            second.patient,
            second.id,
            50_000,
            PaymentMethod::Cash,
        );
        let err = store
            .apply(
                Changeset::new()
                    .guard(StoreGuard::SlotFree { doctor, date, time })
                    .write(StoreWrite::PutAppointment(second.clone()))
                    .write(StoreWrite::PutPayment(payment.clone())),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_booking(),
            Some(BookingError::SlotConflict { .. })
        ));
        assert!(store.appointment(&second.id).await.unwrap().is_none());
        assert!(store.payment(&payment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_appointment_frees_slot() {
        let store = MemoryStore::new();
        let (date, time) = slot();
        let doctor = DoctorId::generate();

        let appt = Appointment::new(PatientId::generate(), doctor, date, time, "checkup");
        let cancelled = appt.with_status(AppointmentStatus::Cancelled);
        store
            .apply(Changeset::new().write(StoreWrite::PutAppointment(cancelled)))
            .await
            .unwrap();

        assert!(store
            .find_active_appointment_for_slot(&doctor, date, time)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_status_guard_conflict() {
        let store = MemoryStore::new();
        let (date, time) = slot();
        let appt = Appointment::new(PatientId::generate(), DoctorId::generate(), date, time, "x");
        store
            .apply(Changeset::new().write(StoreWrite::PutAppointment(appt.clone())))
            .await
            .unwrap();

        let err = store
            .apply(
                Changeset::new()
                    .guard(StoreGuard::AppointmentStatusIs {
                        id: appt.id,
                        expected: AppointmentStatus::Scheduled,
                    })
                    .write(StoreWrite::PutAppointment(
                        appt.with_status(AppointmentStatus::Confirmed),
                    )),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CarebookError::Storage(_)));
        // The stored appointment is untouched
        assert_eq!(
            store.appointment(&appt.id).await.unwrap().unwrap().status,
            AppointmentStatus::PendingPayment
        );
    }

    #[tokio::test]
    async fn test_status_counts() {
        let store = MemoryStore::new();
        let (date, time) = slot();
        let appt = Appointment::new(PatientId::generate(), DoctorId::generate(), date, time, "x");
        store
            .apply(Changeset::new().write(StoreWrite::PutAppointment(appt)))
            .await
            .unwrap();

        let counts = store.appointment_status_counts().await.unwrap();
        let pending = counts
            .iter()
            .find(|(s, _)| *s == AppointmentStatus::PendingPayment)
            .unwrap();
        assert_eq!(pending.1, 1);
    }
}
