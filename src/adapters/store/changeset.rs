//! Guarded changesets
//!
//! Every state transition is committed as one atomic changeset: a list of
//! guards that must still hold at commit time, followed by the entity writes.
//! Guards give the store compare-and-set semantics: the service pre-checks
//! the same conditions for a friendly early error, and the store re-checks
//! them inside its transaction so concurrent writers cannot double-book.

use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::errors::{BookingError, CarebookError, StorageError};
use crate::domain::history::PatientHistory;
use crate::domain::ids::{AppointmentId, DoctorId, PatientId, PaymentId, TestBookingId, TestId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::prescription::Prescription;
use crate::domain::test_booking::{TestBooking, TestBookingStatus};
use chrono::{NaiveDate, NaiveTime};

/// A condition a store must re-verify inside the committing transaction
#[derive(Debug, Clone, PartialEq)]
pub enum StoreGuard {
    /// No non-cancelled appointment holds (doctor, date, time)
    SlotFree {
        doctor: DoctorId,
        date: NaiveDate,
        time: NaiveTime,
    },

    /// The patient has no active appointment with this doctor
    NoActiveAppointment { patient: PatientId, doctor: DoctorId },

    /// The patient has no active booking for this diagnostic test
    NoActiveTestBooking { patient: PatientId, test: TestId },

    /// The stored appointment still has the expected status
    AppointmentStatusIs {
        id: AppointmentId,
        expected: AppointmentStatus,
    },

    /// The stored test booking still has the expected status
    TestBookingStatusIs {
        id: TestBookingId,
        expected: TestBookingStatus,
    },

    /// The stored payment still has the expected status
    PaymentStatusIs {
        id: PaymentId,
        expected: PaymentStatus,
    },
}

impl StoreGuard {
    /// The error a store reports when this guard no longer holds
    ///
    /// Uniqueness guards map to the booking errors the caller was promised;
    /// status guards can only fail when a concurrent writer got there first,
    /// which surfaces as a storage conflict.
    pub fn violation(&self) -> CarebookError {
        match self {
            StoreGuard::SlotFree { doctor, date, time } => BookingError::SlotConflict {
                doctor: *doctor,
                date: *date,
                time: *time,
            }
            .into(),
            StoreGuard::NoActiveAppointment { patient, doctor } => {
                BookingError::DuplicateBooking {
                    patient: *patient,
                    target: format!("doctor {doctor}"),
                }
                .into()
            }
            StoreGuard::NoActiveTestBooking { patient, test } => BookingError::DuplicateBooking {
                patient: *patient,
                target: format!("test {test}"),
            }
            .into(),
            StoreGuard::AppointmentStatusIs { id, expected } => StorageError::Conflict(format!(
                "appointment {id} is no longer {expected}"
            ))
            .into(),
            StoreGuard::TestBookingStatusIs { id, expected } => StorageError::Conflict(format!(
                "test booking {id} is no longer {expected}"
            ))
            .into(),
            StoreGuard::PaymentStatusIs { id, expected } => StorageError::Conflict(format!(
                "payment {id} is no longer {expected}"
            ))
            .into(),
        }
    }
}

/// An entity upsert carried by a changeset
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    PutAppointment(Appointment),
    PutTestBooking(TestBooking),
    PutPayment(Payment),
    PutHistory(PatientHistory),
    PutPrescription(Prescription),
}

/// One atomic unit of guarded writes
///
/// A store applies either the whole changeset or none of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub guards: Vec<StoreGuard>,
    pub writes: Vec<StoreWrite>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a guard, builder style
    pub fn guard(mut self, guard: StoreGuard) -> Self {
        self.guards.push(guard);
        self
    }

    /// Adds a write, builder style
    pub fn write(mut self, write: StoreWrite) -> Self {
        self.writes.push(write);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_guard_violation_is_slot_conflict() {
        let guard = StoreGuard::SlotFree {
            doctor: DoctorId::generate(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };
        let err = guard.violation();
        assert!(matches!(
            err.as_booking(),
            Some(BookingError::SlotConflict { .. })
        ));
    }

    #[test]
    fn test_duplicate_guard_violation_is_duplicate_booking() {
        let guard = StoreGuard::NoActiveTestBooking {
            patient: PatientId::generate(),
            test: TestId::generate(),
        };
        assert!(matches!(
            guard.violation().as_booking(),
            Some(BookingError::DuplicateBooking { .. })
        ));
    }

    #[test]
    fn test_status_guard_violation_is_storage_conflict() {
        let guard = StoreGuard::PaymentStatusIs {
            id: PaymentId::generate(),
            expected: PaymentStatus::Pending,
        };
        assert!(matches!(
            guard.violation(),
            CarebookError::Storage(StorageError::Conflict(_))
        ));
    }

    #[test]
    fn test_changeset_builder_preserves_order() {
        let payment = Payment::for_appointment(
            PatientId::generate(),
            AppointmentId::generate(),
            10_000,
            crate::domain::payment::PaymentMethod::Cash,
        );
        let changeset = Changeset::new()
            .guard(StoreGuard::PaymentStatusIs {
                id: payment.id,
                expected: PaymentStatus::Pending,
            })
            .write(StoreWrite::PutPayment(payment.clone()));
        assert_eq!(changeset.guards.len(), 1);
        assert_eq!(changeset.writes, vec![StoreWrite::PutPayment(payment)]);
    }
}
