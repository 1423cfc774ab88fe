//! Integration tests for slot-conflict and duplicate-booking enforcement
//!
//! One non-cancelled appointment per doctor/date/time, and one open booking
//! per patient/target. Cancellation releases the slot; completion does not.

use carebook::adapters::memory::MemoryStore;
use carebook::core::booking::{BookingPolicy, BookingService};
use carebook::domain::directory::{DiagnosticTest, Doctor, Lab, Patient, TestCategory};
use carebook::domain::errors::BookingError;
use carebook::domain::payment::PaymentMethod;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

fn service() -> BookingService {
    BookingService::new(Arc::new(MemoryStore::new()), BookingPolicy::default())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    date(y, mo, d).and_time(time(h, mi))
}

async fn register_patient(service: &BookingService, name: &str) -> Patient {
    let patient = Patient::new(name, "9876543210");
    service.register_patient(patient.clone()).await.unwrap();
    patient
}

async fn register_doctor(service: &BookingService) -> Doctor {
    let doctor = Doctor::new("Dr. Mehta", "Cardiology", "Cardiologist", 50_000);
    service.register_doctor(doctor.clone()).await.unwrap();
    doctor
}

#[tokio::test]
async fn test_double_booking_same_slot_rejected() {
    let service = service();
    let first = register_patient(&service, "Asha Rao").await;
    let second = register_patient(&service, "Vikram Shah").await;
    let doctor = register_doctor(&service).await;

    service
        .book_appointment(
            &first.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::Upi,
        )
        .await
        .unwrap();

    let err = service
        .book_appointment(
            &second.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::Card,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_booking(),
        Some(BookingError::SlotConflict { .. })
    ));
}

#[tokio::test]
async fn test_same_doctor_different_slot_is_duplicate() {
    let service = service();
    let patient = register_patient(&service, "Asha Rao").await;
    let doctor = register_doctor(&service).await;

    service
        .book_appointment(
            &patient.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::Upi,
        )
        .await
        .unwrap();

    // Still open with this doctor, so a second booking is a duplicate even
    // though the slot differs
    let err = service
        .book_appointment(
            &patient.id,
            &doctor.id,
            date(2025, 1, 11),
            time(10, 0),
            "Second opinion",
            PaymentMethod::Upi,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_booking(),
        Some(BookingError::DuplicateBooking { .. })
    ));
}

#[tokio::test]
async fn test_cancelled_appointment_releases_slot() {
    let service = service();
    let first = register_patient(&service, "Asha Rao").await;
    let second = register_patient(&service, "Vikram Shah").await;
    let doctor = register_doctor(&service).await;

    let (appointment, _) = service
        .book_appointment(
            &first.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::Upi,
        )
        .await
        .unwrap();
    service
        .cancel_appointment(&appointment.id, dt(2025, 1, 8, 9, 0))
        .await
        .unwrap();

    // The slot is free again, and the original patient is no longer blocked
    service
        .book_appointment(
            &second.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::Card,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_completed_appointment_keeps_slot_but_allows_rebooking() {
    let service = service();
    let patient = register_patient(&service, "Asha Rao").await;
    let other = register_patient(&service, "Vikram Shah").await;
    let doctor = register_doctor(&service).await;

    let (appointment, payment) = service
        .book_appointment(
            &patient.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::Upi,
        )
        .await
        .unwrap();
    service.mark_paid(&payment.id).await.unwrap();
    service.confirm_appointment(&appointment.id).await.unwrap();
    service
        .complete_appointment(&appointment.id, "All clear", "None", "", date(2025, 1, 10))
        .await
        .unwrap();

    // The visit is over, so the patient may book this doctor again
    service
        .book_appointment(
            &patient.id,
            &doctor.id,
            date(2025, 2, 10),
            time(9, 0),
            "Follow-up",
            PaymentMethod::Upi,
        )
        .await
        .unwrap();

    // But the completed visit still holds its historical slot
    let err = service
        .book_appointment(
            &other.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::Card,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_booking(),
        Some(BookingError::SlotConflict { .. })
    ));
}

#[tokio::test]
async fn test_duplicate_test_booking_rejected() {
    let service = service();
    let patient = register_patient(&service, "Asha Rao").await;

    let lab = Lab::new("City Diagnostics", "12 MG Road");
    let test = DiagnosticTest::new(lab.id, "Complete Blood Count", TestCategory::BloodTests, 40_000);
    service.register_lab(lab).await.unwrap();
    service.register_test(test.clone()).await.unwrap();

    service
        .book_test(&patient.id, &test.id, date(2025, 2, 1), PaymentMethod::Upi)
        .await
        .unwrap();

    let err = service
        .book_test(&patient.id, &test.id, date(2025, 2, 5), PaymentMethod::Upi)
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_booking(),
        Some(BookingError::DuplicateBooking { .. })
    ));
}

#[tokio::test]
async fn test_cancelled_test_booking_allows_rebooking() {
    let service = service();
    let patient = register_patient(&service, "Asha Rao").await;

    let lab = Lab::new("City Diagnostics", "12 MG Road");
    let test = DiagnosticTest::new(lab.id, "Lipid Profile", TestCategory::BloodTests, 60_000);
    service.register_lab(lab).await.unwrap();
    service.register_test(test.clone()).await.unwrap();

    let (booking, _) = service
        .book_test(&patient.id, &test.id, date(2025, 2, 10), PaymentMethod::Upi)
        .await
        .unwrap();
    service
        .cancel_test_booking(&booking.id, dt(2025, 2, 1, 9, 0))
        .await
        .unwrap();

    service
        .book_test(&patient.id, &test.id, date(2025, 2, 20), PaymentMethod::Upi)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_booking_writes_nothing() {
    let service = service();
    let first = register_patient(&service, "Asha Rao").await;
    let second = register_patient(&service, "Vikram Shah").await;
    let doctor = register_doctor(&service).await;

    service
        .book_appointment(
            &first.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::Upi,
        )
        .await
        .unwrap();
    let before = service.status_summary().await.unwrap();

    service
        .book_appointment(
            &second.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::Card,
        )
        .await
        .unwrap_err();

    // Neither an appointment nor a payment leaked from the rejected booking
    let after = service.status_summary().await.unwrap();
    assert_eq!(before.appointments, after.appointments);
    assert_eq!(before.payments, after.payments);
}
