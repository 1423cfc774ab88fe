//! Integration tests for payment settlement and the booking cascade
//!
//! Settling a payment activates the linked booking in the same commit.
//! Failed payments stay retryable; settled payments are terminal.

use carebook::adapters::memory::MemoryStore;
use carebook::core::booking::{BookingPolicy, BookingService};
use carebook::domain::appointment::AppointmentStatus;
use carebook::domain::directory::{DiagnosticTest, Doctor, Lab, Patient, TestCategory};
use carebook::domain::errors::BookingError;
use carebook::domain::payment::{PaymentMethod, PaymentStatus};
use carebook::domain::test_booking::TestBookingStatus;
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

async fn seeded(service: &BookingService) -> (Patient, Doctor) {
    let patient = Patient::new("Asha Rao", "9876543210");
    let doctor = Doctor::new("Dr. Mehta", "Cardiology", "Cardiologist", 50_000);
    service.register_patient(patient.clone()).await.unwrap();
    service.register_doctor(doctor.clone()).await.unwrap();
    (patient, doctor)
}

#[tokio::test]
async fn test_settlement_schedules_appointment() {
    let service = service();
    let (patient, doctor) = seeded(&service).await;

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

    let paid = service.mark_paid(&payment.id).await.unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);

    let stored = service
        .store()
        .appointment(&appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn test_settlement_books_test_booking() {
    let service = service();
    let (patient, _) = seeded(&service).await;

    let lab = Lab::new("City Diagnostics", "12 MG Road");
    let test = DiagnosticTest::new(lab.id, "Thyroid Panel", TestCategory::BloodTests, 80_000);
    service.register_lab(lab).await.unwrap();
    service.register_test(test.clone()).await.unwrap();

    let (booking, payment) = service
        .book_test(&patient.id, &test.id, date(2025, 2, 1), PaymentMethod::Card)
        .await
        .unwrap();

    service.mark_paid(&payment.id).await.unwrap();
    let stored = service
        .store()
        .test_booking(&booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TestBookingStatus::Booked);
}

#[tokio::test]
async fn test_mark_paid_is_idempotent() {
    let service = service();
    let (patient, doctor) = seeded(&service).await;

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
    let again = service.mark_paid(&payment.id).await.unwrap();
    assert_eq!(again.status, PaymentStatus::Paid);

    // The appointment does not move past Scheduled
    let stored = service
        .store()
        .appointment(&appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn test_failed_payment_leaves_booking_pending_and_retries() {
    let service = service();
    let (patient, doctor) = seeded(&service).await;

    let (appointment, payment) = service
        .book_appointment(
            &patient.id,
            &doctor.id,
            date(2025, 1, 10),
            time(9, 0),
            "Checkup",
            PaymentMethod::NetBanking,
        )
        .await
        .unwrap();

    let failed = service.mark_failed(&payment.id).await.unwrap();
    assert_eq!(failed.status, PaymentStatus::Failed);
    let stored = service
        .store()
        .appointment(&appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::PendingPayment);

    // Retry settles and the cascade still fires
    let paid = service.mark_paid(&payment.id).await.unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);
    let stored = service
        .store()
        .appointment(&appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn test_mark_failed_is_idempotent() {
    let service = service();
    let (patient, doctor) = seeded(&service).await;

    let (_, payment) = service
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

    service.mark_failed(&payment.id).await.unwrap();
    let again = service.mark_failed(&payment.id).await.unwrap();
    assert_eq!(again.status, PaymentStatus::Failed);
}

#[tokio::test]
async fn test_settled_payment_cannot_fail() {
    let service = service();
    let (patient, doctor) = seeded(&service).await;

    let (_, payment) = service
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

    let err = service.mark_failed(&payment.id).await.unwrap_err();
    assert!(matches!(
        err.as_booking(),
        Some(BookingError::InvalidTransition { entity: "payment", .. })
    ));
}

#[tokio::test]
async fn test_settlement_after_cancellation_skips_cascade() {
    let service = service();
    let (patient, doctor) = seeded(&service).await;

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
    service
        .cancel_appointment(&appointment.id, dt(2025, 1, 8, 9, 0))
        .await
        .unwrap();

    // The payment settles, but the cancelled appointment is left alone
    let paid = service.mark_paid(&payment.id).await.unwrap();
    assert_eq!(paid.status, PaymentStatus::Paid);
    let stored = service
        .store()
        .appointment(&appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
}
