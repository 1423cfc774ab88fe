//! Row mapping between PostgreSQL and domain entities
//!
//! Status columns are stored as their display labels and parsed back through
//! `FromStr`; a label the domain does not know is a mapping error, not a
//! panic. Identifier columns are native UUIDs.

use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::availability::DoctorAvailability;
use crate::domain::directory::{
    BloodGroup, DiagnosticTest, Doctor, Lab, Patient, SampleType, TestCategory,
};
use crate::domain::errors::StorageError;
use crate::domain::history::PatientHistory;
use crate::domain::ids::{
    AppointmentId, DoctorId, HistoryId, LabId, PatientId, PaymentId, PrescriptionId,
    TestBookingId, TestId,
};
use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::domain::prescription::{Prescription, PrescriptionStatus};
use crate::domain::test_booking::{TestBooking, TestBookingStatus};
use crate::domain::Result;
use chrono::Weekday;
use std::str::FromStr;
use tokio_postgres::Row;
use uuid::Uuid;

/// Parses a stored label back into a domain enum
fn parse_label<T>(column: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| StorageError::Mapping(format!("{column}: {e}")).into())
}

fn int_to_u32(column: &str, value: i32) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StorageError::Mapping(format!("{column}: negative value {value}")).into())
}

pub fn appointment_from_row(row: &Row) -> Result<Appointment> {
    let status: String = row.get("status");
    Ok(Appointment {
        id: AppointmentId::from_uuid(row.get::<_, Uuid>("id")),
        patient: PatientId::from_uuid(row.get::<_, Uuid>("patient_id")),
        doctor: DoctorId::from_uuid(row.get::<_, Uuid>("doctor_id")),
        date: row.get("date"),
        time: row.get("time"),
        reason: row.get("reason"),
        status: parse_label::<AppointmentStatus>("appointments.status", &status)?,
        created_at: row.get("created_at"),
    })
}

pub fn test_booking_from_row(row: &Row) -> Result<TestBooking> {
    let status: String = row.get("status");
    Ok(TestBooking {
        id: TestBookingId::from_uuid(row.get::<_, Uuid>("id")),
        patient: PatientId::from_uuid(row.get::<_, Uuid>("patient_id")),
        test: TestId::from_uuid(row.get::<_, Uuid>("test_id")),
        lab: LabId::from_uuid(row.get::<_, Uuid>("lab_id")),
        booking_date: row.get("booking_date"),
        status: parse_label::<TestBookingStatus>("test_bookings.status", &status)?,
        result_notes: row.get("result_notes"),
        created_at: row.get("created_at"),
    })
}

pub fn payment_from_row(row: &Row) -> Result<Payment> {
    let status: String = row.get("status");
    let method: String = row.get("method");
    Ok(Payment {
        id: PaymentId::from_uuid(row.get::<_, Uuid>("id")),
        patient: PatientId::from_uuid(row.get::<_, Uuid>("patient_id")),
        appointment: row
            .get::<_, Option<Uuid>>("appointment_id")
            .map(AppointmentId::from_uuid),
        test_booking: row
            .get::<_, Option<Uuid>>("test_booking_id")
            .map(TestBookingId::from_uuid),
        amount: row.get("amount"),
        method: parse_label::<PaymentMethod>("payments.method", &method)?,
        status: parse_label::<PaymentStatus>("payments.status", &status)?,
        transaction_id: row.get("transaction_id"),
        created_at: row.get("created_at"),
    })
}

pub fn history_from_row(row: &Row) -> Result<PatientHistory> {
    Ok(PatientHistory {
        id: HistoryId::from_uuid(row.get::<_, Uuid>("id")),
        patient: PatientId::from_uuid(row.get::<_, Uuid>("patient_id")),
        doctor: DoctorId::from_uuid(row.get::<_, Uuid>("doctor_id")),
        appointment: AppointmentId::from_uuid(row.get::<_, Uuid>("appointment_id")),
        diagnosis: row.get("diagnosis"),
        treatment: row.get("treatment"),
        notes: row.get("notes"),
        recorded_date: row.get("recorded_date"),
        created_at: row.get("created_at"),
    })
}

pub fn prescription_from_row(row: &Row) -> Result<Prescription> {
    let status: String = row.get("status");
    Ok(Prescription {
        id: PrescriptionId::from_uuid(row.get::<_, Uuid>("id")),
        appointment: AppointmentId::from_uuid(row.get::<_, Uuid>("appointment_id")),
        patient: PatientId::from_uuid(row.get::<_, Uuid>("patient_id")),
        doctor: DoctorId::from_uuid(row.get::<_, Uuid>("doctor_id")),
        medicine_name: row.get("medicine_name"),
        dosage: row.get("dosage"),
        frequency: row.get("frequency"),
        duration: row.get("duration"),
        instructions: row.get("instructions"),
        status: parse_label::<PrescriptionStatus>("prescriptions.status", &status)?,
        created_at: row.get("created_at"),
    })
}

pub fn patient_from_row(row: &Row) -> Result<Patient> {
    let blood_group: Option<String> = row.get("blood_group");
    Ok(Patient {
        id: PatientId::from_uuid(row.get::<_, Uuid>("id")),
        full_name: row.get("full_name"),
        email: row.get("email"),
        gender: row.get("gender"),
        date_of_birth: row.get("date_of_birth"),
        phone: row.get("phone"),
        address: row.get("address"),
        blood_group: blood_group
            .map(|bg| parse_label::<BloodGroup>("patients.blood_group", &bg))
            .transpose()?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

pub fn doctor_from_row(row: &Row) -> Result<Doctor> {
    Ok(Doctor {
        id: DoctorId::from_uuid(row.get::<_, Uuid>("id")),
        full_name: row.get("full_name"),
        department: row.get("department"),
        specialization: row.get("specialization"),
        license_number: row.get("license_number"),
        experience_years: int_to_u32(
            "doctors.experience_years",
            row.get("experience_years"),
        )?,
        consultation_fee: row.get("consultation_fee"),
        phone: row.get("phone"),
        bio: row.get("bio"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

pub fn lab_from_row(row: &Row) -> Result<Lab> {
    Ok(Lab {
        id: LabId::from_uuid(row.get::<_, Uuid>("id")),
        name: row.get("name"),
        address: row.get("address"),
        phone: row.get("phone"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

pub fn diagnostic_test_from_row(row: &Row) -> Result<DiagnosticTest> {
    let category: String = row.get("category");
    let sample_type: String = row.get("sample_type");
    Ok(DiagnosticTest {
        id: TestId::from_uuid(row.get::<_, Uuid>("id")),
        lab: LabId::from_uuid(row.get::<_, Uuid>("lab_id")),
        name: row.get("name"),
        code: row.get("code"),
        category: parse_label::<TestCategory>("diagnostic_tests.category", &category)?,
        price: row.get("price"),
        sample_type: parse_label::<SampleType>("diagnostic_tests.sample_type", &sample_type)?,
        result_duration: row.get("result_duration"),
        home_collection: row.get("home_collection"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

pub fn availability_from_row(row: &Row) -> Result<DoctorAvailability> {
    let days: Vec<String> = row.get("working_days");
    let working_days = days
        .iter()
        .map(|d| parse_label::<Weekday>("doctor_availability.working_days", d))
        .collect::<Result<Vec<_>>>()?;
    Ok(DoctorAvailability {
        doctor: DoctorId::from_uuid(row.get::<_, Uuid>("doctor_id")),
        working_days,
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        break_start: row.get("break_start"),
        break_end: row.get("break_end"),
        slot_duration_minutes: int_to_u32(
            "doctor_availability.slot_duration_minutes",
            row.get("slot_duration_minutes"),
        )?,
        max_appointments: int_to_u32(
            "doctor_availability.max_appointments",
            row.get("max_appointments"),
        )?,
    })
}

/// The weekday labels stored for an availability row
pub fn working_day_labels(availability: &DoctorAvailability) -> Vec<String> {
    availability
        .working_days
        .iter()
        .map(|d| d.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_labels_roundtrip() {
        let labels = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        for label in labels {
            let day: Weekday = label.parse().unwrap();
            assert_eq!(day.to_string(), label);
        }
    }

    #[test]
    fn test_parse_label_reports_column() {
        let err = parse_label::<AppointmentStatus>("appointments.status", "Unknown").unwrap_err();
        assert!(err.to_string().contains("appointments.status"));
    }
}
