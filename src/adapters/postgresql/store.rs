//! PostgreSQL implementation of the booking store
//!
//! Reads run on pooled connections; [`BookingStore::apply`] runs its guards
//! and writes inside one SERIALIZABLE transaction, so a changeset either
//! lands whole against a state its guards verified, or not at all. A
//! serialization failure from a concurrent writer surfaces as a storage
//! conflict.

use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models;
use crate::adapters::store::changeset::{Changeset, StoreGuard, StoreWrite};
use crate::adapters::store::traits::BookingStore;
use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::availability::DoctorAvailability;
use crate::domain::directory::{DiagnosticTest, Doctor, Lab, Patient};
use crate::domain::errors::StorageError;
use crate::domain::history::PatientHistory;
use crate::domain::ids::{AppointmentId, DoctorId, LabId, PatientId, PaymentId, TestBookingId, TestId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::prescription::Prescription;
use crate::domain::test_booking::{TestBooking, TestBookingStatus};
use crate::domain::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use std::str::FromStr;
use std::sync::Arc;
use tokio_postgres::error::SqlState;
use tokio_postgres::{IsolationLevel, Transaction};

const ACTIVE_APPOINTMENT_STATUSES: [&str; 3] = ["Pending Payment", "Scheduled", "Confirmed"];
const ACTIVE_TEST_BOOKING_STATUSES: [&str; 2] = ["Pending Payment", "Booked"];

/// PostgreSQL-backed [`BookingStore`]
pub struct PostgresStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgresStore {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    async fn check_guard(&self, tx: &Transaction<'_>, guard: &StoreGuard) -> Result<()> {
        let holds = match guard {
            StoreGuard::SlotFree { doctor, date, time } => {
                let row = tx
                    .query_opt(
                        "SELECT 1 FROM appointments \
                         WHERE doctor_id = $1 AND date = $2 AND time = $3 \
                           AND status <> 'Cancelled' LIMIT 1",
                        &[doctor.as_uuid(), date, time],
                    )
                    .await
                    .map_err(query_error)?;
                row.is_none()
            }
            StoreGuard::NoActiveAppointment { patient, doctor } => {
                let row = tx
                    .query_opt(
                        "SELECT 1 FROM appointments \
                         WHERE patient_id = $1 AND doctor_id = $2 \
                           AND status = ANY($3) LIMIT 1",
                        &[
                            patient.as_uuid(),
                            doctor.as_uuid(),
                            &ACTIVE_APPOINTMENT_STATUSES.as_slice(),
                        ],
                    )
                    .await
                    .map_err(query_error)?;
                row.is_none()
            }
            StoreGuard::NoActiveTestBooking { patient, test } => {
                let row = tx
                    .query_opt(
                        "SELECT 1 FROM test_bookings \
                         WHERE patient_id = $1 AND test_id = $2 \
                           AND status = ANY($3) LIMIT 1",
                        &[
                            patient.as_uuid(),
                            test.as_uuid(),
                            &ACTIVE_TEST_BOOKING_STATUSES.as_slice(),
                        ],
                    )
                    .await
                    .map_err(query_error)?;
                row.is_none()
            }
            StoreGuard::AppointmentStatusIs { id, expected } => {
                self.status_matches(tx, "appointments", id.as_uuid(), expected.as_str())
                    .await?
            }
            StoreGuard::TestBookingStatusIs { id, expected } => {
                self.status_matches(tx, "test_bookings", id.as_uuid(), expected.as_str())
                    .await?
            }
            StoreGuard::PaymentStatusIs { id, expected } => {
                self.status_matches(tx, "payments", id.as_uuid(), expected.as_str())
                    .await?
            }
        };

        if holds {
            Ok(())
        } else {
            let violation = guard.violation();
            crate::log_commit_conflict!("postgresql", violation);
            Err(violation)
        }
    }

    async fn status_matches(
        &self,
        tx: &Transaction<'_>,
        table: &str,
        id: &uuid::Uuid,
        expected: &str,
    ) -> Result<bool> {
        let query = format!("SELECT status FROM {table} WHERE id = $1");
        let row = tx.query_opt(&query, &[id]).await.map_err(query_error)?;
        Ok(row.is_some_and(|r| r.get::<_, String>("status") == expected))
    }

    async fn apply_write(&self, tx: &Transaction<'_>, write: &StoreWrite) -> Result<()> {
        match write {
            StoreWrite::PutAppointment(a) => {
                tx.execute(
                    "INSERT INTO appointments \
                       (id, patient_id, doctor_id, date, time, reason, status, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     ON CONFLICT (id) DO UPDATE SET \
                       date = EXCLUDED.date, time = EXCLUDED.time, \
                       reason = EXCLUDED.reason, status = EXCLUDED.status",
                    &[
                        a.id.as_uuid(),
                        a.patient.as_uuid(),
                        a.doctor.as_uuid(),
                        &a.date,
                        &a.time,
                        &a.reason,
                        &a.status.as_str(),
                        &a.created_at,
                    ],
                )
                .await
                .map_err(query_error)?;
            }
            StoreWrite::PutTestBooking(b) => {
                tx.execute(
                    "INSERT INTO test_bookings \
                       (id, patient_id, test_id, lab_id, booking_date, status, result_notes, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                     ON CONFLICT (id) DO UPDATE SET \
                       booking_date = EXCLUDED.booking_date, status = EXCLUDED.status, \
                       result_notes = EXCLUDED.result_notes",
                    &[
                        b.id.as_uuid(),
                        b.patient.as_uuid(),
                        b.test.as_uuid(),
                        b.lab.as_uuid(),
                        &b.booking_date,
                        &b.status.as_str(),
                        &b.result_notes,
                        &b.created_at,
                    ],
                )
                .await
                .map_err(query_error)?;
            }
            StoreWrite::PutPayment(p) => {
                tx.execute(
                    "INSERT INTO payments \
                       (id, patient_id, appointment_id, test_booking_id, amount, method, \
                        status, transaction_id, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                     ON CONFLICT (id) DO UPDATE SET \
                       status = EXCLUDED.status, transaction_id = EXCLUDED.transaction_id",
                    &[
                        p.id.as_uuid(),
                        p.patient.as_uuid(),
                        &p.appointment.as_ref().map(|id| *id.as_uuid()),
                        &p.test_booking.as_ref().map(|id| *id.as_uuid()),
                        &p.amount,
                        &p.method.as_str(),
                        &p.status.as_str(),
                        &p.transaction_id,
                        &p.created_at,
                    ],
                )
                .await
                .map_err(query_error)?;
            }
            StoreWrite::PutHistory(h) => {
                tx.execute(
                    "INSERT INTO patient_history \
                       (id, patient_id, doctor_id, appointment_id, diagnosis, treatment, \
                        notes, recorded_date, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                     ON CONFLICT (id) DO NOTHING",
                    &[
                        h.id.as_uuid(),
                        h.patient.as_uuid(),
                        h.doctor.as_uuid(),
                        h.appointment.as_uuid(),
                        &h.diagnosis,
                        &h.treatment,
                        &h.notes,
                        &h.recorded_date,
                        &h.created_at,
                    ],
                )
                .await
                .map_err(query_error)?;
            }
            StoreWrite::PutPrescription(p) => {
                tx.execute(
                    "INSERT INTO prescriptions \
                       (id, appointment_id, patient_id, doctor_id, medicine_name, dosage, \
                        frequency, duration, instructions, status, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
                     ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status",
                    &[
                        p.id.as_uuid(),
                        p.appointment.as_uuid(),
                        p.patient.as_uuid(),
                        p.doctor.as_uuid(),
                        &p.medicine_name,
                        &p.dosage,
                        &p.frequency,
                        &p.duration,
                        &p.instructions,
                        &p.status.as_str(),
                        &p.created_at,
                    ],
                )
                .await
                .map_err(query_error)?;
            }
        }
        Ok(())
    }
}

fn query_error(e: tokio_postgres::Error) -> crate::domain::CarebookError {
    if e.code() == Some(&SqlState::T_R_SERIALIZATION_FAILURE) {
        crate::log_commit_conflict!("postgresql", e);
        StorageError::Conflict(format!("serialization failure: {e}")).into()
    } else {
        StorageError::Query(e.to_string()).into()
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn put_patient(&self, patient: Patient) -> Result<()> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO patients \
               (id, full_name, email, gender, date_of_birth, phone, address, \
                blood_group, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET \
               full_name = EXCLUDED.full_name, email = EXCLUDED.email, \
               gender = EXCLUDED.gender, date_of_birth = EXCLUDED.date_of_birth, \
               phone = EXCLUDED.phone, address = EXCLUDED.address, \
               blood_group = EXCLUDED.blood_group, is_active = EXCLUDED.is_active",
            &[
                patient.id.as_uuid(),
                &patient.full_name,
                &patient.email,
                &patient.gender,
                &patient.date_of_birth,
                &patient.phone,
                &patient.address,
                &patient.blood_group.map(|bg| bg.as_str()),
                &patient.is_active,
                &patient.created_at,
            ],
        )
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn patient(&self, id: &PatientId) -> Result<Option<Patient>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt("SELECT * FROM patients WHERE id = $1", &[id.as_uuid()])
            .await
            .map_err(query_error)?;
        row.map(|r| models::patient_from_row(&r)).transpose()
    }

    async fn put_doctor(&self, doctor: Doctor) -> Result<()> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO doctors \
               (id, full_name, department, specialization, license_number, \
                experience_years, consultation_fee, phone, bio, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE SET \
               full_name = EXCLUDED.full_name, department = EXCLUDED.department, \
               specialization = EXCLUDED.specialization, \
               license_number = EXCLUDED.license_number, \
               experience_years = EXCLUDED.experience_years, \
               consultation_fee = EXCLUDED.consultation_fee, \
               phone = EXCLUDED.phone, bio = EXCLUDED.bio, \
               is_active = EXCLUDED.is_active",
            &[
                doctor.id.as_uuid(),
                &doctor.full_name,
                &doctor.department,
                &doctor.specialization,
                &doctor.license_number,
                &(doctor.experience_years as i32),
                &doctor.consultation_fee,
                &doctor.phone,
                &doctor.bio,
                &doctor.is_active,
                &doctor.created_at,
            ],
        )
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn doctor(&self, id: &DoctorId) -> Result<Option<Doctor>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt("SELECT * FROM doctors WHERE id = $1", &[id.as_uuid()])
            .await
            .map_err(query_error)?;
        row.map(|r| models::doctor_from_row(&r)).transpose()
    }

    async fn put_lab(&self, lab: Lab) -> Result<()> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO labs (id, name, address, phone, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
               name = EXCLUDED.name, address = EXCLUDED.address, \
               phone = EXCLUDED.phone, is_active = EXCLUDED.is_active",
            &[
                lab.id.as_uuid(),
                &lab.name,
                &lab.address,
                &lab.phone,
                &lab.is_active,
                &lab.created_at,
            ],
        )
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn lab(&self, id: &LabId) -> Result<Option<Lab>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt("SELECT * FROM labs WHERE id = $1", &[id.as_uuid()])
            .await
            .map_err(query_error)?;
        row.map(|r| models::lab_from_row(&r)).transpose()
    }

    async fn put_diagnostic_test(&self, test: DiagnosticTest) -> Result<()> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO diagnostic_tests \
               (id, lab_id, name, code, category, price, sample_type, \
                result_duration, home_collection, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE SET \
               name = EXCLUDED.name, code = EXCLUDED.code, \
               category = EXCLUDED.category, price = EXCLUDED.price, \
               sample_type = EXCLUDED.sample_type, \
               result_duration = EXCLUDED.result_duration, \
               home_collection = EXCLUDED.home_collection, \
               is_active = EXCLUDED.is_active",
            &[
                test.id.as_uuid(),
                test.lab.as_uuid(),
                &test.name,
                &test.code,
                &test.category.as_str(),
                &test.price,
                &test.sample_type.as_str(),
                &test.result_duration,
                &test.home_collection,
                &test.is_active,
                &test.created_at,
            ],
        )
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn diagnostic_test(&self, id: &TestId) -> Result<Option<DiagnosticTest>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(
                "SELECT * FROM diagnostic_tests WHERE id = $1",
                &[id.as_uuid()],
            )
            .await
            .map_err(query_error)?;
        row.map(|r| models::diagnostic_test_from_row(&r)).transpose()
    }

    async fn put_availability(&self, availability: DoctorAvailability) -> Result<()> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO doctor_availability \
               (doctor_id, working_days, start_time, end_time, break_start, \
                break_end, slot_duration_minutes, max_appointments) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (doctor_id) DO UPDATE SET \
               working_days = EXCLUDED.working_days, \
               start_time = EXCLUDED.start_time, end_time = EXCLUDED.end_time, \
               break_start = EXCLUDED.break_start, break_end = EXCLUDED.break_end, \
               slot_duration_minutes = EXCLUDED.slot_duration_minutes, \
               max_appointments = EXCLUDED.max_appointments",
            &[
                availability.doctor.as_uuid(),
                &models::working_day_labels(&availability),
                &availability.start_time,
                &availability.end_time,
                &availability.break_start,
                &availability.break_end,
                &(availability.slot_duration_minutes as i32),
                &(availability.max_appointments as i32),
            ],
        )
        .await
        .map_err(query_error)?;
        Ok(())
    }

    async fn availability(&self, doctor: &DoctorId) -> Result<Option<DoctorAvailability>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(
                "SELECT * FROM doctor_availability WHERE doctor_id = $1",
                &[doctor.as_uuid()],
            )
            .await
            .map_err(query_error)?;
        row.map(|r| models::availability_from_row(&r)).transpose()
    }

    async fn appointment(&self, id: &AppointmentId) -> Result<Option<Appointment>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt("SELECT * FROM appointments WHERE id = $1", &[id.as_uuid()])
            .await
            .map_err(query_error)?;
        row.map(|r| models::appointment_from_row(&r)).transpose()
    }

    async fn test_booking(&self, id: &TestBookingId) -> Result<Option<TestBooking>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt("SELECT * FROM test_bookings WHERE id = $1", &[id.as_uuid()])
            .await
            .map_err(query_error)?;
        row.map(|r| models::test_booking_from_row(&r)).transpose()
    }

    async fn payment(&self, id: &PaymentId) -> Result<Option<Payment>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt("SELECT * FROM payments WHERE id = $1", &[id.as_uuid()])
            .await
            .map_err(query_error)?;
        row.map(|r| models::payment_from_row(&r)).transpose()
    }

    async fn find_active_appointment_for_slot(
        &self,
        doctor: &DoctorId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(
                "SELECT * FROM appointments \
                 WHERE doctor_id = $1 AND date = $2 AND time = $3 \
                   AND status <> 'Cancelled' LIMIT 1",
                &[doctor.as_uuid(), &date, &time],
            )
            .await
            .map_err(query_error)?;
        row.map(|r| models::appointment_from_row(&r)).transpose()
    }

    async fn find_active_appointment_for_patient(
        &self,
        patient: &PatientId,
        doctor: &DoctorId,
    ) -> Result<Option<Appointment>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(
                "SELECT * FROM appointments \
                 WHERE patient_id = $1 AND doctor_id = $2 AND status = ANY($3) \
                 LIMIT 1",
                &[
                    patient.as_uuid(),
                    doctor.as_uuid(),
                    &ACTIVE_APPOINTMENT_STATUSES.as_slice(),
                ],
            )
            .await
            .map_err(query_error)?;
        row.map(|r| models::appointment_from_row(&r)).transpose()
    }

    async fn find_active_test_booking(
        &self,
        patient: &PatientId,
        test: &TestId,
    ) -> Result<Option<TestBooking>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(
                "SELECT * FROM test_bookings \
                 WHERE patient_id = $1 AND test_id = $2 AND status = ANY($3) \
                 LIMIT 1",
                &[
                    patient.as_uuid(),
                    test.as_uuid(),
                    &ACTIVE_TEST_BOOKING_STATUSES.as_slice(),
                ],
            )
            .await
            .map_err(query_error)?;
        row.map(|r| models::test_booking_from_row(&r)).transpose()
    }

    async fn history_for_patient(&self, patient: &PatientId) -> Result<Vec<PatientHistory>> {
        let conn = self.client.get_connection().await?;
        let rows = conn
            .query(
                "SELECT * FROM patient_history WHERE patient_id = $1 \
                 ORDER BY recorded_date DESC, created_at DESC",
                &[patient.as_uuid()],
            )
            .await
            .map_err(query_error)?;
        rows.iter().map(models::history_from_row).collect()
    }

    async fn prescriptions_for_patient(
        &self,
        patient: &PatientId,
    ) -> Result<Vec<Prescription>> {
        let conn = self.client.get_connection().await?;
        let rows = conn
            .query(
                "SELECT * FROM prescriptions WHERE patient_id = $1 \
                 ORDER BY created_at DESC",
                &[patient.as_uuid()],
            )
            .await
            .map_err(query_error)?;
        rows.iter().map(models::prescription_from_row).collect()
    }

    async fn appointment_status_counts(&self) -> Result<Vec<(AppointmentStatus, u64)>> {
        self.status_counts("appointments", AppointmentStatus::all())
            .await
    }

    async fn test_booking_status_counts(&self) -> Result<Vec<(TestBookingStatus, u64)>> {
        self.status_counts("test_bookings", TestBookingStatus::all())
            .await
    }

    async fn payment_status_counts(&self) -> Result<Vec<(PaymentStatus, u64)>> {
        self.status_counts("payments", PaymentStatus::all()).await
    }

    async fn apply(&self, changeset: Changeset) -> Result<()> {
        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .build_transaction()
            .isolation_level(IsolationLevel::Serializable)
            .start()
            .await
            .map_err(query_error)?;

        for guard in &changeset.guards {
            self.check_guard(&tx, guard).await?;
        }
        for write in &changeset.writes {
            self.apply_write(&tx, write).await?;
        }

        tx.commit().await.map_err(query_error)
    }
}

impl PostgresStore {
    async fn status_counts<S>(&self, table: &str, statuses: &[S]) -> Result<Vec<(S, u64)>>
    where
        S: Copy + PartialEq + FromStr,
        S::Err: std::fmt::Display,
    {
        let conn = self.client.get_connection().await?;
        let query = format!("SELECT status, COUNT(*) AS n FROM {table} GROUP BY status");
        let rows = conn.query(&query, &[]).await.map_err(query_error)?;

        let mut counted: Vec<(S, u64)> = statuses.iter().map(|s| (*s, 0)).collect();
        for row in rows {
            let label: String = row.get("status");
            let count: i64 = row.get("n");
            let status = label
                .parse::<S>()
                .map_err(|e| StorageError::Mapping(format!("{table}.status: {e}")))?;
            if let Some(entry) = counted.iter_mut().find(|(s, _)| *s == status) {
                entry.1 = count as u64;
            }
        }
        Ok(counted)
    }
}
