//! Patient medical history records
//!
//! A history record is created only as a side effect of completing an
//! appointment and is append-only: nothing in the crate updates or deletes
//! one after the fact.

use crate::domain::ids::{AppointmentId, DoctorId, HistoryId, PatientId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An append-only clinical note tied to a completed appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientHistory {
    /// Unique identifier
    pub id: HistoryId,

    /// Patient the note is about
    pub patient: PatientId,

    /// Doctor who wrote the note
    pub doctor: DoctorId,

    /// The appointment this note was produced by
    pub appointment: AppointmentId,

    /// Diagnosis text
    pub diagnosis: String,

    /// Treatment text
    pub treatment: String,

    /// Free-form notes
    pub notes: String,

    /// Clinical date of the record
    pub recorded_date: NaiveDate,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl PatientHistory {
    /// Creates a history record for a completed appointment
    pub fn new(
        patient: PatientId,
        doctor: DoctorId,
        appointment: AppointmentId,
        diagnosis: impl Into<String>,
        treatment: impl Into<String>,
        notes: impl Into<String>,
        recorded_date: NaiveDate,
    ) -> Self {
        Self {
            id: HistoryId::generate(),
            patient,
            doctor,
            appointment,
            diagnosis: diagnosis.into(),
            treatment: treatment.into(),
            notes: notes.into(),
            recorded_date,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_record() {
        let record = PatientHistory::new(
            PatientId::generate(),
            DoctorId::generate(),
            AppointmentId::generate(),
            "Viral fever",
            "Rest and fluids",
            "Follow up in one week if fever persists",
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        );
        assert_eq!(record.diagnosis, "Viral fever");
        assert_eq!(
            record.recorded_date,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
    }
}
