//! Prescriptions
//!
//! A prescription is always written under an appointment; the (appointment,
//! patient, doctor) triple is required.

use crate::domain::ids::{AppointmentId, DoctorId, PatientId, PrescriptionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prescription lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrescriptionStatus {
    Active,
    Completed,
    Cancelled,
}

impl PrescriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionStatus::Active => "Active",
            PrescriptionStatus::Completed => "Completed",
            PrescriptionStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrescriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(PrescriptionStatus::Active),
            "Completed" => Ok(PrescriptionStatus::Completed),
            "Cancelled" => Ok(PrescriptionStatus::Cancelled),
            other => Err(format!("Unknown prescription status: {other}")),
        }
    }
}

/// A medicine prescribed during an appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    /// Unique identifier
    pub id: PrescriptionId,

    /// Appointment the prescription was written under
    pub appointment: AppointmentId,

    /// Patient it was written for
    pub patient: PatientId,

    /// Prescribing doctor
    pub doctor: DoctorId,

    /// Medicine name
    pub medicine_name: String,

    /// Dosage, e.g. "500mg"
    pub dosage: String,

    /// Frequency, e.g. "Twice daily"
    pub frequency: String,

    /// Duration, e.g. "5 days"
    pub duration: String,

    /// Usage instructions
    pub instructions: String,

    /// Current lifecycle state
    pub status: PrescriptionStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Prescription {
    /// Creates an active prescription
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        appointment: AppointmentId,
        patient: PatientId,
        doctor: DoctorId,
        medicine_name: impl Into<String>,
        dosage: impl Into<String>,
        frequency: impl Into<String>,
        duration: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            id: PrescriptionId::generate(),
            appointment,
            patient,
            doctor,
            medicine_name: medicine_name.into(),
            dosage: dosage.into(),
            frequency: frequency.into(),
            duration: duration.into(),
            instructions: instructions.into(),
            status: PrescriptionStatus::Active,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_prescription_is_active() {
        let rx = Prescription::new(
            AppointmentId::generate(),
            PatientId::generate(),
            DoctorId::generate(),
            "Paracetamol",
            "500mg",
            "Twice daily",
            "5 days",
            "After meals",
        );
        assert_eq!(rx.status, PrescriptionStatus::Active);
        assert_eq!(rx.medicine_name, "Paracetamol");
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            PrescriptionStatus::Active,
            PrescriptionStatus::Completed,
            PrescriptionStatus::Cancelled,
        ] {
            let parsed: PrescriptionStatus = status.as_str().parse().unwrap();
            assert_eq!(status, parsed);
        }
    }
}
