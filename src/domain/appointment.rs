//! Appointment entity and status machine
//!
//! An appointment holds a (doctor, date, time) slot for a patient. It is
//! created in `Pending Payment` and advances through the machine below; the
//! invariant that a slot holds at most one non-cancelled appointment is
//! enforced at commit time by the storage layer.
//!
//! ```text
//! Pending Payment -> { Scheduled, Cancelled }
//! Scheduled       -> { Confirmed, Cancelled, No Show }
//! Confirmed       -> { Completed, Cancelled }
//! Completed / Cancelled / No Show: terminal
//! ```

use crate::domain::ids::{AppointmentId, DoctorId, PatientId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Appointment lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    /// Created, waiting for the companion payment
    #[serde(rename = "Pending Payment")]
    PendingPayment,
    /// Payment completed, slot held
    Scheduled,
    /// Doctor confirmed the visit
    Confirmed,
    /// Visit finished; a history record exists
    Completed,
    /// Booking cancelled; slot released
    Cancelled,
    /// Patient did not show up
    #[serde(rename = "No Show")]
    NoShow,
}

impl AppointmentStatus {
    /// All states a transition may legally reach from `self`
    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;
        match self {
            PendingPayment => &[Scheduled, Cancelled],
            Scheduled => &[Confirmed, Cancelled, NoShow],
            Confirmed => &[Completed, Cancelled],
            // Terminal states
            Completed | Cancelled | NoShow => &[],
        }
    }

    /// Whether `next` is a legal machine edge from `self`
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// A non-cancelled appointment holds its slot
    pub fn holds_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    /// An open appointment counts against the duplicate check; finished
    /// visits do not block a re-booking with the same doctor
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::PendingPayment
                | AppointmentStatus::Scheduled
                | AppointmentStatus::Confirmed
        )
    }

    /// The status label as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::PendingPayment => "Pending Payment",
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No Show",
        }
    }

    /// Every status, in lifecycle order (used for status summaries)
    pub fn all() -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;
        &[PendingPayment, Scheduled, Confirmed, Completed, Cancelled, NoShow]
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending Payment" => Ok(AppointmentStatus::PendingPayment),
            "Scheduled" => Ok(AppointmentStatus::Scheduled),
            "Confirmed" => Ok(AppointmentStatus::Confirmed),
            "Completed" => Ok(AppointmentStatus::Completed),
            "Cancelled" => Ok(AppointmentStatus::Cancelled),
            "No Show" => Ok(AppointmentStatus::NoShow),
            other => Err(format!("Unknown appointment status: {other}")),
        }
    }
}

/// A booked doctor visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    /// Unique identifier
    pub id: AppointmentId,

    /// Patient who booked the visit
    pub patient: PatientId,

    /// Doctor whose slot is held
    pub doctor: DoctorId,

    /// Visit date
    pub date: NaiveDate,

    /// Visit time
    pub time: NaiveTime,

    /// Reason given at booking time
    pub reason: String,

    /// Current lifecycle state
    pub status: AppointmentStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Creates a new appointment in `Pending Payment`
    pub fn new(
        patient: PatientId,
        doctor: DoctorId,
        date: NaiveDate,
        time: NaiveTime,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: AppointmentId::generate(),
            patient,
            doctor,
            date,
            time,
            reason: reason.into(),
            status: AppointmentStatus::PendingPayment,
            created_at: Utc::now(),
        }
    }

    /// The scheduled slot as a combined date-time (naive, clinic-local)
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Returns a copy advanced to `next` without validating the edge
    ///
    /// Edge validation lives in the lifecycle layer; this only produces the
    /// updated entity.
    pub fn with_status(&self, next: AppointmentStatus) -> Self {
        let mut updated = self.clone();
        updated.status = next;
        updated
    }
}
