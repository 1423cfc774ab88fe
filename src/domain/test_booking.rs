//! Diagnostic test booking entity and status machine
//!
//! A test booking reserves a diagnostic test at a lab for a patient. It uses
//! the same payment-gated activation pattern as appointments:
//!
//! ```text
//! Pending Payment -> { Booked, Cancelled }
//! Booked          -> { Completed, Cancelled }
//! Completed / Cancelled: terminal
//! ```

use crate::domain::ids::{LabId, PatientId, TestBookingId, TestId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Test booking lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestBookingStatus {
    /// Created, waiting for the companion payment
    #[serde(rename = "Pending Payment")]
    PendingPayment,
    /// Payment completed, test reserved
    Booked,
    /// Sample taken and result recorded
    Completed,
    /// Booking cancelled
    Cancelled,
}

impl TestBookingStatus {
    /// All states a transition may legally reach from `self`
    pub fn valid_transitions(&self) -> &'static [TestBookingStatus] {
        use TestBookingStatus::*;
        match self {
            PendingPayment => &[Booked, Cancelled],
            Booked => &[Completed, Cancelled],
            // Terminal states
            Completed | Cancelled => &[],
        }
    }

    /// Whether `next` is a legal machine edge from `self`
    pub fn can_transition_to(&self, next: TestBookingStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// An open booking counts against the duplicate check; completed and
    /// cancelled ones do not block a re-booking
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TestBookingStatus::PendingPayment | TestBookingStatus::Booked
        )
    }

    /// The status label as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            TestBookingStatus::PendingPayment => "Pending Payment",
            TestBookingStatus::Booked => "Booked",
            TestBookingStatus::Completed => "Completed",
            TestBookingStatus::Cancelled => "Cancelled",
        }
    }

    /// Every status, in lifecycle order
    pub fn all() -> &'static [TestBookingStatus] {
        use TestBookingStatus::*;
        &[PendingPayment, Booked, Completed, Cancelled]
    }
}

impl fmt::Display for TestBookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TestBookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending Payment" => Ok(TestBookingStatus::PendingPayment),
            "Booked" => Ok(TestBookingStatus::Booked),
            "Completed" => Ok(TestBookingStatus::Completed),
            "Cancelled" => Ok(TestBookingStatus::Cancelled),
            other => Err(format!("Unknown test booking status: {other}")),
        }
    }
}

/// A diagnostic test reservation at a lab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestBooking {
    /// Unique identifier
    pub id: TestBookingId,

    /// Patient the sample belongs to
    pub patient: PatientId,

    /// The diagnostic test being booked
    pub test: TestId,

    /// Lab performing the test
    pub lab: LabId,

    /// Date the sample is to be collected
    pub booking_date: NaiveDate,

    /// Current lifecycle state
    pub status: TestBookingStatus,

    /// Result notes recorded on completion
    pub result_notes: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl TestBooking {
    /// Creates a new test booking in `Pending Payment`
    pub fn new(patient: PatientId, test: TestId, lab: LabId, booking_date: NaiveDate) -> Self {
        Self {
            id: TestBookingId::generate(),
            patient,
            test,
            lab,
            booking_date,
            status: TestBookingStatus::PendingPayment,
            result_notes: None,
            created_at: Utc::now(),
        }
    }

    /// The booking date at start of day, for cancellation-window checks
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.booking_date.and_time(NaiveTime::MIN)
    }

    /// Returns a copy advanced to `next` without validating the edge
    pub fn with_status(&self, next: TestBookingStatus) -> Self {
        let mut updated = self.clone();
        updated.status = next;
        updated
    }

    /// Returns a completed copy carrying the result notes
    pub fn with_result(&self, notes: impl Into<String>) -> Self {
        let mut updated = self.with_status(TestBookingStatus::Completed);
        updated.result_notes = Some(notes.into());
        updated
    }
}
