//! Payment entity
//!
//! A payment funds exactly one booking: either an appointment or a test
//! booking, never both and never neither. Marking a payment paid cascades to
//! the linked booking; the cascade is an explicit service operation, not a
//! save hook (see `core::booking::service`).

use crate::domain::errors::BookingError;
use crate::domain::ids::{AppointmentId, PatientId, PaymentId, TestBookingId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Payment method accepted by the clinic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "UPI")]
    Upi,
    Card,
    Cash,
    NetBanking,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Card => "Card",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::NetBanking => "NetBanking",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPI" => Ok(PaymentMethod::Upi),
            "Card" => Ok(PaymentMethod::Card),
            "Cash" => Ok(PaymentMethod::Cash),
            "NetBanking" => Ok(PaymentMethod::NetBanking),
            other => Err(format!("Unknown payment method: {other}")),
        }
    }
}

/// Payment lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Awaiting settlement
    Pending,
    /// Settled; the linked booking has been activated
    Paid,
    /// Settlement attempt failed; may be retried
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
        }
    }

    /// Every status (used for status summaries)
    pub fn all() -> &'static [PaymentStatus] {
        &[PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Failed]
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Paid" => Ok(PaymentStatus::Paid),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("Unknown payment status: {other}")),
        }
    }
}

/// The booking a payment funds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentLink {
    Appointment(AppointmentId),
    TestBooking(TestBookingId),
}

/// A payment against a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,

    /// Paying patient
    pub patient: PatientId,

    /// Linked appointment, if this payment funds one
    pub appointment: Option<AppointmentId>,

    /// Linked test booking, if this payment funds one
    pub test_booking: Option<TestBookingId>,

    /// Amount due, in minor currency units
    pub amount: i64,

    /// How the patient pays
    pub method: PaymentMethod,

    /// Current lifecycle state
    pub status: PaymentStatus,

    /// Opaque transaction identifier, generated on creation if absent
    pub transaction_id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a pending payment funding an appointment
    pub fn for_appointment(
        patient: PatientId,
        appointment: AppointmentId,
        amount: i64,
        method: PaymentMethod,
    ) -> Self {
        Self {
            id: PaymentId::generate(),
            patient,
            appointment: Some(appointment),
            test_booking: None,
            amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: generate_transaction_id(),
            created_at: Utc::now(),
        }
    }

    /// Creates a pending payment funding a test booking
    pub fn for_test_booking(
        patient: PatientId,
        test_booking: TestBookingId,
        amount: i64,
        method: PaymentMethod,
    ) -> Self {
        Self {
            id: PaymentId::generate(),
            patient,
            appointment: None,
            test_booking: Some(test_booking),
            amount,
            method,
            status: PaymentStatus::Pending,
            transaction_id: generate_transaction_id(),
            created_at: Utc::now(),
        }
    }

    /// Resolves which booking this payment funds
    ///
    /// # Errors
    ///
    /// Returns `UnlinkedPayment` if neither reference is set, `DualLink` if
    /// both are.
    pub fn link(&self) -> Result<PaymentLink, BookingError> {
        match (self.appointment, self.test_booking) {
            (Some(appointment), None) => Ok(PaymentLink::Appointment(appointment)),
            (None, Some(test_booking)) => Ok(PaymentLink::TestBooking(test_booking)),
            (None, None) => Err(BookingError::UnlinkedPayment(self.id)),
            (Some(_), Some(_)) => Err(BookingError::DualLink(self.id)),
        }
    }

    /// Returns a copy with the given status, assigning a transaction id if
    /// one was never set
    pub fn with_status(&self, next: PaymentStatus) -> Self {
        let mut updated = self.clone();
        updated.status = next;
        if updated.transaction_id.is_empty() {
            updated.transaction_id = generate_transaction_id();
        }
        updated
    }
}

/// Generates an opaque 12-character uppercase transaction identifier
pub fn generate_transaction_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    hex[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Payment {
        Payment::for_appointment(
            PatientId::generate(),
            AppointmentId::generate(),
            50_000,
            PaymentMethod::Upi,
        )
    }

    #[test]
    fn test_new_payment_is_pending_with_transaction_id() {
        let payment = sample();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.transaction_id.len(), 12);
        assert!(payment
            .transaction_id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        assert_ne!(generate_transaction_id(), generate_transaction_id());
    }

    #[test]
    fn test_link_appointment() {
        let payment = sample();
        let link = payment.link().unwrap();
        assert_eq!(link, PaymentLink::Appointment(payment.appointment.unwrap()));
    }

    #[test]
    fn test_link_test_booking() {
        let booking_id = TestBookingId::generate();
        let payment =
            Payment::for_test_booking(PatientId::generate(), booking_id, 120_000, PaymentMethod::Card);
        assert_eq!(payment.link().unwrap(), PaymentLink::TestBooking(booking_id));
    }

    #[test]
    fn test_link_unlinked_rejected() {
        let mut payment = sample();
        payment.appointment = None;
        assert_eq!(
            payment.link().unwrap_err(),
            BookingError::UnlinkedPayment(payment.id)
        );
    }

    #[test]
    fn test_link_dual_rejected() {
        let mut payment = sample();
        payment.test_booking = Some(TestBookingId::generate());
        assert_eq!(payment.link().unwrap_err(), BookingError::DualLink(payment.id));
    }

    #[test]
    fn test_with_status_backfills_transaction_id() {
        let mut payment = sample();
        payment.transaction_id = String::new();
        let paid = payment.with_status(PaymentStatus::Paid);
        assert_eq!(paid.status, PaymentStatus::Paid);
        assert_eq!(paid.transaction_id.len(), 12);
    }

    #[test]
    fn test_method_string_roundtrip() {
        for method in [
            PaymentMethod::Upi,
            PaymentMethod::Card,
            PaymentMethod::Cash,
            PaymentMethod::NetBanking,
        ] {
            let parsed: PaymentMethod = method.as_str().parse().unwrap();
            assert_eq!(method, parsed);
        }
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in PaymentStatus::all() {
            let parsed: PaymentStatus = status.as_str().parse().unwrap();
            assert_eq!(*status, parsed);
        }
    }
}
