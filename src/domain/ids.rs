//! Domain identifier types
//!
//! Newtype wrappers around `Uuid` for every entity family. The newtypes keep
//! identifiers from being mixed up at compile time: an `AppointmentId` cannot
//! be passed where a `PaymentId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parses an identifier from its string form
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not a valid UUID.
            pub fn parse(s: &str) -> Result<Self, String> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| format!(concat!("Invalid ", $label, " id '{}': {}"), s, e))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

entity_id!(
    /// Identifier of a patient profile
    PatientId,
    "patient"
);
entity_id!(
    /// Identifier of a doctor profile
    DoctorId,
    "doctor"
);
entity_id!(
    /// Identifier of a diagnostic lab
    LabId,
    "lab"
);
entity_id!(
    /// Identifier of a diagnostic test offered by a lab
    TestId,
    "diagnostic test"
);
entity_id!(
    /// Identifier of an appointment
    AppointmentId,
    "appointment"
);
entity_id!(
    /// Identifier of a diagnostic test booking
    TestBookingId,
    "test booking"
);
entity_id!(
    /// Identifier of a payment
    PaymentId,
    "payment"
);
entity_id!(
    /// Identifier of a medical-history record
    HistoryId,
    "history record"
);
entity_id!(
    /// Identifier of a prescription
    PrescriptionId,
    "prescription"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let a = AppointmentId::generate();
        let b = AppointmentId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = PaymentId::generate();
        let parsed = PaymentId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_invalid() {
        let err = DoctorId::parse("not-a-uuid").unwrap_err();
        assert!(err.contains("Invalid doctor id"));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = PatientId::generate();
        let parsed = PatientId::parse(&format!("  {id}  ")).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_serde_transparent() {
        let id = TestBookingId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: TestBookingId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
