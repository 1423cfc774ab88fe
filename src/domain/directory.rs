//! Directory entities: patients, doctors, labs and the tests labs offer
//!
//! These are the reference records bookings point at. Monetary fields
//! (consultation fee, test price) are minor currency units; booking amounts
//! derive from them.

use crate::domain::ids::{DoctorId, LabId, PatientId, TestId};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ABO/Rh blood group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A+" => Ok(BloodGroup::APositive),
            "A-" => Ok(BloodGroup::ANegative),
            "B+" => Ok(BloodGroup::BPositive),
            "B-" => Ok(BloodGroup::BNegative),
            "AB+" => Ok(BloodGroup::AbPositive),
            "AB-" => Ok(BloodGroup::AbNegative),
            "O+" => Ok(BloodGroup::OPositive),
            "O-" => Ok(BloodGroup::ONegative),
            other => Err(format!("Unknown blood group: {other}")),
        }
    }
}

/// A registered patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub full_name: String,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: String,
    pub address: String,
    pub blood_group: Option<BloodGroup>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn new(full_name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: PatientId::generate(),
            full_name: full_name.into(),
            email: None,
            gender: None,
            date_of_birth: None,
            phone: phone.into(),
            address: String::new(),
            blood_group: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Age in whole years on the given date, if a date of birth is on file
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        let mut age = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

/// A doctor on the clinic roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub full_name: String,
    pub department: String,
    pub specialization: String,
    pub license_number: String,
    pub experience_years: u32,
    /// Consultation fee in minor currency units
    pub consultation_fee: i64,
    pub phone: String,
    pub bio: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    pub fn new(
        full_name: impl Into<String>,
        department: impl Into<String>,
        specialization: impl Into<String>,
        consultation_fee: i64,
    ) -> Self {
        Self {
            id: DoctorId::generate(),
            full_name: full_name.into(),
            department: department.into(),
            specialization: specialization.into(),
            license_number: String::new(),
            experience_years: 0,
            consultation_fee,
            phone: String::new(),
            bio: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A diagnostic lab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub id: LabId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Lab {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: LabId::generate(),
            name: name.into(),
            address: address.into(),
            phone: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Diagnostic test category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestCategory {
    #[serde(rename = "Blood Tests")]
    BloodTests,
    #[serde(rename = "Urine Tests")]
    UrineTests,
    Imaging,
    Screening,
    General,
}

impl TestCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCategory::BloodTests => "Blood Tests",
            TestCategory::UrineTests => "Urine Tests",
            TestCategory::Imaging => "Imaging",
            TestCategory::Screening => "Screening",
            TestCategory::General => "General",
        }
    }
}

impl FromStr for TestCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Blood Tests" => Ok(TestCategory::BloodTests),
            "Urine Tests" => Ok(TestCategory::UrineTests),
            "Imaging" => Ok(TestCategory::Imaging),
            "Screening" => Ok(TestCategory::Screening),
            "General" => Ok(TestCategory::General),
            other => Err(format!("Unknown test category: {other}")),
        }
    }
}

/// Sample type collected for a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    Blood,
    Urine,
    Saliva,
    Swab,
    Other,
}

impl SampleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::Blood => "Blood",
            SampleType::Urine => "Urine",
            SampleType::Saliva => "Saliva",
            SampleType::Swab => "Swab",
            SampleType::Other => "Other",
        }
    }
}

impl FromStr for SampleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Blood" => Ok(SampleType::Blood),
            "Urine" => Ok(SampleType::Urine),
            "Saliva" => Ok(SampleType::Saliva),
            "Swab" => Ok(SampleType::Swab),
            "Other" => Ok(SampleType::Other),
            other => Err(format!("Unknown sample type: {other}")),
        }
    }
}

/// A diagnostic test offered by a lab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticTest {
    pub id: TestId,
    pub lab: LabId,
    pub name: String,
    /// Unique short code, e.g. "CBC01"
    pub code: Option<String>,
    pub category: TestCategory,
    /// Price in minor currency units
    pub price: i64,
    pub sample_type: SampleType,
    /// Human-readable turnaround, e.g. "24 hours"
    pub result_duration: String,
    pub home_collection: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl DiagnosticTest {
    pub fn new(lab: LabId, name: impl Into<String>, category: TestCategory, price: i64) -> Self {
        Self {
            id: TestId::generate(),
            lab,
            name: name.into(),
            code: None,
            category,
            price,
            sample_type: SampleType::Blood,
            result_duration: "24 hours".to_string(),
            home_collection: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
