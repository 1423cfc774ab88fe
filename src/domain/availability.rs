//! Doctor availability
//!
//! Weekly working-hours template for a doctor. The window check mirrors the
//! validation the front desk applies before offering a slot: end after start,
//! and any break fully inside working hours.

use crate::domain::errors::CarebookError;
use crate::domain::ids::DoctorId;
use crate::domain::result::Result;
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Weekly availability template for one doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorAvailability {
    /// Doctor this template belongs to
    pub doctor: DoctorId,

    /// Days of the week the doctor consults
    pub working_days: Vec<Weekday>,

    /// Start of working hours
    pub start_time: NaiveTime,

    /// End of working hours
    pub end_time: NaiveTime,

    /// Optional break window start
    pub break_start: Option<NaiveTime>,

    /// Optional break window end
    pub break_end: Option<NaiveTime>,

    /// Length of one bookable slot, in minutes
    pub slot_duration_minutes: u32,

    /// Soft cap on appointments per day
    pub max_appointments: u32,
}

impl DoctorAvailability {
    /// Creates a template with no break and a default daily cap
    pub fn new(
        doctor: DoctorId,
        working_days: Vec<Weekday>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        slot_duration_minutes: u32,
    ) -> Self {
        Self {
            doctor,
            working_days,
            start_time,
            end_time,
            break_start: None,
            break_end: None,
            slot_duration_minutes,
            max_appointments: 10,
        }
    }

    /// Validates the time windows
    ///
    /// # Errors
    ///
    /// Returns a validation error if end time is not after start time, the
    /// break window is inverted, the break falls outside working hours, or
    /// the slot duration is zero.
    pub fn validate(&self) -> Result<()> {
        if self.start_time >= self.end_time {
            return Err(CarebookError::Validation(
                "End time must be after start time".to_string(),
            ));
        }

        if self.slot_duration_minutes == 0 {
            return Err(CarebookError::Validation(
                "Slot duration must be at least one minute".to_string(),
            ));
        }

        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => {
                if start >= end {
                    return Err(CarebookError::Validation(
                        "Break end must be after break start".to_string(),
                    ));
                }
                if start < self.start_time || end > self.end_time {
                    return Err(CarebookError::Validation(
                        "Break must be within working hours".to_string(),
                    ));
                }
            }
            (None, None) => {}
            _ => {
                return Err(CarebookError::Validation(
                    "Break start and break end must be set together".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Whether the given time falls inside the break window
    pub fn in_break(&self, time: NaiveTime) -> bool {
        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => time >= start && time < end,
            _ => false,
        }
    }
}
