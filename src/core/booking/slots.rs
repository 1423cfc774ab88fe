//! Bookable slot enumeration
//!
//! Turns a doctor's weekly availability template into the concrete slots
//! offered for a given date, and answers whether a requested (date, time)
//! lands on one of them. Slot-conflict enforcement against other
//! appointments is separate; this module only covers working hours.

use crate::domain::availability::DoctorAvailability;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

/// All slot start times the doctor offers on `date`
///
/// Returns an empty list on non-working days. Slots step by the template's
/// slot duration, skip the break window, and never extend past the end of
/// working hours.
pub fn bookable_slots(availability: &DoctorAvailability, date: NaiveDate) -> Vec<NaiveTime> {
    if !availability.working_days.contains(&date.weekday()) {
        return Vec::new();
    }

    let step = Duration::minutes(i64::from(availability.slot_duration_minutes));
    let mut slots = Vec::new();
    let mut current = availability.start_time;

    loop {
        let end = match current.overflowing_add_signed(step) {
            // wrapped past midnight
            (_, wrapped) if wrapped != 0 => break,
            (end, _) => end,
        };
        if end > availability.end_time {
            break;
        }
        // A slot is skipped if any part of it overlaps the break
        let overlaps_break = availability.in_break(current)
            || match (availability.break_start, availability.break_end) {
                (Some(bs), Some(_)) => current < bs && end > bs,
                _ => false,
            };
        if !overlaps_break {
            slots.push(current);
        }
        current = end;
        if current >= availability.end_time {
            break;
        }
    }

    slots
}

/// Whether (date, time) is a slot the doctor actually offers
pub fn is_bookable(availability: &DoctorAvailability, date: NaiveDate, time: NaiveTime) -> bool {
    bookable_slots(availability, date).contains(&time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::DoctorId;
    use chrono::Weekday;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn availability() -> DoctorAvailability {
        // 2025-01-10 is a Friday
        DoctorAvailability::new(
            DoctorId::generate(),
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
            hm(9, 0),
            hm(12, 0),
            30,
        )
    }

    #[test]
    fn test_slots_on_working_day() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let slots = bookable_slots(&availability(), date);
        assert_eq!(
            slots,
            vec![hm(9, 0), hm(9, 30), hm(10, 0), hm(10, 30), hm(11, 0), hm(11, 30)]
        );
    }

    #[test]
    fn test_no_slots_on_off_day() {
        // 2025-01-11 is a Saturday
        let date = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
        assert!(bookable_slots(&availability(), date).is_empty());
    }

    #[test]
    fn test_break_window_is_skipped() {
        let mut avail = availability();
        avail.break_start = Some(hm(10, 0));
        avail.break_end = Some(hm(11, 0));
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let slots = bookable_slots(&avail, date);
        assert_eq!(slots, vec![hm(9, 0), hm(9, 30), hm(11, 0), hm(11, 30)]);
    }

    #[test]
    fn test_partial_slot_at_end_of_day_dropped() {
        let mut avail = availability();
        avail.slot_duration_minutes = 45;
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let slots = bookable_slots(&avail, date);
        // 11:15 + 45min ends exactly at 12:00, so it still fits
        assert_eq!(slots, vec![hm(9, 0), hm(9, 45), hm(10, 30), hm(11, 15)]);
    }

    #[test]
    fn test_is_bookable() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let avail = availability();
        assert!(is_bookable(&avail, date, hm(9, 30)));
        assert!(!is_bookable(&avail, date, hm(9, 15)));
        assert!(!is_bookable(&avail, date, hm(12, 0)));
    }
}
