//! Transition enforcement for the booking state machines
//!
//! The status enums in the domain layer carry the raw transition tables;
//! this module turns a disallowed edge into the typed error callers receive,
//! and owns the cancellation-window rule. All functions are pure: the clock
//! is always an explicit argument.

use crate::domain::appointment::AppointmentStatus;
use crate::domain::errors::BookingError;
use crate::domain::payment::PaymentStatus;
use crate::domain::test_booking::TestBookingStatus;
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

/// Validates an appointment status transition
///
/// # Errors
///
/// Returns `InvalidTransition` if `next` is not an edge from `current`.
pub fn ensure_appointment_transition(
    current: AppointmentStatus,
    next: AppointmentStatus,
) -> Result<(), BookingError> {
    debug!(from = %current, to = %next, "Validating appointment transition");

    if !current.can_transition_to(next) {
        warn!(from = %current, to = %next, "Invalid appointment transition attempted");
        return Err(BookingError::InvalidTransition {
            entity: "appointment",
            from: current.to_string(),
            to: next.to_string(),
        });
    }

    Ok(())
}

/// Validates a test booking status transition
///
/// # Errors
///
/// Returns `InvalidTransition` if `next` is not an edge from `current`.
pub fn ensure_test_booking_transition(
    current: TestBookingStatus,
    next: TestBookingStatus,
) -> Result<(), BookingError> {
    debug!(from = %current, to = %next, "Validating test booking transition");

    if !current.can_transition_to(next) {
        warn!(from = %current, to = %next, "Invalid test booking transition attempted");
        return Err(BookingError::InvalidTransition {
            entity: "test booking",
            from: current.to_string(),
            to: next.to_string(),
        });
    }

    Ok(())
}

/// Validates a doctor-facing advance to `target`
///
/// Confirming and completing accept an appointment one machine step short of
/// the direct edge: confirming a still-unpaid appointment walks
/// `Pending Payment -> Scheduled -> Confirmed`, and completing a visit that
/// was never confirmed walks `Scheduled -> Confirmed -> Completed`. Every
/// hop is a machine edge and the commit lands on `target` in one write.
///
/// # Errors
///
/// Returns `InvalidTransition` when no such path exists.
pub fn ensure_appointment_advance(
    current: AppointmentStatus,
    target: AppointmentStatus,
) -> Result<(), BookingError> {
    debug!(from = %current, to = %target, "Validating appointment advance");

    let reachable = current.can_transition_to(target)
        || current
            .valid_transitions()
            .iter()
            .any(|mid| mid.can_transition_to(target));
    if !reachable {
        warn!(from = %current, to = %target, "Invalid appointment advance attempted");
        return Err(BookingError::InvalidTransition {
            entity: "appointment",
            from: current.to_string(),
            to: target.to_string(),
        });
    }

    Ok(())
}

/// Validates that a payment may be marked paid
///
/// Pending and Failed payments may settle; an already-Paid payment is the
/// caller's idempotent no-op case and never reaches this check.
///
/// # Errors
///
/// Returns `InvalidTransition` for any other edge.
pub fn ensure_payment_settles(current: PaymentStatus) -> Result<(), BookingError> {
    match current {
        PaymentStatus::Pending | PaymentStatus::Failed => Ok(()),
        PaymentStatus::Paid => Err(BookingError::InvalidTransition {
            entity: "payment",
            from: current.to_string(),
            to: PaymentStatus::Paid.to_string(),
        }),
    }
}

/// Validates that an appointment may be cancelled
///
/// Cancellation is a patient/front-desk operation: it is only allowed while
/// the appointment is `Pending Payment` or `Scheduled`, and only while the
/// slot is strictly in the future (plus any configured notice period).
///
/// # Errors
///
/// Returns `CancellationNotAllowed` with the reason.
pub fn ensure_appointment_cancellable(
    status: AppointmentStatus,
    scheduled_at: NaiveDateTime,
    now: NaiveDateTime,
    min_notice_hours: i64,
) -> Result<(), BookingError> {
    match status {
        AppointmentStatus::PendingPayment | AppointmentStatus::Scheduled => {}
        other => {
            return Err(BookingError::CancellationNotAllowed(format!(
                "appointment is {other}"
            )));
        }
    }

    ensure_in_future(scheduled_at, now, min_notice_hours)
}

/// Validates that a test booking may be cancelled
///
/// # Errors
///
/// Returns `CancellationNotAllowed` with the reason.
pub fn ensure_test_booking_cancellable(
    status: TestBookingStatus,
    scheduled_at: NaiveDateTime,
    now: NaiveDateTime,
    min_notice_hours: i64,
) -> Result<(), BookingError> {
    match status {
        TestBookingStatus::PendingPayment | TestBookingStatus::Booked => {}
        other => {
            return Err(BookingError::CancellationNotAllowed(format!(
                "test booking is {other}"
            )));
        }
    }

    ensure_in_future(scheduled_at, now, min_notice_hours)
}

fn ensure_in_future(
    scheduled_at: NaiveDateTime,
    now: NaiveDateTime,
    min_notice_hours: i64,
) -> Result<(), BookingError> {
    if scheduled_at <= now {
        return Err(BookingError::CancellationNotAllowed(
            "the booking date has already passed".to_string(),
        ));
    }

    let deadline = scheduled_at - Duration::hours(min_notice_hours);
    if now > deadline {
        return Err(BookingError::CancellationNotAllowed(format!(
            "cancellations require at least {min_notice_hours} hours notice"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_valid_appointment_transition() {
        assert!(ensure_appointment_transition(
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed
        )
        .is_ok());
    }

    #[test]
    fn test_invalid_appointment_transition() {
        let err = ensure_appointment_transition(
            AppointmentStatus::PendingPayment,
            AppointmentStatus::Completed,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { entity: "appointment", .. }));
    }

    #[test]
    fn test_invalid_test_booking_transition() {
        let err = ensure_test_booking_transition(
            TestBookingStatus::Completed,
            TestBookingStatus::Cancelled,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { entity: "test booking", .. }));
    }

    #[test_case(AppointmentStatus::Scheduled, AppointmentStatus::Confirmed => true)]
    #[test_case(AppointmentStatus::PendingPayment, AppointmentStatus::Confirmed => true)]
    #[test_case(AppointmentStatus::Confirmed, AppointmentStatus::Completed => true)]
    #[test_case(AppointmentStatus::Scheduled, AppointmentStatus::Completed => true)]
    #[test_case(AppointmentStatus::PendingPayment, AppointmentStatus::Completed => false)]
    #[test_case(AppointmentStatus::Confirmed, AppointmentStatus::Confirmed => false)]
    #[test_case(AppointmentStatus::Completed, AppointmentStatus::Confirmed => false)]
    #[test_case(AppointmentStatus::Cancelled, AppointmentStatus::Completed => false)]
    fn test_appointment_advance(
        current: AppointmentStatus,
        target: AppointmentStatus,
    ) -> bool {
        ensure_appointment_advance(current, target).is_ok()
    }

    #[test_case(PaymentStatus::Pending => true)]
    #[test_case(PaymentStatus::Failed => true)]
    #[test_case(PaymentStatus::Paid => false)]
    fn test_payment_settlement(current: PaymentStatus) -> bool {
        ensure_payment_settles(current).is_ok()
    }

    #[test]
    fn test_cancel_future_pending_appointment() {
        let result = ensure_appointment_cancellable(
            AppointmentStatus::PendingPayment,
            dt(2025, 1, 10, 9, 0),
            dt(2025, 1, 9, 9, 0),
            0,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_cancel_past_appointment_rejected() {
        let err = ensure_appointment_cancellable(
            AppointmentStatus::Scheduled,
            dt(2025, 1, 10, 9, 0),
            dt(2025, 1, 10, 9, 0),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::CancellationNotAllowed(_)));
    }

    #[test_case(AppointmentStatus::Confirmed)]
    #[test_case(AppointmentStatus::Completed)]
    #[test_case(AppointmentStatus::Cancelled)]
    #[test_case(AppointmentStatus::NoShow)]
    fn test_cancel_wrong_status_rejected(status: AppointmentStatus) {
        let err = ensure_appointment_cancellable(
            status,
            dt(2025, 1, 10, 9, 0),
            dt(2025, 1, 1, 9, 0),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::CancellationNotAllowed(_)));
    }

    #[test]
    fn test_cancel_inside_notice_window_rejected() {
        // 24h notice required, only 2h remain
        let err = ensure_appointment_cancellable(
            AppointmentStatus::Scheduled,
            dt(2025, 1, 10, 9, 0),
            dt(2025, 1, 10, 7, 0),
            24,
        )
        .unwrap_err();
        assert!(err.to_string().contains("24 hours notice"));
    }

    #[test]
    fn test_cancel_booked_test_booking() {
        let result = ensure_test_booking_cancellable(
            TestBookingStatus::Booked,
            dt(2025, 2, 1, 0, 0),
            dt(2025, 1, 20, 12, 0),
            0,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_cancel_completed_test_booking_rejected() {
        let err = ensure_test_booking_cancellable(
            TestBookingStatus::Completed,
            dt(2025, 2, 1, 0, 0),
            dt(2025, 1, 20, 12, 0),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::CancellationNotAllowed(_)));
    }
}
