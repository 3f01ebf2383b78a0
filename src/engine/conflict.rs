use crate::limits::*;
use crate::model::*;

use super::error::ValidationError;
use super::store::ReservationLedger;
use super::EngineError;

/// Check duration and lead time of a requested window against `now`.
/// Duration is checked first and wins when both are out of policy.
pub fn validate_window(window: &TimeWindow, now: Ms) -> Result<(), ValidationError> {
    if window.duration < MIN_DURATION_MS || window.duration > MAX_DURATION_MS {
        return Err(ValidationError::Duration);
    }
    if window.start < now + MIN_LEAD_MS || window.start > now + MAX_LEAD_MS {
        return Err(ValidationError::Time);
    }
    Ok(())
}

pub(crate) fn validate_car_fields(car: &Car) -> Result<(), EngineError> {
    if car.id.len() > MAX_FIELD_LEN {
        return Err(EngineError::LimitExceeded("car id too long"));
    }
    validate_make_model(&car.make, &car.model)
}

pub(crate) fn validate_make_model(make: &str, model: &str) -> Result<(), EngineError> {
    if make.len() > MAX_FIELD_LEN {
        return Err(EngineError::LimitExceeded("make too long"));
    }
    if model.len() > MAX_FIELD_LEN {
        return Err(EngineError::LimitExceeded("model too long"));
    }
    Ok(())
}

/// True iff any reservation of `car_id` ends strictly after `now`.
pub fn has_upcoming_or_ongoing(ledger: &ReservationLedger, car_id: &str, now: Ms) -> bool {
    ledger
        .upcoming_or_ongoing(now)
        .any(|r| r.car.id == car_id)
}

/// Refuse mutation of a car that is in use or reserved ahead.
pub(crate) fn check_car_free(ledger: &ReservationLedger, car_id: &str, now: Ms) -> Result<(), EngineError> {
    if has_upcoming_or_ongoing(ledger, car_id, now) {
        return Err(EngineError::CarReserved(car_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Ms = 1_700_000_000_000;

    #[test]
    fn duration_bounds_are_inclusive() {
        let start = NOW + HOUR;
        assert!(validate_window(&TimeWindow::new(start, 5 * MINUTE), NOW).is_ok());
        assert!(validate_window(&TimeWindow::new(start, 2 * HOUR), NOW).is_ok());
        assert_eq!(
            validate_window(&TimeWindow::new(start, 5 * MINUTE - 1_000), NOW),
            Err(ValidationError::Duration)
        );
        assert_eq!(
            validate_window(&TimeWindow::new(start, 2 * HOUR + 1_000), NOW),
            Err(ValidationError::Duration)
        );
    }

    #[test]
    fn lead_time_bounds_are_inclusive() {
        let d = HOUR;
        assert!(validate_window(&TimeWindow::new(NOW + 5 * MINUTE, d), NOW).is_ok());
        assert!(validate_window(&TimeWindow::new(NOW + 24 * HOUR, d), NOW).is_ok());
        assert_eq!(
            validate_window(&TimeWindow::new(NOW + 4 * MINUTE, d), NOW),
            Err(ValidationError::Time)
        );
        assert_eq!(
            validate_window(&TimeWindow::new(NOW + 24 * HOUR + 10_000, d), NOW),
            Err(ValidationError::Time)
        );
    }

    #[test]
    fn window_may_end_past_horizon() {
        let w = TimeWindow::new(NOW + 24 * HOUR, 2 * HOUR);
        assert!(validate_window(&w, NOW).is_ok());
    }

    #[test]
    fn duration_error_reported_first() {
        let w = TimeWindow::new(NOW - HOUR, MINUTE);
        assert_eq!(validate_window(&w, NOW), Err(ValidationError::Duration));
    }

    #[test]
    fn zero_and_negative_durations_rejected() {
        assert_eq!(
            validate_window(&TimeWindow::new(NOW + HOUR, 0), NOW),
            Err(ValidationError::Duration)
        );
        assert_eq!(
            validate_window(&TimeWindow::new(NOW + HOUR, -HOUR), NOW),
            Err(ValidationError::Duration)
        );
    }

    #[test]
    fn guard_true_during_and_before_false_after() {
        let mut ledger = ReservationLedger::new();
        let window = TimeWindow::new(NOW + HOUR, HOUR);
        ledger.add(Reservation::new(window, Car::new("C1", "Mazda", "MX5")));

        assert!(has_upcoming_or_ongoing(&ledger, "C1", NOW)); // future
        assert!(has_upcoming_or_ongoing(&ledger, "C1", window.start)); // starts
        assert!(has_upcoming_or_ongoing(&ledger, "C1", window.end() - 1)); // ongoing
        assert!(!has_upcoming_or_ongoing(&ledger, "C1", window.end()));
        assert!(!has_upcoming_or_ongoing(&ledger, "C1", window.end() + HOUR));
        assert!(!has_upcoming_or_ongoing(&ledger, "C2", NOW));
    }

    #[test]
    fn check_car_free_reports_car() {
        let mut ledger = ReservationLedger::new();
        ledger.add(Reservation::new(
            TimeWindow::new(NOW + HOUR, HOUR),
            Car::new("C7", "Opel", "Astra"),
        ));
        assert_eq!(
            check_car_free(&ledger, "C7", NOW),
            Err(EngineError::CarReserved("C7".into()))
        );
        assert!(check_car_free(&ledger, "C7", NOW + 3 * HOUR).is_ok());
    }

    #[test]
    fn oversized_fields_rejected() {
        let long = "x".repeat(MAX_FIELD_LEN + 1);
        assert!(validate_car_fields(&Car::new(long.clone(), "a", "b")).is_err());
        assert!(validate_make_model("a", &long).is_err());
        assert!(validate_car_fields(&Car::new("C1", "a", "b")).is_ok());
    }
}
