//! Overdue fine calculation.
//!
//! Pure function of (due date, return time, hourly rate). Any partial hour
//! past the due date counts as a full hour; the ceiling rule is kept exactly
//! for compatibility with the historical billing behaviour.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Compute the fine owed for a loan returned at `now`.
///
/// Returns `0.00` when the loan is on time, otherwise
/// `hourly_rate * ceil(hours late)` rounded to 2 decimals.
pub fn fine_for(due_date: DateTime<Utc>, now: DateTime<Utc>, hourly_rate: Decimal) -> Decimal {
    if now <= due_date {
        return Decimal::new(0, 2);
    }

    let millis_late = (now - due_date).num_milliseconds();
    let hours_late = (millis_late + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR;

    (hourly_rate * Decimal::from(hours_late)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn rate() -> Decimal {
        Decimal::new(10, 2) // 0.10 per hour
    }

    #[test]
    fn on_time_return_is_free() {
        let due = Utc::now();
        assert_eq!(fine_for(due, due, rate()), Decimal::new(0, 2));
        assert_eq!(
            fine_for(due, due - Duration::days(3), rate()),
            Decimal::new(0, 2)
        );
    }

    #[test]
    fn partial_hour_counts_as_full_hour() {
        let due = Utc::now();
        assert_eq!(
            fine_for(due, due + Duration::seconds(1), rate()),
            Decimal::new(10, 2)
        );
        assert_eq!(
            fine_for(due, due + Duration::minutes(59), rate()),
            Decimal::new(10, 2)
        );
        assert_eq!(
            fine_for(due, due + Duration::minutes(61), rate()),
            Decimal::new(20, 2)
        );
    }

    #[test]
    fn exact_hour_boundary_is_not_rounded_up() {
        let due = Utc::now();
        assert_eq!(
            fine_for(due, due + Duration::hours(1), rate()),
            Decimal::new(10, 2)
        );
        assert_eq!(
            fine_for(due, due + Duration::hours(24), rate()),
            Decimal::new(240, 2)
        );
    }

    #[test]
    fn one_day_late_costs_two_forty() {
        // due = borrow + 7d, returned at borrow + 8d -> ceil(24) * 0.10 = 2.40
        let borrowed = Utc::now();
        let due = borrowed + Duration::days(7);
        let returned = borrowed + Duration::days(8);
        assert_eq!(fine_for(due, returned, rate()), Decimal::new(240, 2));
    }

    #[test]
    fn fine_is_monotonic_in_return_time() {
        let due = Utc::now();
        let mut previous = Decimal::new(0, 2);
        for minutes in (0..48 * 60).step_by(17) {
            let fine = fine_for(due, due + Duration::minutes(minutes), rate());
            assert!(fine >= previous, "fine decreased at {} minutes", minutes);
            previous = fine;
        }
    }
}
