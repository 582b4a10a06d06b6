//! Withdrawal period calculator.
//!
//! After a treatment, meat, milk and eggs from the animal may not be used
//! until a per-category number of days has passed. Each category runs
//! independently from the event date.

use chrono::{Days, NaiveDate};
use shared::{Withdrawal, WithdrawalCategory, WithdrawalDays, WithdrawalPeriod};

use crate::backend::domain::errors::{ServiceError, ServiceResult};

/// Build the withdrawal for an event, or `None` when every category is 0 days.
/// End dates past the calendar range are a validation error.
pub fn calculate(event_date: NaiveDate, days: &WithdrawalDays) -> ServiceResult<Option<Withdrawal>> {
    let mut withdrawal = Withdrawal::default();
    for category in WithdrawalCategory::ALL {
        let count = days.get(category);
        if count == 0 {
            continue;
        }
        let end_date = event_date
            .checked_add_days(Days::new(u64::from(count)))
            .ok_or_else(|| ServiceError::validation("Withdrawal period is out of range"))?;
        withdrawal.set(category, Some(WithdrawalPeriod { days: count, end_date }));
    }

    if withdrawal.is_empty() {
        Ok(None)
    } else {
        Ok(Some(withdrawal))
    }
}

/// Whole days from `today` until `end_date`; negative once it has passed
pub fn days_remaining(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

/// A period stays active through its end date
pub fn is_active(end_date: NaiveDate, today: NaiveDate) -> bool {
    days_remaining(end_date, today) >= 0
}

/// Active periods of a withdrawal with their days left
pub fn active_periods(
    withdrawal: &Withdrawal,
    today: NaiveDate,
) -> Vec<(WithdrawalCategory, WithdrawalPeriod, i64)> {
    withdrawal
        .periods()
        .filter(|(_, period)| is_active(period.end_date, today))
        .map(|(category, period)| (category, *period, days_remaining(period.end_date, today)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_end_date_adds_days() {
        let days = WithdrawalDays { meat: 10, dairy: 0, eggs: 0 };
        let withdrawal = calculate(date(2024, 1, 1), &days).unwrap().unwrap();

        let meat = withdrawal.meat.unwrap();
        assert_eq!(meat.days, 10);
        assert_eq!(meat.end_date, date(2024, 1, 11));
        assert!(withdrawal.dairy.is_none());
        assert!(withdrawal.eggs.is_none());
    }

    #[test]
    fn test_days_remaining_counts_down() {
        assert_eq!(days_remaining(date(2024, 1, 11), date(2024, 1, 5)), 6);
        assert!(is_active(date(2024, 1, 11), date(2024, 1, 11)));
        assert!(!is_active(date(2024, 1, 11), date(2024, 1, 12)));
    }

    #[test]
    fn test_zero_days_means_no_withdrawal() {
        assert_eq!(calculate(date(2024, 1, 1), &WithdrawalDays::default()).unwrap(), None);
    }

    #[test]
    fn test_end_date_past_calendar_is_rejected() {
        let days = WithdrawalDays { meat: u32::MAX, dairy: 0, eggs: 0 };
        let result = calculate(date(2024, 1, 1), &days);
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let days = WithdrawalDays { meat: 0, dairy: 2, eggs: 0 };
        assert!(calculate(NaiveDate::MAX, &days).is_err());
    }

    #[test]
    fn test_categories_are_independent() {
        let days = WithdrawalDays { meat: 30, dairy: 3, eggs: 0 };
        let withdrawal = calculate(date(2024, 2, 27), &days).unwrap().unwrap();

        assert_eq!(withdrawal.dairy.unwrap().end_date, date(2024, 3, 1));
        assert_eq!(withdrawal.meat.unwrap().end_date, date(2024, 3, 28));

        let active = active_periods(&withdrawal, date(2024, 3, 5));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, WithdrawalCategory::Meat);
        assert_eq!(active[0].2, 23);
    }
}
