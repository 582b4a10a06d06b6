//! Promotional balance payoff projection.
//!
//! A promotion must be paid off before its end date. The projector spreads
//! the balance over the months left, finishing one month early.

use chrono::NaiveDate;

use super::money::format_currency;

/// Average month length used to turn days into months
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Result of projecting one promotion
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub months_remaining: Option<f64>,
    pub required_payment: Option<f64>,
}

impl Projection {
    /// Display string; no payment renders as `$0.00`
    pub fn formatted(&self) -> String {
        format_currency(self.required_payment.unwrap_or(0.0))
    }

    /// Contribution to monthly totals
    pub fn payment_or_zero(&self) -> f64 {
        self.required_payment.unwrap_or(0.0)
    }
}

/// Months between `today` and `end_date`, fractional
pub fn months_remaining(today: NaiveDate, end_date: NaiveDate) -> f64 {
    (end_date - today).num_days() as f64 / DAYS_PER_MONTH
}

/// Required monthly payment for `balance` with `months` left.
///
/// More than one month: `balance / (months - 1)`. Within the last month the
/// whole balance is due. Past the end date nothing is due.
pub fn required_payment(balance: f64, months: f64) -> Option<f64> {
    if balance <= 0.0 || !months.is_finite() {
        return None;
    }
    if months > 1.0 {
        Some(balance / (months - 1.0))
    } else if months > 0.0 {
        Some(balance)
    } else {
        None
    }
}

/// Project a promotion with an optional end date
pub fn project(balance: f64, end_date: Option<NaiveDate>, today: NaiveDate) -> Projection {
    let Some(end_date) = end_date else {
        return Projection {
            months_remaining: None,
            required_payment: None,
        };
    };

    let months = months_remaining(today, end_date);
    Projection {
        months_remaining: Some(months),
        required_payment: required_payment(balance, months),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_payment_finishes_one_month_early() {
        assert_eq!(required_payment(1200.0, 3.0), Some(600.0));
    }

    #[test]
    fn test_last_month_pays_in_full() {
        assert_eq!(required_payment(450.0, 0.5), Some(450.0));
        assert_eq!(required_payment(450.0, 1.0), Some(450.0));
    }

    #[test]
    fn test_expired_or_empty_promotion_pays_nothing() {
        assert_eq!(required_payment(450.0, 0.0), None);
        assert_eq!(required_payment(450.0, -2.0), None);
        assert_eq!(required_payment(0.0, 6.0), None);
    }

    #[test]
    fn test_project_from_dates() {
        let today = date(2024, 1, 1);
        // 3044 days is exactly 100 months
        let end = today + chrono::Duration::days(3044);
        let projection = project(990.0, Some(end), today);

        let months = projection.months_remaining.unwrap();
        assert!((months - 100.0).abs() < 1e-9);
        let payment = projection.required_payment.unwrap();
        assert!((payment - 10.0).abs() < 1e-9);
        assert_eq!(projection.formatted(), "$10.00");
    }

    #[test]
    fn test_project_within_last_month_pays_balance() {
        let today = date(2024, 1, 1);
        let projection = project(500.0, Some(today + chrono::Duration::days(20)), today);

        let months = projection.months_remaining.unwrap();
        assert!(months > 0.0 && months < 1.0);
        assert_eq!(projection.required_payment, Some(500.0));
        assert_eq!(projection.formatted(), "$500.00");
    }

    #[test]
    fn test_project_without_end_date() {
        let projection = project(500.0, None, date(2024, 1, 1));
        assert_eq!(projection.required_payment, None);
        assert_eq!(projection.formatted(), "$0.00");
        assert_eq!(projection.payment_or_zero(), 0.0);
    }

    #[test]
    fn test_project_past_end_date() {
        let projection = project(500.0, Some(date(2023, 12, 1)), date(2024, 1, 1));
        assert_eq!(projection.required_payment, None);
    }
}
