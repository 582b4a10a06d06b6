//! Lenient numeric parsing and currency display for budget forms.
//!
//! Form fields arrive as raw text. Anything that does not start with a number
//! counts as zero, the way a spreadsheet-style form behaves; nothing here
//! ever fails.

use num_format::{Locale, ToFormattedString as _};
use shared::MoneyAmount;

/// Parse the leading numeric prefix of `input`, or 0 when there is none.
///
/// `"12.5"` -> 12.5, `"12abc"` -> 12, `"abc"` -> 0, `""` -> 0.
pub fn parse_amount(input: &str) -> f64 {
    let text = input.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }

    // Exponent only counts when at least one digit follows it
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Parse an optional amount; zero or unparsable input means "not set"
pub fn parse_optional_amount(input: &str) -> Option<f64> {
    let value = parse_amount(input);
    if value == 0.0 {
        None
    } else {
        Some(value)
    }
}

/// Format as dollars with two decimals and thousands separators.
/// Negative amounts put the sign ahead of the dollar sign (`-$1,234.50`, never
/// `$-1,234.50`); NaN and infinities render as `$0.00`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0.00".to_string();
    }

    let cents = (amount.abs() * 100.0).round() as i64;
    let dollars = (cents / 100).to_formatted_string(&Locale::en);
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, dollars, cents % 100)
}

/// Pair a raw amount with its display string
pub fn money(amount: f64) -> MoneyAmount {
    MoneyAmount {
        raw: amount,
        formatted: format_currency(amount),
    }
}
