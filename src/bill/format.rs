use chrono::NaiveDateTime;
use std::fmt::Write;

use crate::config::{FormatSettings, Grouping, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT};

/// Format a monetary amount as `<symbol><grouped digits>[.<fraction>]`.
///
/// Amounts are rounded to two decimals and the fraction is dropped when it
/// is zero, so `1234.0` renders as `₹1,234` and `12.5` as `₹12.5`.
pub fn format_currency(amount: f64, settings: &FormatSettings) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let mut out = String::new();
    if amount < 0.0 && cents > 0 {
        out.push('-');
    }
    out.push_str(&settings.currency_symbol);
    out.push_str(&group_digits(whole, settings.grouping));
    if frac > 0 {
        let frac = format!("{:02}", frac);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// Plain number in its shortest exact form, without trailing zeros
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // also folds -0
        return "0".to_string();
    }
    value.to_string()
}

pub fn format_date(at: &NaiveDateTime, settings: &FormatSettings) -> String {
    strftime(at, &settings.date_format, DEFAULT_DATE_FORMAT)
}

pub fn format_time(at: &NaiveDateTime, settings: &FormatSettings) -> String {
    strftime(at, &settings.time_format, DEFAULT_TIME_FORMAT)
}

// chrono reports a bad pattern as a fmt::Error at display time
fn strftime(at: &NaiveDateTime, pattern: &str, fallback: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", at.format(pattern)).is_ok() {
        return out;
    }
    tracing::warn!(pattern, "invalid date/time format, using default");
    at.format(fallback).to_string()
}

fn group_digits(value: u64, grouping: Grouping) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);

    for (i, ch) in digits.chars().rev().enumerate() {
        let boundary = match grouping {
            Grouping::Western => i > 0 && i % 3 == 0,
            // 12,34,56,789: three digits, then pairs
            Grouping::Indian => i == 3 || (i > 3 && (i - 3) % 2 == 0),
        };
        if boundary {
            out.push(',');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}
