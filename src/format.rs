//! Presentation helpers. These are pure functions of their inputs and the current time; nothing
//! here is ever persisted.

use crate::model::Transaction;
use chrono::{Datelike, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Formats the absolute value of `value` as US dollars, e.g. `$18,914.90`.
pub fn format_currency(value: Decimal) -> String {
    let num = value.abs().round_dp(2);
    format!(
        "${}",
        format_num::format_num!(",.2f", num.to_f64().unwrap_or_default())
    )
}

/// Like `format_currency`, but keeps a leading `-` for negative values. Used for the balance,
/// which can go below zero.
pub fn format_balance(value: Decimal) -> String {
    if value.is_sign_negative() && !value.round_dp(2).is_zero() {
        format!("-{}", format_currency(value))
    } else {
        format_currency(value)
    }
}

/// Formats the amount of a transaction with its sign, e.g. `+$2,000.00` or `-$42.50`.
pub fn format_signed_amount(transaction: &Transaction) -> String {
    format!(
        "{}{}",
        transaction.transaction_type().sign(),
        format_currency(transaction.amount().value())
    )
}

/// Describes when a transaction happened relative to `now`:
/// - `Today at 2:05 PM`
/// - `Yesterday at 9:00 AM`
/// - `Jan 6 at 12:00 AM` for other dates in the current year
/// - `Dec 24, 2025 at 6:30 PM` for dates in other years
///
/// The day difference is counted in calendar days, so 11:59 PM yesterday is still "Yesterday".
/// Dates in the future fall through to the absolute format.
pub fn relative_date_label(date: NaiveDateTime, now: NaiveDateTime) -> String {
    let time = date.format("%-I:%M %p");
    match (now.date() - date.date()).num_days() {
        0 => format!("Today at {time}"),
        1 => format!("Yesterday at {time}"),
        _ if date.year() != now.year() => format!("{} at {time}", date.format("%b %-d, %Y")),
        _ => format!("{} at {time}", date.format("%b %-d")),
    }
}
