//! Amount type for handling monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal`. An `Amount` is never negative;
//! whether money came in or went out is carried by the transaction type.

use crate::format::format_currency;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The largest amount a single transaction may carry, one quadrillion dollars.
///
/// Amounts are stored as JSON numbers, and every value up to this bound reads back from an `f64`
/// as a value that is still within it.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Represents a dollar amount that is zero or greater.
///
/// User input goes through `FromStr` (or `Amount::positive`), which additionally rejects zero.
/// Persisted data goes through `Deserialize`, which accepts zero so that old entries still load.
///
/// # Examples
///
/// ```
/// # use budget_tracker::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,250.5").unwrap();
/// assert_eq!(amount.to_string(), "$1,250.50");
/// assert!(Amount::from_str("NaN").is_err());
/// assert!(Amount::from_str("-3").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    /// Creates an `Amount` from a value that must be greater than zero and at most `MAX_AMOUNT`.
    pub fn positive(value: Decimal) -> Result<Self, AmountError> {
        if value.is_zero() || value.is_sign_negative() {
            return Err(AmountError::NotPositive(value));
        }
        Self::bounded(value)
    }

    /// Creates an `Amount` from a value that must not be negative or exceed `MAX_AMOUNT`.
    pub fn non_negative(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        Self::bounded(value.abs())
    }

    fn bounded(value: Decimal) -> Result<Self, AmountError> {
        if value > MAX_AMOUNT {
            return Err(AmountError::TooLarge(value));
        }
        Ok(Self { value })
    }

    /// Skips the bounds so that arithmetic on out-of-range values can be exercised.
    #[cfg(test)]
    pub(crate) fn unchecked(value: Decimal) -> Self {
        Self { value }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

/// An error that can occur when turning text or numbers into an `Amount`.
pub enum AmountError {
    /// Nothing was entered.
    Empty,
    /// The text is not a finite decimal number.
    Parse(String, rust_decimal::Error),
    /// Zero or less was given where a positive amount is required.
    NotPositive(Decimal),
    /// A negative amount was given.
    Negative(Decimal),
    /// The amount is larger than `MAX_AMOUNT`.
    TooLarge(Decimal),
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Empty => write!(f, "An amount is required"),
            AmountError::Parse(s, e) => write!(f, "'{s}' is not a valid amount: {e}"),
            AmountError::NotPositive(v) => {
                write!(f, "The amount must be greater than zero, got {v}")
            }
            AmountError::Negative(v) => write!(f, "The amount cannot be negative, got {v}"),
            AmountError::TooLarge(v) => {
                write!(f, "The amount cannot be more than {MAX_AMOUNT}, got {v}")
            }
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Parse(_, e) => Some(e),
            _ => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses user input such as `42.50`, `$42.50` or `1,200`. The result must be positive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        // Remove dollar sign and thousands separators if present
        let without_dollar = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let without_commas = without_dollar.replace(',', "");

        let value = Decimal::from_str(&without_commas)
            .map_err(|e| AmountError::Parse(trimmed.to_string(), e))?;
        Amount::positive(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&format_currency(self.value))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Stored as a plain JSON number, e.g. `42.5`
        serializer.serialize_f64(self.value.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl AmountVisitor {
    fn from_text<E: de::Error>(s: &str) -> Result<Amount, E> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| E::custom(AmountError::Parse(s.to_string(), e)))?;
        Amount::non_negative(value).map_err(E::custom)
    }
}

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("a non-negative number or numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Amount::non_negative(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Amount::non_negative(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("{v} is not a finite amount")));
        }
        // `Display` for f64 yields the shortest text that round-trips, which keeps 42.5 as 42.5
        // rather than 42.49999999999999...
        Self::from_text(&v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Self::from_text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("42.50").unwrap();
        assert_eq!(amount.value(), dec("42.50"));
    }

    #[test]
    fn test_parse_with_dollar_and_commas() {
        let amount = Amount::from_str("  $1,234,567.89 ").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Amount::from_str("abc"),
            Err(AmountError::Parse(_, _))
        ));
        assert!(matches!(
            Amount::from_str("NaN"),
            Err(AmountError::Parse(_, _))
        ));
        assert!(matches!(
            Amount::from_str("inf"),
            Err(AmountError::Parse(_, _))
        ));
        assert!(matches!(Amount::from_str("   "), Err(AmountError::Empty)));
    }

    #[test]
    fn test_parse_rejects_zero_and_negative() {
        assert!(matches!(
            Amount::from_str("0"),
            Err(AmountError::NotPositive(_))
        ));
        assert!(matches!(
            Amount::from_str("-5.00"),
            Err(AmountError::NotPositive(_))
        ));
    }

    #[test]
    fn test_max_amount_is_one_quadrillion() {
        assert_eq!(MAX_AMOUNT, Decimal::from(1_000_000_000_000_000_i64));
    }

    #[test]
    fn test_parse_rejects_amounts_above_the_maximum() {
        assert!(matches!(
            Amount::from_str("50000000000000000000000000000"),
            Err(AmountError::TooLarge(_))
        ));
        assert!(matches!(
            Amount::from_str("1000000000000000.01"),
            Err(AmountError::TooLarge(_))
        ));
        let max = Amount::from_str("$1,000,000,000,000,000").unwrap();
        assert_eq!(max.value(), MAX_AMOUNT);
    }

    #[test]
    fn test_deserialize_rejects_amounts_above_the_maximum() {
        let from_float = serde_json::from_str::<Amount>("7.922816251426434e+28");
        assert!(from_float.is_err());
        let from_text = serde_json::from_str::<Amount>("\"1000000000000001\"");
        assert!(from_text.is_err());
    }

    #[test]
    fn test_amounts_up_to_the_maximum_read_back_from_json() {
        for text in ["1000000000000000", "999999999999999.99", "123456789012.34"] {
            let amount = Amount::from_str(text).unwrap();
            let json = serde_json::to_string(&amount).unwrap();
            let back: Amount = serde_json::from_str(&json).unwrap();
            assert!(back.value() <= MAX_AMOUNT, "{text} came back as {json}");
        }
        let max = Amount::from_str("1000000000000000").unwrap();
        let json = serde_json::to_string(&max).unwrap();
        assert_eq!(serde_json::from_str::<Amount>(&json).unwrap(), max);
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_str("50").unwrap().to_string(), "$50.00");
        assert_eq!(
            Amount::from_str("18957.4").unwrap().to_string(),
            "$18,957.40"
        );
    }

    #[test]
    fn test_serialize_as_number() {
        let amount = Amount::from_str("42.50").unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "42.5");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Amount = serde_json::from_str("18957.4").unwrap();
        assert_eq!(a.value(), dec("18957.4"));
        let b: Amount = serde_json::from_str("\"42.50\"").unwrap();
        assert_eq!(b.value(), dec("42.5"));
        let c: Amount = serde_json::from_str("12").unwrap();
        assert_eq!(c.value(), dec("12"));
        let zero: Amount = serde_json::from_str("0").unwrap();
        assert!(zero.is_zero());
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Amount>("-1.5").is_err());
        assert!(serde_json::from_str::<Amount>("\"x\"").is_err());
    }
}
