use crate::error::{ErrorType, IntoResult, Result};
use crate::model::Amount;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Whether a transaction adds money to the balance or takes it away.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

impl TransactionType {
    /// `+` for income and `-` for expense.
    pub fn sign(&self) -> &'static str {
        match self {
            TransactionType::Income => "+",
            TransactionType::Expense => "-",
        }
    }
}

/// A single recorded income or expense event.
///
/// Serialized as:
/// ```json
/// {
///   "id": 1767657600000,
///   "description": "Groceries",
///   "amount": 42.5,
///   "category": "Food",
///   "type": "expense",
///   "date": "2026-01-06T14:05:00"
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: i64,
    #[serde(default)]
    description: String,
    amount: Amount,
    #[serde(default)]
    category: String,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    #[serde(with = "iso_seconds")]
    date: NaiveDateTime,
}

impl Transaction {
    pub(crate) fn new(id: i64, details: NewTransaction) -> Self {
        Self {
            id,
            description: details.description,
            amount: details.amount,
            category: details.category,
            transaction_type: details.transaction_type,
            date: details.date,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    /// The effect on the balance: `+amount` for income and `-amount` for expense.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Income => self.amount.value(),
            TransactionType::Expense => -self.amount.value(),
        }
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }
}

/// A validated transaction that has not yet been given an id. The amount has already been checked
/// to be positive, so turning this into a `Transaction` cannot fail.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewTransaction {
    description: String,
    amount: Amount,
    category: String,
    transaction_type: TransactionType,
    date: NaiveDateTime,
}

impl NewTransaction {
    /// # Errors
    /// - Returns a `Validation` error if `amount` is zero, negative or above `MAX_AMOUNT`.
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        category: impl Into<String>,
        transaction_type: TransactionType,
        date: NaiveDateTime,
    ) -> Result<Self> {
        let amount = Amount::positive(amount).pub_result(ErrorType::Validation)?;
        Ok(Self::from_amount(
            description,
            amount,
            category,
            transaction_type,
            date,
        ))
    }

    /// Builds a transaction from form input where the amount is still text.
    ///
    /// # Errors
    /// - Returns a `Validation` error if `amount` is empty, not a finite number, not positive, or
    ///   above `MAX_AMOUNT`.
    pub fn parse(
        description: impl Into<String>,
        amount: &str,
        category: impl Into<String>,
        transaction_type: TransactionType,
        date: NaiveDateTime,
    ) -> Result<Self> {
        let amount = Amount::from_str(amount).pub_result(ErrorType::Validation)?;
        Ok(Self::from_amount(
            description,
            amount,
            category,
            transaction_type,
            date,
        ))
    }

    pub(crate) fn from_amount(
        description: impl Into<String>,
        amount: Amount,
        category: impl Into<String>,
        transaction_type: TransactionType,
        date: NaiveDateTime,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category: category.into(),
            transaction_type,
            date: crate::clock::truncate_to_seconds(date),
        }
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }
}

/// Serializes dates as `YYYY-MM-DDTHH:MM:SS`. Fractional seconds are accepted when reading and
/// dropped.
mod iso_seconds {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub(super) fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let parsed = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| serde::de::Error::custom(format!("Invalid date '{s}': {e}")))?;
        Ok(crate::clock::truncate_to_seconds(parsed))
    }
}
