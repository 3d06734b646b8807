//! Types that represent the core data model, such as `Transaction` and `Amount`.
mod amount;
mod transaction;

pub use amount::{Amount, AmountError};
pub use transaction::{NewTransaction, Transaction, TransactionType};

/// The category labels offered when nothing else is configured.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Shopping",
    "Bills",
    "Entertainment",
    "Health",
    "Salary",
    "Other",
];
