//! A personal income and expense tracker.
//!
//! The `Ledger` keeps every transaction, newest first, and persists the whole collection to a
//! `BlobStore` after each change. Totals are recomputed on demand, so the balance is always income
//! minus expenses. The `reminder` module runs daily reminders on tokio timers, independent of the
//! ledger.

mod app;
pub mod args;
mod backup;
pub mod clock;
pub mod commands;
mod config;
mod error;
pub mod format;
pub mod ledger;
pub mod model;
pub mod reminder;
pub mod render;
pub mod store;
mod utils;


pub use app::App;
pub use backup::Backup;
pub use config::Config;
pub use error::{Error, ErrorType, IntoResult, Result};
pub use ledger::{Ledger, LedgerPolicy, Summary};
pub use model::{Amount, NewTransaction, Transaction, TransactionType};
