//! These structs provide the CLI interface for the budget CLI.

use crate::model::TransactionType;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// budget: track income and expenses against a running balance.
///
/// Every transaction is kept in a local data directory. The balance is always total income minus
/// total expenses. The remind subcommand stays running and nudges you to log your spending twice a
/// day.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and write a default config.json.
    ///
    /// Pass --budget-home to put it somewhere other than $HOME/budget. Edit config.json afterwards
    /// to change the opening balance, categories or reminder times.
    Init,
    /// Record an income or expense.
    Add(AddArgs),
    /// Delete a transaction by id.
    Delete(DeleteArgs),
    /// Show the balance, totals and every transaction, newest first.
    List,
    /// Show the balance and totals only.
    Summary,
    /// Stay running and show a reminder at each configured time of day. Stop with Ctrl-C.
    Remind,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where budget data and configuration is held. Defaults to ~/budget
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// Args for the `budget add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The amount, e.g. 42.50 or $1,200. Must be greater than zero.
    amount: String,

    /// What the money was for.
    #[arg(long, short, default_value = "")]
    description: String,

    /// One of the categories in config.json.
    #[arg(long, short, default_value = "Other")]
    category: String,

    /// income or expense.
    #[arg(long = "type", short, default_value_t = TransactionType::Expense)]
    transaction_type: TransactionType,

    /// The date, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// The time of day, HH:MM or HH:MM:SS. Defaults to now.
    #[arg(long, value_parser = parse_time)]
    time: Option<NaiveTime>,
}

impl AddArgs {
    pub fn new(
        amount: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            amount: amount.into(),
            description: description.into(),
            category: category.into(),
            transaction_type,
            date: None,
            time: None,
        }
    }

    /// Sets an explicit date and time instead of "now".
    pub fn at(mut self, date: Option<NaiveDate>, time: Option<NaiveTime>) -> Self {
        self.date = date;
        self.time = time;
        self
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("'{s}' is not a time, expected HH:MM or HH:MM:SS"))
}

/// Args for the `budget delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id of the transaction, as shown by `budget list`.
    id: i64,
}

impl DeleteArgs {
    pub fn new(id: i64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> i64 {
        self.id
    }
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budget"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("budget")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
