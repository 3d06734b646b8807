//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands. Every handler returns an `Out`
//! holding a message for the user and, where it makes sense, the structured result.

mod add;
mod delete;
mod init;
mod list;
mod remind;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use add::add;
pub use delete::delete;
pub use init::init;
pub use list::{list, summary};
pub use remind::remind;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to the command line and to callers using the library.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Take the structured data, dropping the message.
    pub fn into_structure(self) -> Option<T> {
        self.structure
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_from_message() {
        let out: Out<()> = "Done".into();
        assert_eq!(out.message(), "Done");
        assert!(out.structure().is_none());
    }

    #[test]
    fn test_out_serializes_message_and_structure() {
        let out = Out::new("Deleted 1 transaction", true);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["message"], "Deleted 1 transaction");
        assert_eq!(json["structure"], true);
        assert_eq!(out.into_structure(), Some(true));
    }
}
