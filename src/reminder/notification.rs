//! The notification side of reminders: the payload, the traits a host implements to show it, and
//! the console implementation used by the CLI.

use crate::error::Res;
use crate::reminder::DailySlot;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::info;

pub const REMINDER_TITLE: &str = "Budget Reminder";
pub const REMINDER_BODY: &str = "Time to log your transactions and check your bank account!";
pub const REMINDER_TAG: &str = "budget-reminder";
pub const REMINDER_ICON: &str = "icon-192.png";

/// A button offered on a notification.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

impl NotificationAction {
    pub fn new(action: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            title: title.into(),
        }
    }
}

/// Everything a host needs to display a system notification.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds: on, off, on, ...
    pub vibrate: Vec<u32>,
    /// Notifications sharing a tag replace each other.
    pub tag: String,
    /// Stay on screen until dismissed.
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    /// The daily "log your transactions" reminder.
    pub fn reminder() -> Self {
        Self {
            title: REMINDER_TITLE.to_string(),
            body: REMINDER_BODY.to_string(),
            icon: REMINDER_ICON.to_string(),
            badge: REMINDER_ICON.to_string(),
            vibrate: vec![200, 100, 200],
            tag: REMINDER_TAG.to_string(),
            require_interaction: true,
            actions: vec![
                NotificationAction::new("open", "Open App"),
                NotificationAction::new("dismiss", "Dismiss"),
            ],
        }
    }
}

/// The answer to a request for permission to show notifications.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Granted,
    Denied,
    /// The user dismissed the request without deciding.
    #[default]
    Default,
}

serde_plain::derive_display_from_serialize!(Permission);

/// Displays notifications. Delivery is best effort: errors are logged by the caller and dropped.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync + Debug {
    async fn notify(&self, notification: &Notification) -> Res<()>;
}

/// The environment's notification capability and the user's consent to use it.
#[async_trait::async_trait]
pub trait NotificationHost: Send + Sync + Debug {
    /// False if notifications cannot be shown at all.
    fn is_supported(&self) -> bool;

    /// Asks the user for permission. This may wait for a long time, or forever.
    async fn request_permission(&self) -> Permission;
}

/// Why reminders are not running.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledReason {
    Unsupported,
    PermissionDenied,
}

/// The outcome of starting the reminder scheduler.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Enabled { slots: Vec<DailySlot> },
    Disabled { reason: DisabledReason },
}

impl NotificationStatus {
    /// A one-line message, e.g. `Notifications enabled (2pm & 9pm daily)`.
    pub fn message(&self) -> String {
        match self {
            NotificationStatus::Enabled { slots } => {
                let times: Vec<String> = slots.iter().map(DailySlot::label).collect();
                format!("Notifications enabled ({} daily)", times.join(" & "))
            }
            NotificationStatus::Disabled { .. } => "Notifications disabled".to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, NotificationStatus::Enabled { .. })
    }
}

/// Receives the outcome of starting the scheduler.
pub trait StatusSink: Send + Sync + Debug {
    fn report(&self, status: &NotificationStatus);
}

/// Writes the status to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn report(&self, status: &NotificationStatus) {
        info!("{}", status.message());
    }
}

/// Shows reminders on the terminal. Permission comes from configuration instead of a prompt.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    enabled: bool,
}

impl ConsoleNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait::async_trait]
impl NotificationHost for ConsoleNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    async fn request_permission(&self) -> Permission {
        if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }
}

#[async_trait::async_trait]
impl NotificationSink for ConsoleNotifier {
    async fn notify(&self, notification: &Notification) -> Res<()> {
        let actions: Vec<String> = notification
            .actions
            .iter()
            .map(|a| format!("[{}]", a.title))
            .collect();
        println!(
            "\x07{}: {} {}",
            notification.title,
            notification.body,
            actions.join(" ")
        );
        info!("Showed notification '{}'", notification.tag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_payload() {
        let n = Notification::reminder();
        assert_eq!(n.title, "Budget Reminder");
        assert_eq!(n.vibrate, vec![200, 100, 200]);
        assert!(n.require_interaction);
        let titles: Vec<_> = n.actions.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Open App", "Dismiss"]);
    }

    #[test]
    fn test_status_messages() {
        let enabled = NotificationStatus::Enabled {
            slots: vec![
                DailySlot::new(14, 0).unwrap(),
                DailySlot::new(21, 0).unwrap(),
            ],
        };
        assert_eq!(enabled.message(), "Notifications enabled (2pm & 9pm daily)");
        let disabled = NotificationStatus::Disabled {
            reason: DisabledReason::PermissionDenied,
        };
        assert_eq!(disabled.message(), "Notifications disabled");
        assert!(!disabled.is_enabled());
    }

    #[tokio::test]
    async fn test_console_permission_follows_config() {
        assert_eq!(
            ConsoleNotifier::new(true).request_permission().await,
            Permission::Granted
        );
        assert_eq!(
            ConsoleNotifier::new(false).request_permission().await,
            Permission::Denied
        );
    }
}
