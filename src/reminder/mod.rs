//! Daily reminders to log transactions.
//!
//! Each configured `DailySlot` gets its own task. The task waits until the real instant of the
//! next occurrence of its time of day in the local zone, fires, and from then on fires every 24
//! hours. The first wait accounts for a DST change on the day it is armed. After that the task
//! does not re-align with the wall clock, so a later DST change or a suspended machine shifts the
//! remaining firings.
//!
//! Starting the scheduler first asks the `NotificationHost` for permission. That request runs
//! inside the spawned supervisor task, so a user who never answers holds up nothing else.

pub mod notification;

pub use notification::{
    ConsoleNotifier, DisabledReason, LogStatus, Notification, NotificationAction,
    NotificationHost, NotificationSink, NotificationStatus, Permission, StatusSink,
};

use crate::clock::Clock;
use crate::error::Res;
use anyhow::ensure;
use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// How often a slot fires once it has fired the first time.
pub const REMINDER_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// The slots used when nothing else is configured: 2pm and 9pm.
pub const DEFAULT_SLOTS: [(u32, u32); 2] = [(14, 0), (21, 0)];

/// A local time of day at which a reminder fires.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSlot")]
pub struct DailySlot {
    hour: u32,
    minute: u32,
}

#[derive(Deserialize)]
struct RawSlot {
    hour: u32,
    #[serde(default)]
    minute: u32,
}

impl TryFrom<RawSlot> for DailySlot {
    type Error = String;

    fn try_from(raw: RawSlot) -> Result<Self, Self::Error> {
        DailySlot::new(raw.hour, raw.minute).map_err(|e| e.to_string())
    }
}

impl DailySlot {
    /// # Errors
    /// - Returns an error unless `hour` is 0-23 and `minute` is 0-59.
    pub fn new(hour: u32, minute: u32) -> Res<Self> {
        ensure!(hour < 24, "Reminder hour must be 0-23, got {hour}");
        ensure!(minute < 60, "Reminder minute must be 0-59, got {minute}");
        Ok(Self { hour, minute })
    }

    /// The default 2pm and 9pm slots.
    pub fn defaults() -> Vec<Self> {
        DEFAULT_SLOTS
            .iter()
            .map(|&(hour, minute)| Self { hour, minute })
            .collect()
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// A short label such as `2pm`, `9:30pm` or `12am`.
    pub fn label(&self) -> String {
        let suffix = if self.hour < 12 { "am" } else { "pm" };
        let hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        if self.minute == 0 {
            format!("{hour}{suffix}")
        } else {
            format!("{hour}:{:02}{suffix}", self.minute)
        }
    }
}

impl Display for DailySlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// The next time `slot` occurs strictly after `now`: today at the slot's time, or tomorrow if that
/// has already passed (or is exactly now).
pub fn next_fire(now: NaiveDateTime, slot: DailySlot) -> NaiveDateTime {
    let today = now.date().and_time(slot.time());
    if today <= now {
        today + TimeDelta::days(1)
    } else {
        today
    }
}

/// How long to wait, in real time, from `now` until `slot` next occurs in `now`'s zone.
///
/// The slot is resolved to an instant before subtracting, so a wait that spans a DST change is
/// shorter or longer than the wall-clock difference. A slot that falls in a spring-forward gap is
/// moved one hour later. An ambiguous slot resolves to its earlier instant.
pub fn until_next_fire<Tz: TimeZone>(now: &DateTime<Tz>, slot: DailySlot) -> Duration {
    let next = next_fire(now.naive_local(), slot);
    let later = next + TimeDelta::hours(1);
    let zone = now.timezone();
    let instant = zone
        .from_local_datetime(&next)
        .earliest()
        .or_else(|| zone.from_local_datetime(&later).earliest());
    let wait = match instant {
        Some(instant) => instant.signed_duration_since(now.clone()),
        None => next - now.naive_local(),
    };
    wait.to_std().unwrap_or_default()
}

/// Starts reminder tasks once permission has been granted.
#[derive(Debug)]
pub struct ReminderScheduler {
    slots: Vec<DailySlot>,
    host: Arc<dyn NotificationHost>,
    sink: Option<Arc<dyn NotificationSink>>,
    status: Arc<dyn StatusSink>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    /// Creates a scheduler with no notification sink and status reported to the log.
    pub fn new(
        slots: Vec<DailySlot>,
        host: Arc<dyn NotificationHost>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            slots,
            host,
            sink: None,
            status: Arc::new(LogStatus),
            clock,
        }
    }

    /// Registers where fired reminders are shown. Without a sink the tasks still run, but fired
    /// reminders are dropped.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Registers where the enabled/disabled outcome is reported.
    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Spawns the scheduler onto the current tokio runtime and returns immediately.
    pub fn spawn(self) -> ReminderHandle {
        ReminderHandle {
            task: tokio::spawn(self.run()),
        }
    }

    async fn run(self) {
        if !self.host.is_supported() {
            warn!("Notifications are not supported here, reminders are off");
            self.status.report(&NotificationStatus::Disabled {
                reason: DisabledReason::Unsupported,
            });
            return;
        }

        let permission = self.host.request_permission().await;
        if permission != Permission::Granted {
            info!("Notification permission is '{permission}', reminders are off");
            self.status.report(&NotificationStatus::Disabled {
                reason: DisabledReason::PermissionDenied,
            });
            return;
        }

        self.status.report(&NotificationStatus::Enabled {
            slots: self.slots.clone(),
        });

        // Dropping the JoinSet aborts every slot task, which is how `ReminderHandle::cancel`
        // reaches them.
        let mut tasks = JoinSet::new();
        for slot in &self.slots {
            let task = ReminderTask {
                slot: *slot,
                sink: self.sink.clone(),
                clock: self.clock.clone(),
            };
            tasks.spawn(task.run());
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    error!("A reminder task panicked: {e}");
                }
            }
        }
    }
}

/// A handle to a running scheduler.
#[derive(Debug)]
pub struct ReminderHandle {
    task: JoinHandle<()>,
}

impl ReminderHandle {
    /// Stops the scheduler and every armed reminder. Dropping the handle does not stop anything.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// True once the scheduler has stopped, either because reminders are off or it was cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the scheduler to stop. With reminders running this only returns after `cancel`.
    /// Do not call it again once it has returned.
    pub async fn join(&mut self) {
        if let Err(e) = (&mut self.task).await {
            if e.is_panic() {
                error!("The reminder scheduler panicked: {e}");
            }
        }
    }
}

/// One slot's arm-once, then every-24-hours loop.
#[derive(Debug)]
struct ReminderTask {
    slot: DailySlot,
    sink: Option<Arc<dyn NotificationSink>>,
    clock: Arc<dyn Clock>,
}

impl ReminderTask {
    async fn run(self) {
        let now = self.clock.now();
        let wait = until_next_fire(&now, self.slot);
        debug!(
            "Reminder {} armed for {}, {}s from now",
            self.slot,
            next_fire(now.naive_local(), self.slot),
            wait.as_secs()
        );

        tokio::time::sleep(wait).await;
        self.fire().await;

        let mut every_day =
            tokio::time::interval_at(Instant::now() + REMINDER_PERIOD, REMINDER_PERIOD);
        every_day.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            every_day.tick().await;
            self.fire().await;
        }
    }

    async fn fire(&self) {
        let Some(sink) = &self.sink else {
            debug!("Reminder {} fired with no notification sink registered", self.slot);
            return;
        };
        debug!("Reminder {} fired", self.slot);
        if let Err(e) = sink.notify(&Notification::reminder()).await {
            warn!("Unable to show the {} reminder: {e:#}", self.slot);
        }
    }
}
