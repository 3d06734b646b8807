use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Timelike};
use std::fmt::Debug;
use std::sync::Mutex;

/// Abstracts access to the wall clock so that ledger ids, date labels and reminder arming stay
/// deterministic in tests.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current local time.
    fn now(&self) -> DateTime<Local>;

    /// Returns the current local time without a zone, truncated to whole seconds.
    fn naive_now(&self) -> NaiveDateTime {
        truncate_to_seconds(self.now().naive_local())
    }
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that stays where it is put. Useful for tests and for replaying data.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    /// Creates a clock frozen at the local time `naive`.
    pub fn new(naive: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(to_local(naive)),
        }
    }

    /// Moves the clock to the local time `naive`.
    pub fn set(&self, naive: NaiveDateTime) {
        if let Ok(mut now) = self.now.lock() {
            *now = to_local(naive);
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        if let Ok(mut now) = self.now.lock() {
            *now += delta;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Interprets `naive` as local time. Times that fall in a DST gap are read as UTC instead.
fn to_local(naive: NaiveDateTime) -> DateTime<Local> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| naive.and_utc().with_timezone(&Local))
}

pub(crate) fn truncate_to_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}
