//! Clock abstraction and timestamp helpers

use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

use crate::error::{AppError, AppResult};

/// Source of "now" for every time-dependent operation
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a settable instant
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Combine the calendar day of `day` (as seen in its own timezone) with an
/// `hh:mm` time of day in that timezone.
pub fn make_dt<Tz: TimeZone>(day: &DateTime<Tz>, timestr: &str) -> AppResult<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(timestr, "%H:%M")
        .ok()
        .filter(|_| timestr.len() == 5)
        .ok_or_else(|| AppError::Validation(format!("must use hh:mm time format: {}", timestr)))?;
    let local = day.date_naive().and_time(time);
    day.timezone()
        .from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::Validation(format!("{} does not exist on {}", timestr, local.date())))
}

/// Format a timestamp for display, `YYYY-MM-DD HH:MM` or parts of it
pub fn dtstring<Tz: TimeZone>(dt: &DateTime<Tz>, date: bool, time: bool) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let format = match (date, time) {
        (true, true) => "%Y-%m-%d %H:%M",
        (true, false) => "%Y-%m-%d",
        (false, true) => "%H:%M",
        (false, false) => "",
    };
    dt.format(format).to_string()
}
