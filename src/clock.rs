//! Civil reading-day calendar.
//!
//! A reading day is the calendar date in a fixed IANA timezone, not the UTC
//! date and not the host's local date. Conversion goes through `chrono-tz` so
//! daylight-saving transitions land on the right day.

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::constants::calendar::{DATE_FORMAT, DATE_LEN};
use crate::error::{Error, Result};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug, Default)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    /// Clock frozen at `instant`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { millis: AtomicI64::new(instant.timestamp_millis()) }
    }

    /// Move the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.millis.store(instant.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Maps instants onto civil reading days in one timezone.
#[derive(Clone)]
pub struct ReadingCalendar {
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ReadingCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadingCalendar").field("tz", &self.tz).finish_non_exhaustive()
    }
}

impl ReadingCalendar {
    /// Calendar in `tz` driven by `clock`.
    pub fn new(tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { tz, clock }
    }

    /// Calendar in `tz` driven by the system clock.
    pub fn system(tz: Tz) -> Self {
        Self::new(tz, Arc::new(SystemClock))
    }

    /// The configured timezone.
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// Today's reading day.
    pub fn today(&self) -> NaiveDate {
        self.civil_date(self.clock.now())
    }

    /// The reading day containing `instant`.
    pub fn civil_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }
}

/// The civil day before `date`.
pub fn yesterday(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN)
}

/// Whole civil days from `earlier` to `later` (negative if reversed).
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Parse a canonical `YYYY-MM-DD` reading day.
pub fn parse_reading_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    if input.len() != DATE_LEN {
        return Err(Error::validation(format!(
            "Reading date {input:?} must be formatted YYYY-MM-DD"
        )));
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|e| Error::validation(format!("Invalid reading date {input:?}: {e}")))
}

/// Format a reading day as `YYYY-MM-DD`.
pub fn format_reading_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
