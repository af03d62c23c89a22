//! Server-side reading status operations.
//!
//! Wraps a [`ReadingStore`] with validation, bounded retries and the streak
//! engine. The streak engine runs whenever the stored day is complete, so a
//! replay after a failed streak write picks the credit back up. The engine's
//! same-day rule keeps a replay from counting today twice.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::{format_reading_date, ReadingCalendar};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::reading::{
    record_completion, ReadingDay, SectionMap, StreakChange, StreakState, StreakView,
};
use crate::retry::RetryPolicy;
use crate::store::ReadingStore;
use crate::types::UserId;

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// The day as stored.
    pub day: ReadingDay,
    /// True if this write completed the day.
    pub newly_completed: bool,
    /// Streak after the write. `None` when the day is incomplete or a
    /// replay found nothing to change.
    pub streak: Option<StreakState>,
}

/// Reading status operations over a store.
#[derive(Clone)]
pub struct ReadingService {
    store: Arc<dyn ReadingStore>,
    calendar: ReadingCalendar,
    reads: RetryPolicy,
    writes: RetryPolicy,
}

impl std::fmt::Debug for ReadingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingService")
            .field("calendar", &self.calendar)
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

impl ReadingService {
    /// Service with default retry policies.
    pub fn new(store: Arc<dyn ReadingStore>, calendar: ReadingCalendar) -> Self {
        let defaults = Config::default();
        Self::with_policies(store, calendar, defaults.read_policy(), defaults.write_policy())
    }

    /// Service using the retry settings and timezone from `config`.
    pub fn from_config(store: Arc<dyn ReadingStore>, config: &Config) -> Self {
        Self::with_policies(
            store,
            ReadingCalendar::system(config.timezone),
            config.read_policy(),
            config.write_policy(),
        )
    }

    /// Service with explicit retry policies.
    pub fn with_policies(
        store: Arc<dyn ReadingStore>,
        calendar: ReadingCalendar,
        reads: RetryPolicy,
        writes: RetryPolicy,
    ) -> Self {
        Self { store, calendar, reads, writes }
    }

    /// Today's reading day.
    pub fn today(&self) -> NaiveDate {
        self.calendar.today()
    }

    /// The calendar this service uses.
    pub const fn calendar(&self) -> &ReadingCalendar {
        &self.calendar
    }

    /// Point lookup of one day.
    pub async fn get_status(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<ReadingDay>> {
        user_id.validate()?;
        self.reads
            .run("get_status", || self.store.get_status(user_id, date))
            .await
    }

    /// Today's day, or an empty one if nothing is stored yet.
    pub async fn today_status(&self, user_id: &UserId) -> Result<ReadingDay> {
        let today = self.today();
        Ok(self
            .get_status(user_id, today)
            .await?
            .unwrap_or_else(|| ReadingDay::new(user_id.clone(), today, SectionMap::new())))
    }

    /// Store the full section map for `date`, running the streak engine if the
    /// write completes the day.
    pub async fn upsert_status(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        sections: SectionMap,
    ) -> Result<StatusUpdate> {
        user_id.validate()?;
        let today = self.today();
        if date > today {
            return Err(Error::validation(format!(
                "Cannot record reading for future day {} (today is {})",
                format_reading_date(date),
                format_reading_date(today)
            )));
        }

        let was_complete = self
            .get_status(user_id, date)
            .await?
            .is_some_and(|d| d.completed());

        let day = ReadingDay::new(user_id.clone(), date, sections);
        let stored = self
            .writes
            .run("upsert_status", || self.store.upsert_status(&day))
            .await?;
        debug!(
            "Stored {} for {}: {}/{} sections",
            format_reading_date(date),
            user_id,
            stored.progress().0,
            stored.progress().1
        );

        let newly_completed = !was_complete && stored.completed();
        let streak = if stored.completed() {
            self.apply_completion(user_id, date, was_complete).await?
        } else {
            None
        };

        Ok(StatusUpdate { day: stored, newly_completed, streak })
    }

    /// Run the streak engine for a completed day.
    ///
    /// `replay` is set when the day was already complete before this write.
    /// A replay only writes if the streak does not count the day yet, and
    /// returns `None` when there was nothing to repair.
    async fn apply_completion(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        replay: bool,
    ) -> Result<Option<StreakState>> {
        let prior = self
            .reads
            .run("get_streak", || self.store.get_streak(user_id))
            .await?;
        let update = record_completion(prior.as_ref(), user_id, date);
        match update.change {
            StreakChange::AlreadyCounted => {
                debug!("Streak for {} already counts {}", user_id, format_reading_date(date));
                return Ok((!replay).then_some(update.state));
            }
            // No per-day marker for older days, so a replay cannot tell
            // whether the total already includes this one.
            StreakChange::Backfilled if replay => {
                debug!("Skipping backfill replay of {} for {}", format_reading_date(date), user_id);
                return Ok(None);
            }
            _ => {}
        }

        let state = update.state;
        let stored = self
            .writes
            .run("put_streak", || self.store.put_streak(&state))
            .await?;
        if replay {
            warn!("Recovered missing streak credit for {} on {}", user_id, format_reading_date(date));
        }
        info!(
            "Streak {:?} for {}: current={} total={}",
            update.change, user_id, stored.current_streak, stored.total_readings
        );
        Ok(Some(stored))
    }

    /// Stored streak plus the value to display today.
    pub async fn get_streak(&self, user_id: &UserId) -> Result<StreakView> {
        user_id.validate()?;
        let stored = self
            .reads
            .run("get_streak", || self.store.get_streak(user_id))
            .await?;
        Ok(StreakView::new(stored, self.today()))
    }

    /// Reading days in `from..=to`, oldest first.
    pub async fn history(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReadingDay>> {
        user_id.validate()?;
        if from > to {
            return Err(Error::validation(format!(
                "History range starts after it ends ({} > {})",
                format_reading_date(from),
                format_reading_date(to)
            )));
        }
        self.reads
            .run("list_status", || self.store.list_status(user_id, from, to))
            .await
    }
}
