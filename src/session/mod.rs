//! Client-side reconciliation of today's reading progress.
//!
//! A [`ReadingSession`] lives from sign-in to sign-out and owns the local
//! mirror of today's sections. At most one save is in flight at a time; a
//! reload that started before a write never overwrites that write's result.

/// Section state and the save slot
pub mod state;

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::format_reading_date;
use crate::error::{Error, Result};
use crate::reading::{ReadingDay, SectionMap, StreakView};
use crate::service::ReadingService;
use crate::types::{Section, UserId};

pub use state::{SectionState, SessionSnapshot, SessionState};

/// Why a mark request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The section (or every section) is already complete.
    AlreadyComplete,
    /// Another save holds the slot; it carries the same intent.
    SaveInFlight,
}

impl Notice {
    /// Text shown to the user.
    pub const fn message(self) -> &'static str {
        match self {
            Self::AlreadyComplete => "Already marked as read",
            Self::SaveInFlight => "Still saving, hang on a moment",
        }
    }
}

/// Confirmed result of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// Day as stored by the server.
    pub day: ReadingDay,
    /// Every section is now complete.
    pub day_completed: bool,
    /// This save is the one that completed the day.
    pub newly_completed: bool,
    /// Updated streak, when the save completed the day or repaired its credit.
    pub streak: Option<StreakView>,
}

/// Outcome of a mark request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The server confirmed the write.
    Saved(SaveReceipt),
    /// Nothing was sent.
    Ignored(Notice),
}

/// Outcome of a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Local state now matches the server.
    Applied,
    /// A save was in flight when the reload was requested; nothing fetched.
    Deferred,
    /// A write started while the fetch was in flight; the fetched data was dropped.
    Discarded,
}

/// One signed-in user's reading session.
#[derive(Debug)]
pub struct ReadingSession {
    user_id: UserId,
    service: Arc<ReadingService>,
    state: Mutex<SessionState>,
}

impl ReadingSession {
    /// Start a session and load today's status from the server.
    pub async fn sign_in(service: Arc<ReadingService>, user_id: UserId) -> Result<Self> {
        user_id.validate()?;
        let today = service.today();
        let session = Self {
            user_id,
            service,
            state: Mutex::new(SessionState::new(today)),
        };
        session.reload().await?;
        info!("Reading session started for {} on {}", session.user_id, format_reading_date(today));
        Ok(session)
    }

    /// End the session, dropping all local state.
    pub fn sign_out(self) -> UserId {
        info!("Reading session ended for {}", self.user_id);
        self.user_id
    }

    /// The signed-in user.
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Mark one section read.
    pub async fn mark_section_complete(&self, section: Section) -> Result<MarkOutcome> {
        self.save(Some(section)).await
    }

    /// Leaving a section's detail view marks it read.
    pub async fn close_section(&self, section: Section) -> Result<MarkOutcome> {
        debug!("Closing {} for {}", section, self.user_id);
        self.save(Some(section)).await
    }

    /// Mark every remaining section read in a single write.
    pub async fn mark_all_complete(&self) -> Result<MarkOutcome> {
        self.save(None).await
    }

    /// Local view of today's sections.
    pub async fn get_status(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Fetch the streak as it should be displayed today.
    pub async fn get_streak(&self) -> Result<StreakView> {
        let generation = self.state.lock().await.write_generation();
        let view = self.service.get_streak(&self.user_id).await?;

        let mut state = self.state.lock().await;
        if !state.is_saving() && state.write_generation() == generation {
            state.set_streak(view.clone());
        }
        Ok(view)
    }

    /// Re-fetch today from the server of record (screen re-entry).
    pub async fn reload(&self) -> Result<ReloadOutcome> {
        let generation = {
            let state = self.state.lock().await;
            if state.is_saving() {
                debug!("Reload deferred for {}: save in flight", self.user_id);
                return Ok(ReloadOutcome::Deferred);
            }
            state.write_generation()
        };

        let (day, streak) = futures::try_join!(
            self.service.today_status(&self.user_id),
            self.service.get_streak(&self.user_id),
        )?;

        let mut state = self.state.lock().await;
        if state.is_saving() || state.write_generation() != generation {
            debug!("Discarding stale reload for {}", self.user_id);
            return Ok(ReloadOutcome::Discarded);
        }
        state.apply_server_day(&day);
        state.set_streak(streak);
        Ok(ReloadOutcome::Applied)
    }

    async fn save(&self, requested: Option<Section>) -> Result<MarkOutcome> {
        let today = self.service.today();
        let rolled_over = self.state.lock().await.date() != today;
        if rolled_over {
            // Past midnight: start from the server's view of the new day.
            self.reload().await?;
        }

        let claimed = {
            let mut state = self.state.lock().await;
            if state.date() != today {
                // The reload was deferred or discarded; never write the old day.
                debug!("Ignoring mark for {}: still on {}", self.user_id, format_reading_date(state.date()));
                return Ok(MarkOutcome::Ignored(Notice::SaveInFlight));
            }
            match Self::claim(&mut state, requested) {
                Ok(claimed) => claimed,
                Err(e) if e.is_guard_rejection() => {
                    debug!("Ignoring mark for {}: {}", self.user_id, e);
                    return Ok(MarkOutcome::Ignored(Notice::SaveInFlight));
                }
                Err(e) => return Err(e),
            }
        };
        let Some((date, pending, map)) = claimed else {
            return Ok(MarkOutcome::Ignored(Notice::AlreadyComplete));
        };

        let result = self.service.upsert_status(&self.user_id, date, map).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(update) => {
                state.commit(&update.day);
                let streak = update
                    .streak
                    .map(|s| StreakView::new(Some(s), self.service.today()));
                if let Some(view) = &streak {
                    state.set_streak(view.clone());
                }
                let day_completed = update.day.completed();
                if update.newly_completed {
                    info!("{} completed {}", self.user_id, format_reading_date(date));
                }
                Ok(MarkOutcome::Saved(SaveReceipt {
                    day: update.day,
                    day_completed,
                    newly_completed: update.newly_completed,
                    streak,
                }))
            }
            Err(e) => {
                warn!("Save failed for {}, rolling back {:?}: {}", self.user_id, pending, e);
                state.rollback(&pending);
                drop(state);
                // The day row may have been written before the failure.
                if let Err(reload_err) = self.reload().await {
                    warn!("Reload after failed save for {} also failed: {}", self.user_id, reload_err);
                }
                Err(e)
            }
        }
    }

    /// Pick the sections to save and take the save slot. `Ok(None)` means
    /// there is nothing left to mark. Mark-all on a finished day whose streak
    /// credit is missing resends the full map so the server can repair it.
    #[allow(clippy::type_complexity)]
    fn claim(
        state: &mut SessionState,
        requested: Option<Section>,
    ) -> Result<Option<(chrono::NaiveDate, Vec<Section>, SectionMap)>> {
        let pending = match requested {
            Some(section) => match state.get(section) {
                SectionState::Complete => return Ok(None),
                SectionState::Saving => return Err(Error::ConcurrencyGuard),
                SectionState::Incomplete => vec![section],
            },
            None => state.incomplete(),
        };
        if state.is_saving() {
            return Err(Error::ConcurrencyGuard);
        }
        if pending.is_empty() && !(requested.is_none() && state.streak_missing_day()) {
            return Ok(None);
        }
        let map = state.begin_save(&pending).ok_or(Error::ConcurrencyGuard)?;
        Ok(Some((state.date(), pending, map)))
    }
}
