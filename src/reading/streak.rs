//! Streak computation.
//!
//! The stored streak only changes when a day transitions to fully completed.
//! Display goes through [`displayed_streak`], which decays lazily: a lapsed
//! streak reads as zero while the stored row keeps its old value until the
//! next completion overwrites it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::{days_between, yesterday};
use crate::types::UserId;

/// Streak counters for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Owner of the row.
    pub user_id: UserId,
    /// Consecutive completed days ending at `last_reading_date`.
    pub current_streak: u32,
    /// Lifetime count of fully completed days.
    pub total_readings: u32,
    /// Most recent fully completed day.
    pub last_reading_date: NaiveDate,
}

/// What a completion did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// First ever completed day.
    Started,
    /// Completed the day after the last one.
    Extended,
    /// Completed after a gap; streak starts over at one.
    Restarted,
    /// This day was already counted.
    AlreadyCounted,
    /// Completed a day older than the last counted one.
    ///
    /// Unlike a gap after the last reading, this does not restart the streak
    /// at 1 and does not move `last_reading_date` back to the older day.
    /// Only `total_readings` goes up.
    Backfilled,
}

impl StreakChange {
    /// Whether the new state differs from the prior one and must be written.
    pub const fn needs_write(self) -> bool {
        !matches!(self, Self::AlreadyCounted)
    }
}

/// Result of applying one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    /// Classification of the transition.
    pub change: StreakChange,
    /// State after the completion.
    pub state: StreakState,
}

/// Apply "`completed_on` just became fully completed" to `prior`.
pub fn record_completion(
    prior: Option<&StreakState>,
    user_id: &UserId,
    completed_on: NaiveDate,
) -> StreakUpdate {
    let Some(prior) = prior else {
        return StreakUpdate {
            change: StreakChange::Started,
            state: StreakState {
                user_id: user_id.clone(),
                current_streak: 1,
                total_readings: 1,
                last_reading_date: completed_on,
            },
        };
    };

    let mut state = prior.clone();
    if prior.last_reading_date == completed_on {
        return StreakUpdate { change: StreakChange::AlreadyCounted, state };
    }

    let change = if prior.last_reading_date > completed_on {
        // Late completion of an older day counts toward the total only.
        StreakChange::Backfilled
    } else if prior.last_reading_date == yesterday(completed_on) {
        state.current_streak = state.current_streak.saturating_add(1);
        state.last_reading_date = completed_on;
        StreakChange::Extended
    } else {
        state.current_streak = 1;
        state.last_reading_date = completed_on;
        StreakChange::Restarted
    };
    state.total_readings = state.total_readings.saturating_add(1);

    StreakUpdate { change, state }
}

/// Streak to show on `today` without touching stored state.
pub fn displayed_streak(state: Option<&StreakState>, today: NaiveDate) -> u32 {
    match state {
        Some(s) if days_between(s.last_reading_date, today) <= 1 => s.current_streak,
        _ => 0,
    }
}

/// Stored and displayed streak side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakView {
    /// Row as persisted, if any.
    pub stored: Option<StreakState>,
    /// Value to render today.
    pub displayed: u32,
    /// Lifetime total (never decays).
    pub total_readings: u32,
}

impl StreakView {
    /// View of `stored` as seen on `today`.
    pub fn new(stored: Option<StreakState>, today: NaiveDate) -> Self {
        let displayed = displayed_streak(stored.as_ref(), today);
        let total_readings = stored.as_ref().map_or(0, |s| s.total_readings);
        Self { stored, displayed, total_readings }
    }

    /// True when the display has decayed but the row still holds the old streak.
    pub fn is_lapsed(&self) -> bool {
        self.stored.as_ref().is_some_and(|s| s.current_streak != self.displayed)
    }
}
