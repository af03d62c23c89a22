//! Session-local section state.
//!
//! Mirrors the server's section map for one reading day, plus the
//! optimistic `Saving` marker shown while a write is in flight.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::reading::{ReadingDay, SectionMap, StreakView};
use crate::types::Section;

/// UI state of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionState {
    /// Not read yet.
    #[default]
    Incomplete,
    /// Optimistically marked; waiting for the server.
    Saving,
    /// Confirmed by the server.
    Complete,
}

/// Everything the session knows about the current day.
#[derive(Debug, Clone)]
pub struct SessionState {
    date: NaiveDate,
    sections: BTreeMap<Section, SectionState>,
    saving: bool,
    write_generation: u64,
    streak: Option<StreakView>,
}

impl SessionState {
    /// Blank state for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sections: Section::all().iter().map(|s| (*s, SectionState::default())).collect(),
            saving: false,
            write_generation: 0,
            streak: None,
        }
    }

    /// Day this state mirrors.
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// State of one section.
    pub fn get(&self, section: Section) -> SectionState {
        self.sections.get(&section).copied().unwrap_or_default()
    }

    /// Whether a save is in flight.
    pub const fn is_saving(&self) -> bool {
        self.saving
    }

    /// Bumped every time a write starts.
    pub const fn write_generation(&self) -> u64 {
        self.write_generation
    }

    /// Last known streak view.
    pub const fn streak(&self) -> Option<&StreakView> {
        self.streak.as_ref()
    }

    /// Replace the cached streak view.
    pub fn set_streak(&mut self, view: StreakView) {
        self.streak = Some(view);
    }

    /// Claim the save slot and mark `pending` as saving. Returns the full map
    /// to send, or `None` if a save already holds the slot.
    pub fn begin_save(&mut self, pending: &[Section]) -> Option<SectionMap> {
        if self.saving {
            return None;
        }
        self.saving = true;
        self.write_generation += 1;
        for section in pending {
            self.sections.insert(*section, SectionState::Saving);
        }
        Some(self.desired_map())
    }

    /// Adopt the server's map after a successful save.
    pub fn commit(&mut self, day: &ReadingDay) {
        self.saving = false;
        self.apply_server_day(day);
    }

    /// Undo the optimistic marks for `pending` after a failed save.
    pub fn rollback(&mut self, pending: &[Section]) {
        self.saving = false;
        for section in pending {
            if self.get(*section) == SectionState::Saving {
                self.sections.insert(*section, SectionState::Incomplete);
            }
        }
    }

    /// Overwrite every section from the server of record.
    pub fn apply_server_day(&mut self, day: &ReadingDay) {
        self.date = day.reading_date;
        for (section, done) in day.sections_completed.iter() {
            let state = if done { SectionState::Complete } else { SectionState::Incomplete };
            self.sections.insert(section, state);
        }
    }

    /// Full map to send: confirmed and saving sections count as done.
    pub fn desired_map(&self) -> SectionMap {
        let mut map = SectionMap::new();
        for (section, state) in &self.sections {
            map.set(*section, *state != SectionState::Incomplete);
        }
        map
    }

    /// Sections not confirmed or saving.
    pub fn incomplete(&self) -> Vec<Section> {
        Section::all()
            .iter()
            .copied()
            .filter(|s| self.get(*s) == SectionState::Incomplete)
            .collect()
    }

    /// Every section is confirmed but the cached streak does not count this
    /// day. Happens when the day write landed and the streak write did not.
    pub fn streak_missing_day(&self) -> bool {
        self.sections.values().all(|s| *s == SectionState::Complete)
            && self
                .streak
                .as_ref()
                .is_some_and(|view| view.stored.as_ref().map(|s| s.last_reading_date) != Some(self.date))
    }

    /// Read-only copy for the UI.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            date: self.date,
            sections: self.sections.clone(),
            saving: self.saving,
            streak: self.streak.clone(),
        }
    }
}

/// What the UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Day shown.
    pub date: NaiveDate,
    /// Per-section UI state.
    pub sections: BTreeMap<Section, SectionState>,
    /// A save is in flight.
    pub saving: bool,
    /// Last known streak.
    pub streak: Option<StreakView>,
}

impl SessionSnapshot {
    /// State of one section.
    pub fn get(&self, section: Section) -> SectionState {
        self.sections.get(&section).copied().unwrap_or_default()
    }

    /// Number of confirmed sections.
    pub fn completed_count(&self) -> usize {
        self.sections.values().filter(|s| **s == SectionState::Complete).count()
    }

    /// All sections confirmed complete.
    pub fn all_complete(&self) -> bool {
        self.completed_count() == Section::all().len()
    }
}
