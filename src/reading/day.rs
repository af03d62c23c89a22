//! Per-user, per-day section completion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{Section, UserId};

/// Completion flag for every reading section.
///
/// Always carries all five sections; writes send this whole map, never a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Section, bool>", into = "BTreeMap<Section, bool>")]
pub struct SectionMap {
    sections: BTreeMap<Section, bool>,
}

impl Default for SectionMap {
    fn default() -> Self {
        Self {
            sections: Section::all().iter().map(|s| (*s, false)).collect(),
        }
    }
}

impl From<BTreeMap<Section, bool>> for SectionMap {
    fn from(entries: BTreeMap<Section, bool>) -> Self {
        let mut map = Self::default();
        map.sections.extend(entries);
        map
    }
}

impl From<SectionMap> for BTreeMap<Section, bool> {
    fn from(map: SectionMap) -> Self {
        map.sections
    }
}

impl SectionMap {
    /// Map with every section incomplete.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map with every section complete.
    pub fn all_complete() -> Self {
        Self {
            sections: Section::all().iter().map(|s| (*s, true)).collect(),
        }
    }

    /// Build from raw `(key, done)` pairs, rejecting unknown keys.
    pub fn from_keys<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut map = Self::default();
        for (key, done) in pairs {
            map.set(Section::parse(key)?, done);
        }
        Ok(map)
    }

    /// Whether `section` is complete.
    pub fn is_complete(&self, section: Section) -> bool {
        self.sections.get(&section).copied().unwrap_or(false)
    }

    /// Set one section's flag.
    pub fn set(&mut self, section: Section, done: bool) {
        self.sections.insert(section, done);
    }

    /// Copy of this map with `section` marked complete.
    #[must_use]
    pub fn with_completed(&self, section: Section) -> Self {
        let mut next = self.clone();
        next.set(section, true);
        next
    }

    /// True iff all five sections are complete.
    pub fn all_done(&self) -> bool {
        Section::all().iter().all(|s| self.is_complete(*s))
    }

    /// Number of completed sections.
    pub fn completed_count(&self) -> usize {
        Section::all().iter().filter(|s| self.is_complete(**s)).count()
    }

    /// Sections not yet complete, in display order.
    pub fn remaining(&self) -> Vec<Section> {
        Section::all().iter().copied().filter(|s| !self.is_complete(*s)).collect()
    }

    /// Iterate `(section, done)` in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, bool)> + '_ {
        Section::all().iter().map(|s| (*s, self.is_complete(*s)))
    }
}

/// One user's reading progress for one civil day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingDay {
    /// Owner of the row.
    pub user_id: UserId,
    /// Civil reading day.
    pub reading_date: NaiveDate,
    /// Per-section completion.
    pub sections_completed: SectionMap,
    completed: bool,
}

impl ReadingDay {
    /// Build a day; `completed` is derived from `sections`.
    pub fn new(user_id: UserId, reading_date: NaiveDate, sections: SectionMap) -> Self {
        let completed = sections.all_done();
        Self {
            user_id,
            reading_date,
            sections_completed: sections,
            completed,
        }
    }

    /// True iff every section is complete.
    pub const fn completed(&self) -> bool {
        self.completed
    }

    /// `(done, total)` section counts.
    pub fn progress(&self) -> (usize, usize) {
        (self.sections_completed.completed_count(), Section::all().len())
    }
}
