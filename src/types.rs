//! Core type definitions for compile-time safety.
//!
//! Newtype wrappers for identifiers supplied by the auth collaborator, and the
//! fixed set of daily reading sections.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// One of the five daily reading components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    /// Daily devotional.
    Devotional,
    /// Old Testament passage.
    OldTestament,
    /// New Testament passage.
    NewTestament,
    /// Psalm of the day.
    Psalms,
    /// Proverb of the day.
    Proverbs,
}

impl Section {
    /// Returns all sections in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Devotional,
            Self::OldTestament,
            Self::NewTestament,
            Self::Psalms,
            Self::Proverbs,
        ]
    }

    /// Storage key (`old-testament`, ...).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Devotional => "devotional",
            Self::OldTestament => "old-testament",
            Self::NewTestament => "new-testament",
            Self::Psalms => "psalms",
            Self::Proverbs => "proverbs",
        }
    }

    /// Returns the human-readable name of this section.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Devotional => "Devotional",
            Self::OldTestament => "Old Testament",
            Self::NewTestament => "New Testament",
            Self::Psalms => "Psalms",
            Self::Proverbs => "Proverbs",
        }
    }

    /// Parse a storage key. Unknown keys are a validation error.
    pub fn parse(key: &str) -> Result<Self> {
        let key = key.trim();
        Self::all()
            .iter()
            .copied()
            .find(|s| s.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| Error::validation(format!("Unknown reading section {key:?}")))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Opaque user identifier issued by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new `UserId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject blank identifiers before they reach storage.
    pub fn validate(&self) -> Result<()> {
        if self.0.trim().is_empty() {
            return Err(Error::validation("User id must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
