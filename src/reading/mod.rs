//! Reading progress data model.
//!
//! Section completion per civil day, and the streak derived from fully
//! completed days.

/// Per-day section completion
pub mod day;
/// Streak state machine and lazy-decay display
pub mod streak;

pub use day::{ReadingDay, SectionMap};
pub use streak::{
    displayed_streak, record_completion, StreakChange, StreakState, StreakUpdate, StreakView,
};
