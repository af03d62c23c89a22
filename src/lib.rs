//! `daily-reading` - daily Bible reading completion and streak tracking.
//!
//! Five reading sections make up a civil day; completing all of them extends
//! a streak. The crate covers the civil-day calendar, the persistence seam
//! (in-memory and Supabase), the streak engine and the client session that
//! reconciles optimistic UI state with the server.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod reading;
pub mod retry;
pub mod service;
pub mod session;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use reading::{ReadingDay, SectionMap, StreakState, StreakView};
pub use service::{ReadingService, StatusUpdate};
pub use session::{MarkOutcome, Notice, ReadingSession, ReloadOutcome};
pub use types::{Section, UserId};
