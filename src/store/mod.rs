//! Persistence collaborator.
//!
//! Point lookups and upserts keyed by `(user_id, reading_date)` for reading
//! days and by `user_id` for streaks. Implementations store what they are
//! given; deriving `completed` and running the streak engine happen above
//! this layer.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::reading::{ReadingDay, StreakState};
use crate::types::UserId;

/// In-process store for tests and offline use
pub mod memory;
/// Supabase PostgREST store
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// Storage for reading days and streak rows.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Look up one user's day.
    async fn get_status(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<ReadingDay>>;

    /// Insert or replace the row for `(day.user_id, day.reading_date)`.
    async fn upsert_status(&self, day: &ReadingDay) -> Result<ReadingDay>;

    /// Days in `from..=to`, oldest first.
    async fn list_status(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReadingDay>>;

    /// Look up a user's streak row.
    async fn get_streak(&self, user_id: &UserId) -> Result<Option<StreakState>>;

    /// Insert or replace a user's streak row.
    async fn put_streak(&self, state: &StreakState) -> Result<StreakState>;
}
