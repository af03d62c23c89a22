use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::ReadingStore;
use crate::error::Result;
use crate::reading::{ReadingDay, StreakState};
use crate::types::UserId;

/// Store backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    days: RwLock<BTreeMap<(UserId, NaiveDate), ReadingDay>>,
    streaks: RwLock<HashMap<UserId, StreakState>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a streak row directly.
    pub async fn seed_streak(&self, state: StreakState) {
        self.streaks.write().await.insert(state.user_id.clone(), state);
    }

    /// Number of stored reading days.
    pub async fn day_count(&self) -> usize {
        self.days.read().await.len()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn get_status(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<ReadingDay>> {
        Ok(self.days.read().await.get(&(user_id.clone(), date)).cloned())
    }

    async fn upsert_status(&self, day: &ReadingDay) -> Result<ReadingDay> {
        self.days
            .write()
            .await
            .insert((day.user_id.clone(), day.reading_date), day.clone());
        Ok(day.clone())
    }

    async fn list_status(
        &self,
        user_id: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReadingDay>> {
        if from > to {
            return Ok(Vec::new());
        }
        let days = self.days.read().await;
        Ok(days
            .range((user_id.clone(), from)..=(user_id.clone(), to))
            .map(|(_, day)| day.clone())
            .collect())
    }

    async fn get_streak(&self, user_id: &UserId) -> Result<Option<StreakState>> {
        Ok(self.streaks.read().await.get(user_id).cloned())
    }

    async fn put_streak(&self, state: &StreakState) -> Result<StreakState> {
        self.streaks
            .write()
            .await
            .insert(state.user_id.clone(), state.clone());
        Ok(state.clone())
    }
}
