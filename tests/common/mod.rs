//! Shared test fixtures.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

use daily_reading::clock::{parse_reading_date, FixedClock, ReadingCalendar};
use daily_reading::retry::RetryPolicy;
use daily_reading::store::{MemoryStore, ReadingStore};
use daily_reading::{Error, ReadingDay, ReadingService, Result, StreakState, UserId};

pub fn date(s: &str) -> NaiveDate {
    parse_reading_date(s).unwrap()
}

/// Clock set to midday in New York on `day`.
pub fn clock_on(day: &str) -> Arc<FixedClock> {
    let d = date(day);
    Arc::new(FixedClock::new(
        Utc.from_utc_datetime(&d.and_hms_opt(17, 0, 0).unwrap()),
    ))
}

pub fn set_day(clock: &FixedClock, day: &str) {
    let d = date(day);
    clock.set(Utc.from_utc_datetime(&d.and_hms_opt(17, 0, 0).unwrap()));
}

/// Service over `store` with instant retries.
pub fn service(store: Arc<dyn ReadingStore>, clock: Arc<FixedClock>) -> ReadingService {
    let calendar = ReadingCalendar::new(chrono_tz::America::New_York, clock);
    let instant = |n| RetryPolicy::new(n).with_backoff(Duration::ZERO, Duration::ZERO);
    ReadingService::with_policies(store, calendar, instant(3), instant(2))
}

/// Memory store that counts calls and can hold or fail them.
pub struct FaultStore {
    pub inner: MemoryStore,
    upserts: AtomicU32,
    reads: AtomicU32,
    fail_writes: AtomicU32,
    fail_reads: AtomicU32,
    fail_streak_reads: AtomicU32,
    fail_streak_writes: AtomicU32,
    streak_writes: AtomicU32,
    hold_writes: AtomicBool,
    hold_next_read: AtomicBool,
    gate: Semaphore,
    entered: Notify,
}

impl FaultStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            upserts: AtomicU32::new(0),
            reads: AtomicU32::new(0),
            fail_writes: AtomicU32::new(0),
            fail_reads: AtomicU32::new(0),
            fail_streak_reads: AtomicU32::new(0),
            fail_streak_writes: AtomicU32::new(0),
            streak_writes: AtomicU32::new(0),
            hold_writes: AtomicBool::new(false),
            hold_next_read: AtomicBool::new(false),
            gate: Semaphore::new(0),
            entered: Notify::new(),
        }
    }

    pub fn upserts(&self) -> u32 {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Fail the next `n` status upserts with a transient error.
    pub fn fail_writes(&self, n: u32) {
        self.fail_writes.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` status reads with a transient error.
    pub fn fail_reads(&self, n: u32) {
        self.fail_reads.store(n, Ordering::SeqCst);
    }

    pub fn streak_writes(&self) -> u32 {
        self.streak_writes.load(Ordering::SeqCst)
    }

    /// Fail the next `n` streak lookups with a transient error.
    pub fn fail_streak_reads(&self, n: u32) {
        self.fail_streak_reads.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` streak writes with a transient error.
    pub fn fail_streak_writes(&self, n: u32) {
        self.fail_streak_writes.store(n, Ordering::SeqCst);
    }

    /// Block every status upsert until `release` is called.
    pub fn hold_writes(&self) {
        self.hold_writes.store(true, Ordering::SeqCst);
    }

    /// Block only the next status read until `release` is called.
    pub fn hold_next_read(&self) {
        self.hold_next_read.store(true, Ordering::SeqCst);
    }

    /// Wait until a held call has reached the store.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.hold_writes.store(false, Ordering::SeqCst);
        self.gate.add_permits(1);
    }

    async fn hold(&self) {
        self.entered.notify_one();
        self.gate.acquire().await.unwrap().forget();
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ReadingStore for FaultStore {
    async fn get_status(&self, user_id: &UserId, date: NaiveDate) -> Result<Option<ReadingDay>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.hold_next_read.swap(false, Ordering::SeqCst) {
            self.hold().await;
        }
        if Self::take_failure(&self.fail_reads) {
            return Err(Error::unavailable("read timed out"));
        }
        self.inner.get_status(user_id, date).await
    }

    async fn upsert_status(&self, day: &ReadingDay) -> Result<ReadingDay> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.hold_writes.load(Ordering::SeqCst) {
            self.hold().await;
        }
        if Self::take_failure(&self.fail_writes) {
            return Err(Error::unavailable("connection reset"));
        }
        self.inner.upsert_status(day).await
    }

    async fn list_status(&self, user_id: &UserId, from: NaiveDate, to: NaiveDate) -> Result<Vec<ReadingDay>> {
        self.inner.list_status(user_id, from, to).await
    }

    async fn get_streak(&self, user_id: &UserId) -> Result<Option<StreakState>> {
        if Self::take_failure(&self.fail_streak_reads) {
            return Err(Error::unavailable("streak lookup timed out"));
        }
        self.inner.get_streak(user_id).await
    }

    async fn put_streak(&self, state: &StreakState) -> Result<StreakState> {
        self.streak_writes.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_streak_writes) {
            return Err(Error::unavailable("streak write dropped"));
        }
        self.inner.put_streak(state).await
    }
}
