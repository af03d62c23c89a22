//! End-to-end streak behaviour through the reading service.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use std::sync::Arc;

use common::{clock_on, date, service, set_day, FaultStore};
use daily_reading::store::{MemoryStore, ReadingStore};
use daily_reading::{Error, SectionMap, Section, StreakState, UserId};

fn reader() -> UserId {
    UserId::new("reader-1")
}

#[tokio::test]
async fn first_ever_completion_starts_streak() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-10"));

    let update = svc
        .upsert_status(&reader(), date("2024-01-10"), SectionMap::all_complete())
        .await
        .unwrap();

    assert!(update.newly_completed);
    let streak = update.streak.unwrap();
    assert_eq!(streak.current_streak, 1);
    assert_eq!(streak.total_readings, 1);
    assert_eq!(streak.last_reading_date, date("2024-01-10"));
}

#[tokio::test]
async fn next_day_extends_then_display_lapses_without_touching_store() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed_streak(StreakState {
            user_id: reader(),
            current_streak: 5,
            total_readings: 12,
            last_reading_date: date("2024-01-10"),
        })
        .await;
    let clock = clock_on("2024-01-11");
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, Arc::clone(&clock));

    let update = svc
        .upsert_status(&reader(), date("2024-01-11"), SectionMap::all_complete())
        .await
        .unwrap();
    let streak = update.streak.unwrap();
    assert_eq!(streak.current_streak, 6);
    assert_eq!(streak.total_readings, 13);

    // Three days later with no reading: shows 0, row still says 6.
    set_day(&clock, "2024-01-14");
    let view = svc.get_streak(&reader()).await.unwrap();
    assert_eq!(view.displayed, 0);
    assert!(view.is_lapsed());
    assert_eq!(view.stored.as_ref().unwrap().current_streak, 6);
    let stored = store.get_streak(&reader()).await.unwrap().unwrap();
    assert_eq!(stored.current_streak, 6);
    assert_eq!(stored.last_reading_date, date("2024-01-11"));

    // The next real completion corrects the stored value.
    svc.upsert_status(&reader(), date("2024-01-14"), SectionMap::all_complete())
        .await
        .unwrap();
    let view = svc.get_streak(&reader()).await.unwrap();
    assert_eq!(view.displayed, 1);
    assert_eq!(view.total_readings, 14);
    assert!(!view.is_lapsed());
}

#[tokio::test]
async fn gap_of_three_days_resets_to_one() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed_streak(StreakState {
            user_id: reader(),
            current_streak: 4,
            total_readings: 4,
            last_reading_date: date("2024-01-10"),
        })
        .await;
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-13"));

    let update = svc
        .upsert_status(&reader(), date("2024-01-13"), SectionMap::all_complete())
        .await
        .unwrap();
    assert_eq!(update.streak.unwrap().current_streak, 1);
}

#[tokio::test]
async fn replaying_identical_upsert_changes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-10"));
    let today = date("2024-01-10");

    svc.upsert_status(&reader(), today, SectionMap::all_complete()).await.unwrap();
    let before = store.get_streak(&reader()).await.unwrap();

    let replay = svc
        .upsert_status(&reader(), today, SectionMap::all_complete())
        .await
        .unwrap();
    assert!(!replay.newly_completed);
    assert!(replay.streak.is_none());
    assert_eq!(store.get_streak(&reader()).await.unwrap(), before);
}

#[tokio::test]
async fn replay_recovers_credit_lost_to_failed_streak_lookup() {
    let store = Arc::new(FaultStore::new());
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-10"));
    let today = date("2024-01-10");
    store.fail_streak_reads(3);

    let err = svc
        .upsert_status(&reader(), today, SectionMap::all_complete())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    let day = store.inner.get_status(&reader(), today).await.unwrap().unwrap();
    assert!(day.completed());
    assert!(store.inner.get_streak(&reader()).await.unwrap().is_none());

    let replay = svc
        .upsert_status(&reader(), today, SectionMap::all_complete())
        .await
        .unwrap();
    assert!(!replay.newly_completed);
    let streak = replay.streak.unwrap();
    assert_eq!(streak.current_streak, 1);
    assert_eq!(streak.total_readings, 1);
    assert_eq!(streak.last_reading_date, today);

    // A further replay finds the credit in place.
    let again = svc
        .upsert_status(&reader(), today, SectionMap::all_complete())
        .await
        .unwrap();
    assert!(again.streak.is_none());
    assert_eq!(store.inner.get_streak(&reader()).await.unwrap().unwrap().total_readings, 1);
}

#[tokio::test]
async fn replay_recovers_credit_lost_to_failed_streak_write() {
    let store = Arc::new(FaultStore::new());
    store
        .inner
        .seed_streak(StreakState {
            user_id: reader(),
            current_streak: 2,
            total_readings: 7,
            last_reading_date: date("2024-01-09"),
        })
        .await;
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-10"));
    store.fail_streak_writes(2);

    let err = svc
        .upsert_status(&reader(), date("2024-01-10"), SectionMap::all_complete())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(store.streak_writes(), 2);

    let replay = svc
        .upsert_status(&reader(), date("2024-01-10"), SectionMap::all_complete())
        .await
        .unwrap();
    let streak = replay.streak.unwrap();
    assert_eq!(streak.current_streak, 3);
    assert_eq!(streak.total_readings, 8);
    assert_eq!(store.streak_writes(), 3);
}

#[tokio::test]
async fn replaying_an_older_completed_day_does_not_add_to_total() {
    let store = Arc::new(MemoryStore::new());
    store
        .seed_streak(StreakState {
            user_id: reader(),
            current_streak: 3,
            total_readings: 9,
            last_reading_date: date("2024-01-12"),
        })
        .await;
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-12"));

    let late = svc
        .upsert_status(&reader(), date("2024-01-08"), SectionMap::all_complete())
        .await
        .unwrap();
    assert!(late.newly_completed);
    assert_eq!(late.streak.unwrap().total_readings, 10);

    let replay = svc
        .upsert_status(&reader(), date("2024-01-08"), SectionMap::all_complete())
        .await
        .unwrap();
    assert!(replay.streak.is_none());
    let stored = store.get_streak(&reader()).await.unwrap().unwrap();
    assert_eq!(stored.total_readings, 10);
    assert_eq!(stored.current_streak, 3);
    assert_eq!(stored.last_reading_date, date("2024-01-12"));
}

#[tokio::test]
async fn uncomplete_and_recomplete_same_day_counts_once() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-10"));
    let today = date("2024-01-10");

    svc.upsert_status(&reader(), today, SectionMap::all_complete()).await.unwrap();
    let mut partial = SectionMap::all_complete();
    partial.set(Section::Proverbs, false);
    svc.upsert_status(&reader(), today, partial).await.unwrap();
    let again = svc
        .upsert_status(&reader(), today, SectionMap::all_complete())
        .await
        .unwrap();

    assert!(again.newly_completed);
    let streak = again.streak.unwrap();
    assert_eq!(streak.current_streak, 1);
    assert_eq!(streak.total_readings, 1);
}

#[tokio::test]
async fn completed_flag_matches_sections_for_every_prefix() {
    let store = Arc::new(MemoryStore::new());
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-10"));
    let today = date("2024-01-10");

    let mut map = SectionMap::new();
    for section in Section::all() {
        map.set(*section, true);
        svc.upsert_status(&reader(), today, map.clone()).await.unwrap();
        let day = svc.get_status(&reader(), today).await.unwrap().unwrap();
        assert_eq!(day.completed(), map.all_done());
        assert_eq!(day.sections_completed, map);
    }
}

#[tokio::test]
async fn history_lists_days_in_order() {
    let store = Arc::new(MemoryStore::new());
    let clock = clock_on("2024-01-08");
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, Arc::clone(&clock));

    for day in ["2024-01-08", "2024-01-09", "2024-01-10"] {
        set_day(&clock, day);
        svc.upsert_status(&reader(), date(day), SectionMap::all_complete()).await.unwrap();
    }

    let days = svc.history(&reader(), date("2024-01-09"), date("2024-01-10")).await.unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].reading_date, date("2024-01-09"));
    let view = svc.get_streak(&reader()).await.unwrap();
    assert_eq!(view.displayed, 3);
}

#[tokio::test]
async fn transient_read_failures_are_retried() {
    let store = Arc::new(FaultStore::new());
    store.fail_reads(2);
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-10"));

    let day = svc.get_status(&reader(), date("2024-01-10")).await.unwrap();
    assert!(day.is_none());
    assert_eq!(store.reads(), 3);
}

#[tokio::test]
async fn writes_are_replayed_at_most_once() {
    let store = Arc::new(FaultStore::new());
    store.fail_writes(5);
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-10"));

    let err = svc
        .upsert_status(&reader(), date("2024-01-10"), SectionMap::all_complete())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(store.upserts(), 2);
    assert!(store.inner.get_streak(&reader()).await.unwrap().is_none());
}

#[tokio::test]
async fn validation_errors_are_not_retried() {
    let store = Arc::new(FaultStore::new());
    let svc = service(Arc::clone(&store) as Arc<dyn ReadingStore>, clock_on("2024-01-10"));

    let err = svc
        .upsert_status(&reader(), date("2024-02-01"), SectionMap::all_complete())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(store.upserts(), 0);
}
