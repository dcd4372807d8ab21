//! Integration tests for the persisted session countdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use classmate_core::{
    CountdownOptions, CountdownState, CountdownTimer, Event, ManualClock, MemoryStorage,
    PersistedCountdown, SessionDb, SessionStorage, UrgencyTier,
};
use proptest::prelude::*;

const NOW: i64 = 1_760_000_000_000;

fn persist(store: &impl SessionStorage, key: &str, start_time: i64, initial_seconds: u64) {
    let record = PersistedCountdown {
        start_time,
        initial_seconds,
    };
    store.set(key, &record.encode()).unwrap();
}

#[test]
fn reconstruction_resumes_from_wall_clock_delta() {
    let store = MemoryStorage::new();
    persist(&store, "quiz-timer", NOW - 10_000, 900);

    let timer = CountdownTimer::new(
        CountdownOptions::new(900).storage_key("quiz-timer"),
        &store,
        ManualClock::new(NOW),
    );
    assert_eq!(timer.remaining_seconds(), 890);
    assert!(timer.resumed());
    assert_eq!(timer.formatted_time(), "14:50");
}

#[test]
fn spent_record_is_treated_as_absent() {
    let store = MemoryStorage::new();
    persist(&store, "quiz-timer", NOW - 901_000, 900);

    let timer = CountdownTimer::new(
        CountdownOptions::new(600).storage_key("quiz-timer").auto_start(false),
        &store,
        ManualClock::new(NOW),
    );
    assert_eq!(timer.remaining_seconds(), 600);
    assert!(!timer.resumed());
    assert!(!store.contains_key("quiz-timer"));
}

#[test]
fn record_exactly_at_deadline_is_spent() {
    let store = MemoryStorage::new();
    persist(&store, "k", NOW - 60_000, 60);

    let timer = CountdownTimer::new(
        CountdownOptions::new(60).storage_key("k"),
        &store,
        ManualClock::new(NOW),
    );
    assert_eq!(timer.remaining_seconds(), 60);
    assert!(!timer.resumed());
}

#[test]
fn corrupted_record_falls_back_to_full_duration() {
    for raw in [
        "",
        "{",
        "null",
        r#"{"startTime":"yesterday","initialSeconds":900}"#,
        r#"{"startTime":0,"initialSeconds":18446744073709551615}"#,
        r#"{"startTime":-9223372036854775808,"initialSeconds":900}"#,
    ] {
        let store = MemoryStorage::new();
        store.set("quiz-timer", raw).unwrap();

        let timer = CountdownTimer::new(
            CountdownOptions::new(900).storage_key("quiz-timer").auto_start(false),
            &store,
            ManualClock::new(NOW),
        );
        assert_eq!(timer.remaining_seconds(), 900, "record {raw:?}");
        assert!(!store.contains_key("quiz-timer"));
    }
}

#[test]
fn restored_countdown_adopts_persisted_duration() {
    let store = MemoryStorage::new();
    persist(&store, "k", NOW - 5_000, 120);

    let mut timer = CountdownTimer::new(
        CountdownOptions::new(900).storage_key("k"),
        &store,
        ManualClock::new(NOW),
    );
    assert_eq!(timer.duration_seconds(), 120);
    assert_eq!(timer.remaining_seconds(), 115);

    timer.tick();
    let record = PersistedCountdown::decode(&store.get("k").unwrap().unwrap()).unwrap();
    assert_eq!(record.initial_seconds, 120);
    assert_eq!(record.remaining_at(NOW), 114);
}

#[test]
fn reload_mid_countdown_loses_no_time() {
    let store = MemoryStorage::new();
    let clock = ManualClock::new(NOW);

    let mut first = CountdownTimer::new(
        CountdownOptions::new(300).storage_key("diagnostic-quiz-timer"),
        &store,
        clock.clone(),
    );
    for _ in 0..30 {
        clock.advance_secs(1);
        first.tick();
    }
    assert_eq!(first.remaining_seconds(), 270);
    drop(first);

    // Host was gone for two minutes.
    clock.advance_secs(120);
    let second = CountdownTimer::new(
        CountdownOptions::new(300).storage_key("diagnostic-quiz-timer"),
        &store,
        clock.clone(),
    );
    assert_eq!(second.remaining_seconds(), 150);
    assert_eq!(second.urgency(), UrgencyTier::Warning);
}

#[test]
fn expiry_callback_runs_once_across_rerenders() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let mut timer = CountdownTimer::new(
        CountdownOptions::new(3).on_expire(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }),
        MemoryStorage::new(),
        ManualClock::new(NOW),
    );

    let mut renders = Vec::new();
    for _ in 0..10 {
        timer.tick();
        // Rendering reads state repeatedly.
        renders.push(timer.snapshot());
        renders.push(timer.snapshot());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(renders.iter().all(|e| matches!(e, Event::CountdownSnapshot { .. })));
}

#[test]
fn urgency_is_monotonic_while_running() {
    let mut timer = CountdownTimer::new(
        CountdownOptions::new(400),
        MemoryStorage::new(),
        ManualClock::new(NOW),
    );
    let mut previous = timer.urgency();
    while timer.is_running() {
        timer.tick();
        assert!(timer.urgency() >= previous);
        previous = timer.urgency();
    }
    assert_eq!(previous, UrgencyTier::Urgent);
}

#[test]
fn stop_then_reconstruct_starts_fresh() {
    let store = MemoryStorage::new();
    let clock = ManualClock::new(NOW);
    let mut timer = CountdownTimer::new(
        CountdownOptions::new(900).storage_key("quiz-timer"),
        &store,
        clock.clone(),
    );
    for _ in 0..100 {
        clock.advance_secs(1);
        timer.tick();
    }
    timer.stop();
    timer.stop();

    let again = CountdownTimer::new(
        CountdownOptions::new(900).storage_key("quiz-timer"),
        &store,
        clock,
    );
    assert_eq!(again.remaining_seconds(), 900);
}

#[test]
fn end_to_end_five_second_countdown() {
    let db = SessionDb::open_memory().unwrap();
    let clock = ManualClock::new(NOW);
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);

    let mut timer = CountdownTimer::new(
        CountdownOptions::new(5).storage_key("t1").on_expire(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }),
        &db,
        clock.clone(),
    );
    assert!(db.get("t1").unwrap().is_some());

    let mut events = Vec::new();
    for _ in 0..5 {
        clock.advance_secs(1);
        if let Some(event) = timer.tick() {
            events.push(event);
        }
    }

    assert_eq!(timer.remaining_seconds(), 0);
    assert_eq!(timer.state(), CountdownState::Expired);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(db.get("t1").unwrap().is_none());
    assert!(matches!(events.last(), Some(Event::CountdownExpired { .. })));
}

#[test]
fn distinct_keys_do_not_interfere() {
    let store = MemoryStorage::new();
    let clock = ManualClock::new(NOW);
    let mut quiz = CountdownTimer::new(
        CountdownOptions::new(900).storage_key("quiz-timer"),
        &store,
        clock.clone(),
    );
    let mut diagnostic = CountdownTimer::new(
        CountdownOptions::new(600).storage_key("diagnostic-quiz-timer"),
        &store,
        clock.clone(),
    );
    clock.advance_secs(1);
    quiz.tick();
    diagnostic.stop();

    assert!(store.contains_key("quiz-timer"));
    assert!(!store.contains_key("diagnostic-quiz-timer"));
    assert_eq!(quiz.remaining_seconds(), 899);
}

proptest! {
    #[test]
    fn fresh_construction_uses_initial_seconds(secs in 0u64..100_000) {
        let timer = CountdownTimer::new(
            CountdownOptions::new(secs).storage_key("k"),
            MemoryStorage::new(),
            ManualClock::new(NOW),
        );
        prop_assert_eq!(timer.remaining_seconds(), secs);
    }

    #[test]
    fn restored_remaining_never_exceeds_duration(offset_ms in -1_000_000i64..2_000_000, secs in 1u64..1_000) {
        let store = MemoryStorage::new();
        persist(&store, "k", NOW - offset_ms, secs);
        let timer = CountdownTimer::new(
            CountdownOptions::new(secs).storage_key("k").auto_start(false),
            &store,
            ManualClock::new(NOW),
        );
        prop_assert!(timer.remaining_seconds() <= secs);
        prop_assert!(timer.remaining_seconds() > 0);
    }
}
