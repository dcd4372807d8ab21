//! Session countdown.
//!
//! A one-shot countdown that survives a full restart of its host. Like the
//! rest of the timer module it owns no thread: something else calls
//! [`CountdownTimer::tick`] once per second (see [`super::driver`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Expired
//!   \        \
//!    `--------`---> Stopped
//! ```
//!
//! ## Persistence
//!
//! With a storage key, the countdown keeps a [`PersistedCountdown`] under
//! that key. The record holds the instant the current period began, not the
//! seconds left, and is re-anchored on every tick. A countdown rebuilt from
//! it resumes at the wall-clock-correct remaining time. The record is removed
//! on expiry and on stop.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::record::PersistedCountdown;
use super::urgency::{format_time, UrgencyTier};
use crate::events::Event;
use crate::storage::SessionStorage;

/// Invoked once when the countdown reaches zero.
pub type ExpireCallback = Box<dyn FnMut() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Expired,
    Stopped,
}

/// Construction parameters for [`CountdownTimer`].
pub struct CountdownOptions {
    pub initial_seconds: u64,
    pub auto_start: bool,
    /// Enables persistence when set.
    pub storage_key: Option<String>,
    pub on_expire: Option<ExpireCallback>,
}

impl Default for CountdownOptions {
    fn default() -> Self {
        Self {
            initial_seconds: 900,
            auto_start: true,
            storage_key: None,
            on_expire: None,
        }
    }
}

impl std::fmt::Debug for CountdownOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownOptions")
            .field("initial_seconds", &self.initial_seconds)
            .field("auto_start", &self.auto_start)
            .field("storage_key", &self.storage_key)
            .field("on_expire", &self.on_expire.is_some())
            .finish()
    }
}

impl CountdownOptions {
    pub fn new(initial_seconds: u64) -> Self {
        Self {
            initial_seconds,
            ..Self::default()
        }
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn on_expire(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_expire = Some(Box::new(callback));
        self
    }
}

/// Restartable, persistence-aware countdown.
pub struct CountdownTimer<S, C = SystemClock> {
    storage: S,
    clock: C,
    storage_key: Option<String>,
    duration_secs: u64,
    remaining_secs: u64,
    state: CountdownState,
    urgency: UrgencyTier,
    resumed: bool,
    on_expire: Option<ExpireCallback>,
}

impl<S: SessionStorage> CountdownTimer<S, SystemClock> {
    /// Create a countdown on the host's wall clock.
    pub fn with_system_clock(options: CountdownOptions, storage: S) -> Self {
        Self::new(options, storage, SystemClock)
    }
}

impl<S: SessionStorage, C: Clock> CountdownTimer<S, C> {
    /// Create a countdown, resuming from a persisted record when one exists.
    ///
    /// A record that cannot be parsed, or whose time has already run out, is
    /// removed and the countdown starts from `initial_seconds`.
    pub fn new(options: CountdownOptions, storage: S, clock: C) -> Self {
        let CountdownOptions {
            initial_seconds,
            auto_start,
            storage_key,
            on_expire,
        } = options;

        let restored = storage_key
            .as_deref()
            .and_then(|key| restore(&storage, clock.now_ms(), key));

        let (duration_secs, remaining_secs, resumed) = match restored {
            Some((record, remaining)) => (record.initial_seconds, remaining, true),
            None => (initial_seconds, initial_seconds, false),
        };

        let mut timer = Self {
            storage,
            clock,
            storage_key,
            duration_secs,
            remaining_secs,
            state: CountdownState::Idle,
            urgency: UrgencyTier::from_remaining(remaining_secs),
            resumed,
            on_expire,
        };

        if auto_start {
            timer.start();
        }
        timer
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn has_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_secs
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_secs
    }

    pub fn formatted_time(&self) -> String {
        format_time(self.remaining_secs)
    }

    pub fn urgency(&self) -> UrgencyTier {
        self.urgency
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.urgency.notice()
    }

    /// Whether progress was restored from a persisted record.
    pub fn resumed(&self) -> bool {
        self.resumed
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::CountdownSnapshot {
            state: self.state,
            storage_key: self.storage_key.clone(),
            duration_secs: self.duration_secs,
            remaining_secs: self.remaining_secs,
            formatted: self.formatted_time(),
            urgency: self.urgency,
            notice: self.notice().map(str::to_string),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting. Only an idle countdown can start.
    pub fn start(&mut self) -> Option<Event> {
        if self.state != CountdownState::Idle {
            return None;
        }
        self.state = CountdownState::Running;
        self.persist();
        debug!(
            key = ?self.storage_key,
            remaining = self.remaining_secs,
            resumed = self.resumed,
            "countdown started"
        );
        Some(Event::CountdownStarted {
            storage_key: self.storage_key.clone(),
            duration_secs: self.duration_secs,
            remaining_secs: self.remaining_secs,
            resumed: self.resumed,
            at: Utc::now(),
        })
    }

    /// Advance by one second.
    ///
    /// Returns `CountdownExpired` on the tick that reaches zero and
    /// `UrgencyChanged` when the tier moves. A countdown that is not running,
    /// or has nothing left, ignores the tick.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != CountdownState::Running || self.remaining_secs == 0 {
            return None;
        }

        self.remaining_secs -= 1;
        if self.remaining_secs == 0 {
            return Some(self.expire());
        }

        self.persist();

        let tier = UrgencyTier::from_remaining(self.remaining_secs);
        if tier == self.urgency {
            return None;
        }
        let from = std::mem::replace(&mut self.urgency, tier);
        debug!(%from, to = %tier, remaining = self.remaining_secs, "urgency changed");
        Some(Event::UrgencyChanged {
            from,
            to: tier,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Cancel the countdown and drop its persisted record.
    ///
    /// Safe to call repeatedly; only the first call on a live countdown
    /// returns an event.
    pub fn stop(&mut self) -> Option<Event> {
        match self.state {
            CountdownState::Idle | CountdownState::Running => {
                self.state = CountdownState::Stopped;
                self.discard_record();
                info!(key = ?self.storage_key, remaining = self.remaining_secs, "countdown stopped");
                Some(Event::CountdownStopped {
                    storage_key: self.storage_key.clone(),
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            CountdownState::Expired | CountdownState::Stopped => None,
        }
    }

    /// Begin a new lifetime of `initial_seconds` and start it.
    ///
    /// The expiry callback is armed again for the new lifetime.
    pub fn restart(&mut self, initial_seconds: u64) -> Option<Event> {
        self.duration_secs = initial_seconds;
        self.remaining_secs = initial_seconds;
        self.urgency = UrgencyTier::from_remaining(initial_seconds);
        self.resumed = false;
        self.state = CountdownState::Idle;
        self.start()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn expire(&mut self) -> Event {
        // Terminal before the callback runs, so nothing can re-enter here.
        self.state = CountdownState::Expired;
        self.urgency = UrgencyTier::Urgent;
        self.discard_record();
        info!(key = ?self.storage_key, duration = self.duration_secs, "countdown expired");

        if let Some(callback) = self.on_expire.as_mut() {
            callback();
        }

        Event::CountdownExpired {
            storage_key: self.storage_key.clone(),
            duration_secs: self.duration_secs,
            at: Utc::now(),
        }
    }

    fn persist(&self) {
        let Some(key) = self.storage_key.as_deref() else {
            return;
        };
        if self.remaining_secs == 0 {
            return;
        }
        let record =
            PersistedCountdown::anchored(self.clock.now_ms(), self.duration_secs, self.remaining_secs);
        if let Err(e) = self.storage.set(key, &record.encode()) {
            warn!(key, error = %e, "failed to persist countdown");
        }
    }

    fn discard_record(&self) {
        if let Some(key) = self.storage_key.as_deref() {
            discard(&self.storage, key);
        }
    }
}

/// Load a live record for `key`, removing it if it is unreadable or spent.
fn restore<S: SessionStorage>(
    storage: &S,
    now_ms: i64,
    key: &str,
) -> Option<(PersistedCountdown, u64)> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read persisted countdown");
            return None;
        }
    };

    let Some(record) = PersistedCountdown::decode(&raw) else {
        warn!(key, "discarding unreadable countdown record");
        discard(storage, key);
        return None;
    };

    let remaining = record.remaining_at(now_ms);
    if remaining == 0 {
        debug!(key, "persisted countdown already ran out; starting fresh");
        discard(storage, key);
        return None;
    }

    debug!(key, remaining, "restored countdown");
    Some((record, remaining))
}

fn discard<S: SessionStorage>(storage: &S, key: &str) {
    if let Err(e) = storage.remove(key) {
        warn!(key, error = %e, "failed to remove countdown record");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStorage;
    use crate::timer::ManualClock;

    const T0: i64 = 1_700_000_000_000;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        (calls, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn fresh_countdown_starts_at_initial_seconds() {
        let store = MemoryStorage::new();
        let timer = CountdownTimer::new(
            CountdownOptions::new(120).storage_key("quiz"),
            &store,
            ManualClock::new(T0),
        );
        assert_eq!(timer.remaining_seconds(), 120);
        assert_eq!(timer.state(), CountdownState::Running);
        assert!(!timer.resumed());
        assert!(store.contains_key("quiz"));
    }

    #[test]
    fn default_options_are_fifteen_minutes_auto_started() {
        let timer =
            CountdownTimer::new(CountdownOptions::default(), MemoryStorage::new(), ManualClock::new(T0));
        assert_eq!(timer.remaining_seconds(), 900);
        assert_eq!(timer.formatted_time(), "15:00");
        assert_eq!(timer.urgency(), UrgencyTier::Normal);
        assert!(timer.is_running());
    }

    #[test]
    fn without_key_nothing_is_persisted() {
        let store = MemoryStorage::new();
        let mut timer =
            CountdownTimer::new(CountdownOptions::new(3), &store, ManualClock::new(T0));
        timer.tick();
        assert!(store.is_empty());
    }

    #[test]
    fn auto_start_false_stays_idle_and_ignores_ticks() {
        let store = MemoryStorage::new();
        let mut timer = CountdownTimer::new(
            CountdownOptions::new(10).storage_key("k").auto_start(false),
            &store,
            ManualClock::new(T0),
        );
        assert_eq!(timer.state(), CountdownState::Idle);
        assert!(timer.tick().is_none());
        assert_eq!(timer.remaining_seconds(), 10);
        assert!(store.is_empty());

        assert!(timer.start().is_some());
        assert!(timer.start().is_none());
        timer.tick();
        assert_eq!(timer.remaining_seconds(), 9);
    }

    #[test]
    fn tick_reanchors_start_time() {
        let store = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut timer = CountdownTimer::new(
            CountdownOptions::new(900).storage_key("quiz"),
            &store,
            clock.clone(),
        );

        for _ in 0..3 {
            clock.advance_secs(1);
            timer.tick();
        }
        // Host clock drifted: 5 real seconds passed for one more tick.
        clock.advance_secs(5);
        timer.tick();

        let record = PersistedCountdown::decode(&store.get("quiz").unwrap().unwrap()).unwrap();
        assert_eq!(timer.remaining_seconds(), 896);
        assert_eq!(record.start_time, clock.now_ms() - 4_000);
        assert_eq!(record.remaining_at(clock.now_ms()), 896);
    }

    #[test]
    fn expiry_fires_callback_once_and_clears_record() {
        let store = MemoryStorage::new();
        let (calls, on_expire) = counter();
        let mut timer = CountdownTimer::new(
            CountdownOptions::new(2).storage_key("k").on_expire(on_expire),
            &store,
            ManualClock::new(T0),
        );

        assert!(timer.tick().is_none());
        let event = timer.tick().unwrap();
        assert!(matches!(event, Event::CountdownExpired { .. }));
        assert!(timer.has_expired());
        assert!(!timer.is_running());
        assert!(store.is_empty());

        for _ in 0..5 {
            assert!(timer.tick().is_none());
        }
        assert!(timer.stop().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(timer.remaining_seconds(), 0);
    }

    #[test]
    fn urgency_changes_are_reported_once_each() {
        let mut timer = CountdownTimer::new(
            CountdownOptions::new(302),
            MemoryStorage::new(),
            ManualClock::new(T0),
        );
        let mut changes = Vec::new();
        while timer.is_running() {
            if let Some(Event::UrgencyChanged { from, to, remaining_secs, .. }) = timer.tick() {
                changes.push((from, to, remaining_secs));
            }
        }
        assert_eq!(
            changes,
            vec![
                (UrgencyTier::Normal, UrgencyTier::Warning, 300),
                (UrgencyTier::Warning, UrgencyTier::Urgent, 60),
            ]
        );
    }

    #[test]
    fn stop_is_idempotent_and_removes_record() {
        let store = MemoryStorage::new();
        let mut timer = CountdownTimer::new(
            CountdownOptions::new(60).storage_key("k"),
            &store,
            ManualClock::new(T0),
        );
        assert!(store.contains_key("k"));
        assert!(matches!(timer.stop(), Some(Event::CountdownStopped { .. })));
        assert!(timer.stop().is_none());
        assert!(!store.contains_key("k"));
        assert!(timer.tick().is_none());
    }

    #[test]
    fn restart_rearms_expiry() {
        let (calls, on_expire) = counter();
        let mut timer = CountdownTimer::new(
            CountdownOptions::new(1).on_expire(on_expire),
            MemoryStorage::new(),
            ManualClock::new(T0),
        );
        timer.tick();
        assert!(timer.has_expired());

        assert!(timer.restart(2).is_some());
        assert_eq!(timer.remaining_seconds(), 2);
        timer.tick();
        timer.tick();
        assert!(timer.has_expired());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_seconds_never_expires_by_tick() {
        let (calls, on_expire) = counter();
        let mut timer = CountdownTimer::new(
            CountdownOptions::new(0).storage_key("k").on_expire(on_expire),
            MemoryStorage::new(),
            ManualClock::new(T0),
        );
        assert_eq!(timer.remaining_seconds(), 0);
        assert!(timer.tick().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(timer.storage().is_empty());
    }

    struct FailingStorage;

    impl SessionStorage for FailingStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Locked)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
    }

    #[test]
    fn storage_failures_do_not_interrupt_countdown() {
        let (calls, on_expire) = counter();
        let mut timer = CountdownTimer::new(
            CountdownOptions::new(2).storage_key("k").on_expire(on_expire),
            FailingStorage,
            ManualClock::new(T0),
        );
        assert_eq!(timer.remaining_seconds(), 2);
        timer.tick();
        timer.tick();
        assert!(timer.has_expired());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snapshot_reports_display_fields() {
        let timer = CountdownTimer::new(
            CountdownOptions::new(45).auto_start(false),
            MemoryStorage::new(),
            ManualClock::new(T0),
        );
        match timer.snapshot() {
            Event::CountdownSnapshot {
                state,
                formatted,
                urgency,
                notice,
                ..
            } => {
                assert_eq!(state, CountdownState::Idle);
                assert_eq!(formatted, "00:45");
                assert_eq!(urgency, UrgencyTier::Urgent);
                assert_eq!(notice.as_deref(), Some("Hurry!"));
            }
            other => panic!("Expected CountdownSnapshot, got {other:?}"),
        }
    }
}
