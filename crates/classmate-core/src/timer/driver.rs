//! Drives a [`CountdownTimer`] on a tokio interval.
//!
//! The spawned task owns the countdown, so ticks are strictly sequential.
//! The interval lives inside the task and is dropped on every way out of it:
//! expiry, stop, cancel, or abort when the handle is dropped.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::clock::Clock;
use super::countdown::CountdownTimer;
use crate::events::Event;
use crate::storage::SessionStorage;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    /// Leave the countdown (and its record) as is.
    Cancel,
    /// Stop the countdown, removing its record.
    Stop,
}

/// Owner of a running countdown task.
///
/// Dropping the handle aborts the task without touching the persisted
/// record, the same as the host page going away.
pub struct CountdownHandle<S, C> {
    control: Option<oneshot::Sender<Teardown>>,
    task: Option<JoinHandle<CountdownTimer<S, C>>>,
}

/// Spawn a task that ticks `timer` once per second until it expires or is
/// torn down. An idle countdown is started first.
///
/// `on_tick` sees the countdown after every tick together with any event
/// that tick produced.
pub fn spawn_countdown<S, C, F>(timer: CountdownTimer<S, C>, on_tick: F) -> CountdownHandle<S, C>
where
    S: SessionStorage + Send + 'static,
    C: Clock + Send + 'static,
    F: FnMut(&CountdownTimer<S, C>, Option<Event>) + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(run(timer, on_tick, rx));
    CountdownHandle {
        control: Some(tx),
        task: Some(task),
    }
}

async fn run<S, C, F>(
    mut timer: CountdownTimer<S, C>,
    mut on_tick: F,
    mut control: oneshot::Receiver<Teardown>,
) -> CountdownTimer<S, C>
where
    S: SessionStorage,
    C: Clock,
    F: FnMut(&CountdownTimer<S, C>, Option<Event>),
{
    if let Some(started) = timer.start() {
        on_tick(&timer, Some(started));
    }

    let mut interval = tokio::time::interval(TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    while timer.is_running() && timer.remaining_seconds() > 0 {
        tokio::select! {
            _ = interval.tick() => {
                let event = timer.tick();
                let terminal = event.as_ref().is_some_and(Event::is_terminal);
                on_tick(&timer, event);
                if terminal {
                    break;
                }
            }
            cmd = &mut control => {
                if let Ok(Teardown::Stop) = cmd {
                    if let Some(stopped) = timer.stop() {
                        on_tick(&timer, Some(stopped));
                    }
                }
                debug!(key = ?timer.storage_key(), ?cmd, "countdown task torn down");
                break;
            }
        }
    }

    timer
}

impl<S, C> CountdownHandle<S, C> {
    /// Tear down the task, keeping the countdown's persisted record.
    /// Idempotent.
    pub fn cancel(&mut self) {
        self.send(Teardown::Cancel);
    }

    /// Stop the countdown and tear down the task. Idempotent.
    pub fn stop(&mut self) {
        self.send(Teardown::Stop);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the task to end and take back the countdown.
    ///
    /// Cancel-safe: dropping this future leaves the task running. Returns
    /// `None` if the task panicked or was already waited on.
    pub async fn wait(&mut self) -> Option<CountdownTimer<S, C>> {
        let task = self.task.as_mut()?;
        let result = task.await;
        self.task = None;
        result.ok()
    }

    /// Consume the handle, waiting for the task to end.
    pub async fn join(mut self) -> Option<CountdownTimer<S, C>> {
        self.wait().await
    }

    fn send(&mut self, cmd: Teardown) {
        if let Some(tx) = self.control.take() {
            // The task may already have finished; that is fine.
            let _ = tx.send(cmd);
        }
    }
}

impl<S, C> Drop for CountdownHandle<S, C> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::timer::{CountdownOptions, CountdownState, SystemClock};

    #[tokio::test(start_paused = true)]
    async fn runs_to_expiry() {
        let store = Arc::new(MemoryStorage::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let timer = CountdownTimer::new(
            CountdownOptions::new(5).storage_key("t1").on_expire(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
            Arc::clone(&store),
            SystemClock,
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = spawn_countdown(timer, move |t, _event| {
            sink.lock().unwrap().push(t.remaining_seconds());
        });

        let timer = handle.join().await.unwrap();
        assert_eq!(timer.remaining_seconds(), 0);
        assert!(timer.has_expired());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!store.contains_key("t1"));
        assert_eq!(*seen.lock().unwrap(), vec![4, 3, 2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_keeps_record() {
        let store = Arc::new(MemoryStorage::new());
        let timer = CountdownTimer::new(
            CountdownOptions::new(10).storage_key("quiz"),
            Arc::clone(&store),
            SystemClock,
        );
        let mut handle = spawn_countdown(timer, |_, _| {});

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        handle.cancel();
        handle.cancel();

        let timer = handle.join().await.unwrap();
        assert_eq!(timer.remaining_seconds(), 7);
        assert_eq!(timer.state(), CountdownState::Running);
        assert!(store.contains_key("quiz"));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_removes_record() {
        let store = Arc::new(MemoryStorage::new());
        let timer = CountdownTimer::new(
            CountdownOptions::new(10).storage_key("quiz"),
            Arc::clone(&store),
            SystemClock,
        );
        let stopped = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&stopped);
        let mut handle = spawn_countdown(timer, move |_, event| {
            if matches!(event, Some(Event::CountdownStopped { .. })) {
                s.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        handle.stop();
        let timer = handle.join().await.unwrap();
        assert_eq!(timer.state(), CountdownState::Stopped);
        assert_eq!(stopped.load(Ordering::SeqCst), 1);
        assert!(!store.contains_key("quiz"));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_countdown_is_started_by_driver() {
        let timer = CountdownTimer::new(
            CountdownOptions::new(2).auto_start(false),
            MemoryStorage::new(),
            SystemClock,
        );
        let started = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&started);
        let handle = spawn_countdown(timer, move |_, event| {
            if matches!(event, Some(Event::CountdownStarted { .. })) {
                s.fetch_add(1, Ordering::SeqCst);
            }
        });
        let timer = handle.join().await.unwrap();
        assert!(timer.has_expired());
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_aborts_task() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&ticks);
        let timer = CountdownTimer::new(CountdownOptions::new(60), MemoryStorage::new(), SystemClock);
        let handle = spawn_countdown(timer, move |_, _| {
            t.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
