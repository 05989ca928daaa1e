//! Interval-driven refresh of a live reading.
//!
//! [`LivePoller`] invokes a fetch-and-apply callback once immediately when it
//! starts, then once per interval. The callback can be replaced at any time;
//! the timer always calls the latest one. A failing invocation is logged and
//! the next tick runs as usual.
//!
//! The poller is either idle or running at one interval. Changing the
//! interval tears the timer down and starts a fresh one; the restart does
//! not fire immediately. After [`stop`](LivePoller::stop) returns, the
//! callback is never invoked again.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use emon_types::UserSettings;

use crate::error::Result;

/// Interval used while the user's settings are not loaded.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Shared, replaceable fetch-and-apply callback.
pub type PollCallback = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Refresh interval for the given settings.
pub fn interval_for(settings: Option<&UserSettings>) -> Duration {
    match settings {
        Some(settings) if settings.live_refresh_interval_secs > 0 => {
            Duration::from_millis(settings.live_refresh_interval_ms())
        }
        _ => DEFAULT_POLL_INTERVAL,
    }
}

/// Current phase of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Running { interval: Duration },
}

struct Slot {
    callback: PollCallback,
    generation: u64,
}

struct Running {
    interval: Duration,
    cancel: CancellationToken,
}

/// A timer that repeatedly invokes a callback.
///
/// Dropping the poller stops it.
pub struct LivePoller {
    slot: Arc<Mutex<Slot>>,
    running: Option<Running>,
}

impl std::fmt::Debug for LivePoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivePoller")
            .field("state", &self.state())
            .finish()
    }
}

fn boxed<F, Fut>(callback: F) -> PollCallback
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move || callback().boxed())
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

impl LivePoller {
    /// Create an idle poller.
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                callback: boxed(callback),
                generation: 0,
            })),
            running: None,
        }
    }

    /// Replace the callback. The next tick uses the new one.
    pub fn set_callback<F, Fut>(&self, callback: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        lock(&self.slot).callback = boxed(callback);
    }

    pub fn state(&self) -> PollerState {
        match &self.running {
            Some(running) => PollerState::Running {
                interval: running.interval,
            },
            None => PollerState::Idle,
        }
    }

    /// Start polling, firing immediately. Same as `set_interval(Some(interval))`.
    pub fn start(&mut self, interval: Duration) {
        self.set_interval(Some(interval));
    }

    /// Drive the poller from an optional interval.
    ///
    /// * `None` (or zero) stops it.
    /// * From idle, starts and fires immediately.
    /// * While running at a different interval, restarts without an immediate fire.
    /// * While running at the same interval, does nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn set_interval(&mut self, interval: Option<Duration>) {
        let interval = interval.filter(|d| !d.is_zero());
        match (interval, self.state()) {
            (None, _) => self.stop(),
            (Some(interval), PollerState::Idle) => self.launch(interval, true),
            (Some(interval), PollerState::Running { interval: current }) if interval == current => {}
            (Some(interval), PollerState::Running { .. }) => {
                self.stop();
                self.launch(interval, false);
            }
        }
    }

    /// Stop the timer. Safe to call when idle.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            lock(&self.slot).generation += 1;
            debug!(interval_ms = running.interval.as_millis() as u64, "live poller stopped");
        }
    }

    fn launch(&mut self, interval: Duration, fire_now: bool) {
        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.generation
        };
        let cancel = CancellationToken::new();
        let task_token = cancel.clone();
        let slot = Arc::clone(&self.slot);

        tokio::spawn(async move {
            let first = if fire_now {
                Instant::now()
            } else {
                Instant::now() + interval
            };
            let mut ticker = interval_at(first, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let call = {
                    let slot = lock(&slot);
                    if slot.generation != generation {
                        break;
                    }
                    (slot.callback)()
                };

                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    result = call => {
                        if let Err(e) = result {
                            warn!(error = %e, "live poll failed");
                        }
                    }
                }
            }
        });

        debug!(interval_ms = interval.as_millis() as u64, fire_now, "live poller started");
        self.running = Some(Running { interval, cancel });
    }
}

impl Drop for LivePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
