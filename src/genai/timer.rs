//! Clock and sleep primitive used by the text and video clients.
//!
//! Both clients only ever need two things from time: how long it has been
//! since some earlier point, and a way to suspend for a fixed delay. Keeping
//! those behind [`Timer`] lets the poll loop and the overload backoff run
//! against a [`VirtualTimer`] in tests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

/// Monotonic clock plus async sleep.
#[async_trait]
pub trait Timer: Send + Sync {
    /// Monotonic time since the timer's origin.
    fn now(&self) -> Duration;

    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock timer backed by `tokio::time`.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    origin: tokio::time::Instant,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Timer for TokioTimer {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Timer whose clock only moves when something sleeps on it or calls
/// [`VirtualTimer::advance`].
///
/// Sleeps return immediately and are recorded, so callers can assert on the
/// exact delays a client asked for. Clones share the same clock.
#[derive(Debug, Clone, Default)]
pub struct VirtualTimer {
    state: Arc<Mutex<VirtualState>>,
}

#[derive(Debug, Default)]
struct VirtualState {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl VirtualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.now = state.now.saturating_add(duration);
    }

    /// Every delay requested through [`Timer::sleep`], in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    /// Sum of all recorded sleeps.
    pub fn total_slept(&self) -> Duration {
        self.lock().sleeps.iter().sum()
    }

    fn lock(&self) -> MutexGuard<'_, VirtualState> {
        // A panic while holding the guard cannot leave the state half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Timer for VirtualTimer {
    fn now(&self) -> Duration {
        self.lock().now
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.now = state.now.saturating_add(duration);
        state.sleeps.push(duration);
    }
}
