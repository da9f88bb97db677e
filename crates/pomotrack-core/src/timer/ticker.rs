//! Cancellable repeating tick source.
//!
//! A `Ticker` owns at most one live tokio task. Installing a new callback
//! always aborts the previous task first, and every installation gets a
//! fresh generation number so a callback that was already in flight when it
//! got replaced can recognise itself as stale.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Shortest accepted period; tokio's interval rejects zero.
pub const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Periods shorter than [`MIN_TICK`] are raised to it.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_TICK),
            generation: 0,
            handle: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Generation of the most recently installed callback.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Replace any running tick task with one that calls `on_tick` once per
    /// period, starting one period from now. The task ends when `on_tick`
    /// returns `Break` or the ticker is cancelled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn install<F>(&mut self, mut on_tick: F) -> u64
    where
        F: FnMut(u64) -> ControlFlow<()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;

        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if on_tick(generation).is_break() {
                    trace!(generation, "tick task finished");
                    break;
                }
            }
        }));
        trace!(generation, "tick task installed");
        generation
    }

    /// Abort the live task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            trace!(generation = self.generation, "tick task cancelled");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
