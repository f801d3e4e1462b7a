//! Request bookkeeping for recomputes driven by pointer moves.
//!
//! Drag-move events arrive far faster than routing can keep up with. A
//! [`FrameThrottle`] collapses them to at most one recompute per interval,
//! and a [`RouteScheduler`] hands out [`CancelToken`]s so a recompute that a
//! newer event has superseded stops early.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::ScheduleConfig;

#[derive(Debug, Clone)]
pub struct CancelToken {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl CancelToken {
    /// A token nothing can cancel.
    pub fn never() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.generation
    }
}

#[derive(Debug, Default)]
pub struct RouteScheduler {
    current: Arc<AtomicU64>,
}

impl RouteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a request, cancelling every token issued before it.
    pub fn begin(&self) -> CancelToken {
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        CancelToken {
            current: Arc::clone(&self.current),
            generation,
        }
    }

    pub fn cancel_all(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last_run: Option<Instant>,
    pending: bool,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: false,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(Duration::from_millis(config.throttle_ms))
    }

    fn due(&self, now: Instant) -> bool {
        self.last_run
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Returns true when the event at `now` should recompute right away;
    /// otherwise it is remembered for [`FrameThrottle::flush`].
    pub fn on_event(&mut self, now: Instant) -> bool {
        if self.due(now) {
            self.last_run = Some(now);
            self.pending = false;
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Trailing edge: true once if an event was held back and the interval
    /// has passed.
    pub fn flush(&mut self, now: Instant) -> bool {
        if self.pending && self.due(now) {
            self.pending = false;
            self.last_run = Some(now);
            true
        } else {
            false
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }
}
