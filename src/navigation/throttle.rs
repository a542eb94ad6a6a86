// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Debouncing of rapid navigation requests

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Minimum spacing between accepted navigation actions
pub const DEFAULT_NAVIGATION_INTERVAL: Duration = Duration::from_millis(500);

/// Source of monotonic time
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to a throttler.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Start at an arbitrary fixed instant
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut offset = self
            .offset
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self
            .offset
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.origin + *offset
    }
}

/// Runs an action only if enough time has passed since the last accepted one
pub struct NavigationThrottler {
    interval: Duration,
    clock: Arc<dyn Clock>,
    last_accepted: Option<Instant>,
}

impl std::fmt::Debug for NavigationThrottler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationThrottler")
            .field("interval", &self.interval)
            .field("last_accepted", &self.last_accepted)
            .finish_non_exhaustive()
    }
}

impl Default for NavigationThrottler {
    fn default() -> Self {
        Self::new(DEFAULT_NAVIGATION_INTERVAL)
    }
}

impl NavigationThrottler {
    /// Throttler on the system clock
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Arc::new(SystemClock))
    }

    /// Throttler on an injected clock
    #[must_use]
    pub fn with_clock(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            clock,
            last_accepted: None,
        }
    }

    /// Configured interval
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `action` if the window since the last accepted action has elapsed.
    /// Returns `None` when the call was dropped.
    pub fn execute<R>(&mut self, action: impl FnOnce() -> R) -> Option<R> {
        let now = self.clock.now();
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.interval {
                tracing::trace!("navigation dropped by throttle");
                return None;
            }
        }
        self.last_accepted = Some(now);
        Some(action())
    }
}
