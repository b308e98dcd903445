//! Per-identity sliding-window rate limiter.
//!
//! Each identity owns a window of admission timestamps, created lazily on
//! first sight. A single mutex guards the whole map, so evict-check-append
//! is atomic for every identity.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;
use veridian_config::ChatConfig;

pub struct RateLimiter {
    max_requests: usize,
    timeframe: TimeDelta,
    windows: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, timeframe: TimeDelta) -> Self {
        Self {
            max_requests,
            timeframe,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        let seconds = i64::try_from(config.timeframe_seconds).unwrap_or(i64::MAX);
        let timeframe = TimeDelta::try_seconds(seconds).unwrap_or(TimeDelta::MAX);
        Self::new(config.max_requests, timeframe)
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn timeframe(&self) -> TimeDelta {
        self.timeframe
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.timeframe)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Admit one request from `identity` at `now`. Returns `true` if allowed.
    ///
    /// Timestamps strictly older than `now - timeframe` are evicted first; a
    /// rejected request leaves the window untouched otherwise. The window
    /// stays sorted even when callers pass `now` out of order.
    pub fn admit(&self, identity: &str, now: DateTime<Utc>) -> bool {
        let cutoff = self.cutoff(now);
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = windows.entry(identity.to_string()).or_default();

        while window.front().is_some_and(|t| *t < cutoff) {
            window.pop_front();
        }

        if window.len() >= self.max_requests {
            debug!(identity, in_window = window.len(), "Request rejected by rate limiter");
            return false;
        }

        let slot = window.partition_point(|t| *t <= now);
        window.insert(slot, now);
        true
    }

    /// Number of identities currently holding a window.
    pub fn tracked_identities(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drop every identity whose whole window has expired at `now`.
    ///
    /// Returns how many identities were removed. Admission results are the
    /// same with or without sweeping.
    pub fn sweep_idle(&self, now: DateTime<Utc>) -> usize {
        let cutoff = self.cutoff(now);
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let before = windows.len();
        windows.retain(|_, window| window.back().is_some_and(|t| *t >= cutoff));
        let removed = before - windows.len();
        if removed > 0 {
            debug!(removed, remaining = windows.len(), "Swept idle rate-limit windows");
        }
        removed
    }
}
