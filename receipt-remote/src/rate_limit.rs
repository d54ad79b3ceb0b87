//! Per-client sliding-window rate limiter.
//!
//! Keys are client identifiers (the first `x-forwarded-for` hop). Each key
//! keeps the instants of its admitted requests inside the window; denied
//! requests are not recorded. Idle keys are dropped by [`RateLimiter::evict_idle`].

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::RateLimitError;

pub const DEFAULT_MAX_REQUESTS: usize = 10;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    /// Keys idle for longer than this are evicted
    ttl: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    /// `ttl` shorter than `window` is raised to `window`, so eviction never
    /// forgets requests that still count.
    pub fn new(max_requests: usize, window: Duration, ttl: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            ttl: ttl.max(window),
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, identifier: &str) -> Result<(), RateLimitError> {
        self.check_at(identifier, Instant::now())
    }

    /// Admit or deny one request from `identifier` at `now`.
    pub fn check_at(&self, identifier: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut hits = self.hits.lock().unwrap_or_else(|p| p.into_inner());
        let q = hits.entry(identifier.to_string()).or_default();

        while let Some(&oldest) = q.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                q.pop_front();
            } else {
                break;
            }
        }

        if q.len() >= self.max_requests {
            let oldest = q.front().copied().unwrap_or(now);
            let retry_after = self
                .window
                .saturating_sub(now.saturating_duration_since(oldest));
            tracing::warn!(identifier, ?retry_after, "rate limit exceeded");
            return Err(RateLimitError {
                identifier: identifier.to_string(),
                retry_after,
            });
        }

        q.push_back(now);
        Ok(())
    }

    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    /// Drop keys whose latest request is older than the TTL. Returns how many.
    pub fn evict_idle_at(&self, now: Instant) -> usize {
        let mut hits = self.hits.lock().unwrap_or_else(|p| p.into_inner());
        let before = hits.len();
        hits.retain(|_, q| {
            q.back()
                .is_some_and(|&last| now.saturating_duration_since(last) < self.ttl)
        });
        let evicted = before - hits.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = hits.len(), "evicted idle rate-limit keys");
        }
        evicted
    }

    /// Number of tracked client identifiers.
    pub fn tracked_keys(&self) -> usize {
        self.hits.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
