//! Per-key sliding-window rate limiting.
//!
//! Guards unauthenticated public endpoints. The limiter is an
//! injected value behind the [`RateGate`] trait, not a process-wide
//! singleton, so a distributed implementation can replace the
//! in-memory one without touching call sites.
//!
//! Throttling must stay invisible to the remote party: tracking
//! endpoints keep returning their normal response and only the
//! analytics side effect is dropped.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

/// The outcome of a rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Throttled,
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// A per-key admission gate.
pub trait RateGate: Send + Sync {
    /// Check and record a request from `key`.
    fn check(&self, key: IpAddr) -> RateDecision;
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed per key within the window.
    pub max_requests: u32,
    /// Size of the sliding window.
    pub window: Duration,
    /// Hard cap on distinct keys tracked. At capacity, requests from
    /// unseen keys are throttled (fail closed) after a cleanup
    /// attempt.
    pub max_tracked_keys: usize,
    /// Run cleanup every N checks.
    pub cleanup_interval: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
            max_tracked_keys: 10_000,
            cleanup_interval: 100,
        }
    }
}

/// In-memory sliding-window limiter. Timestamps are pruned lazily per
/// key on each check; contention stays per-key through the sharded
/// map plus a short-lived mutex on the key's window.
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    windows: DashMap<IpAddr, Mutex<Vec<Instant>>>,
    check_count: AtomicU64,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
            check_count: AtomicU64::new(0),
        }
    }

    fn check_at(&self, key: IpAddr, now: Instant) -> RateDecision {
        let count = self.check_count.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.cleanup_interval > 0 && count % self.config.cleanup_interval == 0 {
            self.cleanup(now);
        }

        if !self.windows.contains_key(&key) && self.windows.len() >= self.config.max_tracked_keys {
            self.cleanup(now);
            if self.windows.len() >= self.config.max_tracked_keys {
                tracing::warn!(%key, "rate limiter key table full; throttling unseen key");
                return RateDecision::Throttled;
            }
        }

        let entry = self.windows.entry(key).or_insert_with(|| Mutex::new(Vec::new()));
        let mut timestamps = entry.lock();

        let cutoff = now.checked_sub(self.config.window);
        timestamps.retain(|&t| match cutoff {
            Some(cutoff) => t > cutoff,
            None => true,
        });

        if timestamps.len() < self.config.max_requests as usize {
            timestamps.push(now);
            RateDecision::Allowed
        } else {
            RateDecision::Throttled
        }
    }

    /// Drop keys whose every timestamp has aged out of the window.
    fn cleanup(&self, now: Instant) {
        let window = self.config.window;
        self.windows.retain(|_, timestamps| {
            let timestamps = timestamps.lock();
            timestamps
                .iter()
                .any(|&t| now.checked_sub(window).is_none_or(|cutoff| t > cutoff))
        });
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

impl RateGate for SlidingWindowLimiter {
    fn check(&self, key: IpAddr) -> RateDecision {
        self.check_at(key, Instant::now())
    }
}
