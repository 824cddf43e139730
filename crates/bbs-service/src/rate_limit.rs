//! Fixed-window rate limiting
//!
//! Per-key counters over a fixed window, checked on the hot path without
//! locks beyond the map shard. A background task reclaims expired entries
//! so the key space does not grow without bound.

use bbs_common::RateLimitRule;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A single key's counter window
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// Fixed-window counter store
///
/// `check` is the consuming operation: it increments on success and leaves
/// the counter untouched when the window is already full. Expired windows
/// roll over lazily on first touch, so a key that sits idle past its window
/// starts clean without waiting for reclamation.
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,

    /// Maximum permitted operations per window
    max: u32,

    /// Window length
    window: Duration,

    /// Reclamation tick interval
    reclaim_interval: Duration,

    /// Whether the reclamation task is running
    running: Arc<AtomicBool>,
}

impl RateLimiter {
    /// Create a limiter from a configured rule
    #[must_use]
    pub fn new(rule: &RateLimitRule) -> Self {
        Self::with_limits(rule.max, Duration::from_secs(rule.window_secs))
    }

    /// Create a limiter with explicit limits
    #[must_use]
    pub fn with_limits(max: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max,
            window,
            reclaim_interval: window.max(Duration::from_secs(1)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a limiter wrapped in Arc
    #[must_use]
    pub fn new_shared(rule: &RateLimitRule) -> Arc<Self> {
        Arc::new(Self::new(rule))
    }

    /// Record one operation against the key, reporting whether it is allowed
    ///
    /// Denied calls do not consume from the window.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut allowed = true;

        self.entries
            .entry(key.to_string())
            .and_modify(|entry| {
                if now.duration_since(entry.window_start) >= self.window {
                    entry.count = 1;
                    entry.window_start = now;
                } else if entry.count < self.max {
                    entry.count += 1;
                } else {
                    allowed = false;
                }
            })
            .or_insert(WindowEntry {
                count: 1,
                window_start: now,
            });

        if !allowed {
            tracing::debug!(key, max = self.max, "Rate limit exceeded");
        }

        allowed
    }

    /// Operations left in the key's current window
    pub fn remaining(&self, key: &str) -> u32 {
        match self.entries.get(key) {
            Some(entry) if entry.window_start.elapsed() < self.window => {
                self.max.saturating_sub(entry.count)
            }
            _ => self.max,
        }
    }

    /// Seconds until the key's window rolls over
    ///
    /// Returns 0 for unknown keys and keys whose window has already expired.
    pub fn reset_in_seconds(&self, key: &str) -> u64 {
        match self.entries.get(key) {
            Some(entry) => {
                let elapsed = entry.window_start.elapsed();
                if elapsed >= self.window {
                    0
                } else {
                    let left = self.window - elapsed;
                    // round up so callers never retry a second early
                    left.as_secs() + u64::from(left.subsec_nanos() > 0)
                }
            }
            None => 0,
        }
    }

    /// Drop a key's counter entirely
    pub fn reset(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove every entry whose window has expired
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.window_start.elapsed() < self.window);
        before - self.entries.len()
    }

    /// Number of tracked keys
    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }

    /// Start the background reclamation task
    pub fn start_reclaimer(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Rate limit reclaimer is already running");
            return;
        }

        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(limiter.reclaim_interval);
            tick.tick().await;

            while limiter.running.load(Ordering::SeqCst) {
                tick.tick().await;
                if !limiter.running.load(Ordering::SeqCst) {
                    break;
                }

                let purged = limiter.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Rate limit entries reclaimed");
                }
            }

            tracing::info!("Rate limit reclaimer stopped");
        });
    }

    /// Stop the reclamation task
    pub fn stop_reclaimer(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max", &self.max)
            .field("window", &self.window)
            .field("tracked_keys", &self.entries.len())
            .finish()
    }
}
