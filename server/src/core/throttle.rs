//! Failed-login throttle keyed by normalised email

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tracked emails above which expired entries are swept on the next failure
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Attempts {
    failures: u32,
    window_start: Instant,
}

/// Counts failed logins per email inside a sliding lockout window.
pub struct LoginThrottle {
    attempts: DashMap<String, Attempts>,
    max_failures: u32,
    lockout: Duration,
}

impl LoginThrottle {
    pub fn new(max_failures: u32, lockout: Duration) -> Self {
        Self {
            attempts: DashMap::new(),
            max_failures,
            lockout,
        }
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Returns the remaining lockout when the email is currently blocked
    pub fn check(&self, email: &str) -> Option<Duration> {
        self.check_at(email, Instant::now())
    }

    fn check_at(&self, email: &str, now: Instant) -> Option<Duration> {
        let key = Self::key(email);
        let entry = self.attempts.get(&key).map(|e| *e)?;
        let elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed >= self.lockout {
            self.attempts.remove(&key);
            return None;
        }
        if entry.failures >= self.max_failures {
            return Some(self.lockout - elapsed);
        }
        None
    }

    pub fn record_failure(&self, email: &str) {
        self.record_failure_at(email, Instant::now());
    }

    fn record_failure_at(&self, email: &str, now: Instant) {
        if self.attempts.len() >= PRUNE_THRESHOLD {
            self.prune_at(now);
        }
        let lockout = self.lockout;
        let mut entry = self.attempts.entry(Self::key(email)).or_insert(Attempts {
            failures: 0,
            window_start: now,
        });
        if now.saturating_duration_since(entry.window_start) >= lockout {
            *entry = Attempts { failures: 0, window_start: now };
        }
        entry.failures += 1;
        if entry.failures >= self.max_failures {
            warn!("Login locked for {} after {} failures", email, entry.failures);
        } else {
            debug!("Failed login {} of {}", entry.failures, self.max_failures);
        }
    }

    pub fn clear(&self, email: &str) {
        self.attempts.remove(&Self::key(email));
    }

    /// Drops every entry whose window has run out
    fn prune_at(&self, now: Instant) {
        let before = self.attempts.len();
        let lockout = self.lockout;
        self.attempts
            .retain(|_, a| now.saturating_duration_since(a.window_start) < lockout);
        debug!(
            "Pruned {} expired login entries",
            before.saturating_sub(self.attempts.len())
        );
    }
}
