//! Per-user authentication rate limiting: connection open is capped at ≤5
//! authentications/min/user; excess attempts are closed immediately with
//! `rate_limited`.
//!
//! A simple sliding window keyed by user id. We don't know the user id
//! until after the token is validated, so this is checked right after
//! [`Authenticator::authenticate`](crate::Authenticator::authenticate)
//! succeeds, not before — a flood of garbage tokens from an unauthenticated
//! source is rejected by `auth_failed` on its own merits, it never reaches
//! this limiter.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use skrawl_protocol::UserId;

/// Tracks recent authentication timestamps per user and rejects once the
/// per-minute budget is exhausted.
pub struct AuthRateLimiter {
    window: Duration,
    max_per_window: u32,
    attempts: HashMap<UserId, Vec<Instant>>,
}

impl AuthRateLimiter {
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            window: Duration::from_secs(60),
            max_per_window: max_per_minute,
            attempts: HashMap::new(),
        }
    }

    /// Records an authentication attempt for `user_id` at `now` and returns
    /// `Ok(())` if it's within budget, or `Err(retry_after_ms)` if the
    /// caller should be closed with `rate_limited`.
    pub fn check(&mut self, user_id: &UserId, now: Instant) -> Result<(), u64> {
        let history = self.attempts.entry(user_id.clone()).or_default();
        history.retain(|t| now.duration_since(*t) < self.window);

        if history.len() as u32 >= self.max_per_window {
            let oldest = history[0];
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Err(retry_after.as_millis() as u64);
        }

        history.push(now);
        Ok(())
    }

    /// Drops bookkeeping for users with no attempts in the last window,
    /// so memory doesn't grow unbounded for one-shot visitors.
    pub fn sweep(&mut self, now: Instant) {
        self.attempts
            .retain(|_, history| history.iter().any(|t| now.duration_since(*t) < self.window));
    }
}
