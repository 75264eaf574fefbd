//! Per-player message rate limiting inside a room: chat/guess ≤3 msgs/10s
//! per player with a 5s cooldown on excess; draw ops ≤120/s.
//!
//! Distinct from `skrawl_session::AuthRateLimiter`, which guards connection
//! setup rather than in-room traffic.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use skrawl_protocol::UserId;

/// A sliding-window limiter with an explicit cooldown applied once a
/// player goes over budget, so a burst doesn't immediately become
/// eligible again the instant the window slides.
pub struct SlidingWindowLimiter {
    window: Duration,
    max_per_window: u32,
    cooldown: Duration,
    history: HashMap<UserId, Vec<Instant>>,
    cooldown_until: HashMap<UserId, Instant>,
}

impl SlidingWindowLimiter {
    pub fn new(max_per_window: u32, window: Duration, cooldown: Duration) -> Self {
        Self {
            window,
            max_per_window,
            cooldown,
            history: HashMap::new(),
            cooldown_until: HashMap::new(),
        }
    }

    /// Returns `Ok(())` if `user_id` may send now, recording the attempt.
    /// Returns `Err(retry_after)` otherwise, without recording it.
    pub fn check(&mut self, user_id: &UserId, now: Instant) -> Result<(), Duration> {
        if let Some(&until) = self.cooldown_until.get(user_id) {
            if now < until {
                return Err(until - now);
            }
        }

        let entry = self.history.entry(user_id.clone()).or_default();
        entry.retain(|&t| now.saturating_duration_since(t) < self.window);

        if entry.len() as u32 >= self.max_per_window {
            self.cooldown_until.insert(user_id.clone(), now + self.cooldown);
            return Err(self.cooldown);
        }

        entry.push(now);
        Ok(())
    }

    pub fn remove(&mut self, user_id: &UserId) {
        self.history.remove(user_id);
        self.cooldown_until.remove(user_id);
    }
}
