//! Round scoring for guessers and the drawer.

use std::collections::HashMap;

use skrawl_protocol::UserId;

/// Ceiling awarded to the fastest correct guesser.
pub const P_MAX: f64 = 1000.0;
/// Floor awarded to any correct guesser, however late.
pub const P_MIN: f64 = 200.0;

/// Points for a guesser who answered correctly at `elapsed_ms` of
/// `total_ms`: `round(max(P_min, P_max * (1 - t/T)))`.
pub fn guesser_points(elapsed_ms: u64, total_ms: u64) -> u32 {
    if total_ms == 0 {
        return P_MIN.round() as u32;
    }
    let t = (elapsed_ms as f64 / total_ms as f64).clamp(0.0, 1.0);
    let raw = P_MAX * (1.0 - t);
    raw.max(P_MIN).round() as u32
}

/// Points for the drawer, given how many of the `other_players` guessed
/// correctly (`g`) and the mean of those guessers' points:
/// `round(mean(guesser_points) * g / (|players| - 1))`, `0` if `g == 0`.
pub fn drawer_points(guesser_point_values: &[u32], other_player_count: usize) -> u32 {
    let g = guesser_point_values.len();
    if g == 0 || other_player_count == 0 {
        return 0;
    }
    let mean = guesser_point_values.iter().sum::<u32>() as f64 / g as f64;
    (mean * g as f64 / other_player_count as f64).round() as u32
}

/// Tracks cumulative `score_game` across the whole match and computes the
/// winner set at game end.
#[derive(Debug, Default)]
pub struct Scoreboard {
    totals: HashMap<UserId, u32>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, user_id: &UserId, points: u32) {
        *self.totals.entry(user_id.clone()).or_insert(0) += points;
    }

    pub fn total(&self, user_id: &UserId) -> u32 {
        self.totals.get(user_id).copied().unwrap_or(0)
    }

    pub fn totals(&self) -> &HashMap<UserId, u32> {
        &self.totals
    }

    /// Every player tied for the highest cumulative score. A single-player
    /// room trivially "wins" against itself.
    pub fn winners(&self) -> Vec<UserId> {
        let Some(&max) = self.totals.values().max() else {
            return Vec::new();
        };
        let mut winners: Vec<UserId> = self
            .totals
            .iter()
            .filter(|(_, &score)| score == max)
            .map(|(id, _)| id.clone())
            .collect();
        winners.sort();
        winners
    }
}
