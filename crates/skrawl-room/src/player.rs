//! A room's view of a single player.

use std::time::Instant;

use skrawl_protocol::{ConnectionState, PlayerSnapshot, UserId};
use skrawl_session::PlayerProfile;

/// A player seated in a room. `Player` owns the mutable, per-room fields
/// (scores, drawer/guess flags) layered on top of the identity/profile data
/// handed over by the session layer at join time.
#[derive(Debug, Clone)]
pub struct Player {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_ref: Option<String>,
    pub connection_state: ConnectionState,
    pub is_drawer: bool,
    pub has_guessed_correctly: bool,
    pub score_game: u32,
    pub score_turn: u32,
    pub last_activity: Instant,
    /// When host succession runs, `joined_at` (monotonic join order) breaks
    /// ties.
    pub joined_at: Instant,
}

impl Player {
    pub fn new(profile: PlayerProfile, now: Instant) -> Self {
        Self {
            user_id: profile.user_id,
            display_name: profile.display_name,
            avatar_ref: profile.avatar_ref,
            connection_state: ConnectionState::Connected,
            is_drawer: false,
            has_guessed_correctly: false,
            score_game: 0,
            score_turn: 0,
            last_activity: now,
            joined_at: now,
        }
    }

    /// Resets the per-turn fields; called at the start of every turn.
    /// `score_turn` resets at turn start, not at round/game start.
    pub fn reset_turn(&mut self) {
        self.is_drawer = false;
        self.has_guessed_correctly = false;
        self.score_turn = 0;
    }

    pub fn award(&mut self, points: u32) {
        self.score_turn = self.score_turn.saturating_add(points);
        self.score_game = self.score_game.saturating_add(points);
    }

    pub fn to_snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            user_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
            avatar_ref: self.avatar_ref.clone().unwrap_or_default(),
            connection_state: self.connection_state,
            is_drawer: self.is_drawer,
            has_guessed_correctly: self.has_guessed_correctly,
            score_game: self.score_game,
            score_turn: self.score_turn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> PlayerProfile {
        PlayerProfile {
            user_id: UserId::new(name),
            display_name: name.to_string(),
            avatar_ref: None,
        }
    }

    #[test]
    fn test_new_player_starts_connected_and_scoreless() {
        let p = Player::new(profile("alice"), Instant::now());
        assert_eq!(p.connection_state, ConnectionState::Connected);
        assert_eq!(p.score_game, 0);
        assert!(!p.is_drawer);
    }

    #[test]
    fn test_award_accumulates_both_turn_and_game_scores() {
        let mut p = Player::new(profile("alice"), Instant::now());
        p.award(500);
        p.award(300);
        assert_eq!(p.score_turn, 800);
        assert_eq!(p.score_game, 800);
    }

    #[test]
    fn test_reset_turn_clears_turn_score_but_not_game_score() {
        let mut p = Player::new(profile("alice"), Instant::now());
        p.award(500);
        p.is_drawer = true;
        p.has_guessed_correctly = true;

        p.reset_turn();

        assert_eq!(p.score_turn, 0);
        assert_eq!(p.score_game, 500);
        assert!(!p.is_drawer);
        assert!(!p.has_guessed_correctly);
    }

    #[test]
    fn test_to_snapshot_maps_avatar_none_to_empty_string() {
        let p = Player::new(profile("alice"), Instant::now());
        let snap = p.to_snapshot();
        assert_eq!(snap.avatar_ref, "");
    }
}
