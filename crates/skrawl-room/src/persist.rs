//! Best-effort persistence hook for completed games. C2's `SessionStore` is
//! external; a write failure is logged, never surfaced to players. Mirrors
//! the `Authenticator` trait in `skrawl_session` — same shape, same reason:
//! the room shouldn't know or care how C2 is implemented.
//!
//! The record handed to C2 is normalized into a session with its
//! participants and rounds, rather than a single flat blob, so a relational
//! store can load it straight into three tables without reshaping it first.

use std::future::Future;
use std::pin::Pin;

use skrawl_protocol::{RoomId, RoomSettings, TurnEndReason, UserId};

/// One completed game, ready to load into `game_session` /
/// `game_participant` / `game_round` tables.
#[derive(Debug, Clone)]
pub struct GameSessionRecord {
    pub room_id: RoomId,
    pub host_id: Option<UserId>,
    /// `settings` serialized once at game start, not re-derived from the
    /// live (possibly since-changed) room settings.
    pub settings_json: String,
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    pub winners: Vec<UserId>,
    pub participants: Vec<GameParticipantRecord>,
    pub rounds: Vec<GameRoundRecord>,
}

/// One player's final standing in a completed game.
#[derive(Debug, Clone)]
pub struct GameParticipantRecord {
    pub user_id: UserId,
    pub display_name: String,
    pub final_score: u32,
    pub is_winner: bool,
}

/// One completed turn within a game, the unit C2 uses to reconstruct a
/// round-by-round replay.
#[derive(Debug, Clone)]
pub struct GameRoundRecord {
    pub round_index: u32,
    pub turn_id: u64,
    pub drawer_id: UserId,
    pub word: String,
    pub drawer_points: u32,
    pub guesser_count: u32,
    pub elapsed_ms: u64,
    pub reason: TurnEndReason,
}

/// Serializes `settings` once, at game start, so every round in the
/// session agrees on the settings that were actually in effect.
pub fn settings_json(settings: &RoomSettings) -> String {
    serde_json::to_string(settings).unwrap_or_default()
}

/// Persists a completed game's outcome. Implementations talk to whatever C2
/// actually is (a database, an HTTP stats service, ...); the room only needs
/// this much.
///
/// Boxes its own future rather than returning `impl Future` so the room can
/// hold this behind `Arc<dyn SessionStore>` — one store shared across every
/// room, picked once at server startup.
pub trait SessionStore: Send + Sync + 'static {
    fn record_game(
        &self,
        record: GameSessionRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>>;
}

/// The default when no C2 is wired up: discards the record. Used in tests
/// and as a safe fallback — losing stats is acceptable, losing gameplay
/// isn't, so a store write failure is logged and never surfaced to players.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionStore;

impl SessionStore for NoopSessionStore {
    fn record_game(
        &self,
        _record: GameSessionRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}
