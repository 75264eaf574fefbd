//! Snapshot / payload types shared by the event catalogue and the room's
//! internal data model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{RoomId, UserId};
use crate::settings::{RoomSettings, Visibility};

/// Connection/grace state of a player, mirrored out to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Grace,
    Gone,
}

/// Public view of a player, as broadcast in room/turn snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_ref: String,
    pub connection_state: ConnectionState,
    pub is_drawer: bool,
    pub has_guessed_correctly: bool,
    pub score_game: u32,
    pub score_turn: u32,
}

/// A drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Pen,
    Eraser,
}

/// A point in the normalized `[0,1] x [0,1]` canvas plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// An opaque drawing operation appended to a turn's `CanvasLog`. The server
/// never interprets stroke content — it only orders, stores, and
/// re-broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawOp {
    Stroke {
        tool: Tool,
        /// `"#RRGGBB"`.
        color: String,
        /// 1–40.
        size: u8,
        points: Vec<Point>,
        user_id: UserId,
    },
    BucketFill {
        color: String,
        point: Point,
        user_id: UserId,
    },
    Clear,
    Undo,
}

/// A single chat or system message, also reused for in-game room chat once
/// `status` leaves `waiting`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyMessage {
    pub id: u64,
    /// `None` for system messages.
    pub sender_user_id: Option<UserId>,
    pub kind: LobbyMessageKind,
    pub text: String,
    pub ts_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyMessageKind {
    Chat,
    System,
}

/// Per-player outcome for one completed turn, ordered by guess order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessResult {
    pub user_id: UserId,
    pub guessed_correctly: bool,
    pub points: u32,
    pub guess_order: Option<u32>,
    pub elapsed_ms: Option<u64>,
}

/// Why a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnEndReason {
    TimeUp,
    AllGuessed,
    Skipped,
    DrawerLeft,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub drawer_id: UserId,
    pub word: String,
    pub guesses: Vec<GuessResult>,
    pub drawer_points: u32,
    pub elapsed_ms: u64,
    pub reason: TurnEndReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub winners: Vec<UserId>,
    pub final_scores: HashMap<UserId, u32>,
}

/// Snapshot of the current turn, sent on `turn_starting` and to late joiners
/// / reconnecting players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub turn_id: u64,
    pub round_index: u32,
    pub drawer_id: UserId,
    /// Underscore/space pattern; never the secret word itself for
    /// non-drawers.
    pub word_pattern: String,
    pub time_total_ms: u64,
    pub time_remaining_ms: u64,
    pub hints_revealed: Vec<(u32, char)>,
}

/// Full room snapshot sent on join/reconnect/round transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub visibility: Visibility,
    pub host_id: Option<UserId>,
    pub settings: RoomSettings,
    pub players: Vec<PlayerSnapshot>,
    pub status: String,
    pub round_index: u32,
    pub turn: Option<TurnSnapshot>,
}

/// A listing entry for `room_joined`/`list_rooms`-style discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    pub player_count: u32,
    pub max_players: u32,
    pub status: String,
}
