//! Framework-level messages: connection lifecycle, room admission, errors.
//!
//! These are not game events (those live in `events.rs`) — they're the
//! plumbing every connection goes through regardless of what game state it
//! is in, keeping a `SystemMessage` split between framework and
//! game-specific traffic.

use serde::{Deserialize, Serialize};

use crate::error::ClientErrorCode;
use crate::ids::{InviteCode, UserId};
use crate::settings::RoomSettingsPatch;
use crate::snapshot::{RoomListEntry, RoomSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientSystemMessage {
    /// "Hello, here's my bearer token." Carried as `auth.token`.
    Authenticate { token: String },

    /// Join any open public room, or create one.
    JoinPublicGame,

    /// Create a new private room as host.
    CreatePrivateRoom { settings: RoomSettingsPatch },

    /// Join a private room by invite code.
    JoinPrivateRoom { code: String },

    LeaveRoom,

    Heartbeat { client_time: u64 },

    Disconnect { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerSystemMessage {
    Authenticated {
        ok: bool,
        err: Option<String>,
    },

    RoomJoined {
        snapshot: RoomSnapshot,
    },

    RoomCreated {
        snapshot: RoomSnapshot,
        invite_code: InviteCode,
    },

    RoomList {
        rooms: Vec<RoomListEntry>,
    },

    PlayerJoined {
        user_id: UserId,
        display_name: String,
    },

    PlayerLeft {
        user_id: UserId,
        reason: String,
    },

    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    /// Initial tuning hints sent right after a successful handshake, telling
    /// the client how often to heartbeat and how to batch its own strokes.
    MobileHints {
        heartbeat_interval_ms: u64,
        stroke_batch_suggestion: u32,
        compression_level: u8,
    },

    Error {
        code: ClientErrorCode,
        message: String,
    },

    RateLimited {
        kind: String,
        retry_after_ms: u64,
    },
}
