//! Room lifecycle management: a single drawing-and-guessing game room run
//! as an isolated Tokio task, plus the process-wide registry that finds and
//! creates rooms for incoming players.
//!
//! Each room is an actor (see [`room`]) reached only through its
//! [`room::RoomHandle`] — no shared mutable state inside a room, just
//! message passing over an mpsc channel. The [`registry::RoomRegistry`] is
//! the one piece of state shared across rooms: two maps and a set behind a
//! lock, used only for admission and O(1) lookup, never for game state.

pub mod canvas;
pub mod error;
pub mod guess;
pub mod hints;
pub mod ids;
pub mod lobby;
pub mod persist;
pub mod player;
pub mod rate_limit;
pub mod registry;
pub mod room;
pub mod scoreboard;
pub mod turn;
pub mod words;

pub use error::RoomError;
pub use persist::{
    settings_json, GameParticipantRecord, GameRoundRecord, GameSessionRecord, NoopSessionStore,
    SessionStore,
};
pub use registry::{RoomRegistry, IDLE_MAX, SWEEP_INTERVAL};
pub use room::{
    spawn_room, PlayerSender, RoomCommand, RoomHandle, RoomOptions, DEFAULT_RECONNECT_GRACE,
    OUTBOUND_QUEUE_CAPACITY,
};
pub use turn::{RoomStatus, TurnState};
