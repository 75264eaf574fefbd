//! Wire protocol for the skrawl game server.
//!
//! This crate defines the "language" that clients and servers speak:
//!
//! - **Envelope** ([`ClientEnvelope`], [`ServerEnvelope`], [`Channel`]) —
//!   the top-level message wrapper that travels on the wire.
//! - **System messages** ([`ClientSystemMessage`], [`ServerSystemMessage`])
//!   — connection lifecycle and room admission, independent of game state.
//! - **Game events** ([`ClientEvent`], [`ServerEvent`]) — the drawing/
//!   guessing game's own event catalogue.
//! - **Settings** ([`RoomSettings`], [`RoomSettingsPatch`]) — the room
//!   settings domain and its validation.
//! - **Snapshots** ([`RoomSnapshot`], [`TurnSnapshot`], [`PlayerSnapshot`],
//!   [`DrawOp`], ...) — the data shapes broadcast in those events.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`], [`ClientErrorCode`]) — what can go
//!   wrong during encoding/decoding/validation.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (player identity). It doesn't know about rooms or game rules — it only
//! knows how to serialize, deserialize, and validate messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session/Room (player, game context)
//! ```

mod codec;
mod envelope;
mod error;
mod events;
mod ids;
mod settings;
mod snapshot;
mod system;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use envelope::{Channel, ClientEnvelope, ClientPayload, ServerEnvelope, ServerPayload};
pub use error::{ClientErrorCode, ProtocolError};
pub use events::{ClientEvent, ServerEvent};
pub use ids::{InviteCode, RoomId, TurnId, UserId};
pub use settings::{Language, RoomSettings, RoomSettingsPatch, Visibility, WordMode};
pub use snapshot::{
    ConnectionState, DrawOp, GameResult, GuessResult, LobbyMessage, LobbyMessageKind,
    PlayerSnapshot, Point, RoomListEntry, RoomSnapshot, Tool, TurnEndReason, TurnResult,
    TurnSnapshot,
};
pub use system::{ClientSystemMessage, ServerSystemMessage};
