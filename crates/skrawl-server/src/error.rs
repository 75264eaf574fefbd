//! Unified error type for the skrawl game server.

use skrawl_protocol::ProtocolError;
use skrawl_room::RoomError;
use skrawl_session::SessionError;
use skrawl_transport::TransportError;

/// Top-level error wrapping all crate-specific errors so the server binary
/// deals with one type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls, so
/// the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, reconnect, expired).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),
}
