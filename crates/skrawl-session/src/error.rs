//! Error types for the session layer.

use skrawl_protocol::UserId;

/// Errors that can occur during session management.
///
/// These cover the full lifecycle of a player session: authentication,
/// creation, reconnection, and expiration.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity gateway rejected the token outright.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The identity gateway accepted the token but the profile it returned
    /// is missing a field the room layer requires (e.g. no display name).
    #[error("profile incomplete: {0}")]
    ProfileIncomplete(String),

    /// No session exists for the given player.
    /// This happens when trying to disconnect or reconnect a player
    /// who was never connected (or whose session already expired).
    #[error("session not found for player {0}")]
    NotFound(UserId),

    /// The reconnection token doesn't match what the server issued.
    /// Could be a stale token, a typo, or a malicious attempt.
    #[error("invalid reconnection token")]
    InvalidToken,

    /// The session's reconnection grace period has elapsed.
    /// The player took too long to reconnect after disconnecting.
    #[error("session expired for player {0}")]
    SessionExpired(UserId),

    /// The player already has an active (Connected) session.
    /// A player can only have one session at a time.
    #[error("player {0} already has an active session")]
    AlreadyConnected(UserId),

    /// More than 5 authentication attempts for this user within the last
    /// minute; the new connection is closed instead of being queued.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
}
