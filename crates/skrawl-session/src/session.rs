//! Session types: the data structures that represent a player's connection.
//!
//! A "session" is the server's record of a connected player. It tracks:
//! - WHO the player is (`UserId`) and their profile snapshot
//! - WHAT state they're in (connected, disconnected, expired)
//! - HOW they can reconnect (a secret token)
//! - WHEN they disconnected (so we know when to expire them)

use std::time::Instant;

use skrawl_protocol::UserId;

use crate::auth::PlayerProfile;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
///
/// This controls timeouts and limits. Game developers can customize these
/// when setting up the server. Sensible defaults are provided.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long (in seconds) a disconnected player has to reconnect
    /// before their session is permanently expired.
    ///
    /// Default: 120 seconds, the disconnect-grace window.
    pub reconnect_grace_secs: u64,

    /// Max authentications accepted per user within a rolling minute
    /// before new connections are closed with `rate_limited`.
    pub max_auths_per_minute: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace_secs: 120,
            max_auths_per_minute: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The current state of a player's session.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(timeout)──→ Expired
///       ↑                            │
///       └────────(reconnect)─────────┘
/// ```
///
/// - **Connected**: Player is actively connected and can send/receive.
/// - **Disconnected**: Player lost connection but may come back. `since`
///   records when they disconnected, so we can check the grace period.
/// - **Expired**: Grace period elapsed. The player must authenticate again.
#[derive(Debug, Clone)]
pub enum SessionState {
    Connected,
    Disconnected { since: Instant },
    Expired,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single player's session on the server.
///
/// Created when a player successfully authenticates against C1 (the
/// identity gateway). Lives until the player disconnects and the grace
/// period expires (or the server shuts down).
#[derive(Debug, Clone)]
pub struct Session {
    /// Which player this session belongs to.
    pub user_id: UserId,

    /// The profile snapshot attached at handshake time: `user_id` plus a
    /// profile snapshot. Cached here so a resumed connection doesn't need
    /// to re-query the identity gateway.
    pub profile: PlayerProfile,

    /// Current lifecycle state (connected, disconnected, or expired).
    pub state: SessionState,

    /// A secret token the player can use to reconnect after a disconnect.
    ///
    /// The token is a 32-character hex string (128 bits of randomness).
    pub reconnect_token: String,
}
