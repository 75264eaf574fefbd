//! The session manager: tracks all active player sessions.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Creating sessions when players authenticate against C1
//! - Tracking which players are connected/disconnected
//! - Validating reconnection tokens
//! - Expiring sessions after the disconnect-grace window
//! - Cleaning up dead sessions to free memory
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. This is intentional: the session
//! manager is owned by a single task (the server's accept loop) and
//! accessed through a channel or mutex at a higher level.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use skrawl_protocol::UserId;

use crate::rate_limit::AuthRateLimiter;
use crate::{PlayerProfile, Session, SessionConfig, SessionError, SessionState};

/// Manages all active player sessions.
///
/// ## Lifecycle
///
/// ```text
/// authenticate() ──→ create() ──→ disconnect() ──→ reconnect()
///                       │               │                │
///                       │               ▼                │
///                       │          expire_stale()        │
///                       │               │                │
///                       ▼               ▼                ▼
///                    [Connected]   [Disconnected]   [Connected]
///                                      │
///                                      ▼ (after grace period)
///                                  [Expired] ──→ cleanup()
/// ```
pub struct SessionManager {
    /// All active sessions, keyed by user id. A player can only have one
    /// session at a time.
    sessions: HashMap<UserId, Session>,

    /// An index from reconnection tokens to user ids.
    ///
    /// When a client reconnects, they send a token (not a user id). This
    /// map lets us quickly find which session the token belongs to without
    /// scanning every session. It's kept in sync with `sessions`.
    tokens: HashMap<String, UserId>,

    /// Configuration (grace period, auth rate limit).
    config: SessionConfig,

    /// Per-user sliding window over recent authentications.
    auth_limiter: AuthRateLimiter,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        let auth_limiter = AuthRateLimiter::new(config.max_auths_per_minute);
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            config,
            auth_limiter,
        }
    }

    /// Checks `user_id` against the per-minute authentication budget.
    ///
    /// Call this right after a token validates, before [`Self::create`].
    /// A flood of garbage tokens from an unauthenticated source never
    /// reaches this limiter — it's rejected on the token check alone.
    ///
    /// # Errors
    /// Returns [`SessionError::RateLimited`] with the wait time if the
    /// user has exceeded `max_auths_per_minute` authentications in the
    /// last rolling minute.
    pub fn check_auth_rate(&mut self, user_id: &UserId) -> Result<(), SessionError> {
        self.auth_limiter
            .check(user_id, Instant::now())
            .map_err(|retry_after_ms| SessionError::RateLimited { retry_after_ms })
    }

    /// Creates a new session for a player after a successful handshake
    /// against C1.
    ///
    /// Generates a random reconnection token and stores the session.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyConnected`] if the player already
    /// has an active (Connected) session.
    pub fn create(&mut self, profile: PlayerProfile) -> Result<&Session, SessionError> {
        let user_id = profile.user_id.clone();

        if let Some(existing) = self.sessions.get(&user_id) {
            if matches!(existing.state, SessionState::Connected) {
                return Err(SessionError::AlreadyConnected(user_id));
            }
            // If they have a disconnected/expired session, remove the
            // old token before creating a new session.
            self.tokens.remove(&existing.reconnect_token);
        }

        let token = generate_token();

        let session = Session {
            user_id: user_id.clone(),
            profile,
            state: SessionState::Connected,
            reconnect_token: token.clone(),
        };

        self.tokens.insert(token, user_id.clone());
        self.sessions.insert(user_id.clone(), session);

        tracing::info!(%user_id, "session created");

        Ok(self.sessions.get(&user_id).expect("just inserted"))
    }

    /// Marks a player as disconnected. Starts the reconnection grace period.
    ///
    /// The player's session isn't destroyed yet — they have
    /// `config.reconnect_grace_secs` to reconnect with their token.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session exists.
    pub fn disconnect(&mut self, user_id: &UserId) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(user_id)
            .ok_or_else(|| SessionError::NotFound(user_id.clone()))?;

        session.state = SessionState::Disconnected {
            since: Instant::now(),
        };

        tracing::info!(%user_id, "player disconnected, grace period started");
        Ok(())
    }

    /// Reconnects a player using their reconnection token.
    ///
    /// The client sends the token it received during the initial handshake.
    /// If the token is valid and the session hasn't expired, the session
    /// transitions back to Connected.
    ///
    /// # Errors
    /// - [`SessionError::InvalidToken`] — token not recognized
    /// - [`SessionError::SessionExpired`] — grace period elapsed
    pub fn reconnect(&mut self, token: &str) -> Result<&Session, SessionError> {
        let user_id = self
            .tokens
            .get(token)
            .cloned()
            .ok_or(SessionError::InvalidToken)?;

        let session = self
            .sessions
            .get_mut(&user_id)
            .ok_or(SessionError::InvalidToken)?;

        match &session.state {
            SessionState::Disconnected { since } => {
                let grace = Duration::from_secs(self.config.reconnect_grace_secs);
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    return Err(SessionError::SessionExpired(user_id));
                }
                session.state = SessionState::Connected;
                tracing::info!(%user_id, "player reconnected");
                Ok(self.sessions.get(&user_id).expect("just modified"))
            }
            SessionState::Connected => Err(SessionError::AlreadyConnected(user_id)),
            SessionState::Expired => Err(SessionError::SessionExpired(user_id)),
        }
    }

    /// Scans all sessions and expires any that have exceeded the grace period.
    ///
    /// Call this periodically (e.g., every few seconds) to clean up
    /// disconnected players who didn't reconnect in time.
    ///
    /// Returns the user ids that were expired.
    pub fn expire_stale(&mut self) -> Vec<UserId> {
        let grace = Duration::from_secs(self.config.reconnect_grace_secs);
        let mut expired = Vec::new();

        for session in self.sessions.values_mut() {
            if let SessionState::Disconnected { since } = &session.state {
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    expired.push(session.user_id.clone());
                    tracing::info!(
                        user_id = %session.user_id,
                        "session expired (grace period elapsed)"
                    );
                }
            }
        }

        expired
    }

    /// Removes all expired sessions, freeing memory.
    ///
    /// Call this after `expire_stale()` so higher layers can react to
    /// expirations (e.g., notify the room the player is gone for good)
    /// before the data is deleted.
    pub fn cleanup_expired(&mut self) {
        self.sessions.retain(|_, session| {
            if matches!(session.state, SessionState::Expired) {
                self.tokens.remove(&session.reconnect_token);
                false
            } else {
                true
            }
        });
    }

    /// Looks up a session by user id.
    pub fn get(&self, user_id: &UserId) -> Option<&Session> {
        self.sessions.get(user_id)
    }

    /// Returns the number of active sessions (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Generates a random 32-character hex string (128 bits of entropy) to use
/// as a reconnection token.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
