//! Authentication hook for validating player identity against C1.
//!
//! This crate doesn't implement the identity gateway itself — that's an
//! external system, C1. Instead it defines the
//! [`Authenticator`] trait: a single async method that takes a bearer token
//! and returns a [`PlayerProfile`] or an error. You implement this trait
//! with a call to your identity gateway, and the connection manager calls
//! it during the handshake.
//!
//! # Why a trait?
//!
//! A trait is like an interface in other languages — it defines WHAT
//! something can do without specifying HOW. This lets us:
//! - Call the real identity gateway in production
//! - Use a simple "accept everyone" authenticator in development
//! - Use a mock authenticator in tests
//!
//! All without changing any framework code.

use skrawl_protocol::UserId;

use crate::SessionError;

/// The identity and display profile C1 returns on a successful handshake,
/// attaching a stable `user_id` and a display snapshot to the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

/// Validates a client's auth token against C1 and returns their profile.
///
/// # Trait bounds
///
/// - `Send + Sync` → the authenticator can be shared across async tasks
///   (Tokio may call it from different threads simultaneously).
/// - `'static` → it doesn't borrow temporary data. This is required
///   because the authenticator lives as long as the server.
///
/// # Example
///
/// ```rust
/// use skrawl_session::{Authenticator, PlayerProfile, SessionError};
/// use skrawl_protocol::UserId;
///
/// /// Accepts any non-empty token and uses it as the user id.
/// /// Only for development — never use this in production!
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(
///         &self,
///         token: &str,
///     ) -> Result<PlayerProfile, SessionError> {
///         if token.is_empty() {
///             return Err(SessionError::AuthFailed("empty token".into()));
///         }
///         Ok(PlayerProfile {
///             user_id: UserId::new(token),
///             display_name: format!("player-{token}"),
///             avatar_ref: None,
///         })
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given token against C1 and returns the player's
    /// profile.
    ///
    /// Called during the handshake when a client sends a
    /// [`ClientSystemMessage::Authenticate`](skrawl_protocol::ClientSystemMessage::Authenticate)
    /// with a bearer token.
    ///
    /// # Returns
    /// - `Ok(PlayerProfile)` — authentication succeeded
    /// - `Err(SessionError::AuthFailed)` — token is invalid/expired
    /// - `Err(SessionError::ProfileIncomplete)` — token is valid but C1's
    ///   profile is missing required fields
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerProfile, SessionError>> + Send;
}
