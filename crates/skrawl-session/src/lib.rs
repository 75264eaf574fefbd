//! Player session management for the skrawl game server.
//!
//! This crate handles the lifecycle of player connections:
//!
//! 1. **Authentication** — validating who a player is against C1, the
//!    identity gateway ([`Authenticator`] trait)
//! 2. **Session tracking** — knowing who's connected ([`SessionManager`])
//! 3. **Reconnection** — letting players resume after brief disconnects
//!    (token-based, with a configurable disconnect-grace window)
//! 4. **Rate limiting** — capping authentications per user per minute
//!    ([`AuthRateLimiter`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← uses sessions to know which players are in which rooms
//!     ↕
//! Session Layer (this crate)  ← manages player identity and connection state
//!     ↕
//! Protocol Layer (below)  ← provides UserId, ClientSystemMessage types
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod manager;
mod rate_limit;
mod session;

pub use auth::{Authenticator, PlayerProfile};
pub use error::SessionError;
pub use manager::SessionManager;
pub use rate_limit::AuthRateLimiter;
pub use session::{Session, SessionConfig, SessionState};
