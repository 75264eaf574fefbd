//! # skrawl-server
//!
//! Server for a real-time multiplayer drawing-and-guessing game. Ties
//! together `skrawl-transport` (the game websocket), `skrawl-protocol`
//! (the wire format), `skrawl-session` (auth and reconnection), and
//! `skrawl-room` (game rooms and turn logic) behind a single
//! [`SkrawlServer`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use skrawl_server::{HttpAuthenticator, SkrawlServer};
//!
//! # async fn run() -> Result<(), skrawl_server::ServerError> {
//! let auth = HttpAuthenticator::new("https://identity.example.com", "service-key");
//! let server = SkrawlServer::builder()
//!     .bind("0.0.0.0:3001")
//!     .admin_bind("0.0.0.0:3002")
//!     .build(auth)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod admin;
mod auth;
mod error;
mod handler;
mod server;

pub use auth::HttpAuthenticator;
pub use error::ServerError;
pub use server::{SkrawlServer, SkrawlServerBuilder, PROTOCOL_VERSION};
