//! `SkrawlServer` builder and server loop.
//!
//! Ties together all the layers: transport → protocol → session → room.
//! The game-websocket accept loop is a plain `Transport::accept()` loop
//! spawning one task per connection; an axum router (`admin.rs`) runs
//! alongside it for the non-game HTTP control plane.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use skrawl_protocol::{Codec, JsonCodec};
use skrawl_room::RoomRegistry;
use skrawl_session::{Authenticator, SessionConfig, SessionManager};
use skrawl_transport::{Transport, WebSocketTransport};

use crate::admin::build_admin_router;
use crate::handler::handle_connection;
use crate::ServerError;

/// The current protocol version. Clients must send this in their handshake
/// or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task and to the
/// admin router.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) registry: RoomRegistry,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) started_at: Instant,
    pub(crate) connections: AtomicUsize,
    pub(crate) connection_timeout: Duration,
    pub(crate) heartbeat_interval_ms: u64,
}

/// Builder for configuring and starting a skrawl game server.
///
/// # Example
///
/// ```rust,ignore
/// let server = SkrawlServer::builder()
///     .bind("0.0.0.0:3001")
///     .admin_bind("0.0.0.0:3002")
///     .build(my_auth)
///     .await?;
/// server.run().await
/// ```
pub struct SkrawlServerBuilder {
    bind_addr: String,
    admin_bind_addr: String,
    allowed_origins: String,
    session_config: SessionConfig,
    connection_timeout: Duration,
    heartbeat_interval_ms: u64,
    idle_sweep_interval: Duration,
    idle_max: Duration,
}

impl SkrawlServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            admin_bind_addr: "127.0.0.1:3002".to_string(),
            allowed_origins: "*".to_string(),
            session_config: SessionConfig::default(),
            connection_timeout: Duration::from_millis(20_000),
            heartbeat_interval_ms: 25_000,
            idle_sweep_interval: skrawl_room::SWEEP_INTERVAL,
            idle_max: skrawl_room::IDLE_MAX,
        }
    }

    /// Address for the game websocket listener.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Address for the admin HTTP control plane (`/health`, `/info`).
    pub fn admin_bind(mut self, addr: &str) -> Self {
        self.admin_bind_addr = addr.to_string();
        self
    }

    /// Comma-separated CORS origins for the admin control plane.
    /// `"*"` is permissive.
    pub fn allowed_origins(mut self, origins: &str) -> Self {
        self.allowed_origins = origins.to_string();
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// How long a connection may sit idle before its receive loop times out.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sent in `mobile_hints` right after handshake.
    pub fn heartbeat_interval_ms(mut self, ms: u64) -> Self {
        self.heartbeat_interval_ms = ms;
        self
    }

    /// Builds and starts the server with the given authenticator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<SkrawlServer<A, JsonCodec>, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let registry = RoomRegistry::new();
        registry.spawn_idle_sweeper(self.idle_sweep_interval, self.idle_max);

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            registry,
            auth,
            codec: JsonCodec,
            started_at: Instant::now(),
            connections: AtomicUsize::new(0),
            connection_timeout: self.connection_timeout,
            heartbeat_interval_ms: self.heartbeat_interval_ms,
        });

        let admin_router = build_admin_router::<A, JsonCodec>(&self.allowed_origins).with_state(Arc::clone(&state));

        Ok(SkrawlServer {
            transport,
            state,
            admin_bind_addr: self.admin_bind_addr,
            admin_router,
        })
    }
}

impl Default for SkrawlServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running skrawl game server.
///
/// Call [`run()`](Self::run) to start accepting connections on both the
/// game-websocket port and the admin HTTP port.
pub struct SkrawlServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
    admin_bind_addr: String,
    admin_router: axum::Router<()>,
}

impl<A, C> SkrawlServer<A, C>
where
    A: Authenticator,
    C: Codec + Clone + 'static,
{
    pub fn builder() -> SkrawlServerBuilder {
        SkrawlServerBuilder::new()
    }

    /// Returns the local address the game websocket listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the game-websocket accept loop and the admin HTTP server
    /// concurrently. Runs until the process is terminated or either loop
    /// returns an error.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("skrawl server running");

        let admin_listener = tokio::net::TcpListener::bind(&self.admin_bind_addr)
            .await
            .map_err(|e| skrawl_transport::TransportError::AcceptFailed(e))?;
        let admin_addr = admin_listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| self.admin_bind_addr.clone());
        tracing::info!(addr = %admin_addr, "admin control plane listening");

        let admin_router = self.admin_router;
        let admin_task = tokio::spawn(async move {
            if let Err(e) = axum::serve(admin_listener, admin_router).await {
                tracing::error!(error = %e, "admin HTTP server exited");
            }
        });

        let accept_loop = async {
            loop {
                match self.transport.accept().await {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        state.connections.fetch_add(1, Ordering::Relaxed);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, Arc::clone(&state)).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                            state.connections.fetch_sub(1, Ordering::Relaxed);
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                }
            }
        };

        tokio::select! {
            _ = accept_loop => {}
            _ = admin_task => {}
        }

        Ok(())
    }
}
