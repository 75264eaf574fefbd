//! Per-connection handler: handshake, auth, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a second task forwarding the room's outbound events back to the
//! client over a bounded channel (see `skrawl_room::PlayerSender`). The
//! flow is:
//!   1. Receive `authenticate` → validate the token against C1.
//!   2. Send `authenticated` + `mobile_hints`.
//!   3. If the player already has a room (resuming after a drop), rejoin it.
//!   4. Loop: receive envelopes → dispatch system or game messages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use skrawl_protocol::{
    Channel, ClientEnvelope, ClientErrorCode, ClientEvent, ClientPayload, ClientSystemMessage,
    Codec, InviteCode, ProtocolError, ServerEnvelope, ServerPayload, ServerSystemMessage, UserId,
};
use skrawl_room::{PlayerSender, OUTBOUND_QUEUE_CAPACITY};
use skrawl_session::{Authenticator, PlayerProfile};
use skrawl_transport::{Connection, TransportError};

use crate::server::ServerState;
use crate::ServerError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const STROKE_BATCH_SUGGESTION: u32 = 8;
const COMPRESSION_LEVEL: u8 = 1;

/// Drop guard that tears down a player's session and room seat when the
/// handler exits, however it exits (clean close, timeout, panic). `Drop`
/// is synchronous, so cleanup is handed off to a fire-and-forget task.
struct SessionGuard<A: Authenticator, C: Codec> {
    user_id: UserId,
    state: Arc<ServerState<A, C>>,
}

impl<A: Authenticator, C: Codec> Drop for SessionGuard<A, C> {
    fn drop(&mut self) {
        let user_id = self.user_id.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            {
                let mut sessions = state.sessions.lock().await;
                let _ = sessions.disconnect(&user_id);
            }
            state.registry.disconnected(&user_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<Conn, A, C>(
    conn: Conn,
    state: Arc<ServerState<A, C>>,
) -> Result<(), ServerError>
where
    Conn: Connection<Error = TransportError>,
    A: Authenticator,
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let start = Instant::now();
    let seq = Arc::new(AtomicU64::new(0));

    tracing::debug!("handling new connection");

    let profile = perform_handshake(&conn, &state, &seq, &start).await?;
    let user_id = profile.user_id.clone();
    tracing::info!(%user_id, "player authenticated");

    {
        let mut sessions = state.sessions.lock().await;
        sessions.create(profile.clone()).map_err(ServerError::Session)?;
    }
    let _guard = SessionGuard { user_id: user_id.clone(), state: Arc::clone(&state) };

    let (tx, player_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let player_tx = PlayerSender::new(tx);

    // Resume into whatever room this player was already in: a fresh
    // authenticated connection bearing the same user_id before grace
    // expiry resumes the player.
    if let Some(handle) = state.registry.lookup(&user_id).await {
        match handle.join(profile.clone(), player_tx.clone()).await {
            Ok(snapshot) => {
                send_system(&conn, &state.codec, &seq, &start, ServerSystemMessage::RoomJoined { snapshot }).await?
            }
            Err(e) => send_error(&conn, &state.codec, &seq, &start, e.code(), &e.to_string()).await?,
        }
    }

    let forwarder = spawn_forwarder(Arc::clone(&conn), state.codec.clone(), Arc::clone(&seq), start, player_rx);

    let result = message_loop(&conn, &state, &profile, &player_tx, &seq, &start).await;
    forwarder.abort();
    result
}

/// Drains a player's outbound event channel and pushes each one to the
/// connection. Runs for the lifetime of the connection, alongside (not
/// inside) the inbound receive loop — the room actor never blocks on
/// connection I/O, and neither does this task; it only ever reads from
/// an already-produced channel.
fn spawn_forwarder<Conn, C>(
    conn: Arc<Conn>,
    codec: C,
    seq: Arc<AtomicU64>,
    start: Instant,
    mut player_rx: mpsc::Receiver<ServerPayload>,
) -> tokio::task::JoinHandle<()>
where
    Conn: Connection<Error = TransportError>,
    C: Codec,
{
    tokio::spawn(async move {
        while let Some(payload) = player_rx.recv().await {
            let envelope = ServerEnvelope {
                seq: next_seq(&seq),
                timestamp: start.elapsed().as_millis() as u64,
                channel: Channel::ReliableOrdered,
                payload,
            };
            let bytes = match codec.encode(&envelope) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!(error = %e, "failed to encode outbound event");
                    continue;
                }
            };
            if conn.send(&bytes).await.is_err() {
                break;
            }
        }
    })
}

/// Performs the initial handshake: receive `authenticate`, validate against
/// C1, send `authenticated` + `mobile_hints`.
async fn perform_handshake<Conn, A, C>(
    conn: &Conn,
    state: &Arc<ServerState<A, C>>,
    seq: &AtomicU64,
    start: &Instant,
) -> Result<PlayerProfile, ServerError>
where
    Conn: Connection<Error = TransportError>,
    A: Authenticator,
    C: Codec,
{
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ServerError::Protocol(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )));
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ServerError::Protocol(ProtocolError::InvalidMessage(
                "handshake timed out".into(),
            )));
        }
    };

    let envelope: ClientEnvelope = state.codec.decode(&data)?;

    let token = match envelope.payload {
        ClientPayload::System(ClientSystemMessage::Authenticate { token }) => token,
        _ => {
            send_error(conn, &state.codec, seq, start, ClientErrorCode::BadRequest, "expected authenticate").await?;
            return Err(ServerError::Protocol(ProtocolError::InvalidMessage(
                "first message must be authenticate".into(),
            )));
        }
    };

    let profile = match state.auth.authenticate(&token).await {
        Ok(profile) => profile,
        Err(e) => {
            send_system(
                conn,
                &state.codec,
                seq,
                start,
                ServerSystemMessage::Authenticated { ok: false, err: Some(e.to_string()) },
            )
            .await?;
            return Err(ServerError::Session(e));
        }
    };

    if let Err(e) = state.sessions.lock().await.check_auth_rate(&profile.user_id) {
        let retry_after_ms = match &e {
            skrawl_session::SessionError::RateLimited { retry_after_ms } => *retry_after_ms,
            _ => 0,
        };
        send_system(
            conn,
            &state.codec,
            seq,
            start,
            ServerSystemMessage::RateLimited { kind: "authenticate".to_string(), retry_after_ms },
        )
        .await?;
        return Err(ServerError::Session(e));
    }

    send_system(conn, &state.codec, seq, start, ServerSystemMessage::Authenticated { ok: true, err: None }).await?;
    send_system(
        conn,
        &state.codec,
        seq,
        start,
        ServerSystemMessage::MobileHints {
            heartbeat_interval_ms: state.heartbeat_interval_ms,
            stroke_batch_suggestion: STROKE_BATCH_SUGGESTION,
            compression_level: COMPRESSION_LEVEL,
        },
    )
    .await?;

    Ok(profile)
}

/// Receives and dispatches envelopes until the connection closes, times
/// out, or the client sends an explicit `disconnect`.
async fn message_loop<Conn, A, C>(
    conn: &Conn,
    state: &Arc<ServerState<A, C>>,
    profile: &PlayerProfile,
    player_tx: &PlayerSender,
    seq: &AtomicU64,
    start: &Instant,
) -> Result<(), ServerError>
where
    Conn: Connection<Error = TransportError>,
    A: Authenticator,
    C: Codec,
{
    let user_id = &profile.user_id;

    loop {
        let data = match tokio::time::timeout(state.connection_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%user_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%user_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%user_id, "connection timed out");
                break;
            }
        };

        let envelope: ClientEnvelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%user_id, error = %e, "failed to decode envelope");
                continue;
            }
        };

        match envelope.payload {
            ClientPayload::System(msg) => {
                let should_close = handle_system_message(conn, state, profile, msg, player_tx, seq, start).await?;
                if should_close {
                    break;
                }
            }
            ClientPayload::Game(event) => {
                handle_game_event(conn, state, user_id, event, seq, start).await?;
            }
        }
    }

    Ok(())
}

/// Handles a system message. Returns `true` if the connection should close.
async fn handle_system_message<Conn, A, C>(
    conn: &Conn,
    state: &Arc<ServerState<A, C>>,
    profile: &PlayerProfile,
    msg: ClientSystemMessage,
    player_tx: &PlayerSender,
    seq: &AtomicU64,
    start: &Instant,
) -> Result<bool, ServerError>
where
    Conn: Connection<Error = TransportError>,
    A: Authenticator,
    C: Codec,
{
    let user_id = &profile.user_id;

    match msg {
        ClientSystemMessage::Authenticate { .. } => {
            tracing::debug!(%user_id, "ignoring re-authentication on an already-authenticated connection");
        }

        ClientSystemMessage::JoinPublicGame => {
            match state.registry.join_public(profile.clone(), player_tx.clone()).await {
                Ok(snapshot) => {
                    send_system(conn, &state.codec, seq, start, ServerSystemMessage::RoomJoined { snapshot }).await?
                }
                Err(e) => send_error(conn, &state.codec, seq, start, e.code(), &e.to_string()).await?,
            }
        }

        ClientSystemMessage::CreatePrivateRoom { settings } => {
            match state.registry.create_private(profile.clone(), player_tx.clone(), settings).await {
                Ok((snapshot, invite_code)) => {
                    send_system(conn, &state.codec, seq, start, ServerSystemMessage::RoomCreated { snapshot, invite_code })
                        .await?
                }
                Err(e) => send_error(conn, &state.codec, seq, start, e.code(), &e.to_string()).await?,
            }
        }

        ClientSystemMessage::JoinPrivateRoom { code } => {
            let invite_code = InviteCode::new(code);
            match state.registry.join_private(profile.clone(), player_tx.clone(), &invite_code).await {
                Ok(snapshot) => {
                    send_system(conn, &state.codec, seq, start, ServerSystemMessage::RoomJoined { snapshot }).await?
                }
                Err(e) => send_error(conn, &state.codec, seq, start, e.code(), &e.to_string()).await?,
            }
        }

        ClientSystemMessage::LeaveRoom => {
            if let Err(e) = state.registry.leave(user_id).await {
                tracing::debug!(%user_id, error = %e, "leave room failed");
            }
        }

        ClientSystemMessage::Heartbeat { client_time } => {
            send_system(
                conn,
                &state.codec,
                seq,
                start,
                ServerSystemMessage::HeartbeatAck { client_time, server_time: start.elapsed().as_millis() as u64 },
            )
            .await?;
        }

        ClientSystemMessage::Disconnect { reason } => {
            tracing::info!(%user_id, %reason, "client disconnected");
            return Ok(true);
        }
    }

    Ok(false)
}

/// Routes a game event to the player's current room, if any.
async fn handle_game_event<Conn, A, C>(
    conn: &Conn,
    state: &Arc<ServerState<A, C>>,
    user_id: &UserId,
    event: ClientEvent,
    seq: &AtomicU64,
    start: &Instant,
) -> Result<(), ServerError>
where
    Conn: Connection<Error = TransportError>,
    A: Authenticator,
    C: Codec,
{
    let Some(handle) = state.registry.lookup(user_id).await else {
        send_error(conn, &state.codec, seq, start, ClientErrorCode::RoomNotFound, "not currently in a room").await?;
        return Ok(());
    };

    if let Err(e) = handle.send_event(user_id.clone(), event).await {
        send_error(conn, &state.codec, seq, start, e.code(), &e.to_string()).await?;
    }

    Ok(())
}

/// Sends a `ServerSystemMessage` envelope to the client.
async fn send_system<Conn, C>(
    conn: &Conn,
    codec: &C,
    seq: &AtomicU64,
    start: &Instant,
    msg: ServerSystemMessage,
) -> Result<(), ServerError>
where
    Conn: Connection<Error = TransportError>,
    C: Codec,
{
    let envelope = ServerEnvelope {
        seq: next_seq(seq),
        timestamp: start.elapsed().as_millis() as u64,
        channel: Channel::ReliableOrdered,
        payload: ServerPayload::System(msg),
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// Sends a `ServerSystemMessage::Error` envelope to the client.
async fn send_error<Conn, C>(
    conn: &Conn,
    codec: &C,
    seq: &AtomicU64,
    start: &Instant,
    code: ClientErrorCode,
    message: &str,
) -> Result<(), ServerError>
where
    Conn: Connection<Error = TransportError>,
    C: Codec,
{
    send_system(conn, codec, seq, start, ServerSystemMessage::Error { code, message: message.to_string() }).await
}

/// Increments and returns the next per-connection sequence number. Shared
/// (via `Arc<AtomicU64>`) between the inbound message loop and the
/// outbound forwarder task, since both produce envelopes on the same
/// connection.
fn next_seq(seq: &AtomicU64) -> u64 {
    seq.fetch_add(1, Ordering::Relaxed)
}
