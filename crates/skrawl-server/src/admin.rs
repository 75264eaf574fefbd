//! Non-game HTTP control plane: `/health` and `/info`. CORS layer +
//! `axum::Router` wiring follows the `create_router`/`health_check` shape
//! used for signaling-server control planes in this style.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use serde::Serialize;

use skrawl_protocol::Codec;
use skrawl_session::Authenticator;

use crate::server::ServerState;

/// Builds the admin router: CORS + `/health` + `/info`. Kept separate from
/// the game-websocket listener (`WebSocketTransport` binds its own raw TCP
/// socket) — see DESIGN.md for why the two aren't merged onto one port.
pub fn build_admin_router<A, C>(
    allowed_origins: &str,
) -> axum::Router<Arc<ServerState<A, C>>>
where
    A: Authenticator,
    C: Codec,
{
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let cors = if allowed_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();
        if origins.is_empty() {
            tracing::warn!("no valid allowed_origins configured, falling back to permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
        }
    };

    axum::Router::new()
        .route("/health", get(health_check::<A, C>))
        .route("/info", get(info::<A, C>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    uptime_seconds: u64,
    connections: usize,
    memory_bytes: u64,
}

async fn health_check<A, C>(State(state): State<Arc<ServerState<A, C>>>) -> Json<HealthBody>
where
    A: Authenticator,
    C: Codec,
{
    Json(HealthBody {
        status: "ok",
        uptime_seconds: uptime_seconds(state.started_at),
        connections: state.connections.load(Ordering::Relaxed),
        memory_bytes: current_memory_bytes(),
    })
}

#[derive(Debug, Serialize)]
struct InfoBody {
    name: &'static str,
    protocol_version: u32,
}

async fn info<A, C>(State(_state): State<Arc<ServerState<A, C>>>) -> Json<InfoBody>
where
    A: Authenticator,
    C: Codec,
{
    Json(InfoBody {
        name: "skrawl-server",
        protocol_version: crate::server::PROTOCOL_VERSION,
    })
}

fn uptime_seconds(started_at: Instant) -> u64 {
    started_at.elapsed().as_secs()
}

/// Best-effort resident-set-size reading from `/proc/self/status` (Linux
/// only). Returns 0 on any failure rather than treating it as fatal — the
/// health endpoint should stay up even if this particular field can't be
/// read.
fn current_memory_bytes() -> u64 {
    let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
        return 0;
    };
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            if let Some(kb) = rest.split_whitespace().next() {
                if let Ok(kb) = kb.parse::<u64>() {
                    return kb * 1024;
                }
            }
        }
    }
    0
}
