//! Server binary: reads configuration from the environment and runs
//! [`SkrawlServer`].

use skrawl_server::{HttpAuthenticator, SkrawlServer};

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u16(name: &str, default: u16) -> u16 {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let identity_url = std::env::var("SKRAWL_IDENTITY_URL")
        .map_err(|_| "SKRAWL_IDENTITY_URL must be set to the identity gateway's base URL")?;
    let identity_service_key = std::env::var("SKRAWL_IDENTITY_SERVICE_KEY")
        .map_err(|_| "SKRAWL_IDENTITY_SERVICE_KEY must be set")?;

    let port = env_u16("SKRAWL_PORT", 3001);
    let admin_port = env_u16("SKRAWL_ADMIN_PORT", port + 1);
    let heartbeat_interval_ms = env_u64("SKRAWL_HEARTBEAT_INTERVAL_MS", 25_000);
    let connection_timeout_ms = env_u64("SKRAWL_CONNECTION_TIMEOUT_MS", 20_000);
    let allowed_origins = std::env::var("SKRAWL_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let auth = HttpAuthenticator::new(identity_url, identity_service_key);

    let server = SkrawlServer::builder()
        .bind(&format!("0.0.0.0:{port}"))
        .admin_bind(&format!("0.0.0.0:{admin_port}"))
        .allowed_origins(&allowed_origins)
        .heartbeat_interval_ms(heartbeat_interval_ms)
        .connection_timeout(std::time::Duration::from_millis(connection_timeout_ms))
        .build(auth)
        .await?;

    tracing::info!(%port, %admin_port, "skrawl-server starting");
    server.run().await?;
    Ok(())
}
