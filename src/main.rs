use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use climate_assistant_api::app::{router, AppState};
use climate_assistant_api::config;
use climate_assistant_api::database::{DatabaseManager, PgStore};
use climate_assistant_api::is_production;

#[derive(Parser)]
#[command(name = "climate-assistant-api")]
#[command(about = "Climate Economy Assistant API server")]
#[command(version)]
struct Args {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides CEA_API_PORT / PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = config::config().clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if config.security.jwt_secret.is_empty() {
        if is_production!() {
            bail!("SUPABASE_JWT_SECRET must be set in production");
        }
        tracing::warn!("No JWT secret configured; authenticated routes will answer 500");
    }

    tracing::info!("Starting Climate Economy Assistant API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to create database pool")?;
    let store = Arc::new(PgStore::new(pool));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(store, Arc::new(config)).context("failed to build backend client")?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
