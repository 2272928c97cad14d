//! Voyage API server binary

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use voyage_api::{AppState, build_router};
use voyage_common::{DEFAULT_TRACE_CAPACITY, ServerConfig, VoyageConfig};

/// Command-line arguments for the Voyage API server
#[derive(Parser, Debug)]
#[clap(name = "voyage-api", about = "HTTP API for the Voyage travel agent")]
struct Args {
    /// Host to bind to
    #[clap(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[clap(short, long, default_value = "8000")]
    port: u16,

    /// Initial model (display name or key)
    #[clap(short, long)]
    model: Option<String>,

    /// Number of recent traces kept for /api/traces and /api/usage
    #[clap(long, default_value_t = DEFAULT_TRACE_CAPACITY)]
    trace_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Voyage API server...");

    let config = VoyageConfig::from_env()
        .with_initial_model(args.model)
        .with_trace_capacity(args.trace_capacity);
    info!("API keys: {:?}", config.keys);

    let state = AppState::from_config(&config)?;

    let server_config = ServerConfig {
        host: args.host,
        port: args.port,
        ..ServerConfig::default()
    };
    let app = build_router(state, &server_config);

    let addr = server_config.bind_addr();
    info!("Binding to address: {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
