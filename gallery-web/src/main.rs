mod config;
mod error;
mod handlers;
mod middleware;
mod routes;
mod state;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::WebConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables take precedence
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery_web=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WebConfig::parse();

    // One store client for the whole process
    let state = AppState::new(&config).await?;
    tracing::info!(
        "Serving bucket {} ({} access codes, video {})",
        config.bucket,
        state.gate.len(),
        if state.listing.include_video { "on" } else { "off" }
    );

    let app = routes::router(state, &config.cors_origins);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gallery web server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
