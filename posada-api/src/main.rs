use std::net::SocketAddr;

use anyhow::Context;
use posada_api::{app, AppState};
use posada_core::BookingEngine;
use posada_store::{app_config::Config, seed};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posada_api=debug,posada_core=debug,posada_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        require_known_hotel = config.engine.require_known_hotel,
        "Starting Posada API on port {}",
        config.server.port
    );

    let mut engine = BookingEngine::with_settings(config.engine.clone());
    seed::apply(&mut engine, &config.seed).context("Failed to apply seed data")?;

    let app = app(AppState::new(engine));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
