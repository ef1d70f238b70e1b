use std::{fs, sync::Arc};

use anyhow::{Context, Result};
use movies_api::{
    BUNDLED_SEED, MovieSchema, MovieStore, build_router, config::AppConfig, state::AppState,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("failed to load application configuration")?;
    let schema = MovieSchema::default();

    let seed = match &config.seed_path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?,
        None => BUNDLED_SEED.to_string(),
    };
    let store = MovieStore::from_seed(&seed, &schema).context("failed to load seed movies")?;
    info!(movies = store.len(), max_year = schema.max_year(), "movie store seeded");

    let origins = config.allowed_origins.origins().collect::<Vec<_>>().join(", ");
    info!(%origins, "origin allow-list");

    let state = AppState::new(store, schema, Arc::new(config.allowed_origins.clone()));
    let app = build_router(state);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "movies api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("movies_api=debug,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                error!(error = %err, "Ctrl+C handler failed, waiting for SIGTERM");
                terminate().await;
            }
        }
        () = terminate() => {}
    }

    info!("shutdown signal received, draining connections");
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(err) => {
            error!(error = %err, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
