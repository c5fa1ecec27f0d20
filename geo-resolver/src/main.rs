//! geo-resolver - address geocoding service
//!
//! Resolves address batches to coordinates through Nominatim, caching every
//! result in a shared store and optionally copying results into
//! project-local tables.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geo_common::db::SqliteStore;
use geo_resolver::cache::CacheScope;
use geo_resolver::services::{GeocodingService, NominatimClient};
use geo_resolver::AppState;

/// Command-line arguments for geo-resolver
#[derive(Parser, Debug)]
#[command(name = "geo-resolver")]
#[command(about = "Address geocoding service with a shared result cache")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "GEO_RESOLVER_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "GEO_RESOLVER_DATABASE")]
    database: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long, env = "GEO_RESOLVER_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = geo_common::config::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("geo_resolver={0},geo_common={0},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting geo-resolver");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let db_path = geo_common::config::resolve_database_path(args.database.as_deref(), &config);
    info!("Database: {}", db_path.display());

    let pool = geo_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    let store = Arc::new(SqliteStore::new(pool));

    let provider = Arc::new(
        NominatimClient::new(&config.geocoder).context("Failed to create geocoding client")?,
    );
    info!(
        url = %provider.search_url(),
        min_interval_ms = config.geocoder.min_interval_ms,
        "Geocoding provider configured"
    );

    let cache_scope = CacheScope(config.cache_scope());
    let geocoding = Arc::new(GeocodingService::new(
        store,
        provider,
        cache_scope,
        config.geocoder.min_interval(),
    ));

    let app = geo_resolver::build_router(AppState::new(geocoding, cache_scope));

    let bind = args
        .bind
        .unwrap_or_else(|| config.bind_address().to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
