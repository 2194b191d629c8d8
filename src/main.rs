use league_backend::api::{self, AppState};
use league_backend::config::Config;
use league_backend::store::{open_store, Gateway};

use tokio::signal;
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env file if present
    let dotenv = dotenvy::dotenv();

    let config = Config::from_env()?;

    // Console always, JSON file only when LOG_DIR is set
    let (file_layer, _guard) = match &config.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir).unwrap_or_else(|e| {
                eprintln!("Warning: Could not create log directory {}: {}", log_dir.display(), e);
            });
            let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "league-backend.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,league_backend=debug")),
        )
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    if let Err(e) = dotenv {
        debug!("No .env file loaded: {}", e);
    }
    if let Some(log_dir) = &config.log_dir {
        debug!("Logging to directory {}", log_dir.display());
    }

    let socket_addr = config.socket_addr()?;
    info!("Starting league backend on {}", socket_addr);
    info!("Store backend: {:?}", config.store_backend);
    if config.database_url.is_none() {
        warn!("DATABASE_URL not set, using connection settings from DB_* variables");
    }

    let store = open_store(&config).await?;
    let state = AppState::new(Gateway::new(store.clone()), &config);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&socket_addr).await?;
    info!("Server listening on {}", socket_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
