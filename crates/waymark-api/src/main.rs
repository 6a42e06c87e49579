//! waymark-api - HTTP API server for waymark

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waymark_api::{app, AppState};
use waymark_core::{defaults, Error, Result};
use waymark_db::Database;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "waymark_api=info,waymark_db=info,waymark_inference=info,waymark_enrich=info,tower_http=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var(defaults::ENV_DATABASE_URL)
        .map_err(|_| Error::Config(format!("{} is not set", defaults::ENV_DATABASE_URL)))?;

    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let bind_addr = std::env::var(defaults::ENV_BIND_ADDR)
        .unwrap_or_else(|_| defaults::DEFAULT_BIND_ADDR.to_string());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        subsystem = "api",
        op = "startup",
        bind_addr = %bind_addr,
        "waymark API listening"
    );

    let state = AppState::new(db);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::Io)?;

    info!(subsystem = "api", op = "shutdown", "waymark API stopped");
    Ok(())
}

async fn shutdown_signal() {
    // SIGINT from a terminal or SIGTERM from an orchestrator.
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
