//! charter-daemon binary.

use std::sync::Arc;

use charter_daemon::config::DaemonConfig;
use charter_daemon::{build_router, DaemonState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::new(format!("charter={}", config.logging.level)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Charter daemon starting");

    // 3. Open database
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let db_path = config.db_path();
    let conn = charter_db::open(&db_path)?;
    info!("Database ready at {:?}", db_path);

    // 4. Build state and router
    let addr = config.bind_addr()?;
    let state = Arc::new(DaemonState::new(conn, config));
    let bus = state.event_bus.clone();
    let app = build_router(state);

    // 5. Serve until Ctrl-C
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl-C received, shutting down");
            bus.shutdown();
        })
        .await?;

    info!("Daemon stopped");
    Ok(())
}
