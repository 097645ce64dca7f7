use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use thermex_core::RecordStore;
use thermex_db::DbClient;
use thermex_weather::{OpenMeteoConfig, OpenMeteoSource};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Observability
    thermex_obs::init("thermexd");

    // Config
    let cfg = match thermex_config::AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error=%e, "failed to load config, using defaults");
            thermex_config::AppConfig::default()
        }
    };

    // Storage must be ready before anything is accepted
    let db_path = cfg.db_path();
    let db = DbClient::open(&db_path)
        .await
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db.initialize()
        .await
        .context("failed to initialize temperature_entries table")?;
    tracing::info!(path = %db_path.display(), "Connected to SQLite database");

    let (latitude, longitude) = cfg.weather_coordinate();
    let weather = OpenMeteoSource::new(OpenMeteoConfig {
        base_url: cfg.weather_base_url(),
        latitude,
        longitude,
        timezone: cfg.weather_timezone(),
        timeout: cfg.weather_timeout(),
    })
    .context("failed to build weather client")?;

    let (app, state) =
        thermex_server::build_app(Arc::new(db), Arc::new(weather), cfg.quiet_period())?;

    // Serial ingest is optional; HTTP keeps working without the device
    if let Some(device) = cfg.serial_device() {
        match thermex_server::start_serial_ingest(Arc::clone(&state), device.clone()).await {
            Ok(_handle) => tracing::info!(device = %device.display(), "Serial ingest started"),
            Err(e) => tracing::error!(error=?e, "failed to start serial ingest"),
        }
    }

    let addr: SocketAddr = cfg
        .http_bind()
        .parse()
        .context("invalid HTTP bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    // Mark ready just before serving
    thermex_server::set_ready(&state, true);

    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error=?e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
