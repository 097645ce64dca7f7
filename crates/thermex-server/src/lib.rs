use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use thermex_core::{IngestObserver, IngestionPipeline, RecordStore, WeatherSource};
use thermex_ingest::{
    create_settled_channel, spawn_dispatcher, DebounceGate, IngestError, SerialListener,
};
use tokio::task::JoinHandle;

pub mod metrics;

pub use metrics::Metrics;

const SETTLED_BUFFER: usize = 16;

const SOURCE_HTTP: &str = "http";
const SOURCE_SERIAL: &str = "serial";

pub struct AppState {
    ready: AtomicBool,
    metrics: Arc<Metrics>,
    /// Shared by every ingress adapter
    gate: Arc<DebounceGate>,
    store: Arc<dyn RecordStore>,
    _dispatcher: JoinHandle<()>,
}

impl AppState {
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

/// Wire gate, pipeline and routes.
///
/// Spawns the background dispatcher, so this must run inside a Tokio runtime.
pub fn build_app(
    store: Arc<dyn RecordStore>,
    weather: Arc<dyn WeatherSource>,
    quiet_period: Duration,
) -> Result<(Router, Arc<AppState>)> {
    let metrics = Arc::new(Metrics::new()?);

    let (settled_tx, settled_rx) = create_settled_channel(SETTLED_BUFFER);
    let gate = Arc::new(DebounceGate::new(quiet_period, settled_tx));
    let pipeline = IngestionPipeline::new(weather, Arc::clone(&store));
    let observer: Arc<dyn IngestObserver> = metrics.clone();
    let dispatcher = spawn_dispatcher(settled_rx, pipeline, observer);

    let state = Arc::new(AppState {
        ready: AtomicBool::new(false),
        metrics,
        gate,
        store,
        _dispatcher: dispatcher,
    });

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_text))
        .route("/arduino/temperature", post(receive_temperature))
        .route("/entries", get(list_entries))
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

/// Open the serial device and feed its readings into the shared gate.
///
/// Opening happens before returning so a bad device path is reported to
/// the caller; read errors after that are only logged.
pub async fn start_serial_ingest(state: Arc<AppState>, device: PathBuf) -> Result<JoinHandle<()>> {
    let listener = SerialListener::open(&device, Arc::clone(&state.gate)).await?;
    let handle = tokio::spawn(async move {
        let counted = listener.run(|_| state.metrics.reading_received(SOURCE_SERIAL));
        if let Err(e) = counted.await {
            tracing::error!(error=?e, device = %device.display(), "serial ingest stopped");
        }
    });
    Ok(handle)
}

pub fn set_ready(state: &Arc<AppState>, is_ready: bool) {
    state.ready.store(is_ready, Ordering::Relaxed);
}

fn error_body(message: &str) -> Json<Value> {
    Json(json!({ "error": message }))
}

fn waiting_message(quiet_period: Duration) -> String {
    let wait = if quiet_period.subsec_millis() == 0 {
        format!("{}s", quiet_period.as_secs())
    } else {
        format!("{}ms", quiet_period.as_millis())
    };
    format!("Temperature received, waiting {} for inactivity", wait)
}

/// `{"temperature": <number>}`; anything else is invalid input
fn parse_temperature(body: &[u8]) -> Option<f64> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("temperature")?.as_f64()
}

async fn healthz(State(state): State<Arc<AppState>>) -> StatusCode {
    state.metrics.requests_total.add(1, &[]);
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics_text(
    State(state): State<Arc<AppState>>,
) -> ([(HeaderName, HeaderValue); 1], String) {
    let content_type = (
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([content_type], state.metrics.render())
}

async fn receive_temperature(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    state.metrics.requests_total.add(1, &[]);

    let Some(temperature) = parse_temperature(&body) else {
        return (StatusCode::BAD_REQUEST, error_body("Invalid temperature input")).into_response();
    };

    match state.gate.submit(temperature).await {
        Ok(()) => {
            state.metrics.reading_received(SOURCE_HTTP);
            tracing::info!(temperature, "HTTP reading received");
            let message = waiting_message(state.gate.quiet_period());
            (StatusCode::OK, Json(json!({ "message": message }))).into_response()
        }
        Err(IngestError::InvalidReading(reason)) => {
            tracing::warn!(%reason, "rejected HTTP reading");
            (StatusCode::BAD_REQUEST, error_body("Invalid temperature input")).into_response()
        }
        Err(e) => {
            tracing::error!(error=?e, "Error in temperature handler");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body("Internal server error")).into_response()
        }
    }
}

async fn list_entries(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics.requests_total.add(1, &[]);
    match state.store.list_all().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            tracing::error!(error=%e, "Error fetching entries");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body("Failed to fetch entries")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_message_matches_default_period() {
        assert_eq!(
            waiting_message(Duration::from_secs(5)),
            "Temperature received, waiting 5s for inactivity"
        );
        assert_eq!(
            waiting_message(Duration::from_millis(250)),
            "Temperature received, waiting 250ms for inactivity"
        );
    }

    #[test]
    fn temperature_must_be_a_json_number() {
        assert_eq!(parse_temperature(br#"{"temperature": 23}"#), Some(23.0));
        assert_eq!(parse_temperature(br#"{"temperature": -2.5}"#), Some(-2.5));
        assert_eq!(parse_temperature(br#"{"temperature": "hot"}"#), None);
        assert_eq!(parse_temperature(br#"{"temperature": "23"}"#), None);
        assert_eq!(parse_temperature(br#"{"temperature": null}"#), None);
        assert_eq!(parse_temperature(br#"{"temp": 23}"#), None);
        assert_eq!(parse_temperature(br#"[23]"#), None);
        assert_eq!(parse_temperature(b"not json"), None);
        assert_eq!(parse_temperature(b""), None);
    }
}
