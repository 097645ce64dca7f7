use anyhow::Result;
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry::KeyValue;
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use thermex_core::{IngestObserver, LogObserver, StorageError, StoredRecord};

/// Prometheus-backed counters, also the observer for background ingestion
pub struct Metrics {
    registry: Registry,
    _provider: SdkMeterProvider,
    pub(crate) requests_total: Counter<u64>,
    readings_received: Counter<u64>,
    records_saved: Counter<u64>,
    record_failures: Counter<u64>,
    weather_fallbacks: Counter<u64>,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        // Prometheus exporter via OpenTelemetry
        let registry = Registry::new();
        let reader = exporter().with_registry(registry.clone()).build()?;
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        let meter = provider.meter("thermex-server");

        let requests_total = meter
            .u64_counter("thermex_requests_total")
            .with_description("Total HTTP requests served")
            .init();
        let readings_received = meter
            .u64_counter("thermex_readings_received_total")
            .with_description("Readings accepted by the debounce gate, by ingress source")
            .init();
        let records_saved = meter
            .u64_counter("thermex_records_saved_total")
            .with_description("Settled readings persisted")
            .init();
        let record_failures = meter
            .u64_counter("thermex_record_failures_total")
            .with_description("Settled readings lost to storage errors")
            .init();
        let weather_fallbacks = meter
            .u64_counter("thermex_weather_fallbacks_total")
            .with_description("Records stored with fallback weather")
            .init();

        Ok(Self {
            registry,
            _provider: provider,
            requests_total,
            readings_received,
            records_saved,
            record_failures,
            weather_fallbacks,
        })
    }

    /// Count one reading accepted from `source` ("http" or "serial")
    pub fn reading_received(&self, source: &'static str) {
        self.readings_received.add(1, &[KeyValue::new("source", source)]);
    }

    /// Prometheus text exposition of everything recorded so far
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buf) {
            tracing::warn!(error=?e, "failed to encode metrics");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl IngestObserver for Metrics {
    fn record_saved(&self, stored: &StoredRecord) {
        self.records_saved.add(1, &[]);
        LogObserver.record_saved(stored);
    }

    fn record_failed(&self, temperature: f64, error: &StorageError) {
        self.record_failures.add(1, &[]);
        LogObserver.record_failed(temperature, error);
    }

    fn weather_degraded(&self) {
        self.weather_fallbacks.add(1, &[]);
        LogObserver.weather_degraded();
    }
}
