use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{StorageError, StorageResult, StoredRecord, TemperatureRecord, Timestamp, WeatherSnapshot};

/// Provider of current ambient conditions.
///
/// Implementations never fail: on any error they log and hand back
/// [`WeatherSnapshot::fallback`].
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self) -> WeatherSnapshot;

    /// Snapshot plus whether it is a substitute for a failed lookup.
    ///
    /// The default compares against the fallback value; sources that know
    /// when they failed should override it.
    async fn fetch_checked(&self) -> (WeatherSnapshot, bool) {
        let snapshot = self.fetch().await;
        let degraded = snapshot.is_fallback();
        (snapshot, degraded)
    }
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the backing table if missing; safe to call repeatedly
    async fn initialize(&self) -> StorageResult<()>;

    async fn save(&self, record: &TemperatureRecord) -> StorageResult<StoredRecord>;

    /// All rows in insertion order
    async fn list_all(&self) -> StorageResult<Vec<StoredRecord>>;
}

/// Sink for outcomes of background ingestion, which has no caller to report to
pub trait IngestObserver: Send + Sync {
    fn record_saved(&self, stored: &StoredRecord);

    fn record_failed(&self, temperature: f64, error: &StorageError);

    fn weather_degraded(&self) {}
}

/// Observer that only writes log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl IngestObserver for LogObserver {
    fn record_saved(&self, stored: &StoredRecord) {
        info!(
            id = stored.id,
            temperature = stored.record.temperature(),
            "Reading processed"
        );
    }

    fn record_failed(&self, temperature: f64, error: &StorageError) {
        error!(temperature, error = %error, "Failed to persist reading");
    }

    fn weather_degraded(&self) {
        warn!("Weather unavailable, stored reading with fallback conditions");
    }
}

/// Fetch weather, build the record, persist it
#[derive(Clone)]
pub struct IngestionPipeline {
    weather: Arc<dyn WeatherSource>,
    store: Arc<dyn RecordStore>,
}

impl IngestionPipeline {
    pub fn new(weather: Arc<dyn WeatherSource>, store: Arc<dyn RecordStore>) -> Self {
        Self { weather, store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Run one ingestion for a settled reading
    pub async fn handle(&self, temperature: f64, timestamp: Timestamp) -> StorageResult<StoredRecord> {
        let (record, _) = self.enrich(temperature, timestamp).await;
        self.store.save(&record).await
    }

    /// Like [`handle`](Self::handle), but reports the outcome to `observer`
    /// instead of returning it
    pub async fn handle_observed(
        &self,
        temperature: f64,
        timestamp: Timestamp,
        observer: &dyn IngestObserver,
    ) {
        let (record, degraded) = self.enrich(temperature, timestamp).await;
        if degraded {
            observer.weather_degraded();
        }
        match self.store.save(&record).await {
            Ok(stored) => observer.record_saved(&stored),
            Err(e) => observer.record_failed(temperature, &e),
        }
    }

    async fn enrich(&self, temperature: f64, timestamp: Timestamp) -> (TemperatureRecord, bool) {
        let (snapshot, degraded) = self.weather.fetch_checked().await;
        let record = TemperatureRecord::create(temperature, timestamp, &snapshot);
        debug!(
            temperature,
            period = %record.period_of_day(),
            season = %record.season(),
            weather = record.weather(),
            "Built temperature record"
        );
        (record, degraded)
    }
}
