use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thermex_core::{condition_label, WeatherSnapshot, WeatherSource};
use tracing::{debug, warn};

use crate::{WeatherError, WeatherResult};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code";
const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m";

#[derive(Debug, Clone)]
pub struct OpenMeteoConfig {
    pub base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA zone the provider reports local times in
    pub timezone: String,
    pub timeout: Duration,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        // Franca-SP
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            latitude: -20.5382,
            longitude: -47.4009,
            timezone: "America/Sao_Paulo".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub current: Option<CurrentConditions>,
    pub hourly: Option<HourlySeries>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentConditions {
    /// Provider-local, e.g. "2024-06-15T09:15"
    pub time: Option<String>,
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub weather_code: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
}

impl HourlySeries {
    /// Index of the slot covering the hour of `local_time` ("YYYY-MM-DDTHH...")
    fn slot_for(&self, local_time: &str) -> Option<usize> {
        let hour_prefix = local_time.get(..13)?;
        self.time.iter().position(|t| t.starts_with(hour_prefix))
    }
}

impl ForecastResponse {
    /// Reduce a provider response to a snapshot.
    ///
    /// Humidity and temperature missing from `current` are taken from the
    /// hourly slot of the current hour when present.
    pub fn into_snapshot(self) -> WeatherResult<WeatherSnapshot> {
        let current = self.current.ok_or(WeatherError::MissingField("current"))?;

        let hourly = self.hourly.unwrap_or_default();
        let slot = current.time.as_deref().and_then(|t| hourly.slot_for(t));
        let at_slot = |series: &[Option<f64>]| slot.and_then(|i| series.get(i).copied().flatten());

        let humidity = current
            .relative_humidity_2m
            .or_else(|| at_slot(&hourly.relative_humidity_2m))
            .ok_or(WeatherError::MissingField("relative_humidity_2m"))?;
        let temperature = current
            .temperature_2m
            .or_else(|| at_slot(&hourly.temperature_2m));
        let condition = current
            .weather_code
            .map(condition_label)
            .unwrap_or(thermex_core::UNKNOWN_CONDITION);

        Ok(WeatherSnapshot {
            condition: condition.to_string(),
            humidity,
            temperature,
        })
    }
}

/// Open-Meteo current conditions for a fixed coordinate
pub struct OpenMeteoSource {
    client: Client,
    config: OpenMeteoConfig,
}

impl OpenMeteoSource {
    pub fn new(config: OpenMeteoConfig) -> WeatherResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenMeteoConfig {
        &self.config
    }

    /// One provider round-trip, errors included
    pub async fn try_fetch(&self) -> WeatherResult<WeatherSnapshot> {
        let resp = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("latitude", self.config.latitude.to_string()),
                ("longitude", self.config.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("forecast_days", "1".to_string()),
                ("timezone", self.config.timezone.clone()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let forecast: ForecastResponse = resp.json().await?;
        let snapshot = forecast.into_snapshot()?;
        debug!(
            condition = %snapshot.condition,
            humidity = snapshot.humidity,
            temperature = ?snapshot.temperature,
            "Fetched weather"
        );
        Ok(snapshot)
    }
}

#[async_trait::async_trait]
impl WeatherSource for OpenMeteoSource {
    async fn fetch(&self) -> WeatherSnapshot {
        self.fetch_checked().await.0
    }

    async fn fetch_checked(&self) -> (WeatherSnapshot, bool) {
        match self.try_fetch().await {
            Ok(snapshot) => (snapshot, false),
            Err(e) => {
                warn!(error = %e, "Failed to fetch weather data, using fallback");
                (WeatherSnapshot::fallback(), true)
            }
        }
    }
}
