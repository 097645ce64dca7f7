//! Enriched temperature records

use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};

use crate::types::{PeriodOfDay, Season, Timestamp, WeatherSnapshot};

/// A settled reading enriched with weather and calendar tags.
///
/// Fields are read-only once built; `period_of_day` and `season` are
/// derived from `timestamp` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    temperature: f64,
    weather_temperature: Option<f64>,
    timestamp: Timestamp,
    period_of_day: PeriodOfDay,
    season: Season,
    weather: String,
    humidity: f64,
}

impl TemperatureRecord {
    /// Build a record from a settled reading and the weather at that moment
    pub fn create(temperature: f64, timestamp: Timestamp, weather: &WeatherSnapshot) -> Self {
        Self {
            temperature,
            weather_temperature: weather.temperature,
            timestamp,
            period_of_day: period_of_day(&timestamp),
            season: season(&timestamp),
            weather: weather.condition.clone(),
            humidity: weather.humidity,
        }
    }

    /// Rehydrate a record exactly as it was persisted
    pub fn restore(
        temperature: f64,
        weather_temperature: Option<f64>,
        timestamp: Timestamp,
        period_of_day: PeriodOfDay,
        season: Season,
        weather: String,
        humidity: f64,
    ) -> Self {
        Self {
            temperature,
            weather_temperature,
            timestamp,
            period_of_day,
            season,
            weather,
            humidity,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn weather_temperature(&self) -> Option<f64> {
        self.weather_temperature
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    pub fn period_of_day(&self) -> PeriodOfDay {
        self.period_of_day
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn weather(&self) -> &str {
        &self.weather
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }
}

/// A record as returned by the store, with its insertion id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: i64,

    #[serde(flatten)]
    pub record: TemperatureRecord,
}

/// Local-hour bucket of `timestamp`
pub fn period_of_day(timestamp: &Timestamp) -> PeriodOfDay {
    PeriodOfDay::from_hour(timestamp.hour())
}

/// Month bucket of `timestamp`
pub fn season(timestamp: &Timestamp) -> Season {
    Season::from_month(timestamp.month())
}
