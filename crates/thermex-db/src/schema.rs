//! Table layout for `temperature_entries`
//!
//! Column names and declared types are shared with the offline analysis
//! tooling that reads the same file. Do not rename them.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thermex_core::{
    period_of_day, season, StoredRecord, TemperatureRecord, Timestamp, UNKNOWN_CONDITION,
};

use crate::DbError;

pub const CREATE_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS temperature_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    temperature INTEGER,
    weather_temperature INTEGER,
    timestamp TEXT,
    period_of_day TEXT,
    season TEXT,
    weather TEXT,
    humidity INTEGER
)
"#;

/// Row as read back from `temperature_entries`.
///
/// Numeric columns are selected through `CAST(.. AS REAL)` since INTEGER
/// affinity stores whole readings as integers.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EntryRow {
    pub id: i64,
    pub temperature: Option<f64>,
    pub weather_temperature: Option<f64>,
    pub timestamp: Option<String>,
    pub period_of_day: Option<String>,
    pub season: Option<String>,
    pub weather: Option<String>,
    pub humidity: Option<f64>,
}

/// Naive ISO-8601 as written by the seeding tooling, e.g. `2024-05-01T10:23:00`
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// RFC 3339 as written by the server, or a naive local time without offset.
///
/// Naive times are read in the host's local offset, or as UTC when that
/// local time does not exist (DST gap).
pub fn parse_stored_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    let naive = NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT).ok()?;
    let ts = match Local.from_local_datetime(&naive).earliest() {
        Some(local) => DateTime::<FixedOffset>::from(local),
        None => DateTime::<FixedOffset>::from(Utc.from_utc_datetime(&naive)),
    };
    Some(ts)
}

impl TryFrom<EntryRow> for StoredRecord {
    type Error = DbError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |reason: String| DbError::InvalidRow { id, reason };

        let temperature = row
            .temperature
            .ok_or_else(|| invalid("temperature is NULL".to_string()))?;
        let raw_timestamp = row
            .timestamp
            .ok_or_else(|| invalid("timestamp is NULL".to_string()))?;
        let timestamp = parse_stored_timestamp(&raw_timestamp)
            .ok_or_else(|| invalid(format!("unparseable timestamp {:?}", raw_timestamp)))?;

        // Missing labels are derived from the timestamp
        let period_of_day = match row.period_of_day {
            Some(label) => label
                .parse()
                .map_err(|e| invalid(format!("period_of_day: {}", e)))?,
            None => period_of_day(&timestamp),
        };
        let season = match row.season {
            Some(label) => label.parse().map_err(|e| invalid(format!("season: {}", e)))?,
            None => season(&timestamp),
        };

        let record = TemperatureRecord::restore(
            temperature,
            row.weather_temperature,
            timestamp,
            period_of_day,
            season,
            row.weather.unwrap_or_else(|| UNKNOWN_CONDITION.to_string()),
            row.humidity.unwrap_or(0.0),
        );

        Ok(StoredRecord { id, record })
    }
}
