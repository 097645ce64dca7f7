//! Query operations for the entries table

use crate::schema::{EntryRow, CREATE_ENTRIES_TABLE};
use crate::{DbClient, DbResult};
use thermex_core::TemperatureRecord;
use tracing::{debug, instrument};

impl DbClient {
    /// Create `temperature_entries` unless it already exists
    #[instrument(skip(self))]
    pub async fn create_schema(&self) -> DbResult<()> {
        sqlx::query(CREATE_ENTRIES_TABLE)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Insert a single entry, returning its row id
    #[instrument(skip(self, record))]
    pub async fn insert_entry(&self, record: &TemperatureRecord) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO temperature_entries (
                temperature,
                weather_temperature,
                timestamp,
                period_of_day,
                season,
                weather,
                humidity
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.temperature())
        .bind(record.weather_temperature())
        .bind(record.timestamp().to_rfc3339())
        .bind(record.period_of_day().as_str())
        .bind(record.season().as_str())
        .bind(record.weather())
        .bind(record.humidity())
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        debug!("Inserted entry {} for {}", id, record.timestamp());
        Ok(id)
    }

    /// Get every entry, oldest first
    #[instrument(skip(self))]
    pub async fn list_entries(&self) -> DbResult<Vec<EntryRow>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT
                id,
                CAST(temperature AS REAL) AS temperature,
                CAST(weather_temperature AS REAL) AS weather_temperature,
                timestamp,
                period_of_day,
                season,
                weather,
                CAST(humidity AS REAL) AS humidity
            FROM temperature_entries
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        debug!("Retrieved {} entries", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use sqlx::Row;
    use thermex_core::WeatherSnapshot;

    fn record(temperature: f64) -> TemperatureRecord {
        let ts = DateTime::parse_from_rfc3339("2024-11-20T19:45:10-03:00").unwrap();
        let weather = WeatherSnapshot {
            condition: "Light Rain".into(),
            humidity: 82.0,
            temperature: Some(21.4),
        };
        TemperatureRecord::create(temperature, ts, &weather)
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = DbClient::in_memory().await.unwrap();
        db.create_schema().await.unwrap();

        let first = db.insert_entry(&record(23.0)).await.unwrap();
        let second = db.insert_entry(&record(23.5)).await.unwrap();
        assert!(second > first);

        let rows = db.list_entries().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].temperature, Some(23.0));
        assert_eq!(rows[1].temperature, Some(23.5));
        assert_eq!(rows[0].weather_temperature, Some(21.4));
        assert_eq!(rows[0].period_of_day.as_deref(), Some("evening"));
        assert_eq!(rows[0].season.as_deref(), Some("spring"));
        assert_eq!(rows[0].timestamp.as_deref(), Some("2024-11-20T19:45:10-03:00"));
    }

    #[tokio::test]
    async fn test_whole_readings_stored_as_integers() {
        let db = DbClient::in_memory().await.unwrap();
        db.create_schema().await.unwrap();
        db.insert_entry(&record(23.0)).await.unwrap();

        let kind: String = sqlx::query("SELECT typeof(temperature) AS kind FROM temperature_entries")
            .fetch_one(db.pool())
            .await
            .unwrap()
            .get("kind");
        assert_eq!(kind, "integer");
    }

    #[tokio::test]
    async fn test_fallback_weather_stores_null_ambient() {
        let db = DbClient::in_memory().await.unwrap();
        db.create_schema().await.unwrap();

        let ts = DateTime::parse_from_rfc3339("2024-01-01T00:00:00-03:00").unwrap();
        let fallback = TemperatureRecord::create(20.0, ts, &WeatherSnapshot::fallback());
        db.insert_entry(&fallback).await.unwrap();

        let rows = db.list_entries().await.unwrap();
        assert_eq!(rows[0].weather_temperature, None);
        assert_eq!(rows[0].weather.as_deref(), Some("Unknown"));
        assert_eq!(rows[0].humidity, Some(0.0));
    }
}
