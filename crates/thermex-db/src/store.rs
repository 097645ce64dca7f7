//! [`RecordStore`] backed by the SQLite entries table

use thermex_core::{RecordStore, StorageError, StorageResult, StoredRecord, TemperatureRecord};
use tracing::warn;

use crate::{DbClient, DbError};

fn into_storage(kind: fn(thermex_core::BoxError) -> StorageError) -> impl Fn(DbError) -> StorageError {
    move |e| match e {
        DbError::Sqlx(inner) => kind(Box::new(inner)),
        other => kind(Box::new(other)),
    }
}

#[async_trait::async_trait]
impl RecordStore for DbClient {
    async fn initialize(&self) -> StorageResult<()> {
        self.create_schema()
            .await
            .map_err(into_storage(StorageError::Schema))
    }

    async fn save(&self, record: &TemperatureRecord) -> StorageResult<StoredRecord> {
        let id = self
            .insert_entry(record)
            .await
            .map_err(into_storage(StorageError::Write))?;
        Ok(StoredRecord {
            id,
            record: record.clone(),
        })
    }

    async fn list_all(&self) -> StorageResult<Vec<StoredRecord>> {
        let rows = self
            .list_entries()
            .await
            .map_err(into_storage(StorageError::Read))?;
        // Rows written by other tools may not convert; they are left out of the listing
        let stored = rows
            .into_iter()
            .filter_map(|row| match StoredRecord::try_from(row) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .collect();
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::sync::Arc;
    use thermex_core::{PeriodOfDay, Season, WeatherSnapshot};

    fn record(temperature: f64, at: &str) -> TemperatureRecord {
        let ts = DateTime::parse_from_rfc3339(at).unwrap();
        TemperatureRecord::create(temperature, ts, &WeatherSnapshot::fallback())
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = DbClient::in_memory().await.unwrap();
        db.initialize().await.unwrap();
        db.save(&record(22.0, "2024-02-01T07:00:00-03:00")).await.unwrap();

        // A second run must neither fail nor drop existing rows
        db.initialize().await.unwrap();
        let rows = db.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'temperature_entries'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, 1);
    }

    #[tokio::test]
    async fn test_save_then_list_round_trips_record() {
        let store: Arc<dyn RecordStore> = Arc::new(DbClient::in_memory().await.unwrap());
        store.initialize().await.unwrap();

        let saved = store
            .save(&record(23.0, "2024-08-09T22:10:00-03:00"))
            .await
            .unwrap();
        let listed = store.list_all().await.unwrap();

        assert_eq!(listed, vec![saved]);
        assert_eq!(listed[0].record.period_of_day(), PeriodOfDay::Evening);
        assert_eq!(listed[0].record.season(), Season::Winter);
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let db = DbClient::in_memory().await.unwrap();
        db.initialize().await.unwrap();

        let mut last = 0;
        for i in 0..5 {
            let stored = db
                .save(&record(20.0 + f64::from(i), "2024-05-05T05:05:05-03:00"))
                .await
                .unwrap();
            assert!(stored.id > last);
            last = stored.id;
        }
    }

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ac_data.db");

        let db = DbClient::open(&path).await.unwrap();
        db.initialize().await.unwrap();
        db.save(&record(25.0, "2024-12-01T12:00:00-03:00")).await.unwrap();
        db.close().await;

        let db = DbClient::open(&path).await.unwrap();
        db.initialize().await.unwrap();
        let rows = db.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.temperature(), 25.0);
    }

    #[tokio::test]
    async fn test_write_failure_is_storage_error() {
        let db = DbClient::in_memory().await.unwrap();
        // Schema never created
        let err = db
            .save(&record(22.0, "2024-02-01T07:00:00-03:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Write(_)));

        let err = db.list_all().await.unwrap_err();
        assert!(matches!(err, StorageError::Read(_)));
    }

    #[tokio::test]
    async fn test_seeded_rows_are_listed() {
        let db = DbClient::in_memory().await.unwrap();
        db.initialize().await.unwrap();
        let saved = db.save(&record(23.0, "2024-08-09T22:10:00-03:00")).await.unwrap();
        // Same shape the seeding script writes: naive ISO time, REAL humidity
        sqlx::query(
            "INSERT INTO temperature_entries \
             (temperature, timestamp, period_of_day, season, weather, humidity) \
             VALUES (24.6, '2024-05-01T10:23:00', 'morning', 'autumn', 'Fog', 88.0)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let rows = db.list_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], saved);
        assert_eq!(rows[1].record.temperature(), 24.6);
        assert_eq!(rows[1].record.weather_temperature(), None);
        assert_eq!(rows[1].record.period_of_day(), PeriodOfDay::Morning);
        assert_eq!(rows[1].record.season(), Season::Autumn);
        assert_eq!(
            rows[1].record.timestamp().naive_local().to_string(),
            "2024-05-01 10:23:00"
        );
    }

    #[tokio::test]
    async fn test_unreadable_row_does_not_hide_the_rest() {
        let db = DbClient::in_memory().await.unwrap();
        db.initialize().await.unwrap();
        db.save(&record(21.0, "2024-02-01T07:00:00-03:00")).await.unwrap();
        sqlx::query(
            "INSERT INTO temperature_entries (temperature, timestamp, period_of_day, season) \
             VALUES (21, 'yesterday', 'night', 'summer')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        db.save(&record(22.0, "2024-02-01T08:00:00-03:00")).await.unwrap();

        let temps: Vec<f64> = db
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.record.temperature())
            .collect();
        assert_eq!(temps, vec![21.0, 22.0]);
    }
}
