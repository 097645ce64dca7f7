//! SQLite persistence for temperature entries
//!
//! One append-only table, `temperature_entries`. The schema is created on
//! startup if missing; there are no migrations.

pub mod client;
pub mod queries;
pub mod schema;
pub mod store;

pub use client::*;
pub use schema::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Invalid stored row {id}: {reason}")]
    InvalidRow { id: i64, reason: String },
}

pub type DbResult<T> = Result<T, DbError>;
