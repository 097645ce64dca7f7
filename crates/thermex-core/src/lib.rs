//! Core domain types and the ingestion use case for thermex
//!
//! Readings from the AC controller are enriched with ambient weather and
//! calendar tags, then handed to a [`RecordStore`]. Everything here is
//! transport-agnostic; the adapters live in the sibling crates.

pub mod conditions;
pub mod pipeline;
pub mod record;
pub mod types;

pub use conditions::*;
pub use pipeline::*;
pub use record::*;
pub use types::*;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Schema initialization failed: {0}")]
    Schema(#[source] BoxError),

    #[error("Write failed: {0}")]
    Write(#[source] BoxError),

    #[error("Read failed: {0}")]
    Read(#[source] BoxError),
}

pub type StorageResult<T> = Result<T, StorageError>;
