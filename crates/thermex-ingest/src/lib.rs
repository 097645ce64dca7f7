//! Reading ingress: debouncing, serial line adapter and the background
//! dispatcher that feeds settled readings into the ingestion pipeline.

pub mod debounce;
pub mod dispatch;
pub mod serial;

pub use debounce::*;
pub use dispatch::*;
pub use serial::*;

use thermex_core::Timestamp;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    #[error("Serial device error: {0}")]
    Device(#[from] std::io::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// A reading that survived its quiet period
#[derive(Debug, Clone, PartialEq)]
pub struct SettledReading {
    pub temperature: f64,
    /// Wall-clock time at emission, local offset
    pub emitted_at: Timestamp,
}

pub type SettledReceiver = mpsc::Receiver<SettledReading>;
pub type SettledSender = mpsc::Sender<SettledReading>;

/// Create a new settled-reading channel with specified buffer size
pub fn create_settled_channel(buffer_size: usize) -> (SettledSender, SettledReceiver) {
    mpsc::channel(buffer_size)
}
