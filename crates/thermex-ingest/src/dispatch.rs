//! Background hand-off from the gate to the ingestion pipeline

use std::sync::Arc;

use thermex_core::{IngestObserver, IngestionPipeline};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::SettledReceiver;

/// Run the pipeline for every settled reading, one at a time.
///
/// Outcomes go to `observer` only; the task ends once every sender is gone.
pub fn spawn_dispatcher(
    mut settled: SettledReceiver,
    pipeline: IngestionPipeline,
    observer: Arc<dyn IngestObserver>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(reading) = settled.recv().await {
            debug!(
                temperature = reading.temperature,
                at = %reading.emitted_at,
                "Dispatching settled reading"
            );
            pipeline
                .handle_observed(reading.temperature, reading.emitted_at, observer.as_ref())
                .await;
        }
        info!("Settled reading channel closed, dispatcher stopped");
    })
}
