//! Trailing-edge debounce of raw readings
//!
//! A burst of readings collapses into one [`SettledReading`] carrying the
//! last value, emitted once no new reading has arrived for the quiet period.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{IngestError, IngestResult, SettledReading, SettledSender};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(5);

#[derive(Default)]
struct GateState {
    pending: Option<f64>,
    /// Bumped on every accepted submit; a timer only fires for its own generation
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Collapses bursts of readings from any number of ingress adapters.
///
/// Idle until the first `submit`, then pending until the quiet period
/// elapses with no further submit.
pub struct DebounceGate {
    quiet_period: Duration,
    consumer: SettledSender,
    state: Arc<Mutex<GateState>>,
}

impl DebounceGate {
    pub fn new(quiet_period: Duration, consumer: SettledSender) -> Self {
        Self {
            quiet_period,
            consumer,
            state: Arc::new(Mutex::new(GateState::default())),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Replace the pending value and restart the quiet-period timer.
    ///
    /// Non-finite values are rejected without touching the pending state.
    pub async fn submit(&self, value: f64) -> IngestResult<()> {
        if !value.is_finite() {
            return Err(IngestError::InvalidReading(format!(
                "temperature must be a finite number, got {}",
                value
            )));
        }

        let mut state = self.state.lock().await;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        state.pending = Some(value);

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        let consumer = self.consumer.clone();
        let quiet_period = self.quiet_period;
        state.timer = Some(tokio::spawn(async move {
            sleep(quiet_period).await;

            let temperature = {
                let mut state = shared.lock().await;
                // Superseded while waiting for the lock
                if state.generation != generation {
                    return;
                }
                state.timer = None;
                match state.pending.take() {
                    Some(v) => v,
                    None => return,
                }
            };

            let reading = SettledReading {
                temperature,
                emitted_at: DateTime::<FixedOffset>::from(Local::now()),
            };
            debug!(temperature, "Reading settled");
            if consumer.send(reading).await.is_err() {
                warn!(temperature, "Settled reading dropped, no consumer");
            }
        }));

        debug!(value, "Reading accepted, waiting for inactivity");
        Ok(())
    }

    /// Whether a reading is waiting for its quiet period to elapse
    pub async fn is_pending(&self) -> bool {
        self.state.lock().await.pending.is_some()
    }
}
