//! Line-oriented serial adapter for the AC controller firmware
//!
//! The firmware prints `TEMP:<int>` whenever the setpoint changes, mixed with
//! free-form status chatter. Only `TEMP:` lines become readings.

use std::path::Path;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::{DebounceGate, IngestResult};

pub const TEMP_PREFIX: &str = "TEMP:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialLine {
    Reading(i64),
    /// `TEMP:` prefix without a usable integer
    Malformed(String),
    /// Anything else the firmware prints
    Chatter,
}

/// Classify one line from the device
pub fn parse_line(line: &str) -> SerialLine {
    let line = line.trim();
    match line.strip_prefix(TEMP_PREFIX) {
        Some(rest) => match leading_int(rest) {
            Some(v) => SerialLine::Reading(v),
            None => SerialLine::Malformed(line.to_string()),
        },
        None => SerialLine::Chatter,
    }
}

/// Optional sign and the digits that follow it, ignoring leading whitespace
/// and anything after the digits ("  -3.5C" is -3)
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// Reads `TEMP:` lines from a device stream and submits them to a gate
pub struct SerialListener<R> {
    reader: R,
    gate: Arc<DebounceGate>,
}

impl SerialListener<BufReader<File>> {
    /// Open a character device (already configured for the right baud rate)
    pub async fn open(path: impl AsRef<Path>, gate: Arc<DebounceGate>) -> IngestResult<Self> {
        let file = File::open(path.as_ref()).await?;
        info!(device = %path.as_ref().display(), "Serial device opened");
        Ok(Self::new(BufReader::new(file), gate))
    }
}

impl<R: AsyncBufRead + Unpin> SerialListener<R> {
    pub fn new(reader: R, gate: Arc<DebounceGate>) -> Self {
        Self { reader, gate }
    }

    /// Next valid reading, skipping chatter and malformed lines; `None` at EOF
    pub async fn next_reading(&mut self) -> IngestResult<Option<i64>> {
        let mut buf = Vec::with_capacity(64);
        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(None);
            }
            // Boot noise on the line is common; don't let it kill the stream
            let line = String::from_utf8_lossy(&buf);
            debug!(line = %line.trim_end(), "Arduino ->");
            match parse_line(&line) {
                SerialLine::Reading(v) => return Ok(Some(v)),
                SerialLine::Malformed(raw) => warn!(line = %raw, "Serial input invalid"),
                SerialLine::Chatter => {}
            }
        }
    }

    /// Forward readings to the gate until the stream ends.
    ///
    /// `on_accepted` sees every reading the gate took. Returns the number of
    /// readings submitted.
    pub async fn run<F: FnMut(i64)>(mut self, mut on_accepted: F) -> IngestResult<u64> {
        let mut submitted = 0;
        while let Some(value) = self.next_reading().await? {
            match self.gate.submit(value as f64).await {
                Ok(()) => {
                    submitted += 1;
                    info!(temperature = value, "Serial input received");
                    on_accepted(value);
                }
                Err(e) => warn!(error = %e, "Serial reading rejected"),
            }
        }
        info!(submitted, "Serial stream ended");
        Ok(submitted)
    }
}
