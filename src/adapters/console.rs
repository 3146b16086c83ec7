use crate::core::{LoadReport, Record, RecordSink};
use crate::utils::error::Result;
use std::io::Write;
use std::sync::Mutex;

/// Prints the records as pretty JSON instead of loading them. Used for dry runs.
pub struct ConsoleSink<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> RecordSink for ConsoleSink<W> {
    async fn write(&self, destination: &str, records: &[Record]) -> Result<LoadReport> {
        let rendered = serde_json::to_string_pretty(records)?;
        {
            let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            writeln!(out, "{}", rendered)?;
            out.flush()?;
        }
        tracing::info!(
            "Dry run: {} records not written to {}",
            records.len(),
            destination
        );

        Ok(LoadReport {
            destination: destination.to_string(),
            records_written: 0,
            response: None,
        })
    }
}
