use crate::events::{EventEnvelope, TelemetryEvent};
use crate::traits::TelemetrySink;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};

/// Default number of events shown by `skald log`
pub const DEFAULT_LOG_TAIL_LINES: usize = 25;

/// Append-only JSONL telemetry ledger
pub struct TelemetryLedger {
    ledger_path: Utf8PathBuf,
}

impl TelemetryLedger {
    pub fn new(ledger_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            ledger_path: ledger_path.into(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.ledger_path
    }

    /// Append event to ledger (atomic, file-locked)
    pub fn append(&self, envelope: &EventEnvelope) -> Result<()> {
        if let Some(parent) = self.ledger_path.parent() {
            fs::create_dir_all(parent).context("Failed to create ledger parent directory")?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.ledger_path)
            .context("Failed to open ledger file")?;

        // Released when `file` is dropped
        file.lock_exclusive()
            .context("Failed to acquire exclusive lock on ledger")?;

        let json_line = serde_json::to_string(envelope).context("Failed to serialize event")?;
        writeln!(file, "{}", json_line).context("Failed to write event to ledger")?;
        file.sync_all().context("Failed to sync ledger file")?;

        Ok(())
    }

    fn read_all(&self) -> Result<Vec<EventEnvelope>> {
        if !self.ledger_path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.ledger_path).context("Failed to open ledger file")?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line.context("Failed to read line from ledger")?;
            if line.trim().is_empty() {
                continue;
            }
            let envelope: EventEnvelope =
                serde_json::from_str(&line).context("Failed to deserialize event from ledger")?;
            events.push(envelope);
        }
        Ok(events)
    }

    /// Most recent `limit` events, chronological
    pub fn recent(&self, limit: usize) -> Result<Vec<EventEnvelope>> {
        let mut events = self.read_all()?;
        if events.len() > limit {
            events = events.split_off(events.len() - limit);
        }
        Ok(events)
    }

    /// Event history for one extension (chronological)
    pub fn history(&self, extension_id: &str, limit: Option<usize>) -> Result<Vec<EventEnvelope>> {
        let mut events: Vec<EventEnvelope> = self
            .read_all()?
            .into_iter()
            .filter(|e| e.extension_id.eq_ignore_ascii_case(extension_id))
            .collect();

        if let Some(limit_val) = limit {
            if events.len() > limit_val {
                events = events.split_off(events.len() - limit_val);
            }
        }
        Ok(events)
    }

    /// Ledger statistics
    pub fn stats(&self) -> Result<LedgerStats> {
        let events = self.read_all()?;
        let mut stats = LedgerStats {
            total_events: events.len(),
            ..Default::default()
        };

        for envelope in &events {
            *stats
                .event_counts
                .entry(envelope.event.name().to_string())
                .or_insert(0) += 1;
            if !envelope.event.success() {
                stats.failures += 1;
            }
        }
        Ok(stats)
    }
}

impl TelemetrySink for TelemetryLedger {
    fn log(&self, event: TelemetryEvent) {
        let envelope = EventEnvelope::new(event);
        if let Err(e) = self.append(&envelope) {
            tracing::warn!("Failed to record telemetry event: {:#}", e);
        }
    }
}

/// Ledger statistics
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerStats {
    pub total_events: usize,
    pub failures: usize,
    pub event_counts: HashMap<String, usize>,
}

/// Sink that only writes events to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn log(&self, event: TelemetryEvent) {
        tracing::debug!(
            event = event.name(),
            extension = %event.extension().id,
            success = event.success(),
            "telemetry"
        );
    }
}
