//! Telemetry log

use anyhow::{Context, Result};
use console::style;
use skald_extensions::{EventEnvelope, TelemetryEvent, TelemetryLedger};

use crate::cli::{GlobalArgs, LogArgs};
use crate::context::resolve_paths;
use crate::output;

/// Maximum extension id display width in log output
const LOG_EXTENSION_WIDTH: usize = 30;

/// Maximum event name column width
const LOG_EVENT_WIDTH: usize = 28;

/// Show recent telemetry events
///
/// Supports:
/// - Last events: `skald log`, `skald log -n 100`
/// - One extension: `skald log --extension publisher.name`
/// - Counts per event: `skald log --stats`
pub fn run(args: LogArgs, global: &GlobalArgs) -> Result<()> {
    let paths = resolve_paths(global)?;
    let ledger = TelemetryLedger::new(paths.ledger_path());

    if args.stats {
        let stats = ledger.stats().context("Failed to read telemetry ledger")?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }
        output::header("Telemetry");
        output::kv("Events", &stats.total_events.to_string());
        output::kv("Failures", &stats.failures.to_string());
        let mut counts: Vec<_> = stats.event_counts.into_iter().collect();
        counts.sort();
        for (name, count) in counts {
            output::kv(&name, &count.to_string());
        }
        return Ok(());
    }

    let events = match &args.extension {
        Some(id) => ledger.history(id, Some(args.limit)),
        None => ledger.recent(args.limit),
    }
    .context("Failed to read telemetry ledger")?;

    if events.is_empty() {
        output::info("No events found");
        return Ok(());
    }

    for event in &events {
        if args.json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{}", format_line(event));
        }
    }
    Ok(())
}

fn outcome(event: &TelemetryEvent) -> String {
    match event {
        TelemetryEvent::Install {
            duration_ms,
            error_code,
            ..
        }
        | TelemetryEvent::Update {
            duration_ms,
            error_code,
            ..
        }
        | TelemetryEvent::Uninstall {
            duration_ms,
            error_code,
            ..
        } => match error_code {
            Some(code) => format!("{} {}", style("failed").red(), code),
            None if event.success() => format!("ok ({}ms)", duration_ms),
            None => style("failed").red().to_string(),
        },
        TelemetryEvent::Enable { .. } | TelemetryEvent::Disable { .. } => String::new(),
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let kept: String = value.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

fn format_line(envelope: &EventEnvelope) -> String {
    format!(
        "{}  {:<event_width$}  {:<id_width$}  {}",
        style(envelope.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
        truncate(envelope.event.name(), LOG_EVENT_WIDTH),
        truncate(&envelope.extension_id, LOG_EXTENSION_WIDTH),
        outcome(&envelope.event),
        event_width = LOG_EVENT_WIDTH,
        id_width = LOG_EXTENSION_WIDTH,
    )
    .trim_end()
    .to_string()
}
