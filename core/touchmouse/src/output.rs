//! JSON-lines records written to stdout.

use std::io::Write;

use chrono::{SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;
use touch_core::{BundleReport, InputReport, PointerEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One record per pointer event.
    #[default]
    Events,
    /// One record per device report (axes, keys, sync).
    Reports,
}

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    recorded_at: &'a str,
    fseq: i64,
    event: &'a PointerEvent,
}

#[derive(Debug, Serialize)]
struct ReportRecord<'a> {
    recorded_at: &'a str,
    fseq: i64,
    report: &'a InputReport,
}

/// Writes every record a bundle produced. Returns the number of records.
pub fn write_bundle<W: Write>(
    out: &mut W,
    format: OutputFormat,
    bundle: &BundleReport,
) -> std::io::Result<usize> {
    if bundle.events.is_empty() {
        return Ok(0);
    }

    let recorded_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut written = 0;
    for event in &bundle.events {
        match format {
            OutputFormat::Events => {
                let record = EventRecord {
                    recorded_at: &recorded_at,
                    fseq: bundle.fseq,
                    event,
                };
                write_line(out, &record)?;
                written += 1;
            }
            OutputFormat::Reports => {
                for report in event.reports() {
                    let record = ReportRecord {
                        recorded_at: &recorded_at,
                        fseq: bundle.fseq,
                        report: &report,
                    };
                    write_line(out, &record)?;
                    written += 1;
                }
            }
        }
    }
    out.flush()?;
    Ok(written)
}

fn write_line<W: Write, T: Serialize>(out: &mut W, record: &T) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, record)?;
    out.write_all(b"\n")
}
