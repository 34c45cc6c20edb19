//! CSV Export
//!
//! Writes the current ticket view as CSV: every field quoted, CRLF line
//! endings, message text stripped of markup and capped at 500 characters.

use crate::ticket::text::{collapse_whitespace, strip_tags, truncate_chars};
use crate::ticket::Ticket;
use chrono::{NaiveDate, SecondsFormat};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::path::{Path, PathBuf};

pub const CSV_HEADERS: [&str; 9] = [
    "ticket",
    "kind",
    "status",
    "name",
    "email",
    "phone",
    "message",
    "age_hours",
    "ts",
];

/// Characters of message text kept per row
pub const MESSAGE_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Nothing to export")]
    Empty,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Render `items` as CSV text
pub fn export_csv(items: &[Ticket]) -> Result<String, ExportError> {
    if items.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut out = Vec::new();
    out.extend_from_slice(CSV_HEADERS.join(",").as_bytes());
    out.extend_from_slice(b"\r\n");

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(out);

    for t in items {
        writer.write_record(csv_row(t))?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Write exported CSV text to `path`, creating parent directories
pub fn write_csv(csv: &str, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, csv)?;
    tracing::info!(path = %path.display(), bytes = csv.len(), "Exported tickets");
    Ok(())
}

/// `<dir>/tickets_<YYYY-MM-DD>.csv`
pub fn default_export_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(csv_file_name(date))
}

pub fn csv_file_name(date: NaiveDate) -> String {
    format!("tickets_{}.csv", date.format("%Y-%m-%d"))
}

fn csv_row(t: &Ticket) -> [String; 9] {
    let message = collapse_whitespace(&strip_tags(t.body_text()));
    [
        t.ticket.clone(),
        t.kind.clone(),
        t.status.to_string(),
        t.name.clone(),
        t.email.clone(),
        t.phone.clone(),
        truncate_chars(&message, MESSAGE_CHARS),
        t.age_hours.to_string(),
        t.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    ]
}
