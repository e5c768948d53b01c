//! Export formats for offline analysis and support bundles

use crate::{console::format_entry, entry::LogEntry, Error, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const CSV_HEADER: &str = "Timestamp,Level,Tag,Message,User ID,Context";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON array of entries
    Json,
    /// Fixed-header CSV
    Csv,
    /// One console-formatted line per entry
    Text,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(Error::Config {
                message: format!("Unknown export format '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "text",
        })
    }
}

pub fn export(entries: &[LogEntry], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(entries),
        ExportFormat::Csv => Ok(to_csv(entries)),
        ExportFormat::Text => Ok(to_text(entries)),
    }
}

pub fn to_json(entries: &[LogEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Read entries previously written by [`to_json`]
pub fn parse_json(input: &str) -> Result<Vec<LogEntry>> {
    Ok(serde_json::from_str(input)?)
}

pub fn to_csv(entries: &[LogEntry]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for entry in entries {
        let context = serde_json::to_string(entry.context())
            .unwrap_or_else(|_| crate::entry::UNSERIALIZABLE_MARKER.to_string());

        let row = [
            entry.timestamp().to_rfc3339(),
            entry.level().to_string(),
            entry.tag().unwrap_or_default().to_string(),
            entry.message().to_string(),
            user_id(entry).unwrap_or_default(),
            context,
        ];

        let row: Vec<String> = row.iter().map(|field| quote(field)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

pub fn to_text(entries: &[LogEntry]) -> String {
    entries
        .iter()
        .map(|entry| format_entry(entry, true) + "\n")
        .collect()
}

fn user_id(entry: &LogEntry) -> Option<String> {
    ["userId", "user_id"]
        .iter()
        .find_map(|key| entry.context().get(*key))
        .and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
