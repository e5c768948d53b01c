//! Spike, performance and pattern anomaly detection

use crate::entry::LogEntry;
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Error/critical entries in one hour above this count form a spike
pub const SPIKE_THRESHOLD: usize = 10;
/// Spikes above this count are high severity
pub const SPIKE_HIGH_THRESHOLD: usize = 50;
/// Durations above this many milliseconds are slow
pub const SLOW_DURATION_MS: f64 = 5000.0;
/// More slow entries than this produce a performance finding
pub const SLOW_COUNT_THRESHOLD: usize = 5;
/// A message repeated more than this many times is a pattern
pub const PATTERN_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Spike,
    Performance,
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub severity: AnomalySeverity,
    pub description: String,
    /// Entries behind the finding
    pub count: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Repeated message, for pattern findings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Run all three passes and concatenate their findings
pub fn detect(entries: &[LogEntry]) -> Vec<Anomaly> {
    let mut anomalies = detect_spikes(entries);
    anomalies.extend(detect_slow_operations(entries));
    anomalies.extend(detect_patterns(entries));
    anomalies
}

/// One finding per clock hour with more than [`SPIKE_THRESHOLD`] failures
pub fn detect_spikes(entries: &[LogEntry]) -> Vec<Anomaly> {
    let mut per_hour: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();

    for entry in entries.iter().filter(|e| e.level().is_failure()) {
        if let Some(hour) = hour_start(entry.timestamp()) {
            *per_hour.entry(hour).or_default() += 1;
        }
    }

    per_hour
        .into_iter()
        .filter(|(_, count)| *count > SPIKE_THRESHOLD)
        .map(|(start, count)| {
            let severity = if count > SPIKE_HIGH_THRESHOLD {
                AnomalySeverity::High
            } else {
                AnomalySeverity::Medium
            };
            Anomaly {
                kind: AnomalyKind::Spike,
                severity,
                description: format!(
                    "{} errors within the hour starting {}",
                    count,
                    start.to_rfc3339()
                ),
                count,
                start,
                end: start + Duration::hours(1),
                message: None,
            }
        })
        .collect()
}

/// A single finding when more than [`SLOW_COUNT_THRESHOLD`] entries are slow
pub fn detect_slow_operations(entries: &[LogEntry]) -> Option<Anomaly> {
    let slow: Vec<DateTime<Utc>> = entries
        .iter()
        .filter(|e| e.duration().is_some_and(|d| d > SLOW_DURATION_MS))
        .map(LogEntry::timestamp)
        .collect();

    if slow.len() <= SLOW_COUNT_THRESHOLD {
        return None;
    }

    let (start, end) = time_range(slow.iter().copied())?;
    Some(Anomaly {
        kind: AnomalyKind::Performance,
        severity: AnomalySeverity::Medium,
        description: format!(
            "{} operations took longer than {}ms",
            slow.len(),
            SLOW_DURATION_MS
        ),
        count: slow.len(),
        start,
        end,
        message: None,
    })
}

/// One finding per message repeated more than [`PATTERN_THRESHOLD`] times
pub fn detect_patterns(entries: &[LogEntry]) -> Vec<Anomaly> {
    let Some((start, end)) = time_range(entries.iter().map(LogEntry::timestamp)) else {
        return Vec::new();
    };

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.message()).or_default() += 1;
    }

    let repeated: BTreeMap<&str, usize> = counts
        .into_iter()
        .filter(|(_, count)| *count > PATTERN_THRESHOLD)
        .collect();

    repeated
        .into_iter()
        .map(|(message, count)| Anomaly {
            kind: AnomalyKind::Pattern,
            severity: AnomalySeverity::Low,
            description: format!("Message repeated {} times", count),
            count,
            start,
            end,
            message: Some(message.to_string()),
        })
        .collect()
}

fn hour_start(ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
    ts.date_naive()
        .and_hms_opt(ts.hour(), 0, 0)
        .map(|naive| naive.and_utc())
}

fn time_range(
    timestamps: impl Iterator<Item = DateTime<Utc>>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    timestamps.fold(None, |range, ts| match range {
        None => Some((ts, ts)),
        Some((start, end)) => Some((start.min(ts), end.max(ts))),
    })
}
