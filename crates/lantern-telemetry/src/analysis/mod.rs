//! Offline analytics over collected entries.
//!
//! [`analyze`] is a pure function of its input: it keeps no state between
//! calls and can run concurrently on different snapshots.

pub mod anomaly;
pub mod query;

use crate::{entry::LogEntry, level::LogLevel};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub use anomaly::{Anomaly, AnomalyKind, AnomalySeverity};
pub use query::LogQuery;

/// Number of repeated error messages reported
pub const TOP_ERRORS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_entries: usize,
    /// Every level is present, zero when unseen
    pub counts_by_level: BTreeMap<LogLevel, usize>,
    /// Untagged entries are not counted here
    pub counts_by_tag: BTreeMap<String, usize>,
    /// Share of error and critical entries, in percent
    pub error_rate: f64,
    /// Mean of recorded durations in milliseconds, if any entry has one
    pub average_duration: Option<f64>,
    pub top_errors: Vec<RepeatedError>,
    pub trends: Vec<TrendPoint>,
    pub anomalies: Vec<Anomaly>,
}

/// An error message and how often it occurred
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedError {
    pub message: String,
    pub count: usize,
    pub last_seen: DateTime<Utc>,
}

/// Entry count for one level on one UTC day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub level: LogLevel,
    pub count: usize,
}

pub fn analyze(entries: &[LogEntry]) -> AnalysisResult {
    let mut counts_by_level: BTreeMap<LogLevel, usize> =
        LogLevel::ALL.iter().map(|level| (*level, 0)).collect();
    let mut counts_by_tag: BTreeMap<String, usize> = BTreeMap::new();
    let mut errors: HashMap<&str, (usize, DateTime<Utc>)> = HashMap::new();
    let mut trend_counts: BTreeMap<(NaiveDate, LogLevel), usize> = BTreeMap::new();
    let mut duration_sum = 0.0;
    let mut duration_count = 0usize;

    for entry in entries {
        *counts_by_level.entry(entry.level()).or_default() += 1;

        if let Some(tag) = entry.tag() {
            *counts_by_tag.entry(tag.to_string()).or_default() += 1;
        }

        if let Some(duration) = entry.duration() {
            duration_sum += duration;
            duration_count += 1;
        }

        if entry.level().is_failure() {
            let slot = errors
                .entry(entry.message())
                .or_insert((0, entry.timestamp()));
            slot.0 += 1;
            slot.1 = slot.1.max(entry.timestamp());
        }

        *trend_counts
            .entry((entry.timestamp().date_naive(), entry.level()))
            .or_default() += 1;
    }

    let total = entries.len();
    let failures = counts_by_level[&LogLevel::Error] + counts_by_level[&LogLevel::Critical];

    AnalysisResult {
        total_entries: total,
        counts_by_level,
        counts_by_tag,
        error_rate: error_rate(failures, total),
        average_duration: (duration_count > 0).then(|| duration_sum / duration_count as f64),
        top_errors: top_errors(errors),
        trends: trend_counts
            .into_iter()
            .map(|((date, level), count)| TrendPoint { date, level, count })
            .collect(),
        anomalies: anomaly::detect(entries),
    }
}

fn error_rate(failures: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        failures as f64 / total as f64 * 100.0
    }
}

fn top_errors(errors: HashMap<&str, (usize, DateTime<Utc>)>) -> Vec<RepeatedError> {
    let mut repeated: Vec<RepeatedError> = errors
        .into_iter()
        .map(|(message, (count, last_seen))| RepeatedError {
            message: message.to_string(),
            count,
            last_seen,
        })
        .collect();

    repeated.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.last_seen.cmp(&a.last_seen))
            .then_with(|| a.message.cmp(&b.message))
    });
    repeated.truncate(TOP_ERRORS);
    repeated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::to_context;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
    }

    fn entry(level: LogLevel, message: &str, ts: DateTime<Utc>) -> LogEntry {
        LogEntry::new(level, message).with_timestamp(ts)
    }

    #[test]
    fn test_empty_input() {
        let result = analyze(&[]);

        assert_eq!(result.total_entries, 0);
        assert_eq!(result.error_rate, 0.0);
        assert_eq!(result.average_duration, None);
        assert!(result.counts_by_level.values().all(|count| *count == 0));
        assert!(result.top_errors.is_empty());
        assert!(result.trends.is_empty());
        assert!(result.anomalies.is_empty());
    }

    #[test]
    fn test_counts_and_error_rate() {
        let entries = vec![
            entry(LogLevel::Info, "a", at(1, 9, 0)).with_tag("auth"),
            entry(LogLevel::Info, "b", at(1, 9, 1)).with_tag("auth"),
            entry(LogLevel::Error, "c", at(1, 9, 2)).with_tag("api"),
            entry(LogLevel::Critical, "d", at(1, 9, 3)),
        ];

        let result = analyze(&entries);

        assert_eq!(result.total_entries, 4);
        assert_eq!(result.counts_by_level[&LogLevel::Info], 2);
        assert_eq!(result.counts_by_level[&LogLevel::Warn], 0);
        assert_eq!(result.counts_by_tag["auth"], 2);
        assert_eq!(result.counts_by_tag["api"], 1);
        assert_eq!(result.counts_by_tag.len(), 2);
        assert_eq!(result.error_rate, 50.0);
    }

    #[test]
    fn test_average_duration() {
        let entries = vec![
            LogEntry::new(LogLevel::Info, "x").with_context(to_context(json!({}))),
            entry(LogLevel::Info, "fast", at(1, 0, 0)).with_metadata(crate::metadata::EntryMetadata {
                duration: Some(100.0),
                ..Default::default()
            }),
            entry(LogLevel::Info, "slow", at(1, 0, 0)).with_metadata(crate::metadata::EntryMetadata {
                duration: Some(300.0),
                ..Default::default()
            }),
        ];

        assert_eq!(analyze(&entries).average_duration, Some(200.0));
    }

    #[test]
    fn test_top_errors_ranked_by_count() {
        let mut entries = Vec::new();
        for i in 0..12 {
            // error-0 occurs once, error-11 occurs twelve times
            for j in 0..=i {
                entries.push(entry(
                    LogLevel::Error,
                    &format!("error-{i}"),
                    at(2, 1, 0) + Duration::seconds(j as i64),
                ));
            }
        }
        entries.push(entry(LogLevel::Warn, "error-11", at(3, 0, 0)));

        let result = analyze(&entries);

        assert_eq!(result.top_errors.len(), TOP_ERRORS);
        assert_eq!(result.top_errors[0].message, "error-11");
        assert_eq!(result.top_errors[0].count, 12);
        assert_eq!(result.top_errors[0].last_seen, at(2, 1, 0) + Duration::seconds(11));
        assert_eq!(result.top_errors[9].message, "error-2");
        assert!(result
            .top_errors
            .windows(2)
            .all(|pair| pair[0].count >= pair[1].count));
    }

    #[test]
    fn test_trends_sorted_by_day_regardless_of_input_order() {
        let entries = vec![
            entry(LogLevel::Info, "c", at(3, 10, 0)),
            entry(LogLevel::Error, "a", at(1, 23, 59)),
            entry(LogLevel::Info, "b", at(1, 0, 0)),
            entry(LogLevel::Info, "b2", at(1, 5, 0)),
        ];

        let trends = analyze(&entries).trends;
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();

        assert_eq!(
            trends,
            vec![
                TrendPoint { date: day(1), level: LogLevel::Info, count: 2 },
                TrendPoint { date: day(1), level: LogLevel::Error, count: 1 },
                TrendPoint { date: day(3), level: LogLevel::Info, count: 1 },
            ]
        );
    }

    #[test]
    fn test_result_serializes_level_keys() {
        let result = analyze(&[entry(LogLevel::Warn, "w", at(1, 0, 0))]);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["countsByLevel"]["warn"], 1);
        assert_eq!(json["trends"][0]["date"], "2024-06-01");
    }
}
