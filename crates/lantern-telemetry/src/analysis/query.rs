use crate::{entry::LogEntry, level::LogLevel};
use chrono::{DateTime, Utc};

/// Selects entries from history before analysis or export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogQuery {
    pub min_level: Option<LogLevel>,
    /// Empty matches every entry, tagged or not
    pub tags: Vec<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the message
    pub search: Option<String>,
    /// Keep only the most recent matches
    pub limit: Option<usize>,
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn between(mut self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.until = Some(until);
        self
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(min) = self.min_level {
            if !LogLevel::is_enabled(entry.level(), min) {
                return false;
            }
        }

        if !self.tags.is_empty() {
            match entry.tag() {
                Some(tag) if self.tags.iter().any(|t| t == tag) => {}
                _ => return false,
            }
        }

        if self.since.is_some_and(|since| entry.timestamp() < since) {
            return false;
        }
        if self.until.is_some_and(|until| entry.timestamp() > until) {
            return false;
        }

        match &self.search {
            Some(needle) => entry
                .message()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }

    /// Matching entries in input order
    pub fn apply(&self, entries: &[LogEntry]) -> Vec<LogEntry> {
        let mut matched: Vec<LogEntry> = entries
            .iter()
            .filter(|entry| self.matches(entry))
            .cloned()
            .collect();

        if let Some(limit) = self.limit {
            let excess = matched.len().saturating_sub(limit);
            matched.drain(..excess);
        }

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0).unwrap()
    }

    fn history() -> Vec<LogEntry> {
        vec![
            LogEntry::new(LogLevel::Debug, "cache warm").with_timestamp(at(0)),
            LogEntry::new(LogLevel::Info, "User logged in")
                .with_tag("auth")
                .with_timestamp(at(1)),
            LogEntry::new(LogLevel::Error, "Login FAILED")
                .with_tag("auth")
                .with_timestamp(at(2)),
            LogEntry::new(LogLevel::Warn, "slow response")
                .with_tag("api")
                .with_timestamp(at(3)),
        ]
    }

    fn messages(entries: &[LogEntry]) -> Vec<&str> {
        entries.iter().map(LogEntry::message).collect()
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert_eq!(LogQuery::new().apply(&history()).len(), 4);
    }

    #[test]
    fn test_level_and_tag() {
        let entries = history();
        let query = LogQuery::new().min_level(LogLevel::Info).tag("auth");

        assert_eq!(messages(&query.apply(&entries)), ["User logged in", "Login FAILED"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let entries = history();
        let query = LogQuery::new().search("login");

        assert_eq!(messages(&query.apply(&entries)), ["Login FAILED"]);
    }

    #[test]
    fn test_time_window_is_inclusive() {
        let entries = history();
        let query = LogQuery::new().between(at(1), at(2));

        assert_eq!(messages(&query.apply(&entries)), ["User logged in", "Login FAILED"]);
    }

    #[test]
    fn test_limit_keeps_most_recent() {
        let entries = history();

        let query = LogQuery::new().limit(2);
        assert_eq!(messages(&query.apply(&entries)), ["Login FAILED", "slow response"]);

        assert!(LogQuery::new().limit(0).apply(&entries).is_empty());
        assert_eq!(LogQuery::new().limit(10).apply(&entries).len(), 4);
    }
}
