//! Severity levels and threshold gating

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    /// Every level, lowest severity first
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    /// Position in the severity order (debug = 0)
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// True iff `level` is at least as severe as `threshold`
    pub fn is_enabled(level: LogLevel, threshold: LogLevel) -> bool {
        level.rank() >= threshold.rank()
    }

    /// All levels at or above `threshold`, lowest first
    pub fn at_or_above(threshold: LogLevel) -> impl Iterator<Item = LogLevel> {
        Self::ALL
            .into_iter()
            .filter(move |level| Self::is_enabled(*level, threshold))
    }

    /// Error and critical entries count as failures in analytics
    pub fn is_failure(self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }

    /// Upper-case label used by the console and text export
    pub fn as_label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            _ => Err(Error::InvalidLevel {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_total_order() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn test_threshold_gating() {
        assert!(LogLevel::is_enabled(LogLevel::Error, LogLevel::Warn));
        assert!(LogLevel::is_enabled(LogLevel::Warn, LogLevel::Warn));
        assert!(!LogLevel::is_enabled(LogLevel::Info, LogLevel::Warn));
    }

    #[test]
    fn test_at_or_above() {
        let levels: Vec<_> = LogLevel::at_or_above(LogLevel::Warn).collect();
        assert_eq!(
            levels,
            vec![LogLevel::Warn, LogLevel::Error, LogLevel::Critical]
        );
        assert_eq!(LogLevel::at_or_above(LogLevel::Debug).count(), 5);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("Critical".parse::<LogLevel>().unwrap(), LogLevel::Critical);
        assert_eq!(" warn ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        for bad in ["", "warning", "fatal", "trace", "infoo"] {
            let err = bad.parse::<LogLevel>().unwrap_err();
            assert!(matches!(err, Error::InvalidLevel { .. }), "{bad}");
        }
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&LogLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let level: LogLevel = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(level, LogLevel::Warn);
    }

    fn any_level() -> impl Strategy<Value = LogLevel> {
        prop::sample::select(LogLevel::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn test_is_enabled_is_monotonic(
            level in any_level(),
            higher in any_level(),
            threshold in any_level(),
        ) {
            if LogLevel::is_enabled(level, threshold) && higher.rank() >= level.rank() {
                prop_assert!(LogLevel::is_enabled(higher, threshold));
            }
        }
    }
}
