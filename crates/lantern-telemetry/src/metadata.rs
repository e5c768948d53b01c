//! Best-effort runtime metadata attached to entries

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

/// Marks kept in memory; entries carry the most recent [`MARKS_PER_ENTRY`]
const MARK_CAPACITY: usize = 32;
pub const MARKS_PER_ENTRY: usize = 5;

/// Runtime facts gathered when an entry is created. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Resident memory as a fraction of total memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,

    /// Recorded operation duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performance_marks: Vec<PerformanceMark>,
}

/// A named point in time relative to logger start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMark {
    pub name: String,
    pub elapsed_ms: f64,
}

/// Source of environment facts. Each accessor may fail independently.
pub trait MetadataSource: Send + Sync {
    fn user_agent(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn url(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn memory_usage(&self) -> Result<Option<f64>> {
        Ok(None)
    }
}

/// Metadata describing the current process
#[derive(Debug, Clone)]
pub struct ProcessMetadata {
    user_agent: String,
    url: Option<String>,
}

impl ProcessMetadata {
    pub fn new() -> Self {
        Self {
            user_agent: format!(
                "lantern/{} ({}; {})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            url: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Location the application is currently showing, if it has one
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl Default for ProcessMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for ProcessMetadata {
    fn user_agent(&self) -> Result<Option<String>> {
        Ok(Some(self.user_agent.clone()))
    }

    fn url(&self) -> Result<Option<String>> {
        Ok(self.url.clone())
    }

    /// Resident set size as a fraction of physical memory
    #[cfg(target_os = "linux")]
    fn memory_usage(&self) -> Result<Option<f64>> {
        let status = std::fs::read_to_string("/proc/self/status")?;
        let resident_kb = kb_field(&status, "VmRSS:").ok_or_else(|| Error::System {
            message: "VmRSS missing from /proc/self/status".to_string(),
        })?;

        let meminfo = std::fs::read_to_string("/proc/meminfo")?;
        let total_kb = kb_field(&meminfo, "MemTotal:").ok_or_else(|| Error::System {
            message: "MemTotal missing from /proc/meminfo".to_string(),
        })?;

        if total_kb == 0 {
            return Ok(None);
        }
        Ok(Some(resident_kb as f64 / total_kb as f64))
    }
}

/// Value of a `Name:   1234 kB` line from a procfs file
#[cfg(any(target_os = "linux", test))]
fn kb_field(content: &str, name: &str) -> Option<u64> {
    content
        .lines()
        .find(|line| line.starts_with(name))
        .and_then(|line| line[name.len()..].split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

/// Bounded record of named performance marks
#[derive(Debug)]
pub struct PerformanceMarks {
    start: Instant,
    marks: Mutex<VecDeque<PerformanceMark>>,
}

impl PerformanceMarks {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: Mutex::new(VecDeque::with_capacity(MARK_CAPACITY)),
        }
    }

    /// Record a mark, evicting the oldest when full
    pub fn mark(&self, name: impl Into<String>) -> PerformanceMark {
        let mark = PerformanceMark {
            name: name.into(),
            elapsed_ms: self.start.elapsed().as_secs_f64() * 1000.0,
        };

        let mut marks = self.marks.lock().unwrap_or_else(|e| e.into_inner());
        if marks.len() >= MARK_CAPACITY {
            marks.pop_front();
        }
        marks.push_back(mark.clone());
        mark
    }

    /// Most recent marks, oldest first
    pub fn recent(&self, count: usize) -> Vec<PerformanceMark> {
        let marks = self.marks.lock().unwrap_or_else(|e| e.into_inner());
        let skip = marks.len().saturating_sub(count);
        marks.iter().skip(skip).cloned().collect()
    }
}

impl Default for PerformanceMarks {
    fn default() -> Self {
        Self::new()
    }
}

/// Gather metadata, keeping whatever fields could be collected
pub fn gather(
    source: &dyn MetadataSource,
    marks: &PerformanceMarks,
    duration: Option<f64>,
) -> EntryMetadata {
    EntryMetadata {
        user_agent: best_effort("user_agent", source.user_agent()),
        url: best_effort("url", source.url()),
        memory_usage: best_effort("memory_usage", source.memory_usage()),
        duration,
        performance_marks: marks.recent(MARKS_PER_ENTRY),
    }
}

fn best_effort<T>(field: &'static str, value: Result<Option<T>>) -> Option<T> {
    match value {
        Ok(value) => value,
        Err(e) => {
            tracing::trace!(
                telemetry.event = "metadata_unavailable",
                field,
                error = %e,
                "Skipping metadata field"
            );
            None
        }
    }
}
