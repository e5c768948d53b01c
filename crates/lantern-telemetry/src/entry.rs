//! Immutable log entries and the factory that builds them

use crate::{
    config::{Environment, LoggerConfig},
    level::LogLevel,
    metadata::{self, EntryMetadata, MetadataSource, PerformanceMarks},
    redaction::Redactor,
    Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Structured context attached to an entry
pub type Context = Map<String, Value>;

/// Origin marker stamped on every entry
pub const SOURCE_CLIENT: &str = "client";

/// Stand-in for context values that could not be converted to JSON
pub const UNSERIALIZABLE_MARKER: &str = "[UNSERIALIZABLE]";

const ELLIPSIS: &str = "...";

/// One structured log record. Entries are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    id: Uuid,
    timestamp: DateTime<Utc>,
    level: LogLevel,
    message: String,
    tag: Option<String>,
    #[serde(default)]
    context: Context,
    source: String,
    environment: Environment,
    #[serde(default)]
    metadata: EntryMetadata,
}

impl LogEntry {
    /// A bare entry stamped now, without redaction or metadata.
    ///
    /// Application code goes through [`EntryFactory`]; this is for tools that
    /// rebuild entries from history and for tests.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
            tag: None,
            context: Context::new(),
            source: SOURCE_CLIENT.to_string(),
            environment: Environment::Development,
            metadata: EntryMetadata::default(),
        }
    }

    pub fn with_tag(self, tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..self
        }
    }

    pub fn with_context(self, context: Context) -> Self {
        Self { context, ..self }
    }

    pub fn with_timestamp(self, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, ..self }
    }

    pub fn with_environment(self, environment: Environment) -> Self {
        Self {
            environment,
            ..self
        }
    }

    pub fn with_metadata(self, metadata: EntryMetadata) -> Self {
        Self { metadata, ..self }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    /// Duration recorded in metadata, in milliseconds
    pub fn duration(&self) -> Option<f64> {
        self.metadata.duration
    }
}

/// Builds a context map from arbitrary serializable values
#[derive(Debug, Default)]
pub struct ContextBuilder {
    context: Context,
    failed_keys: Vec<String>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; a value that fails to serialize becomes [`UNSERIALIZABLE_MARKER`]
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let key = key.into();
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(
                    telemetry.event = "context_value_unserializable",
                    key = %key,
                    error = %e,
                    "Replacing context value with marker"
                );
                self.failed_keys.push(key.clone());
                Value::String(UNSERIALIZABLE_MARKER.to_string())
            }
        };
        self.context.insert(key, value);
        self
    }

    /// Keys whose values had to be replaced
    pub fn failed_keys(&self) -> &[String] {
        &self.failed_keys
    }

    pub fn build(self) -> Context {
        self.context
    }
}

/// Convert any JSON value into a context map, wrapping non-objects under `value`
pub fn to_context(value: Value) -> Context {
    match value {
        Value::Object(map) => map,
        Value::Null => Context::new(),
        other => {
            let mut map = Context::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// Truncate by characters, ending with an ellipsis when shortened
pub fn truncate_message(message: &str, max_length: usize) -> String {
    if message.chars().count() <= max_length {
        return message.to_string();
    }

    let keep = max_length.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Wall clock that never goes backwards
#[derive(Debug)]
pub struct MonotonicClock {
    last: Mutex<DateTime<Utc>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now().max(*last);
        *last = now;
        now
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates fully populated, redacted entries
pub struct EntryFactory {
    max_message_length: usize,
    environment: Environment,
    redactor: Redactor,
    metadata: Arc<dyn MetadataSource>,
    marks: Arc<PerformanceMarks>,
    clock: Arc<MonotonicClock>,
}

impl EntryFactory {
    pub fn new(
        config: &LoggerConfig,
        metadata: Arc<dyn MetadataSource>,
        marks: Arc<PerformanceMarks>,
        clock: Arc<MonotonicClock>,
    ) -> Result<Self> {
        Ok(Self {
            max_message_length: config.filters.max_message_length,
            environment: config.environment,
            redactor: Redactor::new(&config.privacy)?,
            metadata,
            marks,
            clock,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn create(
        &self,
        level: LogLevel,
        message: &str,
        tag: Option<&str>,
        context: Option<&Context>,
    ) -> LogEntry {
        let message = truncate_message(&self.redactor.redact_text(message), self.max_message_length);

        let context = context
            .map(|ctx| self.redactor.redact(ctx))
            .unwrap_or_default();

        let duration = ["duration", "durationMs"]
            .iter()
            .find_map(|key| context.get(*key).and_then(Value::as_f64));

        LogEntry {
            id: Uuid::now_v7(),
            timestamp: self.clock.now(),
            level,
            message,
            tag: tag.map(str::to_string),
            context,
            source: SOURCE_CLIENT.to_string(),
            environment: self.environment,
            metadata: metadata::gather(self.metadata.as_ref(), &self.marks, duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ProcessMetadata;
    use serde_json::json;
    use std::collections::HashSet;

    fn factory(config: &LoggerConfig) -> EntryFactory {
        EntryFactory::new(
            config,
            Arc::new(ProcessMetadata::new()),
            Arc::new(PerformanceMarks::new()),
            Arc::new(MonotonicClock::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_truncation_keeps_total_length() {
        let truncated = truncate_message("validatePassword failed badly", 10);

        assert_eq!(truncated, "validat...");
        assert_eq!(truncated.chars().count(), 10);
    }

    #[test]
    fn test_truncation_edge_cases() {
        assert_eq!(truncate_message("short", 10), "short");
        assert_eq!(truncate_message("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_message("abcdef", 2), "...");
        assert_eq!(truncate_message("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_create_populates_entry() {
        let mut config = LoggerConfig::default();
        config.privacy.sensitive_fields = vec!["password".to_string()];
        let factory = factory(&config);

        let context = to_context(json!({ "password": "abcdefgh", "attempt": 2 }));
        let entry = factory.create(LogLevel::Warn, "login failed", Some("auth"), Some(&context));

        assert_eq!(entry.level(), LogLevel::Warn);
        assert_eq!(entry.message(), "login failed");
        assert_eq!(entry.tag(), Some("auth"));
        assert_eq!(entry.context()["password"], "ab****gh");
        assert_eq!(entry.context()["attempt"], 2);
        assert_eq!(entry.source(), SOURCE_CLIENT);
        assert_eq!(entry.environment(), Environment::Development);
        assert!(entry.metadata().user_agent.is_some());
    }

    #[test]
    fn test_message_is_redacted_before_truncation() {
        let mut config = LoggerConfig::default();
        config.filters.max_message_length = 30;
        let factory = factory(&config);

        let entry = factory.create(
            LogLevel::Info,
            "mail to someone.long@example.com",
            None,
            None,
        );
        assert_eq!(entry.message(), "mail to [REDACTED]");
    }

    #[test]
    fn test_duration_is_lifted_into_metadata() {
        let factory = factory(&LoggerConfig::default());
        let context = to_context(json!({ "duration": 6200 }));

        let entry = factory.create(LogLevel::Info, "slow", None, Some(&context));
        assert_eq!(entry.duration(), Some(6200.0));

        let entry = factory.create(LogLevel::Info, "fast", None, None);
        assert_eq!(entry.duration(), None);
    }

    #[test]
    fn test_ids_unique_and_timestamps_monotonic() {
        let factory = factory(&LoggerConfig::default());
        let entries: Vec<_> = (0..500)
            .map(|i| factory.create(LogLevel::Debug, &format!("m{i}"), None, None))
            .collect();

        let ids: HashSet<_> = entries.iter().map(LogEntry::id).collect();
        assert_eq!(ids.len(), entries.len());
        assert!(entries
            .iter()
            .all(|entry| entry.id().get_version() == Some(uuid::Version::SortRand)));
        assert!(entries
            .windows(2)
            .all(|pair| pair[0].timestamp() <= pair[1].timestamp()));
    }

    #[test]
    fn test_context_builder_marks_unserializable_values() {
        use std::collections::HashMap;

        // Maps with non-string keys cannot become JSON objects
        let mut bad = HashMap::new();
        bad.insert((1, 2), "pair");

        let builder = ContextBuilder::new()
            .with("score", 1200)
            .with("bad", bad)
            .with("player", "ana");

        assert_eq!(builder.failed_keys(), ["bad".to_string()]);
        let context = builder.build();
        assert_eq!(context["score"], 1200);
        assert_eq!(context["bad"], UNSERIALIZABLE_MARKER);
        assert_eq!(context["player"], "ana");
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = LogEntry::new(LogLevel::Error, "boom").with_tag("api");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["level"], "error");
        assert_eq!(json["tag"], "api");
        assert_eq!(json["source"], "client");
        assert_eq!(json["environment"], "development");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));

        let back: LogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_to_context_wraps_scalars() {
        assert_eq!(to_context(json!(5))["value"], 5);
        assert!(to_context(Value::Null).is_empty());
    }
}
