//! Privacy redaction for entry context and messages

use crate::{config::PrivacyConfig, entry::Context, Error, Result};
use regex::Regex;
use serde_json::Value;

/// Replacement for pattern matches
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Masks sensitive fields and redacts sensitive patterns.
///
/// Field masking keeps the first two and last two characters of values longer
/// than four characters and stars out the rest; shorter values are starred out
/// entirely. Pattern redaction replaces every match in every string value with
/// [`REDACTION_MARKER`]. Both passes are idempotent, so redacting twice never
/// loses more information than redacting once.
///
/// A key is sensitive when a run of its words spells a configured field name.
/// Words split on `_`, `-`, `.`, whitespace, camelCase humps and letter/digit
/// changes, and compare case-insensitively: `apiKey` matches `x-api-key`,
/// `APIKEY` and `userApiKey`, while `ssn` does not match `className`.
#[derive(Debug, Clone)]
pub struct Redactor {
    mask_fields: bool,
    sensitive_fields: Vec<String>,
    patterns: Vec<Regex>,
}

impl Redactor {
    /// Create a redactor, failing on the first invalid pattern
    pub fn new(config: &PrivacyConfig) -> Result<Self> {
        if !config.mask_sensitive_data {
            return Ok(Self::disabled());
        }

        let mut patterns = Vec::new();

        if config.enable_redaction {
            for pattern_str in &config.mask_patterns {
                let regex = Regex::new(pattern_str).map_err(|e| Error::Config {
                    message: format!("Invalid mask pattern '{}': {}", pattern_str, e),
                })?;
                patterns.push(regex);
            }
        }

        Ok(Self {
            mask_fields: true,
            sensitive_fields: config
                .sensitive_fields
                .iter()
                .map(|field| key_words(field).concat())
                .filter(|field| !field.is_empty())
                .collect(),
            patterns,
        })
    }

    /// A redactor that leaves everything untouched
    pub fn disabled() -> Self {
        Self {
            mask_fields: false,
            sensitive_fields: Vec::new(),
            patterns: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.mask_fields || !self.patterns.is_empty()
    }

    /// Redact a context map, returning the redacted copy
    pub fn redact(&self, context: &Context) -> Context {
        let mut redacted = context.clone();
        if self.is_active() {
            self.redact_map(&mut redacted);
        }
        redacted
    }

    /// Apply pattern redaction to free text
    pub fn redact_text(&self, text: &str) -> String {
        let mut redacted = text.to_string();
        for pattern in &self.patterns {
            if pattern.is_match(&redacted) {
                redacted = pattern
                    .replace_all(&redacted, REDACTION_MARKER)
                    .into_owned();
            }
        }
        redacted
    }

    fn redact_map(&self, map: &mut Context) {
        for (key, value) in map.iter_mut() {
            if self.mask_fields && self.is_sensitive(key) {
                *value = mask_value(value);
                if let Value::String(s) = value {
                    *s = self.redact_text(s);
                }
            } else {
                self.redact_value(value);
            }
        }
    }

    fn redact_value(&self, value: &mut Value) {
        match value {
            Value::Object(map) => self.redact_map(map),
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.redact_value(item);
                }
            }
            Value::String(s) => {
                *s = self.redact_text(s);
            }
            // Numbers, booleans and null carry no free text
            _ => {}
        }
    }

    fn is_sensitive(&self, key: &str) -> bool {
        let words = key_words(key);
        (0..words.len()).any(|start| {
            let mut run = String::new();
            words[start..].iter().any(|word| {
                run.push_str(word);
                self.sensitive_fields.contains(&run)
            })
        })
    }
}

/// Lowercased words of a context key
fn key_words(key: &str) -> Vec<String> {
    let chars: Vec<char> = key.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        // `current` is non-empty only when chars[i - 1] was alphanumeric
        if !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (c.is_uppercase() && !prev.is_uppercase())
                || (c.is_uppercase() && prev.is_uppercase() && next_is_lower)
                || (c.is_numeric() != prev.is_numeric());
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Mask a sensitive value, keeping two characters at each end of long strings
pub fn mask_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(mask_str(s)),
        other => Value::String(mask_str(&other.to_string())),
    }
}

fn mask_str(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();

    if len > 4 {
        let mut masked = String::with_capacity(s.len());
        masked.extend(&chars[..2]);
        masked.extend(std::iter::repeat('*').take(len - 4));
        masked.extend(&chars[len - 2..]);
        masked
    } else {
        "*".repeat(len)
    }
}
