//! Developer console sink

use crate::{config::ConsoleConfig, entry::LogEntry, level::LogLevel};
use chrono::SecondsFormat;
use colored::{ColoredString, Colorize};
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex};

/// Where console lines go
#[derive(Debug, Clone, Default)]
pub enum ConsoleTarget {
    /// warn and above to stderr, the rest to stdout
    #[default]
    Std,
    /// Collect lines in memory
    Capture(Arc<Mutex<Vec<u8>>>),
}

impl ConsoleTarget {
    pub fn capture() -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        (ConsoleTarget::Capture(Arc::clone(&buf)), buf)
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleSink {
    colors: bool,
    timestamps: bool,
    level: LogLevel,
    target: ConsoleTarget,
}

impl ConsoleSink {
    pub fn new(config: &ConsoleConfig, target: ConsoleTarget) -> Self {
        let colors = match target {
            ConsoleTarget::Std => config.colors && io::stdout().is_terminal(),
            ConsoleTarget::Capture(_) => false,
        };

        Self {
            colors,
            timestamps: config.timestamps,
            level: config.level,
            target,
        }
    }

    /// Write an entry if it meets the console's own threshold
    pub fn write_entry(&self, entry: &LogEntry) {
        if !LogLevel::is_enabled(entry.level(), self.level) {
            return;
        }

        let line = if self.colors {
            format_colored(entry, self.timestamps)
        } else {
            format_entry(entry, self.timestamps)
        };
        self.write_line(entry.level(), &line);
    }

    /// Pipeline diagnostic for developers
    pub fn diagnostic(&self, message: &str) {
        let line = format!("[lantern] {}", message);
        self.write_line(LogLevel::Warn, &line);
    }

    fn write_line(&self, level: LogLevel, line: &str) {
        // Console failures are not worth surfacing anywhere
        let _ = match &self.target {
            ConsoleTarget::Std if level >= LogLevel::Warn => writeln!(io::stderr().lock(), "{}", line),
            ConsoleTarget::Std => writeln!(io::stdout().lock(), "{}", line),
            ConsoleTarget::Capture(buf) => {
                let mut buf = buf.lock().unwrap_or_else(|e| e.into_inner());
                writeln!(buf, "{}", line)
            }
        };
    }
}

/// `<ISO timestamp> <LEVEL padded> [<tag>] <message> <context>`
pub fn format_entry(entry: &LogEntry, timestamps: bool) -> String {
    let mut line = String::new();

    if timestamps {
        line.push_str(&entry.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true));
        line.push(' ');
    }

    line.push_str(&format!("{:<8} ", entry.level().as_label()));

    if let Some(tag) = entry.tag() {
        line.push_str(&format!("[{}] ", tag));
    }

    line.push_str(entry.message());

    if !entry.context().is_empty() {
        // A Map<String, Value> always serializes
        if let Ok(context) = serde_json::to_string(entry.context()) {
            line.push(' ');
            line.push_str(&context);
        }
    }

    line
}

fn format_colored(entry: &LogEntry, timestamps: bool) -> String {
    let mut line = String::new();

    if timestamps {
        let ts = entry.timestamp().to_rfc3339_opts(SecondsFormat::Millis, true);
        line.push_str(&format!("{} ", ts.dimmed()));
    }

    line.push_str(&format!("{} ", level_label(entry.level())));

    if let Some(tag) = entry.tag() {
        line.push_str(&format!("{} ", format!("[{}]", tag).cyan()));
    }

    line.push_str(entry.message());

    if !entry.context().is_empty() {
        if let Ok(context) = serde_json::to_string(entry.context()) {
            line.push_str(&format!(" {}", context.dimmed()));
        }
    }

    line
}

fn level_label(level: LogLevel) -> ColoredString {
    let label = format!("{:<8}", level.as_label());
    match level {
        LogLevel::Debug => label.bright_black(),
        LogLevel::Info => label.blue(),
        LogLevel::Warn => label.yellow(),
        LogLevel::Error => label.red(),
        LogLevel::Critical => label.white().on_red().bold(),
    }
}
