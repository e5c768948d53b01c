//! # Lantern Telemetry
//!
//! Client-side telemetry pipeline: structured log entries are redacted,
//! buffered in memory and shipped to a remote collector in batches, with an
//! offline analyzer for trends and anomalies over collected history.
//!
//! ## Features
//!
//! - **Level gating**: total order `debug < info < warn < error < critical`
//! - **Privacy**: field masking and pattern redaction before any sink sees an entry
//! - **Batching**: capacity and interval triggered flushes, delivered off the hot path
//! - **Best-effort delivery**: one attempt per batch, failed batches are dropped
//! - **Analytics**: counts, error rate, daily trends, spike/performance/pattern anomalies
//! - **Export**: JSON, CSV and plain text support bundles
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lantern_telemetry::{HttpTransport, Logger, LoggerConfig};
//!
//! #[tokio::main]
//! async fn main() -> lantern_telemetry::Result<()> {
//!     let config = LoggerConfig::default();
//!     let transport = Arc::new(HttpTransport::new(&config.server)?);
//!     let logger = Logger::new(config, transport)?;
//!
//!     logger.info("Application started", Some("app"), None);
//!     logger.destroy().await;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod analysis;
pub mod buffer;
pub mod config;
pub mod console;
pub mod entry;
pub mod export;
pub mod filters;
pub mod history;
pub mod level;
pub mod logger;
pub mod metadata;
pub mod redaction;
pub mod transport;


pub use analysis::{analyze, AnalysisResult, Anomaly, AnomalyKind, AnomalySeverity, LogQuery};
pub use config::{Destination, Environment, LoggerConfig};
pub use entry::{Context, ContextBuilder, EntryFactory, LogEntry};
pub use export::ExportFormat;
pub use level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use transport::{DeliveryOutcome, HttpTransport, Transport};

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Telemetry-specific errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid log level: '{value}'")]
    InvalidLevel { value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Telemetry system error: {message}")]
    System { message: String },
}
