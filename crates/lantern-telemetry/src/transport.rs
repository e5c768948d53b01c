//! Best-effort batch delivery to the remote collector

use crate::{
    config::{Environment, ServerConfig},
    console::ConsoleSink,
    entry::LogEntry,
    Error, Result,
};
use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Client,
};
use serde::Serialize;

/// Sends one batch of entries somewhere
#[async_trait]
pub trait Transport: Send + Sync {
    /// Make a single delivery attempt
    async fn send(&self, batch: &[LogEntry]) -> Result<()>;
}

/// Request body accepted by the collector
#[derive(Debug, Serialize)]
pub struct LogBatch<'a> {
    pub logs: &'a [LogEntry],
}

/// POSTs `{"logs": [...]}` to the configured endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(concat!("lantern/", env!("CARGO_PKG_VERSION"))),
        );

        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Config {
                message: format!("Invalid header name '{}': {}", name, e),
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| Error::Config {
                message: format!("Invalid value for header '{}': {}", name, e),
            })?;
            headers.insert(name, value);
        }

        // reqwest performs no retries of its own, so `retry_attempts` has
        // nothing to drive here and every flush is exactly one request.
        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &[LogEntry]) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&LogBatch { logs: batch })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport {
                message: format!("collector at {} responded with {}", self.endpoint, status),
            });
        }

        Ok(())
    }
}

/// What happened to a flushed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { count: usize },
    /// The batch was discarded; it is never redelivered
    Dropped { count: usize, reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn count(&self) -> usize {
        match self {
            DeliveryOutcome::Delivered { count } | DeliveryOutcome::Dropped { count, .. } => *count,
        }
    }
}

/// Send a batch once, converting every failure into an outcome.
///
/// Failures reach the console only in development; elsewhere they are
/// recorded as debug events so console capture cannot feed back into logs.
pub async fn deliver(
    transport: &dyn Transport,
    batch: Vec<LogEntry>,
    environment: Environment,
    console: &ConsoleSink,
) -> DeliveryOutcome {
    let count = batch.len();
    if count == 0 {
        return DeliveryOutcome::Delivered { count };
    }

    match transport.send(&batch).await {
        Ok(()) => {
            tracing::trace!(
                telemetry.event = "batch_delivered",
                count,
                "Delivered log batch"
            );
            DeliveryOutcome::Delivered { count }
        }
        Err(e) => {
            let reason = e.to_string();
            if environment.is_development() {
                console.diagnostic(&format!(
                    "dropped {} log entries after failed delivery: {}",
                    count, reason
                ));
            }
            tracing::debug!(
                telemetry.event = "batch_dropped",
                count,
                error = %reason,
                "Dropped log batch"
            );
            DeliveryOutcome::Dropped { count, reason }
        }
    }
}
