//! Logger coordinator.
//!
//! A [`Logger`] owns one pipeline: level gate, filters, sampling, entry
//! creation, then fan-out to the console sink, the history ring and the
//! delivery buffer. Flushes run as tasks on the tokio runtime the logger was
//! created in, so [`Logger::log`] never waits on I/O.
//!
//! Configuration is copy-on-write. Every log call works against the snapshot
//! it read at entry; [`Logger::update_config`] installs a new snapshot without
//! touching the one in use.
//!
//! Lifecycle: [`Logger::destroy`] stops the periodic flush and delivers what is
//! left. After that, entries still accumulate in the buffer but nothing is
//! sent automatically; only an explicit [`Logger::flush`] delivers them.

use crate::{
    analysis::{self, AnalysisResult, LogQuery},
    buffer::LogBuffer,
    config::{ConfigIssue, LoggerConfig},
    console::{ConsoleSink, ConsoleTarget},
    entry::{Context, ContextBuilder, EntryFactory, LogEntry, MonotonicClock},
    export::{self, ExportFormat},
    filters::{EntryFilter, Sampler},
    history::LogHistory,
    level::LogLevel,
    metadata::{MetadataSource, PerformanceMark, PerformanceMarks, ProcessMetadata},
    transport::{self, DeliveryOutcome, Transport},
    Error, Result,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Everything derived from one configuration value
struct ActiveConfig {
    config: LoggerConfig,
    factory: EntryFactory,
    filter: EntryFilter,
    sampler: Sampler,
    console: ConsoleSink,
}

struct LoggerInner {
    active: RwLock<Arc<ActiveConfig>>,
    buffer: Mutex<LogBuffer>,
    history: Mutex<LogHistory>,
    transport: Arc<dyn Transport>,
    runtime: Handle,
    timer: Mutex<Option<JoinHandle<()>>>,
    destroyed: AtomicBool,
    metadata: Arc<dyn MetadataSource>,
    marks: Arc<PerformanceMarks>,
    clock: Arc<MonotonicClock>,
    console_target: ConsoleTarget,
}

/// Handle to a telemetry pipeline. Clones share the same pipeline.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

/// Optional collaborators for [`Logger`]
pub struct LoggerBuilder {
    config: LoggerConfig,
    transport: Arc<dyn Transport>,
    metadata: Arc<dyn MetadataSource>,
    console_target: ConsoleTarget,
}

impl LoggerBuilder {
    pub fn metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata = source;
        self
    }

    pub fn console_target(mut self, target: ConsoleTarget) -> Self {
        self.console_target = target;
        self
    }

    /// Must be called from within a tokio runtime
    pub fn build(self) -> Result<Logger> {
        let runtime = Handle::try_current().map_err(|e| Error::System {
            message: format!("Logger requires a tokio runtime: {}", e),
        })?;

        let marks = Arc::new(PerformanceMarks::new());
        let clock = Arc::new(MonotonicClock::new());
        let (active, issues) = ActiveConfig::build(
            self.config,
            &self.metadata,
            &marks,
            &clock,
            &self.console_target,
        )?;
        report_issues(&active, &issues);

        let config = &active.config;
        let buffer = LogBuffer::new(
            config.server.batch_size,
            config.server.flush_interval(),
            now(),
        );
        let history = LogHistory::new(config.performance.max_buffer_size);
        let server_active = config.server_active();
        let interval = config.server.flush_interval();

        let inner = Arc::new(LoggerInner {
            active: RwLock::new(Arc::new(active)),
            buffer: Mutex::new(buffer),
            history: Mutex::new(history),
            transport: self.transport,
            runtime,
            timer: Mutex::new(None),
            destroyed: AtomicBool::new(false),
            metadata: self.metadata,
            marks,
            clock,
            console_target: self.console_target,
        });

        if server_active {
            inner.start_timer(interval);
        }

        tracing::debug!(
            telemetry.event = "logger_initialized",
            server_active,
            flush_interval_ms = interval.as_millis() as u64,
            "Logger initialized"
        );

        Ok(Logger { inner })
    }
}

impl Logger {
    /// Create a logger with process metadata and the standard console.
    ///
    /// Invalid configuration values are replaced by their defaults and
    /// reported, never rejected.
    pub fn new(config: LoggerConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::builder(config, transport).build()
    }

    pub fn builder(config: LoggerConfig, transport: Arc<dyn Transport>) -> LoggerBuilder {
        LoggerBuilder {
            config,
            transport,
            metadata: Arc::new(ProcessMetadata::new()),
            console_target: ConsoleTarget::default(),
        }
    }

    /// Record one entry. Never fails and never blocks on delivery.
    pub fn log(&self, level: LogLevel, message: &str, tag: Option<&str>, context: Option<&Context>) {
        let active = self.inner.active();
        let config = &active.config;

        if !config.enabled || !LogLevel::is_enabled(level, config.level) {
            return;
        }

        if !active.filter.allows(tag, message) {
            return;
        }

        if !active.sampler.keep() {
            if config.performance.enable_metrics {
                metrics::counter!("lantern.entries.sampled_out").increment(1);
            }
            return;
        }

        let entry = active.factory.create(level, message, tag, context);

        if config.performance.enable_metrics {
            metrics::counter!("lantern.entries.logged", "level" => level.as_str()).increment(1);
        }

        if config.console_active() {
            active.console.write_entry(&entry);
        }

        lock(&self.inner.history).push(entry.clone());

        if config.server_active() {
            self.enqueue(entry, active);
        }
    }

    /// Log with a context assembled from arbitrary serializable values
    pub fn log_with(&self, level: LogLevel, message: &str, tag: Option<&str>, context: ContextBuilder) {
        if !context.failed_keys().is_empty() {
            let active = self.inner.active();
            if active.config.environment.is_development() {
                active.console.diagnostic(&format!(
                    "context values could not be serialized: {}",
                    context.failed_keys().join(", ")
                ));
            }
        }

        let context = context.build();
        self.log(level, message, tag, Some(&context));
    }

    pub fn debug(&self, message: &str, tag: Option<&str>, context: Option<&Context>) {
        self.log(LogLevel::Debug, message, tag, context);
    }

    pub fn info(&self, message: &str, tag: Option<&str>, context: Option<&Context>) {
        self.log(LogLevel::Info, message, tag, context);
    }

    pub fn warn(&self, message: &str, tag: Option<&str>, context: Option<&Context>) {
        self.log(LogLevel::Warn, message, tag, context);
    }

    pub fn error(&self, message: &str, tag: Option<&str>, context: Option<&Context>) {
        self.log(LogLevel::Error, message, tag, context);
    }

    pub fn critical(&self, message: &str, tag: Option<&str>, context: Option<&Context>) {
        self.log(LogLevel::Critical, message, tag, context);
    }

    /// Deliver everything pending now and wait for the outcome
    pub async fn flush(&self) -> DeliveryOutcome {
        self.inner.flush_pending().await
    }

    /// Apply a change to a copy of the current configuration and install it.
    ///
    /// Entries being logged concurrently finish with the previous snapshot.
    /// Turning server delivery off discards pending entries.
    pub fn update_config(&self, change: impl FnOnce(&mut LoggerConfig)) -> Result<()> {
        let inner = &self.inner;
        let previous = inner.active();

        let mut config = previous.config.clone();
        change(&mut config);

        let (active, issues) = ActiveConfig::build(
            config,
            &inner.metadata,
            &inner.marks,
            &inner.clock,
            &inner.console_target,
        )?;
        report_issues(&active, &issues);

        let server_active = active.config.server_active();
        let interval = active.config.server.flush_interval();
        let restart_timer = server_active
            && (!previous.config.server_active()
                || previous.config.server.flush_interval() != interval);

        {
            let mut buffer = lock(&inner.buffer);
            buffer.reconfigure(active.config.server.batch_size, interval);
            if !server_active {
                let dropped = buffer.clear();
                if dropped > 0 {
                    tracing::debug!(
                        telemetry.event = "buffer_discarded",
                        count = dropped,
                        "Server delivery disabled, discarded pending entries"
                    );
                }
            }
        }
        lock(&inner.history).set_capacity(active.config.performance.max_buffer_size);

        *inner.active.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(active);

        if !server_active {
            inner.stop_timer();
        } else if restart_timer && !inner.destroyed.load(Ordering::SeqCst) {
            inner.start_timer(interval);
        }

        tracing::debug!(
            telemetry.event = "config_updated",
            server_active,
            "Logger configuration updated"
        );
        Ok(())
    }

    pub fn set_level(&self, level: LogLevel) -> Result<()> {
        self.update_config(|config| config.level = level)
    }

    /// The configuration currently in effect, after normalization
    pub fn config(&self) -> LoggerConfig {
        self.inner.active().config.clone()
    }

    /// Recent entries, oldest first
    pub fn history(&self) -> Vec<LogEntry> {
        lock(&self.inner.history).snapshot()
    }

    pub fn query(&self, query: &LogQuery) -> Vec<LogEntry> {
        query.apply(&self.history())
    }

    pub fn clear_history(&self) {
        lock(&self.inner.history).clear();
    }

    pub fn analyze(&self) -> AnalysisResult {
        analysis::analyze(&self.history())
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        export::export(&self.history(), format)
    }

    /// Record a named performance mark; later entries carry recent marks
    pub fn mark(&self, name: impl Into<String>) -> PerformanceMark {
        self.inner.marks.mark(name)
    }

    /// Entries waiting for delivery
    pub fn pending(&self) -> usize {
        lock(&self.inner.buffer).len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Stop automatic delivery and flush what is pending once.
    ///
    /// Calling it again only flushes.
    pub async fn destroy(&self) -> DeliveryOutcome {
        if !self.inner.destroyed.swap(true, Ordering::SeqCst) {
            self.inner.stop_timer();
            tracing::debug!(telemetry.event = "logger_destroyed", "Logger destroyed");
        }
        self.inner.flush_pending().await
    }

    fn enqueue(&self, entry: LogEntry, active: Arc<ActiveConfig>) {
        let batch = {
            let mut buffer = lock(&self.inner.buffer);
            buffer.add(entry);

            if self.inner.destroyed.load(Ordering::SeqCst) || !buffer.should_flush(now()) {
                return;
            }
            buffer.flush(now())
        };

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            inner.send(batch, &active).await;
        });
    }
}

impl LoggerInner {
    fn active(&self) -> Arc<ActiveConfig> {
        Arc::clone(&self.active.read().unwrap_or_else(|e| e.into_inner()))
    }

    async fn flush_pending(&self) -> DeliveryOutcome {
        let batch = lock(&self.buffer).flush(now());
        if batch.is_empty() {
            return DeliveryOutcome::Delivered { count: 0 };
        }
        let active = self.active();
        self.send(batch, &active).await
    }

    async fn send(&self, batch: Vec<LogEntry>, active: &ActiveConfig) -> DeliveryOutcome {
        let outcome = transport::deliver(
            self.transport.as_ref(),
            batch,
            active.config.environment,
            &active.console,
        )
        .await;

        if active.config.performance.enable_metrics {
            match &outcome {
                DeliveryOutcome::Delivered { .. } => {
                    metrics::counter!("lantern.batches.delivered").increment(1);
                }
                DeliveryOutcome::Dropped { count, .. } => {
                    metrics::counter!("lantern.batches.dropped").increment(1);
                    metrics::counter!("lantern.entries.dropped").increment(*count as u64);
                }
            }
        }

        outcome
    }

    fn start_timer(self: &Arc<Self>, interval: Duration) {
        let weak: Weak<LoggerInner> = Arc::downgrade(self);
        let first_tick = Instant::now() + interval;
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if inner.destroyed.load(Ordering::SeqCst) {
                    break;
                }
                if !lock(&inner.buffer).is_empty() {
                    inner.flush_pending().await;
                }
            }
        });

        if let Some(previous) = lock(&self.timer).replace(task) {
            previous.abort();
        }
    }

    fn stop_timer(&self) {
        if let Some(task) = lock(&self.timer).take() {
            task.abort();
        }
    }
}

impl Drop for LoggerInner {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

impl ActiveConfig {
    fn build(
        config: LoggerConfig,
        metadata: &Arc<dyn MetadataSource>,
        marks: &Arc<PerformanceMarks>,
        clock: &Arc<MonotonicClock>,
        console_target: &ConsoleTarget,
    ) -> Result<(Self, Vec<ConfigIssue>)> {
        let (config, issues) = config.normalized();

        let active = Self {
            factory: EntryFactory::new(
                &config,
                Arc::clone(metadata),
                Arc::clone(marks),
                Arc::clone(clock),
            )?,
            filter: EntryFilter::new(&config.filters)?,
            sampler: Sampler::new(&config.performance),
            console: ConsoleSink::new(&config.console, console_target.clone()),
            config,
        };
        Ok((active, issues))
    }
}

fn report_issues(active: &ActiveConfig, issues: &[ConfigIssue]) {
    for issue in issues {
        tracing::warn!(
            telemetry.event = "config_value_replaced",
            field = %issue.field,
            issue = %issue.message,
            "Invalid configuration value replaced by default"
        );
        if active.config.environment.is_development() {
            active
                .console
                .diagnostic(&format!("invalid config, using default for {}", issue));
        }
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
