use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::{stream, StreamExt};
use lantern_telemetry::{
    analysis::AnalysisResult,
    export::{self, ExportFormat},
    HttpTransport, LogEntry, LoggerConfig, Transport,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Replay requests in flight at once
const REPLAY_CONCURRENCY: usize = 4;

#[derive(Parser)]
#[command(author, version, about = "Inspect, convert and replay Lantern log history", long_about = None)]
struct Cli {
    /// Set log level for the tool's own output (trace, debug, info, warn, error)
    #[arg(long, global = true, help = "Set log level")]
    log_level: Option<String>,

    /// Logger configuration file
    #[arg(long, global = true, help = "Path to logger configuration file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a history file: counts, error rate, trends and anomalies
    Analyze {
        file: PathBuf,

        #[arg(long, help = "Print the full result as JSON")]
        json: bool,
    },

    /// Convert a history file to another export format
    Export {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "json")]
        format: FormatArg,

        #[arg(short, long, help = "Write to this file instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Send a history file to a collector in batches
    Replay {
        file: PathBuf,

        #[arg(long, help = "Collector endpoint (defaults to the configured one)")]
        endpoint: Option<String>,

        #[arg(long, help = "Entries per request (defaults to the configured batch size)")]
        batch_size: Option<usize>,
    },

    /// Show or create the logger configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration
    Init {
        #[arg(long, help = "Target path (defaults to the platform config dir)")]
        path: Option<PathBuf>,

        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Json,
    Csv,
    Text,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => Self::Json,
            FormatArg::Csv => Self::Csv,
            FormatArg::Text => Self::Text,
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn read_history(path: &Path) -> Result<Vec<LogEntry>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read history file {}", path.display()))?;

    let entries = export::parse_json(&content)
        .with_context(|| format!("{} is not a JSON array of log entries", path.display()))?;

    info!(
        telemetry.event = "history_loaded",
        count = entries.len(),
        path = %path.display(),
        "Loaded history"
    );
    Ok(entries)
}

fn summarize(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("Entries:    {}\n", result.total_entries));
    out.push_str(&format!("Error rate: {:.1}%\n", result.error_rate));
    if let Some(avg) = result.average_duration {
        out.push_str(&format!("Avg time:   {:.1}ms\n", avg));
    }

    out.push_str("\nBy level:\n");
    for (level, count) in &result.counts_by_level {
        out.push_str(&format!("  {:<8} {}\n", level.as_label(), count));
    }

    if !result.counts_by_tag.is_empty() {
        out.push_str("\nBy tag:\n");
        for (tag, count) in &result.counts_by_tag {
            out.push_str(&format!("  {:<16} {}\n", tag, count));
        }
    }

    if !result.top_errors.is_empty() {
        out.push_str("\nTop errors:\n");
        for error in &result.top_errors {
            out.push_str(&format!(
                "  {:>5}x  {}  (last {})\n",
                error.count,
                error.message,
                error.last_seen.to_rfc3339()
            ));
        }
    }

    if !result.anomalies.is_empty() {
        out.push_str("\nAnomalies:\n");
        for anomaly in &result.anomalies {
            out.push_str(&format!(
                "  [{:?}/{:?}] {}\n",
                anomaly.kind, anomaly.severity, anomaly.description
            ));
        }
    }

    out
}

async fn analyze(file: &Path, json: bool) -> Result<()> {
    let entries = read_history(file).await?;
    let result = lantern_telemetry::analyze(&entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", summarize(&result));
    }
    Ok(())
}

async fn export_history(file: &Path, format: ExportFormat, output: Option<&Path>) -> Result<()> {
    let entries = read_history(file).await?;
    let rendered = export::export(&entries, format)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                telemetry.event = "history_exported",
                format = %format,
                path = %path.display(),
                "Exported history"
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

async fn replay(
    file: &Path,
    mut config: LoggerConfig,
    endpoint: Option<String>,
    batch_size: Option<usize>,
) -> Result<()> {
    if let Some(endpoint) = endpoint {
        config.server.endpoint = endpoint;
    }
    if let Some(batch_size) = batch_size {
        config.server.batch_size = batch_size;
    }
    config.validate()?;

    let entries = read_history(file).await?;
    let transport = HttpTransport::new(&config.server)?;

    let (delivered, dropped) = send_batches(
        &transport,
        &entries,
        config.server.batch_size,
        REPLAY_CONCURRENCY,
    )
    .await;

    println!(
        "Replayed to {}: {} delivered, {} dropped",
        transport.endpoint(),
        delivered,
        dropped
    );

    if dropped > 0 {
        anyhow::bail!("{} entries were not accepted by the collector", dropped);
    }
    Ok(())
}

/// Send `entries` in order-preserving batches with at most `concurrency`
/// requests outstanding. Returns the delivered and dropped entry counts.
async fn send_batches(
    transport: &dyn Transport,
    entries: &[LogEntry],
    batch_size: usize,
    concurrency: usize,
) -> (usize, usize) {
    let results: Vec<_> = stream::iter(entries.chunks(batch_size.max(1)))
        .map(|batch| async move { (batch.len(), transport.send(batch).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut delivered = 0;
    let mut dropped = 0;
    for (count, result) in results {
        match result {
            Ok(()) => delivered += count,
            Err(e) => {
                warn!(
                    telemetry.event = "replay_batch_failed",
                    count,
                    error = %e,
                    "Batch was not accepted"
                );
                dropped += count;
            }
        }
    }
    (delivered, dropped)
}

async fn load_config(path: Option<&Path>) -> Result<LoggerConfig> {
    let (config, issues) = LoggerConfig::load_with_issues(path)
        .await
        .context("Failed to load logger configuration")?;
    for issue in &issues {
        warn!("Invalid configuration value replaced by default: {}", issue);
    }
    Ok(config)
}

async fn config_command(action: ConfigAction, config: LoggerConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let (normalized, issues) = config.normalized();
            for issue in &issues {
                warn!("Invalid configuration value replaced by default: {}", issue);
            }
            let rendered =
                toml::to_string_pretty(&normalized).context("Failed to render configuration")?;
            print!("{}", rendered);
        }
        ConfigAction::Init { path, force } => {
            let target = match path {
                Some(path) => path,
                None => LoggerConfig::default_config_path()?,
            };

            if target.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                );
            }

            LoggerConfig::default().save(Some(&target)).await?;
            println!("Wrote default configuration to {}", target.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Command::Analyze { file, json } => analyze(&file, json).await,
        Command::Export {
            file,
            format,
            output,
        } => export_history(&file, format.into(), output.as_deref()).await,
        Command::Replay {
            file,
            endpoint,
            batch_size,
        } => {
            let config = load_config(cli.config.as_deref()).await?;
            replay(&file, config, endpoint, batch_size).await
        }
        Command::Config { action } => {
            let config = load_config(cli.config.as_deref()).await?;
            config_command(action, config).await
        }
    }
}
