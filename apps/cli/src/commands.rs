//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docingest_chunking::{ChunkRouter, DocumentTypeClassifier, StrategyKind};
use docingest_core::{
    ContentSource, DocumentOutcome, FsStore, IngestReport, Ingestor, ProgressReporter,
    ingest_batch, parse_event,
};
use docingest_shared::{AppConfig, DocumentType, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docingest: split normalized Markdown into typed chunks.
#[derive(Parser)]
#[command(
    name = "docingest",
    version,
    about = "Classify Markdown documents and split them into embedding-ready chunks.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.docingest/docingest.toml.
    #[arg(long, global = true, env = "DOCINGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Chunk a single Markdown file and print or write its chunk list.
    Chunk {
        /// Markdown file to chunk.
        file: PathBuf,

        /// Source identifier recorded in chunk ids (defaults to the path).
        #[arg(long)]
        source: Option<String>,

        /// Skip classification and use this document type.
        #[arg(long)]
        doc_type: Option<DocumentType>,

        /// Write JSON here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the detected document type of a Markdown file.
    Classify {
        /// Markdown file to classify.
        file: PathBuf,

        /// File name used for name hints (defaults to the path).
        #[arg(long)]
        name: Option<String>,
    },

    /// Chunk every Markdown object under a local store root.
    Ingest {
        /// Store root (defaults to `defaults.store_root`).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Only keys starting with this prefix.
        #[arg(long, default_value = "")]
        prefix: String,

        /// Write the JSON run report here.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Process the records of an object-store notification document.
    Event {
        /// Notification JSON file.
        event: PathBuf,

        /// Store root the record keys are resolved against.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Write the JSON run report here.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Manage configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so chunk JSON on
/// stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docingest=info",
        1 => "docingest=debug",
        _ => "docingest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        };
    }

    let config = resolve_config(cli.config.as_deref())?;
    match cli.command {
        Command::Chunk {
            file,
            source,
            doc_type,
            out,
        } => cmd_chunk(&config, &file, source, doc_type, out.as_deref()),
        Command::Classify { file, name } => cmd_classify(&config, &file, name),
        Command::Ingest {
            root,
            prefix,
            report,
        } => cmd_ingest(&config, root, &prefix, report.as_deref()).await,
        Command::Event {
            event,
            root,
            report,
        } => cmd_event(&config, &event, root, report.as_deref()).await,
        Command::Config { .. } => Ok(()),
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// Read a local Markdown file with the same decoding rules as the store.
fn read_markdown(file: &Path) -> Result<String> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| eyre!("'{}' is not a readable file name", file.display()))?;
    let dir = file.parent().unwrap_or_else(|| Path::new(""));
    Ok(FsStore::new(dir).read_text(name)?)
}

// ---------------------------------------------------------------------------
// Single-document commands
// ---------------------------------------------------------------------------

fn cmd_chunk(
    config: &AppConfig,
    file: &Path,
    source: Option<String>,
    doc_type: Option<DocumentType>,
    out: Option<&Path>,
) -> Result<()> {
    let content = read_markdown(file)?;
    let source = source.unwrap_or_else(|| file.to_string_lossy().into_owned());

    let doc_type = match doc_type {
        Some(doc_type) => doc_type,
        None => DocumentTypeClassifier::from_config(config).classify(&content, &source),
    };
    let chunks = ChunkRouter::from_config(config).chunk(&content, &source, doc_type);
    info!(
        %doc_type,
        strategy = %StrategyKind::for_document(doc_type),
        chunk_count = chunks.len(),
        "chunked"
    );

    let json = serde_json::to_string_pretty(&chunks)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .map_err(|e| eyre!("failed to write '{}': {e}", path.display()))?;
            println!("{} chunks written to {}", chunks.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_classify(config: &AppConfig, file: &Path, name: Option<String>) -> Result<()> {
    let content = read_markdown(file)?;
    let name = name.unwrap_or_else(|| file.to_string_lossy().into_owned());
    let doc_type = DocumentTypeClassifier::from_config(config).classify(&content, &name);
    println!("{doc_type}\t{}", StrategyKind::for_document(doc_type));
    Ok(())
}

// ---------------------------------------------------------------------------
// Batch commands
// ---------------------------------------------------------------------------

async fn cmd_ingest(
    config: &AppConfig,
    root: Option<PathBuf>,
    prefix: &str,
    report_path: Option<&Path>,
) -> Result<()> {
    let root = root.unwrap_or_else(|| PathBuf::from(&config.defaults.store_root));
    if !root.is_dir() {
        return Err(eyre!("store root '{}' is not a directory", root.display()));
    }

    let store = Arc::new(FsStore::new(&root));
    let keys = store.list_markdown(prefix)?;
    info!(root = %store.root().display(), prefix, count = keys.len(), "ingesting store");

    let report = run_batch(config, store, keys).await;
    finish_report(&report, report_path)
}

async fn cmd_event(
    config: &AppConfig,
    event_path: &Path,
    root: Option<PathBuf>,
    report_path: Option<&Path>,
) -> Result<()> {
    let json = std::fs::read_to_string(event_path)
        .map_err(|e| eyre!("failed to read '{}': {e}", event_path.display()))?;
    let records = parse_event(&json)?;

    let root = root.unwrap_or_else(|| PathBuf::from(&config.defaults.store_root));
    for object in &records.objects {
        info!(bucket = %object.bucket, key = %object.key, size = object.size, "event record");
    }

    let store = Arc::new(FsStore::new(&root));
    info!(root = %store.root().display(), count = records.objects.len(), "processing event");

    let keys = records.objects.into_iter().map(|o| o.key).collect();
    let mut report = run_batch(config, store, keys).await;
    for rejected in records.rejected {
        warn!(index = rejected.index, error = %rejected.error, "event record rejected");
        report.documents.push(DocumentOutcome::failed(
            format!("Records[{}]", rejected.index),
            rejected.error,
        ));
    }

    finish_report(&report, report_path)
}

async fn run_batch(config: &AppConfig, store: Arc<FsStore>, keys: Vec<String>) -> IngestReport {
    let ingestor = Arc::new(Ingestor::from_config(config));
    let progress = Arc::new(CliProgress::new());
    ingest_batch(
        ingestor,
        store,
        keys,
        config.defaults.concurrency as usize,
        progress,
    )
    .await
}

/// Print the summary and optionally persist the report. Document failures
/// are reported, not returned as errors.
fn finish_report(report: &IngestReport, report_path: Option<&Path>) -> Result<()> {
    println!();
    println!("  Run:       {}", report.run_id);
    println!("  Completed: {}", report.completed());
    println!("  Skipped:   {}", report.skipped());
    println!("  Failed:    {}", report.failed());
    println!("  Chunks:    {}", report.chunk_count());
    println!(
        "  Time:      {:.1}s",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );

    for outcome in &report.documents {
        if let DocumentOutcome::Failed { key, error } = outcome {
            println!("  ✗ {key}: {error}");
        }
    }
    println!();

    if let Some(path) = report_path {
        report.write_json(path)?;
        println!("  Report written to {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(
                style
                    .progress_chars("=> ")
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn batch_started(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn document_started(&self, key: &str) {
        self.bar.set_message(key.to_string());
    }

    fn document_finished(&self, outcome: &DocumentOutcome, current: usize, _total: usize) {
        self.bar.set_position(current as u64);
        if outcome.is_failed() {
            self.bar.println(format!("failed: {}", outcome.key()));
        }
    }

    fn done(&self, _report: &IngestReport) {
        self.bar.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
