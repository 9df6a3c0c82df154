//! L190 Crawler main entry point
//!
//! This is the command-line interface for resolving an L.190 root catalog
//! into participant and status tables.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use l190_crawler::config::{load_config_with_hash, Config, RunContext};
use l190_crawler::crawler::run_catalog;
use l190_crawler::output::{print_statistics, CsvSink, RecordSink};
use l190_crawler::storage::SqliteSink;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// L190 Crawler: procurement disclosure resolver
///
/// Reads a root catalog (its file name must contain `l190-YYYY.xml`),
/// follows every published link, and appends one row per lot participant
/// to OUTPUT and one row per catalog entry to STATUS.
#[derive(Parser, Debug)]
#[command(name = "l190-crawler")]
#[command(version)]
#[command(about = "Resolves L.190 procurement disclosures into flat tables", long_about = None)]
struct Cli {
    /// Root catalog XML file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Participant table
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Link status table
    #[arg(value_name = "STATUS")]
    status: PathBuf,

    /// Log file
    #[arg(value_name = "LOG")]
    log: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output table format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Delete existing output files without asking
    #[arg(long)]
    force: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors and hide the progress bar
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Sqlite,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Fail on a catalog without a year or a bad config before touching any file
    let context = RunContext::new(&cli.input)?.with_outputs(&cli.output, &cli.status);
    let (config, context) = load_run_config(cli.config.as_deref(), context)?;

    let targets = deletion_targets(&context, &cli.log, cli.format);
    if !confirm_deletion(&targets, cli.force)? {
        bail!("Execution canceled: output files already exist");
    }
    for path in &targets {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }

    setup_logging(&cli.log, cli.verbose, cli.quiet)?;

    if let (Some(path), Some(hash)) = (&cli.config, &context.config_hash) {
        tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        );
    }

    let sink = open_sink(cli.format, &cli.output, &cli.status, &context)?;

    let progress = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} entries [{elapsed_precise}]")
                .context("Invalid progress template")?,
        );
        bar
    };

    tracing::info!(
        "Processing {} for year {}",
        context.catalog_path.display(),
        context.year
    );

    let stats = match run_catalog(&context, &config, sink, &progress).await {
        Ok(stats) => stats,
        Err(e) => {
            progress.abandon();
            tracing::error!("Run failed: {}", e);
            return Err(e.into());
        }
    };
    progress.finish_and_clear();

    stats.log();
    if !cli.quiet {
        print_statistics(&stats);
    }

    Ok(())
}

/// Loads and validates the configuration file, if one was given
fn load_run_config(
    path: Option<&Path>,
    context: RunContext,
) -> anyhow::Result<(Config, RunContext)> {
    match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            Ok((config, context.with_config_hash(hash)))
        }
        None => Ok((Config::default(), context)),
    }
}

/// Existing files the run would overwrite
///
/// SQLite databases in WAL mode carry `-wal` and `-shm` files, which go
/// with the database.
fn deletion_targets(context: &RunContext, log: &Path, format: OutputFormat) -> Vec<PathBuf> {
    let mut targets: Vec<PathBuf> = context
        .existing_outputs()
        .into_iter()
        .map(Path::to_path_buf)
        .collect();

    if format == OutputFormat::Sqlite {
        let databases = [&context.output_path, &context.status_path];
        for database in databases.into_iter().flatten() {
            for suffix in ["-wal", "-shm"] {
                let mut sidecar = database.clone().into_os_string();
                sidecar.push(suffix);
                let sidecar = PathBuf::from(sidecar);
                if sidecar.exists() {
                    targets.push(sidecar);
                }
            }
        }
    }

    if log.exists() {
        targets.push(log.to_path_buf());
    }
    targets
}

/// Decides whether existing files may be deleted
///
/// Deletion is allowed with `--force`, or when an operator at a terminal
/// answers yes (an empty answer counts as yes). A non-interactive stdin
/// never confirms.
fn confirm_deletion(existing: &[PathBuf], force: bool) -> anyhow::Result<bool> {
    if existing.is_empty() || force {
        return Ok(true);
    }

    println!("The specified files already exist:");
    for path in existing {
        println!("- {}", path.display());
    }

    if !std::io::stdin().is_terminal() {
        println!("Not an interactive terminal; rerun with --force to delete them.");
        return Ok(false);
    }

    print!("Do you want to delete them? [y]/n: ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();

    Ok(answer.is_empty() || answer == "y")
}

/// Sets up the tracing subscriber writing to the log file
fn setup_logging(log_path: &Path, verbose: u8, quiet: bool) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("l190_crawler=info,warn"),
            1 => EnvFilter::new("l190_crawler=debug,info"),
            2 => EnvFilter::new("l190_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();

    Ok(())
}

fn open_sink(
    format: OutputFormat,
    output: &Path,
    status: &Path,
    context: &RunContext,
) -> anyhow::Result<Box<dyn RecordSink>> {
    let sink: Box<dyn RecordSink> = match format {
        OutputFormat::Csv => Box::new(
            CsvSink::open(output, status).context("Failed to open CSV output files")?,
        ),
        OutputFormat::Sqlite => Box::new(
            SqliteSink::open(output, status, context)
                .context("Failed to open SQLite output databases")?,
        ),
    };
    Ok(sink)
}
