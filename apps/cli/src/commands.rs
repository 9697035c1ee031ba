//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use kbsync_core::{ProgressReporter, SyncReport, run_sync};
use kbsync_shared::{AppConfig, VectorStoreId, init_config, load_config, resolve_settings};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// kbsync — keep the assistant's knowledge base in step with local docs.
#[derive(Parser)]
#[command(
    name = "kbsync",
    version,
    about = "Synchronize local documentation files with the assistant's remote vector store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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
    /// Run the sync: clean stale remote copies, upload, register.
    Sync {
        /// Directory holding the documentation files (defaults to cwd).
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Vector store id to sync into (overrides the env-provided id).
        #[arg(short, long)]
        store: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "kbsync=info",
        1 => "kbsync=debug",
        _ => "kbsync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sync { dir, store } => cmd_sync(dir, store.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_sync(dir: Option<PathBuf>, store: Option<&str>) -> Result<()> {
    let config = load_config()?;

    let working_dir = match dir {
        Some(d) => d,
        None => std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}"))?,
    };

    let mut settings = resolve_settings(&config, working_dir)?;
    if let Some(id) = store {
        settings.vector_store_id = Some(VectorStoreId::from(id));
    }

    info!(
        assistant_id = %settings.assistant_id,
        store_id = ?settings.vector_store_id,
        dir = %settings.working_dir.display(),
        "starting sync"
    );

    let reporter = CliProgress::new();
    let report = run_sync(&settings, &reporter).await?;

    // Print summary
    println!();
    println!("  Knowledge base synchronized!");
    println!("  Store:    {}", report.store_id);
    if report.store_created {
        println!("            (created this run — capture the id to reuse it)");
    }
    println!("  Removed:  {}", report.files_removed);
    println!("  Uploaded: {}", report.files_uploaded);
    println!("  Batch:    {}", report.batch_id);
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_uploaded(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Uploading [{current}/{total}] {name}"));
    }

    fn done(&self, _report: &SyncReport) {
        self.spinner.finish_and_clear();
    }
}
