//! manlook - print the man page for the identifier at a caret position
//!
//! Stands in for an editor host: the buffer comes from a file, an inline
//! string or stdin, and the page is rendered to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use manlook::presenter::TerminalSurfaceFactory;
use manlook::process::SystemSpawner;
use manlook::{load_config, ConfigLoader, LookupAction, LookupOutcome, Session, StaticContext};
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "manlook",
    version,
    about = "Look up the identifier under the caret in the man pages (sections 2 and 3)"
)]
struct Cli {
    /// Term to look up; takes precedence over the buffer and caret
    term: Option<String>,

    /// Buffer to read the identifier from ('-' reads stdin)
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Inline buffer text
    #[arg(short, long)]
    text: Option<String>,

    /// Caret offset into the buffer, in characters
    #[arg(short, long, default_value_t = 0)]
    offset: usize,

    /// Selected text; looked up instead of the identifier at the caret
    #[arg(short, long)]
    selection: Option<String>,

    /// Configuration file (also MANLOOK_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the fetch timeout, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Enable debug logging (also MANLOOK_DEBUG)
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| env::var_os("MANLOOK_CONFIG").map(PathBuf::from))
    }

    fn read_buffer(&self) -> Result<String> {
        if let Some(path) = &self.file {
            if path.as_os_str() == "-" {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read buffer from stdin")?;
                return Ok(buffer);
            }
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read buffer from {}", path.display()));
        }

        Ok(self.text.clone().unwrap_or_default())
    }

    fn selection(&self) -> Option<String> {
        self.term.clone().or_else(|| self.selection.clone())
    }
}

fn debug_requested(cli: &Cli) -> bool {
    cli.debug
        || env::var("MANLOOK_DEBUG").map_or(false, |v| v == "1" || v.to_lowercase() == "true")
}

fn init_logging(debug: bool) {
    let log_level = if debug { "debug" } else { "info" };
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(debug_requested(&cli));
    debug!("Debug mode enabled");

    let config_path = cli.config_path();
    let mut config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    if let Some(ms) = cli.timeout_ms {
        anyhow::ensure!(ms > 0, "--timeout-ms must be greater than zero");
        config.fetch = config.fetch.with_timeout(Duration::from_millis(ms));
        ConfigLoader::new()
            .validate_config(&config)
            .context("Invalid --timeout-ms")?;
    }

    let buffer = cli.read_buffer()?;
    let session = Session::new("cli");
    let mut ctx = StaticContext::new(Arc::clone(&session), buffer, cli.offset);
    if let Some(selection) = cli.selection() {
        ctx = ctx.with_selection(selection);
    }

    let action = LookupAction::from_config(
        &config,
        Arc::new(SystemSpawner::new()),
        Arc::new(TerminalSurfaceFactory::stdout()),
    );
    let outcome = action.trigger(&ctx).await;

    // Releases the surface, flushing anything not yet drawn
    session.close();

    match outcome {
        LookupOutcome::Presented { term } => {
            info!("Showed man page lookup for '{}'", term);
            Ok(ExitCode::SUCCESS)
        }
        LookupOutcome::Superseded { term } => {
            debug!("Lookup for '{}' was superseded", term);
            Ok(ExitCode::SUCCESS)
        }
        LookupOutcome::Skipped => {
            warn!("No identifier at offset {}", cli.offset);
            Ok(ExitCode::FAILURE)
        }
        LookupOutcome::Failed { .. } => Ok(ExitCode::FAILURE),
    }
}
