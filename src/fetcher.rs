//! Man page fetching
//!
//! Runs `man -S <sections> <term>` with a bounded wait and turns whatever
//! happened into displayable text. Unknown pages, bad sections and
//! timeouts all come back as text; only failing to start `man` at all is
//! an error.

use crate::config::loader::ConfigLoader;
use crate::config::{Config, FetchConfig, DEFAULT_SECTIONS, DEFAULT_TIMEOUT_MS};
use crate::error::Result;
use crate::presenter::PresentationPayload;
use crate::process::{run_with_timeout, CommandSpec, ProcessResult, ProcessSpawner, SystemSpawner};
use crate::term::LookupRequest;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

/// Shown when `man` does not finish in time
pub const TIMEOUT_MESSAGE: &str = "Timed out waiting for process";

/// Shown when `man` succeeds but prints nothing
pub const NO_ENTRY_MESSAGE: &str = "No man entry";

/// `x<BS>` pairs the formatter uses for bold and underline
static OVERSTRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s).\x08").unwrap());

/// SGR and erase-line escapes
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[mK]").unwrap());

/// Remove every character that is immediately followed by a backspace,
/// together with the backspace
pub fn strip_overstrike(text: &str) -> Cow<'_, str> {
    OVERSTRIKE.replace_all(text, "")
}

/// Remove SGR color/style escape sequences
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

/// Re-join lines with `\n`, dropping `\r\n` endings and the final newline
pub fn normalize_line_endings(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("\n")
}

/// Turn a process outcome into the text shown to the user
pub fn normalize(result: &ProcessResult, remove_ansi: bool) -> String {
    if result.is_timed_out() {
        return TIMEOUT_MESSAGE.to_string();
    }

    if result.exit_code() != 0 {
        return normalize_line_endings(result.stderr());
    }

    let text = normalize_line_endings(result.stdout());
    let text = strip_overstrike(&text);
    let text = if remove_ansi {
        strip_ansi(&text).into_owned()
    } else {
        text.into_owned()
    };

    if text.is_empty() {
        NO_ENTRY_MESSAGE.to_string()
    } else {
        text
    }
}

/// Build the `man` invocation for `term`
pub fn man_command(config: &FetchConfig, term: &str) -> CommandSpec {
    let spec = CommandSpec::new(&config.program)
        .arg("-S")
        .arg(&config.sections)
        .arg(term);

    match config.manwidth {
        Some(width) => spec.env("MANWIDTH", width.to_string()),
        None => spec,
    }
}

/// Fetches and normalizes man pages
pub struct ManPageFetcher {
    spawner: Arc<dyn ProcessSpawner>,
    config: FetchConfig,
}

impl ManPageFetcher {
    pub fn new(spawner: Arc<dyn ProcessSpawner>, config: FetchConfig) -> Self {
        Self { spawner, config }
    }

    /// Fetcher backed by real processes
    pub fn system(config: FetchConfig) -> Self {
        Self::new(Arc::new(SystemSpawner::new()), config)
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Run `man` for `request` and return the text to display
    pub async fn fetch_text(&self, request: &LookupRequest) -> Result<String> {
        let spec = man_command(&self.config, request.term());
        info!("Looking up '{}' ({})", request, spec);

        let result = run_with_timeout(
            self.spawner.as_ref(),
            &spec,
            self.config.timeout(),
            self.config.kill_on_timeout,
        )
        .await?;

        if result.is_timed_out() {
            warn!("Lookup of '{}' timed out after {:?}", request, self.config.timeout());
        } else if result.exit_code() != 0 {
            debug!("No page for '{}' (exit code {})", request, result.exit_code());
        }

        Ok(normalize(&result, self.config.strip_ansi))
    }

    /// Like [`fetch_text`](Self::fetch_text), titled `man <term>`
    pub async fn fetch(&self, request: &LookupRequest) -> Result<PresentationPayload> {
        let body = self.fetch_text(request).await?;
        Ok(PresentationPayload::new(body, format!("man {}", request)))
    }
}

/// One-shot lookup with the system `man`.
///
/// Fails with `EmptyTerm` for an empty term, `ConfigValidationFailed` for
/// a malformed section list or an out-of-range timeout, and
/// `ProcessCreationFailed` when `man` cannot be started.
pub async fn fetch_man_page(term: &str, sections: &str, timeout: Duration) -> Result<String> {
    let request = LookupRequest::new(term)?;
    let config = Config {
        fetch: FetchConfig::default()
            .with_sections(sections)
            .with_timeout(timeout),
        ..Config::default()
    };
    ConfigLoader::new().validate_config(&config)?;
    ManPageFetcher::system(config.fetch).fetch_text(&request).await
}

/// [`fetch_man_page`] with sections `2:3` and a 250 ms timeout
pub async fn fetch_man_page_default(term: &str) -> Result<String> {
    fetch_man_page(term, DEFAULT_SECTIONS, Duration::from_millis(DEFAULT_TIMEOUT_MS)).await
}
