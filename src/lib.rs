//! manlook - look up the identifier under the caret in the man pages
//!
//! This library is the core of an editor "open man page" action: take the
//! identifier under the caret (or the selection), run `man -S 2:3 <term>`
//! with a short timeout, clean the output up and show it in a single
//! reusable output surface per editor session.
//!
//! ## Module Organization
//!
//! ### Lookup pipeline
//!
//! - [`term`] - Identifier extraction from buffer text
//! - [`fetcher`] - `man` invocation and output normalization
//! - [`presenter`] - Surface reuse, dismissal and recreation
//! - [`lookup`] - The action that chains the three together
//!
//! ### Host integration
//!
//! - [`host`] - What the action reads from the editor
//! - [`session`] - Sessions and session-scoped user data
//! - [`lifecycle`] - Disposable ownership tree
//!
//! ### Infrastructure
//!
//! - [`process`] - Bounded process execution
//! - [`platform`] - Process-tree termination and config paths
//! - [`config`] - Configuration loading and validation
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use manlook::fetch_man_page_default;
//!
//! # async fn run() -> manlook::Result<()> {
//! let page = fetch_man_page_default("open").await?;
//! println!("{}", page);
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure model
//!
//! - Nothing under the caret: the action does nothing
//! - No page, bad section or unknown term: `man`'s stderr is shown
//! - Slow `man`: "Timed out waiting for process" is shown and the process
//!   tree is killed
//! - `man` cannot be started: the error is logged and shown on the surface

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod fetcher;
pub mod host;
pub mod lifecycle;
pub mod lookup;
pub mod platform;
pub mod presenter;
pub mod process;
pub mod session;
pub mod term;

// Re-exports for convenience
pub use config::loader::ConfigLoader;
pub use config::Config;
pub use error::{Error, Result};
pub use fetcher::{fetch_man_page, fetch_man_page_default, ManPageFetcher};
pub use host::{ActionContext, StaticContext};
pub use lifecycle::Disposable;
pub use lookup::{LookupAction, LookupOutcome};
pub use presenter::{PresentationPayload, Presenter, SessionPresenter};
pub use session::Session;
pub use term::{extract_term, LookupRequest};

use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Load the configuration, falling back to defaults.
///
/// An explicit `path` must load and validate; otherwise the standard
/// search paths are tried and any failure there falls back to
/// [`Config::default`].
///
/// # Errors
///
/// Only when `path` is given and cannot be read, parsed or validated.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    info!("Initializing {} v{}", NAME, VERSION);

    if let Some(path) = path {
        let config = Config::load_from_file(path)?;
        info!("Configuration loaded from {}", path.display());
        return Ok(config);
    }

    match ConfigLoader::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            Ok(Config::default())
        }
    }
}
