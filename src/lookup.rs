//! The lookup action
//!
//! Extract, fetch, present: one causally ordered chain per trigger. The
//! fetch is async, so a host can run it off its UI thread via
//! [`LookupAction::spawn`]. Each trigger takes a ticket from its session;
//! a lookup that finishes after a newer one started in the same session
//! is dropped instead of overwriting the newer result.

use crate::config::{Config, PresenterConfig};
use crate::error::{Error, Result};
use crate::fetcher::ManPageFetcher;
use crate::host::ActionContext;
use crate::presenter::{PresentationPayload, Presenter, SessionPresenter, SurfaceFactory};
use crate::process::ProcessSpawner;
use crate::session::{Key, Session};
use crate::term::LookupRequest;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

const GENERATION_KEY: Key<Arc<AtomicU64>> = Key::new("manlook.lookup_generation");

/// How a single trigger ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Nothing under the caret; no process was started
    Skipped,
    /// The page (or the not-found/timeout text) is on the surface
    Presented { term: String },
    /// A newer lookup started in the same session before this one finished
    Superseded { term: String },
    /// The lookup failed; `message` was shown instead of a page when possible
    Failed { message: String },
}

/// Wires the extractor, fetcher and presenter together
pub struct LookupAction {
    fetcher: ManPageFetcher,
    factory: Arc<dyn SurfaceFactory>,
    presenter_config: PresenterConfig,
    // Surface updates are serialized across concurrent lookups
    present_lock: Mutex<()>,
}

impl LookupAction {
    pub fn new(
        fetcher: ManPageFetcher,
        factory: Arc<dyn SurfaceFactory>,
        presenter_config: PresenterConfig,
    ) -> Self {
        Self {
            fetcher,
            factory,
            presenter_config,
            present_lock: Mutex::new(()),
        }
    }

    /// Build from a loaded config with a custom process spawner
    pub fn from_config(
        config: &Config,
        spawner: Arc<dyn ProcessSpawner>,
        factory: Arc<dyn SurfaceFactory>,
    ) -> Self {
        Self::new(
            ManPageFetcher::new(spawner, config.fetch.clone()),
            factory,
            config.presenter.clone(),
        )
    }

    pub fn fetcher(&self) -> &ManPageFetcher {
        &self.fetcher
    }

    /// Run one lookup, propagating failures.
    ///
    /// The only error a well-configured host sees here is
    /// [`Error::ProcessCreationFailed`].
    pub async fn perform(&self, ctx: &dyn ActionContext) -> Result<LookupOutcome> {
        let request = match LookupRequest::from_buffer(
            ctx.buffer_text(),
            ctx.caret_offset(),
            ctx.selected_text(),
        ) {
            Ok(request) => request,
            Err(Error::EmptyTerm) => {
                debug!("No identifier at offset {}, nothing to look up", ctx.caret_offset());
                return Ok(LookupOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };

        let session = ctx.session();
        let ticket = next_ticket(session);
        let body = self.fetcher.fetch_text(&request).await?;

        let title = format!("{} {}", self.presenter_config.title_prefix, request);
        if !self.present(session, PresentationPayload::new(body, title), Some(ticket))? {
            debug!("Dropping superseded result for '{}'", request);
            return Ok(LookupOutcome::Superseded {
                term: request.into_term(),
            });
        }

        Ok(LookupOutcome::Presented {
            term: request.into_term(),
        })
    }

    /// Run one lookup, never failing.
    ///
    /// A process that cannot be started is reported on the surface instead
    /// of a page; any failure is logged.
    pub async fn trigger(&self, ctx: &dyn ActionContext) -> LookupOutcome {
        match self.perform(ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Man page lookup failed: {}", e);
                let message = e.to_string();

                if e.is_process_creation() {
                    let title = format!("{} (error)", self.presenter_config.title_prefix);
                    let payload = PresentationPayload::new(message.clone(), title);
                    if let Err(present_err) = self.present(ctx.session(), payload, None) {
                        warn!("Could not show lookup error: {}", present_err);
                    }
                }

                LookupOutcome::Failed { message }
            }
        }
    }

    /// Run [`trigger`](Self::trigger) on the tokio runtime
    pub fn spawn(self: &Arc<Self>, ctx: Arc<dyn ActionContext>) -> JoinHandle<LookupOutcome> {
        let action = Arc::clone(self);
        tokio::spawn(async move { action.trigger(ctx.as_ref()).await })
    }

    /// Show `payload`, unless `ticket` is no longer the newest in the session.
    ///
    /// The ticket is checked under the lock, so a stale result can never
    /// overwrite a newer one. Returns whether the payload was shown.
    fn present(
        &self,
        session: &Arc<Session>,
        payload: PresentationPayload,
        ticket: Option<u64>,
    ) -> Result<bool> {
        let _guard = self
            .present_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if ticket.is_some_and(|ticket| !is_latest(session, ticket)) {
            return Ok(false);
        }

        let mut presenter = SessionPresenter::with_config(
            Arc::clone(session),
            Arc::clone(&self.factory),
            self.presenter_config.clone(),
        );
        presenter.present(payload)?;
        Ok(true)
    }
}

fn generation(session: &Session) -> Arc<AtomicU64> {
    session
        .data()
        .get_or_insert_with(&GENERATION_KEY, || Arc::new(AtomicU64::new(0)))
}

fn next_ticket(session: &Session) -> u64 {
    generation(session).fetch_add(1, Ordering::AcqRel) + 1
}

fn is_latest(session: &Session, ticket: u64) -> bool {
    generation(session).load(Ordering::Acquire) == ticket
}
