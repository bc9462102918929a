//! Result presentation
//!
//! The host owns the actual output window; this module owns the policy
//! around it. Each session gets at most one [`Surface`], kept in the
//! session's user data. Repeated lookups reuse it: content is replaced,
//! the title updated, and the view scrolled back to the top. Dismissing
//! the surface releases it, and the next lookup builds a fresh one.

pub mod buffer;
pub mod terminal;

use crate::config::PresenterConfig;
use crate::error::{Error, Result};
use crate::lifecycle::Disposable;
use crate::session::{Key, Session};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

pub use buffer::{BufferSurface, BufferSurfaceFactory, BufferView};
pub use terminal::{TerminalSurface, TerminalSurfaceFactory};

/// Text to show and the title to show it under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationPayload {
    pub body: String,
    pub title: String,
}

impl PresentationPayload {
    pub fn new(body: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            title: title.into(),
        }
    }
}

/// Identity of a surface instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Anything that can show a lookup result
pub trait Presenter: Send {
    fn present(&mut self, payload: PresentationPayload) -> Result<()>;
}

/// A host-provided output view
pub trait Surface: Send {
    fn id(&self) -> SurfaceId;

    /// Drop all content
    fn clear(&mut self);

    /// Append text
    fn print(&mut self, text: &str);

    /// Scroll so that `line` is the first visible line
    fn scroll_to(&mut self, line: usize);

    fn set_title(&mut self, title: &str);

    /// Bring the view to the front, optionally taking focus
    fn activate(&mut self, focus: bool);

    /// Free host resources; the surface is not used afterwards
    fn release(&mut self);
}

/// Builds surfaces on demand
pub trait SurfaceFactory: Send + Sync {
    /// `dismiss` is the close affordance the surface should wire to its UI
    fn create(&self, session: &Session, dismiss: DismissHandle) -> Result<Box<dyn Surface>>;
}

type SharedSurface = Arc<Mutex<Box<dyn Surface>>>;

/// What the session slot holds for a live surface
#[derive(Clone)]
struct SurfaceSlot {
    id: SurfaceId,
    surface: SharedSurface,
    lifetime: Disposable,
}

const SURFACE_KEY: Key<SurfaceSlot> = Key::new("manlook.surface");

/// Close affordance handed to surfaces; safe to trigger more than once
#[derive(Clone)]
pub struct DismissHandle {
    session: Weak<Session>,
}

impl DismissHandle {
    fn new(session: &Arc<Session>) -> Self {
        Self {
            session: Arc::downgrade(session),
        }
    }

    /// Release the session's surface; `false` if there was none
    pub fn dismiss(&self) -> bool {
        match self.session.upgrade() {
            Some(session) => dismiss_surface(&session),
            None => false,
        }
    }
}

impl fmt::Debug for DismissHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DismissHandle")
            .field("session_alive", &(self.session.strong_count() > 0))
            .finish()
    }
}

fn dismiss_surface(session: &Session) -> bool {
    match session.data().remove(&SURFACE_KEY) {
        Some(slot) => {
            debug!("Dismissing {} in session '{}'", slot.id, session.name());
            slot.lifetime.dispose()
        }
        None => false,
    }
}

/// Presenter that keeps one reusable surface per session
pub struct SessionPresenter {
    session: Arc<Session>,
    factory: Arc<dyn SurfaceFactory>,
    config: PresenterConfig,
}

impl SessionPresenter {
    pub fn new(session: Arc<Session>, factory: Arc<dyn SurfaceFactory>) -> Self {
        Self::with_config(session, factory, PresenterConfig::default())
    }

    pub fn with_config(
        session: Arc<Session>,
        factory: Arc<dyn SurfaceFactory>,
        config: PresenterConfig,
    ) -> Self {
        Self {
            session,
            factory,
            config,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Id of the live surface, if one exists
    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.live_slot().map(|slot| slot.id)
    }

    /// Close handle equivalent to the surface's own close button
    pub fn dismiss_handle(&self) -> DismissHandle {
        DismissHandle::new(&self.session)
    }

    /// Release the surface; the next `present` creates a new one
    pub fn dismiss(&self) -> bool {
        dismiss_surface(&self.session)
    }

    fn live_slot(&self) -> Option<SurfaceSlot> {
        self.session
            .data()
            .get(&SURFACE_KEY)
            .filter(|slot| !slot.lifetime.is_disposed())
    }

    fn create_slot(&self) -> Result<SurfaceSlot> {
        let surface = self
            .factory
            .create(&self.session, self.dismiss_handle())?;
        let id = surface.id();
        let surface: SharedSurface = Arc::new(Mutex::new(surface));

        let released = surface.clone();
        let lifetime = self
            .session
            .disposable()
            .child_with_teardown(id.to_string(), move || {
                lock_surface(&released).release();
            });

        let slot = SurfaceSlot {
            id,
            surface,
            lifetime,
        };
        self.session.data().put(&SURFACE_KEY, slot.clone());
        debug!("Created {} for session '{}'", id, self.session.name());
        Ok(slot)
    }
}

impl Presenter for SessionPresenter {
    fn present(&mut self, payload: PresentationPayload) -> Result<()> {
        if self.session.is_closed() {
            return Err(Error::SurfaceCreationFailed {
                reason: format!("session '{}' is closed", self.session.name()),
            });
        }

        let slot = match self.live_slot() {
            Some(slot) => slot,
            None => self.create_slot()?,
        };

        let mut surface = lock_surface(&slot.surface);
        surface.clear();
        surface.print(&payload.body);
        surface.scroll_to(0);
        surface.set_title(&payload.title);
        if self.config.activate_on_present {
            surface.activate(self.config.focus_on_activate);
        }

        trace!("Presented '{}' on {}", payload.title, slot.id);
        Ok(())
    }
}

fn lock_surface(surface: &SharedSurface) -> std::sync::MutexGuard<'_, Box<dyn Surface>> {
    surface
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
