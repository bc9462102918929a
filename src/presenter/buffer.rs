//! In-memory surface
//!
//! Keeps what a real view would display so hosts without a window (and
//! tests) can read it back.

use super::{DismissHandle, Surface, SurfaceFactory, SurfaceId};
use crate::error::Result;
use crate::session::Session;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct BufferState {
    title: String,
    content: String,
    scroll_line: usize,
    activations: usize,
    focused: bool,
    released: bool,
}

/// Read-only view of a [`BufferSurface`], valid after the surface is gone
#[derive(Debug, Clone)]
pub struct BufferView {
    id: SurfaceId,
    state: Arc<Mutex<BufferState>>,
    dismiss: DismissHandle,
}

impl BufferView {
    fn state(&self) -> MutexGuard<'_, BufferState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn title(&self) -> String {
        self.state().title.clone()
    }

    pub fn content(&self) -> String {
        self.state().content.clone()
    }

    pub fn scroll_line(&self) -> usize {
        self.state().scroll_line
    }

    pub fn activations(&self) -> usize {
        self.state().activations
    }

    pub fn is_focused(&self) -> bool {
        self.state().focused
    }

    pub fn is_released(&self) -> bool {
        self.state().released
    }

    /// What the surface's close button would do
    pub fn click_close(&self) -> bool {
        self.dismiss.dismiss()
    }
}

/// Surface that renders into memory
pub struct BufferSurface {
    view: BufferView,
}

impl BufferSurface {
    pub fn new(dismiss: DismissHandle) -> Self {
        Self {
            view: BufferView {
                id: SurfaceId::next(),
                state: Arc::new(Mutex::new(BufferState::default())),
                dismiss,
            },
        }
    }

    pub fn view(&self) -> BufferView {
        self.view.clone()
    }
}

impl Surface for BufferSurface {
    fn id(&self) -> SurfaceId {
        self.view.id
    }

    fn clear(&mut self) {
        let mut state = self.view.state();
        state.content.clear();
        state.scroll_line = 0;
    }

    fn print(&mut self, text: &str) {
        self.view.state().content.push_str(text);
    }

    fn scroll_to(&mut self, line: usize) {
        let mut state = self.view.state();
        let last_line = state.content.lines().count().saturating_sub(1);
        state.scroll_line = line.min(last_line);
    }

    fn set_title(&mut self, title: &str) {
        self.view.state().title = title.to_string();
    }

    fn activate(&mut self, focus: bool) {
        let mut state = self.view.state();
        state.activations += 1;
        state.focused = focus;
    }

    fn release(&mut self) {
        let mut state = self.view.state();
        state.released = true;
        state.focused = false;
    }
}

/// Factory that remembers every surface it built
#[derive(Debug, Default)]
pub struct BufferSurfaceFactory {
    created: Mutex<Vec<BufferView>>,
}

impl BufferSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Views of all surfaces created so far, oldest first
    pub fn created(&self) -> Vec<BufferView> {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The most recently created surface
    pub fn latest(&self) -> Option<BufferView> {
        self.created().pop()
    }
}

impl SurfaceFactory for BufferSurfaceFactory {
    fn create(&self, _session: &Session, dismiss: DismissHandle) -> Result<Box<dyn Surface>> {
        let surface = BufferSurface::new(dismiss);
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(surface.view());
        Ok(Box::new(surface))
    }
}
