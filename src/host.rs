//! Host action-trigger interface
//!
//! What the lookup needs from the editor at the moment the user asks for
//! a page. Everything here is read-only.

use crate::session::Session;
use std::sync::Arc;

/// Snapshot access to the editor state behind one lookup action
pub trait ActionContext: Send + Sync {
    /// Full text of the active buffer
    fn buffer_text(&self) -> &str;

    /// Caret position, in characters
    fn caret_offset(&self) -> usize;

    /// Current selection, if any
    fn selected_text(&self) -> Option<&str>;

    /// Session the action was triggered in
    fn session(&self) -> &Arc<Session>;
}

/// Fixed editor state, for hosts that capture it up front
#[derive(Debug, Clone)]
pub struct StaticContext {
    buffer_text: String,
    caret_offset: usize,
    selected_text: Option<String>,
    session: Arc<Session>,
}

impl StaticContext {
    pub fn new(session: Arc<Session>, buffer_text: impl Into<String>, caret_offset: usize) -> Self {
        Self {
            buffer_text: buffer_text.into(),
            caret_offset,
            selected_text: None,
            session,
        }
    }

    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selected_text = Some(selection.into());
        self
    }
}

impl ActionContext for StaticContext {
    fn buffer_text(&self) -> &str {
        &self.buffer_text
    }

    fn caret_offset(&self) -> usize {
        self.caret_offset
    }

    fn selected_text(&self) -> Option<&str> {
        self.selected_text.as_deref()
    }

    fn session(&self) -> &Arc<Session> {
        &self.session
    }
}
