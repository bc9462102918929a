//! Terminal surface
//!
//! Renders the page to a writer (stdout for the binary). A terminal has no
//! window to bring forward, so "activate" means "draw now". Content that
//! was never drawn is flushed when the surface is released.

use super::{DismissHandle, Surface, SurfaceFactory, SurfaceId};
use crate::error::Result;
use crate::session::Session;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Writer shared between a factory and the surfaces it creates
pub type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

pub struct TerminalSurface {
    id: SurfaceId,
    writer: SharedWriter,
    title: String,
    content: String,
    scroll_line: usize,
    dirty: bool,
    released: bool,
}

impl TerminalSurface {
    pub fn new(writer: SharedWriter) -> Self {
        Self {
            id: SurfaceId::next(),
            writer,
            title: String::new(),
            content: String::new(),
            scroll_line: 0,
            dirty: false,
            released: false,
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !self.title.is_empty() {
            writeln!(writer, "{}", self.title)?;
            writeln!(writer, "{}", "=".repeat(self.title.chars().count()))?;
        }
        for line in self.content.lines().skip(self.scroll_line) {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;

        self.dirty = false;
        Ok(())
    }

    fn render_or_warn(&mut self) {
        if let Err(e) = self.render() {
            warn!("Failed to render {}: {}", self.id, e);
        }
    }
}

impl Surface for TerminalSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn clear(&mut self) {
        self.content.clear();
        self.scroll_line = 0;
        self.dirty = true;
    }

    fn print(&mut self, text: &str) {
        self.content.push_str(text);
        self.dirty = true;
    }

    fn scroll_to(&mut self, line: usize) {
        self.scroll_line = line;
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.dirty = true;
    }

    fn activate(&mut self, _focus: bool) {
        if !self.released {
            self.render_or_warn();
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        if self.dirty {
            self.render_or_warn();
        }
        self.released = true;
    }
}

/// Builds [`TerminalSurface`]s over one shared writer
pub struct TerminalSurfaceFactory {
    writer: SharedWriter,
}

impl TerminalSurfaceFactory {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }
}

impl SurfaceFactory for TerminalSurfaceFactory {
    fn create(&self, _session: &Session, _dismiss: DismissHandle) -> Result<Box<dyn Surface>> {
        Ok(Box::new(TerminalSurface::new(self.writer.clone())))
    }
}
