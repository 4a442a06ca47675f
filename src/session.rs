//! Session state shared by the input and render tasks.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::FOOTER_ROWS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Console,
}

/// Frame size requested from the server, in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    /// Derive the frame size from the terminal size, leaving room for the footer.
    pub fn from_terminal(columns: u16, rows: u16) -> Self {
        Self {
            width: columns.saturating_sub(1),
            height: rows.saturating_sub(1 + FOOTER_ROWS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    mode: Mode,
    command_buffer: String,
    previous_command: String,
    viewport: Viewport,
}

/// Copy of the fields the renderer reads in one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user_id: String,
    pub mode: Mode,
    pub command_buffer: String,
    pub previous_command: String,
    pub viewport: Viewport,
}

impl Session {
    pub fn new(user_id: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            user_id: user_id.into(),
            mode: Mode::Normal,
            command_buffer: String::new(),
            previous_command: String::new(),
            viewport,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn command_buffer(&self) -> &str {
        &self.command_buffer
    }

    pub fn previous_command(&self) -> &str {
        &self.previous_command
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Switch to console mode with an empty buffer.
    pub fn enter_console(&mut self) {
        self.mode = Mode::Console;
        self.command_buffer.clear();
    }

    /// Return to normal mode. The buffer is only meaningful in console mode.
    pub fn leave_console(&mut self) {
        self.mode = Mode::Normal;
        self.command_buffer.clear();
    }

    pub fn push_char(&mut self, ch: char) {
        self.command_buffer.push(ch);
    }

    /// Erase the last character; a no-op on an empty buffer.
    pub fn backspace(&mut self) {
        self.command_buffer.pop();
    }

    pub fn record_previous(&mut self, text: String) {
        self.previous_command = text;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user_id: self.user_id.clone(),
            mode: self.mode,
            command_buffer: self.command_buffer.clone(),
            previous_command: self.previous_command.clone(),
            viewport: self.viewport,
        }
    }
}

/// Session behind one lock. Each transition or snapshot takes the lock once and
/// never holds it across an await.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one transition under the lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }
}
