//! Thin adapter over crossterm: raw mode, size query and screen reset.

use std::io::{self, Write};

use anyhow::Context;
use crossterm::{
    cursor::MoveTo,
    execute,
    style::ResetColor,
    terminal::{self, Clear, ClearType},
};

/// Source of the terminal's dimensions as `(columns, rows)`.
pub trait ScreenSize: Send + Sync {
    fn size(&self) -> anyhow::Result<(u16, u16)>;
}

pub struct CrosstermScreen;

impl ScreenSize for CrosstermScreen {
    fn size(&self) -> anyhow::Result<(u16, u16)> {
        terminal::size().context("unable to get screen dimensions")
    }
}

pub fn enter_raw_mode() -> anyhow::Result<()> {
    terminal::enable_raw_mode().context("unable to enter raw terminal mode")
}

/// Clear the screen, reset colours and leave raw mode. Errors are logged only.
pub fn restore() {
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, MoveTo(0, 0), ResetColor, Clear(ClearType::All)) {
        log::warn!("failed to clear screen: {}", e);
    }
    let _ = stdout.flush();
    if let Err(e) = terminal::disable_raw_mode() {
        log::warn!("failed to leave raw mode: {}", e);
    }
}
