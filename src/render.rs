//! Periodic repaint of the server frame and the status footer.

use std::char::REPLACEMENT_CHARACTER;
use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::MoveTo,
    queue,
    style::ResetColor,
    terminal::{Clear, ClearType},
};
use tokio::time::{interval, MissedTickBehavior};

use crate::client::ViewFetcher;
use crate::config::LEGEND;
use crate::session::{Mode, SessionSnapshot, SharedSession};
use crate::shutdown::Shutdown;
use crate::transport::FrameStream;

pub const CONNECTION_LOST: &str = "Server Connection Lost - ";
pub const CONSOLE_PROMPT: &str = ">:";
pub const PROMPT: &str = ">";

pub struct RenderLoop<W: Write + Send> {
    session: SharedSession,
    views: ViewFetcher,
    out: W,
    tick: Duration,
}

impl<W: Write + Send> RenderLoop<W> {
    pub fn new(session: SharedSession, views: ViewFetcher, out: W, tick: Duration) -> Self {
        Self {
            session,
            views,
            out,
            tick,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Repaint on every tick until shutdown. A tick runs to completion before
    /// the next one starts, so at most one fetch is in flight.
    pub async fn run(mut self, shutdown: Shutdown) {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = shutdown.wait() => break,
                painted = self.render_tick() => {
                    if let Err(e) = painted {
                        log::warn!("failed to paint frame: {}", e);
                    }
                }
            }
        }
        log::debug!("render loop stopped");
    }

    /// Paint one complete screen: frame (or connection notice) then footer.
    pub async fn render_tick(&mut self) -> io::Result<()> {
        let SessionSnapshot {
            user_id, viewport, ..
        } = self.session.snapshot();
        queue!(
            self.out,
            MoveTo(0, 0),
            Clear(ClearType::FromCursorDown),
            ResetColor
        )?;

        match self.views.fetch(&user_id, viewport).await {
            Ok(stream) => self.paint_frame(stream).await?,
            Err(e) => {
                log::debug!("view fetch failed: {}", e);
                write!(self.out, "{}{}\r\n", CONNECTION_LOST, e)?;
            }
        }

        let snapshot = self.session.snapshot();
        self.paint_footer(&snapshot)?;
        self.out.flush()
    }

    async fn paint_frame(&mut self, mut stream: Box<dyn FrameStream>) -> io::Result<()> {
        let mut decoder = FrameDecoder::default();
        loop {
            match stream.next_chunk().await {
                Ok(Some(chunk)) => {
                    let text = decoder.push(&chunk);
                    self.write_text(&text)?;
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("frame ended early: {}", e);
                    break;
                }
            }
        }
        let rest = decoder.finish();
        self.write_text(&rest)
    }

    /// Raw mode does not return the carriage on line feed.
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.replace('\n', "\r\n").as_bytes())
    }

    fn paint_footer(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        let separator = "=".repeat(usize::from(snapshot.viewport.width));
        write!(self.out, "{}\r\n", separator)?;
        write!(self.out, " {}\r\n", LEGEND)?;
        write!(self.out, " {}\r\n", snapshot.previous_command)?;
        match snapshot.mode {
            Mode::Console => write!(self.out, "{}{}", CONSOLE_PROMPT, snapshot.command_buffer),
            Mode::Normal => write!(self.out, "{}", PROMPT),
        }
    }
}

/// Incremental UTF-8 decoding across chunk boundaries. Invalid sequences become
/// U+FFFD.
#[derive(Debug, Default)]
struct FrameDecoder {
    pending: Vec<u8>,
}

impl FrameDecoder {
    fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more.
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}
