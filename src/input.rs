//! Keystroke handling: normal-mode hotkeys and console-mode line editing.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::client::CommandClient;
use crate::config::*;
use crate::protocol::{strip_status, with_status, Command, Direction, ATTACK, RESIZE};
use crate::session::{Mode, SharedSession, Viewport};
use crate::shutdown::Shutdown;
use crate::terminal::ScreenSize;

/// Back-off after a failed stdin read so a broken input does not spin.
const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// What a single input byte means in the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    Repeat,
    Attack,
    EnterConsole,
    Quit,
    Erase,
    Submit,
    Append(char),
    Ignore,
}

pub fn classify(mode: Mode, byte: u8) -> Action {
    match mode {
        Mode::Normal => match byte {
            KEY_UP => Action::Move(Direction::Up),
            KEY_LEFT => Action::Move(Direction::Left),
            KEY_DOWN => Action::Move(Direction::Down),
            KEY_RIGHT => Action::Move(Direction::Right),
            KEY_REPEAT => Action::Repeat,
            KEY_ATTACK => Action::Attack,
            KEY_CONSOLE | ESC => Action::EnterConsole,
            KEY_QUIT => Action::Quit,
            _ => Action::Ignore,
        },
        Mode::Console => match byte {
            BS | DEL => Action::Erase,
            KEY_SUBMIT | CR => Action::Submit,
            other => Action::Append(char::from(other)),
        },
    }
}

/// Whether the input task should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Drives session transitions from raw input bytes. This is the only writer of
/// the session.
pub struct InputStateMachine {
    session: SharedSession,
    commands: CommandClient,
    screen: Arc<dyn ScreenSize>,
    shutdown: Shutdown,
}

impl InputStateMachine {
    pub fn new(
        session: SharedSession,
        commands: CommandClient,
        screen: Arc<dyn ScreenSize>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            session,
            commands,
            screen,
            shutdown,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Apply one input byte. Buffer edits happen under a single lock; commands
    /// are sent with the lock released.
    pub async fn handle_byte(&self, byte: u8) -> Flow {
        let action = self.session.update(|session| {
            let action = classify(session.mode(), byte);
            match action {
                Action::EnterConsole => session.enter_console(),
                Action::Erase => session.backspace(),
                Action::Append(ch) => session.push_char(ch),
                _ => {}
            }
            action
        });

        match action {
            Action::Move(direction) => {
                self.commands.dispatch_detached(Command::Move(direction));
            }
            Action::Repeat => {
                let previous = self.session.lock().previous_command().to_string();
                self.submit(previous).await;
            }
            Action::Attack => self.submit(ATTACK.to_string()).await,
            Action::Submit => {
                let text = self.session.lock().command_buffer().to_string();
                self.submit(text).await;
            }
            Action::Quit => {
                self.quit().await;
                return Flow::Quit;
            }
            Action::Ignore => log::debug!("ignoring input byte {:#04x}", byte),
            Action::EnterConsole | Action::Erase | Action::Append(_) => {}
        }
        Flow::Continue
    }

    /// Send free-form text and record the outcome as the previous command.
    /// Always ends in normal mode with an empty buffer.
    pub async fn submit(&self, pending: String) {
        let text = if pending == RESIZE {
            let viewport = self.refresh_viewport();
            format!("{} {} {}", RESIZE, viewport.width, viewport.height)
        } else {
            strip_status(&pending).to_string()
        };

        let reply = self.commands.dispatch(&Command::Freeform(text.clone())).await;
        let recorded = with_status(&text, &reply);
        log::info!("submitted {:?}", recorded);

        self.session.update(|session| {
            session.record_previous(recorded);
            session.leave_console();
        });
    }

    /// Re-query the terminal and store the new viewport. Keeps the old one if
    /// the query fails.
    fn refresh_viewport(&self) -> Viewport {
        match self.screen.size() {
            Ok((columns, rows)) => {
                let viewport = Viewport::from_terminal(columns, rows);
                self.session.update(|session| session.set_viewport(viewport));
                viewport
            }
            Err(e) => {
                log::warn!("keeping previous viewport: {:#}", e);
                self.session.lock().viewport()
            }
        }
    }

    async fn quit(&self) {
        let reply = self.commands.dispatch(&Command::Quit).await;
        if !reply.success {
            log::warn!("quit command not acknowledged: {}", reply.message);
        }
        self.shutdown.trigger();
    }

    /// Read bytes until quit, end of input, or shutdown.
    pub async fn run<R: AsyncRead + Unpin>(&self, mut input: R) {
        loop {
            let read = tokio::select! {
                _ = self.shutdown.wait() => return,
                read = input.read_u8() => read,
            };
            match read {
                Ok(byte) => {
                    if self.handle_byte(byte).await == Flow::Quit {
                        return;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    log::info!("input closed");
                    self.shutdown.trigger();
                    return;
                }
                Err(e) => {
                    log::warn!("failed to read input: {}", e);
                    tokio::time::sleep(READ_RETRY_DELAY).await;
                }
            }
        }
    }
}
