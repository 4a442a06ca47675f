//! Command wire format and the status suffixes recorded after submission.

pub const OK_SUFFIX: &str = " (ok)";
pub const NOT_OK_SUFFIX: &str = " (not ok)";
pub const MESSAGE_SEPARATOR: &str = " - ";

/// Marker that distinguishes free-form text from single-letter commands.
pub const FREEFORM_PREFIX: char = '>';

pub const ATTACK: &str = "attack";
pub const RESIZE: &str = "resize";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

/// Commands understood by the server's command endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Quit,
    /// Free-form console text, sent with [`FREEFORM_PREFIX`].
    Freeform(String),
}

impl Command {
    /// The unencoded `key` value sent to the server.
    pub fn wire(&self) -> String {
        match self {
            Command::Move(Direction::Up) => "mw".to_string(),
            Command::Move(Direction::Left) => "ma".to_string(),
            Command::Move(Direction::Down) => "ms".to_string(),
            Command::Move(Direction::Right) => "md".to_string(),
            Command::Quit => "q".to_string(),
            Command::Freeform(text) => format!("{}{}", FREEFORM_PREFIX, text),
        }
    }
}

/// Percent-encode a command for use as a query value (space becomes `+`).
pub fn encode_command(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// Outcome of one command request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandReply {
    pub success: bool,
    pub message: String,
}

impl CommandReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Suffix appended to the submitted text for display and repeat.
    pub fn suffix(&self) -> String {
        if !self.message.is_empty() {
            format!("{}{}", MESSAGE_SEPARATOR, self.message)
        } else if self.success {
            OK_SUFFIX.to_string()
        } else {
            NOT_OK_SUFFIX.to_string()
        }
    }
}

/// Remove one trailing `" (ok)"` or `" (not ok)"`. Message suffixes are kept.
pub fn strip_status(text: &str) -> &str {
    text.strip_suffix(OK_SUFFIX)
        .or_else(|| text.strip_suffix(NOT_OK_SUFFIX))
        .unwrap_or(text)
}

/// Text stored as the previous command once `reply` arrives.
pub fn with_status(text: &str, reply: &CommandReply) -> String {
    format!("{}{}", text, reply.suffix())
}
