use std::time::Duration;

pub const DEFAULT_SERVER: &str = "http://localhost:8888";
pub const DEFAULT_UID: &str = "foo";
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(2000);

/// Rows kept below the frame for the separator, legend and previous command.
pub const FOOTER_ROWS: u16 = 3;

pub const KEY_UP: u8 = b'w';
pub const KEY_LEFT: u8 = b'a';
pub const KEY_DOWN: u8 = b's';
pub const KEY_RIGHT: u8 = b'd';
pub const KEY_REPEAT: u8 = b'.';
pub const KEY_ATTACK: u8 = b'x';
pub const KEY_CONSOLE: u8 = b':';
pub const KEY_QUIT: u8 = b'q';
pub const KEY_SUBMIT: u8 = b';';

pub const BS: u8 = 8;
pub const CR: u8 = b'\r';
pub const ESC: u8 = 27;
pub const DEL: u8 = 127;

pub const LEGEND: &str =
    "q to quit. w,a,s,d to move. . to repeat, x to attack. Press `:` to enter command mode.";

/// Runtime settings for one client process.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: String,
    pub user_id: String,
    pub tick: Duration,
    pub request_timeout: Duration,
}
