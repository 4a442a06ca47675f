//! Command-line flags.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{
    ClientConfig, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVER, DEFAULT_TICK, DEFAULT_UID,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal client for a text game server", long_about = None)]
pub struct Cli {
    /// User id passed to the server. `-uid` is accepted as well.
    #[arg(long, default_value = DEFAULT_UID)]
    pub uid: String,
    #[arg(long, default_value = DEFAULT_SERVER, help = "Base URL of the game server")]
    pub server: String,
    #[arg(
        long,
        default_value_t = DEFAULT_TICK.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Milliseconds between repaints"
    )]
    pub tick_ms: u64,
    #[arg(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Timeout for a single HTTP request in milliseconds"
    )]
    pub timeout_ms: u64,
    #[arg(long, help = "Append log records to this file (level from MUDTERM_LOG)")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            server: self.server.clone(),
            user_id: self.uid.clone(),
            tick: Duration::from_millis(self.tick_ms),
            request_timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Rewrite the single-dash `-uid` spelling to `--uid` so clap accepts it.
pub fn normalize_legacy_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            match arg.to_str() {
                Some("-uid") => OsString::from("--uid"),
                Some(s) if s.starts_with("-uid=") => OsString::from(format!("-{}", s)),
                _ => arg,
            }
        })
        .collect()
}
