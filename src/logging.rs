use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `debug` or `mudterm=trace`.
pub const LOG_FILTER_ENV: &str = "MUDTERM_LOG";

/// Send `log` records to `path` through a background writer. The filter comes
/// from `MUDTERM_LOG` and defaults to `info`.
///
/// Without a log file nothing is installed, so logging stays off; the terminal
/// itself belongs to the renderer. Keep the returned guard alive until exit,
/// dropping it flushes pending lines.
pub fn init_logging(path: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("cannot open log file {}: {}", path.display(), e))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialized: {}", e))?;
    Ok(Some(guard))
}
