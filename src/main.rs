use std::io;
use std::sync::Arc;

use clap::Parser;
use mudterm::{
    init_logging, normalize_legacy_args, terminal, Cli, CommandClient, CrosstermScreen,
    HttpTransport, InputStateMachine, RenderLoop, ScreenSize, Session, SharedSession, Shutdown,
    Transport, ViewFetcher, Viewport,
};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_from(normalize_legacy_args(std::env::args_os()));
    let log_guard = init_logging(cli.log_file.as_deref())?;
    let config = cli.config();

    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(&config.server, config.request_timeout)?);
    let screen: Arc<dyn ScreenSize> = Arc::new(CrosstermScreen);
    let (columns, rows) = screen.size()?;
    let session = SharedSession::new(Session::new(
        config.user_id.clone(),
        Viewport::from_terminal(columns, rows),
    ));

    terminal::enter_raw_mode()?;
    // Dropping the last handle restores the terminal, so early returns are covered too.
    let shutdown = Shutdown::with_restore(terminal::restore);
    log::info!(
        "session {} started against {} ({}x{})",
        config.user_id,
        config.server,
        columns,
        rows
    );

    let render = RenderLoop::new(
        session.clone(),
        ViewFetcher::new(transport.clone()),
        io::stdout(),
        config.tick,
    );
    let render_task = tokio::spawn(render.run(shutdown.clone()));

    let input = InputStateMachine::new(
        session,
        CommandClient::new(transport, config.user_id.clone()),
        screen,
        shutdown.clone(),
    );
    input.run(BufReader::new(tokio::io::stdin())).await;

    shutdown.trigger();
    if let Err(e) = render_task.await {
        log::warn!("render task failed: {}", e);
    }
    shutdown.restore_terminal();
    log::info!("session {} ended", config.user_id);
    drop(log_guard);

    // A pending blocking stdin read would otherwise hold the runtime open.
    std::process::exit(0);
}
