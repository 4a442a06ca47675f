pub mod cli;
pub mod client;
pub mod config;
pub mod input;
mod logging;
pub mod protocol;
pub mod render;
pub mod session;
pub mod shutdown;
pub mod terminal;
pub mod transport;

pub use cli::{normalize_legacy_args, Cli};
pub use client::{CommandClient, ViewFetcher};
pub use config::*;
pub use input::{classify, Action, Flow, InputStateMachine};
pub use logging::init_logging;
pub use protocol::*;
pub use render::RenderLoop;
pub use session::{Mode, Session, SessionSnapshot, SharedSession, Viewport};
pub use shutdown::Shutdown;
pub use terminal::{CrosstermScreen, ScreenSize};
pub use transport::{http::HttpTransport, in_memory::InMemoryTransport, FrameStream, Transport};
