use crate::protocol::CommandReply;
use crate::session::Viewport;

/// The two server endpoints: command submission and frame retrieval.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send an unencoded command key. `Err` means the request never completed.
    async fn command(&self, user_id: &str, key: &str) -> anyhow::Result<CommandReply>;

    /// Request the frame for `viewport`. `Err` means the server was unreachable.
    async fn view(&self, user_id: &str, viewport: Viewport)
        -> anyhow::Result<Box<dyn FrameStream>>;
}

/// Body of one frame, read in chunks until the server closes it.
#[async_trait::async_trait]
pub trait FrameStream: Send {
    /// Next chunk of bytes, or `None` at end of frame.
    async fn next_chunk(&mut self) -> anyhow::Result<Option<Vec<u8>>>;
}

pub mod http;
pub mod in_memory;
