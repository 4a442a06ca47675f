use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::yield_now;

use crate::protocol::CommandReply;
use crate::session::Viewport;
use crate::transport::{FrameStream, Transport};

/// A command as received by the in-memory server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCommand {
    pub user_id: String,
    pub key: String,
}

#[derive(Debug, Default)]
struct ServerState {
    /// `None` while the server is unreachable.
    frame: Option<Vec<u8>>,
    /// Break the frame stream after the frame's chunks.
    broken_stream: bool,
    chunk_size: usize,
    replies: VecDeque<CommandReply>,
    commands: Vec<SentCommand>,
    views: Vec<(String, Viewport)>,
}

/// Scripted server used by tests and offline runs. Clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryTransport {
    state: Arc<Mutex<ServerState>>,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState {
                frame: Some(Vec::new()),
                chunk_size: 64,
                ..ServerState::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve `frame` from the view endpoint until changed.
    pub fn set_frame(&self, frame: impl Into<Vec<u8>>) {
        let mut state = self.state();
        state.frame = Some(frame.into());
        state.broken_stream = false;
    }

    /// Serve `frame` and then fail the stream instead of ending it.
    pub fn set_broken_frame(&self, frame: impl Into<Vec<u8>>) {
        let mut state = self.state();
        state.frame = Some(frame.into());
        state.broken_stream = true;
    }

    pub fn set_chunk_size(&self, size: usize) {
        self.state().chunk_size = size.max(1);
    }

    /// Make both endpoints unreachable.
    pub fn disconnect(&self) {
        self.state().frame = None;
    }

    /// Queue the reply for the next command; unqueued commands succeed silently.
    pub fn push_reply(&self, reply: CommandReply) {
        self.state().replies.push_back(reply);
    }

    pub fn commands(&self) -> Vec<SentCommand> {
        self.state().commands.clone()
    }

    pub fn view_requests(&self) -> Vec<(String, Viewport)> {
        self.state().views.clone()
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn command(&self, user_id: &str, key: &str) -> anyhow::Result<CommandReply> {
        yield_now().await;
        let mut state = self.state();
        if state.frame.is_none() {
            return Err(anyhow::anyhow!("connection refused"));
        }
        state.commands.push(SentCommand {
            user_id: user_id.to_string(),
            key: key.to_string(),
        });
        Ok(state.replies.pop_front().unwrap_or_else(CommandReply::ok))
    }

    async fn view(
        &self,
        user_id: &str,
        viewport: Viewport,
    ) -> anyhow::Result<Box<dyn FrameStream>> {
        yield_now().await;
        let mut state = self.state();
        let frame = state
            .frame
            .clone()
            .ok_or_else(|| anyhow::anyhow!("connection refused"))?;
        state.views.push((user_id.to_string(), viewport));
        let chunks = frame.chunks(state.chunk_size).map(<[u8]>::to_vec).collect();
        Ok(Box::new(InMemoryFrameStream {
            chunks,
            broken: state.broken_stream,
        }))
    }
}

struct InMemoryFrameStream {
    chunks: VecDeque<Vec<u8>>,
    broken: bool,
}

#[async_trait::async_trait]
impl FrameStream for InMemoryFrameStream {
    async fn next_chunk(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        match self.chunks.pop_front() {
            Some(chunk) => Ok(Some(chunk)),
            None if self.broken => Err(anyhow::anyhow!("connection reset by peer")),
            None => Ok(None),
        }
    }
}
