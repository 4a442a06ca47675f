//! Command dispatch and frame retrieval on top of a [`Transport`].

use std::sync::Arc;

use crate::protocol::{Command, CommandReply};
use crate::session::Viewport;
use crate::transport::{FrameStream, Transport};

/// Sends commands for one user. Transport failures become unsuccessful replies.
#[derive(Clone)]
pub struct CommandClient {
    transport: Arc<dyn Transport>,
    user_id: String,
}

impl CommandClient {
    pub fn new(transport: Arc<dyn Transport>, user_id: impl Into<String>) -> Self {
        Self {
            transport,
            user_id: user_id.into(),
        }
    }

    pub async fn dispatch(&self, command: &Command) -> CommandReply {
        let key = command.wire();
        match self.transport.command(&self.user_id, &key).await {
            Ok(reply) => {
                log::debug!("command {:?} -> {:?}", key, reply);
                reply
            }
            Err(e) => {
                log::warn!("command {:?} failed: {}", key, e);
                CommandReply::failed(e.to_string())
            }
        }
    }

    /// Send without waiting for the reply; the outcome is only logged.
    pub fn dispatch_detached(&self, command: Command) -> tokio::task::JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            client.dispatch(&command).await;
        })
    }
}

/// Fetches frames; the user id comes from the session on each call.
#[derive(Clone)]
pub struct ViewFetcher {
    transport: Arc<dyn Transport>,
}

impl ViewFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn fetch(
        &self,
        user_id: &str,
        viewport: Viewport,
    ) -> anyhow::Result<Box<dyn FrameStream>> {
        self.transport.view(user_id, viewport).await
    }
}
