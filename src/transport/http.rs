use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::protocol::{encode_command, CommandReply};
use crate::session::Viewport;
use crate::transport::{FrameStream, Transport};

/// Connect timeout for both endpoints.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Transport speaking to the game server over plain HTTP GET requests.
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    /// `timeout` bounds a whole request, body included.
    pub fn new(server: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut base = Url::parse(server)
            .map_err(|e| anyhow::anyhow!("invalid server address {}: {}", server, e))?;
        if base.cannot_be_a_base() {
            return Err(anyhow::anyhow!("invalid server address {}", server));
        }
        // Endpoints resolve under the base path, so it must end in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self { client, base })
    }

    /// URL of the command endpoint for `key`.
    pub fn command_url(&self, user_id: &str, key: &str) -> anyhow::Result<Url> {
        let mut url = self.base.join("cmd")?;
        url.set_query(Some(&format!(
            "uid={}&key={}",
            encode_command(user_id),
            encode_command(key)
        )));
        Ok(url)
    }

    /// URL of the view endpoint for `viewport`.
    pub fn view_url(&self, user_id: &str, viewport: Viewport) -> anyhow::Result<Url> {
        let mut url = self.base.clone();
        url.set_query(Some(&format!(
            "uid={}&w={}&h={}",
            encode_command(user_id),
            viewport.width,
            viewport.height
        )));
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn command(&self, user_id: &str, key: &str) -> anyhow::Result<CommandReply> {
        let url = self.command_url(user_id, key)?;
        let response = self.client.get(url).send().await?;
        let success = response.status() == StatusCode::OK;
        let message = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("failed to read command reply body: {}", e);
                String::new()
            }
        };
        Ok(CommandReply { success, message })
    }

    async fn view(
        &self,
        user_id: &str,
        viewport: Viewport,
    ) -> anyhow::Result<Box<dyn FrameStream>> {
        let url = self.view_url(user_id, viewport)?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            log::debug!("view endpoint returned {}", response.status());
        }
        Ok(Box::new(HttpFrameStream { response }))
    }
}

struct HttpFrameStream {
    response: Response,
}

#[async_trait::async_trait]
impl FrameStream for HttpFrameStream {
    async fn next_chunk(&mut self) -> anyhow::Result<Option<Vec<u8>>> {
        let chunk = self.response.chunk().await?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}
