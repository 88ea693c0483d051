//! Fetching the metadata snapshot.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::SourceConfig;
use crate::error::PlaybackError;
use crate::snapshot::{parse_payload, PlaybackSnapshot};

pub const USER_AGENT: &str = concat!("vgm-radio/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce one point-in-time snapshot.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self) -> Result<PlaybackSnapshot, PlaybackError>;
}

/// Plain HTTP GET against the metadata endpoint.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        Self::new(config.metadata_url.clone(), config.request_timeout())
    }

    /// Reuse an existing client (and its connection pool).
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MetadataSource for HttpSource {
    async fn fetch(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        let resp = self.client.get(&self.url).send().await.map_err(classify)?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(PlaybackError::Status(status.as_u16()));
        }
        let body = resp.bytes().await.map_err(classify)?;
        debug!("metadata: {} bytes from {}", body.len(), self.url);
        parse_payload(&body)
    }
}

fn classify(e: reqwest::Error) -> PlaybackError {
    if e.is_timeout() {
        PlaybackError::Timeout
    } else {
        PlaybackError::Transport(e)
    }
}
