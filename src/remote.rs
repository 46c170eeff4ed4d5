// src/remote.rs

//! Remote access for manifests and mod files.
//!
//! Everything the engine does over the network goes through [`RemoteSource`],
//! so tests can swap in an in-memory source.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::Client;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Chunks of a remote body as they arrive.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

pub const DEFAULT_USER_AGENT: &str = concat!("mod_sync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("no usable content length for {0}")]
    MissingLength(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Reads the whole body at `url` as text.
    async fn fetch_text(&self, url: &str) -> Result<String, RemoteError>;

    /// Declared size of the resource at `url`.
    async fn content_length(&self, url: &str) -> Result<u64, RemoteError>;

    /// Opens the resource at `url` for streaming.
    async fn open(&self, url: &str) -> Result<ByteStream, RemoteError>;
}

/// [`RemoteSource`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    /// Whole-request cap for the manifest fetch and size checks only.
    request_timeout: Option<Duration>,
}

impl HttpRemote {
    /// `timeout` bounds connecting and every idle gap while reading. Mod
    /// downloads have no total cap, so a slow but live transfer completes.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client, request_timeout: Some(timeout) })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client, request_timeout: None }
    }

    fn bounded(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.request_timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    fn check(resp: reqwest::Response, url: &str) -> Result<reqwest::Response, RemoteError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status { status: status.as_u16(), url: url.to_string() });
        }
        Ok(resp)
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_text(&self, url: &str) -> Result<String, RemoteError> {
        let resp = self.bounded(self.client.get(url)).send().await?;
        let resp = Self::check(resp, url)?;
        Ok(resp.text().await?)
    }

    async fn content_length(&self, url: &str) -> Result<u64, RemoteError> {
        let resp = self.bounded(self.client.head(url)).send().await?;
        let resp = Self::check(resp, url)?;
        resp.headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| RemoteError::MissingLength(url.to_string()))
    }

    async fn open(&self, url: &str) -> Result<ByteStream, RemoteError> {
        let resp = self.client.get(url).send().await?;
        let resp = Self::check(resp, url)?;
        Ok(resp
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
            .boxed())
    }
}
