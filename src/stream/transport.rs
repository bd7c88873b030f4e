//! # Transport
//!
//! The seam between the stream session and the network. The session only
//! needs two things: open a response for a question, then pull raw chunks
//! until EOF. Anything that can do that (a real HTTP client, a scripted
//! fake in tests) plugs in here.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde::Serialize;

/// Errors that end a turn before or during streaming.
#[derive(Debug)]
pub enum TransportError {
    /// The HTTP client could not be built.
    Config(String),
    /// Connection, DNS, timeout or mid-body read failure.
    Network(String),
    /// The server answered with a non-success status.
    Status { status: u16, message: String },
    /// The server answered successfully but without a body to stream.
    MissingBody,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Config(msg) => write!(f, "config error: {msg}"),
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::Status { status, message } => {
                write!(f, "server error (HTTP {status}): {message}")
            }
            TransportError::MissingBody => write!(f, "response has no body"),
        }
    }
}

impl std::error::Error for TransportError {}

/// A response body being read chunk by chunk.
#[async_trait]
pub trait ResponseBody: Send {
    /// Next raw chunk, or `None` at end of body.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError>;
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the question and returns the streamed answer body.
    async fn open(&self, message: &str) -> Result<Box<dyn ResponseBody>, TransportError>;
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// `POST {base_url}/api/chat` over reqwest.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;
        let base_url: String = base_url.into();

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, message: &str) -> Result<Box<dyn ResponseBody>, TransportError> {
        info!("POST {} (message_len={})", self.endpoint(), message.len());

        let response = self
            .client
            .post(self.endpoint())
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Chat response status: {}", status);

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Chat API error: {} - {}", status.as_u16(), message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            warn!("Chat API answered 204 with nothing to stream");
            return Err(TransportError::MissingBody);
        }

        Ok(Box::new(HttpBody {
            stream: response.bytes_stream().boxed(),
        }))
    }
}

struct HttpBody {
    stream: BoxStream<'static, reqwest::Result<Bytes>>,
}

#[async_trait]
impl ResponseBody for HttpBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        match self.stream.next().await {
            Some(Ok(chunk)) => {
                debug!("Raw chunk received: {} bytes", chunk.len());
                Ok(Some(chunk))
            }
            Some(Err(e)) => Err(TransportError::Network(e.to_string())),
            None => Ok(None),
        }
    }
}
