//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc::Receiver;

use crate::stream::{ChatTransport, ResponseBody, SessionUpdate, TransportError};

/// A transport that replays a fixed script instead of touching the network.
pub struct ScriptedTransport {
    chunks: Vec<Bytes>,
    open_error: Mutex<Option<TransportError>>,
    read_error: Mutex<Option<TransportError>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    /// Successful response whose body arrives as these reads.
    pub fn ok(chunks: Vec<&str>) -> Self {
        Self {
            chunks: chunks
                .into_iter()
                .map(|c| Bytes::copy_from_slice(c.as_bytes()))
                .collect(),
            open_error: Mutex::new(None),
            read_error: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// The request itself fails.
    pub fn failing(error: TransportError) -> Self {
        let transport = Self::ok(vec![]);
        *transport.open_error.lock().unwrap() = Some(error);
        transport
    }

    /// Body yields `chunks`, then the read fails with `error`.
    pub fn interrupted(chunks: Vec<&str>, error: TransportError) -> Self {
        let transport = Self::ok(chunks);
        *transport.read_error.lock().unwrap() = Some(error);
        transport
    }

    /// Every message passed to `open`, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

struct ScriptedBody {
    chunks: VecDeque<Bytes>,
    error: Option<TransportError>,
}

#[async_trait]
impl ResponseBody for ScriptedBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(&self, message: &str) -> Result<Box<dyn ResponseBody>, TransportError> {
        self.requests.lock().unwrap().push(message.to_string());
        if let Some(e) = self.open_error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(Box::new(ScriptedBody {
            chunks: self.chunks.iter().cloned().collect(),
            error: self.read_error.lock().unwrap().take(),
        }))
    }
}

/// Drains a session's update channel until the sender is dropped.
pub async fn collect_updates(mut rx: Receiver<SessionUpdate>) -> Vec<SessionUpdate> {
    let mut updates = Vec::new();
    while let Some(update) = rx.recv().await {
        updates.push(update);
    }
    updates
}

/// Creates a test App backed by an empty scripted transport.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(Arc::new(ScriptedTransport::ok(vec![])))
}
