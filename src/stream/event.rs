//! # Frame Decoder
//!
//! Every frame of the chat stream is one JSON record with a `type`
//! discriminant and a `data` payload:
//!
//! ```text
//! {"type":"content","data":"<text fragment>"}
//! {"type":"sources","data":[{"domain":"…","reference":"…"}, …]}
//! ```
//!
//! Decoding is a two-step affair: first the envelope, then the payload for the
//! discriminant it names. That keeps "not JSON at all", "unknown type" and
//! "right type, wrong payload" apart in the logs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A legal reference cited by the upstream service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub domain: String,
    pub reference: String,
}

/// One decoded record of the chat stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of the answer body, appended in arrival order.
    ContentChunk(String),
    /// The cited references. Replaces any earlier footer.
    SourcesUpdate(Vec<SourceRef>),
}

/// Why a frame was rejected. Never fatal to the stream.
#[derive(Debug)]
pub enum DecodeError {
    /// The frame is not a JSON record with a `type` field.
    Malformed(serde_json::Error),
    /// The record names a type this client does not know.
    UnknownType(String),
    /// Known type, but `data` has the wrong shape.
    InvalidPayload {
        kind: &'static str,
        source: serde_json::Error,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(e) => write!(f, "malformed record: {e}"),
            DecodeError::UnknownType(kind) => write!(f, "unknown record type '{kind}'"),
            DecodeError::InvalidPayload { kind, source } => {
                write!(f, "invalid '{kind}' payload: {source}")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Malformed(e) => Some(e),
            DecodeError::InvalidPayload { source, .. } => Some(source),
            DecodeError::UnknownType(_) => None,
        }
    }
}

/// Envelope shared by all records.
#[derive(Deserialize, Debug)]
struct Record {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Decodes one complete frame.
pub fn decode(frame: &str) -> Result<StreamEvent, DecodeError> {
    let record: Record = serde_json::from_str(frame).map_err(DecodeError::Malformed)?;

    match record.kind.as_str() {
        "content" => serde_json::from_value(record.data)
            .map(StreamEvent::ContentChunk)
            .map_err(|source| DecodeError::InvalidPayload {
                kind: "content",
                source,
            }),
        "sources" => serde_json::from_value(record.data)
            .map(StreamEvent::SourcesUpdate)
            .map_err(|source| DecodeError::InvalidPayload {
                kind: "sources",
                source,
            }),
        _ => Err(DecodeError::UnknownType(record.kind)),
    }
}
