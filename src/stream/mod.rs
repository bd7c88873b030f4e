//! # Streaming Response Consumer
//!
//! ```text
//! transport bytes → FrameBuffer → decode → Accumulator → SessionUpdate
//! ```
//!
//! Everything the client knows about the `/api/chat` wire format lives here.

pub mod accumulator;
pub mod event;
pub mod frame;
pub mod message;
pub mod session;
pub mod transport;

pub use accumulator::{Accumulator, MAX_SOURCES};
pub use event::{DecodeError, SourceRef, StreamEvent, decode};
pub use frame::FrameBuffer;
pub use message::{APOLOGY, ChatMessage, Role};
pub use session::{Phase, SessionError, SessionUpdate, StreamSession, run_session};
pub use transport::{ChatTransport, HttpTransport, ResponseBody, TransportError};
