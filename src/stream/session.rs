//! # Stream Session
//!
//! One question, one streamed answer. The session walks an explicit state
//! machine and turns everything it reads into [`SessionUpdate`]s for whoever
//! owns the conversation.
//!
//! ```text
//!   Idle ──begin──▶ Sending ──open──▶ Streaming ──finish──▶ Completed
//!                      │                  │                     │
//!                      └──────fail────────┴──▶ Failed           │
//!                                                 │             │
//!   Idle ◀──────────────────reset─────────────────┴─────────────┘
//! ```
//!
//! [`StreamSession`] does no I/O. [`run_session`] drives it over a
//! [`ChatTransport`], suspending only on the request and on each body read.

use std::fmt;

use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

use super::accumulator::Accumulator;
use super::event::decode;
use super::frame::FrameBuffer;
use super::message::ChatMessage;
use super::transport::{ChatTransport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    Streaming,
    Completed,
    Failed,
}

/// What the owner of the conversation needs to hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The empty assistant reply, published as soon as the body is readable.
    Started(ChatMessage),
    /// New full content for the live reply (replace, don't append).
    Replaced { id: String, content: String },
    /// End of body. `id` is the reply that was being streamed.
    Completed { id: String },
    /// The turn failed. `error` is a new message to append.
    Failed { error: ChatMessage, reason: String },
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    /// A turn is already in flight.
    Busy,
    /// The requested step is not valid from the current phase.
    InvalidTransition { from: Phase, step: &'static str },
    /// Nobody is listening for updates any more.
    ChannelClosed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Busy => write!(f, "a response is already streaming"),
            SessionError::InvalidTransition { from, step } => {
                write!(f, "cannot {step} while {from:?}")
            }
            SessionError::ChannelClosed => write!(f, "update channel closed"),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Default)]
struct Counters {
    frames: usize,
    skipped: usize,
    bytes: usize,
}

pub struct StreamSession {
    phase: Phase,
    frames: FrameBuffer,
    accumulator: Accumulator,
    /// The live assistant reply; mutated in place while streaming.
    reply: Option<ChatMessage>,
    counters: Counters,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            frames: FrameBuffer::new(),
            accumulator: Accumulator::new(),
            reply: None,
            counters: Counters::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The assistant reply as it currently stands, once streaming began.
    pub fn reply(&self) -> Option<&ChatMessage> {
        self.reply.as_ref()
    }

    /// `Idle → Sending`.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Sending;
                Ok(())
            }
            Phase::Sending | Phase::Streaming => Err(SessionError::Busy),
            from => Err(SessionError::InvalidTransition { from, step: "begin" }),
        }
    }

    /// `Sending → Streaming`. Creates the placeholder reply.
    pub fn open(&mut self) -> Result<SessionUpdate, SessionError> {
        self.expect_phase(Phase::Sending, "open")?;
        let reply = ChatMessage::assistant_placeholder();
        debug!("Streaming into reply {}", reply.id);
        self.reply = Some(reply.clone());
        self.phase = Phase::Streaming;
        Ok(SessionUpdate::Started(reply))
    }

    /// Pushes one raw chunk through buffer, decoder and accumulator.
    /// Returns one `Replaced` update per event that changed the reply, in
    /// arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SessionUpdate>, SessionError> {
        self.expect_phase(Phase::Streaming, "feed")?;
        self.counters.bytes += chunk.len();

        let Some(reply) = self.reply.as_mut() else {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                step: "feed",
            });
        };

        let mut updates = Vec::new();
        for frame in self.frames.push(chunk) {
            self.counters.frames += 1;
            match decode(&frame) {
                Ok(event) => {
                    let content = self.accumulator.apply(&event);
                    if content == reply.content {
                        continue;
                    }
                    reply.content = content;
                    updates.push(SessionUpdate::Replaced {
                        id: reply.id.clone(),
                        content: reply.content.clone(),
                    });
                }
                Err(e) => {
                    self.counters.skipped += 1;
                    debug!("Skipping frame ({}): {}", e, frame);
                }
            }
        }
        Ok(updates)
    }

    /// `Streaming → Completed`. A dangling partial frame is dropped.
    pub fn finish(&mut self) -> Result<SessionUpdate, SessionError> {
        self.expect_phase(Phase::Streaming, "finish")?;

        if let Some(tail) = self.frames.finish() {
            warn!(
                "Stream ended mid-frame; discarding {} unterminated bytes",
                tail.len()
            );
        }

        let id = self
            .reply
            .as_ref()
            .map(|r| r.id.clone())
            .unwrap_or_default();
        info!(
            "Stream complete: {} frames ({} skipped), {} bytes, {} rendered chars",
            self.counters.frames,
            self.counters.skipped,
            self.counters.bytes,
            self.accumulator.rendered().chars().count()
        );
        self.phase = Phase::Completed;
        Ok(SessionUpdate::Completed { id })
    }

    /// `Sending | Streaming → Failed`. The partial reply, if any, is kept.
    pub fn fail(&mut self, error: &TransportError) -> Result<SessionUpdate, SessionError> {
        match self.phase {
            Phase::Sending | Phase::Streaming => {
                warn!("Session failed while {:?}: {}", self.phase, error);
                self.phase = Phase::Failed;
                Ok(SessionUpdate::Failed {
                    error: ChatMessage::failure(),
                    reason: error.to_string(),
                })
            }
            from => Err(SessionError::InvalidTransition { from, step: "fail" }),
        }
    }

    /// `Completed | Failed → Idle`, ready for the next turn.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Completed | Phase::Failed => {
                *self = Self::new();
                Ok(())
            }
            from => Err(SessionError::InvalidTransition { from, step: "reset" }),
        }
    }

    fn expect_phase(&self, expected: Phase, step: &'static str) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.phase,
                step,
            })
        }
    }
}

async fn publish(updates: &Sender<SessionUpdate>, update: SessionUpdate) -> Result<(), SessionError> {
    updates.send(update).await.map_err(|_| {
        warn!("Session update dropped: receiver gone");
        SessionError::ChannelClosed
    })
}

/// Runs one full turn over `transport`, publishing every update on `updates`.
/// Returns the terminal phase reached.
pub async fn run_session(
    transport: &dyn ChatTransport,
    message: &str,
    updates: Sender<SessionUpdate>,
) -> Result<Phase, SessionError> {
    let mut session = StreamSession::new();
    session.begin()?;

    let mut body = match transport.open(message).await {
        Ok(body) => body,
        Err(e) => {
            publish(&updates, session.fail(&e)?).await?;
            return Ok(session.phase());
        }
    };

    publish(&updates, session.open()?).await?;

    loop {
        match body.next_chunk().await {
            Ok(Some(chunk)) => {
                for update in session.feed(&chunk)? {
                    publish(&updates, update).await?;
                }
            }
            Ok(None) => {
                publish(&updates, session.finish()?).await?;
                break;
            }
            Err(e) => {
                publish(&updates, session.fail(&e)?).await?;
                break;
            }
        }
    }

    Ok(session.phase())
}
