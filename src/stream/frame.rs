//! # Frame Buffer
//!
//! Turns the raw byte chunks of a response body into newline-terminated
//! frames. Whatever follows the last `\n` of a read stays in `pending` until a
//! later read completes it.
//!
//! UTF-8 is decoded incrementally: a multi-byte character cut in half by a
//! read boundary is held back in `carry` and finished by the next read, so
//! the frames produced never depend on where the transport chose to split.

const DELIMITER: char = '\n';

#[derive(Debug, Default)]
pub struct FrameBuffer {
    /// Decoded text not yet terminated by a delimiter.
    pending: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    carry: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw chunk and returns every frame it completed, in order.
    /// Blank frames are dropped here.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode_into_pending(chunk);

        let Some(last_delim) = self.pending.rfind(DELIMITER) else {
            return Vec::new();
        };

        let tail = self.pending.split_off(last_delim + DELIMITER.len_utf8());
        let complete = std::mem::replace(&mut self.pending, tail);

        complete
            .split(DELIMITER)
            .filter(|frame| !frame.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The partial frame currently held back (empty if none).
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Ends the stream, handing back any unterminated tail.
    ///
    /// Undecodable carry bytes are flushed as U+FFFD first so that the
    /// returned tail accounts for every byte received.
    pub fn finish(&mut self) -> Option<String> {
        if !self.carry.is_empty() {
            self.pending.push(char::REPLACEMENT_CHARACTER);
            self.carry.clear();
        }
        let tail = std::mem::take(&mut self.pending);
        if tail.trim().is_empty() { None } else { Some(tail) }
    }

    fn decode_into_pending(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.pending.push_str(valid);
                    return;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // `valid_up_to` marks a prefix that always decodes
                    self.pending
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            self.pending.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for the next read.
                            self.carry = after.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }
}
