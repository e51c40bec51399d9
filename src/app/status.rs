//! Command status values and the JSON response envelope.
//!
//! Every command resolves to a [`Status`]: a numeric [`StatusCode`] plus a
//! short message, rendered as `{"status":<code>,"message":"<text>"}`.

use core::fmt::{self, Write};

use serde::Serialize;

use crate::error::PumpError;

/// Longest message carried in a response (bytes).
pub const MAX_MESSAGE_LEN: usize = 100;

pub type StatusMessage = heapless::String<MAX_MESSAGE_LEN>;

/// Status code families reported to the remote client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    Success = 0x0000,
    UnknownError = 0xFF00,

    JsonInvalidObject = 0xC001,
    JsonInvalidValueType = 0xC002,
    JsonMissingAttribute = 0xC003,

    PumpBusy = 0xA001,
    PumpPaused = 0xA002,
    PumpInvalidId = 0xA003,
    PumpInvalidDuration = 0xA004,

    OrderQueueFull = 0x9001,
}

impl StatusCode {
    pub const fn code(self) -> u16 {
        self as u16
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<PumpError> for StatusCode {
    fn from(e: PumpError) -> Self {
        match e {
            PumpError::Busy => Self::PumpBusy,
            PumpError::Paused => Self::PumpPaused,
        }
    }
}

/// Outcome of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: StatusCode,
    message: StatusMessage,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            code: StatusCode::Success,
            message: StatusMessage::new(),
        }
    }
}

impl Status {
    /// Build a status, truncating `message` to [`MAX_MESSAGE_LEN`] bytes.
    pub fn new(code: StatusCode, message: &str) -> Self {
        let mut status = Self { code, message: StatusMessage::new() };
        status.append(message);
        status
    }

    /// Build a status from format arguments, truncating like [`Status::new`].
    pub fn with_args(code: StatusCode, args: fmt::Arguments<'_>) -> Self {
        let mut status = Self { code, message: StatusMessage::new() };
        let _ = Truncating::new(&mut status.message).write_fmt(args);
        status
    }

    pub fn success(message: &str) -> Self {
        Self::new(StatusCode::Success, message)
    }

    /// Append text, dropping whatever no longer fits.
    pub fn append(&mut self, text: &str) {
        let _ = Truncating::new(&mut self.message).write_str(text);
    }

    /// Append formatted text, truncating like [`Status::append`].
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) {
        let _ = Truncating::new(&mut self.message).write_fmt(args);
    }

    /// Append raw bytes, replacing anything that is not valid UTF-8.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        let mut w = Truncating::new(&mut self.message);
        for chunk in bytes.utf8_chunks() {
            let _ = w.write_str(chunk.valid());
            if !chunk.invalid().is_empty() {
                let _ = w.write_char(char::REPLACEMENT_CHARACTER);
            }
        }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Render the response envelope.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Envelope {
            status: self.code.code(),
            message: &self.message,
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X} {}", self.code.code(), self.message)
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    status: u16,
    message: &'a str,
}

// ── Truncating writer ─────────────────────────────────────────

/// `fmt::Write` into a bounded string that silently stops when full,
/// never splitting a character.
struct Truncating<'a> {
    out: &'a mut StatusMessage,
    full: bool,
}

impl<'a> Truncating<'a> {
    fn new(out: &'a mut StatusMessage) -> Self {
        Self { out, full: false }
    }
}

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.full {
                break;
            }
            if self.out.push(c).is_err() {
                self.full = true;
            }
        }
        Ok(())
    }
}
