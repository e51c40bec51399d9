//! Inbound commands to the dispenser service.
//!
//! A command frame is a JSON object whose `"type"` selects the action:
//!
//! ```text
//!   {"type":"PING"}
//!   {"type":"PUMP","run_pumps":[{"id":1,"for":40},{"id":2,"for":60}]}
//!   {"type":"CLEAR"} | {"type":"PAUSE"} | {"type":"RESUME"} | {"type":"SET"}
//!   {"type":"AT","at_cmd":"AT+VERS?"}
//! ```
//!
//! [`parse_command`] performs every structural and range check up front
//! and yields a [`Command`] or the [`Status`] describing the first
//! problem.  Nothing here touches the queue or the pump bank, so a
//! rejected frame cannot leave a half-applied change behind.

use crate::app::status::{Status, StatusCode};
use crate::json::{JsonDocument, TokenKind};
use crate::orders::Order;

const KEY_TYPE: &str = "type";
const KEY_RUN_PUMPS: &str = "run_pumps";
const KEY_ID: &str = "id";
const KEY_FOR: &str = "for";
const KEY_AT_CMD: &str = "at_cmd";

/// A fully validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Ping,
    /// Run pumps; one duration per pump, zero for pumps not mentioned.
    Pump(Order),
    Clear,
    Pause,
    Resume,
    /// Reserved.
    Set,
    /// Raw bytes to forward to the radio bridge.
    At(&'a [u8]),
}

impl Command<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::Pump(_) => "PUMP",
            Self::Clear => "CLEAR",
            Self::Pause => "PAUSE",
            Self::Resume => "RESUME",
            Self::Set => "SET",
            Self::At(_) => "AT",
        }
    }
}

/// Ranges a PUMP instruction is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpLimits {
    pub pump_count: usize,
    pub max_duration_secs: u16,
}

impl PumpLimits {
    /// `id` as an index, if it names a pump on the bank.
    pub fn valid_id(&self, id: i32) -> Option<usize> {
        usize::try_from(id).ok().filter(|&i| i < self.pump_count)
    }

    /// `secs` as a run time, if it is within `0..=max_duration_secs`.
    pub fn valid_duration(&self, secs: i32) -> Option<u16> {
        u16::try_from(secs).ok().filter(|&s| s <= self.max_duration_secs)
    }
}

/// Interpret a parsed frame.  Token 0 is the root.
pub fn parse_command<'a>(doc: &JsonDocument<'a>, limits: PumpLimits) -> Result<Command<'a>, Status> {
    const ROOT: usize = 0;

    if !doc.is_kind(ROOT, TokenKind::Object) {
        return Err(invalid_object());
    }

    let kind = doc.value_of(KEY_TYPE, ROOT).ok_or_else(|| missing(KEY_TYPE))?;
    if !is_scalar(doc, kind) {
        return Err(wrong_type(KEY_TYPE));
    }
    if doc.text(kind).is_empty() {
        return Err(missing(KEY_TYPE));
    }

    match doc.text(kind) {
        b"PING" => Ok(Command::Ping),
        b"PUMP" => parse_pump(doc, ROOT, limits).map(Command::Pump),
        b"CLEAR" => Ok(Command::Clear),
        b"PAUSE" => Ok(Command::Pause),
        b"RESUME" => Ok(Command::Resume),
        b"SET" => Ok(Command::Set),
        b"AT" => {
            let cmd = doc.value_of(KEY_AT_CMD, ROOT).ok_or_else(|| missing(KEY_AT_CMD))?;
            if !is_scalar(doc, cmd) {
                return Err(wrong_type(KEY_AT_CMD));
            }
            if doc.text(cmd).is_empty() {
                return Err(missing(KEY_AT_CMD));
            }
            Ok(Command::At(doc.text(cmd)))
        }
        other => {
            let mut status = Status::new(StatusCode::UnknownError, "Unknown command type: ");
            status.append_bytes(other);
            Err(status)
        }
    }
}

fn parse_pump(doc: &JsonDocument<'_>, root: usize, limits: PumpLimits) -> Result<Order, Status> {
    let list = doc.value_of(KEY_RUN_PUMPS, root).ok_or_else(|| missing(KEY_RUN_PUMPS))?;
    if !doc.is_kind(list, TokenKind::Array) {
        return Err(wrong_type(KEY_RUN_PUMPS));
    }

    let mut order = Order::new(limits.pump_count);
    for (index, element) in doc.children(list).enumerate() {
        if !doc.is_kind(element, TokenKind::Object) {
            return Err(wrong_type(KEY_RUN_PUMPS));
        }
        let id = integer_field(doc, element, KEY_ID)?;
        let secs = integer_field(doc, element, KEY_FOR)?;

        let Some(pump) = limits.valid_id(id) else {
            return Err(Status::with_args(
                StatusCode::PumpInvalidId,
                format_args!("Invalid ID: {} provided for Instruction: {}", id, index),
            ));
        };
        let Some(duration) = limits.valid_duration(secs) else {
            return Err(Status::with_args(
                StatusCode::PumpInvalidDuration,
                format_args!("Invalid Duration: {} provided for Instruction: {}", secs, index),
            ));
        };
        // Repeated ids: the last instruction wins.
        order.set(pump, duration);
    }
    Ok(order)
}

fn integer_field(doc: &JsonDocument<'_>, object: usize, key: &str) -> Result<i32, Status> {
    let value = doc.value_of(key, object).ok_or_else(|| missing(key))?;
    if !doc.is_number(value) {
        return Err(wrong_type(key));
    }
    Ok(doc.as_integer(value))
}

fn is_scalar(doc: &JsonDocument<'_>, index: usize) -> bool {
    matches!(doc.kind(index), Some(TokenKind::String | TokenKind::Primitive))
}

pub(crate) fn invalid_object() -> Status {
    Status::new(StatusCode::JsonInvalidObject, "Invalid JSON, structure is not a JSON Object")
}

fn missing(name: &str) -> Status {
    Status::with_args(StatusCode::JsonMissingAttribute, format_args!("Missing attribute: {}", name))
}

fn wrong_type(name: &str) -> Status {
    Status::with_args(StatusCode::JsonInvalidValueType, format_args!("Invalid value type for: {}", name))
}
