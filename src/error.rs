//! Unified error types for the Barvis firmware.
//!
//! Every subsystem owns a small `Copy` error enum and converts into the
//! top-level [`Error`].  Protocol-level failures are not errors in this
//! sense: the command interpreter folds them into a
//! [`Status`](crate::app::status::Status) value for the remote client.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The JSON tokenizer rejected a buffer.
    Json(JsonError),
    /// The pump bank refused an operation.
    Pump(PumpError),
    /// The order queue refused an operation.
    Order(OrderError),
    /// The dispensing carriage refused or aborted a move.
    Carriage(CarriageError),
    /// A transport link failed.
    Link(LinkError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "json: {e}"),
            Self::Pump(e) => write!(f, "pump: {e}"),
            Self::Order(e) => write!(f, "order: {e}"),
            Self::Carriage(e) => write!(f, "carriage: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// JSON tokenizer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonError {
    /// Unexpected byte, mismatched bracket or misplaced value.
    Invalid,
    /// The buffer ended inside a string, primitive or container.
    Incomplete,
    /// The token arena is too small for this buffer.
    OutOfTokens,
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "invalid character or structure"),
            Self::Incomplete => write!(f, "incomplete input"),
            Self::OutOfTokens => write!(f, "not enough tokens"),
        }
    }
}

impl From<JsonError> for Error {
    fn from(e: JsonError) -> Self {
        Self::Json(e)
    }
}

// ---------------------------------------------------------------------------
// Pump bank errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpError {
    /// Pumps are already executing an order.
    Busy,
    /// The bank is paused because the vessel was removed.
    Paused,
}

impl fmt::Display for PumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "pumps busy"),
            Self::Paused => write!(f, "pumps paused"),
        }
    }
}

impl From<PumpError> for Error {
    fn from(e: PumpError) -> Self {
        Self::Pump(e)
    }
}

// ---------------------------------------------------------------------------
// Order queue errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderError {
    QueueFull,
    QueueEmpty,
    /// The scheduler lock is held by another context.
    Locked,
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "order queue full"),
            Self::QueueEmpty => write!(f, "order queue empty"),
            Self::Locked => write!(f, "order queue locked"),
        }
    }
}

impl From<OrderError> for Error {
    fn from(e: OrderError) -> Self {
        Self::Order(e)
    }
}

// ---------------------------------------------------------------------------
// Carriage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarriageError {
    /// The calibration sweep has not completed.
    NotCalibrated,
    /// Calibration runs exactly once per boot.
    AlreadyCalibrated,
    /// A move is already in progress.
    InMotion,
    /// A limit switch was not reached within the travel limit.
    LimitNotFound,
}

impl fmt::Display for CarriageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCalibrated => write!(f, "not calibrated"),
            Self::AlreadyCalibrated => write!(f, "already calibrated"),
            Self::InMotion => write!(f, "already in motion"),
            Self::LimitNotFound => write!(f, "limit switch not found"),
        }
    }
}

impl From<CarriageError> for Error {
    fn from(e: CarriageError) -> Self {
        Self::Carriage(e)
    }
}

// ---------------------------------------------------------------------------
// Transport link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    WriteFailed,
    ReadFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "write failed"),
            Self::ReadFailed => write!(f, "read failed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_subsystem() {
        let e: Error = JsonError::Incomplete.into();
        assert_eq!(e.to_string(), "json: incomplete input");
        let e: Error = OrderError::QueueFull.into();
        assert_eq!(e.to_string(), "order: order queue full");
        assert_eq!(Error::Config("pump_count").to_string(), "config: pump_count");
    }

    #[test]
    fn conversions_preserve_variant() {
        assert_eq!(Error::from(PumpError::Paused), Error::Pump(PumpError::Paused));
        assert_eq!(
            Error::from(CarriageError::InMotion),
            Error::Carriage(CarriageError::InMotion)
        );
        assert_eq!(Error::from(LinkError::ReadFailed), Error::Link(LinkError::ReadFailed));
    }
}
