//! Outbound application events.
//!
//! The [`DispenserService`](super::service::DispenserService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log to the debug serial,
//! record them in tests, etc.

use crate::app::status::StatusCode;
use crate::fsm::PumpState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has brought the pump bank up.
    Started { pumps: usize, positions: usize },

    /// A command frame was answered.
    CommandHandled { command: &'static str, code: StatusCode },

    /// A PUMP order was added to the queue.
    OrderQueued { depth: usize, capacity: usize },

    /// A PUMP order was refused because the queue is full.
    OrderRejected { depth: usize, capacity: usize },

    /// The scheduler handed an order to the pump bank.
    OrderDispatched { position: usize, active_pumps: usize },

    /// The pump bank moved between states.
    PumpStateChanged { from: PumpState, to: PumpState },

    /// The carriage finished its calibration sweep.
    CarriageCalibrated { max_steps: u32 },

    /// The carriage stopped after a move.
    CarriageArrived { target: u32, travelled: u32 },
}
