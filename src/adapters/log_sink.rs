//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to the debug UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { pumps, positions } => {
                info!("START | pumps={} positions={}", pumps, positions);
            }
            AppEvent::CommandHandled { command, code } => {
                info!("CMD   | {} -> 0x{:04X}", command, code.code());
            }
            AppEvent::OrderQueued { depth, capacity } => {
                info!("ORDER | queued depth={}/{}", depth, capacity);
            }
            AppEvent::OrderRejected { depth, capacity } => {
                warn!("ORDER | rejected, queue full {}/{}", depth, capacity);
            }
            AppEvent::OrderDispatched { position, active_pumps } => {
                info!("ORDER | dispatched position={} pumps={}", position, active_pumps);
            }
            AppEvent::PumpStateChanged { from, to } => {
                info!("PUMPS | {} -> {}", from.name(), to.name());
            }
            AppEvent::CarriageCalibrated { max_steps } => {
                info!("RAIL  | calibrated max_steps={}", max_steps);
            }
            AppEvent::CarriageArrived { target, travelled } => {
                info!("RAIL  | arrived target={} travelled={}", target, travelled);
            }
        }
    }
}
