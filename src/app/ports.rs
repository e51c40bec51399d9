//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DispenserService (domain)
//! ```
//!
//! Driven adapters (GPIO, event sinks, transports) implement these traits.
//! The [`DispenserService`](super::service::DispenserService) consumes them
//! via generics injected at each call site, so the domain core never
//! touches hardware directly.

use crate::error::PumpError;
use crate::orders::Order;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain ↔ digital pins)
// ───────────────────────────────────────────────────────────────

/// Logical-level access to already-configured digital pins.
pub trait GpioPort {
    /// Read the logical level of an input pin.
    fn read_level(&mut self, pin: i32) -> bool;

    /// Drive an output pin high or low.
    fn write_level(&mut self, pin: i32, high: bool);

    /// Drive `pin` high then low.
    fn pulse(&mut self, pin: i32) {
        self.write_level(pin, true);
        self.write_level(pin, false);
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Order executor (decouples the scheduler from the pump bank)
// ───────────────────────────────────────────────────────────────

/// What the [`OrderScheduler`](crate::scheduler::OrderScheduler) dispatches
/// orders into.  The service implements it over the pump bank and the GPIO
/// port for the duration of one tick.
pub trait OrderExecutor {
    /// `true` when a new order may start.
    fn is_idle(&self) -> bool;

    /// Load an order and switch its pumps on.  Returns the active pump count.
    fn run_order(&mut self, order: &Order) -> Result<usize, PumpError>;
}

// ───────────────────────────────────────────────────────────────
// Carriage listener
// ───────────────────────────────────────────────────────────────

/// Notified when a [`Carriage`](crate::drivers::carriage::Carriage) move completes.
pub trait CarriageListener {
    /// `travelled` is the distance actually covered, which is shorter than
    /// requested when a limit switch stopped the move.
    fn on_position_reached(&mut self, target: u32, travelled: u32);
}

/// Listener that ignores every notification.
pub struct NoListener;

impl CarriageListener for NoListener {
    fn on_position_reached(&mut self, _target: u32, _travelled: u32) {}
}
