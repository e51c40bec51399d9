//! Vessel presence sensor (IR break-beam on the pump bank).
//!
//! The edge ISR samples the pin, stores the level here and queues
//! [`Event::PresenceChanged`](crate::events::Event::PresenceChanged).
//! The main loop reads the stored level when it handles the event, so a
//! burst of edges collapses to the latest level.
//!
//! HIGH = vessel present.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::events::{push_event, Event};

static PRESENT: AtomicBool = AtomicBool::new(true);

/// Called from the GPIO ISR with the sampled level.
pub fn on_edge_from_isr(level_high: bool) {
    PRESENT.store(level_high, Ordering::Release);
    push_event(Event::PresenceChanged);
}

/// Seed the stored level before interrupts are enabled.
pub fn seed(level_high: bool) {
    PRESENT.store(level_high, Ordering::Release);
}

/// Last level seen by the ISR.
pub fn is_present() -> bool {
    PRESENT.load(Ordering::Acquire)
}

/// Host-side stand-in for an edge: store `present` and queue the event.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_present(present: bool) {
    on_edge_from_isr(present);
}
