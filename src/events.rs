//! Interrupt-driven event system.
//!
//! Events are produced by:
//! - GPIO ISR (presence sensor edge)
//! - Timer callbacks (pump countdown, order scheduler, heartbeat LED)
//!
//! Events are consumed by the main loop, which handles them one at a
//! time between transport polls.  Nothing in interrupt context touches
//! the pump bank or the queue directly.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Presence ISR │────▶│              │     │              │
//! │ 1 Hz timer   │────▶│  Event Queue │────▶│  Main Loop   │
//! │ 250 ms timer │────▶│  (MPMC, CAS) │     │  (consumer)  │
//! │ Heartbeat    │────▶│              │     │              │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicUsize, Ordering};

use heapless::mpmc::Q32;

/// Maximum number of pending events.
const EVENT_QUEUE_CAP: usize = 32;

/// System event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    // ── Sensor ────────────────────────────────────────────
    /// Presence sensor changed level; the new level is in
    /// [`presence_sensor::is_present`](crate::drivers::presence_sensor::is_present).
    PresenceChanged = 0,

    // ── Timers ────────────────────────────────────────────
    /// Pump countdown tick (1 Hz).
    PumpTick        = 10,
    /// Order scheduler tick (250 ms).
    OrderTick       = 11,
    /// Debug LED toggle.
    HeartbeatTick   = 12,
}

// ── Lock-free MPMC queue ──────────────────────────────────────
//
// Producers: the presence GPIO ISR and the esp_timer task, which can
// preempt each other.  Consumer: the main loop.  Slots are claimed with
// a CAS, so concurrent pushes never share a slot.

static EVENT_QUEUE: Q32<Event> = Q32::new();

// Raised before an enqueue and lowered after a dequeue, so it never
// undercounts what the consumer can see.
static PENDING: AtomicUsize = AtomicUsize::new(0);

/// Push an event into the queue.
/// Safe to call from ISR context and from several producers at once.
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    PENDING.fetch_add(1, Ordering::AcqRel);
    if EVENT_QUEUE.enqueue(event).is_ok() {
        true
    } else {
        PENDING.fetch_sub(1, Ordering::AcqRel);
        false
    }
}

/// Pop the next event from the queue.
/// Called from the main loop.
/// Returns `None` if the queue is empty.
pub fn pop_event() -> Option<Event> {
    let event = EVENT_QUEUE.dequeue()?;
    PENDING.fetch_sub(1, Ordering::AcqRel);
    Some(event)
}

/// Drain all pending events into a callback.
/// Processes events in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

/// Check if the event queue is empty.
pub fn queue_is_empty() -> bool {
    queue_len() == 0
}

/// Number of pending events, counting pushes still in flight.
pub fn queue_len() -> usize {
    PENDING.load(Ordering::Acquire)
}
