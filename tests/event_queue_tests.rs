//! Concurrency tests for the global ISR event queue.
//!
//! Lives in its own test binary: the queue is a process-wide static and
//! nothing else here may push into it.

#![cfg(not(target_os = "espidf"))]

use std::thread;
use std::time::{Duration, Instant};

use barvis::events::{self, Event};

const PER_PRODUCER: usize = 50_000;

fn push_all(event: Event, deadline: Instant) {
    for _ in 0..PER_PRODUCER {
        while !events::push_event(event) {
            if Instant::now() > deadline {
                return;
            }
            thread::yield_now();
        }
    }
}

/// The presence ISR and the timer task push at the same time; every
/// accepted event must reach the main loop exactly once.
#[test]
fn concurrent_producers_lose_no_events() {
    let mut presence = 0usize;
    let mut ticks = 0usize;
    let deadline = Instant::now() + Duration::from_secs(20);

    thread::scope(|s| {
        s.spawn(move || push_all(Event::PresenceChanged, deadline));
        s.spawn(move || push_all(Event::PumpTick, deadline));

        while presence + ticks < 2 * PER_PRODUCER && Instant::now() < deadline {
            match events::pop_event() {
                Some(Event::PresenceChanged) => presence += 1,
                Some(Event::PumpTick) => ticks += 1,
                Some(other) => panic!("unexpected {other:?}"),
                None => thread::yield_now(),
            }
        }
    });

    assert_eq!(presence, PER_PRODUCER);
    assert_eq!(ticks, PER_PRODUCER);
    assert_eq!(events::pop_event(), None);
    assert!(events::queue_is_empty());
}
