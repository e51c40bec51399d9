//! Mock hardware adapters for integration tests.
//!
//! [`MockBoard`] behaves like the real board behind the GPIO port: a
//! 74HC595 chain on the pump pins, a stepper rail between two limit
//! switches, and a presence input.  [`MockRadio`] answers AT commands
//! from a script and [`RecordingSink`] keeps every emitted event.

use std::collections::VecDeque;

use barvis::app::events::AppEvent;
use barvis::app::ports::{EventSink, GpioPort};
use barvis::link::transport::Transport;
use barvis::pins;
use embedded_hal::delay::DelayNs;

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    /// Bits clocked in but not yet latched; index 0 is the last bit in.
    shift: Vec<bool>,
    /// Latched register outputs.
    latched: Vec<bool>,
    clock_high: bool,
    latch_high: bool,
    /// Output-enable line (active low).
    oe_high: bool,
    data_high: bool,
    /// Count of latch rising edges.
    pub latches: usize,

    rail_length: i32,
    pub head: i32,
    dir_end: bool,
    step_high: bool,
    pub steps: u32,

    pub presence: bool,
    pub led_high: bool,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new(pump_count: usize) -> Self {
        Self {
            shift: vec![false; pump_count],
            latched: vec![false; pump_count],
            clock_high: false,
            latch_high: false,
            oe_high: true,
            data_high: false,
            latches: 0,
            rail_length: 400,
            head: 0,
            dir_end: false,
            step_high: false,
            steps: 0,
            presence: true,
            led_high: false,
        }
    }

    /// Put the carriage on a rail of `length` steps at `head`.
    pub fn with_rail(mut self, length: i32, head: i32) -> Self {
        self.rail_length = length;
        self.head = head;
        self
    }

    /// Pump `id` is physically running.
    pub fn pump_on(&self, id: usize) -> bool {
        !self.oe_high && self.latched.get(id).copied().unwrap_or(false)
    }

    /// Ids of all running pumps.
    pub fn running(&self) -> Vec<usize> {
        (0..self.latched.len()).filter(|&i| self.pump_on(i)).collect()
    }

    pub fn outputs_enabled(&self) -> bool {
        !self.oe_high
    }
}

impl GpioPort for MockBoard {
    fn read_level(&mut self, pin: i32) -> bool {
        match pin {
            pins::HOME_SWITCH_GPIO => self.head <= 0,
            pins::END_SWITCH_GPIO => self.head >= self.rail_length,
            pins::PRESENCE_GPIO => self.presence,
            _ => false,
        }
    }

    fn write_level(&mut self, pin: i32, high: bool) {
        match pin {
            pins::PUMP_DATA_GPIO => self.data_high = high,
            pins::PUMP_CLOCK_GPIO => {
                if high && !self.clock_high {
                    self.shift.insert(0, self.data_high);
                    self.shift.pop();
                }
                self.clock_high = high;
            }
            pins::PUMP_LATCH_GPIO => {
                if high && !self.latch_high {
                    self.latched.clone_from(&self.shift);
                    self.latches += 1;
                }
                self.latch_high = high;
            }
            pins::PUMP_OE_GPIO => self.oe_high = high,
            pins::PUMP_RESET_GPIO => {
                if !high {
                    self.shift.iter_mut().for_each(|b| *b = false);
                }
            }
            pins::CARRIAGE_DIR_GPIO => self.dir_end = high,
            pins::CARRIAGE_STEP_GPIO => {
                if high && !self.step_high {
                    let next = self.head + if self.dir_end { 1 } else { -1 };
                    self.head = next.clamp(0, self.rail_length);
                    self.steps += 1;
                }
                self.step_high = high;
            }
            pins::DEBUG_LED_GPIO => self.led_high = high,
            _ => {}
        }
    }
}

// ── MockRadio ─────────────────────────────────────────────────

/// Serial bridge that answers each write with the next scripted reply.
#[derive(Default)]
pub struct MockRadio {
    replies: VecDeque<Vec<u8>>,
    rx: VecDeque<u8>,
    pub sent: Vec<u8>,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_with(mut self, reply: &[u8]) -> Self {
        self.replies.push_back(reply.to_vec());
        self
    }

    pub fn sent_text(&self) -> String {
        String::from_utf8_lossy(&self.sent).into_owned()
    }
}

impl Transport for MockRadio {
    type Error = ();

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.sent.extend_from_slice(data);
        if let Some(reply) = self.replies.pop_front() {
            self.rx.extend(reply);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.is_empty()
    }

    fn read_available(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, ()> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── NoDelay ───────────────────────────────────────────────────

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
