//! Hardware adapter: bridges real GPIO to the domain's [`GpioPort`].
//!
//! This is the only path by which the pump bank, the carriage and the
//! heartbeat LED touch pins.  On non-espidf targets the underlying
//! `hw_init` calls are cfg-gated simulation stubs.

use crate::app::ports::GpioPort;
use crate::drivers::hw_init;

/// Concrete adapter over the pins configured by `hw_init`.
#[derive(Debug, Default)]
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        Self
    }
}

// ── GpioPort implementation ───────────────────────────────────

impl GpioPort for EspGpio {
    fn read_level(&mut self, pin: i32) -> bool {
        hw_init::gpio_read(pin)
    }

    fn write_level(&mut self, pin: i32, high: bool) {
        hw_init::gpio_write(pin, high);
    }
}
