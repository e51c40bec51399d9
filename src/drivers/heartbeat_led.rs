//! Debug heartbeat LED.
//!
//! Toggled from the heartbeat timer event; a steady blink means the main
//! loop is draining events.

use crate::app::ports::GpioPort;

pub struct HeartbeatLed {
    pin: i32,
    lit: bool,
}

impl HeartbeatLed {
    pub fn new(pin: i32) -> Self {
        Self { pin, lit: false }
    }

    pub fn toggle(&mut self, gpio: &mut impl GpioPort) {
        self.lit = !self.lit;
        gpio.write_level(self.pin, self.lit);
    }

    pub fn off(&mut self, gpio: &mut impl GpioPort) {
        self.lit = false;
        gpio.write_level(self.pin, false);
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
