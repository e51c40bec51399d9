//! Busy-wait delay for the carriage stepper.
//!
//! - **`target_os = "espidf"`**: `esp_idf_hal::delay::Ets` (ROM
//!   `ets_delay_us`), precise at the 250 µs step pitch.
//! - **`not(target_os = "espidf")`**: `std::thread::sleep`.

use embedded_hal::delay::DelayNs;

#[derive(Debug, Default)]
pub struct BoardDelay;

impl BoardDelay {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "espidf")]
impl DelayNs for BoardDelay {
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets.delay_ns(ns);
    }
}

#[cfg(not(target_os = "espidf"))]
impl DelayNs for BoardDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}
