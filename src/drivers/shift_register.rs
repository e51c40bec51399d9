//! Serial-in / parallel-out shift-register chain (74HC595 style).
//!
//! Any device that can describe its outputs as a run of bits implements
//! [`BitSource`]; [`ShiftRegister::shift_out`] clocks those bits out
//! highest index first and latches them in one go:
//!
//! ```text
//!   latch ▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▔▔
//!   clock ▔▔▁▁▔▔▁▁▔▔ ... ▁▁▔▔
//!   data    b[n-1] b[n-2] ... b[0]
//! ```
//!
//! Output-enable and master-reset are both active LOW.
//!
//! ## Reentrancy
//!
//! `shift_out` is reachable from the pump tick and from command handling.
//! A single atomic flag guards it: a call that finds a transfer in flight
//! is dropped and returns `None`.  The next periodic tick re-sends the
//! full pattern.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::app::ports::GpioPort;
use crate::pins;

/// A run of output bits to be shifted into the register chain.
pub trait BitSource {
    /// Level of output `index` (`true` = on).
    fn bit_at(&self, index: usize) -> bool;

    /// Number of outputs in the chain.
    fn bit_count(&self) -> usize;
}

/// GPIO numbers of the five control lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftRegisterPins {
    pub data: i32,
    pub clock: i32,
    pub latch: i32,
    pub output_enable: i32,
    pub reset: i32,
}

impl ShiftRegisterPins {
    /// The pump bank wiring from [`pins`].
    pub const PUMP_BANK: Self = Self {
        data: pins::PUMP_DATA_GPIO,
        clock: pins::PUMP_CLOCK_GPIO,
        latch: pins::PUMP_LATCH_GPIO,
        output_enable: pins::PUMP_OE_GPIO,
        reset: pins::PUMP_RESET_GPIO,
    };
}

pub struct ShiftRegister {
    pins: ShiftRegisterPins,
    busy: AtomicBool,
}

/// Releases the busy flag when the transfer scope ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ShiftRegister {
    pub fn new(pins: ShiftRegisterPins) -> Self {
        Self {
            pins,
            busy: AtomicBool::new(false),
        }
    }

    pub fn pins(&self) -> ShiftRegisterPins {
        self.pins
    }

    /// A transfer is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    /// Clock every bit of `source` into the chain and latch it.
    ///
    /// Returns the number of high bits sent, or `None` when another
    /// transfer already holds the register.
    pub fn shift_out(&self, gpio: &mut impl GpioPort, source: &impl BitSource) -> Option<usize> {
        let _guard = self.try_acquire()?;

        let mut high = 0;
        gpio.write_level(self.pins.latch, false);
        for i in (0..source.bit_count()).rev() {
            let bit = source.bit_at(i);
            gpio.write_level(self.pins.clock, false);
            gpio.write_level(self.pins.data, bit);
            gpio.write_level(self.pins.clock, true);
            high += usize::from(bit);
        }
        gpio.write_level(self.pins.latch, true);

        Some(high)
    }

    /// Clear the chain and latch the empty pattern to the outputs.
    pub fn master_reset(&self, gpio: &mut impl GpioPort) {
        gpio.write_level(self.pins.reset, false);
        gpio.write_level(self.pins.reset, true);
        gpio.write_level(self.pins.latch, false);
        gpio.write_level(self.pins.latch, true);
    }

    pub fn enable_output(&self, gpio: &mut impl GpioPort) {
        gpio.write_level(self.pins.output_enable, false);
    }

    pub fn disable_output(&self, gpio: &mut impl GpioPort) {
        gpio.write_level(self.pins.output_enable, true);
    }

    /// Hold the busy flag as if a transfer were in flight.
    #[cfg(test)]
    pub(crate) fn force_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }
}
