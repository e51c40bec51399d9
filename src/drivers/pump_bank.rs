//! Pump bank: per-pump countdowns multiplexed onto a shift-register chain.
//!
//! ```text
//!   Order ──▶ run_pumps_for ──▶ running_secs[] ──▶ ShiftRegister ──▶ pumps
//!                                   ▲
//!                  1 Hz tick ───────┘ (decrement while Executing)
//! ```
//!
//! State changes go through [`PumpFsm`]; each mutator first checks that the
//! bank is in the state it expects, so the tick, the presence sensor and
//! the command path can never push the machine along an illegal edge.

use log::{debug, info, warn};

use crate::app::commands::PumpLimits;
use crate::app::ports::GpioPort;
use crate::drivers::shift_register::{BitSource, ShiftRegister};
use crate::error::PumpError;
use crate::fsm::{PumpEvent, PumpFsm, PumpState};
use crate::orders::{Order, MAX_PUMPS};

pub struct PumpBank {
    register: ShiftRegister,
    running_secs: heapless::Vec<u16, MAX_PUMPS>,
    fsm: PumpFsm,
    max_duration_secs: u16,
}

impl BitSource for PumpBank {
    fn bit_at(&self, index: usize) -> bool {
        self.running_secs.get(index).is_some_and(|&s| s > 0)
    }

    fn bit_count(&self) -> usize {
        self.running_secs.len()
    }
}

impl PumpBank {
    /// A bank of `pump_count` pumps (capped at [`MAX_PUMPS`]), all stopped.
    pub fn new(pump_count: usize, max_duration_secs: u16, register: ShiftRegister) -> Self {
        let mut running_secs = heapless::Vec::new();
        running_secs.resize(pump_count.min(MAX_PUMPS), 0).ok();
        Self {
            register,
            running_secs,
            fsm: PumpFsm::new(),
            max_duration_secs,
        }
    }

    /// Bring the hardware to a known state: register cleared, outputs enabled.
    pub fn start(&mut self, gpio: &mut impl GpioPort) {
        self.reset_hardware(gpio);
        info!("PumpBank: {} pumps ready", self.pump_count());
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> PumpState {
        self.fsm.state()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == PumpState::Idle
    }

    pub fn pump_count(&self) -> usize {
        self.running_secs.len()
    }

    /// Remaining run time of every pump.
    pub fn running_secs(&self) -> &[u16] {
        &self.running_secs
    }

    /// Pumps with time left on their countdown.
    pub fn active_count(&self) -> usize {
        self.running_secs.iter().filter(|&&s| s > 0).count()
    }

    /// Id and duration ranges that commands for this bank are checked against.
    pub fn limits(&self) -> PumpLimits {
        PumpLimits {
            pump_count: self.pump_count(),
            max_duration_secs: self.max_duration_secs,
        }
    }

    pub fn register(&self) -> &ShiftRegister {
        &self.register
    }

    // ── Mutators ──────────────────────────────────────────────

    /// Load `order` and switch its pumps on.  Only accepted while Idle.
    ///
    /// Returns the number of pumps now running.  An all-zero order is
    /// accepted and leaves the bank Idle.
    pub fn run_pumps_for(&mut self, order: &Order, gpio: &mut impl GpioPort) -> Result<usize, PumpError> {
        match self.state() {
            PumpState::Executing => return Err(PumpError::Busy),
            PumpState::Paused => return Err(PumpError::Paused),
            PumpState::Idle => {}
        }

        for (i, slot) in self.running_secs.iter_mut().enumerate() {
            *slot = order.duration(i);
        }
        if self.active_count() > 0 {
            self.fsm.fire(PumpEvent::Run);
        }
        self.serialize(gpio);
        Ok(self.active_count())
    }

    /// 1 Hz countdown.  Returns the new state when the bank drains.
    pub fn tick(&mut self, gpio: &mut impl GpioPort) -> Option<PumpState> {
        if self.state() != PumpState::Executing {
            return None;
        }
        for secs in self.running_secs.iter_mut().filter(|s| **s > 0) {
            *secs -= 1;
        }
        match self.serialize(gpio) {
            Some(0) => self.fsm.fire(PumpEvent::Drained).map(|(_, to)| to),
            Some(_) => None,
            None => {
                debug!("PumpBank: tick transfer dropped, register busy");
                None
            }
        }
    }

    /// Vessel removed: freeze the outputs, keep the countdowns.
    ///
    /// Returns `false` (no-op) unless Executing.
    pub fn pause(&mut self, gpio: &mut impl GpioPort) -> bool {
        if self.state() != PumpState::Executing {
            return false;
        }
        self.register.disable_output(gpio);
        self.fsm.fire(PumpEvent::BankOpened).is_some()
    }

    /// Vessel back in place: re-enable the outputs and carry on counting.
    ///
    /// Returns `false` (no-op) unless Paused.
    pub fn resume(&mut self, gpio: &mut impl GpioPort) -> bool {
        if self.state() != PumpState::Paused {
            return false;
        }
        self.register.enable_output(gpio);
        let resumed = self.fsm.fire(PumpEvent::BankClosed).is_some();
        self.serialize(gpio);
        resumed
    }

    /// Stop everything and return to Idle from any state.
    pub fn clear(&mut self, gpio: &mut impl GpioPort) {
        self.reset_hardware(gpio);
        self.fsm.fire(PumpEvent::Clear);
    }

    /// Presence-sensor edge: `true` = vessel present.
    pub fn on_presence_changed(&mut self, present: bool, gpio: &mut impl GpioPort) -> bool {
        if present { self.resume(gpio) } else { self.pause(gpio) }
    }

    // ── Internal ──────────────────────────────────────────────

    fn reset_hardware(&mut self, gpio: &mut impl GpioPort) {
        self.register.master_reset(gpio);
        self.running_secs.iter_mut().for_each(|s| *s = 0);
        self.register.enable_output(gpio);
    }

    fn serialize(&self, gpio: &mut impl GpioPort) -> Option<usize> {
        let sent = self.register.shift_out(gpio, self);
        if sent.is_none() {
            warn!("PumpBank: serialization skipped, register busy");
        }
        sent
    }
}
