//! Dispensing carriage: stepper motor between a home and an end limit switch.
//!
//! The carriage advances one step per [`Carriage::step`] call, which lets
//! the same state machine run from a blocking loop at boot
//! ([`Carriage::run_until_idle`]) or from a periodic step event.
//!
//! ```text
//!  NotCalibrated ──calibrate──▶ SeekingHome ──home switch──▶ SeekingEnd
//!                                                                │ end switch
//!                                                                ▼ (max_steps)
//!            Idle ◀──────────── midpoint reached ─────────── Centering
//!             │ ▲
//!  move_to_position  target reached / limit switch
//!             ▼ │
//!            Moving
//! ```
//!
//! Both switches are polled before every step; a switch in the direction
//! of travel ends the move regardless of the requested target.  The sweep
//! budget is counted in whole motor revolutions.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::{CarriageListener, GpioPort};
use crate::error::CarriageError;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarriagePins {
    pub step: i32,
    pub direction: i32,
    pub home_switch: i32,
    pub end_switch: i32,
}

impl CarriagePins {
    pub const BOARD: Self = Self {
        step: pins::CARRIAGE_STEP_GPIO,
        direction: pins::CARRIAGE_DIR_GPIO,
        home_switch: pins::HOME_SWITCH_GPIO,
        end_switch: pins::END_SWITCH_GPIO,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Home,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarriageState {
    NotCalibrated,
    SeekingHome,
    SeekingEnd,
    /// Travelling to the midpoint after the sweep.
    Centering,
    Idle,
    Moving,
}

/// Completion reported by [`Carriage::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarriageEvent {
    Calibrated { max_steps: u32 },
    Arrived { target: u32, travelled: u32 },
}

pub struct Carriage {
    pins: CarriagePins,
    state: CarriageState,
    /// Steps from the home switch.
    position: i32,
    max_steps: u32,
    target: u32,
    travelled: u32,
    /// Steps taken in the current calibration phase.
    sweep_steps: u32,
    steps_per_rev: u32,
    /// Travel limit rounded up to whole revolutions.
    sweep_limit: u32,
}

impl Carriage {
    pub fn new(pins: CarriagePins, travel_limit: u32, steps_per_rev: u32) -> Self {
        let steps_per_rev = steps_per_rev.max(1);
        let revs = travel_limit.div_ceil(steps_per_rev);
        Self {
            pins,
            state: CarriageState::NotCalibrated,
            position: 0,
            max_steps: 0,
            target: 0,
            travelled: 0,
            sweep_steps: 0,
            steps_per_rev,
            sweep_limit: revs.saturating_mul(steps_per_rev),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> CarriageState {
        self.state
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    /// Step count between the switches; 0 until calibrated.
    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Steps a calibration phase may take before giving up.
    pub fn sweep_limit(&self) -> u32 {
        self.sweep_limit
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.state, CarriageState::Idle | CarriageState::Moving)
    }

    pub fn is_in_motion(&self) -> bool {
        !matches!(self.state, CarriageState::NotCalibrated | CarriageState::Idle)
    }

    pub fn at_home(&self, gpio: &mut impl GpioPort) -> bool {
        gpio.read_level(self.pins.home_switch)
    }

    pub fn at_end(&self, gpio: &mut impl GpioPort) -> bool {
        gpio.read_level(self.pins.end_switch)
    }

    // ── Commands ──────────────────────────────────────────────

    /// Begin the home → end → midpoint sweep.  Runs once per boot.
    pub fn calibrate(&mut self) -> Result<(), CarriageError> {
        match self.state {
            CarriageState::NotCalibrated => {
                self.state = CarriageState::SeekingHome;
                self.sweep_steps = 0;
                info!("Carriage: calibration started");
                Ok(())
            }
            CarriageState::Idle => Err(CarriageError::AlreadyCalibrated),
            _ => Err(CarriageError::InMotion),
        }
    }

    /// Begin a move to `target` steps from home.
    pub fn move_to_position(&mut self, target: u32) -> Result<(), CarriageError> {
        match self.state {
            CarriageState::Idle => {
                self.target = target;
                self.travelled = 0;
                self.state = CarriageState::Moving;
                Ok(())
            }
            CarriageState::Moving => Err(CarriageError::InMotion),
            _ => Err(CarriageError::NotCalibrated),
        }
    }

    /// Advance by at most one step.
    ///
    /// Returns an event when calibration or a move completes.  A sweep
    /// that exceeds the travel limit without reaching its switch drops
    /// back to `NotCalibrated` and reports [`CarriageError::LimitNotFound`].
    pub fn step(
        &mut self,
        gpio: &mut impl GpioPort,
        listener: &mut impl CarriageListener,
    ) -> Result<Option<CarriageEvent>, CarriageError> {
        let home = self.at_home(gpio);
        let end = self.at_end(gpio);
        if home {
            self.position = 0;
        }

        match self.state {
            CarriageState::NotCalibrated | CarriageState::Idle => Ok(None),

            CarriageState::SeekingHome => {
                if home {
                    self.state = CarriageState::SeekingEnd;
                    self.sweep_steps = 0;
                    return Ok(None);
                }
                self.sweep_step(gpio, Direction::Home)
            }

            CarriageState::SeekingEnd => {
                if end {
                    self.max_steps = self.position.max(0) as u32;
                    self.target = self.max_steps / 2;
                    self.travelled = 0;
                    self.state = CarriageState::Centering;
                    return Ok(None);
                }
                self.sweep_step(gpio, Direction::End)
            }

            CarriageState::Centering | CarriageState::Moving => {
                let target = i64::from(self.target);
                let here = i64::from(self.position);
                let arrived = match target.cmp(&here) {
                    core::cmp::Ordering::Less => home,
                    core::cmp::Ordering::Greater => end,
                    core::cmp::Ordering::Equal => true,
                };
                if arrived {
                    return Ok(Some(self.arrive(listener)));
                }
                let direction = if target < here { Direction::Home } else { Direction::End };
                self.pulse(gpio, direction);
                self.travelled += 1;
                Ok(None)
            }
        }
    }

    /// Step until the carriage stops, pausing `step_delay_us` between steps.
    pub fn run_until_idle(
        &mut self,
        gpio: &mut impl GpioPort,
        delay: &mut impl DelayNs,
        step_delay_us: u32,
        listener: &mut impl CarriageListener,
    ) -> Result<Option<CarriageEvent>, CarriageError> {
        let mut last = None;
        while self.is_in_motion() {
            if let Some(event) = self.step(gpio, listener)? {
                last = Some(event);
            }
            delay.delay_us(step_delay_us);
        }
        Ok(last)
    }

    // ── Internal ──────────────────────────────────────────────

    fn sweep_step(
        &mut self,
        gpio: &mut impl GpioPort,
        direction: Direction,
    ) -> Result<Option<CarriageEvent>, CarriageError> {
        if self.sweep_steps >= self.sweep_limit {
            warn!("Carriage: no {:?} switch within {} steps", direction, self.sweep_limit);
            self.state = CarriageState::NotCalibrated;
            return Err(CarriageError::LimitNotFound);
        }
        self.pulse(gpio, direction);
        self.sweep_steps += 1;
        if self.sweep_steps % self.steps_per_rev == 0 {
            debug!("Carriage: {:?} sweep, {} revs", direction, self.sweep_steps / self.steps_per_rev);
        }
        Ok(None)
    }

    fn pulse(&mut self, gpio: &mut impl GpioPort, direction: Direction) {
        gpio.write_level(self.pins.direction, direction == Direction::End);
        gpio.pulse(self.pins.step);
        self.position += match direction {
            Direction::Home => -1,
            Direction::End => 1,
        };
    }

    fn arrive(&mut self, listener: &mut impl CarriageListener) -> CarriageEvent {
        let was = self.state;
        self.state = CarriageState::Idle;
        if was == CarriageState::Centering {
            info!("Carriage: calibrated, max_steps={} parked at {}", self.max_steps, self.position);
            CarriageEvent::Calibrated { max_steps: self.max_steps }
        } else {
            listener.on_position_reached(self.target, self.travelled);
            CarriageEvent::Arrived {
                target: self.target,
                travelled: self.travelled,
            }
        }
    }
}
