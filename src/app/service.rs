//! Application service, the hexagonal core.
//!
//! [`DispenserService`] owns the pump bank, the order scheduler, the
//! carriage and the token arena the command parser works in.  All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  Transport ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                │      DispenserService         │
//!   GpioPort ◀──│ Parser · Queue · Bank · Rail  │
//!                └──────────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::drivers::carriage::{Carriage, CarriageEvent, CarriagePins};
use crate::drivers::pump_bank::PumpBank;
use crate::drivers::shift_register::{ShiftRegister, ShiftRegisterPins};
use crate::error::{CarriageError, OrderError, PumpError};
use crate::fsm::PumpState;
use crate::json::{self, JsonDocument, Token, MAX_TOKENS};
use crate::link::at::{self, AtTimings};
use crate::link::transport::Transport;
use crate::orders::Order;
use crate::scheduler::{Dispatch, OrderScheduler};

use super::commands::{self, Command};
use super::events::AppEvent;
use super::ports::{CarriageListener, EventSink, GpioPort, OrderExecutor};
use super::status::{Status, StatusCode};

/// Longest AT reply carried back to the client.
const AT_REPLY_LEN: usize = 64;

// ───────────────────────────────────────────────────────────────
// DispenserService
// ───────────────────────────────────────────────────────────────

pub struct DispenserService {
    config: SystemConfig,
    bank: PumpBank,
    scheduler: OrderScheduler,
    carriage: Carriage,
    tokens: [Token; MAX_TOKENS],
}

impl DispenserService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let register = ShiftRegister::new(ShiftRegisterPins::PUMP_BANK);
        let bank = PumpBank::new(config.pump_count, config.max_pump_duration_secs, register);
        let scheduler = OrderScheduler::new(config.position_count);
        let carriage = Carriage::new(CarriagePins::BOARD, config.carriage_travel_limit, config.steps_per_rev);
        Self {
            config,
            bank,
            scheduler,
            carriage,
            tokens: [Token::EMPTY; MAX_TOKENS],
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Reset the pump register and enable its outputs.
    pub fn start(&mut self, gpio: &mut impl GpioPort, sink: &mut impl EventSink) {
        self.bank.start(gpio);
        sink.emit(&AppEvent::Started {
            pumps: self.bank.pump_count(),
            positions: self.scheduler.position_count(),
        });
        info!(
            "DispenserService started: {} pumps, {} position(s)",
            self.bank.pump_count(),
            self.scheduler.position_count()
        );
    }

    /// Run the carriage calibration sweep to completion.
    pub fn calibrate_carriage(
        &mut self,
        gpio: &mut impl GpioPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Result<u32, CarriageError> {
        self.carriage.calibrate()?;
        self.drive_carriage(gpio, delay, sink)?;
        Ok(self.carriage.max_steps())
    }

    /// Move the carriage to `target` steps from home and wait for it.
    ///
    /// Returns the distance actually travelled.
    pub fn move_carriage(
        &mut self,
        target: u32,
        gpio: &mut impl GpioPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Result<u32, CarriageError> {
        self.carriage.move_to_position(target)?;
        match self.drive_carriage(gpio, delay, sink)? {
            Some(CarriageEvent::Arrived { travelled, .. }) => Ok(travelled),
            _ => Ok(0),
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Interpret one command frame and apply it.
    ///
    /// `radio` receives the payload of `AT` commands.  The returned status
    /// is the reply to send back over the link the frame arrived on.
    pub fn execute(
        &mut self,
        input: &[u8],
        gpio: &mut impl GpioPort,
        radio: &mut impl Transport,
        sink: &mut impl EventSink,
    ) -> Status {
        let limits = self.bank.limits();
        let capacity = self.config.token_capacity.clamp(1, MAX_TOKENS);

        let Self { tokens, bank, scheduler, config, .. } = self;
        let arena = &mut tokens[..capacity];

        let (name, status) = match json::parse(input, arena) {
            Err(e) => {
                debug!("execute: tokenizer rejected frame: {}", e);
                ("?", commands::invalid_object())
            }
            Ok(n) => {
                let doc = JsonDocument::new(input, &arena[..n]);
                match commands::parse_command(&doc, limits) {
                    Err(status) => ("?", status),
                    Ok(cmd) => {
                        let name = cmd.name();
                        let status = apply(cmd, bank, scheduler, config, gpio, radio, sink);
                        (name, status)
                    }
                }
            }
        };

        if status.is_success() {
            info!("[{}] {}", name, status);
        } else {
            warn!("[{}] {}", name, status);
        }
        sink.emit(&AppEvent::CommandHandled { command: name, code: status.code() });
        status
    }

    // ── Periodic work ─────────────────────────────────────────

    /// 1 Hz pump countdown.
    pub fn on_pump_tick(&mut self, gpio: &mut impl GpioPort, sink: &mut impl EventSink) {
        let before = self.bank.state();
        if let Some(after) = self.bank.tick(gpio) {
            sink.emit(&AppEvent::PumpStateChanged { from: before, to: after });
        }
    }

    /// Order scheduler tick: start the next order if the bank is idle.
    pub fn on_order_tick(&mut self, gpio: &mut impl GpioPort, sink: &mut impl EventSink) -> Option<Dispatch> {
        let before = self.bank.state();
        let mut executor = BankExecutor { bank: &mut self.bank, gpio };
        let dispatch = self.scheduler.tick(&mut executor)?;
        sink.emit(&AppEvent::OrderDispatched {
            position: dispatch.position,
            active_pumps: dispatch.active_pumps,
        });
        emit_state_change(before, self.bank.state(), sink);
        Some(dispatch)
    }

    /// Presence sensor edge: pause on removal, resume on return.
    pub fn on_bank_presence(&mut self, present: bool, gpio: &mut impl GpioPort, sink: &mut impl EventSink) {
        let before = self.bank.state();
        if self.bank.on_presence_changed(present, gpio) {
            info!("presence: vessel {}", if present { "returned" } else { "removed" });
        }
        emit_state_change(before, self.bank.state(), sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn pump_state(&self) -> PumpState {
        self.bank.state()
    }

    pub fn bank(&self) -> &PumpBank {
        &self.bank
    }

    pub fn scheduler(&self) -> &OrderScheduler {
        &self.scheduler
    }

    pub fn carriage(&self) -> &Carriage {
        &self.carriage
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn drive_carriage(
        &mut self,
        gpio: &mut impl GpioPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Result<Option<CarriageEvent>, CarriageError> {
        let mut listener = SinkListener { sink: &mut *sink };
        let event = self
            .carriage
            .run_until_idle(gpio, delay, self.config.step_delay_us, &mut listener)?;
        if let Some(CarriageEvent::Calibrated { max_steps }) = event {
            sink.emit(&AppEvent::CarriageCalibrated { max_steps });
        }
        Ok(event)
    }
}

/// Side effects of a validated command.
fn apply(
    cmd: Command<'_>,
    bank: &mut PumpBank,
    scheduler: &mut OrderScheduler,
    config: &SystemConfig,
    gpio: &mut impl GpioPort,
    radio: &mut impl Transport,
    sink: &mut impl EventSink,
) -> Status {
    match cmd {
        Command::Ping => Status::success("PONG"),
        Command::Set => Status::default(),
        Command::Pump(order) => queue_order(order, scheduler, sink),
        Command::Clear => {
            let before = bank.state();
            bank.clear(gpio);
            emit_state_change(before, bank.state(), sink);
            Status::success("All Pumps reset")
        }
        Command::Pause => {
            let before = bank.state();
            bank.pause(gpio);
            emit_state_change(before, bank.state(), sink);
            Status::success("Pumps Paused")
        }
        Command::Resume => {
            let before = bank.state();
            bank.resume(gpio);
            emit_state_change(before, bank.state(), sink);
            Status::success("Pumps Resumed")
        }
        Command::At(cmd) => {
            let mut reply = [0u8; AT_REPLY_LEN];
            match at::exchange(radio, cmd, &mut reply, AtTimings::from_config(config)) {
                Ok(n) => {
                    let mut status = Status::success("[");
                    status.append_bytes(cmd);
                    status.append("] response: [");
                    status.append_bytes(&reply[..n]);
                    status.append("]");
                    status
                }
                Err(e) => {
                    warn!("AT passthrough: {}", e);
                    let mut status = Status::new(StatusCode::UnknownError, "[");
                    status.append_bytes(cmd);
                    status.append_fmt(format_args!("] failed: {e}"));
                    status
                }
            }
        }
    }
}

fn queue_order(order: Order, scheduler: &mut OrderScheduler, sink: &mut impl EventSink) -> Status {
    let capacity = scheduler.queue().capacity();
    match scheduler.enqueue(order) {
        Ok(depth) => {
            scheduler.queue().log_contents();
            sink.emit(&AppEvent::OrderQueued { depth, capacity });
            Status::with_args(
                StatusCode::Success,
                format_args!("Command queued at {} of {}", depth, capacity),
            )
        }
        Err(OrderError::QueueFull) => {
            let depth = scheduler.queue().len();
            sink.emit(&AppEvent::OrderRejected { depth, capacity });
            Status::with_args(
                StatusCode::OrderQueueFull,
                format_args!("Command NOT accepted. Orders exist {} of {}", depth, capacity),
            )
        }
        Err(e) => Status::with_args(StatusCode::UnknownError, format_args!("Order not queued: {}", e)),
    }
}

fn emit_state_change(from: PumpState, to: PumpState, sink: &mut impl EventSink) {
    if from != to {
        sink.emit(&AppEvent::PumpStateChanged { from, to });
    }
}

// ───────────────────────────────────────────────────────────────
// Port glue
// ───────────────────────────────────────────────────────────────

/// The pump bank plus the GPIO it drives, borrowed for one scheduler tick.
struct BankExecutor<'a, G: GpioPort> {
    bank: &'a mut PumpBank,
    gpio: &'a mut G,
}

impl<G: GpioPort> OrderExecutor for BankExecutor<'_, G> {
    fn is_idle(&self) -> bool {
        self.bank.is_idle()
    }

    fn run_order(&mut self, order: &Order) -> Result<usize, PumpError> {
        self.bank.run_pumps_for(order, self.gpio)
    }
}

/// Forwards carriage arrivals to the event sink.
struct SinkListener<'a, S: EventSink> {
    sink: &'a mut S,
}

impl<S: EventSink> CarriageListener for SinkListener<'_, S> {
    fn on_position_reached(&mut self, target: u32, travelled: u32) {
        self.sink.emit(&AppEvent::CarriageArrived { target, travelled });
    }
}
