//! Table-driven pump controller state machine.
//!
//! ```text
//! ┌───────────┬─────────────┬───────────┐
//! │ from      │ event       │ to        │
//! ├───────────┼─────────────┼───────────┤
//! │ Idle      │ Run         │ Executing │
//! │ Executing │ BankOpened  │ Paused    │
//! │ Paused    │ BankClosed  │ Executing │
//! │ Executing │ Drained     │ Idle      │
//! │ *         │ Clear       │ Idle      │
//! └───────────┴─────────────┴───────────┘
//! ```
//!
//! Every pump-bank mutator fires an event through [`PumpFsm::fire`]; an
//! edge missing from [`TRANSITIONS`] is rejected and leaves the state
//! untouched.  The pump tick, the presence-sensor handler and the command
//! path each only ever fire the edges that leave the state they expect.

use log::info;

// ---------------------------------------------------------------------------
// States and events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PumpState {
    Idle = 0,
    Paused = 1,
    Executing = 2,
}

impl PumpState {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::Idle, Self::Paused, Self::Executing];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Paused => "Paused",
            Self::Executing => "Executing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PumpEvent {
    /// An order with at least one nonzero duration was loaded.
    Run = 0,
    /// The presence sensor reports the vessel removed.
    BankOpened = 1,
    /// The presence sensor reports the vessel back in place.
    BankClosed = 2,
    /// The last running countdown reached zero.
    Drained = 3,
    /// CLEAR command.
    Clear = 4,
}

impl PumpEvent {
    pub const COUNT: usize = 5;
    pub const ALL: [Self; Self::COUNT] = [
        Self::Run,
        Self::BankOpened,
        Self::BankClosed,
        Self::Drained,
        Self::Clear,
    ];
}

// ---------------------------------------------------------------------------
// Legal edges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PumpState,
    pub event: PumpEvent,
    pub to: PumpState,
}

const fn edge(from: PumpState, event: PumpEvent, to: PumpState) -> Transition {
    Transition { from, event, to }
}

pub const TRANSITIONS: [Transition; 7] = [
    edge(PumpState::Idle, PumpEvent::Run, PumpState::Executing),
    edge(PumpState::Executing, PumpEvent::BankOpened, PumpState::Paused),
    edge(PumpState::Paused, PumpEvent::BankClosed, PumpState::Executing),
    edge(PumpState::Executing, PumpEvent::Drained, PumpState::Idle),
    edge(PumpState::Idle, PumpEvent::Clear, PumpState::Idle),
    edge(PumpState::Paused, PumpEvent::Clear, PumpState::Idle),
    edge(PumpState::Executing, PumpEvent::Clear, PumpState::Idle),
];

/// Target state for `event` in `from`, or `None` if the edge is illegal.
pub fn next_state(from: PumpState, event: PumpEvent) -> Option<PumpState> {
    TRANSITIONS
        .iter()
        .find(|t| t.from == from && t.event == event)
        .map(|t| t.to)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Current pump controller state plus the guard that moves it.
#[derive(Debug)]
pub struct PumpFsm {
    current: PumpState,
    transitions: u32,
}

impl Default for PumpFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpFsm {
    pub fn new() -> Self {
        Self {
            current: PumpState::Idle,
            transitions: 0,
        }
    }

    pub fn state(&self) -> PumpState {
        self.current
    }

    /// Number of accepted transitions since boot.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Apply `event`.  Returns `(from, to)` when the edge is legal.
    pub fn fire(&mut self, event: PumpEvent) -> Option<(PumpState, PumpState)> {
        let from = self.current;
        let to = next_state(from, event)?;
        self.current = to;
        self.transitions = self.transitions.wrapping_add(1);
        if from != to {
            info!("Pumps: {} -> {} ({:?})", from.name(), to.name(), event);
        }
        Some((from, to))
    }
}
