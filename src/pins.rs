//! GPIO / peripheral pin assignments for the Barvis main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Pump bank (74HC595-style shift-register chain)
// ---------------------------------------------------------------------------

/// Serial data into the first register.
pub const PUMP_DATA_GPIO: i32 = 4;
/// Shift clock, data sampled on the rising edge.
pub const PUMP_CLOCK_GPIO: i32 = 5;
/// Storage latch, outputs update on the rising edge.
pub const PUMP_LATCH_GPIO: i32 = 6;
/// Output enable, active LOW.
pub const PUMP_OE_GPIO: i32 = 7;
/// Master reset, active LOW.
pub const PUMP_RESET_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Bank-presence sensor (IR reflective, pull-up)
// ---------------------------------------------------------------------------

/// HIGH = vessel in place under the pump bank.
pub const PRESENCE_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Dispensing carriage (stepper driver + limit switches)
// ---------------------------------------------------------------------------

pub const CARRIAGE_STEP_GPIO: i32 = 17;
/// LOW = toward home, HIGH = toward end.
pub const CARRIAGE_DIR_GPIO: i32 = 18;
/// HIGH = carriage pressing the home switch.
pub const HOME_SWITCH_GPIO: i32 = 8;
/// HIGH = carriage pressing the end switch.
pub const END_SWITCH_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Debug LED
// ---------------------------------------------------------------------------

pub const DEBUG_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// UART links
// ---------------------------------------------------------------------------

/// HM-11 BLE serial bridge.
pub const RADIO_UART_PORT: i32 = 1;
pub const RADIO_TX_GPIO: i32 = 10;
pub const RADIO_RX_GPIO: i32 = 11;
pub const RADIO_BAUD: i32 = 9600;

/// USB / debug console.
pub const DEBUG_UART_PORT: i32 = 0;
pub const DEBUG_BAUD: i32 = 115_200;
