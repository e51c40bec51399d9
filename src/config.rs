//! System configuration parameters
//!
//! All tunable parameters for the Barvis dispenser.  Fixed-capacity
//! storage (order slots, pump countdowns, token arena) is sized by the
//! `MAX_*` constants; [`SystemConfig::validate`] keeps the runtime values
//! inside those bounds.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::json::MAX_TOKENS;
use crate::orders::{MAX_POSITIONS, MAX_PUMPS};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Pump bank ---
    /// Number of pumps wired to the shift-register chain
    pub pump_count: usize,
    /// Longest run a single order may request (seconds)
    pub max_pump_duration_secs: u16,

    // --- Orders ---
    /// Dispensing positions (cups); also the order queue capacity
    pub position_count: usize,

    // --- Command link ---
    /// Largest accepted command frame (bytes)
    pub command_buffer_size: usize,
    /// Token arena slots used per command
    pub token_capacity: usize,
    /// Gap that terminates an incoming command frame (milliseconds)
    pub read_gap_ms: u32,
    /// Longest wait for the radio to answer an AT command (milliseconds)
    pub at_response_timeout_ms: u32,
    /// Quiet time that ends an AT reply (milliseconds)
    pub at_settle_ms: u32,
    /// Name advertised by the radio bridge
    pub radio_name: heapless::String<16>,

    // --- Carriage ---
    /// Stepper steps per motor revolution
    pub steps_per_rev: u32,
    /// Delay between step pulses (microseconds)
    pub step_delay_us: u32,
    /// Calibration gives up after this many steps without a limit switch
    pub carriage_travel_limit: u32,

    // --- Timing ---
    /// Pump countdown tick (milliseconds)
    pub pump_tick_interval_ms: u32,
    /// Order scheduler tick (milliseconds)
    pub order_tick_interval_ms: u32,
    /// Debug LED heartbeat (milliseconds)
    pub heartbeat_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut radio_name = heapless::String::new();
        // "BummButtler" is 11 bytes, well within the 16-byte capacity.
        let _ = radio_name.push_str("BummButtler");

        Self {
            // Pump bank
            pump_count: 24,
            max_pump_duration_secs: 300,

            // Orders
            position_count: 1,

            // Command link
            command_buffer_size: 1024,
            token_capacity: MAX_TOKENS,
            read_gap_ms: 10,
            at_response_timeout_ms: 1000,
            at_settle_ms: 50,
            radio_name,

            // Carriage
            steps_per_rev: 200,
            step_delay_us: 250,
            carriage_travel_limit: 20_000,

            // Timing
            pump_tick_interval_ms: 1000, // 1 Hz
            order_tick_interval_ms: 250,
            heartbeat_interval_ms: 250,
        }
    }
}

impl SystemConfig {
    /// Check every field against the fixed-capacity storage behind it.
    pub fn validate(&self) -> Result<()> {
        if self.pump_count == 0 || self.pump_count > MAX_PUMPS {
            return Err(Error::Config("pump_count out of range"));
        }
        if self.position_count == 0 || self.position_count > MAX_POSITIONS {
            return Err(Error::Config("position_count out of range"));
        }
        if self.token_capacity == 0 || self.token_capacity > MAX_TOKENS {
            return Err(Error::Config("token_capacity out of range"));
        }
        if self.command_buffer_size == 0 {
            return Err(Error::Config("command_buffer_size is zero"));
        }
        if self.pump_tick_interval_ms == 0
            || self.order_tick_interval_ms == 0
            || self.heartbeat_interval_ms == 0
        {
            return Err(Error::Config("timer interval is zero"));
        }
        if self.steps_per_rev == 0 || self.carriage_travel_limit < self.steps_per_rev {
            return Err(Error::Config("carriage travel limit below one revolution"));
        }
        Ok(())
    }
}
