//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod carriage;
pub mod heartbeat_led;
pub mod hw_init;
pub mod hw_timer;
pub mod presence_sensor;
pub mod pump_bank;
pub mod shift_register;
