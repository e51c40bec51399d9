//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                   |
//! |------------|--------------|-------------------------------|
//! | `hardware` | GpioPort     | ESP32 GPIO                    |
//! | `uart`     | Transport    | HM-11 bridge, debug console   |
//! | `log_sink` | EventSink    | Serial log output             |
//! | `delay`    | DelayNs      | ROM busy-wait / thread sleep  |

pub mod delay;
pub mod hardware;
pub mod log_sink;
pub mod uart;
