//! Fuzz target: `DispenserService::execute`
//!
//! Feeds arbitrary frames through the whole command path and checks that
//! the reply envelope always renders and that a single frame never
//! starts the pumps on its own.
//!
//! cargo fuzz run fuzz_command_frame

#![no_main]

use barvis::app::events::AppEvent;
use barvis::app::ports::{EventSink, GpioPort};
use barvis::app::service::DispenserService;
use barvis::app::status::MAX_MESSAGE_LEN;
use barvis::config::SystemConfig;
use barvis::fsm::PumpState;
use barvis::link::transport::NullTransport;
use libfuzzer_sys::fuzz_target;

struct NullGpio;

impl GpioPort for NullGpio {
    fn read_level(&mut self, _pin: i32) -> bool {
        false
    }

    fn write_level(&mut self, _pin: i32, _high: bool) {}
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut app = DispenserService::new(SystemConfig::default());
    app.start(&mut NullGpio, &mut NullSink);

    let status = app.execute(data, &mut NullGpio, &mut NullTransport, &mut NullSink);
    assert!(status.message().len() <= MAX_MESSAGE_LEN);
    assert!(status.to_json().is_ok());
    assert_eq!(app.pump_state(), PumpState::Idle);
    assert!(app.scheduler().queue().len() <= 1);
});
