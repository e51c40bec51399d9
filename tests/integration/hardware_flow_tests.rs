//! Board-level flows: carriage calibration, radio bring-up, the serial
//! frame path and the ISR event queue.

use barvis::adapters::uart::UartTransport;
use barvis::app::events::AppEvent;
use barvis::app::service::DispenserService;
use barvis::config::SystemConfig;
use barvis::drivers::heartbeat_led::HeartbeatLed;
use barvis::drivers::presence_sensor;
use barvis::error::CarriageError;
use barvis::events::{self, Event};
use barvis::fsm::PumpState;
use barvis::link::at::{self, AtTimings};
use barvis::link::transport::Transport;
use barvis::link::{read_frame, write_all};
use barvis::pins;

use super::mock_hw::{MockBoard, MockRadio, NoDelay, RecordingSink};

// ── Carriage ──────────────────────────────────────────────────

#[test]
fn carriage_calibrates_then_moves() {
    let config = SystemConfig::default();
    let mut board = MockBoard::new(config.pump_count).with_rail(600, 250);
    let mut sink = RecordingSink::new();
    let mut app = DispenserService::new(config);
    app.start(&mut board, &mut sink);

    let max_steps = app.calibrate_carriage(&mut board, &mut NoDelay, &mut sink).unwrap();
    assert_eq!(max_steps, 600);
    assert_eq!(board.head, 300);
    assert!(app.carriage().is_calibrated());
    assert!(sink.contains(&AppEvent::CarriageCalibrated { max_steps: 600 }));

    let travelled = app.move_carriage(450, &mut board, &mut NoDelay, &mut sink).unwrap();
    assert_eq!(travelled, 150);
    assert_eq!(board.head, 450);
    assert_eq!(sink.last(), Some(&AppEvent::CarriageArrived { target: 450, travelled: 150 }));
}

#[test]
fn carriage_refuses_moves_until_calibrated() {
    let config = SystemConfig::default();
    let mut board = MockBoard::new(config.pump_count);
    let mut sink = RecordingSink::new();
    let mut app = DispenserService::new(config);

    let r = app.move_carriage(10, &mut board, &mut NoDelay, &mut sink);
    assert_eq!(r, Err(CarriageError::NotCalibrated));
    assert_eq!(board.steps, 0);
}

#[test]
fn carriage_calibration_fails_on_overlong_rail() {
    let config = SystemConfig { carriage_travel_limit: 500, ..SystemConfig::default() };
    let mut board = MockBoard::new(config.pump_count).with_rail(2_000, 1_000);
    let mut sink = RecordingSink::new();
    let mut app = DispenserService::new(config);
    assert_eq!(app.carriage().sweep_limit(), 600, "500 steps rounded up to whole 200-step revs");

    let r = app.calibrate_carriage(&mut board, &mut NoDelay, &mut sink);
    assert_eq!(r, Err(CarriageError::LimitNotFound));
    assert!(!app.carriage().is_calibrated());
}

#[test]
fn carriage_never_leaves_the_rail() {
    let config = SystemConfig::default();
    let mut board = MockBoard::new(config.pump_count).with_rail(200, 0);
    let mut sink = RecordingSink::new();
    let mut app = DispenserService::new(config);
    app.calibrate_carriage(&mut board, &mut NoDelay, &mut sink).unwrap();

    let travelled = app.move_carriage(5_000, &mut board, &mut NoDelay, &mut sink).unwrap();
    assert_eq!(travelled, 100);
    assert_eq!(board.head, 200);
    assert_eq!(app.carriage().position(), 200);

    app.move_carriage(0, &mut board, &mut NoDelay, &mut sink).unwrap();
    assert_eq!(board.head, 0);
}

// ── Radio bring-up ────────────────────────────────────────────

#[test]
fn radio_bring_up_sends_full_sequence() {
    let config = SystemConfig::default();
    let mut radio = MockRadio::new();
    for _ in 0..7 {
        radio = radio.reply_with(b"OK");
    }

    let answered = at::init_radio(&mut radio, &config.radio_name, AtTimings::from_config(&config));
    assert_eq!(answered, 7);
    assert_eq!(
        radio.sent_text(),
        "ATAT+NOTI0AT+ROLE0AT+RESETAT+SHOW1AT+IMME1AT+NAMEBummButtler"
    );
}

#[test]
fn radio_bring_up_tolerates_silent_bridge() {
    let config = SystemConfig::default();
    let mut radio = MockRadio::new().reply_with(b"OK");
    let answered = at::init_radio(&mut radio, &config.radio_name, AtTimings::from_config(&config));
    assert_eq!(answered, 1);
    assert!(radio.sent_text().ends_with("AT+NAMEBummButtler"));
}

// ── Serial frame path ─────────────────────────────────────────

#[test]
fn uart_frame_round_trip() {
    let config = SystemConfig::default();
    let mut board = MockBoard::new(config.pump_count);
    let mut sink = RecordingSink::new();
    let mut app = DispenserService::new(config.clone());
    app.start(&mut board, &mut sink);

    let mut link = UartTransport::new(pins::RADIO_UART_PORT);
    link.sim_inject(br#"{"type":"PUMP","run_pumps":[{"id":2,"for":1}]}"#);

    let mut frame = vec![0u8; config.command_buffer_size];
    let n = read_frame(&mut link, &mut frame, config.read_gap_ms, config.read_gap_ms).unwrap();
    let status = app.execute(&frame[..n], &mut board, &mut MockRadio::new(), &mut sink);
    write_all(&mut link, status.to_json().unwrap().as_bytes()).unwrap();

    let reply: serde_json::Value = serde_json::from_slice(&link.sim_take_output()).unwrap();
    assert_eq!(reply["status"], 0);
    assert_eq!(reply["message"], "Command queued at 1 of 1");
}

#[test]
fn oversized_frame_is_cut_at_buffer_size() {
    let config = SystemConfig { command_buffer_size: 16, ..SystemConfig::default() };
    let mut board = MockBoard::new(config.pump_count);
    let mut sink = RecordingSink::new();
    let mut app = DispenserService::new(config.clone());

    let mut link = UartTransport::new(pins::DEBUG_UART_PORT);
    link.sim_inject(br#"{"type":"PING","padding":"xxxxxxxx"}"#);

    let mut frame = vec![0u8; config.command_buffer_size];
    let n = read_frame(&mut link, &mut frame, 1, 1).unwrap();
    assert_eq!(n, 16);
    let status = app.execute(&frame[..n], &mut board, &mut MockRadio::new(), &mut sink);
    assert_eq!(status.code(), barvis::app::status::StatusCode::JsonInvalidObject);
    assert!(link.available(), "the rest stays buffered");
}

// ── ISR event queue ───────────────────────────────────────────

/// The only test in this binary that touches the global event queue.
#[test]
fn presence_edge_and_heartbeat_through_event_queue() {
    let config = SystemConfig::default();
    let mut board = MockBoard::new(config.pump_count);
    let mut sink = RecordingSink::new();
    let mut app = DispenserService::new(config);
    let mut led = HeartbeatLed::new(pins::DEBUG_LED_GPIO);
    app.start(&mut board, &mut sink);

    app.execute(
        br#"{"type":"PUMP","run_pumps":[{"id":5,"for":4}]}"#,
        &mut board,
        &mut MockRadio::new(),
        &mut sink,
    );
    events::drain_events(|_| {});

    events::push_event(Event::OrderTick);
    presence_sensor::sim_set_present(false);
    events::push_event(Event::HeartbeatTick);
    events::push_event(Event::PumpTick);

    let mut seen = Vec::new();
    events::drain_events(|event| {
        seen.push(event);
        match event {
            Event::OrderTick => {
                app.on_order_tick(&mut board, &mut sink);
            }
            Event::PresenceChanged => {
                app.on_bank_presence(presence_sensor::is_present(), &mut board, &mut sink)
            }
            Event::HeartbeatTick => led.toggle(&mut board),
            Event::PumpTick => app.on_pump_tick(&mut board, &mut sink),
        }
    });

    assert_eq!(
        seen,
        vec![Event::OrderTick, Event::PresenceChanged, Event::HeartbeatTick, Event::PumpTick]
    );
    assert!(events::queue_is_empty());
    assert_eq!(app.pump_state(), PumpState::Paused);
    assert_eq!(app.bank().running_secs()[5], 4, "paused before the tick");
    assert!(board.led_high);
    assert!(led.is_lit());

    presence_sensor::sim_set_present(true);
    events::drain_events(|event| {
        if event == Event::PresenceChanged {
            app.on_bank_presence(presence_sensor::is_present(), &mut board, &mut sink);
        }
    });
    assert_eq!(app.pump_state(), PumpState::Executing);
    assert_eq!(board.running(), vec![5]);
}
