//! End-to-end command handling: frame in, pumps switched, envelope out.
//!
//! Every test drives the public [`DispenserService`] API against
//! [`MockBoard`], so the assertions are on the levels the pumps would
//! actually see behind the shift register.

use barvis::app::events::AppEvent;
use barvis::app::service::DispenserService;
use barvis::app::status::StatusCode;
use barvis::config::SystemConfig;
use barvis::fsm::PumpState;
use barvis::link::transport::NullTransport;
use barvis::scheduler::Dispatch;

use super::mock_hw::{MockBoard, MockRadio, RecordingSink};

fn make_app(config: SystemConfig) -> (DispenserService, MockBoard, RecordingSink) {
    let mut board = MockBoard::new(config.pump_count);
    let mut sink = RecordingSink::new();
    let mut app = DispenserService::new(config);
    app.start(&mut board, &mut sink);
    (app, board, sink)
}

fn send(app: &mut DispenserService, board: &mut MockBoard, sink: &mut RecordingSink, frame: &str) -> serde_json::Value {
    let status = app.execute(frame.as_bytes(), board, &mut NullTransport, sink);
    let json = status.to_json().unwrap();
    serde_json::from_str(&json).unwrap()
}

// ── Basic commands ────────────────────────────────────────────

#[test]
fn ping_answers_pong_envelope() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    let reply = send(&mut app, &mut board, &mut sink, r#"{"type":"PING"}"#);
    assert_eq!(reply, serde_json::json!({"status": 0, "message": "PONG"}));
    assert!(sink.contains(&AppEvent::Started { pumps: 24, positions: 1 }));
}

#[test]
fn garbage_is_an_invalid_object() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    for frame in ["", "hello", "[1,2,3]", r#"{"type":"PING""#] {
        let reply = send(&mut app, &mut board, &mut sink, frame);
        assert_eq!(reply["status"], StatusCode::JsonInvalidObject.code(), "frame {:?}", frame);
    }
    assert_eq!(app.pump_state(), PumpState::Idle);
}

#[test]
fn unknown_type_is_named_in_reply() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    let reply = send(&mut app, &mut board, &mut sink, r#"{"type":"DANCE"}"#);
    assert_eq!(reply["status"], StatusCode::UnknownError.code());
    assert_eq!(reply["message"], "Unknown command type: DANCE");
}

#[test]
fn trailing_nul_ends_the_frame() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    let status = app.execute(b"{\"type\":\"PING\"}\0junk", &mut board, &mut NullTransport, &mut sink);
    assert_eq!(status.message(), "PONG");
}

// ── PUMP lifecycle ────────────────────────────────────────────

#[test]
fn pump_order_runs_to_completion() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());

    let reply = send(
        &mut app,
        &mut board,
        &mut sink,
        r#"{"type":"PUMP","run_pumps":[{"id":1,"for":2},{"id":3,"for":1}]}"#,
    );
    assert_eq!(reply["status"], 0);
    assert_eq!(reply["message"], "Command queued at 1 of 1");
    assert!(board.running().is_empty(), "nothing runs before the order tick");

    let dispatch = app.on_order_tick(&mut board, &mut sink);
    assert_eq!(dispatch, Some(Dispatch { position: 0, active_pumps: 2 }));
    assert_eq!(app.pump_state(), PumpState::Executing);
    assert_eq!(board.running(), vec![1, 3]);

    app.on_pump_tick(&mut board, &mut sink);
    assert_eq!(board.running(), vec![1]);
    assert_eq!(app.bank().running_secs()[1], 1);

    app.on_pump_tick(&mut board, &mut sink);
    assert!(board.running().is_empty());
    assert_eq!(app.pump_state(), PumpState::Idle);
    assert!(sink.contains(&AppEvent::PumpStateChanged {
        from: PumpState::Executing,
        to: PumpState::Idle,
    }));

    // Further ticks while Idle are inert.
    let latches = board.latches;
    app.on_pump_tick(&mut board, &mut sink);
    assert_eq!(board.latches, latches);
}

#[test]
fn queue_full_is_reported_and_queue_untouched() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    let cmd = r#"{"type":"PUMP","run_pumps":[{"id":0,"for":10}]}"#;

    assert_eq!(send(&mut app, &mut board, &mut sink, cmd)["status"], 0);
    let reply = send(&mut app, &mut board, &mut sink, cmd);
    assert_eq!(reply["status"], StatusCode::OrderQueueFull.code());
    assert_eq!(reply["message"], "Command NOT accepted. Orders exist 1 of 1");
    assert_eq!(app.scheduler().queue().len(), 1);
    assert!(sink.contains(&AppEvent::OrderRejected { depth: 1, capacity: 1 }));
}

#[test]
fn invalid_instruction_rejects_whole_order() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());

    let reply = send(
        &mut app,
        &mut board,
        &mut sink,
        r#"{"type":"PUMP","run_pumps":[{"id":2,"for":5},{"id":99,"for":5}]}"#,
    );
    assert_eq!(reply["status"], StatusCode::PumpInvalidId.code());
    assert_eq!(reply["message"], "Invalid ID: 99 provided for Instruction: 1");

    let reply = send(
        &mut app,
        &mut board,
        &mut sink,
        r#"{"type":"PUMP","run_pumps":[{"id":2,"for":301}]}"#,
    );
    assert_eq!(reply["status"], StatusCode::PumpInvalidDuration.code());
    assert_eq!(reply["message"], "Invalid Duration: 301 provided for Instruction: 0");

    assert!(app.scheduler().queue().is_empty());
    assert_eq!(app.on_order_tick(&mut board, &mut sink), None);
    assert!(board.running().is_empty());
}

#[test]
fn orders_dispatch_in_fifo_order_across_positions() {
    let config = SystemConfig { position_count: 3, ..SystemConfig::default() };
    let (mut app, mut board, mut sink) = make_app(config);

    for id in [4, 5, 6] {
        let frame = format!(r#"{{"type":"PUMP","run_pumps":[{{"id":{},"for":1}}]}}"#, id);
        assert_eq!(send(&mut app, &mut board, &mut sink, &frame)["status"], 0);
    }

    for (position, id) in [(0, 4), (1, 5), (2, 6)] {
        let dispatch = app.on_order_tick(&mut board, &mut sink).unwrap();
        assert_eq!(dispatch.position, position);
        assert_eq!(board.running(), vec![id]);

        // Busy bank: the next order waits.
        assert_eq!(app.on_order_tick(&mut board, &mut sink), None);
        app.on_pump_tick(&mut board, &mut sink);
        assert_eq!(app.pump_state(), PumpState::Idle);
    }
    assert!(app.scheduler().queue().is_empty());
}

// ── Pause / resume / clear ────────────────────────────────────

#[test]
fn presence_pauses_and_resumes_countdown() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    send(&mut app, &mut board, &mut sink, r#"{"type":"PUMP","run_pumps":[{"id":7,"for":3}]}"#);
    app.on_order_tick(&mut board, &mut sink);
    app.on_pump_tick(&mut board, &mut sink);
    assert_eq!(app.bank().running_secs()[7], 2);

    board.presence = false;
    app.on_bank_presence(false, &mut board, &mut sink);
    assert_eq!(app.pump_state(), PumpState::Paused);
    assert!(!board.outputs_enabled());
    assert!(board.running().is_empty());

    // Time does not count while paused.
    app.on_pump_tick(&mut board, &mut sink);
    app.on_pump_tick(&mut board, &mut sink);
    assert_eq!(app.bank().running_secs()[7], 2);

    board.presence = true;
    app.on_bank_presence(true, &mut board, &mut sink);
    assert_eq!(app.pump_state(), PumpState::Executing);
    assert_eq!(board.running(), vec![7]);

    app.on_pump_tick(&mut board, &mut sink);
    app.on_pump_tick(&mut board, &mut sink);
    assert_eq!(app.pump_state(), PumpState::Idle);
}

#[test]
fn pause_and_resume_commands_are_idempotent() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());

    // Nothing running: both are acknowledged no-ops.
    assert_eq!(send(&mut app, &mut board, &mut sink, r#"{"type":"PAUSE"}"#)["message"], "Pumps Paused");
    assert_eq!(app.pump_state(), PumpState::Idle);
    assert_eq!(send(&mut app, &mut board, &mut sink, r#"{"type":"RESUME"}"#)["message"], "Pumps Resumed");
    assert_eq!(app.pump_state(), PumpState::Idle);

    send(&mut app, &mut board, &mut sink, r#"{"type":"PUMP","run_pumps":[{"id":0,"for":5}]}"#);
    app.on_order_tick(&mut board, &mut sink);
    send(&mut app, &mut board, &mut sink, r#"{"type":"PAUSE"}"#);
    send(&mut app, &mut board, &mut sink, r#"{"type":"PAUSE"}"#);
    assert_eq!(app.pump_state(), PumpState::Paused);
    send(&mut app, &mut board, &mut sink, r#"{"type":"RESUME"}"#);
    send(&mut app, &mut board, &mut sink, r#"{"type":"RESUME"}"#);
    assert_eq!(app.pump_state(), PumpState::Executing);
    assert_eq!(board.running(), vec![0]);
}

#[test]
fn clear_stops_everything() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    send(&mut app, &mut board, &mut sink, r#"{"type":"PUMP","run_pumps":[{"id":0,"for":9},{"id":23,"for":9}]}"#);
    app.on_order_tick(&mut board, &mut sink);
    send(&mut app, &mut board, &mut sink, r#"{"type":"PAUSE"}"#);

    let reply = send(&mut app, &mut board, &mut sink, r#"{"type":"CLEAR"}"#);
    assert_eq!(reply, serde_json::json!({"status": 0, "message": "All Pumps reset"}));
    assert_eq!(app.pump_state(), PumpState::Idle);
    assert!(board.outputs_enabled());
    assert!(board.running().is_empty());
    assert!(app.bank().running_secs().iter().all(|&s| s == 0));
}

#[test]
fn pump_rejected_while_busy_stays_queued() {
    let config = SystemConfig { position_count: 2, ..SystemConfig::default() };
    let (mut app, mut board, mut sink) = make_app(config);
    send(&mut app, &mut board, &mut sink, r#"{"type":"PUMP","run_pumps":[{"id":0,"for":1}]}"#);
    send(&mut app, &mut board, &mut sink, r#"{"type":"PUMP","run_pumps":[{"id":1,"for":1}]}"#);
    app.on_order_tick(&mut board, &mut sink);

    send(&mut app, &mut board, &mut sink, r#"{"type":"PAUSE"}"#);
    assert_eq!(app.on_order_tick(&mut board, &mut sink), None);
    assert_eq!(app.scheduler().queue().len(), 1);

    send(&mut app, &mut board, &mut sink, r#"{"type":"RESUME"}"#);
    app.on_pump_tick(&mut board, &mut sink);
    let next = app.on_order_tick(&mut board, &mut sink).unwrap();
    assert_eq!(next.position, 1);
    assert_eq!(board.running(), vec![1]);
}

// ── AT passthrough ────────────────────────────────────────────

#[test]
fn at_command_is_forwarded_and_reply_echoed() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    let mut radio = MockRadio::new().reply_with(b"OK+Set:1");

    let status = app.execute(br#"{"type":"AT","at_cmd":"AT+NOTI1"}"#, &mut board, &mut radio, &mut sink);
    assert!(status.is_success());
    assert_eq!(status.message(), "[AT+NOTI1] response: [OK+Set:1]");
    assert_eq!(radio.sent_text(), "AT+NOTI1");
    assert!(sink.contains(&AppEvent::CommandHandled { command: "AT", code: StatusCode::Success }));
}

#[test]
fn at_command_with_silent_radio_echoes_empty_reply() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    let mut radio = MockRadio::new();
    let status = app.execute(br#"{"type":"AT","at_cmd":"AT+VERS?"}"#, &mut board, &mut radio, &mut sink);
    assert_eq!(status.message(), "[AT+VERS?] response: []");
}

#[test]
fn at_command_requires_payload() {
    let (mut app, mut board, mut sink) = make_app(SystemConfig::default());
    let mut radio = MockRadio::new();
    let status = app.execute(br#"{"type":"AT"}"#, &mut board, &mut radio, &mut sink);
    assert_eq!(status.code(), StatusCode::JsonMissingAttribute);
    assert_eq!(status.message(), "Missing attribute: at_cmd");
    assert!(radio.sent.is_empty());
}
