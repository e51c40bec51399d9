//! Barvis Firmware: Main Entry Point
//!
//! Hexagonal architecture with event-driven execution.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspGpio        UartTransport ×2     LogEventSink   BoardDelay │
//! │  (GpioPort)     (radio + debug)      (EventSink)    (DelayNs)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            DispenserService (pure logic)               │    │
//! │  │  JSON · Commands · OrderScheduler · PumpBank · Rail    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Timers + presence ISR ──▶ lock-free event queue ──▶ loop      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info, warn};

#[cfg(target_os = "espidf")]
use barvis::adapters::delay::BoardDelay;
use barvis::adapters::hardware::EspGpio;
use barvis::adapters::log_sink::LogEventSink;
use barvis::adapters::uart::UartTransport;
use barvis::app::service::DispenserService;
use barvis::config::SystemConfig;
use barvis::drivers::heartbeat_led::HeartbeatLed;
use barvis::drivers::{hw_init, hw_timer, presence_sensor};
use barvis::events::{self, Event};
use barvis::link::at::{self, AtTimings};
use barvis::link::transport::Transport;
use barvis::link::{read_frame, write_all};
use barvis::pins;

// ── Command polling ───────────────────────────────────────────

/// Read one frame from `link` if anything is waiting, execute it and
/// answer on the same link.  AT commands go to `radio`, or to `link`
/// itself when `radio` is `None`.
fn serve(
    link: &mut UartTransport,
    radio: Option<&mut UartTransport>,
    frame: &mut [u8],
    app: &mut DispenserService,
    gpio: &mut EspGpio,
    sink: &mut LogEventSink,
) {
    if !link.available() {
        return;
    }
    let gap = app.config().read_gap_ms;
    let len = match read_frame(link, frame, gap, gap) {
        Ok(0) => return,
        Ok(n) => n,
        Err(e) => {
            warn!("UART{}: {}", link.port(), e);
            return;
        }
    };

    let status = match radio {
        Some(radio) => app.execute(&frame[..len], gpio, radio, sink),
        None => app.execute(&frame[..len], gpio, link, sink),
    };

    match status.to_json() {
        Ok(reply) => {
            if let Err(e) = write_all(link, reply.as_bytes()) {
                warn!("UART{}: reply dropped: {}", link.port(), e);
            }
        }
        Err(e) => error!("response encoding failed: {}", e),
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Barvis v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate()?;

    // ── 3. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without GPIO and UART there is nothing useful to do.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {}, continuing without presence sensor", e);
    }

    let mut gpio = EspGpio::new();
    let mut log_sink = LogEventSink::new();
    let mut radio = UartTransport::new(pins::RADIO_UART_PORT);
    let mut console = UartTransport::new(pins::DEBUG_UART_PORT);
    let mut heartbeat = HeartbeatLed::new(pins::DEBUG_LED_GPIO);

    // ── 4. Radio bring-up ─────────────────────────────────────
    at::init_radio(&mut radio, &config.radio_name, AtTimings::from_config(&config));

    // ── 5. Application service ────────────────────────────────
    let mut app = DispenserService::new(config.clone());
    app.start(&mut gpio, &mut log_sink);

    #[cfg(target_os = "espidf")]
    match app.calibrate_carriage(&mut gpio, &mut BoardDelay::new(), &mut log_sink) {
        Ok(max_steps) => info!("Carriage ready, {} steps end to end", max_steps),
        Err(e) => error!("Carriage calibration failed: {}, position commands disabled", e),
    }
    #[cfg(not(target_os = "espidf"))]
    info!("Carriage calibration skipped (no limit switches in simulation)");

    // ── 6. Timers ─────────────────────────────────────────────
    hw_timer::start_timers(&config);

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    let mut frame = vec![0u8; config.command_buffer_size];
    #[cfg(not(target_os = "espidf"))]
    let mut sim_elapsed_ms: u32 = 0;

    loop {
        // Simulate timer callbacks via sleep on non-espidf targets.
        #[cfg(not(target_os = "espidf"))]
        {
            std::thread::sleep(std::time::Duration::from_millis(u64::from(
                config.order_tick_interval_ms,
            )));
            events::push_event(Event::OrderTick);
            events::push_event(Event::HeartbeatTick);
            sim_elapsed_ms += config.order_tick_interval_ms;
            if sim_elapsed_ms >= config.pump_tick_interval_ms {
                sim_elapsed_ms = 0;
                events::push_event(Event::PumpTick);
            }
        }

        // Command links: radio first, then the debug console.
        serve(&mut radio, None, &mut frame, &mut app, &mut gpio, &mut log_sink);
        serve(&mut console, Some(&mut radio), &mut frame, &mut app, &mut gpio, &mut log_sink);

        events::drain_events(|event| match event {
            Event::PumpTick => app.on_pump_tick(&mut gpio, &mut log_sink),
            Event::OrderTick => {
                app.on_order_tick(&mut gpio, &mut log_sink);
            }
            Event::PresenceChanged => {
                app.on_bank_presence(presence_sensor::is_present(), &mut gpio, &mut log_sink);
            }
            Event::HeartbeatTick => heartbeat.toggle(&mut gpio),
        });

        // Yield to the idle task between polls.
        #[cfg(target_os = "espidf")]
        std::thread::sleep(std::time::Duration::from_millis(u64::from(config.read_gap_ms)));
    }
}
