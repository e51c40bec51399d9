//! Hardware timer module using ESP-IDF's esp_timer API.
//!
//! Creates periodic timers that push events into the lock-free MPMC queue.
//! On simulation targets, the main loop synthesizes the same events from
//! a sleep loop.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call push_event() alongside the presence ISR.

use crate::config::SystemConfig;

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
static mut PUMP_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut ORDER_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut HEARTBEAT_TIMER: esp_timer_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn pump_tick_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::PumpTick);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn order_tick_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::OrderTick);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn heartbeat_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::HeartbeatTick);
}

/// Create and start one periodic timer.  Returns `false` on failure.
///
/// SAFETY: `handle` must point at one of the timer statics above, written
/// only from the boot path before its callback can fire.
#[cfg(target_os = "espidf")]
unsafe fn start_periodic(
    handle: *mut esp_timer_handle_t,
    callback: unsafe extern "C" fn(*mut core::ffi::c_void),
    name: &'static [u8],
    period_ms: u32,
) -> bool {
    let args = esp_timer_create_args_t {
        callback: Some(callback),
        arg: core::ptr::null_mut(),
        dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
        name: name.as_ptr() as *const _,
        skip_unhandled_events: true,
    };
    unsafe {
        let ret = esp_timer_create(&args, handle);
        if ret != ESP_OK {
            log::error!("hw_timer: create failed (rc={})", ret);
            return false;
        }
        let ret = esp_timer_start_periodic(*handle, u64::from(period_ms) * 1_000);
        if ret != ESP_OK {
            log::error!("hw_timer: start failed (rc={})", ret);
            return false;
        }
    }
    true
}

/// Start the hardware tick timers.
///
/// - pump countdown (default 1 Hz)
/// - order scheduler (default 250 ms)
/// - heartbeat LED (default 250 ms)
#[cfg(target_os = "espidf")]
pub fn start_timers(cfg: &SystemConfig) {
    // SAFETY: the timer statics are written here once at boot from the
    // single main-task context before any timer callbacks fire.
    unsafe {
        let pump = start_periodic(&raw mut PUMP_TIMER, pump_tick_cb, b"pump\0", cfg.pump_tick_interval_ms);
        let order = start_periodic(&raw mut ORDER_TIMER, order_tick_cb, b"order\0", cfg.order_tick_interval_ms);
        let beat = start_periodic(&raw mut HEARTBEAT_TIMER, heartbeat_cb, b"beat\0", cfg.heartbeat_interval_ms);
        info!(
            "hw_timer: pump@{}ms({}) order@{}ms({}) heartbeat@{}ms({})",
            cfg.pump_tick_interval_ms, pump,
            cfg.order_tick_interval_ms, order,
            cfg.heartbeat_interval_ms, beat,
        );
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn start_timers(cfg: &SystemConfig) {
    log::info!(
        "hw_timer(sim): timers not started (pump={}ms order={}ms driven by sleep loop)",
        cfg.pump_tick_interval_ms,
        cfg.order_tick_interval_ms
    );
}

/// Stop all hardware tick timers.
#[cfg(target_os = "espidf")]
pub fn stop_timers() {
    // SAFETY: handles are either null or valid from start_timers(); only
    // the main task calls this.
    unsafe {
        for t in [PUMP_TIMER, ORDER_TIMER, HEARTBEAT_TIMER] {
            if !t.is_null() {
                esp_timer_stop(t);
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_timers() {}
