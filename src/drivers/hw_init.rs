//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions, the presence-sensor interrupt and the two
//! UART links using raw ESP-IDF sys calls.  Called once from `main()`
//! before the event loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    UartInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::UartInitFailed(rc)   => write!(f, "UART init failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

/// UART driver ring-buffer size (bytes).
pub const UART_RX_BUFFER: usize = 2048;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before event loop; single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_uart(pins::RADIO_UART_PORT, pins::RADIO_BAUD, pins::RADIO_TX_GPIO, pins::RADIO_RX_GPIO)?;
        init_uart(pins::DEBUG_UART_PORT, pins::DEBUG_BAUD, UART_PIN_NO_CHANGE, UART_PIN_NO_CHANGE)?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // Limit switches are active HIGH with external pull-downs.
    let switch_pins = [pins::HOME_SWITCH_GPIO, pins::END_SWITCH_GPIO];
    for &pin in &switch_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    let presence_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::PRESENCE_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    let ret = unsafe { gpio_config(&presence_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Host builds read every input LOW: no switch pressed.
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    false
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    // (pin, boot level).  OE and reset are active LOW, so both start HIGH:
    // outputs disabled and register out of reset until the bank starts.
    let output_pins = [
        (pins::PUMP_DATA_GPIO, 0),
        (pins::PUMP_CLOCK_GPIO, 0),
        (pins::PUMP_LATCH_GPIO, 0),
        (pins::PUMP_OE_GPIO, 1),
        (pins::PUMP_RESET_GPIO, 1),
        (pins::CARRIAGE_STEP_GPIO, 0),
        (pins::CARRIAGE_DIR_GPIO, 0),
        (pins::DEBUG_LED_GPIO, 0),
    ];

    for &(pin, level) in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin, level) };
    }

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Main-loop only.
    unsafe { gpio_set_level(pin, if high { 1 } else { 0 }); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── UART ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_uart(port: i32, baud: i32, tx: i32, rx: i32) -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: baud,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    // SAFETY: one-time driver install per port from the boot path.
    unsafe {
        let ret = uart_param_config(port, &cfg);
        if ret != ESP_OK as i32 { return Err(HwInitError::UartInitFailed(ret)); }
        let ret = uart_set_pin(port, tx, rx, UART_PIN_NO_CHANGE, UART_PIN_NO_CHANGE);
        if ret != ESP_OK as i32 { return Err(HwInitError::UartInitFailed(ret)); }
        let ret = uart_driver_install(port, UART_RX_BUFFER as i32, 0, 0, core::ptr::null_mut(), 0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::UartInitFailed(ret));
        }
    }
    info!("hw_init: UART{} @ {} baud", port, baud);
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn presence_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: gpio_get_level is a register read; safe in ISR context.
    let present = unsafe { gpio_get_level(pins::PRESENCE_GPIO) } != 0;
    crate::drivers::presence_sensor::on_edge_from_isr(present);
}

/// Install the GPIO ISR service and register the presence-sensor handler.
/// Call after init_peripherals() and before the event loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable). The handler registered
    // below only stores an atomic and pushes to the lock-free event queue.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        // Seed the level so the first handled event sees a real reading.
        crate::drivers::presence_sensor::seed(gpio_get_level(pins::PRESENCE_GPIO) != 0);

        // Presence sensor: any edge (vessel removed or returned)
        gpio_set_intr_type(pins::PRESENCE_GPIO, gpio_int_type_t_GPIO_INTR_ANYEDGE);
        gpio_isr_handler_add(pins::PRESENCE_GPIO, Some(presence_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::PRESENCE_GPIO);

        info!("hw_init: ISR service installed (presence)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
