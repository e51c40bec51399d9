//! UART transport for the radio bridge and the debug console.
//!
//! Both links are plain byte streams, so one adapter serves both; it is
//! parameterized by the UART port configured in `hw_init`.
//!
//! - **`target_os = "espidf"`**: wraps the ESP-IDF UART driver
//!   (`uart_write_bytes` / `uart_read_bytes`).
//! - **`not(target_os = "espidf")`**: in-memory buffers fed with
//!   [`UartTransport::sim_inject`], for host runs and tests.

use crate::link::transport::Transport;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    /// Driver call returned an error code.
    Driver(i32),
}

impl core::fmt::Display for UartError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Driver(rc) => write!(f, "UART driver error (rc={})", rc),
        }
    }
}

// ── Adapter ──────────────────────────────────────────────────

pub struct UartTransport {
    port: i32,
    #[cfg(not(target_os = "espidf"))]
    rx: std::collections::VecDeque<u8>,
    #[cfg(not(target_os = "espidf"))]
    tx: Vec<u8>,
}

impl UartTransport {
    /// Transport over a UART whose driver `hw_init` already installed.
    pub fn new(port: i32) -> Self {
        Self {
            port,
            #[cfg(not(target_os = "espidf"))]
            rx: std::collections::VecDeque::new(),
            #[cfg(not(target_os = "espidf"))]
            tx: Vec::new(),
        }
    }

    pub fn port(&self) -> i32 {
        self.port
    }

    /// Queue bytes as if they had arrived on the wire.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_inject(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// Take everything written so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_take_output(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }
}

#[cfg(target_os = "espidf")]
fn ms_to_ticks(ms: u32) -> TickType_t {
    esp_idf_hal::delay::TickType::new_millis(u64::from(ms)).ticks()
}

#[cfg(target_os = "espidf")]
impl Transport for UartTransport {
    type Error = UartError;

    fn write(&mut self, data: &[u8]) -> Result<usize, UartError> {
        // SAFETY: the driver for `port` was installed at boot; the buffer
        // outlives the call, which copies into the driver's TX FIFO.
        let n = unsafe { uart_write_bytes(self.port, data.as_ptr() as *const _, data.len()) };
        if n < 0 {
            return Err(UartError::Driver(n));
        }
        Ok(n as usize)
    }

    fn flush(&mut self) -> Result<(), UartError> {
        // SAFETY: see `write`.
        let ret = unsafe { uart_wait_tx_done(self.port, ms_to_ticks(100)) };
        if ret != ESP_OK as i32 {
            return Err(UartError::Driver(ret));
        }
        Ok(())
    }

    fn available(&self) -> bool {
        let mut len: usize = 0;
        // SAFETY: writes one usize through a valid pointer.
        let ret = unsafe { uart_get_buffered_data_len(self.port, &mut len) };
        ret == ESP_OK as i32 && len > 0
    }

    fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError> {
        if buf.is_empty() {
            return Ok(0);
        }
        // Wait for the first byte, then take whatever else is buffered.
        // SAFETY: `buf` is valid for `buf.len()` bytes for the whole call.
        let first = unsafe { uart_read_bytes(self.port, buf.as_mut_ptr() as *mut _, 1, ms_to_ticks(timeout_ms)) };
        if first < 0 {
            return Err(UartError::Driver(first));
        }
        if first == 0 {
            return Ok(0);
        }
        let rest = &mut buf[1..];
        if rest.is_empty() {
            return Ok(1);
        }
        // SAFETY: as above.
        let more = unsafe { uart_read_bytes(self.port, rest.as_mut_ptr() as *mut _, rest.len() as u32, 0) };
        Ok(1 + more.max(0) as usize)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Transport for UartTransport {
    type Error = UartError;

    fn write(&mut self, data: &[u8]) -> Result<usize, UartError> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), UartError> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.is_empty()
    }

    fn read_available(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, UartError> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}
