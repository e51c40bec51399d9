//! Transport abstraction for any byte-oriented serial channel.
//!
//! Concrete implementations:
//! - HM-11 BLE serial bridge (UART1)
//! - USB / debug console (UART0)
//!
//! The command loop and the AT passthrough are generic over `Transport`,
//! so adding a link requires no changes to either.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;

    /// Wait up to `timeout_ms` for input, then copy whatever is buffered
    /// into `buf`.  Returns 0 if nothing arrived in time.
    fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;
}

/// A null transport that discards all writes and never reads.
/// Stands in for the radio when only the debug link is wired.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        false
    }

    fn read_available(&mut self, _buf: &mut [u8], _timeout_ms: u32) -> Result<usize, ()> {
        Ok(0)
    }
}
