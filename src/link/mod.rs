//! Serial command links.
//!
//! ```text
//!   UART ──▶ Transport ──▶ read_frame ──▶ command bytes ──▶ DispenserService
//!                 ▲                                              │
//!                 └──────────── write_all(response) ◀────────────┘
//! ```
//!
//! A frame is whatever arrives before the line goes quiet for the
//! inter-byte gap; there is no length prefix or delimiter on the wire.

pub mod at;
pub mod transport;

use log::debug;

use crate::error::LinkError;
use transport::Transport;

/// Collect one frame into `buf`.
///
/// Waits up to `first_wait_ms` for the first bytes, then keeps reading
/// until `gap_ms` passes with no new data or `buf` is full.  Bytes past
/// the end of `buf` stay in the transport.
pub fn read_frame(
    link: &mut impl Transport,
    buf: &mut [u8],
    first_wait_ms: u32,
    gap_ms: u32,
) -> Result<usize, LinkError> {
    let mut len = 0;
    let mut wait = first_wait_ms;
    while len < buf.len() {
        let n = link.read_available(&mut buf[len..], wait).map_err(|e| {
            debug!("link: read failed: {:?}", e);
            LinkError::ReadFailed
        })?;
        if n == 0 {
            break;
        }
        len += n;
        wait = gap_ms;
    }
    Ok(len)
}

/// Write all of `data`, then flush.
pub fn write_all(link: &mut impl Transport, mut data: &[u8]) -> Result<(), LinkError> {
    while !data.is_empty() {
        match link.write(data) {
            Ok(0) => return Err(LinkError::WriteFailed),
            Ok(n) => data = &data[n.min(data.len())..],
            Err(e) => {
                debug!("link: write failed: {:?}", e);
                return Err(LinkError::WriteFailed);
            }
        }
    }
    link.flush().map_err(|_| LinkError::WriteFailed)
}
