//! AT exchange with the HM-11 style BLE serial bridge.
//!
//! Used twice: the boot-time bring-up sequence, and the `AT` command type
//! that forwards an arbitrary command from a client and echoes the reply.

use log::{debug, info, warn};

use super::transport::Transport;
use super::write_all;
use crate::config::SystemConfig;
use crate::error::LinkError;

/// Commands sent to the bridge at boot, in order.  The advertised name
/// is sent last as `AT+NAME<name>`.
pub const RADIO_INIT_SEQUENCE: [&str; 6] = [
    "AT",
    "AT+NOTI0",
    "AT+ROLE0",
    "AT+RESET",
    "AT+SHOW1",
    "AT+IMME1",
];

/// Bounded waits for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtTimings {
    /// Longest wait for the first reply byte.
    pub response_timeout_ms: u32,
    /// Wait after the first bytes, for modules that answer in bursts.
    pub settle_ms: u32,
    /// Silence that ends the reply.
    pub gap_ms: u32,
}

impl AtTimings {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            response_timeout_ms: cfg.at_response_timeout_ms,
            settle_ms: cfg.at_settle_ms,
            gap_ms: cfg.read_gap_ms,
        }
    }
}

/// Send `cmd` verbatim and collect the reply into `reply`.
///
/// Returns the reply length; 0 means the bridge stayed silent for the
/// whole response timeout.
pub fn exchange(
    radio: &mut impl Transport,
    cmd: &[u8],
    reply: &mut [u8],
    timings: AtTimings,
) -> Result<usize, LinkError> {
    write_all(radio, cmd)?;

    let mut len = 0;
    let mut wait = timings.response_timeout_ms;
    while len < reply.len() {
        let n = radio
            .read_available(&mut reply[len..], wait)
            .map_err(|_| LinkError::ReadFailed)?;
        if n == 0 {
            break;
        }
        wait = if len == 0 { timings.settle_ms.max(timings.gap_ms) } else { timings.gap_ms };
        len += n;
    }
    debug!("AT: {} byte reply", len);
    Ok(len)
}

/// Run the bring-up sequence, finishing with `AT+NAME<name>`.
///
/// A silent or failed step is logged and the sequence continues; the
/// bridge keeps its previous settings for that step.  Returns the number
/// of steps that produced a reply.
pub fn init_radio(radio: &mut impl Transport, name: &str, timings: AtTimings) -> usize {
    let mut reply = [0u8; 64];
    let mut answered = 0;

    let mut name_cmd: heapless::String<32> = heapless::String::new();
    if name_cmd.push_str("AT+NAME").is_err() || name_cmd.push_str(name).is_err() {
        warn!("radio: name '{}' too long, keeping module default", name);
        name_cmd.clear();
    }

    let steps = RADIO_INIT_SEQUENCE
        .iter()
        .copied()
        .chain((!name_cmd.is_empty()).then_some(name_cmd.as_str()));

    for cmd in steps {
        match exchange(radio, cmd.as_bytes(), &mut reply, timings) {
            Ok(0) => warn!("radio: no reply to {}", cmd),
            Ok(n) => {
                answered += 1;
                debug!("radio: {} -> {}", cmd, String::from_utf8_lossy(&reply[..n]));
            }
            Err(e) => warn!("radio: {} failed: {}", cmd, e),
        }
    }
    info!("radio: bring-up done, {} step(s) answered", answered);
    answered
}
