//! Reply framing
//!
//! A reply is one status byte, followed by a payload only when the status is
//! [`S_OK`]. Two payload framings exist:
//!
//! - [`Framing::Sentinel`]: payload bytes terminated by `@`. This is what
//!   current firmware emits. The payload must never contain `@`.
//! - [`Framing::LengthPrefixed`]: a 16-bit little-endian length followed by
//!   exactly that many payload bytes.

use crate::error::{Result, ZprogError};
use crate::protocol::{S_OK, SENTINEL};
use crate::transport::Transport;
use core::fmt;
use core::str::FromStr;

/// Payload framing used by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// `@`-terminated payloads
    #[default]
    Sentinel,
    /// u16 LE length prefix
    LengthPrefixed,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Sentinel => write!(f, "sentinel"),
            Framing::LengthPrefixed => write!(f, "length"),
        }
    }
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "sentinel" => Ok(Framing::Sentinel),
            "length" | "length-prefixed" => Ok(Framing::LengthPrefixed),
            _ => Err(format!(
                "Unknown framing: {}. Use 'sentinel' or 'length'",
                s
            )),
        }
    }
}

/// Outcome of one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status was `Z`; payload with framing stripped
    Accepted(String),
    /// Any other status byte
    Rejected {
        /// The status byte received
        status: u8,
    },
}

impl Reply {
    /// Whether the device accepted the command
    pub fn is_accepted(&self) -> bool {
        matches!(self, Reply::Accepted(_))
    }

    /// Payload of an accepted reply
    pub fn payload(&self) -> Option<&str> {
        match self {
            Reply::Accepted(p) => Some(p),
            Reply::Rejected { .. } => None,
        }
    }

    /// Convert a rejection into [`ZprogError::Rejected`] for `opcode`
    pub fn into_payload(self, opcode: u8) -> Result<String> {
        match self {
            Reply::Accepted(p) => Ok(p),
            Reply::Rejected { status } => Err(ZprogError::Rejected {
                opcode: opcode as char,
                status,
            }),
        }
    }
}

/// Read one reply from the transport
pub fn read_reply<T: Transport + ?Sized>(transport: &mut T, framing: Framing) -> Result<Reply> {
    let status = transport.read_byte()?.ok_or(ZprogError::Timeout)?;

    if status != S_OK {
        log::debug!("zprog: <- status 0x{:02X} (rejected)", status);
        return Ok(Reply::Rejected { status });
    }

    let payload = match framing {
        Framing::Sentinel => {
            let mut buf = Vec::new();
            if !transport.read_until(SENTINEL, &mut buf)? {
                return Err(ZprogError::Unterminated { partial: buf });
            }
            buf.pop();
            buf
        }
        Framing::LengthPrefixed => {
            let mut len_buf = [0u8; 2];
            let got = transport.read_full(&mut len_buf)?;
            if got != len_buf.len() {
                return Err(ZprogError::Truncated { expected: 2, got });
            }
            let len = u16::from_le_bytes(len_buf) as usize;
            let mut buf = vec![0u8; len];
            let got = transport.read_full(&mut buf)?;
            if got != len {
                return Err(ZprogError::Truncated { expected: len, got });
            }
            buf
        }
    };

    let text = String::from_utf8(payload)?;
    log::debug!("zprog: <- Z {:?}", text);
    Ok(Reply::Accepted(text))
}

/// Encode an accepted reply for the given framing
///
/// Fails if a sentinel-framed payload contains the sentinel byte or a
/// length-framed payload exceeds 65535 bytes.
pub fn encode_accepted(framing: Framing, payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() + 3);
    out.push(S_OK);
    match framing {
        Framing::Sentinel => {
            if payload.contains(&SENTINEL) {
                return Err(ZprogError::InvalidPayload(
                    "payload contains the sentinel byte".into(),
                ));
            }
            out.extend_from_slice(payload);
            out.push(SENTINEL);
        }
        Framing::LengthPrefixed => {
            let len = u16::try_from(payload.len()).map_err(|_| {
                ZprogError::InvalidPayload(format!("payload too long: {} bytes", payload.len()))
            })?;
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(payload);
        }
    }
    Ok(out)
}
