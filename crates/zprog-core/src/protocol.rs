//! zprog protocol constants and command catalog
//!
//! Every command on the wire is the prefix byte `z` followed by an ASCII body
//! whose first character selects the sub-command. Numeric arguments are
//! fixed-width hex; block data travels as two hex digits per byte.

use crate::error::{Result, ZprogError};

/// Prefix byte sent before every command body
pub const CMD_PREFIX: u8 = b'z';

/// Status byte for an accepted command
pub const S_OK: u8 = b'Z';
/// Status byte the emulator uses for a rejected command
///
/// Any status other than [`S_OK`] is a rejection.
pub const S_FAIL: u8 = b'!';

/// Terminator of a sentinel-framed payload
pub const SENTINEL: u8 = b'@';

// Sub-command opcodes
/// Identify device
pub const OP_IDENTIFY: u8 = b'i';
/// Set data block size (4 hex digits)
pub const OP_BLOCK_SIZE: u8 = b'd';
/// Seek to address (8 hex digits)
pub const OP_SEEK: u8 = b's';
/// Read one block at the cursor
pub const OP_READ: u8 = b'R';
/// Erase the whole device (magic confirmation follows)
pub const OP_ERASE: u8 = b'E';
/// Write one block at the cursor
pub const OP_WRITE: u8 = b'w';

/// Confirmation sequence required by the erase command
pub const ERASE_MAGIC: &str = "a5a5a5a5";

/// Largest block size the firmware accepts
pub const MAX_BLOCK_SIZE: u16 = 128;

/// Serial defaults used by the firmware
pub mod defaults {
    use std::time::Duration;

    /// Baud rate of the firmware's UART
    pub const BAUD: u32 = 57600;
    /// Channel read timeout
    pub const TIMEOUT: Duration = Duration::from_secs(11);
    /// Number of banner lines printed at reset
    pub const BOOT_LINES: usize = 6;
    /// Block size configured by the reference sequence
    pub const BLOCK_SIZE: u16 = 16;
}

/// A protocol command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `i`
    Identify,
    /// `dNNNN`
    SetBlockSize(u16),
    /// `sNNNNNNNN`
    Seek(u32),
    /// `R`
    ReadBlock,
    /// `E` + [`ERASE_MAGIC`]
    Erase,
    /// `w` + hex block data
    WriteBlock(Vec<u8>),
}

impl Command {
    /// Sub-command opcode byte
    pub fn opcode(&self) -> u8 {
        match self {
            Command::Identify => OP_IDENTIFY,
            Command::SetBlockSize(_) => OP_BLOCK_SIZE,
            Command::Seek(_) => OP_SEEK,
            Command::ReadBlock => OP_READ,
            Command::Erase => OP_ERASE,
            Command::WriteBlock(_) => OP_WRITE,
        }
    }

    /// Encode the command body (without the `z` prefix)
    pub fn encode_body(&self) -> String {
        let op = self.opcode() as char;
        match self {
            Command::Identify | Command::ReadBlock => op.to_string(),
            Command::SetBlockSize(size) => format!("{}{:04x}", op, size),
            Command::Seek(addr) => format!("{}{:08x}", op, addr),
            Command::Erase => format!("{}{}", op, ERASE_MAGIC),
            Command::WriteBlock(data) => {
                let mut body = String::with_capacity(1 + data.len() * 2);
                body.push(op);
                body.push_str(&encode_hex(data));
                body
            }
        }
    }
}

/// Number of body bytes following an opcode, for a device with the given block size
///
/// Returns `None` for unknown opcodes.
pub fn body_len(opcode: u8, block_size: u16) -> Option<usize> {
    match opcode {
        OP_IDENTIFY | OP_READ => Some(0),
        OP_BLOCK_SIZE => Some(4),
        OP_SEEK => Some(8),
        OP_ERASE => Some(ERASE_MAGIC.len()),
        OP_WRITE => Some(block_size as usize * 2),
        _ => None,
    }
}

/// Render bytes as lowercase hex, two digits per byte
pub fn encode_hex(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for b in data {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

/// Parse hex text into bytes
///
/// Case-insensitive. ASCII whitespace between digit pairs is ignored so that
/// spaced dumps decode too.
pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if digits.len() % 2 != 0 {
        return Err(ZprogError::InvalidPayload(format!(
            "odd number of hex digits in {:?}",
            text
        )));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let hi = hex_digit(pair[0]);
            let lo = hex_digit(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
                _ => Err(ZprogError::InvalidPayload(format!(
                    "invalid hex digits in {:?}",
                    text
                ))),
            }
        })
        .collect()
}

fn hex_digit(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

/// Parse a fixed-width hex argument field
pub fn parse_hex_field(field: &[u8]) -> Option<u32> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let s = core::str::from_utf8(field).ok()?;
    u32::from_str_radix(s, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_bodies() {
        assert_eq!(Command::Identify.encode_body(), "i");
        assert_eq!(Command::SetBlockSize(16).encode_body(), "d0010");
        assert_eq!(Command::Seek(0).encode_body(), "s00000000");
        assert_eq!(Command::Seek(0x10).encode_body(), "s00000010");
        assert_eq!(Command::ReadBlock.encode_body(), "R");
        assert_eq!(Command::Erase.encode_body(), "Ea5a5a5a5");
    }

    #[test]
    fn test_write_body_matches_padded_form() {
        // 'w' padded to 33 characters with 'a' is sixteen 0xAA bytes
        let expected = format!("w{}", "a".repeat(32));
        assert_eq!(Command::WriteBlock(vec![0xAA; 16]).encode_body(), expected);

        let expected = format!("w{}", "5".repeat(32));
        assert_eq!(Command::WriteBlock(vec![0x55; 16]).encode_body(), expected);
    }

    #[test]
    fn test_body_len() {
        assert_eq!(body_len(OP_IDENTIFY, 16), Some(0));
        assert_eq!(body_len(OP_BLOCK_SIZE, 16), Some(4));
        assert_eq!(body_len(OP_SEEK, 16), Some(8));
        assert_eq!(body_len(OP_ERASE, 16), Some(8));
        assert_eq!(body_len(OP_WRITE, 16), Some(32));
        assert_eq!(body_len(b'x', 16), None);
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("DEadBEef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(decode_hex("01 02 03").unwrap(), vec![1, 2, 3]);
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
        assert!(decode_hex("abc").is_err());
        assert!(decode_hex("zz").is_err());
    }

    #[test]
    fn test_parse_hex_field() {
        assert_eq!(parse_hex_field(b"0010"), Some(16));
        assert_eq!(parse_hex_field(b"0000FFFF"), Some(0xFFFF));
        assert_eq!(parse_hex_field(b"00g0"), None);
        assert_eq!(parse_hex_field(b"+010"), None);
    }
}
