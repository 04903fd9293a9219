//! Hex dump command implementation

use std::io::Write;
use zprog_core::{Transport, Zprog};

/// Bytes shown per dump line
const BYTES_PER_LINE: usize = 16;

/// Format one dump line: address followed by space-separated hex bytes
pub fn format_line(addr: u32, bytes: &[u8]) -> String {
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
    format!("0x{:08X}: {}", addr, hex.join(" "))
}

/// Read `length` bytes from `start` and print them as a hex dump
pub fn print_dump<T: Transport, W: Write>(
    zp: &mut Zprog<T>,
    start: u32,
    length: usize,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = zp.read_range(start, length, |_| {})?;

    for (i, line) in data.chunks(BYTES_PER_LINE).enumerate() {
        let addr = start.wrapping_add((i * BYTES_PER_LINE) as u32);
        writeln!(out, "{}", format_line(addr, line))?;
    }

    Ok(())
}

/// Run the dump command
pub fn run_dump<T: Transport>(
    zp: &mut Zprog<T>,
    start: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    print_dump(zp, start, length as usize, &mut stdout.lock())
}
