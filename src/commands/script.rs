//! Bring-up sequence
//!
//! Identifies the device, dumps the first 256 bytes, erases, writes one
//! block of 0xAA at 0x00 and one of 0x55 right after it, then dumps again.
//! The block size is 16 unless the session already has one.

use super::dump::print_dump;
use std::io::Write;
use zprog_core::protocol::defaults;
use zprog_core::{Transport, Zprog};

/// Bytes dumped before and after programming
const DUMP_LEN: usize = 256;

/// Run the bring-up sequence, printing to `out`
pub fn run_script_to<T: Transport, W: Write>(
    zp: &mut Zprog<T>,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = zp.identify()?;
    writeln!(out, "Device ID: {}", id)?;

    // Keep a block size the caller already configured
    let size = match zp.block_size() {
        Some(size) => size,
        None => {
            zp.set_block_size(defaults::BLOCK_SIZE)?;
            defaults::BLOCK_SIZE
        }
    };
    let block = u32::from(size);

    print_dump(zp, 0, DUMP_LEN, out)?;

    zp.erase()?;

    zp.seek(0)?;
    zp.fill_block(0xAA)?;
    zp.seek(block)?;
    zp.fill_block(0x55)?;

    writeln!(out)?;
    print_dump(zp, 0, DUMP_LEN, out)?;

    Ok(())
}

/// Run the bring-up sequence on stdout
pub fn run_script<T: Transport>(zp: &mut Zprog<T>) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    run_script_to(zp, &mut stdout.lock())
}
