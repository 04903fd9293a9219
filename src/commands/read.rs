//! Read command implementation

use super::create_progress_bar;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zprog_core::{Transport, Zprog};

/// Run the read command
pub fn run_read<T: Transport>(
    zp: &mut Zprog<T>,
    output: &Path,
    start: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_with_progress(zp, start, length as usize)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);

    Ok(())
}

/// Read a range with progress bar
pub fn read_with_progress<T: Transport>(
    zp: &mut Zprog<T>,
    start: u32,
    length: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let pb = create_progress_bar(length as u64, "Reading")?;
    let data = zp.read_range(start, length, |done| pb.set_position(done as u64))?;
    pb.finish_with_message("Read complete");
    Ok(data)
}
