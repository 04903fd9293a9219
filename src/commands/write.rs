//! Write command implementation

use super::create_progress_bar;
use super::read::read_with_progress;
use std::path::Path;
use zprog_core::{Transport, Zprog};

/// Run the write command
pub fn run_write<T: Transport>(
    zp: &mut Zprog<T>,
    input: &Path,
    start: u32,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    if data.is_empty() {
        return Err(format!("Input file {:?} is empty", input).into());
    }

    println!("Writing {} bytes at 0x{:08X}", data.len(), start);
    write_with_progress(zp, start, &data)?;

    if verify {
        let actual = read_with_progress(zp, start, data.len())?;
        check_match(start, &data, &actual)?;
        println!("Verification passed!");
    }

    Ok(())
}

/// Write a range with progress bar
pub fn write_with_progress<T: Transport>(
    zp: &mut Zprog<T>,
    start: u32,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = create_progress_bar(data.len() as u64, "Writing")?;
    zp.write_range(start, data, |done| pb.set_position(done as u64))?;
    pb.finish_with_message("Write complete");
    Ok(())
}

/// Compare read-back data, reporting the first differing address
pub fn check_match(start: u32, expected: &[u8], actual: &[u8]) -> Result<(), String> {
    if let Some(i) = expected.iter().zip(actual).position(|(e, a)| e != a) {
        return Err(format!(
            "Verification failed at 0x{:08X}: expected 0x{:02X}, found 0x{:02X}",
            start as usize + i,
            expected[i],
            actual[i]
        ));
    }
    if expected.len() != actual.len() {
        return Err(format!(
            "Verification failed: expected {} bytes, read {}",
            expected.len(),
            actual.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_match() {
        assert!(check_match(0, &[1, 2, 3], &[1, 2, 3]).is_ok());

        let err = check_match(0x100, &[1, 2, 3], &[1, 9, 3]).unwrap_err();
        assert!(err.contains("0x00000101"));

        assert!(check_match(0, &[1, 2], &[1]).is_err());
    }
}
