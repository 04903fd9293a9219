//! Erase command implementation

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use zprog_core::{Transport, Zprog};

/// Run the erase command
pub fn run_erase<T: Transport>(zp: &mut Zprog<T>) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Erasing device (this may take a while)...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = zp.erase();
    match &result {
        Ok(()) => pb.finish_with_message("Erase complete"),
        Err(_) => pb.abandon_with_message("Erase failed"),
    }
    result?;

    Ok(())
}
