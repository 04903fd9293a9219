//! CLI command implementations
//!
//! Every command runs on a `Zprog` session that has already drained the boot
//! banner and configured the block size. Commands are generic over the
//! transport so they run unchanged against the emulator in tests.

pub mod dump;
pub mod erase;
mod list;
pub mod read;
pub mod script;
pub mod write;

pub use list::list_programmers;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a byte progress bar labelled with the current phase
pub(crate) fn create_progress_bar(
    total: u64,
    phase: &str,
) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
