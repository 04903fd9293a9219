//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zprog_core::protocol::defaults;
use zprog_core::Framing;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "zprog")]
#[command(author, version, about = "Serial EPROM programmer driver", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level selected by the `-v` count
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Connection options shared by every device command
#[derive(clap::Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Programmer to use, e.g. `zprog:dev=/dev/ttyACM0` or `dummy`
    #[arg(short, long, help = programmer_help())]
    pub programmer: String,

    /// Read timeout in seconds
    #[arg(long, default_value_t = defaults::TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Number of boot banner lines to drain before sending commands
    #[arg(long, default_value_t = defaults::BOOT_LINES)]
    pub boot_lines: usize,

    /// Bytes per read/write block
    #[arg(long, default_value_t = defaults::BLOCK_SIZE)]
    pub block_size: u16,

    /// Reply framing spoken by the firmware (sentinel or length)
    #[arg(long, default_value_t = Framing::Sentinel)]
    pub framing: Framing,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bring-up sequence: identify, dump, erase, write test pattern, dump
    Script {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Show the device id
    Info {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// Print a hex dump of EPROM contents
    Dump {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Start address (hex, e.g., 0x100)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Number of bytes to dump (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32, default_value = "256")]
        length: u32,
    },

    /// Read EPROM contents to file
    Read {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex, e.g., 0x100)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Number of bytes to read (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        length: u32,
    },

    /// Write file to EPROM
    Write {
        #[command(flatten)]
        connect: ConnectArgs,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex, e.g., 0x100)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Verify after writing
        #[arg(long)]
        verify: bool,
    },

    /// Erase the EPROM
    Erase {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// List supported programmers
    ListProgrammers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x100"), Ok(0x100));
        assert_eq!(parse_hex_u32("0XfF"), Ok(0xFF));
        assert_eq!(parse_hex_u32("256"), Ok(256));
        assert!(parse_hex_u32("0xzz").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["zprog", "script", "-p", "dummy"]).unwrap();
        match cli.command {
            Commands::Script { connect } => {
                assert_eq!(connect.programmer, "dummy");
                assert_eq!(connect.timeout, 11);
                assert_eq!(connect.boot_lines, 6);
                assert_eq!(connect.block_size, 16);
                assert_eq!(connect.framing, Framing::Sentinel);
            }
            _ => panic!("expected script command"),
        }
    }

    #[test]
    fn test_verbosity_sets_log_level() {
        let level = |args: &[&str]| {
            Cli::try_parse_from(args.iter().copied())
                .unwrap()
                .log_level()
        };
        assert_eq!(level(&["zprog", "list-programmers"]), log::LevelFilter::Info);
        assert_eq!(
            level(&["zprog", "-v", "list-programmers"]),
            log::LevelFilter::Debug
        );
        assert_eq!(
            level(&["zprog", "list-programmers", "-vv"]),
            log::LevelFilter::Trace
        );
        assert_eq!(
            level(&["zprog", "-vvv", "list-programmers"]),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_debug_filter_enables_debug_records() {
        use log::Log;

        let cli = Cli::try_parse_from(["zprog", "-v", "list-programmers"]).unwrap();
        let logger = env_logger::Builder::new()
            .parse_filters(cli.log_level().as_str())
            .build();
        let debug = log::Metadata::builder()
            .level(log::Level::Debug)
            .target("zprog_core::device")
            .build();
        let trace = log::Metadata::builder()
            .level(log::Level::Trace)
            .target("zprog_core::device")
            .build();
        assert!(logger.enabled(&debug));
        assert!(!logger.enabled(&trace));
    }

    #[test]
    fn test_dump_args() {
        let cli = Cli::try_parse_from([
            "zprog",
            "dump",
            "-p",
            "zprog:dev=/dev/ttyACM0",
            "--start",
            "0x10",
            "--length",
            "32",
            "--framing",
            "length",
        ])
        .unwrap();
        match cli.command {
            Commands::Dump {
                connect,
                start,
                length,
            } => {
                assert_eq!(start, 0x10);
                assert_eq!(length, 32);
                assert_eq!(connect.framing, Framing::LengthPrefixed);
            }
            _ => panic!("expected dump command"),
        }
    }
}
