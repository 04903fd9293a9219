//! Programmer registration and dispatch
//!
//! A programmer string is a name optionally followed by `:` and options,
//! e.g. `dummy` or `zprog:dev=/dev/ttyACM0:57600`.

use crate::cli::ConnectArgs;
use std::time::Duration;
use zprog_core::{Transport, Zprog, ZprogConnection};

/// Session type used by all commands
pub type Session = Zprog<Box<dyn Transport>>;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory EPROM programmer emulator for testing",
    });

    programmers.push(ProgrammerInfo {
        name: "zprog",
        aliases: &["serial"],
        description: "Programmer over serial/network (dev=<port>[:baud] or ip=<host:port>)",
    });

    programmers
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a name or alias to the primary programmer name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.iter().any(|a| *a == name))
        .map(|p| p.name)
}

/// Split a programmer string into name and options
fn parse_programmer_string(s: &str) -> (&str, &str) {
    match s.split_once(':') {
        Some((name, options)) => (name, options),
        None => (s, ""),
    }
}

/// Open the programmer and bring the device into command mode
///
/// Drains `boot_lines` banner lines and configures the block size.
pub fn open_session(args: &ConnectArgs) -> Result<Session, Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(&args.programmer);
    let timeout = Duration::from_secs(args.timeout);

    let transport: Box<dyn Transport> = match find_programmer(name) {
        #[cfg(feature = "dummy")]
        Some("dummy") => {
            let config = zprog_dummy::DummyConfig {
                framing: args.framing,
                ..Default::default()
            };
            log::info!("Using in-memory emulator ({} bytes)", config.size);
            Box::new(zprog_dummy::DummyEprom::new(config))
        }
        Some("zprog") => ZprogConnection::parse(options)?.open(timeout)?,
        _ => {
            return Err(format!(
                "Unknown programmer: {}. Available: {}",
                name,
                programmer_names_short()
            )
            .into())
        }
    };

    let mut session = Zprog::new(transport, args.framing);
    if args.boot_lines == 0 {
        session.enter_command_mode();
    } else {
        session.drain_banner(args.boot_lines)?;
    }
    session.set_block_size(args.block_size)?;

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        assert_eq!(parse_programmer_string("dummy"), ("dummy", ""));
        assert_eq!(
            parse_programmer_string("zprog:dev=/dev/ttyACM0:57600"),
            ("zprog", "dev=/dev/ttyACM0:57600")
        );
    }

    #[test]
    fn test_find_programmer() {
        assert_eq!(find_programmer("serial"), Some("zprog"));
        assert_eq!(find_programmer("zprog"), Some("zprog"));
        assert_eq!(find_programmer("ch341a"), None);
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_session() {
        use clap::Parser;

        let cli = crate::cli::Cli::try_parse_from(["zprog", "info", "-p", "dummy"]).unwrap();
        let crate::cli::Commands::Info { connect } = cli.command else {
            panic!("expected info command");
        };
        let mut session = open_session(&connect).unwrap();
        assert_eq!(session.block_size(), Some(16));
        assert_eq!(session.identify().unwrap(), "ZPROG-EMU 27C256");
    }
}
