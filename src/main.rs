//! zprog - host driver for serial EPROM programmers
//!
//! Talks to a microcontroller-based EPROM programmer over a serial link. The
//! device prints a boot banner after reset, then accepts `z`-prefixed
//! commands (identify, set block size, seek, read block, erase, write block)
//! and answers each with a status byte and an optional framed payload.
//!
//! Each invocation opens one session, drains the banner, configures the block
//! size and runs a single command. The port is released when the session is
//! dropped, including on error.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use programmers::open_session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG still wins when set; -v/-vv only move the default
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level().as_str()),
    )
    .init();

    match cli.command {
        Commands::Script { connect } => {
            let mut session = open_session(&connect)?;
            commands::script::run_script(&mut session)?;
            session.close()?;
        }
        Commands::Info { connect } => {
            let mut session = open_session(&connect)?;
            println!("Device ID: {}", session.identify()?);
            session.close()?;
        }
        Commands::Dump {
            connect,
            start,
            length,
        } => {
            let mut session = open_session(&connect)?;
            commands::dump::run_dump(&mut session, start, length)?;
            session.close()?;
        }
        Commands::Read {
            connect,
            output,
            start,
            length,
        } => {
            let mut session = open_session(&connect)?;
            commands::read::run_read(&mut session, &output, start, length)?;
            session.close()?;
        }
        Commands::Write {
            connect,
            input,
            start,
            verify,
        } => {
            let mut session = open_session(&connect)?;
            commands::write::run_write(&mut session, &input, start, verify)?;
            session.close()?;
        }
        Commands::Erase { connect } => {
            let mut session = open_session(&connect)?;
            commands::erase::run_erase(&mut session)?;
            session.close()?;
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
        }
    }

    Ok(())
}
