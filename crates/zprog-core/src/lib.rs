//! zprog-core - host side of the z-prefixed EPROM programmer protocol
//!
//! This crate talks to a microcontroller that exposes EPROM read, write and
//! erase operations over a serial link.
//!
//! # Protocol Overview
//!
//! After reset the device prints a few human-readable banner lines. Once
//! those are drained, every transaction is the byte `z` followed by an ASCII
//! command body. The device answers with one status byte (`Z` on success)
//! and, on success only, a framed text payload.
//!
//! | Body | Meaning |
//! |------|---------|
//! | `i` | identify device |
//! | `dNNNN` | set block size (hex) |
//! | `sNNNNNNNN` | seek to address (hex) |
//! | `R` | read one block at the cursor |
//! | `Ea5a5a5a5` | erase device |
//! | `w<hex>` | write one block at the cursor |
//!
//! # Example
//!
//! ```no_run
//! use zprog_core::{Framing, SerialTransport, Zprog};
//! use zprog_core::protocol::defaults;
//!
//! let transport = SerialTransport::open("/dev/ttyACM0", None, defaults::TIMEOUT)?;
//! let mut zp = Zprog::new(transport, Framing::Sentinel);
//! zp.drain_banner(defaults::BOOT_LINES)?;
//!
//! println!("Device ID: {}", zp.identify()?);
//! zp.set_block_size(16)?;
//! let data = zp.read_range(0, 256, |_| {})?;
//! println!("{:02X?}", data);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod device;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_util;

// Re-exports
pub use device::{Mode, Zprog};
pub use error::{Result, ZprogError};
pub use frame::{Framing, Reply};
pub use protocol::Command;
pub use transport::serial::SerialTransport;
pub use transport::tcp::TcpTransport;
pub use transport::Transport;

use std::time::Duration;

/// Connection options for a zprog device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZprogConnection {
    /// Serial port connection
    Serial {
        /// Device path (e.g., "/dev/ttyACM0" or "COM3")
        device: String,
        /// Baud rate (None for the firmware default)
        baud: Option<u32>,
    },
    /// TCP socket connection to a serial bridge
    Tcp {
        /// Hostname or IP address
        host: String,
        /// Port number
        port: u16,
    },
}

impl ZprogConnection {
    /// Parse a connection string
    ///
    /// Formats:
    /// - `dev=/dev/ttyACM0` - Serial at 57600 baud
    /// - `dev=/dev/ttyACM0:115200` - Serial with specified baud
    /// - `ip=host:port` - TCP connection
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        if let Some(dev) = s.strip_prefix("dev=") {
            if let Some((device, baud_str)) = dev.rsplit_once(':') {
                let baud = baud_str
                    .parse()
                    .map_err(|_| format!("Invalid baud rate: {}", baud_str))?;
                Ok(ZprogConnection::Serial {
                    device: device.to_string(),
                    baud: Some(baud),
                })
            } else {
                Ok(ZprogConnection::Serial {
                    device: dev.to_string(),
                    baud: None,
                })
            }
        } else if let Some(ip) = s.strip_prefix("ip=") {
            let (host, port_str) = ip
                .rsplit_once(':')
                .ok_or_else(|| "Missing port in ip= parameter".to_string())?;
            let port = port_str
                .parse()
                .map_err(|_| format!("Invalid port: {}", port_str))?;
            Ok(ZprogConnection::Tcp {
                host: host.to_string(),
                port,
            })
        } else {
            Err(format!(
                "Invalid zprog connection string: {}. Use dev=... or ip=...",
                s
            ))
        }
    }

    /// Open the underlying transport
    pub fn open(&self, timeout: Duration) -> Result<Box<dyn Transport>> {
        match self {
            ZprogConnection::Serial { device, baud } => {
                Ok(Box::new(SerialTransport::open(device, *baud, timeout)?))
            }
            ZprogConnection::Tcp { host, port } => {
                Ok(Box::new(TcpTransport::connect(host, *port, timeout)?))
            }
        }
    }
}
