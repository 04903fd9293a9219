//! Transport layer abstraction for zprog communication
//!
//! This module provides a unified interface for serial and TCP transports.
//! Reads are bounded by a single channel-level timeout; a timed-out read
//! yields no bytes rather than an error so callers can decide how to treat
//! partial data.

use crate::error::Result;

/// Transport trait for reading and writing bytes
pub trait Transport {
    /// Write all bytes to the transport
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes
    ///
    /// Blocks until at least one byte is available or the channel timeout
    /// elapses. Returns the number of bytes read, or 0 on timeout.
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<()>;

    /// Read a single byte, `None` on timeout
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut c = [0u8];
        match self.read_some(&mut c)? {
            0 => Ok(None),
            _ => Ok(Some(c[0])),
        }
    }

    /// Read bytes up to and including `delim`, appending them to `out`
    ///
    /// Reads one byte at a time so nothing past the delimiter is consumed.
    /// Returns `true` if the delimiter was seen, `false` if the channel timed
    /// out first (in which case `out` holds whatever arrived).
    fn read_until(&mut self, delim: u8, out: &mut Vec<u8>) -> Result<bool> {
        while let Some(b) = self.read_byte()? {
            out.push(b);
            if b == delim {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Fill `buf` completely unless the channel times out
    ///
    /// Returns the number of bytes actually read.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_some(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_some(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

pub mod serial {
    //! Serial port transport implementation

    use super::*;
    use crate::error::ZprogError;
    use crate::protocol::defaults;
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{Read, Write};
    use std::time::Duration;

    /// Serial port transport
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port
        ///
        /// Uses the firmware's 57600 baud when `baud` is `None`, 8N1 without
        /// flow control.
        pub fn open(device: &str, baud: Option<u32>, timeout: Duration) -> Result<Self> {
            let baud_rate = baud.unwrap_or(defaults::BAUD);

            let port = serialport::new(device, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(timeout)
                .open()?;

            log::info!(
                "Opened serial port {} at {} baud (timeout {:?})",
                device,
                baud_rate,
                timeout
            );

            Ok(Self { port })
        }
    }

    impl Transport for SerialTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data)?;
            Ok(())
        }

        fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
            match self.port.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) => Err(ZprogError::from(e)),
            }
        }

        fn flush(&mut self) -> Result<()> {
            self.port.flush()?;
            Ok(())
        }
    }
}

pub mod tcp {
    //! TCP socket transport implementation, for serial-to-network bridges

    use super::*;
    use crate::error::ZprogError;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Duration;

    /// TCP socket transport
    pub struct TcpTransport {
        stream: TcpStream,
    }

    impl TcpTransport {
        /// Connect to a bridge at the specified host and port
        pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
            let addr = format!("{}:{}", host, port);
            log::info!("Connecting to {}", addr);

            let stream = TcpStream::connect(&addr)
                .map_err(|e| ZprogError::ConnectionFailed(e.to_string()))?;

            stream.set_nodelay(true).map_err(|e| {
                ZprogError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
            })?;

            stream.set_read_timeout(Some(timeout)).map_err(|e| {
                ZprogError::ConnectionFailed(format!("Failed to set read timeout: {}", e))
            })?;
            stream.set_write_timeout(Some(timeout)).map_err(|e| {
                ZprogError::ConnectionFailed(format!("Failed to set write timeout: {}", e))
            })?;

            log::info!("Connected to {}", addr);

            Ok(Self { stream })
        }
    }

    impl Transport for TcpTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.stream.write_all(data)?;
            Ok(())
        }

        fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
            match self.stream.read(buf) {
                Ok(n) => Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
                Err(e) => Err(ZprogError::from(e)),
            }
        }

        fn flush(&mut self) -> Result<()> {
            self.stream.flush()?;
            Ok(())
        }
    }
}
