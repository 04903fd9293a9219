//! Error types for zprog operations

use thiserror::Error;

/// zprog-specific errors
#[derive(Debug, Error)]
pub enum ZprogError {
    /// Failed to connect to device
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// No status byte arrived before the channel timeout
    #[error("Communication timeout")]
    Timeout,

    /// A command was attempted while the device is still emitting its boot banner
    #[error("Device is not in command mode (boot banner not drained)")]
    NotInCommandMode,

    /// Device answered with a non-success status byte
    #[error("Command '{opcode}' rejected with status 0x{status:02X}")]
    Rejected { opcode: char, status: u8 },

    /// Sentinel-framed payload ended without its terminator
    #[error("Payload not terminated before timeout ({} bytes received)", .partial.len())]
    Unterminated { partial: Vec<u8> },

    /// Length-framed payload was shorter than announced
    #[error("Payload truncated: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    /// Channel yielded bytes that are not valid text
    #[error("Received invalid text: {0}")]
    InvalidText(#[from] std::string::FromUtf8Error),

    /// Payload text could not be interpreted
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Block transfer attempted before any seek
    #[error("Device cursor position unknown (seek first)")]
    CursorUnknown,

    /// Block transfer attempted before the block size was configured
    #[error("Block size not configured")]
    BlockSizeUnset,

    /// I/O error during communication
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),
}

/// Result type for zprog operations
pub type Result<T> = core::result::Result<T, ZprogError>;

impl From<std::io::Error> for ZprogError {
    fn from(e: std::io::Error) -> Self {
        ZprogError::IoError(e.to_string())
    }
}
