//! zprog session implementation
//!
//! This module provides the `Zprog` struct that owns the transport for the
//! lifetime of a connection and runs the protocol over it: draining the boot
//! banner, then issuing strictly sequential request/response transactions.

use crate::error::{Result, ZprogError};
use crate::frame::{read_reply, Framing, Reply};
use crate::protocol::*;
use crate::transport::Transport;

/// High-level device mode as tracked by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Device is printing its banner; commands are not accepted yet
    Boot,
    /// Device awaits `z`-prefixed commands
    Command,
}

/// zprog session
///
/// Every operation takes `&mut self`, so one reply is always fully consumed
/// before the next command goes out.
pub struct Zprog<T: Transport> {
    /// Transport layer (serial, TCP or emulator)
    transport: T,
    /// Payload framing spoken by the firmware
    framing: Framing,
    mode: Mode,
    /// Block size last accepted by the device
    block_size: Option<u16>,
    /// Host model of the device cursor; `None` until the first seek
    cursor: Option<u32>,
}

impl<T: Transport> Zprog<T> {
    /// Create a session in boot mode
    pub fn new(transport: T, framing: Framing) -> Self {
        Self {
            transport,
            framing,
            mode: Mode::Boot,
            block_size: None,
            cursor: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn block_size(&self) -> Option<u16> {
        self.block_size
    }

    /// Address the host expects the device cursor to be at
    pub fn cursor(&self) -> Option<u32> {
        self.cursor
    }

    /// Read and discard one newline-terminated line
    ///
    /// Returns the line without its line ending. If the channel times out
    /// first, whatever arrived (possibly nothing) is returned.
    pub fn drain_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let complete = self.transport.read_until(b'\n', &mut buf)?;
        let line = String::from_utf8(buf)?;
        let line = line.trim_end_matches(['\r', '\n']).to_string();

        if complete {
            log::info!("{}", line);
        } else {
            log::warn!("zprog: line cut short by timeout: {:?}", line);
        }

        Ok(line)
    }

    /// Drain `lines` banner lines and switch to command mode
    pub fn drain_banner(&mut self, lines: usize) -> Result<Vec<String>> {
        let mut banner = Vec::with_capacity(lines);
        for _ in 0..lines {
            banner.push(self.drain_line()?);
        }
        self.enter_command_mode();
        Ok(banner)
    }

    /// Switch to command mode without draining anything
    ///
    /// For devices that were already past their banner when the port opened.
    pub fn enter_command_mode(&mut self) {
        if self.mode == Mode::Boot {
            log::debug!("zprog: entering command mode");
        }
        self.mode = Mode::Command;
    }

    /// Send one command body and read its reply
    ///
    /// Writes `z` followed by `body`, then reads the status byte and, on
    /// success, the framed payload.
    pub fn transact(&mut self, body: &str) -> Result<Reply> {
        if self.mode != Mode::Command {
            return Err(ZprogError::NotInCommandMode);
        }
        if !body.is_ascii() {
            return Err(ZprogError::InvalidParameter(format!(
                "command body must be ASCII: {:?}",
                body
            )));
        }

        let mut frame = Vec::with_capacity(body.len() + 1);
        frame.push(CMD_PREFIX);
        frame.extend_from_slice(body.as_bytes());

        log::debug!("zprog: -> z{}", body);
        self.transport.write(&frame)?;
        self.transport.flush()?;

        read_reply(&mut self.transport, self.framing)
    }

    /// Run a catalog command, turning a rejection into an error
    fn execute(&mut self, cmd: &Command) -> Result<String> {
        self.transact(&cmd.encode_body())?.into_payload(cmd.opcode())
    }

    /// Query the manufacturer/device id string
    pub fn identify(&mut self) -> Result<String> {
        let id = self.execute(&Command::Identify)?;
        log::info!("zprog: Device ID is \"{}\"", id);
        Ok(id)
    }

    /// Set the number of bytes moved per read/write block
    pub fn set_block_size(&mut self, size: u16) -> Result<()> {
        if size == 0 || size > MAX_BLOCK_SIZE {
            return Err(ZprogError::InvalidParameter(format!(
                "block size must be 1..={}, got {}",
                MAX_BLOCK_SIZE, size
            )));
        }

        self.execute(&Command::SetBlockSize(size))?;
        self.block_size = Some(size);
        log::debug!("zprog: Block size is {}", size);
        Ok(())
    }

    /// Position the device cursor
    pub fn seek(&mut self, addr: u32) -> Result<()> {
        // An unanswered seek leaves the device cursor undefined
        self.cursor = None;
        self.execute(&Command::Seek(addr))?;
        self.cursor = Some(addr);
        Ok(())
    }

    /// Read one block at the cursor
    pub fn read_block(&mut self) -> Result<Vec<u8>> {
        let size = self.block_size.ok_or(ZprogError::BlockSizeUnset)?;
        let addr = self.cursor.ok_or(ZprogError::CursorUnknown)?;

        self.cursor = None;
        let payload = self.execute(&Command::ReadBlock)?;
        let data = decode_hex(&payload)?;
        if data.len() != size as usize {
            return Err(ZprogError::InvalidPayload(format!(
                "expected {} bytes at 0x{:08X}, got {}",
                size,
                addr,
                data.len()
            )));
        }

        self.cursor = addr.checked_add(size as u32);
        Ok(data)
    }

    /// Erase the whole device
    ///
    /// The device cursor is unknown afterwards.
    pub fn erase(&mut self) -> Result<()> {
        self.cursor = None;
        self.execute(&Command::Erase)?;
        log::info!("zprog: Device erased");
        Ok(())
    }

    /// Write one block at the cursor
    pub fn write_block(&mut self, data: &[u8]) -> Result<()> {
        let size = self.block_size.ok_or(ZprogError::BlockSizeUnset)?;
        let addr = self.cursor.ok_or(ZprogError::CursorUnknown)?;
        if data.len() != size as usize {
            return Err(ZprogError::InvalidParameter(format!(
                "block must be {} bytes, got {}",
                size,
                data.len()
            )));
        }

        self.cursor = None;
        self.execute(&Command::WriteBlock(data.to_vec()))?;
        self.cursor = addr.checked_add(size as u32);
        Ok(())
    }

    /// Write one block filled with `value`
    pub fn fill_block(&mut self, value: u8) -> Result<()> {
        let size = self.block_size.ok_or(ZprogError::BlockSizeUnset)?;
        self.write_block(&vec![value; size as usize])
    }

    /// Read `len` bytes starting at `addr`
    ///
    /// Seeks first, then reads whole blocks; the last block is truncated to
    /// fit. `progress` receives the running byte count.
    pub fn read_range(
        &mut self,
        addr: u32,
        len: usize,
        mut progress: impl FnMut(usize),
    ) -> Result<Vec<u8>> {
        let size = self.block_size.ok_or(ZprogError::BlockSizeUnset)? as usize;
        let mut data = Vec::with_capacity(len);
        if len == 0 {
            return Ok(data);
        }

        self.seek(addr)?;
        while data.len() < len {
            let block = self.read_block()?;
            let take = core::cmp::min(size, len - data.len());
            data.extend_from_slice(&block[..take]);
            progress(data.len());
        }

        Ok(data)
    }

    /// Write `data` starting at `addr`
    ///
    /// A trailing partial block is padded with 0xFF.
    pub fn write_range(
        &mut self,
        addr: u32,
        data: &[u8],
        mut progress: impl FnMut(usize),
    ) -> Result<()> {
        let size = self.block_size.ok_or(ZprogError::BlockSizeUnset)? as usize;
        if data.is_empty() {
            return Ok(());
        }

        self.seek(addr)?;
        let mut written = 0;
        for chunk in data.chunks(size) {
            if chunk.len() == size {
                self.write_block(chunk)?;
            } else {
                let mut block = vec![0xFF; size];
                block[..chunk.len()].copy_from_slice(chunk);
                self.write_block(&block)?;
            }
            written += chunk.len();
            progress(written);
        }

        Ok(())
    }

    /// Flush and release the transport
    pub fn close(mut self) -> Result<()> {
        self.transport.flush()?;
        log::debug!("zprog: Session closed");
        Ok(())
    }

    /// Give back the transport without flushing
    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ScriptedTransport;

    fn session(inbound: &[u8]) -> Zprog<ScriptedTransport> {
        let mut zp = Zprog::new(ScriptedTransport::new(inbound), Framing::Sentinel);
        zp.enter_command_mode();
        zp
    }

    #[test]
    fn test_transact_writes_prefix_and_body() {
        for body in ["i", "d0010", "s00000000", "R", "Ea5a5a5a5", ""] {
            let mut zp = session(b"Z@");
            zp.transact(body).unwrap();
            let t = zp.into_inner();
            assert_eq!(t.written.len(), body.len() + 1);
            assert_eq!(t.written[0], b'z');
            assert_eq!(&t.written[1..], body.as_bytes());
        }
    }

    #[test]
    fn test_transact_identify() {
        let mut zp = session(b"ZACME-1@");
        assert_eq!(zp.transact("i").unwrap(), Reply::Accepted("ACME-1".into()));
    }

    #[test]
    fn test_transact_rejected() {
        let mut zp = session(b"!ABC@");
        assert_eq!(zp.transact("i").unwrap(), Reply::Rejected { status: b'!' });
        assert_eq!(zp.into_inner().remaining(), b"ABC@");
    }

    #[test]
    fn test_transact_in_boot_mode_fails() {
        let mut zp = Zprog::new(ScriptedTransport::new(b"Z@"), Framing::Sentinel);
        assert_eq!(zp.mode(), Mode::Boot);
        assert!(matches!(zp.transact("i"), Err(ZprogError::NotInCommandMode)));
        assert!(zp.into_inner().written.is_empty());
    }

    #[test]
    fn test_drain_leaves_stream_at_next_line() {
        let stream = b"EPROM programmer\r\nv1.0\nready\nZ";
        let mut zp = Zprog::new(ScriptedTransport::new(stream), Framing::Sentinel);

        let banner = zp.drain_banner(3).unwrap();
        assert_eq!(banner, vec!["EPROM programmer", "v1.0", "ready"]);
        assert_eq!(zp.mode(), Mode::Command);
        assert_eq!(zp.into_inner().remaining(), b"Z");
    }

    #[test]
    fn test_drain_short_banner_returns_empty_line() {
        let mut zp = Zprog::new(ScriptedTransport::new(b"only\n"), Framing::Sentinel);
        assert_eq!(zp.drain_line().unwrap(), "only");
        assert_eq!(zp.drain_line().unwrap(), "");
    }

    #[test]
    fn test_drain_partial_line_on_timeout() {
        let mut zp = Zprog::new(ScriptedTransport::new(b"half"), Framing::Sentinel);
        assert_eq!(zp.drain_line().unwrap(), "half");
    }

    #[test]
    fn test_drain_invalid_text() {
        let mut zp = Zprog::new(ScriptedTransport::new(b"\xff\n"), Framing::Sentinel);
        assert!(matches!(zp.drain_line(), Err(ZprogError::InvalidText(_))));
    }

    #[test]
    fn test_non_ascii_body_rejected() {
        let mut zp = session(b"Z@");
        assert!(matches!(
            zp.transact("sé"),
            Err(ZprogError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_typed_rejection_is_error() {
        let mut zp = session(b"!");
        assert!(matches!(
            zp.identify(),
            Err(ZprogError::Rejected {
                opcode: 'i',
                status: b'!'
            })
        ));
    }

    #[test]
    fn test_seek_tracks_cursor() {
        let mut zp = session(b"Z@Z@");
        assert_eq!(zp.cursor(), None);
        zp.seek(0x10).unwrap();
        assert_eq!(zp.cursor(), Some(0x10));
        assert_eq!(&zp.into_inner().written, b"zs00000010");
    }

    #[test]
    fn test_rejected_seek_forgets_cursor() {
        let mut zp = session(b"Z@!");
        zp.seek(0).unwrap();
        assert!(zp.seek(0x20).is_err());
        assert_eq!(zp.cursor(), None);
    }

    #[test]
    fn test_read_block_requires_setup() {
        let mut zp = session(b"");
        assert!(matches!(zp.read_block(), Err(ZprogError::BlockSizeUnset)));

        let mut zp = session(b"Z@");
        zp.set_block_size(4).unwrap();
        assert!(matches!(zp.read_block(), Err(ZprogError::CursorUnknown)));
    }

    #[test]
    fn test_read_block_decodes_and_advances() {
        let mut zp = session(b"Z@Z@ZDEADBEEF@");
        zp.set_block_size(4).unwrap();
        zp.seek(0x100).unwrap();
        assert_eq!(zp.read_block().unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(zp.cursor(), Some(0x104));
    }

    #[test]
    fn test_read_block_wrong_length() {
        let mut zp = session(b"Z@Z@ZDEAD@");
        zp.set_block_size(4).unwrap();
        zp.seek(0).unwrap();
        assert!(matches!(zp.read_block(), Err(ZprogError::InvalidPayload(_))));
    }

    #[test]
    fn test_block_size_bounds() {
        let mut zp = session(b"");
        assert!(zp.set_block_size(0).is_err());
        assert!(zp.set_block_size(MAX_BLOCK_SIZE + 1).is_err());
        assert!(zp.into_inner().written.is_empty());
    }

    #[test]
    fn test_write_block_length_checked() {
        let mut zp = session(b"Z@Z@");
        zp.set_block_size(4).unwrap();
        zp.seek(0).unwrap();
        assert!(matches!(
            zp.write_block(&[1, 2, 3]),
            Err(ZprogError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_fill_block_encoding() {
        let mut zp = session(b"Z@Z@Z@");
        zp.set_block_size(16).unwrap();
        zp.seek(0).unwrap();
        zp.fill_block(0xAA).unwrap();
        assert_eq!(zp.cursor(), Some(16));

        let written = zp.into_inner().written;
        let expected = format!("zd0010zs00000000zw{}", "a".repeat(32));
        assert_eq!(written, expected.as_bytes());
    }

    #[test]
    fn test_erase_forgets_cursor() {
        let mut zp = session(b"Z@Z@");
        zp.seek(0).unwrap();
        zp.erase().unwrap();
        assert_eq!(zp.cursor(), None);
        assert!(zp.into_inner().written.ends_with(b"zEa5a5a5a5"));
    }

    #[test]
    fn test_read_range_truncates_last_block() {
        let mut zp = session(b"Z@Z@Z00010203@Z04050607@");
        zp.set_block_size(4).unwrap();
        let mut seen = Vec::new();
        let data = zp.read_range(0, 6, |n| seen.push(n)).unwrap();
        assert_eq!(data, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(seen, vec![4, 6]);
    }

    #[test]
    fn test_write_range_pads_tail() {
        let mut zp = session(b"Z@Z@Z@Z@");
        zp.set_block_size(2).unwrap();
        zp.write_range(0x40, &[1, 2, 3], |_| {}).unwrap();
        let written = zp.into_inner().written;
        assert_eq!(written, b"zd0002zs00000040zw0102zw03ff");
    }
}
