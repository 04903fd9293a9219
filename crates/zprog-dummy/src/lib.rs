//! zprog-dummy - In-memory EPROM programmer emulator for testing
//!
//! This crate provides a `Transport` that behaves like the programmer
//! firmware: it prints a boot banner, parses `z`-prefixed commands as their
//! bytes arrive and queues replies for the host to read. It's useful for
//! testing and development without real hardware.

use std::collections::VecDeque;

use zprog_core::frame::encode_accepted;
use zprog_core::protocol::{self, *};
use zprog_core::{Framing, Result, Transport};

/// Configuration for the emulated programmer
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Reply to the identify command
    pub device_id: String,
    /// EPROM size in bytes
    pub size: usize,
    /// Lines printed after reset, before commands are read
    pub banner: Vec<String>,
    /// Payload framing the firmware speaks
    pub framing: Framing,
    /// Block size in effect before any `d` command
    pub block_size: u16,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            device_id: "ZPROG-EMU 27C256".into(),
            size: 32 * 1024,
            banner: vec![
                "EPROM programmer emulator".into(),
                "Firmware 1.0".into(),
                "Device: 27C256 (32 KiB)".into(),
                "Baud: 57600".into(),
                "Block size: 16".into(),
                "Ready".into(),
            ],
            framing: Framing::Sentinel,
            block_size: defaults::BLOCK_SIZE,
        }
    }
}

/// Emulated programmer with an erased EPROM attached
pub struct DummyEprom {
    config: DummyConfig,
    data: Vec<u8>,
    block_size: u16,
    cursor: u32,
    /// Bytes received but not yet parsed into a command
    rx: Vec<u8>,
    /// Bytes waiting to be read by the host
    tx: VecDeque<u8>,
    commands: usize,
}

impl DummyEprom {
    /// Create a new emulator with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        let block_size = config.block_size;
        let mut eprom = Self {
            config,
            data,
            block_size,
            cursor: 0,
            rx: Vec::new(),
            tx: VecDeque::new(),
            commands: 0,
        };
        eprom.queue_banner();
        eprom
    }

    /// Create a new emulator with default configuration (27C256)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create an emulator with pre-filled EPROM contents
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut eprom = Self::new(config);
        let len = core::cmp::min(initial_data.len(), eprom.data.len());
        eprom.data[..len].copy_from_slice(&initial_data[..len]);
        eprom
    }

    /// Get a reference to the EPROM contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Device-side cursor
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Device-side block size
    pub fn block_size(&self) -> u16 {
        self.block_size
    }

    /// Number of complete commands processed
    pub fn command_count(&self) -> usize {
        self.commands
    }

    /// Simulate a reset: pending I/O is lost and the banner is printed again
    pub fn reset(&mut self) {
        self.rx.clear();
        self.tx.clear();
        self.cursor = 0;
        self.block_size = self.config.block_size;
        self.queue_banner();
    }

    fn queue_banner(&mut self) {
        for line in &self.config.banner {
            self.tx.extend(line.as_bytes());
            self.tx.extend(b"\r\n");
        }
    }

    /// Parse as many complete commands as `rx` holds
    fn process(&mut self) {
        loop {
            match self.rx.first() {
                None => return,
                Some(&CMD_PREFIX) => {}
                Some(&b) => {
                    log::trace!("dummy: ignoring stray byte 0x{:02X}", b);
                    self.rx.remove(0);
                    continue;
                }
            }

            let Some(&opcode) = self.rx.get(1) else {
                return;
            };

            let Some(len) = protocol::body_len(opcode, self.block_size) else {
                log::debug!("dummy: unknown opcode 0x{:02X}", opcode);
                self.rx.drain(..2);
                self.commands += 1;
                self.reject();
                continue;
            };

            if self.rx.len() < 2 + len {
                return;
            }

            let args: Vec<u8> = self.rx.drain(..2 + len).skip(2).collect();
            self.commands += 1;
            self.handle(opcode, &args);
        }
    }

    fn handle(&mut self, opcode: u8, args: &[u8]) {
        match opcode {
            OP_IDENTIFY => {
                let id = self.config.device_id.clone();
                self.accept(id.as_bytes());
            }
            OP_BLOCK_SIZE => match parse_hex_field(args) {
                Some(size) if (1..=MAX_BLOCK_SIZE as u32).contains(&size) => {
                    self.block_size = size as u16;
                    self.accept(b"");
                }
                _ => self.reject(),
            },
            OP_SEEK => match parse_hex_field(args) {
                Some(addr) if addr as usize <= self.data.len() => {
                    self.cursor = addr;
                    self.accept(b"");
                }
                _ => self.reject(),
            },
            OP_READ => match self.block_range() {
                Some((start, end)) => {
                    let text = encode_hex(&self.data[start..end]).to_uppercase();
                    self.cursor = end as u32;
                    self.accept(text.as_bytes());
                }
                None => self.reject(),
            },
            OP_ERASE => {
                if args == ERASE_MAGIC.as_bytes() {
                    self.data.fill(0xFF);
                    self.cursor = 0;
                    self.accept(b"");
                } else {
                    self.reject();
                }
            }
            OP_WRITE => {
                let block = core::str::from_utf8(args)
                    .ok()
                    .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
                    .and_then(|s| decode_hex(s).ok())
                    .filter(|block| block.len() == self.block_size as usize);
                match (block, self.block_range()) {
                    (Some(block), Some((start, end))) => {
                        // EPROM programming can only clear bits
                        for (cell, byte) in self.data[start..end].iter_mut().zip(block) {
                            *cell &= byte;
                        }
                        self.cursor = end as u32;
                        self.accept(b"");
                    }
                    _ => self.reject(),
                }
            }
            _ => self.reject(),
        }
    }

    /// Byte range of the block at the cursor, if it fits in the EPROM
    fn block_range(&self) -> Option<(usize, usize)> {
        let start = self.cursor as usize;
        let end = start.checked_add(self.block_size as usize)?;
        (end <= self.data.len()).then_some((start, end))
    }

    fn accept(&mut self, payload: &[u8]) {
        match encode_accepted(self.config.framing, payload) {
            Ok(frame) => self.tx.extend(frame),
            Err(e) => {
                log::warn!("dummy: cannot frame reply: {}", e);
                self.reject();
            }
        }
    }

    fn reject(&mut self) {
        self.tx.push_back(S_FAIL);
    }
}

impl Transport for DummyEprom {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.rx.extend_from_slice(data);
        self.process();
        Ok(())
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = core::cmp::min(buf.len(), self.tx.len());
        for (slot, byte) in buf.iter_mut().zip(self.tx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
