//! In-memory transport double for unit tests

use crate::error::Result;
use crate::transport::Transport;

/// Replays a fixed inbound byte stream and records everything written
pub struct ScriptedTransport {
    inbound: Vec<u8>,
    pos: usize,
    pub written: Vec<u8>,
}

impl ScriptedTransport {
    pub fn new(inbound: &[u8]) -> Self {
        Self {
            inbound: inbound.to_vec(),
            pos: 0,
            written: Vec::new(),
        }
    }

    /// Inbound bytes not yet consumed
    pub fn remaining(&self) -> &[u8] {
        &self.inbound[self.pos..]
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.written.extend_from_slice(data);
        Ok(())
    }

    // One byte per call, like a slow UART
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || self.pos >= self.inbound.len() {
            return Ok(0);
        }
        buf[0] = self.inbound[self.pos];
        self.pos += 1;
        Ok(1)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
