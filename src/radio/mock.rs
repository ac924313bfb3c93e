//! Scripted in-memory transport used by the unit tests

use std::collections::VecDeque;

use crate::core::{Error, Result};
use super::transport::Transport;

/// One scripted reply from the fake module
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    /// Released into the read buffer when the next command is written
    OnWrite(&'static str),
    /// Released as two separate polls' worth of data after the next command
    OnWriteSplit(&'static str, &'static str),
    /// The next written command gets no reply at all
    Ignore,
    /// Released on a poll without any command, like the boot banner
    Unsolicited(&'static str),
}

/// Scripted transport standing in for the companion radio
pub(crate) struct MockTransport {
    script: VecDeque<Scripted>,
    pending_chunks: VecDeque<Vec<u8>>,
    /// Commands written so far, line terminators stripped
    pub writes: Vec<String>,
    pub power_on_count: u32,
    pub power_off_count: u32,
    powered: bool,
}

impl MockTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        MockTransport {
            script: script.into(),
            pending_chunks: VecDeque::new(),
            writes: Vec::new(),
            power_on_count: 0,
            power_off_count: 0,
            powered: false,
        }
    }

    /// Remaining scripted replies, for asserting a script ran to completion
    pub fn script_len(&self) -> usize {
        self.script.len()
    }
}

impl Transport for MockTransport {
    fn power_on(&mut self) -> Result<()> {
        if !self.powered {
            self.powered = true;
            self.power_on_count += 1;
        }
        Ok(())
    }

    fn power_off(&mut self) -> Result<()> {
        if self.powered {
            self.powered = false;
            self.power_off_count += 1;
        }
        Ok(())
    }

    fn is_powered(&self) -> bool {
        self.powered
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.powered {
            return Err(Error::invalid_state("write while module is powered off"));
        }
        self.writes
            .push(String::from_utf8_lossy(bytes).trim_end().to_string());
        match self.script.pop_front() {
            Some(Scripted::OnWrite(reply)) => {
                self.pending_chunks.push_back(reply.as_bytes().to_vec());
            }
            Some(Scripted::OnWriteSplit(first, second)) => {
                self.pending_chunks.push_back(first.as_bytes().to_vec());
                self.pending_chunks.push_back(second.as_bytes().to_vec());
            }
            Some(Scripted::Ignore) => {}
            Some(other @ Scripted::Unsolicited(_)) => {
                // Not consumed by a command; put it back for the next poll
                self.script.push_front(other);
            }
            None => {}
        }
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.powered {
            return Err(Error::invalid_state("read while module is powered off"));
        }
        if self.pending_chunks.is_empty() {
            if let Some(Scripted::Unsolicited(_)) = self.script.front() {
                if let Some(Scripted::Unsolicited(reply)) = self.script.pop_front() {
                    self.pending_chunks.push_back(reply.as_bytes().to_vec());
                }
            }
        }
        match self.pending_chunks.pop_front() {
            Some(chunk) => {
                let count = chunk.len().min(buf.len());
                buf[..count].copy_from_slice(&chunk[..count]);
                if count < chunk.len() {
                    self.pending_chunks.push_front(chunk[count..].to_vec());
                }
                Ok(count)
            }
            None => Ok(0),
        }
    }
}
