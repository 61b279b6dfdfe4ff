//! Blocking byte reader over network chunks
//!
//! Symphonia reads synchronously, while the HTTP body arrives on the tokio
//! runtime. The pump task pushes body chunks into a bounded crossbeam
//! channel and the session thread pulls them through this reader.

use crate::shared::SessionShared;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;

/// How long a read waits before re-checking for shutdown
const READ_POLL: Duration = Duration::from_millis(100);

/// `Read` adapter over received body chunks
pub(crate) struct ChannelReader {
    chunks: Receiver<Vec<u8>>,
    current: Vec<u8>,
    position: usize,
    shared: Arc<SessionShared>,
}

impl ChannelReader {
    pub fn new(chunks: Receiver<Vec<u8>>, shared: Arc<SessionShared>) -> Self {
        Self {
            chunks,
            current: Vec::new(),
            position: 0,
            shared,
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.position >= self.current.len() {
            // Shutdown looks like end of stream to the decoder
            if self.shared.is_shut_down() {
                return Ok(0);
            }

            match self.chunks.recv_timeout(READ_POLL) {
                Ok(chunk) => {
                    self.current = chunk;
                    self.position = 0;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return match self.shared.network_error() {
                        Some(message) => Err(io::Error::new(io::ErrorKind::ConnectionAborted, message)),
                        None => Ok(0),
                    };
                }
            }
        }

        let remaining = &self.current[self.position..];
        let len = remaining.len().min(buf.len());
        buf[..len].copy_from_slice(&remaining[..len]);
        self.position += len;
        Ok(len)
    }
}
