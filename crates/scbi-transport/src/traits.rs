use std::time::{Duration, SystemTime};

use crate::error::Result;

/// Maximum payload length of a classic CAN frame.
pub const CAN_MAX_DLEN: usize = 8;

/// A classic CAN frame as received from the bus.
///
/// `id` is the raw 32-bit identifier word including the EFF/RTR/ERR flag
/// bits, exactly as the kernel hands it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    pub id: u32,
    pub data: [u8; CAN_MAX_DLEN],
    pub len: u8,
    /// Hardware (or kernel) receipt time.
    pub timestamp: SystemTime,
}

impl CanFrame {
    /// Create a frame from an identifier and up to eight payload bytes.
    ///
    /// Bytes beyond the eighth are ignored.
    pub fn new(id: u32, payload: &[u8], timestamp: SystemTime) -> Self {
        let len = payload.len().min(CAN_MAX_DLEN);
        let mut data = [0u8; CAN_MAX_DLEN];
        data[..len].copy_from_slice(&payload[..len]);
        Self {
            id,
            data,
            len: len as u8,
            timestamp,
        }
    }

    /// The valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.len)]
    }
}

/// Outcome of a single receive attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// One frame was read.
    Frame(CanFrame),
    /// Nothing arrived before the timeout elapsed.
    Timeout,
}

/// A source of CAN frames that can be waited on with a timeout.
///
/// Implementations return
/// [`TransportError::Shutdown`](crate::TransportError::Shutdown) once an
/// external wake-up has been requested.
pub trait FrameSource {
    /// Wait up to `timeout` for one frame.
    fn try_receive(&mut self, timeout: Duration) -> Result<Received>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn try_receive(&mut self, timeout: Duration) -> Result<Received> {
        (**self).try_receive(timeout)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn try_receive(&mut self, timeout: Duration) -> Result<Received> {
        (**self).try_receive(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_respects_length() {
        let frame = CanFrame::new(0x123, &[9, 8, 7], SystemTime::UNIX_EPOCH);
        assert_eq!(frame.len, 3);
        assert_eq!(frame.payload(), &[9, 8, 7]);
        assert_eq!(frame.data, [9, 8, 7, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn new_truncates_long_payload() {
        let frame = CanFrame::new(1, &[0u8; 12], SystemTime::UNIX_EPOCH);
        assert_eq!(frame.len, 8);
    }
}
