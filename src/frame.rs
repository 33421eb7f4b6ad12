//! CAN frame value type shared by the inbound and outbound paths.

use crate::{SafetyError, SafetyResult};

/// Largest CAN-FD payload
pub const MAX_FRAME_LEN: usize = 64;

/// Network segment a frame was seen on or is destined to
pub type Bus = u8;

/// One frame on the vehicle network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    addr: u32,
    bus: Bus,
    len: u8,
    data: [u8; MAX_FRAME_LEN],
}

impl CanFrame {
    /// Build a frame from its payload.
    ///
    /// # Errors
    /// Returns `SafetyError::InvalidFrame` if the payload exceeds 64 bytes.
    pub fn new(bus: Bus, addr: u32, payload: &[u8]) -> SafetyResult<Self> {
        if payload.len() > MAX_FRAME_LEN {
            return Err(SafetyError::InvalidFrame(format!(
                "Expected at most {} bytes, got {} bytes",
                MAX_FRAME_LEN,
                payload.len()
            )));
        }
        let mut data = [0u8; MAX_FRAME_LEN];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            addr,
            bus,
            len: payload.len() as u8,
            data,
        })
    }

    pub fn addr(&self) -> u32 {
        self.addr
    }

    pub fn bus(&self) -> Bus {
        self.bus
    }

    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len()]
    }
}
