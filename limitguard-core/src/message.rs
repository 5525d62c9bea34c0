//! Telemetry messages as seen by the engine
//!
//! The transport hands the engine a borrowed view of each packet. The
//! payload slice carries its own length, which is what every watchpoint
//! offset is checked against.

use crate::time::Timestamp;

/// Message identifier (software bus id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageId(pub u16);

impl MessageId {
    /// Raw identifier value
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl core::fmt::Display for MessageId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for MessageId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "0x{:04X}", self.0)
    }
}

/// A received telemetry packet
///
/// Offsets in watchpoint definitions index into `payload` from its first
/// byte, headers included.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    /// Identifier the packet was published under
    pub id: MessageId,
    /// Full packet bytes
    pub payload: &'a [u8],
    /// Packet time, recorded with watchpoint transitions
    pub timestamp: Timestamp,
}

impl<'a> Message<'a> {
    /// Wrap a received packet
    pub const fn new(id: MessageId, payload: &'a [u8], timestamp: Timestamp) -> Self {
        Self { id, payload, timestamp }
    }

    /// Packet length in bytes
    pub const fn len(&self) -> usize {
        self.payload.len()
    }

    /// True for a zero-length packet
    pub const fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
