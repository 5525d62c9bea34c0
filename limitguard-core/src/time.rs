//! Time stamps carried by telemetry messages
//!
//! The engine never reads a clock. Every timestamp it stores comes from the
//! message that produced it, so replaying the same messages reproduces the
//! same result tables bit for bit.

/// Timestamp in milliseconds (mission elapsed time or device boot)
pub type Timestamp = u64;
