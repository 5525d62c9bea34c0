//! Constants for LimitGuard Core
//!
//! Centralized, documented constants used throughout the engine. Table
//! capacities are compile-time values so every table is a fixed-size array
//! and the engine never allocates.
//!
//! ## Organization
//!
//! - **Tables**: Table capacities, RPN buffer length, dispatch bucket count
//! - **Limits**: Raw encodings and numeric limits shared by validation and evaluation
//! - **Events**: Numeric notification identifiers
//!
//! ## Sizing
//!
//! The default sizes match a typical flight configuration. Enable the
//! `low_memory_tables` feature for constrained targets:
//!
//! ```text
//! Configuration        Watchpoints  Actionpoints  Buckets
//! --------------------------------------------------------
//! default                  176          176          256
//! low_memory_tables         32           32           16
//! ```

/// Table capacities and buffer lengths.
pub mod tables;

/// Raw table encodings and numeric limits.
pub mod limits;

/// Notification identifiers.
pub mod events;

pub use tables::{
    MAX_WATCHPOINTS, MAX_ACTIONPOINTS, MAX_RPN_EQU_SIZE, MAX_ACTION_TEXT,
    HASH_TABLE_ENTRIES, ALL_WATCHPOINTS, ALL_ACTIONPOINTS,
};

pub use limits::{
    FLOAT_TOLERANCE, HIGHEST_VALID_MSG_ID, MAX_VALID_RESPONSE_ID,
};
