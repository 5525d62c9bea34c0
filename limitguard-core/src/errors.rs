//! Error Types for Limit Checking
//!
//! ## Design Philosophy
//!
//! The engine runs inside a flight software task, so errors follow the same
//! rules as everything else on the hot path:
//!
//! 1. **Small Size**: Every variant carries a handful of integers. Errors are
//!    returned from per-watchpoint evaluation and may be produced hundreds of
//!    times per message burst.
//!
//! 2. **No Heap Allocation**: Reasons are enums or `&'static str`, never `String`.
//!
//! 3. **Copy Semantics**: Errors are `Copy` so they can be logged, reported and
//!    returned without ownership gymnastics.
//!
//! 4. **Local Scope**: An error describes one watchpoint, one actionpoint or one
//!    table entry. It never aborts processing of the others.
//!
//! ## Error Categories
//!
//! ### Evaluation Errors (per watchpoint / actionpoint)
//! - `DataType`: Watchpoint declares a data type the extractor does not know
//! - `Operator`: Watchpoint declares an operator the comparator does not know
//! - `Offset`: Offset plus data width runs past the end of the received message
//! - `FloatNaN`: Extracted float is NaN and cannot be compared
//! - `IllegalExpression`: Malformed RPN token stream
//!
//! ### Table Errors
//! - `Validation`: A definition table entry failed its load-time checks
//!
//! ### Request Errors
//! - `InvalidWatchpoint` / `InvalidActionpoint`: Index out of range
//! - `InvalidCurrentState` / `InvalidNewState`: Illegal state transition requested
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use limitguard_core::LcError;
//!
//! fn describe(err: LcError) -> &'static str {
//!     match err {
//!         LcError::Offset { .. } => "message shorter than watchpoint layout",
//!         LcError::IllegalExpression { .. } => "actionpoint equation is malformed",
//!         LcError::Validation { .. } => "table rejected, previous table stays active",
//!         _ => "see event log",
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for engine operations
pub type LcResult<T> = Result<T, LcError>;

/// Engine errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcError {
    /// Watchpoint data type tag is undefined
    #[error("Undefined watchpoint data type {data_type}")]
    DataType {
        /// Raw tag found in the definition
        data_type: u8,
    },

    /// Comparison operator id is undefined
    #[error("Undefined comparison operator {operator_id}")]
    Operator {
        /// Raw operator id found in the definition
        operator_id: u8,
    },

    /// Configured offset plus data width exceeds the message length
    #[error("Offset {offset} + {width} exceeds message length {message_len}")]
    Offset {
        /// Byte offset from the definition
        offset: u16,
        /// Width of the declared data type in bytes
        width: u8,
        /// Actual length of the received message
        message_len: usize,
    },

    /// Extracted float value is NaN
    #[error("Extracted float value is NaN")]
    FloatNaN,

    /// RPN token stream is malformed
    #[error("Illegal RPN expression at token {index}, stack depth {stack_depth}")]
    IllegalExpression {
        /// Position of the offending token
        index: usize,
        /// Stack depth when the problem was detected
        stack_depth: usize,
    },

    /// Definition table entry failed validation
    #[error("{table} table entry {entry} failed validation: {reason}")]
    Validation {
        /// Which table was rejected
        table: Table,
        /// Index of the first failing entry
        entry: u16,
        /// Why it failed
        reason: ValidationReason,
    },

    /// Watchpoint index out of range
    #[error("Invalid watchpoint number {index}")]
    InvalidWatchpoint {
        /// Requested index
        index: u16,
    },

    /// Actionpoint index out of range
    #[error("Invalid actionpoint number {index}")]
    InvalidActionpoint {
        /// Requested index
        index: u16,
    },

    /// Actionpoint is in a state the request may not leave
    #[error("Actionpoint {actionpoint} in state {state} rejects the request")]
    InvalidCurrentState {
        /// Actionpoint index
        actionpoint: u16,
        /// Raw current state
        state: u8,
    },

    /// Requested state cannot be entered by command
    #[error("State {state} cannot be commanded")]
    InvalidNewState {
        /// Raw requested state
        state: u8,
    },
}

/// Definition table kinds
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// Watchpoint definition table
    #[error("Watchpoint")]
    Watchpoint,
    /// Actionpoint definition table
    #[error("Actionpoint")]
    Actionpoint,
}

/// First-failure reason reported by table validation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// Watchpoint data type tag undefined
    #[error("bad data type")]
    DataType,
    /// Watchpoint operator id undefined
    #[error("bad operator")]
    Operator,
    /// Watchpoint message id beyond the highest valid id
    #[error("bad message id")]
    MessageId,
    /// Float comparison value is NaN
    #[error("comparison value is NaN")]
    FloatNaN,
    /// Float comparison value is infinite
    #[error("comparison value is infinite")]
    FloatInfinite,
    /// Actionpoint default state undefined
    #[error("bad default state")]
    DefaultState,
    /// Actionpoint response id out of range
    #[error("bad response id")]
    ResponseId,
    /// Actionpoint fail threshold is zero
    #[error("fail threshold is zero")]
    FailThreshold,
    /// Actionpoint notification severity undefined
    #[error("bad event severity")]
    Severity,
    /// Actionpoint RPN equation is malformed
    #[error("RPN invalid at token {index}, stack depth {stack_depth}")]
    Rpn {
        /// Position of the offending token
        index: usize,
        /// Symbolic stack depth at that point
        stack_depth: usize,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for LcError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::DataType { data_type } =>
                defmt::write!(fmt, "Undefined data type {}", data_type),
            Self::Operator { operator_id } =>
                defmt::write!(fmt, "Undefined operator {}", operator_id),
            Self::Offset { offset, width, message_len } =>
                defmt::write!(fmt, "Offset {}+{} > len {}", offset, width, message_len),
            Self::FloatNaN =>
                defmt::write!(fmt, "Float NaN"),
            Self::IllegalExpression { index, stack_depth } =>
                defmt::write!(fmt, "Illegal RPN at {}, depth {}", index, stack_depth),
            Self::Validation { table, entry, reason } =>
                defmt::write!(fmt, "{} entry {} invalid: {}", table, entry, reason),
            Self::InvalidWatchpoint { index } =>
                defmt::write!(fmt, "Invalid WP {}", index),
            Self::InvalidActionpoint { index } =>
                defmt::write!(fmt, "Invalid AP {}", index),
            Self::InvalidCurrentState { actionpoint, state } =>
                defmt::write!(fmt, "AP {} state {} rejects request", actionpoint, state),
            Self::InvalidNewState { state } =>
                defmt::write!(fmt, "State {} not commandable", state),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Table {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Watchpoint => defmt::write!(fmt, "WDT"),
            Self::Actionpoint => defmt::write!(fmt, "ADT"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ValidationReason {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Rpn { index, stack_depth } =>
                defmt::write!(fmt, "RPN at {}, depth {}", index, stack_depth),
            other => defmt::write!(fmt, "{}", defmt::Debug2Format(other)),
        }
    }
}
