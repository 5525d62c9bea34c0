//! Notifications Emitted by the Engine
//!
//! ## Overview
//!
//! The engine never formats or transmits events itself. It decides *that*
//! something must be reported and with *which* parameters, then hands a
//! [`Notification`] to the driver's [`EventSink`](crate::traits::EventSink).
//! Formatting, filtering and downlink are the sink's business.
//!
//! ## Memory Model
//!
//! Notifications are plain values built on the stack:
//! - **Size**: the largest variant carries the actionpoint's 32-byte text
//! - **Lifetime**: borrowed by the sink for the duration of `emit`
//! - **No heap**: text lives in a `heapless::String`
//!
//! ## Identifiers and Severity
//!
//! Every variant maps to a fixed numeric identifier from
//! [`constants::events`](crate::constants::events) and a fixed
//! [`Severity`], except [`Notification::ResponseIssued`], whose identifier,
//! severity and text come from the actionpoint definition.
//!
//! ## Rendering
//!
//! `Display` renders the event text the ground expects:
//!
//! ```text
//! AP state change from PASS to FAIL: AP = 12
//! Battery undervolt: AP = 12, FailCount = 5, RTS = 40
//! ```

use core::fmt;

use heapless::String;

use crate::{
    constants::{events::*, MAX_ACTION_TEXT},
    errors::ValidationReason,
    message::MessageId,
};

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Severity {
    /// Diagnostic detail, normally filtered
    Debug = 1,
    /// Expected state change
    Info = 2,
    /// Something failed
    Error = 3,
    /// Needs operator attention
    Critical = 4,
}

impl Severity {
    /// Decode a raw severity from an actionpoint definition
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Severity::Debug),
            2 => Some(Severity::Info),
            3 => Some(Severity::Error),
            4 => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Good/bad/unused tallies of a validated table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    /// Entries in use that passed every check
    pub good: u16,
    /// Entries that failed a check
    pub bad: u16,
    /// Empty slots
    pub unused: u16,
}

/// Everything the engine reports
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Watchpoint table validated
    WatchTableValidated(TableCounts),

    /// Watchpoint table rejected
    WatchTableRejected {
        /// Index of the first rejected entry
        entry: u16,
        /// Why it was rejected
        reason: ValidationReason,
        /// Tallies for the whole table
        counts: TableCounts,
    },

    /// Actionpoint table validated
    ActionTableValidated(TableCounts),

    /// Actionpoint table rejected
    ActionTableRejected {
        /// Index of the first rejected entry
        entry: u16,
        /// Why it was rejected
        reason: ValidationReason,
        /// Tallies for the whole table
        counts: TableCounts,
    },

    /// Interest registration failed during an index rebuild
    SubscribeFailed {
        /// Message identifier
        message_id: MessageId,
        /// Status returned by the transport
        status: i32,
    },

    /// Interest withdrawal failed during an index rebuild
    UnsubscribeFailed {
        /// Message identifier
        message_id: MessageId,
        /// Status returned by the transport
        status: i32,
    },

    /// A message arrived that no watchpoint references
    UnreferencedMessage {
        /// Message identifier
        message_id: MessageId,
    },

    /// Watchpoint data type undefined at evaluation time
    WatchDataType {
        /// Watchpoint index
        watchpoint: u16,
        /// Raw data type
        data_type: u8,
    },

    /// Watchpoint operator undefined at evaluation time
    WatchOperator {
        /// Watchpoint index
        watchpoint: u16,
        /// Raw operator
        operator_id: u8,
    },

    /// Watchpoint field runs past the end of the message
    WatchOffset {
        /// Watchpoint index
        watchpoint: u16,
        /// Message identifier
        message_id: MessageId,
        /// Field offset in bytes
        offset: u16,
        /// Field width in bytes
        width: u8,
        /// Actual message length
        message_len: usize,
    },

    /// Watchpoint extracted a NaN float
    WatchNaN {
        /// Watchpoint index
        watchpoint: u16,
        /// Raw extracted bits
        value: u32,
    },

    /// Actionpoint equation is malformed
    IllegalExpression {
        /// Actionpoint index
        actionpoint: u16,
        /// Token position where evaluation stopped
        index: usize,
        /// Stack depth at that token
        stack_depth: usize,
    },

    /// Actionpoint evaluated to error
    ActionError {
        /// Actionpoint index
        actionpoint: u16,
    },

    /// Actionpoint went from pass to fail
    PassToFail {
        /// Actionpoint index
        actionpoint: u16,
    },

    /// Actionpoint went from fail to pass
    FailToPass {
        /// Actionpoint index
        actionpoint: u16,
    },

    /// Actionpoint kept failing after going passive
    FailedWhilePassive {
        /// Actionpoint index
        actionpoint: u16,
        /// Consecutive failures so far
        fail_count: u32,
        /// Configured response
        response_id: u16,
    },

    /// Actionpoint would have responded but the engine is passive
    ResponseSuppressed {
        /// Actionpoint index
        actionpoint: u16,
        /// Consecutive failures so far
        fail_count: u32,
        /// Configured response
        response_id: u16,
    },

    /// Actionpoint issued its response
    ResponseIssued {
        /// Actionpoint index
        actionpoint: u16,
        /// Consecutive failures so far
        fail_count: u32,
        /// Configured response
        response_id: u16,
        /// Configured event identifier
        event_id: u16,
        /// Configured event severity
        severity: Severity,
        /// Configured event text
        text: String<MAX_ACTION_TEXT>,
    },

    /// Sample request names actionpoints past the end of the table
    SampleRangeInvalid {
        /// First requested actionpoint
        start: u16,
        /// Last requested actionpoint
        end: u16,
    },
}

impl Notification {
    /// Numeric identifier
    pub fn id(&self) -> u16 {
        match self {
            Notification::WatchTableValidated(_) => WDTVAL_INF_EID,
            Notification::WatchTableRejected { .. } => WDTVAL_ERR_EID,
            Notification::ActionTableValidated(_) => ADTVAL_INF_EID,
            Notification::ActionTableRejected { reason: ValidationReason::Rpn { .. }, .. } => {
                ADTVAL_RPNERR_EID
            }
            Notification::ActionTableRejected { .. } => ADTVAL_ERR_EID,
            Notification::SubscribeFailed { .. } => SUBSCRIBE_ERR_EID,
            Notification::UnsubscribeFailed { .. } => UNSUBSCRIBE_ERR_EID,
            Notification::UnreferencedMessage { .. } => MID_INF_EID,
            Notification::WatchDataType { .. } => WP_DATATYPE_ERR_EID,
            Notification::WatchOperator { .. } => WP_OPERID_ERR_EID,
            Notification::WatchOffset { .. } => WP_OFFSET_ERR_EID,
            Notification::WatchNaN { .. } => WP_NAN_ERR_EID,
            Notification::IllegalExpression { .. } => INVALID_RPN_ERR_EID,
            Notification::ActionError { .. } => ACTION_ERROR_ERR_EID,
            Notification::PassToFail { .. } => AP_PASSTOFAIL_INF_EID,
            Notification::FailToPass { .. } => AP_FAILTOPASS_INF_EID,
            Notification::FailedWhilePassive { .. } => AP_PASSIVE_FAIL_INF_EID,
            Notification::ResponseSuppressed { .. } => PASSIVE_FAIL_DBG_EID,
            Notification::ResponseIssued { event_id, .. } => *event_id,
            Notification::SampleRangeInvalid { .. } => APSAMPLE_APNUM_ERR_EID,
        }
    }

    /// Severity
    pub fn severity(&self) -> Severity {
        match self {
            Notification::WatchTableValidated(_)
            | Notification::ActionTableValidated(_)
            | Notification::UnreferencedMessage { .. }
            | Notification::PassToFail { .. }
            | Notification::FailToPass { .. }
            | Notification::FailedWhilePassive { .. } => Severity::Info,
            Notification::ResponseSuppressed { .. } => Severity::Debug,
            Notification::ResponseIssued { severity, .. } => *severity,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::WatchTableValidated(c) => write!(
                f,
                "WDT verify results: good = {}, bad = {}, unused = {}",
                c.good, c.bad, c.unused
            ),
            Notification::WatchTableRejected { entry, reason, counts } => write!(
                f,
                "WDT verify err: WP = {}, {}; good = {}, bad = {}, unused = {}",
                entry, reason, counts.good, counts.bad, counts.unused
            ),
            Notification::ActionTableValidated(c) => write!(
                f,
                "ADT verify results: good = {}, bad = {}, unused = {}",
                c.good, c.bad, c.unused
            ),
            Notification::ActionTableRejected { entry, reason, counts } => write!(
                f,
                "ADT verify err: AP = {}, {}; good = {}, bad = {}, unused = {}",
                entry, reason, counts.good, counts.bad, counts.unused
            ),
            Notification::SubscribeFailed { message_id, status } => write!(
                f,
                "Error subscribing watchpoint: MID = {}, RC = {}",
                message_id, status
            ),
            Notification::UnsubscribeFailed { message_id, status } => write!(
                f,
                "Error unsubscribing watchpoint: MID = {}, RC = {}",
                message_id, status
            ),
            Notification::UnreferencedMessage { message_id } => {
                write!(f, "Msg with unreferenced message ID rcvd: ID = {}", message_id)
            }
            Notification::WatchDataType { watchpoint, data_type } => write!(
                f,
                "WP has undefined data type: WP = {}, DataType = {}",
                watchpoint, data_type
            ),
            Notification::WatchOperator { watchpoint, operator_id } => write!(
                f,
                "WP has invalid operator ID: WP = {}, OperID = {}",
                watchpoint, operator_id
            ),
            Notification::WatchOffset { watchpoint, message_id, offset, width, message_len } => {
                write!(
                    f,
                    "WP offset error: MID = {}, WP = {}, Offset = {}, DataSize = {}, MsgLen = {}",
                    message_id, watchpoint, offset, width, message_len
                )
            }
            Notification::WatchNaN { watchpoint, value } => {
                write!(f, "WP data value is a float NAN: WP = {}, Value = 0x{:08X}", watchpoint, value)
            }
            Notification::IllegalExpression { actionpoint, index, stack_depth } => write!(
                f,
                "AP has illegal RPN expression: AP = {}, LastOperand = {}, StackPtr = {}",
                actionpoint, index, stack_depth
            ),
            Notification::ActionError { actionpoint } => {
                write!(f, "AP evaluated to error: AP = {}", actionpoint)
            }
            Notification::PassToFail { actionpoint } => {
                write!(f, "AP state change from PASS to FAIL: AP = {}", actionpoint)
            }
            Notification::FailToPass { actionpoint } => {
                write!(f, "AP state change from FAIL to PASS: AP = {}", actionpoint)
            }
            Notification::FailedWhilePassive { actionpoint, fail_count, response_id } => write!(
                f,
                "AP failed while passive: AP = {}, FailCount = {}, RTS = {}",
                actionpoint, fail_count, response_id
            ),
            Notification::ResponseSuppressed { actionpoint, fail_count, response_id } => write!(
                f,
                "AP failed while LC App passive: AP = {}, FailCount = {}, RTS = {}",
                actionpoint, fail_count, response_id
            ),
            Notification::ResponseIssued { actionpoint, fail_count, response_id, text, .. } => write!(
                f,
                "{}: AP = {}, FailCount = {}, RTS = {}",
                text.as_str(), actionpoint, fail_count, response_id
            ),
            Notification::SampleRangeInvalid { start, end } => write!(
                f,
                "Sample AP error, invalid AP number: start = {}, end = {}",
                start, end
            ),
        }
    }
}
