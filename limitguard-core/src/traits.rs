//! Collaborator contracts
//!
//! The engine is pure computation over in-memory tables. Everything that
//! touches the outside world is reached through one of these traits, passed
//! in by the driver on each call. Keep implementations simple: they run
//! synchronously inside the engine's single execution context.

use crate::{
    events::Notification,
    message::{Message, MessageId},
    watchpoint::{WatchIndex, WatchResult},
};

/// Status code returned by a failing transport call
pub type TransportStatus = i32;

/// Message transport: interest registration and outgoing responses
pub trait Transport {
    /// Register interest in `id` so its messages reach the engine
    fn subscribe(&mut self, id: MessageId) -> Result<(), TransportStatus>;

    /// Withdraw interest in `id`
    fn unsubscribe(&mut self, id: MessageId) -> Result<(), TransportStatus>;

    /// Request execution of a corrective response
    ///
    /// Fire-and-forget. Delivery failures are the transport's to report.
    fn send_response(&mut self, response_id: u16);
}

/// Destination for engine notifications
pub trait EventSink {
    /// Deliver one notification
    fn emit(&mut self, notification: &Notification);
}

/// Extension point for the custom comparison operator
///
/// The returned result is authoritative, including `Error` and `Stale`.
pub trait CustomPredicate {
    /// Evaluate watchpoint `index` given its masked value
    fn evaluate(
        &mut self,
        index: WatchIndex,
        masked_value: u32,
        message: &Message<'_>,
        argument: u32,
    ) -> WatchResult;
}

impl<F> CustomPredicate for F
where
    F: FnMut(WatchIndex, u32, &Message<'_>, u32) -> WatchResult,
{
    fn evaluate(
        &mut self,
        index: WatchIndex,
        masked_value: u32,
        message: &Message<'_>,
        argument: u32,
    ) -> WatchResult {
        self(index, masked_value, message, argument)
    }
}

/// Predicate used when no mission-specific one is registered
///
/// Any watchpoint that reaches it evaluates to `Error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomPredicate;

impl CustomPredicate for NoCustomPredicate {
    fn evaluate(
        &mut self,
        index: WatchIndex,
        _masked_value: u32,
        _message: &Message<'_>,
        _argument: u32,
    ) -> WatchResult {
        lc_warn!("Custom operator on watchpoint {} with no predicate registered", index.get());
        WatchResult::Error
    }
}

/// Transport that accepts every registration and drops every response
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn subscribe(&mut self, _id: MessageId) -> Result<(), TransportStatus> {
        Ok(())
    }

    fn unsubscribe(&mut self, _id: MessageId) -> Result<(), TransportStatus> {
        Ok(())
    }

    fn send_response(&mut self, _response_id: u16) {}
}

/// Sink that discards notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _notification: &Notification) {}
}
