//! Common test utilities for integration tests
//!
//! This module provides:
//! - A recording transport and a recording notification sink
//! - Table builders that start from all-unused definition tables
//! - Packet builders for big- and little-endian fields

#![allow(dead_code)]

use limitguard_core::{
    constants::{MAX_ACTIONPOINTS, MAX_WATCHPOINTS},
    ActionpointDefinition, Engine, EventSink, LoadReport, Message, MessageId, NoCustomPredicate,
    Notification, SampleRequest, Transport, TransportStatus, WatchpointDefinition,
};

/// Transport that remembers every call
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub subscribed: Vec<MessageId>,
    pub unsubscribed: Vec<MessageId>,
    pub responses: Vec<u16>,
    /// Identifiers whose registration fails with status -1
    pub refuse: Vec<MessageId>,
    /// Identifiers whose withdrawal fails with status -2
    pub refuse_unsubscribe: Vec<MessageId>,
}

impl Transport for RecordingTransport {
    fn subscribe(&mut self, id: MessageId) -> Result<(), TransportStatus> {
        self.subscribed.push(id);
        if self.refuse.contains(&id) {
            Err(-1)
        } else {
            Ok(())
        }
    }

    fn unsubscribe(&mut self, id: MessageId) -> Result<(), TransportStatus> {
        self.unsubscribed.push(id);
        if self.refuse_unsubscribe.contains(&id) {
            Err(-2)
        } else {
            Ok(())
        }
    }

    fn send_response(&mut self, response_id: u16) {
        self.responses.push(response_id);
    }
}

/// Sink that keeps every notification
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub notifications: Vec<Notification>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }
}

impl RecordingSink {
    /// Number of notifications carrying `id`
    pub fn count(&self, id: u16) -> usize {
        self.notifications.iter().filter(|n| n.id() == id).count()
    }

    /// Drop everything recorded so far
    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

/// All-unused watchpoint table
pub fn watch_table() -> [WatchpointDefinition; MAX_WATCHPOINTS] {
    [WatchpointDefinition::UNUSED; MAX_WATCHPOINTS]
}

/// All-unused actionpoint table
pub fn action_table() -> [ActionpointDefinition; MAX_ACTIONPOINTS] {
    core::array::from_fn(|_| ActionpointDefinition::unused())
}

/// Engine, collaborators and packet time in one place
pub struct Harness {
    pub engine: Engine,
    pub transport: RecordingTransport,
    pub sink: RecordingSink,
    pub time: u64,
}

impl Harness {
    /// Fresh engine with the given tables loaded
    pub fn load(
        watchpoints: &[WatchpointDefinition; MAX_WATCHPOINTS],
        actionpoints: &[ActionpointDefinition; MAX_ACTIONPOINTS],
    ) -> Self {
        let mut harness = Self {
            engine: Engine::new(),
            transport: RecordingTransport::default(),
            sink: RecordingSink::default(),
            time: 0,
        };
        harness
            .reload(watchpoints, actionpoints)
            .expect("test tables must validate");
        harness
    }

    /// Load new tables into the running engine
    pub fn reload(
        &mut self,
        watchpoints: &[WatchpointDefinition; MAX_WATCHPOINTS],
        actionpoints: &[ActionpointDefinition; MAX_ACTIONPOINTS],
    ) -> limitguard_core::LcResult<LoadReport> {
        self.engine
            .load_tables(watchpoints, actionpoints, &mut self.transport, &mut self.sink)
    }

    /// Deliver one packet, advancing packet time by one tick
    pub fn deliver(&mut self, id: u16, payload: &[u8]) {
        self.time += 1;
        self.engine.process_message(
            &Message::new(MessageId(id), payload, self.time),
            &mut NoCustomPredicate,
            &mut self.sink,
        );
    }

    /// Sample every actionpoint
    pub fn sample_all(&mut self) {
        self.engine
            .sample(SampleRequest::all(), &mut self.transport, &mut self.sink)
            .expect("sampling all actionpoints cannot be out of range");
    }
}

/// Payload of `len` zero bytes with a big-endian u16 at `offset`
pub fn packet_u16_be(len: usize, offset: usize, value: u16) -> Vec<u8> {
    let mut packet = vec![0u8; len];
    packet[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    packet
}

/// Payload of `len` zero bytes with a little-endian f32 at `offset`
pub fn packet_f32_le(len: usize, offset: usize, value: f32) -> Vec<u8> {
    let mut packet = vec![0u8; len];
    packet[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    packet
}
