//! Message Dispatch Index
//!
//! Maps a message identifier to the watchpoints that read it, so a received
//! packet only touches the watchpoints it can affect.
//!
//! ## Layout
//!
//! ```text
//! buckets[id & MASK] ──► message link ──► message link ──► NONE
//!                           │
//!                           └─► first_watch ──► watch_next[..] ──► ... ──► NONE
//! ```
//!
//! All links are `u16` slot numbers into fixed arrays sized by the table
//! capacity; `NONE` terminates a chain. Watchpoints hang off their message
//! in definition-table order, so lookups are deterministic.
//!
//! The index is rebuilt from scratch on every table load. Rebuilding also
//! keeps the transport's interest registrations in step with it: every
//! identifier of the old index is withdrawn before the new set is
//! registered.

use crate::{
    constants::{tables::HASH_TABLE_MASK, HASH_TABLE_ENTRIES, MAX_WATCHPOINTS},
    events::Notification,
    message::MessageId,
    traits::{EventSink, Transport},
    watchpoint::{WatchIndex, Watchpoint},
};

/// End-of-chain sentinel
const NONE: u16 = u16::MAX;

#[derive(Debug, Clone, Copy)]
struct MessageLink {
    message_id: MessageId,
    first_watch: u16,
    last_watch: u16,
    next: u16,
}

impl MessageLink {
    const EMPTY: Self = Self {
        message_id: MessageId(0),
        first_watch: NONE,
        last_watch: NONE,
        next: NONE,
    };
}

/// Message identifier to watchpoint index
#[derive(Debug, Clone)]
pub struct DispatchIndex {
    buckets: [u16; HASH_TABLE_ENTRIES],
    messages: [MessageLink; MAX_WATCHPOINTS],
    watch_next: [u16; MAX_WATCHPOINTS],
    message_count: u16,
    watch_count: u16,
}

impl Default for DispatchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchIndex {
    /// Empty index
    pub const fn new() -> Self {
        Self {
            buckets: [NONE; HASH_TABLE_ENTRIES],
            messages: [MessageLink::EMPTY; MAX_WATCHPOINTS],
            watch_next: [NONE; MAX_WATCHPOINTS],
            message_count: 0,
            watch_count: 0,
        }
    }

    /// Number of distinct message identifiers indexed
    pub const fn message_count(&self) -> u16 {
        self.message_count
    }

    /// Number of watchpoints indexed
    pub const fn watchpoint_count(&self) -> u16 {
        self.watch_count
    }

    /// Distinct identifiers in first-reference order
    pub fn message_ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.messages[..self.message_count as usize]
            .iter()
            .map(|link| link.message_id)
    }

    /// Watchpoints reading `id`, in definition-table order
    pub fn lookup(&self, id: MessageId) -> Watchers<'_> {
        let first = match self.find(id) {
            Some(slot) => self.messages[slot as usize].first_watch,
            None => NONE,
        };
        Watchers { next: first, links: &self.watch_next }
    }

    /// Rebuild from a decoded watchpoint table
    ///
    /// Registration failures are reported through `sink` and never stop the
    /// rebuild.
    pub fn rebuild(
        &mut self,
        watchpoints: &[Option<Watchpoint>],
        transport: &mut dyn Transport,
        sink: &mut dyn EventSink,
    ) {
        for message_id in self.message_ids() {
            if let Err(status) = transport.unsubscribe(message_id) {
                lc_error!("Unsubscribe from {} failed: {}", message_id, status);
                sink.emit(&Notification::UnsubscribeFailed { message_id, status });
            }
        }

        self.clear();

        let mut previous: Option<(MessageId, u16)> = None;
        for (slot, watchpoint) in watchpoints.iter().enumerate().take(MAX_WATCHPOINTS) {
            let Some(watchpoint) = watchpoint else {
                continue;
            };
            let id = watchpoint.message_id;

            let message = match previous {
                Some((last_id, last_slot)) if last_id == id => last_slot,
                _ => match self.find(id) {
                    Some(found) => found,
                    None => self.insert_message(id),
                },
            };

            self.append_watch(message, slot as u16);
            previous = Some((id, message));
        }

        let mut failures = 0u16;
        for message_id in self.message_ids() {
            if let Err(status) = transport.subscribe(message_id) {
                failures += 1;
                lc_error!("Subscribe to {} failed: {}", message_id, status);
                sink.emit(&Notification::SubscribeFailed { message_id, status });
            }
        }

        lc_info!(
            "Dispatch index rebuilt: {} messages, {} watchpoints, {} registration failures",
            self.message_count, self.watch_count, failures
        );
    }

    fn clear(&mut self) {
        self.buckets = [NONE; HASH_TABLE_ENTRIES];
        self.messages = [MessageLink::EMPTY; MAX_WATCHPOINTS];
        self.watch_next = [NONE; MAX_WATCHPOINTS];
        self.message_count = 0;
        self.watch_count = 0;
    }

    fn bucket(id: MessageId) -> usize {
        (id.value() & HASH_TABLE_MASK) as usize
    }

    fn find(&self, id: MessageId) -> Option<u16> {
        let mut slot = self.buckets[Self::bucket(id)];
        while slot != NONE {
            let link = &self.messages[slot as usize];
            if link.message_id == id {
                return Some(slot);
            }
            slot = link.next;
        }
        None
    }

    // At most one message per watchpoint, so the table never fills
    fn insert_message(&mut self, id: MessageId) -> u16 {
        let slot = self.message_count;
        let bucket = Self::bucket(id);
        self.messages[slot as usize] = MessageLink {
            message_id: id,
            next: self.buckets[bucket],
            ..MessageLink::EMPTY
        };
        self.buckets[bucket] = slot;
        self.message_count += 1;
        slot
    }

    fn append_watch(&mut self, message: u16, watch: u16) {
        let link = &mut self.messages[message as usize];
        if link.last_watch == NONE {
            link.first_watch = watch;
        } else {
            self.watch_next[link.last_watch as usize] = watch;
        }
        link.last_watch = watch;
        self.watch_count += 1;
    }
}

/// Iterator over the watchpoints reading one message
#[derive(Debug, Clone)]
pub struct Watchers<'a> {
    next: u16,
    links: &'a [u16; MAX_WATCHPOINTS],
}

impl Iterator for Watchers<'_> {
    type Item = WatchIndex;

    fn next(&mut self) -> Option<WatchIndex> {
        let index = WatchIndex::new(self.next)?;
        self.next = self.links[index.as_usize()];
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        traits::{NullSink, TransportStatus},
        watchpoint::{DataType, Operator, WatchpointDefinition},
    };

    #[derive(Default)]
    struct Registrations {
        subscribed: [u16; 16],
        subscribe_count: usize,
        unsubscribed: [u16; 16],
        unsubscribe_count: usize,
        refuse: Option<u16>,
        refuse_withdrawal: Option<u16>,
    }

    impl Transport for Registrations {
        fn subscribe(&mut self, id: MessageId) -> Result<(), TransportStatus> {
            self.subscribed[self.subscribe_count] = id.value();
            self.subscribe_count += 1;
            if self.refuse == Some(id.value()) {
                Err(-3)
            } else {
                Ok(())
            }
        }

        fn unsubscribe(&mut self, id: MessageId) -> Result<(), TransportStatus> {
            self.unsubscribed[self.unsubscribe_count] = id.value();
            self.unsubscribe_count += 1;
            if self.refuse_withdrawal == Some(id.value()) {
                Err(-4)
            } else {
                Ok(())
            }
        }

        fn send_response(&mut self, _response_id: u16) {}
    }

    #[derive(Default)]
    struct Failures {
        subscribe: usize,
        unsubscribe: usize,
    }

    impl EventSink for Failures {
        fn emit(&mut self, notification: &Notification) {
            match notification {
                Notification::SubscribeFailed { .. } => self.subscribe += 1,
                Notification::UnsubscribeFailed { message_id, status } => {
                    assert_eq!((*message_id, *status), (MessageId(0x10), -4));
                    self.unsubscribe += 1;
                }
                _ => {}
            }
        }
    }

    fn table(ids: &[Option<u16>]) -> [Option<Watchpoint>; MAX_WATCHPOINTS] {
        let mut table = [None; MAX_WATCHPOINTS];
        for (slot, id) in ids.iter().enumerate() {
            table[slot] = id.map(|id| {
                let def = WatchpointDefinition::new(DataType::U8, Operator::Eq, id, 0);
                Watchpoint::decode(&def).unwrap().unwrap()
            });
        }
        table
    }

    fn watchers(index: &DispatchIndex, id: u16) -> heapless::Vec<u16, 16> {
        index.lookup(MessageId(id)).map(WatchIndex::get).collect()
    }

    #[test]
    fn lookup_is_in_definition_order() {
        let mut index = DispatchIndex::new();
        let wps = table(&[Some(0x10), Some(0x10), Some(0x20), None, Some(0x10), Some(0x20)]);
        index.rebuild(&wps, &mut Registrations::default(), &mut NullSink);

        assert_eq!(watchers(&index, 0x10).as_slice(), &[0, 1, 4]);
        assert_eq!(watchers(&index, 0x20).as_slice(), &[2, 5]);
        assert!(watchers(&index, 0x30).is_empty());
        assert_eq!(index.message_count(), 2);
        assert_eq!(index.watchpoint_count(), 5);
        let ids: heapless::Vec<MessageId, 4> = index.message_ids().collect();
        assert_eq!(ids.as_slice(), &[MessageId(0x10), MessageId(0x20)]);
    }

    #[test]
    fn bucket_collisions_stay_distinct() {
        // 0x0105 and 0x0005 share bucket 5 at any table size
        let mut index = DispatchIndex::new();
        let wps = table(&[Some(0x0105), Some(0x0005), Some(0x0105)]);
        index.rebuild(&wps, &mut Registrations::default(), &mut NullSink);

        assert_eq!(watchers(&index, 0x0105).as_slice(), &[0, 2]);
        assert_eq!(watchers(&index, 0x0005).as_slice(), &[1]);
    }

    #[test]
    fn rebuild_withdraws_then_registers() {
        let mut index = DispatchIndex::new();
        let mut transport = Registrations::default();
        index.rebuild(&table(&[Some(0x10), Some(0x11)]), &mut transport, &mut NullSink);
        assert_eq!(transport.unsubscribe_count, 0);
        assert_eq!(&transport.subscribed[..2], &[0x10, 0x11]);

        let mut transport = Registrations::default();
        index.rebuild(&table(&[Some(0x12)]), &mut transport, &mut NullSink);
        assert_eq!(&transport.unsubscribed[..transport.unsubscribe_count], &[0x10, 0x11]);
        assert_eq!(&transport.subscribed[..transport.subscribe_count], &[0x12]);
        assert!(watchers(&index, 0x10).is_empty());
    }

    #[test]
    fn registration_failure_does_not_abort() {
        let mut index = DispatchIndex::new();
        let mut transport = Registrations { refuse: Some(0x10), ..Default::default() };
        let mut sink = Failures::default();
        index.rebuild(&table(&[Some(0x10), Some(0x11)]), &mut transport, &mut sink);

        assert_eq!(sink.subscribe, 1);
        assert_eq!(transport.subscribe_count, 2);
        assert_eq!(watchers(&index, 0x10).as_slice(), &[0]);
    }

    #[test]
    fn withdrawal_failure_does_not_abort() {
        let mut index = DispatchIndex::new();
        index.rebuild(&table(&[Some(0x10), Some(0x11)]), &mut Registrations::default(), &mut NullSink);

        let mut transport = Registrations { refuse_withdrawal: Some(0x10), ..Default::default() };
        let mut sink = Failures::default();
        index.rebuild(&table(&[Some(0x12), Some(0x10)]), &mut transport, &mut sink);

        assert_eq!(sink.unsubscribe, 1);
        assert_eq!(sink.subscribe, 0);
        assert_eq!(transport.unsubscribe_count, 2);
        assert_eq!(&transport.subscribed[..transport.subscribe_count], &[0x12, 0x10]);
        assert_eq!(watchers(&index, 0x12).as_slice(), &[0]);
        assert_eq!(watchers(&index, 0x10).as_slice(), &[1]);
    }
}
