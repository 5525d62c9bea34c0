//! Limit Checking Engine
//!
//! ## Overview
//!
//! [`Engine`] owns everything the limit checker keeps between calls: the
//! decoded definition tables, both result tables, the dispatch index, the
//! engine-wide counters and the operating mode. The driver hands it one
//! request at a time together with the collaborators that request needs:
//!
//! ```text
//!   table load ──► load_tables ──► validate ──► decode ──► reset results ──► rebuild index
//!   telemetry  ──► process_message ──► dispatch index ──► watchpoint evaluation
//!   sample req ──► sample ──► actionpoint state machine ──► responses / notifications
//!   hk request ──► housekeeping ──► age watchpoints ──► packed snapshot
//! ```
//!
//! ## Operating Modes
//!
//! - **Active**: actionpoints are sampled and may request responses
//! - **Passive**: actionpoints are sampled; responses are counted, not sent
//! - **Disabled**: sample requests are ignored
//!
//! Watchpoints are evaluated in every mode.
//!
//! ## Example
//!
//! ```no_run
//! use limitguard_core::{
//!     constants::{limits::RPN_EQUAL, MAX_ACTIONPOINTS, MAX_WATCHPOINTS},
//!     ActionpointDefinition, ApState, DataType, Engine, Message, MessageId,
//!     NoCustomPredicate, NullSink, NullTransport, Operator, SampleRequest,
//!     WatchpointDefinition,
//! };
//!
//! let mut watchpoints = [WatchpointDefinition::UNUSED; MAX_WATCHPOINTS];
//! watchpoints[0] = WatchpointDefinition::new(DataType::U16Be, Operator::Gt, 0x0801, 12)
//!     .with_comparison(3000)
//!     .with_stale_age(5);
//!
//! let mut actionpoints: [ActionpointDefinition; MAX_ACTIONPOINTS] =
//!     core::array::from_fn(|_| ActionpointDefinition::unused());
//! actionpoints[0] = ActionpointDefinition::new(ApState::Active, 12, 3, &[0, RPN_EQUAL]);
//!
//! let mut engine = Engine::new();
//! engine
//!     .load_tables(&watchpoints, &actionpoints, &mut NullTransport, &mut NullSink)
//!     .expect("tables are valid");
//!
//! let packet = [0u8; 64];
//! engine.process_message(
//!     &Message::new(MessageId(0x0801), &packet, 0),
//!     &mut NoCustomPredicate,
//!     &mut NullSink,
//! );
//! engine
//!     .sample(SampleRequest::all(), &mut NullTransport, &mut NullSink)
//!     .expect("sample all is always in range");
//! ```

use crate::{
    actionpoint::{
        sampler::Sampler, ActionIndex, Actionpoint, ActionpointDefinition, ActionpointResult,
        ApState,
    },
    constants::{ALL_ACTIONPOINTS, ALL_WATCHPOINTS, MAX_ACTIONPOINTS, MAX_WATCHPOINTS},
    dispatch::DispatchIndex,
    errors::{LcError, LcResult, Table},
    events::{Notification, TableCounts},
    message::Message,
    report::{pack_action_results, pack_watch_results, HousekeepingSnapshot},
    traits::{CustomPredicate, EventSink, Transport},
    validation::{validate_actionpoints, validate_watchpoints},
    watchpoint::{extract, WatchIndex, WatchResult, Watchpoint, WatchpointDefinition, WatchpointResult},
};

/// Engine operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LcMode {
    /// Sample actionpoints and send responses
    #[default]
    Active,
    /// Sample actionpoints, suppress responses
    Passive,
    /// Ignore sample requests
    Disabled,
}

#[cfg(feature = "defmt")]
impl defmt::Format for LcMode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Active => defmt::write!(fmt, "ACTIVE"),
            Self::Passive => defmt::write!(fmt, "PASSIVE"),
            Self::Disabled => defmt::write!(fmt, "DISABLED"),
        }
    }
}

/// Engine-wide counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineCounters {
    /// Sample requests processed
    pub ap_sample_count: u32,
    /// Messages that reached at least one watchpoint
    pub monitored_msg_count: u32,
    /// Responses requested
    pub response_exec_count: u32,
    /// Responses suppressed while the engine was passive
    pub passive_response_count: u32,
}

/// Actionpoint range to sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleRequest {
    /// First actionpoint, or `ALL_ACTIONPOINTS`
    pub start: u16,
    /// Last actionpoint (inclusive), or `ALL_ACTIONPOINTS`
    pub end: u16,
    /// Age watchpoint results after sampling
    pub update_age: bool,
}

impl SampleRequest {
    /// Sample `start..=end`
    pub const fn range(start: u16, end: u16) -> Self {
        Self { start, end, update_age: false }
    }

    /// Sample every actionpoint
    pub const fn all() -> Self {
        Self::range(ALL_ACTIONPOINTS, ALL_ACTIONPOINTS)
    }

    /// Also age watchpoint results afterwards
    pub const fn with_aging(mut self) -> Self {
        self.update_age = true;
        self
    }
}

/// Good/bad/unused counts of an accepted load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Watchpoint table counts
    pub watchpoints: TableCounts,
    /// Actionpoint table counts
    pub actionpoints: TableCounts,
}

/// The limit checker
pub struct Engine {
    mode: LcMode,
    counters: EngineCounters,
    watchpoints: [Option<Watchpoint>; MAX_WATCHPOINTS],
    actionpoints: [Option<Actionpoint>; MAX_ACTIONPOINTS],
    watch_results: [WatchpointResult; MAX_WATCHPOINTS],
    action_results: [ActionpointResult; MAX_ACTIONPOINTS],
    index: DispatchIndex,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with empty tables in the default mode
    pub fn new() -> Self {
        Self {
            mode: LcMode::default(),
            counters: EngineCounters::default(),
            watchpoints: [None; MAX_WATCHPOINTS],
            actionpoints: core::array::from_fn(|_| None),
            watch_results: [WatchpointResult::default(); MAX_WATCHPOINTS],
            action_results: [ActionpointResult::default(); MAX_ACTIONPOINTS],
            index: DispatchIndex::new(),
        }
    }

    // ========================================================================
    // Table load
    // ========================================================================

    /// Validate and install new definition tables
    ///
    /// Both tables are validated and each outcome is announced. If either
    /// is rejected the loaded tables stay in force and the first rejection
    /// is returned. On success both result tables are reset, actionpoints
    /// take their default state and the dispatch index is rebuilt.
    pub fn load_tables(
        &mut self,
        watchpoints: &[WatchpointDefinition; MAX_WATCHPOINTS],
        actionpoints: &[ActionpointDefinition; MAX_ACTIONPOINTS],
        transport: &mut dyn Transport,
        sink: &mut dyn EventSink,
    ) -> LcResult<LoadReport> {
        let watch_report = validate_watchpoints(watchpoints);
        sink.emit(&watch_report.notification(Table::Watchpoint));
        let action_report = validate_actionpoints(actionpoints);
        sink.emit(&action_report.notification(Table::Actionpoint));

        let report = LoadReport {
            watchpoints: watch_report.into_result(Table::Watchpoint).map_err(|err| {
                lc_error!("Watchpoint table rejected: {}", err);
                err
            })?,
            actionpoints: action_report.into_result(Table::Actionpoint).map_err(|err| {
                lc_error!("Actionpoint table rejected: {}", err);
                err
            })?,
        };

        for (slot, definition) in self.watchpoints.iter_mut().zip(watchpoints) {
            *slot = Watchpoint::decode(definition).ok().flatten();
        }
        for (slot, definition) in self.actionpoints.iter_mut().zip(actionpoints) {
            *slot = Actionpoint::decode(definition).ok().flatten();
        }

        self.watch_results = [WatchpointResult::default(); MAX_WATCHPOINTS];
        for (result, actionpoint) in self.action_results.iter_mut().zip(&self.actionpoints) {
            *result = match actionpoint {
                Some(ap) => ActionpointResult::with_state(ap.default_state),
                None => ActionpointResult::default(),
            };
        }

        self.index.rebuild(&self.watchpoints, transport, sink);

        lc_info!(
            "Tables loaded: {} watchpoints, {} actionpoints",
            report.watchpoints.good, report.actionpoints.good
        );
        Ok(report)
    }

    // ========================================================================
    // Telemetry
    // ========================================================================

    /// Evaluate every watchpoint that reads `message`
    ///
    /// A failing watchpoint is marked `Error` and reported; the remaining
    /// watchpoints are still evaluated.
    pub fn process_message(
        &mut self,
        message: &Message<'_>,
        predicate: &mut dyn CustomPredicate,
        sink: &mut dyn EventSink,
    ) {
        let mut watchers = self.index.lookup(message.id).peekable();
        if watchers.peek().is_none() {
            lc_debug!("No watchpoints reference message {}", message.id);
            sink.emit(&Notification::UnreferencedMessage { message_id: message.id });
            return;
        }

        self.counters.monitored_msg_count = self.counters.monitored_msg_count.saturating_add(1);

        for index in watchers {
            let Some(watchpoint) = &self.watchpoints[index.as_usize()] else {
                continue;
            };
            let result = &mut self.watch_results[index.as_usize()];

            match watchpoint.evaluate(index, message, predicate) {
                Ok((outcome, raw)) => {
                    result.record(outcome, raw, message.timestamp, watchpoint.stale_age);
                }
                Err(err) => {
                    // A field past the end of the packet was never evaluated
                    if matches!(err, LcError::Offset { .. }) {
                        result.record_error();
                    } else {
                        result.record(WatchResult::Error, 0, message.timestamp, 0);
                    }
                    if let Some(notification) = evaluation_failure(index, watchpoint, message, err) {
                        sink.emit(&notification);
                    }
                }
            }
        }
    }

    // ========================================================================
    // Sampling
    // ========================================================================

    /// Sample a range of actionpoints
    ///
    /// Ignored while the engine is disabled. `start > end` is a no-op; an
    /// `end` past the table is rejected and reported.
    pub fn sample(
        &mut self,
        request: SampleRequest,
        transport: &mut dyn Transport,
        sink: &mut dyn EventSink,
    ) -> LcResult<()> {
        if self.mode == LcMode::Disabled {
            return Ok(());
        }

        let (start, end) = if request.start == ALL_ACTIONPOINTS && request.end == ALL_ACTIONPOINTS {
            (0, MAX_ACTIONPOINTS as u16 - 1)
        } else if request.start > request.end {
            return Ok(());
        } else if request.end as usize >= MAX_ACTIONPOINTS {
            sink.emit(&Notification::SampleRangeInvalid { start: request.start, end: request.end });
            return Err(LcError::InvalidActionpoint { index: request.end });
        } else {
            (request.start, request.end)
        };

        let mut sampler = Sampler::new(self.mode, &mut self.counters, transport, sink);
        for raw in start..=end {
            let Some(index) = ActionIndex::new(raw) else {
                break;
            };
            if let Some(actionpoint) = &self.actionpoints[index.as_usize()] {
                sampler.sample(
                    index,
                    actionpoint,
                    &mut self.action_results[index.as_usize()],
                    &self.watch_results,
                );
            }
        }

        self.counters.ap_sample_count = self.counters.ap_sample_count.saturating_add(1);

        if request.update_age {
            self.age_watchpoints();
        }
        Ok(())
    }

    /// Advance every watchpoint's staleness countdown by one cycle
    pub fn age_watchpoints(&mut self) {
        for result in &mut self.watch_results {
            result.age();
        }
    }

    // ========================================================================
    // Operator commands
    // ========================================================================

    /// Current operating mode
    pub const fn mode(&self) -> LcMode {
        self.mode
    }

    /// Change the operating mode
    pub fn set_mode(&mut self, mode: LcMode) {
        if mode != self.mode {
            lc_info!("Mode change {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Command one actionpoint, or all with `ALL_ACTIONPOINTS`, to `state`
    ///
    /// With `ALL_ACTIONPOINTS`, unused and permanently-off slots are skipped.
    pub fn set_actionpoint_state(&mut self, target: u16, state: ApState) -> LcResult<()> {
        if !state.is_commandable() {
            return Err(LcError::InvalidNewState { state: state.raw() });
        }

        if target == ALL_ACTIONPOINTS {
            for (index, result) in ActionIndex::all().zip(self.action_results.iter_mut()) {
                if !matches!(result.state, ApState::Unused | ApState::PermanentlyOff) {
                    result.command_state(index, state)?;
                }
            }
            return Ok(());
        }

        let index = action_index(target)?;
        self.action_results[index.as_usize()].command_state(index, state)
    }

    /// Switch one disabled actionpoint permanently off
    pub fn set_actionpoint_permanently_off(&mut self, target: u16) -> LcResult<()> {
        let index = action_index(target)?;
        self.action_results[index.as_usize()].command_permanently_off(index)
    }

    /// Clear one actionpoint's statistics, or all with `ALL_ACTIONPOINTS`
    pub fn reset_actionpoint_stats(&mut self, target: u16) -> LcResult<()> {
        if target == ALL_ACTIONPOINTS {
            self.action_results.iter_mut().for_each(ActionpointResult::reset_stats);
            return Ok(());
        }
        let index = action_index(target)?;
        self.action_results[index.as_usize()].reset_stats();
        Ok(())
    }

    /// Clear one watchpoint's statistics, or all with `ALL_WATCHPOINTS`
    pub fn reset_watchpoint_stats(&mut self, target: u16) -> LcResult<()> {
        if target == ALL_WATCHPOINTS {
            self.watch_results.iter_mut().for_each(WatchpointResult::reset);
            return Ok(());
        }
        let index = WatchIndex::new(target).ok_or(LcError::InvalidWatchpoint { index: target })?;
        self.watch_results[index.as_usize()].reset();
        Ok(())
    }

    /// Zero the engine-wide counters
    pub fn reset_counters(&mut self) {
        self.counters = EngineCounters::default();
    }

    // ========================================================================
    // Housekeeping
    // ========================================================================

    /// Age watchpoint results, then snapshot
    pub fn housekeeping(&mut self) -> HousekeepingSnapshot {
        self.age_watchpoints();
        self.snapshot()
    }

    /// Packed view of the current results and counters
    pub fn snapshot(&self) -> HousekeepingSnapshot {
        HousekeepingSnapshot {
            mode: self.mode,
            counters: self.counters,
            watchpoints_in_use: self.watchpoints_in_use(),
            active_actionpoints: self.active_actionpoints(),
            watch_results: pack_watch_results(&self.watch_results),
            action_results: pack_action_results(&self.action_results),
        }
    }

    /// Engine-wide counters
    pub const fn counters(&self) -> &EngineCounters {
        &self.counters
    }

    /// Watchpoints defined by the loaded table
    pub fn watchpoints_in_use(&self) -> u16 {
        self.watchpoints.iter().filter(|wp| wp.is_some()).count() as u16
    }

    /// Actionpoints currently in the `Active` state
    pub fn active_actionpoints(&self) -> u16 {
        self.action_results
            .iter()
            .filter(|result| result.state == ApState::Active)
            .count() as u16
    }

    /// Decoded watchpoint, `None` for an empty slot
    pub fn watchpoint(&self, index: WatchIndex) -> Option<&Watchpoint> {
        self.watchpoints[index.as_usize()].as_ref()
    }

    /// Decoded actionpoint, `None` for an empty slot
    pub fn actionpoint(&self, index: ActionIndex) -> Option<&Actionpoint> {
        self.actionpoints[index.as_usize()].as_ref()
    }

    /// Runtime state of one watchpoint
    pub fn watchpoint_result(&self, index: WatchIndex) -> &WatchpointResult {
        &self.watch_results[index.as_usize()]
    }

    /// Runtime state of one actionpoint
    pub fn actionpoint_result(&self, index: ActionIndex) -> &ActionpointResult {
        &self.action_results[index.as_usize()]
    }

    /// Dispatch index of the loaded watchpoint table
    pub const fn dispatch(&self) -> &DispatchIndex {
        &self.index
    }
}

fn action_index(target: u16) -> LcResult<ActionIndex> {
    ActionIndex::new(target).ok_or(LcError::InvalidActionpoint { index: target })
}

fn evaluation_failure(
    index: WatchIndex,
    watchpoint: &Watchpoint,
    message: &Message<'_>,
    err: LcError,
) -> Option<Notification> {
    let watchpoint_id = index.get();
    match err {
        LcError::DataType { data_type } => {
            lc_error!("WP {} undefined data type {}", watchpoint_id, data_type);
            Some(Notification::WatchDataType { watchpoint: watchpoint_id, data_type })
        }
        LcError::Operator { operator_id } => {
            lc_error!("WP {} undefined operator {}", watchpoint_id, operator_id);
            Some(Notification::WatchOperator { watchpoint: watchpoint_id, operator_id })
        }
        LcError::Offset { offset, width, message_len } => {
            lc_error!(
                "WP {} offset {} + {} past end of message {} ({} bytes)",
                watchpoint_id, offset, width, message.id, message_len
            );
            Some(Notification::WatchOffset {
                watchpoint: watchpoint_id,
                message_id: message.id,
                offset,
                width,
                message_len,
            })
        }
        LcError::FloatNaN => {
            let value = extract::extract(watchpoint.data_type, message.payload, watchpoint.offset)
                .map_or(0, |raw| raw & watchpoint.bitmask);
            lc_error!("WP {} extracted NaN 0x{:08X}", watchpoint_id, value);
            Some(Notification::WatchNaN { watchpoint: watchpoint_id, value })
        }
        _ => None,
    }
}
