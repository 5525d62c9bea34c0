//! Packed Result Views for Housekeeping
//!
//! Ground telemetry carries every result in a few hundred bytes:
//!
//! ```text
//! watch results  : 2 bits each, 4 per byte, slot i at bits (i % 4) * 2
//!                  False 0, True 1, Error 2, Stale 3
//!
//! action results : 4 bits each, 2 per byte, even slot in the low nibble
//!                  nibble = state << 2 | result
//!                  state  Unused/PermanentlyOff 0, Active 1, Passive 2, Disabled 3
//!                  result Pass 0, Fail 1, Error 2, Stale 3
//! ```

use crate::{
    actionpoint::{ActionpointResult, ApState},
    constants::tables::{PACKED_ACTION_RESULTS, PACKED_WATCH_RESULTS},
    engine::{EngineCounters, LcMode},
    watchpoint::WatchpointResult,
};

/// Housekeeping view of the whole engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HousekeepingSnapshot {
    /// Operating mode
    pub mode: LcMode,
    /// Engine-wide counters
    pub counters: EngineCounters,
    /// Watchpoints defined by the loaded table
    pub watchpoints_in_use: u16,
    /// Actionpoints currently in the `Active` state
    pub active_actionpoints: u16,
    /// Packed watchpoint results
    pub watch_results: [u8; PACKED_WATCH_RESULTS],
    /// Packed actionpoint states and results
    pub action_results: [u8; PACKED_ACTION_RESULTS],
}

/// Pack watchpoint results, 4 per byte
pub fn pack_watch_results(results: &[WatchpointResult]) -> [u8; PACKED_WATCH_RESULTS] {
    let mut packed = [0u8; PACKED_WATCH_RESULTS];
    for (slot, result) in results.iter().enumerate().take(PACKED_WATCH_RESULTS * 4) {
        packed[slot / 4] |= (result.result as u8) << ((slot % 4) * 2);
    }
    packed
}

/// Pack actionpoint states and results, 2 per byte
pub fn pack_action_results(results: &[ActionpointResult]) -> [u8; PACKED_ACTION_RESULTS] {
    let mut packed = [0u8; PACKED_ACTION_RESULTS];
    for (slot, result) in results.iter().enumerate().take(PACKED_ACTION_RESULTS * 2) {
        let nibble = (state_code(result.state) << 2) | result.result as u8;
        packed[slot / 2] |= nibble << ((slot % 2) * 4);
    }
    packed
}

fn state_code(state: ApState) -> u8 {
    match state {
        ApState::Unused | ApState::PermanentlyOff => 0,
        ApState::Active => 1,
        ApState::Passive => 2,
        ApState::Disabled => 3,
    }
}
