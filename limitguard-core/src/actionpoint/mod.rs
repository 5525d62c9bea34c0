//! Actionpoints: Trigger Conditions over Watchpoints
//!
//! An actionpoint combines watchpoint results through an RPN equation. When
//! the equation fails often enough in a row, the actionpoint requests its
//! corrective response and drops to passive so the response is issued once.
//!
//! ## State Model
//!
//! ```text
//!            command            command
//!   Active ◄──────────► Passive ◄──────────► Disabled ──────► PermanentlyOff
//!     │                    ▲                              (one way, command)
//!     └── fail threshold ──┘
//!
//!   Unused: load-time only, never entered or left at runtime
//! ```
//!
//! Only `Active` and `Passive` actionpoints are sampled.

pub mod sampler;

use heapless::String;

use crate::{
    constants::{
        limits::{
            APSTATE_ACTIVE, APSTATE_DISABLED, APSTATE_NOT_USED, APSTATE_PASSIVE, APSTATE_PERMOFF,
            MAX_VALID_RESPONSE_ID,
        },
        MAX_ACTION_TEXT, MAX_ACTIONPOINTS, MAX_RPN_EQU_SIZE,
    },
    errors::{LcError, LcResult, ValidationReason},
    events::Severity,
    rpn,
};

/// Index of an actionpoint slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionIndex(u16);

impl ActionIndex {
    /// Checked constructor, `None` past the end of the table
    pub const fn new(index: u16) -> Option<Self> {
        if (index as usize) < MAX_ACTIONPOINTS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Raw index
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Index as a table offset
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Every slot in table order
    pub fn all() -> impl Iterator<Item = ActionIndex> {
        (0..MAX_ACTIONPOINTS as u16).map(ActionIndex)
    }
}

/// Operating state of an actionpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ApState {
    /// Sampled, responds on failure
    Active,
    /// Sampled, reports failures without responding
    Passive,
    /// Not sampled
    Disabled,
    /// Not sampled, cannot be re-enabled
    PermanentlyOff,
    /// Empty slot
    #[default]
    Unused,
}

impl ApState {
    /// Decode a raw table state
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            APSTATE_ACTIVE => Some(ApState::Active),
            APSTATE_PASSIVE => Some(ApState::Passive),
            APSTATE_DISABLED => Some(ApState::Disabled),
            APSTATE_PERMOFF => Some(ApState::PermanentlyOff),
            APSTATE_NOT_USED => Some(ApState::Unused),
            _ => None,
        }
    }

    /// Raw table state
    pub const fn raw(self) -> u8 {
        match self {
            ApState::Active => APSTATE_ACTIVE,
            ApState::Passive => APSTATE_PASSIVE,
            ApState::Disabled => APSTATE_DISABLED,
            ApState::PermanentlyOff => APSTATE_PERMOFF,
            ApState::Unused => APSTATE_NOT_USED,
        }
    }

    /// True for states that are sampled
    pub const fn is_sampled(self) -> bool {
        matches!(self, ApState::Active | ApState::Passive)
    }

    /// True for states a runtime command may set
    pub const fn is_commandable(self) -> bool {
        matches!(self, ApState::Active | ApState::Passive | ApState::Disabled)
    }
}

/// Outcome of one actionpoint evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ActionResult {
    /// Equation evaluated false
    Pass = 0,
    /// Equation evaluated true
    Fail = 1,
    /// Equation errored or is malformed
    Error = 2,
    /// Equation depends on stale data
    #[default]
    Stale = 3,
}

/// Raw actionpoint definition table entry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionpointDefinition {
    /// Raw state after load
    pub default_state: u8,
    /// Cap on "failed while passive" notifications
    pub max_passive_events: u16,
    /// Cap on pass-to-fail notifications
    pub max_pass_fail_events: u16,
    /// Cap on fail-to-pass notifications
    pub max_fail_pass_events: u16,
    /// Response requested on failure
    pub response_id: u16,
    /// Consecutive failures before the response is requested
    pub max_fails_before_response: u32,
    /// Raw RPN tokens
    pub equation: [u16; MAX_RPN_EQU_SIZE],
    /// Raw severity of the response notification
    pub event_severity: u8,
    /// Identifier of the response notification
    pub event_id: u16,
    /// Text of the response notification
    pub event_text: String<MAX_ACTION_TEXT>,
}

impl ActionpointDefinition {
    /// An empty slot
    pub fn unused() -> Self {
        Self {
            default_state: APSTATE_NOT_USED,
            max_passive_events: 0,
            max_pass_fail_events: 0,
            max_fail_pass_events: 0,
            response_id: 0,
            max_fails_before_response: 0,
            equation: [0; MAX_RPN_EQU_SIZE],
            event_severity: 0,
            event_id: 0,
            event_text: String::new(),
        }
    }

    /// Entry responding with `response_id` after `threshold` consecutive failures
    ///
    /// Event caps default to 1 and the notification to an info event with
    /// empty text.
    pub fn new(state: ApState, response_id: u16, threshold: u32, equation: &[u16]) -> Self {
        Self {
            default_state: state.raw(),
            max_passive_events: 1,
            max_pass_fail_events: 1,
            max_fail_pass_events: 1,
            response_id,
            max_fails_before_response: threshold,
            event_severity: Severity::Info as u8,
            ..Self::unused()
        }
        .with_equation(equation)
    }

    /// Replace the equation; extra tokens past the buffer length are dropped
    pub fn with_equation(mut self, tokens: &[u16]) -> Self {
        self.equation = [0; MAX_RPN_EQU_SIZE];
        for (slot, token) in self.equation.iter_mut().zip(tokens) {
            *slot = *token;
        }
        self
    }

    /// Set the three notification caps
    pub fn with_event_caps(mut self, passive: u16, pass_fail: u16, fail_pass: u16) -> Self {
        self.max_passive_events = passive;
        self.max_pass_fail_events = pass_fail;
        self.max_fail_pass_events = fail_pass;
        self
    }

    /// Set the response notification; text beyond the capacity is truncated
    pub fn with_event(mut self, severity: Severity, event_id: u16, text: &str) -> Self {
        self.event_severity = severity as u8;
        self.event_id = event_id;
        self.event_text.clear();
        for c in text.chars() {
            if self.event_text.push(c).is_err() {
                break;
            }
        }
        self
    }

    /// True when the slot is empty
    pub const fn is_unused(&self) -> bool {
        self.default_state == APSTATE_NOT_USED
    }
}

impl Default for ActionpointDefinition {
    fn default() -> Self {
        Self::unused()
    }
}

/// Decoded, load-time-checked actionpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Actionpoint {
    /// State restored on every table load
    pub default_state: ApState,
    /// Cap on failed-while-passive notifications
    pub max_passive_events: u16,
    /// Cap on pass-to-fail notifications
    pub max_pass_fail_events: u16,
    /// Cap on fail-to-pass notifications
    pub max_fail_pass_events: u16,
    /// Response requested when the threshold is reached
    pub response_id: u16,
    /// Consecutive failures that trigger the response
    pub fail_threshold: u32,
    /// Raw RPN tokens, terminated by `RPN_EQUAL`
    pub equation: [u16; MAX_RPN_EQU_SIZE],
    /// Severity of the response notification
    pub severity: Severity,
    /// Identifier of the response notification
    pub event_id: u16,
    /// Text of the response notification
    pub event_text: String<MAX_ACTION_TEXT>,
}

impl Actionpoint {
    /// Decode a raw entry
    ///
    /// `Ok(None)` for an empty slot. Checks run in order: default state,
    /// response id, fail threshold, severity, equation.
    pub fn decode(definition: &ActionpointDefinition) -> Result<Option<Self>, ValidationReason> {
        let default_state =
            ApState::from_raw(definition.default_state).ok_or(ValidationReason::DefaultState)?;
        if default_state == ApState::Unused {
            return Ok(None);
        }

        if definition.response_id > MAX_VALID_RESPONSE_ID {
            return Err(ValidationReason::ResponseId);
        }
        if definition.max_fails_before_response == 0 {
            return Err(ValidationReason::FailThreshold);
        }
        let severity =
            Severity::from_raw(definition.event_severity).ok_or(ValidationReason::Severity)?;

        rpn::validate(&definition.equation).map_err(|err| match err {
            LcError::IllegalExpression { index, stack_depth } => {
                ValidationReason::Rpn { index, stack_depth }
            }
            _ => ValidationReason::Rpn { index: 0, stack_depth: 0 },
        })?;

        Ok(Some(Self {
            default_state,
            max_passive_events: definition.max_passive_events,
            max_pass_fail_events: definition.max_pass_fail_events,
            max_fail_pass_events: definition.max_fail_pass_events,
            response_id: definition.response_id,
            fail_threshold: definition.max_fails_before_response,
            equation: definition.equation,
            severity,
            event_id: definition.event_id,
            event_text: definition.event_text.clone(),
        }))
    }
}

/// Runtime state of one actionpoint slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionpointResult {
    /// Last outcome
    pub result: ActionResult,
    /// Current operating state
    pub state: ApState,
    /// Failures at threshold while already passive
    pub passive_ap_count: u32,
    /// Fail to pass transitions
    pub fail_to_pass_count: u32,
    /// Pass to fail transitions
    pub pass_to_fail_count: u32,
    /// Current run of failures
    pub consecutive_fail_count: u32,
    /// Lifetime failures
    pub cumulative_fail_count: u32,
    /// Lifetime responses issued
    pub cumulative_response_count: u32,
    /// Lifetime response notifications sent
    pub cumulative_event_msgs_sent: u32,
}

impl ActionpointResult {
    /// Fresh result for a slot starting in `state`
    pub const fn with_state(state: ApState) -> Self {
        Self {
            result: ActionResult::Stale,
            state,
            passive_ap_count: 0,
            fail_to_pass_count: 0,
            pass_to_fail_count: 0,
            consecutive_fail_count: 0,
            cumulative_fail_count: 0,
            cumulative_response_count: 0,
            cumulative_event_msgs_sent: 0,
        }
    }

    /// Clear outcome and statistics, keeping the current state
    pub fn reset_stats(&mut self) {
        *self = Self::with_state(self.state);
    }

    /// Move to a commanded state
    ///
    /// Rejected when the current state is `Unused` or `PermanentlyOff`, or
    /// when `new_state` is not commandable.
    pub fn command_state(&mut self, index: ActionIndex, new_state: ApState) -> LcResult<()> {
        if !new_state.is_commandable() {
            return Err(LcError::InvalidNewState { state: new_state.raw() });
        }
        if matches!(self.state, ApState::Unused | ApState::PermanentlyOff) {
            return Err(LcError::InvalidCurrentState {
                actionpoint: index.get(),
                state: self.state.raw(),
            });
        }
        self.state = new_state;
        Ok(())
    }

    /// Switch permanently off; only legal from `Disabled`
    pub fn command_permanently_off(&mut self, index: ActionIndex) -> LcResult<()> {
        if self.state != ApState::Disabled {
            return Err(LcError::InvalidCurrentState {
                actionpoint: index.get(),
                state: self.state.raw(),
            });
        }
        self.state = ApState::PermanentlyOff;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::limits::{RPN_AND, RPN_EQUAL};

    fn index(i: u16) -> ActionIndex {
        ActionIndex::new(i).unwrap()
    }

    #[test]
    fn decode_checks_in_order() {
        let good = ActionpointDefinition::new(ApState::Active, 7, 3, &[0, RPN_EQUAL]);
        assert!(matches!(Actionpoint::decode(&good), Ok(Some(_))));

        let mut bad = good.clone();
        bad.default_state = 9;
        assert_eq!(Actionpoint::decode(&bad), Err(ValidationReason::DefaultState));

        let mut bad = good.clone();
        bad.response_id = 0xFFF1;
        assert_eq!(Actionpoint::decode(&bad), Err(ValidationReason::ResponseId));

        let mut bad = good.clone();
        bad.max_fails_before_response = 0;
        assert_eq!(Actionpoint::decode(&bad), Err(ValidationReason::FailThreshold));

        let mut bad = good.clone();
        bad.event_severity = 5;
        assert_eq!(Actionpoint::decode(&bad), Err(ValidationReason::Severity));

        let bad = good.with_equation(&[RPN_AND]);
        assert_eq!(
            Actionpoint::decode(&bad),
            Err(ValidationReason::Rpn { index: 0, stack_depth: 0 })
        );

        assert_eq!(Actionpoint::decode(&ActionpointDefinition::unused()), Ok(None));
    }

    #[test]
    fn event_text_truncates() {
        let def = ActionpointDefinition::unused()
            .with_event(Severity::Error, 1, "0123456789012345678901234567890123456789");
        assert_eq!(def.event_text.len(), MAX_ACTION_TEXT);
    }

    #[test]
    fn state_commands() {
        let mut r = ActionpointResult::with_state(ApState::Active);
        assert_eq!(r.command_state(index(0), ApState::Disabled), Ok(()));
        assert_eq!(
            r.command_state(index(0), ApState::PermanentlyOff),
            Err(LcError::InvalidNewState { state: APSTATE_PERMOFF })
        );
        assert_eq!(r.command_permanently_off(index(0)), Ok(()));
        assert_eq!(
            r.command_state(index(0), ApState::Active),
            Err(LcError::InvalidCurrentState { actionpoint: 0, state: APSTATE_PERMOFF })
        );

        let mut r = ActionpointResult::with_state(ApState::Passive);
        assert!(r.command_permanently_off(index(1)).is_err());
        assert_eq!(r.state, ApState::Passive);
    }

    #[test]
    fn reset_keeps_state() {
        let mut r = ActionpointResult::with_state(ApState::Passive);
        r.result = ActionResult::Fail;
        r.cumulative_fail_count = 4;
        r.reset_stats();
        assert_eq!(r, ActionpointResult::with_state(ApState::Passive));
    }
}
