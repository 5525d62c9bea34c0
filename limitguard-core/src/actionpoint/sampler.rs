//! Actionpoint Sampling State Machine
//!
//! One sample of one actionpoint:
//!
//! ```text
//! evaluate RPN ──► Fail ──► count ──► pass→fail? notify (capped)
//!      │                      │
//!      │                      └─► consecutive ≥ threshold?
//!      │                             Active  ─► Passive, respond (engine Active)
//!      │                                         or count + debug notify (engine Passive)
//!      │                             Passive ─► count, notify (capped)
//!      ├──────► Pass ──► fail→pass? notify (capped); consecutive = 0
//!      ├──────► Stale ─► consecutive = 0
//!      └──────► Error ─► notify
//! ```
//!
//! Each sample is a pure function of the stored watchpoint results and the
//! actionpoint's own result, so repeating it reproduces the same outcome.
//! A response that the transport fails to deliver never rolls back the
//! state change already committed here.

use crate::{
    actionpoint::{ActionIndex, ActionResult, Actionpoint, ActionpointResult, ApState},
    engine::{EngineCounters, LcMode},
    errors::LcError,
    events::Notification,
    rpn,
    traits::{EventSink, Transport},
    watchpoint::{WatchResult, WatchpointResult},
};

/// Samples actionpoints for one request
pub struct Sampler<'a> {
    mode: LcMode,
    counters: &'a mut EngineCounters,
    transport: &'a mut dyn Transport,
    sink: &'a mut dyn EventSink,
}

impl<'a> Sampler<'a> {
    /// Sampler for an engine running in `mode`
    pub fn new(
        mode: LcMode,
        counters: &'a mut EngineCounters,
        transport: &'a mut dyn Transport,
        sink: &'a mut dyn EventSink,
    ) -> Self {
        Self { mode, counters, transport, sink }
    }

    /// Sample one actionpoint; non-sampled states are left untouched
    pub fn sample(
        &mut self,
        index: ActionIndex,
        actionpoint: &Actionpoint,
        result: &mut ActionpointResult,
        watch_results: &[WatchpointResult],
    ) {
        if !result.state.is_sampled() {
            return;
        }

        let previous = result.result;
        let current = self.evaluate(index, actionpoint, watch_results);
        result.result = current;

        match current {
            ActionResult::Fail => self.on_fail(index, actionpoint, result, previous),
            ActionResult::Pass => {
                if previous == ActionResult::Fail {
                    result.fail_to_pass_count = result.fail_to_pass_count.saturating_add(1);
                    if result.fail_to_pass_count <= u32::from(actionpoint.max_fail_pass_events) {
                        self.sink.emit(&Notification::FailToPass { actionpoint: index.get() });
                    }
                }
                result.consecutive_fail_count = 0;
            }
            ActionResult::Stale => {
                result.consecutive_fail_count = 0;
            }
            ActionResult::Error => {
                self.sink.emit(&Notification::ActionError { actionpoint: index.get() });
            }
        }
    }

    fn evaluate(
        &mut self,
        index: ActionIndex,
        actionpoint: &Actionpoint,
        watch_results: &[WatchpointResult],
    ) -> ActionResult {
        let lookup = |wp: crate::watchpoint::WatchIndex| {
            watch_results
                .get(wp.as_usize())
                .map_or(WatchResult::Stale, |r| r.result)
        };

        match rpn::evaluate(&actionpoint.equation, lookup) {
            Ok(result) => result,
            Err(LcError::IllegalExpression { index: token, stack_depth }) => {
                lc_error!(
                    "AP {} illegal RPN at token {}, stack depth {}",
                    index.get(), token, stack_depth
                );
                self.sink.emit(&Notification::IllegalExpression {
                    actionpoint: index.get(),
                    index: token,
                    stack_depth,
                });
                ActionResult::Error
            }
            Err(_) => ActionResult::Error,
        }
    }

    fn on_fail(
        &mut self,
        index: ActionIndex,
        actionpoint: &Actionpoint,
        result: &mut ActionpointResult,
        previous: ActionResult,
    ) {
        result.consecutive_fail_count = result.consecutive_fail_count.saturating_add(1);
        result.cumulative_fail_count = result.cumulative_fail_count.saturating_add(1);

        if previous == ActionResult::Pass {
            result.pass_to_fail_count = result.pass_to_fail_count.saturating_add(1);
            if result.pass_to_fail_count <= u32::from(actionpoint.max_pass_fail_events) {
                self.sink.emit(&Notification::PassToFail { actionpoint: index.get() });
            }
        }

        if result.consecutive_fail_count < actionpoint.fail_threshold {
            return;
        }

        match result.state {
            ApState::Active => {
                result.state = ApState::Passive;

                if self.mode == LcMode::Active {
                    lc_info!("AP {} requesting response {}", index.get(), actionpoint.response_id);
                    self.transport.send_response(actionpoint.response_id);
                    result.cumulative_response_count = result.cumulative_response_count.saturating_add(1);
                    self.counters.response_exec_count = self.counters.response_exec_count.saturating_add(1);

                    self.sink.emit(&Notification::ResponseIssued {
                        actionpoint: index.get(),
                        fail_count: result.consecutive_fail_count,
                        response_id: actionpoint.response_id,
                        event_id: actionpoint.event_id,
                        severity: actionpoint.severity,
                        text: actionpoint.event_text.clone(),
                    });
                    result.cumulative_event_msgs_sent = result.cumulative_event_msgs_sent.saturating_add(1);
                } else {
                    self.counters.passive_response_count =
                        self.counters.passive_response_count.saturating_add(1);
                    self.sink.emit(&Notification::ResponseSuppressed {
                        actionpoint: index.get(),
                        fail_count: result.consecutive_fail_count,
                        response_id: actionpoint.response_id,
                    });
                }
            }
            ApState::Passive => {
                result.passive_ap_count = result.passive_ap_count.saturating_add(1);
                if result.passive_ap_count <= u32::from(actionpoint.max_passive_events) {
                    self.sink.emit(&Notification::FailedWhilePassive {
                        actionpoint: index.get(),
                        fail_count: result.consecutive_fail_count,
                        response_id: actionpoint.response_id,
                    });
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actionpoint::ActionpointDefinition,
        constants::{limits::RPN_EQUAL, MAX_WATCHPOINTS},
        events::Severity,
        message::MessageId,
        traits::TransportStatus,
    };

    #[derive(Default)]
    struct Recorder {
        responses: [u16; 8],
        response_count: usize,
    }

    impl Transport for Recorder {
        fn subscribe(&mut self, _id: MessageId) -> Result<(), TransportStatus> {
            Ok(())
        }
        fn unsubscribe(&mut self, _id: MessageId) -> Result<(), TransportStatus> {
            Ok(())
        }
        fn send_response(&mut self, response_id: u16) {
            self.responses[self.response_count] = response_id;
            self.response_count += 1;
        }
    }

    #[derive(Default)]
    struct Events {
        ids: [u16; 32],
        count: usize,
    }

    impl EventSink for Events {
        fn emit(&mut self, notification: &Notification) {
            self.ids[self.count] = notification.id();
            self.count += 1;
        }
    }

    impl Events {
        fn seen(&self, id: u16) -> usize {
            self.ids[..self.count].iter().filter(|&&i| i == id).count()
        }
    }

    struct Fixture {
        ap: Actionpoint,
        result: ActionpointResult,
        watch: [WatchpointResult; MAX_WATCHPOINTS],
        counters: EngineCounters,
        transport: Recorder,
        events: Events,
    }

    impl Fixture {
        fn new(threshold: u32) -> Self {
            let def = ActionpointDefinition::new(ApState::Active, 40, threshold, &[0, RPN_EQUAL])
                .with_event(Severity::Critical, 900, "Undervolt");
            Self {
                ap: Actionpoint::decode(&def).unwrap().unwrap(),
                result: ActionpointResult::with_state(ApState::Active),
                watch: [WatchpointResult::default(); MAX_WATCHPOINTS],
                counters: EngineCounters::default(),
                transport: Recorder::default(),
                events: Events::default(),
            }
        }

        fn sample(&mut self, mode: LcMode, wp0: WatchResult) {
            self.watch[0].result = wp0;
            let mut sampler = Sampler::new(mode, &mut self.counters, &mut self.transport, &mut self.events);
            sampler.sample(ActionIndex::new(0).unwrap(), &self.ap, &mut self.result, &self.watch);
        }
    }

    #[test]
    fn threshold_issues_one_response() {
        let mut fx = Fixture::new(5);
        for _ in 0..4 {
            fx.sample(LcMode::Active, WatchResult::True);
        }
        assert_eq!(fx.result.state, ApState::Active);
        assert_eq!(fx.transport.response_count, 0);

        fx.sample(LcMode::Active, WatchResult::True);
        assert_eq!(fx.result.state, ApState::Passive);
        assert_eq!(fx.transport.response_count, 1);
        assert_eq!(fx.transport.responses[0], 40);
        assert_eq!(fx.result.cumulative_response_count, 1);
        assert_eq!(fx.result.cumulative_event_msgs_sent, 1);
        assert_eq!(fx.counters.response_exec_count, 1);
        assert_eq!(fx.events.seen(900), 1);

        // Keeps failing while passive: no further responses
        fx.sample(LcMode::Active, WatchResult::True);
        assert_eq!(fx.transport.response_count, 1);
        assert_eq!(fx.result.passive_ap_count, 1);
    }

    #[test]
    fn passive_engine_suppresses_response() {
        let mut fx = Fixture::new(1);
        fx.sample(LcMode::Passive, WatchResult::True);
        assert_eq!(fx.result.state, ApState::Passive);
        assert_eq!(fx.transport.response_count, 0);
        assert_eq!(fx.result.cumulative_response_count, 0);
        assert_eq!(fx.counters.passive_response_count, 1);
        assert_eq!(fx.events.seen(crate::constants::events::PASSIVE_FAIL_DBG_EID), 1);
    }

    #[test]
    fn consecutive_fail_resets_on_pass_and_stale_not_error() {
        let mut fx = Fixture::new(100);
        fx.sample(LcMode::Active, WatchResult::True);
        fx.sample(LcMode::Active, WatchResult::True);
        fx.sample(LcMode::Active, WatchResult::Error);
        assert_eq!(fx.result.consecutive_fail_count, 2);
        assert_eq!(fx.result.result, ActionResult::Error);

        fx.sample(LcMode::Active, WatchResult::Stale);
        assert_eq!(fx.result.consecutive_fail_count, 0);

        fx.sample(LcMode::Active, WatchResult::True);
        fx.sample(LcMode::Active, WatchResult::False);
        assert_eq!(fx.result.consecutive_fail_count, 0);
        assert_eq!(fx.result.cumulative_fail_count, 3);
    }

    #[test]
    fn transition_notifications_are_capped() {
        use crate::constants::events::{AP_FAILTOPASS_INF_EID, AP_PASSTOFAIL_INF_EID};

        let mut fx = Fixture::new(100);
        fx.ap.max_pass_fail_events = 2;
        fx.ap.max_fail_pass_events = 1;
        fx.sample(LcMode::Active, WatchResult::False);
        for _ in 0..4 {
            fx.sample(LcMode::Active, WatchResult::True);
            fx.sample(LcMode::Active, WatchResult::False);
        }
        assert_eq!(fx.result.pass_to_fail_count, 4);
        assert_eq!(fx.result.fail_to_pass_count, 4);
        assert_eq!(fx.events.seen(AP_PASSTOFAIL_INF_EID), 2);
        assert_eq!(fx.events.seen(AP_FAILTOPASS_INF_EID), 1);
    }

    #[test]
    fn disabled_is_not_sampled() {
        let mut fx = Fixture::new(1);
        fx.result.state = ApState::Disabled;
        fx.sample(LcMode::Active, WatchResult::True);
        assert_eq!(fx.result, ActionpointResult::with_state(ApState::Disabled));
        assert_eq!(fx.events.count, 0);
    }

    #[test]
    fn illegal_equation_reports_and_errors() {
        use crate::constants::events::{ACTION_ERROR_ERR_EID, INVALID_RPN_ERR_EID};

        let mut fx = Fixture::new(1);
        fx.ap.equation = [crate::constants::limits::RPN_AND; crate::constants::MAX_RPN_EQU_SIZE];
        fx.sample(LcMode::Active, WatchResult::True);
        assert_eq!(fx.result.result, ActionResult::Error);
        assert_eq!(fx.events.seen(INVALID_RPN_ERR_EID), 1);
        assert_eq!(fx.events.seen(ACTION_ERROR_ERR_EID), 1);
        assert_eq!(fx.result.consecutive_fail_count, 0);
    }
}
