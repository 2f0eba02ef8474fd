use log::debug;
use statig::prelude::*;

use super::session::{GestureSession, SessionState};
use crate::{
    config::GestureConfig,
    event::{GestureDetail, GestureEvent, GestureOutput, LongPressDetail, TargetRef},
    timing::{TimerKind, TimerToken, TimingDisambiguator},
    types::TouchSample,
};

#[derive(Clone, Debug)]
pub(super) enum HsmEvent {
    Frame {
        now_ms: u64,
        samples: Vec<TouchSample>,
    },
    Cancel {
        now_ms: u64,
    },
    TimerFired {
        token: TimerToken,
        at_ms: u64,
    },
}

pub(super) struct DispatchContext {
    pub(super) output: GestureOutput,
    target: TargetRef,
}

impl DispatchContext {
    pub(super) fn new(target: TargetRef) -> Self {
        Self {
            output: GestureOutput::default(),
            target,
        }
    }

    fn emit(&mut self, detail: GestureDetail, t_ms: u64) {
        debug!("gesture: emit {} t={}", detail.kind(), t_ms);
        self.output.push(GestureEvent {
            detail,
            t_ms,
            target: self.target,
        });
    }
}

pub(super) struct GestureHsm {
    pub(super) config: GestureConfig,
    pub(super) session: GestureSession,
    pub(super) timing: TimingDisambiguator,
}

impl GestureHsm {
    pub(super) fn new(config: GestureConfig) -> Self {
        Self {
            session: GestureSession::default(),
            timing: TimingDisambiguator::new(
                config.long_press_delay_ms,
                config.multi_tap_window_ms,
            ),
            config,
        }
    }

    fn goto(&mut self, state: SessionState) -> Outcome<State> {
        if self.session.state() != state {
            debug!(
                "gesture: {} -> {}",
                self.session.state().as_str(),
                state.as_str()
            );
        }
        self.session.set_state(state);
        match state {
            SessionState::Idle => Transition(State::idle()),
            SessionState::Touching => Transition(State::touching()),
            SessionState::Swiping => Transition(State::swiping()),
            SessionState::Pinching => Transition(State::pinching()),
            SessionState::Rotating => Transition(State::rotating()),
        }
    }

    fn begin_session(&mut self, now_ms: u64, samples: &[TouchSample]) -> Outcome<State> {
        self.session.begin(now_ms, samples);
        if samples.len() == 1 {
            self.timing.arm_long_press(now_ms);
        }
        self.goto(SessionState::Touching)
    }

    fn end_session(&mut self) -> Outcome<State> {
        self.timing.cancel_long_press();
        self.session.reset();
        self.goto(SessionState::Idle)
    }

    fn cancel_long_press(&mut self, reason: &str) {
        if self.timing.cancel_long_press() {
            debug!("gesture: long-press canceled ({reason})");
        }
    }

    /// Emits a held single tap before any other recognised gesture.
    fn flush_pending_tap(&mut self, context: &mut DispatchContext, now_ms: u64) {
        if let Some(detail) = self.timing.flush_pending_tap() {
            context.emit(GestureDetail::Tap(detail), now_ms);
        }
    }

    fn on_timer(&mut self, context: &mut DispatchContext, token: TimerToken, at_ms: u64) {
        if !self.timing.accept_fire(token) {
            return;
        }
        match token.kind {
            TimerKind::TapWindow => {
                if let Some(detail) = self.timing.take_window_tap() {
                    context.emit(GestureDetail::Tap(detail), at_ms);
                }
            }
            TimerKind::LongPress => {
                debug!("gesture: long-press fired outside touching; ignored");
            }
        }
    }

    fn fire_long_press(&mut self, context: &mut DispatchContext, at_ms: u64) {
        self.flush_pending_tap(context, at_ms);
        self.session.mark_long_press_fired();
        context.emit(
            GestureDetail::LongPress(LongPressDetail {
                position: self.session.current_center(),
                duration_ms: self.session.duration_ms(at_ms),
            }),
            at_ms,
        );
    }

    /// Release of a session that never became a swipe or two-finger gesture.
    fn finish_touch(&mut self, context: &mut DispatchContext, now_ms: u64) -> Outcome<State> {
        self.cancel_long_press("released");
        let duration_ms = self.session.duration_ms(now_ms);
        let qualifies = !self.session.long_press_fired()
            && !self.session.multi_touch()
            && self.session.max_displacement() <= self.config.tap_threshold_px
            && duration_ms < self.config.tap_max_duration_ms;

        if qualifies {
            let position = self.session.current_center();
            if let Some(detail) = self.timing.register_tap(now_ms, position, duration_ms) {
                context.emit(detail, now_ms);
            }
        } else {
            debug!(
                "gesture: release not a tap displacement={:.1} duration={} multi={} long_press={}",
                self.session.max_displacement(),
                duration_ms,
                self.session.multi_touch(),
                self.session.long_press_fired()
            );
        }
        self.end_session()
    }

    fn two_finger_crossed(&self) -> (bool, bool) {
        (
            self.session.pinch_crossed(self.config.pinch_threshold),
            self.session.rotate_crossed(self.config.rotation_threshold_deg),
        )
    }

    /// Starts pinch and/or rotate on the frame that crosses a threshold.
    /// Pinch is emitted before rotate when both cross together.
    fn start_two_finger(
        &mut self,
        context: &mut DispatchContext,
        now_ms: u64,
        pinch: bool,
        rotate: bool,
    ) -> Outcome<State> {
        self.cancel_long_press("two-finger gesture");
        self.flush_pending_tap(context, now_ms);
        if pinch {
            self.emit_pinch_start(context, now_ms);
        }
        if rotate {
            self.emit_rotate_start(context, now_ms);
        }
        self.goto(if pinch {
            SessionState::Pinching
        } else {
            SessionState::Rotating
        })
    }

    fn emit_pinch_start(&mut self, context: &mut DispatchContext, now_ms: u64) {
        self.session.activate_pinch();
        let start = self.session.pinch_detail(false);
        context.emit(GestureDetail::PinchStart(start), now_ms);
        let update = self.session.pinch_detail(true);
        context.emit(GestureDetail::PinchMove(update), now_ms);
    }

    fn emit_rotate_start(&mut self, context: &mut DispatchContext, now_ms: u64) {
        self.session.activate_rotate();
        let start = self.session.rotate_detail(false);
        context.emit(GestureDetail::RotateStart(start), now_ms);
        let update = self.session.rotate_detail(true);
        context.emit(GestureDetail::RotateMove(update), now_ms);
    }
}

#[state_machine(initial = "State::idle()")]
impl GestureHsm {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &HsmEvent) -> Outcome<State> {
        match event {
            HsmEvent::Frame { now_ms, samples } => {
                if samples.is_empty() {
                    return Handled;
                }
                self.begin_session(*now_ms, samples)
            }
            HsmEvent::Cancel { .. } => {
                // No session to report; only a held tap can be outstanding.
                self.timing.cancel_all();
                Handled
            }
            HsmEvent::TimerFired { token, at_ms } => {
                self.on_timer(context, *token, *at_ms);
                Handled
            }
        }
    }

    #[state(superstate = "active")]
    fn touching(&mut self, context: &mut DispatchContext, event: &HsmEvent) -> Outcome<State> {
        match event {
            HsmEvent::Frame { now_ms, samples } => {
                let now_ms = *now_ms;
                let change = self.session.apply(now_ms, samples);
                if change.count == 0 {
                    return self.finish_touch(context, now_ms);
                }

                if change.count > 1 {
                    self.cancel_long_press("multi-touch");
                } else if self.session.max_displacement() > self.config.tap_threshold_px {
                    self.cancel_long_press("moved");
                }

                if change.count == 1
                    && !change.set_changed
                    && !self.session.long_press_fired()
                    && self.session.displacement() > self.config.swipe_threshold_px
                {
                    self.cancel_long_press("swipe");
                    self.flush_pending_tap(context, now_ms);
                    let detail = self.session.record_swipe();
                    context.emit(GestureDetail::SwipeStart(detail), now_ms);
                    return self.goto(SessionState::Swiping);
                }

                if change.count == 2 && !change.rebaselined {
                    let (pinch, rotate) = self.two_finger_crossed();
                    if pinch || rotate {
                        return self.start_two_finger(context, now_ms, pinch, rotate);
                    }
                }
                Handled
            }
            HsmEvent::TimerFired { token, at_ms } if token.kind == TimerKind::LongPress => {
                if self.timing.accept_fire(*token) {
                    self.fire_long_press(context, *at_ms);
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "active")]
    fn swiping(&mut self, context: &mut DispatchContext, event: &HsmEvent) -> Outcome<State> {
        match event {
            HsmEvent::Frame { now_ms, samples } => {
                let now_ms = *now_ms;
                let change = self.session.apply(now_ms, samples);
                if change.count == 0 {
                    let detail = self.session.final_swipe_detail();
                    context.emit(GestureDetail::SwipeEnd(detail), now_ms);
                    return self.end_session();
                }

                if change.count == 2 && !change.rebaselined {
                    let (pinch, rotate) = self.two_finger_crossed();
                    if pinch || rotate {
                        let detail = self.session.final_swipe_detail();
                        context.emit(GestureDetail::SwipeEnd(detail), now_ms);
                        return self.start_two_finger(context, now_ms, pinch, rotate);
                    }
                }

                if change.count == 1 && change.moved {
                    let detail = self.session.record_swipe();
                    context.emit(GestureDetail::SwipeMove(detail), now_ms);
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "active")]
    fn pinching(&mut self, context: &mut DispatchContext, event: &HsmEvent) -> Outcome<State> {
        match event {
            HsmEvent::Frame { now_ms, samples } => {
                let now_ms = *now_ms;
                let change = self.session.apply(now_ms, samples);
                if change.count == 0 {
                    let pinch = self.session.final_pinch_detail();
                    context.emit(GestureDetail::PinchEnd(pinch), now_ms);
                    if self.session.rotate_active() {
                        let rotate = self.session.final_rotate_detail();
                        context.emit(GestureDetail::RotateEnd(rotate), now_ms);
                    }
                    return self.end_session();
                }

                if change.count == 2 && !change.rebaselined {
                    let pinch = self.session.pinch_detail(true);
                    context.emit(GestureDetail::PinchMove(pinch), now_ms);
                    if self.session.rotate_active() {
                        let rotate = self.session.rotate_detail(true);
                        context.emit(GestureDetail::RotateMove(rotate), now_ms);
                    } else if self
                        .session
                        .rotate_crossed(self.config.rotation_threshold_deg)
                    {
                        self.emit_rotate_start(context, now_ms);
                    }
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "active")]
    fn rotating(&mut self, context: &mut DispatchContext, event: &HsmEvent) -> Outcome<State> {
        match event {
            HsmEvent::Frame { now_ms, samples } => {
                let now_ms = *now_ms;
                let change = self.session.apply(now_ms, samples);
                if change.count == 0 {
                    let rotate = self.session.final_rotate_detail();
                    context.emit(GestureDetail::RotateEnd(rotate), now_ms);
                    return self.end_session();
                }

                if change.count == 2 && !change.rebaselined {
                    if self.session.pinch_crossed(self.config.pinch_threshold) {
                        self.emit_pinch_start(context, now_ms);
                        let rotate = self.session.rotate_detail(true);
                        context.emit(GestureDetail::RotateMove(rotate), now_ms);
                        return self.goto(SessionState::Pinching);
                    }
                    let rotate = self.session.rotate_detail(true);
                    context.emit(GestureDetail::RotateMove(rotate), now_ms);
                }
                Handled
            }
            _ => Super,
        }
    }

    #[superstate]
    fn active(&mut self, context: &mut DispatchContext, event: &HsmEvent) -> Outcome<State> {
        match event {
            HsmEvent::Cancel { now_ms } => {
                self.timing.cancel_all();
                context.emit(
                    GestureDetail::Cancel {
                        position: self.session.current_center(),
                    },
                    *now_ms,
                );
                self.end_session()
            }
            HsmEvent::TimerFired { token, at_ms } => {
                self.on_timer(context, *token, *at_ms);
                Handled
            }
            HsmEvent::Frame { .. } => Handled,
        }
    }
}
