//! Gesture session state machine and its host-facing wrapper.

mod hsm;
pub mod session;

#[cfg(test)]
mod tests;

use log::warn;
use statig::blocking::IntoStateMachineExt as _;

use self::hsm::{DispatchContext, GestureHsm, HsmEvent};
pub use self::session::{GestureSession, SessionState, TwoFingerMetrics};
use crate::{
    config::{ConfigError, GestureConfig},
    dispatch::{EventDispatcher, GestureSubscriber, SubscriptionId},
    event::{GestureOutput, TargetRef},
    normalize::TouchNormalizer,
    timing::{PendingTimer, TimerToken},
    types::{RawTouchFrame, RawTouchKind},
};

/// Recognises gestures from raw touch frames.
///
/// Time only moves when the host says so: a frame carries its timestamp, and
/// [`GestureEngine::advance`] moves the clock without input. Timers due at or
/// before that instant fire first, in deadline order.
pub struct GestureEngine {
    machine: statig::blocking::StateMachine<GestureHsm>,
    normalizer: TouchNormalizer,
    dispatcher: EventDispatcher,
    target: TargetRef,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::build(GestureConfig::default())
    }
}

impl GestureEngine {
    pub fn new(config: GestureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GestureConfig) -> Self {
        Self {
            normalizer: TouchNormalizer::new(config.dejitter_radius_px),
            machine: GestureHsm::new(config).state_machine(),
            dispatcher: EventDispatcher::default(),
            target: TargetRef::default(),
        }
    }

    /// Tags every emitted event with `target`.
    pub fn with_target(mut self, target: TargetRef) -> Self {
        self.target = target;
        self
    }

    pub fn config(&self) -> &GestureConfig {
        &self.machine.inner().config
    }

    pub fn target(&self) -> TargetRef {
        self.target
    }

    pub fn state(&self) -> SessionState {
        self.machine.inner().session.state()
    }

    pub fn session(&self) -> &GestureSession {
        &self.machine.inner().session
    }

    pub fn tap_count(&self) -> u32 {
        self.machine.inner().timing.tap_count()
    }

    pub fn long_press_scheduled(&self) -> bool {
        self.machine.inner().timing.long_press_scheduled()
    }

    /// Earliest armed deadline; the host should call `advance` by then.
    pub fn next_deadline(&self) -> Option<u64> {
        self.machine.inner().timing.next_deadline()
    }

    pub fn pending_timers(&self) -> heapless::Vec<PendingTimer, 2> {
        self.machine.inner().timing.pending_timers()
    }

    pub fn subscribe<S>(&mut self, subscriber: S) -> SubscriptionId
    where
        S: GestureSubscriber + 'static,
    {
        self.dispatcher.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    pub fn dispatcher_mut(&mut self) -> &mut EventDispatcher {
        &mut self.dispatcher
    }

    pub fn handle(&mut self, frame: &RawTouchFrame) -> GestureOutput {
        let mut context = DispatchContext::new(self.target);
        self.fire_due(frame.t_ms, &mut context);

        let event = match frame.kind {
            RawTouchKind::Cancel => {
                self.normalizer.reset();
                HsmEvent::Cancel { now_ms: frame.t_ms }
            }
            RawTouchKind::Start | RawTouchKind::Move | RawTouchKind::End => HsmEvent::Frame {
                now_ms: frame.t_ms,
                samples: self.normalizer.normalize(frame),
            },
        };
        self.machine.handle_with_context(&event, &mut context);
        self.publish(context)
    }

    /// Platform cancel without a frame.
    pub fn cancel(&mut self, now_ms: u64) -> GestureOutput {
        self.handle(&RawTouchFrame::cancel(now_ms))
    }

    /// Fires every timer due at or before `now_ms`.
    pub fn advance(&mut self, now_ms: u64) -> GestureOutput {
        let mut context = DispatchContext::new(self.target);
        self.fire_due(now_ms, &mut context);
        self.publish(context)
    }

    /// Fires one timer on behalf of a host-side scheduler. Stale tokens are
    /// ignored.
    pub fn fire_timer(&mut self, token: TimerToken, now_ms: u64) -> GestureOutput {
        let mut context = DispatchContext::new(self.target);
        self.fire_due(now_ms, &mut context);
        self.machine.handle_with_context(
            &HsmEvent::TimerFired {
                token,
                at_ms: now_ms,
            },
            &mut context,
        );
        self.publish(context)
    }

    fn fire_due(&mut self, now_ms: u64, context: &mut DispatchContext) {
        while let Some(timer) = self.machine.inner().timing.next_due(now_ms) {
            self.machine.handle_with_context(
                &HsmEvent::TimerFired {
                    token: timer.token,
                    at_ms: timer.deadline_ms,
                },
                context,
            );
            if self.machine.inner().timing.pending_timers().contains(&timer) {
                warn!("gesture: timer {:?} not consumed; stopping", timer.token);
                break;
            }
        }
    }

    fn publish(&mut self, context: DispatchContext) -> GestureOutput {
        for event in context.output.iter() {
            self.dispatcher.dispatch(event);
        }
        context.output
    }
}

