//! Tactile feedback for recognised gestures.

use log::{trace, warn};
use thiserror::Error;

use crate::{
    dispatch::{GestureSubscriber, SubscriberError},
    event::{GestureEvent, GestureKind},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeedbackIntensity {
    Light,
    Medium,
    Heavy,
}

impl FeedbackIntensity {
    pub const fn for_kind(kind: GestureKind) -> Option<Self> {
        match kind {
            GestureKind::Tap | GestureKind::DoubleTap | GestureKind::MultiTap => Some(Self::Light),
            GestureKind::SwipeStart | GestureKind::PinchStart | GestureKind::RotateStart => {
                Some(Self::Medium)
            }
            GestureKind::LongPress => Some(Self::Heavy),
            _ => None,
        }
    }

    /// Vibration pulse length a motor-driving sink would use.
    pub const fn pulse_ms(self) -> u32 {
        match self {
            Self::Light => 10,
            Self::Medium => 20,
            Self::Heavy => 50,
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("feedback device unavailable")]
    Unavailable,
    #[error("feedback device error: {0}")]
    Device(String),
}

/// Platform capability that produces the actual vibration.
pub trait FeedbackSink {
    fn pulse(&mut self, intensity: FeedbackIntensity) -> Result<(), FeedbackError>;
}

/// Sink for platforms without a vibration motor.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopFeedback;

impl FeedbackSink for NoopFeedback {
    fn pulse(&mut self, intensity: FeedbackIntensity) -> Result<(), FeedbackError> {
        trace!("gesture: feedback {:?} (noop)", intensity);
        Ok(())
    }
}

/// Subscriber translating gestures into feedback pulses.
///
/// Sink failures are logged and swallowed so they never reach the dispatcher.
pub struct HapticFeedback<S> {
    sink: S,
    enabled: bool,
}

impl<S: FeedbackSink> HapticFeedback<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: FeedbackSink> GestureSubscriber for HapticFeedback<S> {
    fn on_gesture(&mut self, event: &GestureEvent) -> Result<(), SubscriberError> {
        if !self.enabled {
            return Ok(());
        }
        let Some(intensity) = FeedbackIntensity::for_kind(event.kind()) else {
            return Ok(());
        };
        if let Err(err) = self.sink.pulse(intensity) {
            warn!("gesture: feedback for {} failed: {}", event.kind(), err);
        }
        Ok(())
    }
}
