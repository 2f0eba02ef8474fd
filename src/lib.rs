//! Multi-touch gesture recognition.
//!
//! Raw frames go through [`normalize::TouchNormalizer`] into the session state
//! machine, which classifies taps, long-presses, swipes, pinches and rotations
//! and returns them as a [`GestureOutput`]. The same events are published to
//! any [`dispatch::GestureSubscriber`]s registered on the engine.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod event;
pub mod feedback;
pub mod geometry;
pub mod normalize;
pub mod timing;
pub mod trace;
pub mod types;

pub use config::{ConfigError, GestureConfig};
pub use dispatch::{EventDispatcher, GestureSubscriber, SubscriberError, SubscriptionId};
pub use engine::{GestureEngine, GestureSession, SessionState};
pub use event::{GestureDetail, GestureEvent, GestureKind, GestureOutput, SwipeDirection, TargetRef};
pub use feedback::{FeedbackIntensity, FeedbackSink, HapticFeedback, NoopFeedback};
pub use timing::{PendingTimer, TimerKind, TimerToken};
pub use types::{ContactId, Point, RawContact, RawTouchFrame, RawTouchKind, TouchSample, Vector};
