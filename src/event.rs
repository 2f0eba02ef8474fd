use core::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

use crate::types::{Point, Vector};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SwipeDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
            SwipeDirection::Up => "up",
            SwipeDirection::Down => "down",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TapDetail {
    pub tap_count: u32,
    pub position: Point,
    pub duration_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LongPressDetail {
    pub position: Point,
    pub duration_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeDetail {
    pub direction: SwipeDirection,
    pub distance: f32,
    pub delta_x: f32,
    pub delta_y: f32,
    pub velocity: Vector,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinchDetail {
    pub scale: f32,
    pub delta_scale: f32,
    pub center: Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateDetail {
    pub rotation_deg: f32,
    pub delta_deg: f32,
    pub center: Point,
}

/// Payload of a recognised gesture. The variant is the event type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "lowercase")]
pub enum GestureDetail {
    Tap(TapDetail),
    DoubleTap(TapDetail),
    MultiTap(TapDetail),
    LongPress(LongPressDetail),
    SwipeStart(SwipeDetail),
    SwipeMove(SwipeDetail),
    SwipeEnd(SwipeDetail),
    PinchStart(PinchDetail),
    PinchMove(PinchDetail),
    PinchEnd(PinchDetail),
    RotateStart(RotateDetail),
    RotateMove(RotateDetail),
    RotateEnd(RotateDetail),
    Cancel { position: Point },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Tap,
    DoubleTap,
    MultiTap,
    LongPress,
    SwipeStart,
    SwipeMove,
    SwipeEnd,
    PinchStart,
    PinchMove,
    PinchEnd,
    RotateStart,
    RotateMove,
    RotateEnd,
    Cancel,
}

impl GestureKind {
    pub const ALL: [GestureKind; 14] = [
        GestureKind::Tap,
        GestureKind::DoubleTap,
        GestureKind::MultiTap,
        GestureKind::LongPress,
        GestureKind::SwipeStart,
        GestureKind::SwipeMove,
        GestureKind::SwipeEnd,
        GestureKind::PinchStart,
        GestureKind::PinchMove,
        GestureKind::PinchEnd,
        GestureKind::RotateStart,
        GestureKind::RotateMove,
        GestureKind::RotateEnd,
        GestureKind::Cancel,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            GestureKind::Tap => "tap",
            GestureKind::DoubleTap => "doubletap",
            GestureKind::MultiTap => "multitap",
            GestureKind::LongPress => "longpress",
            GestureKind::SwipeStart => "swipestart",
            GestureKind::SwipeMove => "swipemove",
            GestureKind::SwipeEnd => "swipeend",
            GestureKind::PinchStart => "pinchstart",
            GestureKind::PinchMove => "pinchmove",
            GestureKind::PinchEnd => "pinchend",
            GestureKind::RotateStart => "rotatestart",
            GestureKind::RotateMove => "rotatemove",
            GestureKind::RotateEnd => "rotateend",
            GestureKind::Cancel => "cancel",
        }
    }

    pub const fn is_tap_family(self) -> bool {
        matches!(
            self,
            GestureKind::Tap | GestureKind::DoubleTap | GestureKind::MultiTap
        )
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown gesture kind `{0}`")]
pub struct UnknownGestureKind(pub String);

impl FromStr for GestureKind {
    type Err = UnknownGestureKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        GestureKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == token)
            .ok_or(UnknownGestureKind(token))
    }
}

impl GestureDetail {
    pub const fn kind(&self) -> GestureKind {
        match self {
            GestureDetail::Tap(_) => GestureKind::Tap,
            GestureDetail::DoubleTap(_) => GestureKind::DoubleTap,
            GestureDetail::MultiTap(_) => GestureKind::MultiTap,
            GestureDetail::LongPress(_) => GestureKind::LongPress,
            GestureDetail::SwipeStart(_) => GestureKind::SwipeStart,
            GestureDetail::SwipeMove(_) => GestureKind::SwipeMove,
            GestureDetail::SwipeEnd(_) => GestureKind::SwipeEnd,
            GestureDetail::PinchStart(_) => GestureKind::PinchStart,
            GestureDetail::PinchMove(_) => GestureKind::PinchMove,
            GestureDetail::PinchEnd(_) => GestureKind::PinchEnd,
            GestureDetail::RotateStart(_) => GestureKind::RotateStart,
            GestureDetail::RotateMove(_) => GestureKind::RotateMove,
            GestureDetail::RotateEnd(_) => GestureKind::RotateEnd,
            GestureDetail::Cancel { .. } => GestureKind::Cancel,
        }
    }
}

/// Opaque host handle naming the element the engine is attached to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TargetRef(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GestureEvent {
    #[serde(flatten)]
    pub detail: GestureDetail,
    pub t_ms: u64,
    pub target: TargetRef,
}

impl GestureEvent {
    pub fn kind(&self) -> GestureKind {
        self.detail.kind()
    }
}

/// Upper bound on events one engine call can emit: two timer fires plus a
/// flushed tap, `swipeend` and both two-finger start/move pairs.
pub const MAX_EVENTS_PER_CALL: usize = 12;

/// Events produced by one engine call, in emission order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureOutput {
    pub events: heapless::Vec<GestureEvent, MAX_EVENTS_PER_CALL>,
}

impl GestureOutput {
    pub const MAX: usize = MAX_EVENTS_PER_CALL;

    pub(crate) fn push(&mut self, event: GestureEvent) {
        if self.events.push(event).is_err() {
            log::warn!("gesture: output full; dropped {}", event.kind());
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureEvent> {
        self.events.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = GestureKind> + '_ {
        self.events.iter().map(GestureEvent::kind)
    }

    pub fn contains(&self, kind: GestureKind) -> bool {
        self.kinds().any(|k| k == kind)
    }
}

impl IntoIterator for GestureOutput {
    type Item = GestureEvent;
    type IntoIter = <heapless::Vec<GestureEvent, MAX_EVENTS_PER_CALL> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
