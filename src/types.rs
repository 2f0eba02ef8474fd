use serde::{Deserialize, Serialize};

/// Canonical contact identifier assigned by the normalizer.
///
/// Stable for the lifetime of one physical contact. Ids grow monotonically,
/// so ordering by id is ordering by arrival.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ContactId(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Velocity in px/ms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TouchSample {
    pub id: ContactId,
    pub x: f32,
    pub y: f32,
    pub t_ms: u64,
}

impl TouchSample {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawTouchKind {
    Start,
    Move,
    End,
    Cancel,
}

impl RawTouchKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            RawTouchKind::Start => "start",
            RawTouchKind::Move => "move",
            RawTouchKind::End => "end",
            RawTouchKind::Cancel => "cancel",
        }
    }
}

/// One live contact as reported by the host runtime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawContact {
    pub id: i64,
    pub x: f32,
    pub y: f32,
}

/// One input delivery: the event kind plus the full list of live contacts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawTouchFrame {
    pub kind: RawTouchKind,
    pub t_ms: u64,
    pub contacts: Vec<RawContact>,
}

impl RawTouchFrame {
    pub fn new(kind: RawTouchKind, t_ms: u64, contacts: Vec<RawContact>) -> Self {
        Self {
            kind,
            t_ms,
            contacts,
        }
    }

    pub fn cancel(t_ms: u64) -> Self {
        Self::new(RawTouchKind::Cancel, t_ms, Vec::new())
    }
}
