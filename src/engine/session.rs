use std::collections::BTreeMap;

use crate::{
    event::{PinchDetail, RotateDetail, SwipeDetail},
    geometry::{angle_deg, angle_delta_deg, center, direction, distance, sample_velocity},
    types::{ContactId, Point, TouchSample, Vector},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Touching,
    Swiping,
    Pinching,
    Rotating,
}

impl SessionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Touching => "touching",
            SessionState::Swiping => "swiping",
            SessionState::Pinching => "pinching",
            SessionState::Rotating => "rotating",
        }
    }
}

/// Distance and angle between the two live contacts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwoFingerMetrics {
    pub start_distance: f32,
    pub current_distance: f32,
    pub start_angle: f32,
    pub current_angle: f32,
}

impl TwoFingerMetrics {
    fn baseline(a: Point, b: Point) -> Self {
        let d = distance(a, b);
        let angle = angle_deg(a, b);
        Self {
            start_distance: d,
            current_distance: d,
            start_angle: angle,
            current_angle: angle,
        }
    }

    /// `current / start`; a collapsed baseline reports no scaling.
    pub fn scale(&self) -> f32 {
        if self.start_distance <= f32::EPSILON {
            return 1.0;
        }
        self.current_distance / self.start_distance
    }

    pub fn rotation_deg(&self) -> f32 {
        angle_delta_deg(self.start_angle, self.current_angle)
    }
}

/// What one frame did to the contact set.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FrameChange {
    pub(crate) count: usize,
    /// Two-finger baselines were re-taken on this frame.
    pub(crate) rebaselined: bool,
    /// Contacts joined or left; the centroid jump is not motion.
    pub(crate) set_changed: bool,
    pub(crate) moved: bool,
}

/// The single mutable aggregate of one interaction.
#[derive(Clone, Debug, Default)]
pub struct GestureSession {
    touches: BTreeMap<ContactId, TouchSample>,
    state: SessionState,
    start_ms: u64,
    last_sample_ms: u64,
    start_center: Point,
    current_center: Point,
    two_finger: Option<TwoFingerMetrics>,
    velocity: Vector,
    primary: Option<ContactId>,
    max_displacement: f32,
    multi_touch: bool,
    long_press_fired: bool,
    pinch_active: bool,
    rotate_active: bool,
    last_scale: f32,
    last_rotation_deg: f32,
    last_swipe: Option<SwipeDetail>,
}

impl GestureSession {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn touches(&self) -> impl Iterator<Item = &TouchSample> {
        self.touches.values()
    }

    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn last_sample_ms(&self) -> u64 {
        self.last_sample_ms
    }

    pub fn start_center(&self) -> Point {
        self.start_center
    }

    pub fn current_center(&self) -> Point {
        self.current_center
    }

    pub fn velocity(&self) -> Vector {
        self.velocity
    }

    /// Present only while exactly two contacts are live.
    pub fn two_finger(&self) -> Option<&TwoFingerMetrics> {
        if self.touches.len() == 2 {
            self.two_finger.as_ref()
        } else {
            None
        }
    }

    pub fn multi_touch(&self) -> bool {
        self.multi_touch
    }

    pub fn long_press_fired(&self) -> bool {
        self.long_press_fired
    }

    pub fn pinch_active(&self) -> bool {
        self.pinch_active
    }

    pub fn rotate_active(&self) -> bool {
        self.rotate_active
    }

    pub fn max_displacement(&self) -> f32 {
        self.max_displacement
    }

    pub fn displacement(&self) -> f32 {
        distance(self.start_center, self.current_center)
    }

    pub fn duration_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub(crate) fn mark_long_press_fired(&mut self) {
        self.long_press_fired = true;
    }

    pub(crate) fn begin(&mut self, now_ms: u64, samples: &[TouchSample]) {
        *self = Self {
            start_ms: now_ms,
            last_scale: 1.0,
            ..Self::default()
        };
        self.apply(now_ms, samples);
        self.start_center = self.current_center;
        self.max_displacement = 0.0;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn apply(&mut self, now_ms: u64, samples: &[TouchSample]) -> FrameChange {
        let prev_count = self.touches.len();
        let prev_ids: heapless::Vec<ContactId, 2> = if prev_count == 2 {
            self.touches.keys().copied().collect()
        } else {
            heapless::Vec::new()
        };
        let prev_center = self.current_center;

        let mut next = BTreeMap::new();
        for sample in samples {
            next.insert(sample.id, *sample);
        }
        let set_changed = prev_count > 0 && !self.touches.keys().eq(next.keys());
        self.update_primary(&next);
        self.touches = next;
        self.last_sample_ms = now_ms;

        let count = self.touches.len();
        if count > 1 {
            self.multi_touch = true;
        }
        if count > 0 {
            self.current_center = center(self.touches.values().map(TouchSample::point));
            if set_changed {
                // Re-anchor the origin so displacement carries across the jump.
                self.start_center = Point::new(
                    self.start_center.x + self.current_center.x - prev_center.x,
                    self.start_center.y + self.current_center.y - prev_center.y,
                );
            }
            self.max_displacement = self.max_displacement.max(self.displacement());
        }

        let mut rebaselined = false;
        if count == 2 {
            let mut points = self.touches.values().map(TouchSample::point);
            let (Some(a), Some(b)) = (points.next(), points.next()) else {
                return FrameChange::default();
            };
            let same_pair = prev_count == 2
                && self.touches.keys().copied().eq(prev_ids.iter().copied());
            match self.two_finger.as_mut() {
                Some(metrics) if same_pair => {
                    metrics.current_distance = distance(a, b);
                    metrics.current_angle = angle_deg(a, b);
                }
                _ => {
                    self.two_finger = Some(TwoFingerMetrics::baseline(a, b));
                    self.last_scale = 1.0;
                    self.last_rotation_deg = 0.0;
                    rebaselined = true;
                }
            }
        } else {
            self.two_finger = None;
        }

        FrameChange {
            count,
            rebaselined,
            set_changed,
            moved: count > 0 && !set_changed && prev_center != self.current_center,
        }
    }

    fn update_primary(&mut self, next: &BTreeMap<ContactId, TouchSample>) {
        let still_live = self
            .primary
            .and_then(|id| next.get(&id).map(|sample| (id, sample)));
        match still_live {
            Some((id, sample)) => {
                self.velocity = self
                    .touches
                    .get(&id)
                    .map_or(Vector::ZERO, |prev| sample_velocity(sample, prev));
            }
            None => {
                self.primary = next.keys().next().copied();
                self.velocity = Vector::ZERO;
            }
        }
    }

    /// Swipe payload for the current frame, remembered for `swipeend`.
    pub(crate) fn record_swipe(&mut self) -> SwipeDetail {
        let detail = self.swipe_detail();
        self.last_swipe = Some(detail);
        detail
    }

    /// Last swipe payload emitted; release frames carry no fresh velocity.
    pub(crate) fn final_swipe_detail(&self) -> SwipeDetail {
        self.last_swipe.unwrap_or_else(|| self.swipe_detail())
    }

    pub(crate) fn swipe_detail(&self) -> SwipeDetail {
        let dx = self.current_center.x - self.start_center.x;
        let dy = self.current_center.y - self.start_center.y;
        SwipeDetail {
            direction: direction(dx, dy),
            distance: (dx * dx + dy * dy).sqrt(),
            delta_x: dx,
            delta_y: dy,
            velocity: self.velocity,
        }
    }

    pub(crate) fn pinch_crossed(&self, threshold: f32) -> bool {
        self.two_finger()
            .is_some_and(|metrics| (metrics.scale() - 1.0).abs() > threshold)
    }

    pub(crate) fn rotate_crossed(&self, threshold_deg: f32) -> bool {
        self.two_finger()
            .is_some_and(|metrics| metrics.rotation_deg().abs() > threshold_deg)
    }

    pub(crate) fn activate_pinch(&mut self) {
        self.pinch_active = true;
    }

    pub(crate) fn activate_rotate(&mut self) {
        self.rotate_active = true;
    }

    /// Current pinch payload; `commit` advances the delta baseline.
    pub(crate) fn pinch_detail(&mut self, commit: bool) -> PinchDetail {
        let scale = self.two_finger().map_or(self.last_scale, TwoFingerMetrics::scale);
        let detail = PinchDetail {
            scale,
            delta_scale: scale - self.last_scale,
            center: self.current_center,
        };
        if commit {
            self.last_scale = scale;
        }
        detail
    }

    pub(crate) fn rotate_detail(&mut self, commit: bool) -> RotateDetail {
        let rotation_deg = self
            .two_finger()
            .map_or(self.last_rotation_deg, TwoFingerMetrics::rotation_deg);
        let detail = RotateDetail {
            rotation_deg,
            delta_deg: rotation_deg - self.last_rotation_deg,
            center: self.current_center,
        };
        if commit {
            self.last_rotation_deg = rotation_deg;
        }
        detail
    }

    pub(crate) fn final_pinch_detail(&self) -> PinchDetail {
        PinchDetail {
            scale: self.last_scale,
            delta_scale: 0.0,
            center: self.current_center,
        }
    }

    pub(crate) fn final_rotate_detail(&self) -> RotateDetail {
        RotateDetail {
            rotation_deg: self.last_rotation_deg,
            delta_deg: 0.0,
            center: self.current_center,
        }
    }
}
