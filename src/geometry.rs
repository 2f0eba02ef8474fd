//! Pure geometry over touch points.

use crate::{
    event::SwipeDirection,
    types::{Point, TouchSample, Vector},
};

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Componentwise mean. An empty set yields the origin.
pub fn center<I>(points: I) -> Point
where
    I: IntoIterator<Item = Point>,
{
    let mut sum_x = 0.0f32;
    let mut sum_y = 0.0f32;
    let mut count = 0u32;
    for point in points {
        sum_x += point.x;
        sum_y += point.y;
        count += 1;
    }
    if count == 0 {
        return Point::default();
    }
    Point::new(sum_x / count as f32, sum_y / count as f32)
}

/// Angle of the segment `a -> b` in degrees, in (-180, 180].
pub fn angle_deg(a: Point, b: Point) -> f32 {
    let deg = (b.y - a.y).atan2(b.x - a.x).to_degrees();
    wrap_deg(deg)
}

/// Signed shortest rotation from `from` to `to`, in (-180, 180].
pub fn angle_delta_deg(from: f32, to: f32) -> f32 {
    wrap_deg(to - from)
}

fn wrap_deg(deg: f32) -> f32 {
    let mut wrapped = deg % 360.0;
    if wrapped > 180.0 {
        wrapped -= 360.0;
    } else if wrapped <= -180.0 {
        wrapped += 360.0;
    }
    wrapped
}

/// Displacement over `dt_ms`. Non-positive or non-finite `dt_ms` yields zero.
pub fn velocity(curr: Point, prev: Point, dt_ms: f32) -> Vector {
    if dt_ms <= 0.0 || !dt_ms.is_finite() {
        return Vector::ZERO;
    }
    Vector {
        x: (curr.x - prev.x) / dt_ms,
        y: (curr.y - prev.y) / dt_ms,
    }
}

/// Velocity between two samples of the same contact.
pub fn sample_velocity(curr: &TouchSample, prev: &TouchSample) -> Vector {
    let dt_ms = curr.t_ms as i64 - prev.t_ms as i64;
    if dt_ms <= 0 {
        return Vector::ZERO;
    }
    velocity(curr.point(), prev.point(), dt_ms as f32)
}

/// Dominant axis of a displacement. Ties resolve to the horizontal axis.
pub fn direction(dx: f32, dy: f32) -> SwipeDirection {
    if dx.abs() >= dy.abs() {
        if dx > 0.0 {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        }
    } else if dy > 0.0 {
        SwipeDirection::Down
    } else {
        SwipeDirection::Up
    }
}
