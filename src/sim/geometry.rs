//! Geometry primitives shared by collision and camera code
//!
//! Pure functions, no state. Everything works on squared distances where
//! possible to keep the hot path free of square roots.

use glam::Vec2;

/// Squared distance from a point to a finite segment `a..b`.
///
/// Standard projection-and-clamp: the parametric `t` along the segment is
/// clamped to [0,1] before measuring. A zero-length segment degenerates to
/// plain point distance, so callers never divide by zero.
pub fn dist_sq_point_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < f32::EPSILON {
        return (p - a).length_squared();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).length_squared()
}

/// True iff two circles overlap (strict: touching circles do not collide)
#[inline]
pub fn circles_overlap(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> bool {
    let sum = r0 + r1;
    (c1 - c0).length_squared() < sum * sum
}

/// Axis-aligned bounding-box rejection for a segment vs a circle.
///
/// Returns true when `center` lies outside the segment's bounding box
/// expanded by `radius`, i.e. the circle cannot possibly touch the segment
/// and the narrow-phase test can be skipped.
#[inline]
pub fn segment_aabb_excludes(center: Vec2, radius: f32, a: Vec2, b: Vec2) -> bool {
    let min_x = a.x.min(b.x) - radius;
    let max_x = a.x.max(b.x) + radius;
    let min_y = a.y.min(b.y) - radius;
    let max_y = a.y.max(b.y) + radius;
    center.x < min_x || center.x > max_x || center.y < min_y || center.y > max_y
}

/// True iff a circle intersects an axis-aligned rectangle given by its
/// min corner and size.
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect_min: Vec2, rect_size: Vec2) -> bool {
    let rect_max = rect_min + rect_size;
    let nearest = center.clamp(rect_min, rect_max);
    (center - nearest).length_squared() <= radius * radius
}
