//! Collision detection between the ship, lasers, and obstacles
//!
//! Two shapes are enough for this game: circle-vs-circle for the ship
//! against asteroids, and finite-segment-vs-circle for laser shots. Both
//! walk the obstacle registry in insertion order and resolve at most one
//! hit, mirroring line-of-sight semantics.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{circles_overlap, dist_sq_point_segment, segment_aabb_excludes};

/// An asteroid. The registry itself is owned by the game state; this
/// module only reads it and removes entries on resolved hits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
}

/// Counters for the ray broad/narrow phases. Tests use these to prove the
/// bounding-box pre-filter actually short-circuits the segment-distance
/// math for far-away obstacles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RayStats {
    /// Obstacles considered
    pub candidates: usize,
    /// Obstacles that survived the AABB pre-filter and were measured
    pub narrow_tests: usize,
}

/// First obstacle (insertion order) overlapping the circle at `center`,
/// or None. At most one collision is resolved per call.
pub fn first_circle_hit(obstacles: &[Obstacle], center: Vec2, radius: f32) -> Option<u32> {
    obstacles
        .iter()
        .find(|o| circles_overlap(center, radius, o.pos, o.radius))
        .map(|o| o.id)
}

/// First obstacle (insertion order) hit by the segment `from..to`.
///
/// Each obstacle first goes through an axis-aligned bounding-box rejection
/// (segment box expanded by the obstacle radius); only survivors pay for
/// the projection-and-clamp distance test. A zero-length ray degrades to a
/// point-distance check.
pub fn first_ray_hit_with_stats(
    obstacles: &[Obstacle],
    from: Vec2,
    to: Vec2,
    stats: &mut RayStats,
) -> Option<u32> {
    for o in obstacles {
        stats.candidates += 1;
        if segment_aabb_excludes(o.pos, o.radius, from, to) {
            continue;
        }
        stats.narrow_tests += 1;
        if dist_sq_point_segment(o.pos, from, to) < o.radius * o.radius {
            return Some(o.id);
        }
    }
    None
}

/// [`first_ray_hit_with_stats`] without the instrumentation
pub fn first_ray_hit(obstacles: &[Obstacle], from: Vec2, to: Vec2) -> Option<u32> {
    let mut stats = RayStats::default();
    first_ray_hit_with_stats(obstacles, from, to, &mut stats)
}

/// Reflect velocity off a surface: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Resolve a laser shot: find the first hit obstacle, remove it from the
/// registry by identity (indices shift when earlier hits removed entries
/// this tick), and hand it back so the caller can run the reward and
/// effect side effects exactly once.
pub fn resolve_ray_hit(obstacles: &mut Vec<Obstacle>, from: Vec2, to: Vec2) -> Option<Obstacle> {
    let hit_id = first_ray_hit(obstacles, from, to)?;
    let idx = obstacles.iter().position(|o| o.id == hit_id)?;
    Some(obstacles.remove(idx))
}
