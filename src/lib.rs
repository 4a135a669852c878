//! Stardrift - real-time simulation core for a 2D space game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (camera, particles, collisions, game state)
//!
//! The crate owns no rendering, audio, or input code. Collaborators feed a
//! normalized movement vector and action flags in through [`sim::TickInput`],
//! and read back per-particle visual descriptors (via [`sim::VisualSink`]),
//! the camera viewport, and drained [`sim::GameEvent`]s each tick.

pub mod sim;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (~60 Hz)
    pub const SIM_DT_MS: f32 = 1000.0 / 60.0;

    /// Ship collision radius
    pub const SHIP_RADIUS: f32 = 12.0;
    /// Thrust acceleration (pixels/s²)
    pub const SHIP_ACCEL: f32 = 300.0;
    /// Boost multiplier applied to thrust acceleration
    pub const SHIP_BOOST_MULT: f32 = 2.0;
    /// Maximum ship speed (pixels/s)
    pub const SHIP_MAX_SPEED: f32 = 400.0;
    /// Fraction of velocity lost to drag per second
    pub const SHIP_DRAG: f32 = 0.6;

    /// Energy pool ceiling
    pub const ENERGY_MAX: f32 = 100.0;
    /// Energy regeneration (units/s)
    pub const ENERGY_REGEN: f32 = 15.0;
    /// Energy cost of one laser shot
    pub const LASER_COST: f32 = 20.0;
    /// Laser reach (pixels)
    pub const LASER_RANGE: f32 = 600.0;

    /// Reward credited per unit of destroyed obstacle radius
    pub const REWARD_PER_RADIUS: f32 = 2.0;

    /// World half-extent used by the demo binary
    pub const WORLD_HALF_EXTENT: f32 = 2000.0;
}

/// Normalize angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
