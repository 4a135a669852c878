//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep with injected elapsed time (no ambient clock reads)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod camera;
pub mod collision;
pub mod geometry;
pub mod particles;
pub mod state;
pub mod tick;

pub use camera::{Camera, Viewport, MIN_SMOOTHING};
pub use collision::{
    first_circle_hit, first_ray_hit, first_ray_hit_with_stats, reflect_velocity, resolve_ray_hit,
    Obstacle, RayStats,
};
pub use particles::{
    ConfigError, Emitter, EmitterConfig, NullSink, Particle, ParticleEngine, Rgb, VisualSink,
    MAX_PARTICLES, MAX_SPAWNS_PER_TICK, SPAWN_JITTER,
};
pub use state::{GameEvent, GameState, Ship, TickInput};
pub use tick::tick;
