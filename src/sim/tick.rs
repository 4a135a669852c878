//! Fixed timestep simulation tick
//!
//! The cooperative frame scheduler. Each invocation runs the same fixed
//! order: input sampling → ship integration → energy regeneration →
//! collision checks (laser, then ship-vs-obstacle) → camera update →
//! particle engine tick → edge-flag reset. Nothing blocks; per-tick spawn
//! caps in the particle engine bound the worst case.

use glam::Vec2;
use std::f32::consts::PI;

use super::collision::{first_circle_hit, reflect_velocity, resolve_ray_hit};
use super::particles::VisualSink;
use super::state::{GameEvent, GameState, TickInput};
use crate::consts::*;
use crate::{normalize_angle, polar_to_cartesian};

/// Advance the game state by one timestep of `dt_ms` milliseconds.
///
/// `input` is mutated only to clear its one-shot edge flags after they
/// have been read, so a physical press fires exactly once.
pub fn tick(state: &mut GameState, input: &mut TickInput, dt_ms: f32, sink: &mut dyn VisualSink) {
    state.time_ticks += 1;
    state.elapsed_ms += dt_ms as f64;
    let dt_s = dt_ms / 1000.0;

    // --- Input sampling ---
    // The input collaborator promises magnitude <= 1; re-clamp anyway.
    let movement = if input.movement.length_squared() > 1.0 {
        input.movement.normalize()
    } else {
        input.movement
    };
    let thrusting = movement.length_squared() > 1e-6;

    // --- Ship integration ---
    if thrusting {
        let accel = SHIP_ACCEL * if input.boost { SHIP_BOOST_MULT } else { 1.0 };
        state.ship.vel += movement * accel * dt_s;
        state.ship.rotation = movement.y.atan2(movement.x);
    }
    state.ship.vel *= (1.0 - SHIP_DRAG * dt_s).max(0.0);
    let speed = state.ship.vel.length();
    if speed > SHIP_MAX_SPEED {
        state.ship.vel = state.ship.vel / speed * SHIP_MAX_SPEED;
    }
    state.ship.pos += state.ship.vel * dt_s;

    update_thruster_trail(state, thrusting, sink);

    // --- Resource regeneration ---
    state.ship.energy = (state.ship.energy + ENERGY_REGEN * dt_s).min(ENERGY_MAX);

    // --- Collision checks ---
    // Laser: edge-triggered and energy-gated; a shot resolves at most one
    // obstacle, and the reward/effect side effects run exactly once.
    if input.fire_pressed && state.ship.energy >= LASER_COST {
        state.ship.energy -= LASER_COST;
        state.events.push(GameEvent::LaserFired);

        let from = state.ship.pos;
        let to = from + polar_to_cartesian(LASER_RANGE, state.ship.rotation);
        if let Some(hit) = resolve_ray_hit(&mut state.obstacles, from, to) {
            let reward = (hit.radius * REWARD_PER_RADIUS) as u64;
            state.credits += reward;
            state.events.push(GameEvent::ObstacleDestroyed { id: hit.id });
            state.events.push(GameEvent::RewardGranted { amount: reward });
            if let Err(e) = state.particles.spawn_explosion(hit.pos, sink) {
                log::warn!("explosion emitter rejected: {e}");
            }
            if let Err(e) = state.particles.spawn_debris(hit.pos, sink) {
                log::warn!("debris emitter rejected: {e}");
            }
            log::info!("obstacle {} destroyed, +{} credits", hit.id, reward);
        }
    }

    // Ship vs obstacles: first match only, one collision per tick
    if let Some(hit_id) = first_circle_hit(&state.obstacles, state.ship.pos, state.ship.radius) {
        if let Some(o) = state.obstacles.iter().find(|o| o.id == hit_id) {
            let mut normal = (state.ship.pos - o.pos).normalize_or_zero();
            if normal == Vec2::ZERO {
                normal = Vec2::X;
            }
            if state.ship.vel.dot(normal) < 0.0 {
                state.ship.vel = reflect_velocity(state.ship.vel, normal);
            }
            let contact = state.ship.pos - normal * state.ship.radius;
            if let Err(e) = state
                .particles
                .spawn_sparks(contact, normal.y.atan2(normal.x), sink)
            {
                log::warn!("spark emitter rejected: {e}");
            }
        }
        state.events.push(GameEvent::ShipCollided { obstacle_id: hit_id });
    }

    // --- Camera ---
    state.camera.follow(state.ship.pos);
    state.camera.update();

    // --- Particle engine ---
    state.particles.tick(dt_ms, sink);

    // --- Edge reset: "just pressed" flags are seen exactly once ---
    input.clear_edges();
}

/// Keep the thruster trail emitter pinned behind the ship while thrusting
/// and tear it down (cascading its particles) the moment thrust stops.
fn update_thruster_trail(state: &mut GameState, thrusting: bool, sink: &mut dyn VisualSink) {
    if !thrusting {
        if let Some(id) = state.thruster_emitter.take() {
            state.particles.remove_emitter(id, sink);
        }
        return;
    }

    let exhaust_dir = normalize_angle(state.ship.rotation + PI);
    let exhaust_pos = state.ship.pos + polar_to_cartesian(state.ship.radius, exhaust_dir);

    if let Some(id) = state.thruster_emitter {
        if state.particles.set_emitter_origin(id, exhaust_pos) {
            state.particles.set_emitter_direction(id, exhaust_dir);
            return;
        }
        state.thruster_emitter = None;
    }
    match state.particles.spawn_thruster(exhaust_pos, exhaust_dir, sink) {
        Ok(id) => state.thruster_emitter = Some(id),
        Err(e) => log::warn!("thruster emitter rejected: {e}"),
    }
}
