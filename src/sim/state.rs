//! Game state and core simulation types
//!
//! Everything the scheduler advances lives here. The particle engine is
//! rebuilt fresh on load (purely visual, never persisted), everything else
//! serializes for save/restore and headless snapshots.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::collision::Obstacle;
use super::particles::ParticleEngine;
use crate::consts::*;

/// Input sampled once per tick by the input collaborator.
///
/// `movement` is a normalized direction (magnitude ≤ 1; the scheduler
/// re-clamps defensively). The `*_pressed` flags are one-shot edges that
/// stay true for exactly one tick; the scheduler clears them after reading.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub movement: Vec2,
    pub boost: bool,
    pub fire: bool,
    pub interact: bool,
    pub fire_pressed: bool,
    pub interact_pressed: bool,
}

impl TickInput {
    /// Reset one-shot edge flags. Called by the scheduler as the final
    /// step of each tick so a physical press is seen exactly once.
    pub fn clear_edges(&mut self) {
        self.fire_pressed = false;
        self.interact_pressed = false;
    }
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing angle in radians
    pub rotation: f32,
    pub radius: f32,
    pub energy: f32,
}

impl Default for Ship {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            rotation: 0.0,
            radius: SHIP_RADIUS,
            energy: ENERGY_MAX,
        }
    }
}

/// Fire-and-forget notifications for the audio and game-state
/// collaborators, drained once per tick via [`GameState::drain_events`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LaserFired,
    ObstacleDestroyed { id: u32 },
    RewardGranted { amount: u64 },
    ShipCollided { obstacle_id: u32 },
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Elapsed simulation time in ms (sum of injected deltas)
    pub elapsed_ms: f64,
    pub ship: Ship,
    /// Credits earned from destroyed obstacles
    pub credits: u64,
    /// Asteroid registry, insertion order preserved for collision checks
    pub obstacles: Vec<Obstacle>,
    pub camera: Camera,
    /// Visual particles (not gameplay-affecting, rebuilt on load)
    #[serde(skip)]
    pub particles: ParticleEngine,
    /// Thruster trail emitter, live only while the ship is thrusting
    #[serde(skip)]
    pub thruster_emitter: Option<u32>,
    /// Events queued this tick, drained by collaborators
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed and screen size
    pub fn new(seed: u64, screen_width: f32, screen_height: f32) -> Self {
        Self {
            seed,
            time_ticks: 0,
            elapsed_ms: 0.0,
            ship: Ship::default(),
            credits: 0,
            obstacles: Vec::new(),
            camera: Camera::new(screen_width, screen_height, WORLD_HALF_EXTENT),
            particles: ParticleEngine::new(seed),
            thruster_emitter: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Register an asteroid supplied by the game-state collaborator
    pub fn spawn_obstacle(&mut self, pos: Vec2, radius: f32) -> u32 {
        let id = self.next_entity_id();
        self.obstacles.push(Obstacle { id, pos, radius });
        id
    }

    /// Take this tick's queued events, leaving the queue empty
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_monotonic() {
        let mut state = GameState::new(1, 800.0, 600.0);
        let a = state.spawn_obstacle(Vec2::ZERO, 10.0);
        let b = state.spawn_obstacle(Vec2::ONE, 10.0);
        assert!(b > a);
    }

    #[test]
    fn test_drain_events_empties_queue() {
        let mut state = GameState::new(1, 800.0, 600.0);
        state.events.push(GameEvent::LaserFired);
        let drained = state.drain_events();
        assert_eq!(drained, vec![GameEvent::LaserFired]);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = GameState::new(42, 800.0, 600.0);
        state.spawn_obstacle(Vec2::new(100.0, 50.0), 20.0);
        state.credits = 99;
        let json = serde_json::to_string(&state).unwrap();
        let restored: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.seed, 42);
        assert_eq!(restored.credits, 99);
        assert_eq!(restored.obstacles.len(), 1);
        // Skipped fields come back fresh
        assert!(restored.particles.particles().is_empty());
        assert!(restored.events.is_empty());
    }
}
