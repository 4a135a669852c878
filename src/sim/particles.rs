//! Particle/emitter engine
//!
//! Owns every ephemeral visual entity in the game. Emitters are configured
//! sources that produce particles in a single burst or incrementally at a
//! fixed rate; particles integrate simple physics each tick and derive
//! their opacity and size from their remaining life. The engine is
//! deterministic: seeded RNG, injected elapsed time, iteration in id order.
//!
//! Rendering is a collaborator behind [`VisualSink`]: every particle owns
//! exactly one visual handle, created at birth and released exactly once
//! at death (or when its emitter is removed).

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use thiserror::Error;

use crate::polar_to_cartesian;

/// Global particle registry cap. When full, the oldest particle is retired
/// early to make room (matching the render budget, not gameplay state).
pub const MAX_PARTICLES: usize = 2048;

/// Cap on incremental spawns per tick so a long frame catches up over the
/// following ticks instead of stalling this one.
pub const MAX_SPAWNS_PER_TICK: usize = 64;

/// Uniform birth-position jitter applied per axis around the emitter origin
pub const SPAWN_JITTER: f32 = 3.0;

/// RGB color, components in [0,1]
pub type Rgb = [f32; 3];

/// Emitter configuration errors, surfaced synchronously from
/// [`ParticleEngine::create_emitter`]. Nothing here is silently clamped.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("particle count must be at least 1")]
    ZeroParticleCount,
    #[error("particle life must be positive, got {0} ms")]
    NonPositiveLife(f32),
    #[error("emission rate must be positive for continuous emitters, got {0}/s")]
    NonPositiveEmissionRate(f32),
    #[error("speed range is invalid: min {min} > max {max} or negative")]
    InvalidSpeedRange { min: f32, max: f32 },
    #[error("size range is invalid: min {min} > max {max} or non-positive")]
    InvalidSizeRange { min: f32, max: f32 },
    #[error("spread must be non-negative, got {0}")]
    NegativeSpread(f32),
    #[error("color set must not be empty")]
    EmptyColorSet,
    #[error("opacity endpoints must lie in [0,1], got {0}")]
    OpacityOutOfRange(f32),
}

/// Emitter configuration. Unset fields take the documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Particles per burst, or total budget hint for presets (default 20)
    pub particle_count: usize,
    /// Life span of each particle in milliseconds (default 2000)
    pub particle_life_ms: f32,
    /// Incremental spawn rate in particles/second (default 10)
    pub emission_rate: f32,
    /// Angular spread in radians around `direction` (default TAU)
    pub spread: f32,
    /// Base emission direction in radians (default 0)
    pub direction: f32,
    /// Initial speed range in pixels/second (default [50, 100])
    pub speed_min: f32,
    pub speed_max: f32,
    /// Initial size range in pixels (default [2, 6])
    pub size_min: f32,
    pub size_max: f32,
    /// Opacity curve endpoints over the particle's life (default 1 → 0)
    pub opacity_start: f32,
    pub opacity_end: f32,
    /// Constant acceleration applied to velocity (pixels/s², default zero)
    pub gravity: Vec2,
    pub wind: Vec2,
    /// Derive opacity from life ratio (default true)
    pub fade_out: bool,
    /// Derive size from life ratio (default false)
    pub shrink: bool,
    /// Spawn all particles synchronously at creation (default false)
    pub burst: bool,
    /// Emission window in ms; <= 0 means emit until removed (default -1)
    pub duration_ms: f32,
    /// Color set; each particle samples one uniformly at birth
    pub colors: Vec<Rgb>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            particle_count: 20,
            particle_life_ms: 2000.0,
            emission_rate: 10.0,
            spread: TAU,
            direction: 0.0,
            speed_min: 50.0,
            speed_max: 100.0,
            size_min: 2.0,
            size_max: 6.0,
            opacity_start: 1.0,
            opacity_end: 0.0,
            gravity: Vec2::ZERO,
            wind: Vec2::ZERO,
            fade_out: true,
            shrink: false,
            burst: false,
            duration_ms: -1.0,
            colors: vec![[1.0, 1.0, 1.0]],
        }
    }
}

impl EmitterConfig {
    /// Validate the configuration. Called by `create_emitter` before any
    /// state is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::ZeroParticleCount);
        }
        if self.particle_life_ms <= 0.0 {
            return Err(ConfigError::NonPositiveLife(self.particle_life_ms));
        }
        if !self.burst && self.emission_rate <= 0.0 {
            return Err(ConfigError::NonPositiveEmissionRate(self.emission_rate));
        }
        if self.speed_min < 0.0 || self.speed_min > self.speed_max {
            return Err(ConfigError::InvalidSpeedRange {
                min: self.speed_min,
                max: self.speed_max,
            });
        }
        if self.size_min <= 0.0 || self.size_min > self.size_max {
            return Err(ConfigError::InvalidSizeRange {
                min: self.size_min,
                max: self.size_max,
            });
        }
        if self.spread < 0.0 {
            return Err(ConfigError::NegativeSpread(self.spread));
        }
        if self.colors.is_empty() {
            return Err(ConfigError::EmptyColorSet);
        }
        for &o in &[self.opacity_start, self.opacity_end] {
            if !(0.0..=1.0).contains(&o) {
                return Err(ConfigError::OpacityOutOfRange(o));
            }
        }
        Ok(())
    }

    /// Explosion: one bright outward burst that fades and shrinks
    pub fn explosion() -> Self {
        Self {
            particle_count: 40,
            particle_life_ms: 800.0,
            speed_min: 80.0,
            speed_max: 260.0,
            size_min: 2.0,
            size_max: 7.0,
            shrink: true,
            burst: true,
            colors: vec![
                [1.0, 0.85, 0.3],
                [1.0, 0.55, 0.1],
                [1.0, 0.3, 0.05],
                [0.9, 0.9, 0.9],
            ],
            ..Self::default()
        }
    }

    /// Thruster trail: a tight continuous cone opposite `direction`
    pub fn thruster(direction: f32) -> Self {
        Self {
            particle_life_ms: 400.0,
            emission_rate: 60.0,
            spread: 0.5,
            direction,
            speed_min: 30.0,
            speed_max: 80.0,
            size_min: 1.5,
            size_max: 3.5,
            shrink: true,
            colors: vec![[0.4, 0.7, 1.0], [0.7, 0.85, 1.0], [1.0, 1.0, 1.0]],
            ..Self::default()
        }
    }

    /// Debris field: slow grey chunks with a slight drift
    pub fn debris() -> Self {
        Self {
            particle_count: 12,
            particle_life_ms: 1500.0,
            speed_min: 40.0,
            speed_max: 120.0,
            size_min: 2.0,
            size_max: 5.0,
            gravity: Vec2::new(0.0, 25.0),
            burst: true,
            colors: vec![[0.55, 0.55, 0.6], [0.4, 0.4, 0.45], [0.7, 0.7, 0.72]],
            ..Self::default()
        }
    }

    /// Sparks: a short fast cone around `direction`
    pub fn sparks(direction: f32) -> Self {
        Self {
            particle_count: 10,
            particle_life_ms: 300.0,
            spread: 1.0,
            direction,
            speed_min: 120.0,
            speed_max: 300.0,
            size_min: 1.0,
            size_max: 2.5,
            burst: true,
            colors: vec![[1.0, 1.0, 0.7], [1.0, 0.95, 0.4]],
            ..Self::default()
        }
    }
}

/// Render collaborator boundary. One handle per particle, created at birth
/// and released exactly once. `update` returns false when the handle was
/// already released; the engine then skips that particle's visual pushes
/// for the rest of its life.
pub trait VisualSink {
    fn create(&mut self, pos: Vec2, size: f32, color: Rgb, opacity: f32) -> u64;
    fn update(&mut self, handle: u64, pos: Vec2, size: f32, opacity: f32) -> bool;
    fn release(&mut self, handle: u64);
}

/// Sink that accepts everything and draws nothing
#[derive(Debug, Default)]
pub struct NullSink {
    next: u64,
}

impl VisualSink for NullSink {
    fn create(&mut self, _pos: Vec2, _size: f32, _color: Rgb, _opacity: f32) -> u64 {
        self.next += 1;
        self.next
    }
    fn update(&mut self, _handle: u64, _pos: Vec2, _size: f32, _opacity: f32) -> bool {
        true
    }
    fn release(&mut self, _handle: u64) {}
}

/// A live particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    /// Owning emitter, stored directly so cleanup never scans all emitters
    pub emitter_id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Size at birth, used for shrink interpolation
    pub original_size: f32,
    pub color: Rgb,
    pub opacity: f32,
    pub remaining_life_ms: f32,
    pub max_life_ms: f32,
    pub spawned_at_ms: f64,
    /// Visual handle, owned 1:1
    pub visual: u64,
    /// Set once the sink reports the handle gone; visual pushes stop
    #[serde(skip)]
    pub visual_lost: bool,
}

impl Particle {
    /// Remaining life over max life, clamped to [0,1]
    #[inline]
    pub fn life_ratio(&self) -> f32 {
        (self.remaining_life_ms / self.max_life_ms).clamp(0.0, 1.0)
    }
}

/// A particle source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emitter {
    pub id: u32,
    pub origin: Vec2,
    pub config: EmitterConfig,
    /// Count of live particles owned by this emitter
    pub live_particles: usize,
    pub last_emission_ms: f64,
    pub created_at_ms: f64,
    /// False once the emission window closed; the emitter lingers until
    /// its remaining particles expire
    pub active: bool,
}

/// The particle/emitter engine. Exclusively owns both registries; both are
/// kept in ascending id order for deterministic iteration.
#[derive(Debug)]
pub struct ParticleEngine {
    emitters: Vec<Emitter>,
    particles: Vec<Particle>,
    next_id: u32,
    rng: Pcg32,
    /// Engine clock in ms, advanced only by injected tick deltas
    clock_ms: f64,
}

impl Default for ParticleEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ParticleEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            emitters: Vec::new(),
            particles: Vec::with_capacity(256),
            next_id: 1,
            rng: Pcg32::seed_from_u64(seed),
            clock_ms: 0.0,
        }
    }

    /// Create an emitter at `origin`. Burst emitters spawn their full
    /// particle count synchronously before this returns and never emit
    /// again; continuous emitters spawn from `tick`.
    pub fn create_emitter(
        &mut self,
        origin: Vec2,
        config: EmitterConfig,
        sink: &mut dyn VisualSink,
    ) -> Result<u32, ConfigError> {
        config.validate()?;

        let id = self.next_id;
        self.next_id += 1;
        let burst = config.burst;
        let count = config.particle_count;

        self.emitters.push(Emitter {
            id,
            origin,
            config,
            live_particles: 0,
            last_emission_ms: self.clock_ms,
            created_at_ms: self.clock_ms,
            active: true,
        });

        if burst {
            let idx = self.emitters.len() - 1;
            for _ in 0..count {
                self.spawn_from(idx, sink);
            }
            self.emitters[idx].active = false;
        }

        Ok(id)
    }

    /// Convenience spawners over the preset configurations
    pub fn spawn_explosion(&mut self, pos: Vec2, sink: &mut dyn VisualSink) -> Result<u32, ConfigError> {
        self.create_emitter(pos, EmitterConfig::explosion(), sink)
    }

    pub fn spawn_thruster(&mut self, pos: Vec2, direction: f32, sink: &mut dyn VisualSink) -> Result<u32, ConfigError> {
        self.create_emitter(pos, EmitterConfig::thruster(direction), sink)
    }

    pub fn spawn_debris(&mut self, pos: Vec2, sink: &mut dyn VisualSink) -> Result<u32, ConfigError> {
        self.create_emitter(pos, EmitterConfig::debris(), sink)
    }

    pub fn spawn_sparks(&mut self, pos: Vec2, direction: f32, sink: &mut dyn VisualSink) -> Result<u32, ConfigError> {
        self.create_emitter(pos, EmitterConfig::sparks(direction), sink)
    }

    /// Move an emitter. Unknown ids are a no-op returning false (they
    /// routinely race with natural expiry).
    pub fn set_emitter_origin(&mut self, id: u32, origin: Vec2) -> bool {
        match self.emitter_index(id) {
            Some(i) => {
                self.emitters[i].origin = origin;
                true
            }
            None => {
                log::debug!("set_emitter_origin: unknown emitter {id}");
                false
            }
        }
    }

    /// Re-aim an emitter's base emission direction. Unknown ids are a
    /// no-op returning false.
    pub fn set_emitter_direction(&mut self, id: u32, direction: f32) -> bool {
        match self.emitter_index(id) {
            Some(i) => {
                self.emitters[i].config.direction = direction;
                true
            }
            None => {
                log::debug!("set_emitter_direction: unknown emitter {id}");
                false
            }
        }
    }

    /// Remove an emitter and synchronously cascade to its particles:
    /// every owned particle leaves the registry and its visual handle is
    /// released. Unknown ids are a no-op returning false.
    pub fn remove_emitter(&mut self, id: u32, sink: &mut dyn VisualSink) -> bool {
        let Some(idx) = self.emitter_index(id) else {
            log::debug!("remove_emitter: unknown emitter {id}");
            return false;
        };
        self.particles.retain(|p| {
            if p.emitter_id == id {
                if !p.visual_lost {
                    sink.release(p.visual);
                }
                false
            } else {
                true
            }
        });
        self.emitters.remove(idx);
        true
    }

    /// Advance all emitters and particles by `dt_ms`.
    ///
    /// Fixed order per tick: emitter expiry and incremental emission,
    /// then particle integration and visual push, then retirement of
    /// expired particles, then removal of drained emitters. A particle
    /// born here is always integrated and pushed before it can expire on
    /// a later tick.
    pub fn tick(&mut self, dt_ms: f32, sink: &mut dyn VisualSink) {
        self.clock_ms += dt_ms as f64;
        let dt_s = dt_ms / 1000.0;

        // 1. Emitter expiry and incremental emission
        let mut due: Vec<usize> = Vec::new();
        let mut budget = MAX_SPAWNS_PER_TICK;
        for (i, e) in self.emitters.iter_mut().enumerate() {
            if !e.active {
                continue;
            }
            if e.config.duration_ms > 0.0
                && self.clock_ms - e.created_at_ms >= e.config.duration_ms as f64
            {
                e.active = false;
                continue;
            }
            if e.config.burst {
                continue;
            }
            // Advance the emission clock by whole intervals rather than
            // snapping it to the tick clock: snapping would discard the
            // fractional remainder whenever dt does not divide the
            // interval and starve the configured rate.
            let interval_ms = (1000.0 / e.config.emission_rate) as f64;
            while budget > 0 && self.clock_ms - e.last_emission_ms >= interval_ms {
                e.last_emission_ms += interval_ms;
                due.push(i);
                budget -= 1;
            }
        }
        for i in due {
            self.spawn_from(i, sink);
        }

        // 2. Integration and derived visuals
        let emitters = &self.emitters;
        for p in self.particles.iter_mut() {
            let Ok(ei) = emitters.binary_search_by_key(&p.emitter_id, |e| e.id) else {
                continue;
            };
            let cfg = &emitters[ei].config;
            p.pos += p.vel * dt_s;
            p.vel += (cfg.gravity + cfg.wind) * dt_s;
            p.remaining_life_ms -= dt_ms;
            let ratio = p.life_ratio();
            if cfg.fade_out {
                p.opacity = cfg.opacity_end + ratio * (cfg.opacity_start - cfg.opacity_end);
            }
            if cfg.shrink {
                p.size = p.original_size * ratio;
            }
            if !p.visual_lost && !sink.update(p.visual, p.pos, p.size, p.opacity) {
                log::warn!(
                    "visual handle {} for particle {} already released, skipping it from now on",
                    p.visual,
                    p.id
                );
                p.visual_lost = true;
            }
        }

        // 3. Retire expired particles
        let mut retired: Vec<(u32, u64, bool)> = Vec::new();
        self.particles.retain(|p| {
            if p.remaining_life_ms <= 0.0 {
                retired.push((p.emitter_id, p.visual, p.visual_lost));
                false
            } else {
                true
            }
        });
        for (emitter_id, visual, visual_lost) in retired {
            if !visual_lost {
                sink.release(visual);
            }
            if let Some(i) = self.emitter_index(emitter_id) {
                self.emitters[i].live_particles = self.emitters[i].live_particles.saturating_sub(1);
            }
        }

        // 4. Drop emitters that are done emitting and own no particles
        self.emitters.retain(|e| e.active || e.live_particles > 0);
    }

    pub fn emitter(&self, id: u32) -> Option<&Emitter> {
        self.emitter_index(id).map(|i| &self.emitters[i])
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Live particles owned by one emitter
    pub fn particles_of(&self, emitter_id: u32) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(move |p| p.emitter_id == emitter_id)
    }

    /// Engine clock in milliseconds (sum of injected tick deltas)
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    fn emitter_index(&self, id: u32) -> Option<usize> {
        self.emitters.binary_search_by_key(&id, |e| e.id).ok()
    }

    /// Spawn one particle from the emitter at `emitter_idx`, retiring the
    /// oldest particle first if the registry is full.
    fn spawn_from(&mut self, emitter_idx: usize, sink: &mut dyn VisualSink) {
        if self.particles.len() >= MAX_PARTICLES {
            let oldest = self.particles.remove(0);
            if !oldest.visual_lost {
                sink.release(oldest.visual);
            }
            if let Some(i) = self.emitter_index(oldest.emitter_id) {
                self.emitters[i].live_particles = self.emitters[i].live_particles.saturating_sub(1);
            }
        }

        let id = self.next_id;
        self.next_id += 1;

        let e = &self.emitters[emitter_idx];
        let cfg = &e.config;
        let pos = e.origin
            + Vec2::new(
                self.rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER),
                self.rng.random_range(-SPAWN_JITTER..=SPAWN_JITTER),
            );
        let half_spread = cfg.spread / 2.0;
        let angle = cfg.direction + self.rng.random_range(-half_spread..=half_spread);
        let speed = self.rng.random_range(cfg.speed_min..=cfg.speed_max);
        let size = self.rng.random_range(cfg.size_min..=cfg.size_max);
        let color = cfg.colors[self.rng.random_range(0..cfg.colors.len())];
        let opacity = cfg.opacity_start;
        let life = cfg.particle_life_ms;
        let emitter_id = e.id;

        let visual = sink.create(pos, size, color, opacity);
        self.particles.push(Particle {
            id,
            emitter_id,
            pos,
            vel: polar_to_cartesian(speed, angle),
            size,
            original_size: size,
            color,
            opacity,
            remaining_life_ms: life,
            max_life_ms: life,
            spawned_at_ms: self.clock_ms,
            visual,
            visual_lost: false,
        });
        self.emitters[emitter_idx].live_particles += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that records create/update/release calls and can simulate a
    /// handle being released out from under the engine.
    #[derive(Default)]
    struct RecordingSink {
        next: u64,
        created: Vec<u64>,
        released: Vec<u64>,
        updates: usize,
        dead_handles: Vec<u64>,
    }

    impl VisualSink for RecordingSink {
        fn create(&mut self, _pos: Vec2, _size: f32, _color: Rgb, _opacity: f32) -> u64 {
            self.next += 1;
            self.created.push(self.next);
            self.next
        }
        fn update(&mut self, handle: u64, _pos: Vec2, _size: f32, _opacity: f32) -> bool {
            self.updates += 1;
            !self.dead_handles.contains(&handle)
        }
        fn release(&mut self, handle: u64) {
            assert!(
                !self.released.contains(&handle),
                "handle {handle} released twice"
            );
            self.released.push(handle);
        }
    }

    const DT: f32 = 16.0;

    #[test]
    fn test_config_validation_rejects_bad_ranges() {
        let mut sink = NullSink::default();
        let mut engine = ParticleEngine::new(1);

        let cfg = EmitterConfig {
            speed_min: 100.0,
            speed_max: 50.0,
            ..Default::default()
        };
        assert_eq!(
            engine.create_emitter(Vec2::ZERO, cfg, &mut sink),
            Err(ConfigError::InvalidSpeedRange { min: 100.0, max: 50.0 })
        );

        let cfg = EmitterConfig {
            particle_count: 0,
            ..Default::default()
        };
        assert_eq!(
            engine.create_emitter(Vec2::ZERO, cfg, &mut sink),
            Err(ConfigError::ZeroParticleCount)
        );

        let cfg = EmitterConfig {
            particle_life_ms: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            engine.create_emitter(Vec2::ZERO, cfg, &mut sink),
            Err(ConfigError::NonPositiveLife(_))
        ));

        let cfg = EmitterConfig {
            colors: vec![],
            ..Default::default()
        };
        assert_eq!(
            engine.create_emitter(Vec2::ZERO, cfg, &mut sink),
            Err(ConfigError::EmptyColorSet)
        );

        let cfg = EmitterConfig {
            opacity_start: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            engine.create_emitter(Vec2::ZERO, cfg, &mut sink),
            Err(ConfigError::OpacityOutOfRange(_))
        ));

        // Failed creation leaves no state behind
        assert!(engine.emitters().is_empty());
        assert!(engine.particles().is_empty());
    }

    #[test]
    fn test_burst_spawns_exact_count_and_nothing_after() {
        let mut sink = RecordingSink::default();
        let mut engine = ParticleEngine::new(7);
        let cfg = EmitterConfig {
            burst: true,
            particle_count: 15,
            ..Default::default()
        };
        let id = engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();

        assert_eq!(engine.particles().len(), 15);
        assert_eq!(engine.particles_of(id).count(), 15);

        for _ in 0..10 {
            engine.tick(DT, &mut sink);
        }
        // No incremental spawns from a burst emitter
        assert_eq!(sink.created.len(), 15);
    }

    #[test]
    fn test_continuous_rate_and_duration() {
        let mut sink = RecordingSink::default();
        let mut engine = ParticleEngine::new(7);
        // 50/s over 200 ms => interval 20 ms => floor(200/20) = 10 (±1)
        let cfg = EmitterConfig {
            emission_rate: 50.0,
            duration_ms: 200.0,
            particle_life_ms: 10_000.0,
            ..Default::default()
        };
        let id = engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();

        for _ in 0..100 {
            engine.tick(10.0, &mut sink);
        }
        let spawned = sink.created.len();
        assert!(
            (9..=11).contains(&spawned),
            "expected ~10 spawns, got {spawned}"
        );
        // Emission window closed, particles still decaying normally
        assert!(!engine.emitter(id).unwrap().active);
        assert_eq!(engine.particles().len(), spawned);
    }

    #[test]
    fn test_emission_rate_survives_non_divisible_dt() {
        let mut sink = RecordingSink::default();
        let mut engine = ParticleEngine::new(7);
        // 60/s over 1000 ms with 16 ms ticks: the interval (16.67 ms) does
        // not divide dt, so per-spawn clock snapping would halve the rate
        let cfg = EmitterConfig {
            emission_rate: 60.0,
            duration_ms: 1000.0,
            particle_life_ms: 60_000.0,
            ..Default::default()
        };
        engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();

        for _ in 0..100 {
            engine.tick(16.0, &mut sink);
        }
        let spawned = sink.created.len();
        assert!(
            (59..=61).contains(&spawned),
            "expected 60 +- 1 spawns, got {spawned}"
        );
    }

    #[test]
    fn test_infinite_emitter_keeps_spawning() {
        let mut sink = RecordingSink::default();
        let mut engine = ParticleEngine::new(7);
        let cfg = EmitterConfig {
            emission_rate: 100.0,
            duration_ms: -1.0,
            particle_life_ms: 50_000.0,
            ..Default::default()
        };
        engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();
        for _ in 0..50 {
            engine.tick(DT, &mut sink);
        }
        assert!(sink.created.len() > 40);
    }

    #[test]
    fn test_opacity_and_size_derive_from_life_ratio() {
        let mut sink = NullSink::default();
        let mut engine = ParticleEngine::new(3);
        let cfg = EmitterConfig {
            burst: true,
            particle_count: 1,
            particle_life_ms: 1000.0,
            opacity_start: 0.8,
            opacity_end: 0.2,
            shrink: true,
            size_min: 4.0,
            size_max: 4.0,
            speed_min: 0.0,
            speed_max: 0.0,
            ..Default::default()
        };
        engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();

        // After 500 ms, ratio = 0.5
        for _ in 0..50 {
            engine.tick(10.0, &mut sink);
        }
        let p = &engine.particles()[0];
        assert!((p.life_ratio() - 0.5).abs() < 1e-3);
        assert!((p.opacity - (0.2 + 0.5 * 0.6)).abs() < 1e-3);
        assert!((p.size - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_particle_retired_after_life_and_handle_released_once() {
        let mut sink = RecordingSink::default();
        let mut engine = ParticleEngine::new(3);
        let cfg = EmitterConfig {
            burst: true,
            particle_count: 5,
            particle_life_ms: 1000.0,
            ..Default::default()
        };
        let id = engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();

        // 1000 ms of 16 ms ticks kills all five
        for _ in 0..63 {
            engine.tick(16.0, &mut sink);
        }
        assert_eq!(engine.particles_of(id).count(), 0);
        assert_eq!(engine.particles().len(), 0);
        assert_eq!(sink.released.len(), 5);
        // Drained burst emitter is gone too
        assert!(engine.emitter(id).is_none());
    }

    #[test]
    fn test_remove_emitter_cascades_to_its_particles_only() {
        let mut sink = RecordingSink::default();
        let mut engine = ParticleEngine::new(9);
        let burst = |n| EmitterConfig {
            burst: true,
            particle_count: n,
            ..Default::default()
        };
        let a = engine.create_emitter(Vec2::ZERO, burst(6), &mut sink).unwrap();
        let b = engine.create_emitter(Vec2::ZERO, burst(4), &mut sink).unwrap();
        assert_eq!(engine.particles().len(), 10);

        assert!(engine.remove_emitter(a, &mut sink));
        assert_eq!(engine.particles().len(), 4);
        assert_eq!(engine.particles_of(b).count(), 4);
        assert_eq!(sink.released.len(), 6);

        // Unknown id is a reported no-op
        assert!(!engine.remove_emitter(a, &mut sink));
        assert_eq!(engine.particles().len(), 4);
    }

    #[test]
    fn test_unknown_emitter_origin_update_is_noop() {
        let mut engine = ParticleEngine::new(1);
        assert!(!engine.set_emitter_origin(42, Vec2::ONE));
    }

    #[test]
    fn test_lost_visual_handle_skips_entity_without_aborting() {
        let mut sink = RecordingSink::default();
        let mut engine = ParticleEngine::new(5);
        let cfg = EmitterConfig {
            burst: true,
            particle_count: 2,
            particle_life_ms: 10_000.0,
            ..Default::default()
        };
        engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();

        // Simulate the renderer dropping the first handle
        let dead = engine.particles()[0].visual;
        sink.dead_handles.push(dead);

        engine.tick(DT, &mut sink);
        let updates_after_first = sink.updates;
        engine.tick(DT, &mut sink);
        // Only the surviving particle is pushed on the second tick
        assert_eq!(sink.updates, updates_after_first + 1);
        // Both particles still integrate
        assert_eq!(engine.particles().len(), 2);
        // The lost handle must not be double-released at retirement
        assert!(engine.particles()[0].visual_lost);
    }

    #[test]
    fn test_registry_cap_retires_oldest() {
        let mut sink = RecordingSink::default();
        let mut engine = ParticleEngine::new(11);
        let cfg = EmitterConfig {
            burst: true,
            particle_count: MAX_PARTICLES + 10,
            particle_life_ms: 10_000.0,
            ..Default::default()
        };
        engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();
        assert_eq!(engine.particles().len(), MAX_PARTICLES);
        assert_eq!(sink.released.len(), 10);
    }

    #[test]
    fn test_spawn_cap_degrades_gracefully() {
        let mut sink = RecordingSink::default();
        let mut engine = ParticleEngine::new(13);
        // More due emitters than the per-tick budget
        for _ in 0..(MAX_SPAWNS_PER_TICK + 20) {
            let cfg = EmitterConfig {
                emission_rate: 1000.0,
                particle_life_ms: 10_000.0,
                ..Default::default()
            };
            engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();
        }
        engine.tick(DT, &mut sink);
        assert_eq!(sink.created.len(), MAX_SPAWNS_PER_TICK);
    }

    #[test]
    fn test_color_sampled_from_set() {
        let mut sink = NullSink::default();
        let mut engine = ParticleEngine::new(17);
        let colors = vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let cfg = EmitterConfig {
            burst: true,
            particle_count: 60,
            colors: colors.clone(),
            ..Default::default()
        };
        engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();
        for p in engine.particles() {
            assert!(colors.contains(&p.color));
        }
        // With 60 draws all three colors should appear
        for c in &colors {
            assert!(engine.particles().iter().any(|p| p.color == *c));
        }
    }

    #[test]
    fn test_birth_position_jittered_around_origin() {
        let mut sink = NullSink::default();
        let mut engine = ParticleEngine::new(19);
        let origin = Vec2::new(100.0, -50.0);
        let cfg = EmitterConfig {
            burst: true,
            particle_count: 30,
            ..Default::default()
        };
        engine.create_emitter(origin, cfg, &mut sink).unwrap();
        for p in engine.particles() {
            assert!((p.pos.x - origin.x).abs() <= SPAWN_JITTER + 1e-4);
            assert!((p.pos.y - origin.y).abs() <= SPAWN_JITTER + 1e-4);
        }
    }

    #[test]
    fn test_gravity_and_wind_accelerate_velocity() {
        let mut sink = NullSink::default();
        let mut engine = ParticleEngine::new(23);
        let cfg = EmitterConfig {
            burst: true,
            particle_count: 1,
            speed_min: 0.0,
            speed_max: 0.0,
            gravity: Vec2::new(0.0, 100.0),
            wind: Vec2::new(50.0, 0.0),
            particle_life_ms: 10_000.0,
            ..Default::default()
        };
        engine.create_emitter(Vec2::ZERO, cfg, &mut sink).unwrap();
        // 1 second of ticks: vel ≈ gravity + wind
        for _ in 0..100 {
            engine.tick(10.0, &mut sink);
        }
        let p = &engine.particles()[0];
        assert!((p.vel.y - 100.0).abs() < 2.0);
        assert!((p.vel.x - 50.0).abs() < 2.0);
    }

    #[test]
    fn test_presets_validate() {
        assert!(EmitterConfig::explosion().validate().is_ok());
        assert!(EmitterConfig::thruster(1.0).validate().is_ok());
        assert!(EmitterConfig::debris().validate().is_ok());
        assert!(EmitterConfig::sparks(0.0).validate().is_ok());
    }
}
