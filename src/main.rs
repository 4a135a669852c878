//! Headless demo driver
//!
//! Runs the simulation core for a fixed number of ticks with a scripted
//! pilot, logging events as they happen. Useful for smoke-testing the
//! scheduler without any renderer attached.
//!
//! Usage: `stardrift [seed] [--dump]`

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use stardrift::consts::SIM_DT_MS;
use stardrift::sim::{tick, GameEvent, GameState, NullSink, TickInput};

/// Demo run length (ticks at ~60 Hz)
const DEMO_TICKS: u64 = 1800;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1);
    let mut seed = 0xC0FFEE_u64;
    let mut dump = false;
    for arg in args {
        if arg == "--dump" {
            dump = true;
        } else if let Ok(s) = arg.parse() {
            seed = s;
        }
    }

    log::info!("stardrift demo starting (seed {seed})");

    let mut state = GameState::new(seed, 1280.0, 720.0);
    let mut sink = NullSink::default();

    // The game-state collaborator would supply these; the demo scatters
    // a field of asteroids around the origin instead.
    let mut rng = Pcg32::seed_from_u64(seed);
    for _ in 0..40 {
        let pos = Vec2::new(
            rng.random_range(-1500.0..=1500.0),
            rng.random_range(-1500.0..=1500.0),
        );
        let radius = rng.random_range(8.0..=40.0);
        state.spawn_obstacle(pos, radius);
    }

    let mut input = TickInput::default();
    for t in 0..DEMO_TICKS {
        // Scripted pilot: slow circle, boost now and then, fire every second
        let angle = t as f32 * 0.01;
        input.movement = Vec2::new(angle.cos(), angle.sin());
        input.boost = t % 240 < 60;
        if t % 60 == 0 {
            input.fire_pressed = true;
        }

        tick(&mut state, &mut input, SIM_DT_MS, &mut sink);

        for event in state.drain_events() {
            match event {
                GameEvent::ObstacleDestroyed { id } => log::info!("tick {t}: asteroid {id} down"),
                GameEvent::RewardGranted { amount } => {
                    log::info!("tick {t}: +{amount} credits ({} total)", state.credits)
                }
                GameEvent::ShipCollided { obstacle_id } => {
                    log::warn!("tick {t}: hull scrape on asteroid {obstacle_id}")
                }
                GameEvent::LaserFired => {}
            }
        }
    }

    log::info!(
        "demo done: {} ticks, {} credits, {} asteroids left, {} live particles",
        state.time_ticks,
        state.credits,
        state.obstacles.len(),
        state.particles.particles().len()
    );

    if dump {
        match serde_json::to_string_pretty(&state) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("snapshot failed: {e}"),
        }
    }
}
