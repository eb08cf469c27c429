//! Hullrun - headless runner
//!
//! Plays a scripted route through the test arena and logs where the player
//! ends up. `RUST_LOG=debug` shows door and spawn events as well, and
//! `--low-gravity` runs the route with reduced gravity.

use anyhow::{Context, Result};
use hullrun_game::{Level, MovementConfig, PlayerInput, Simulation, SimulationConfig};
use log::info;

/// One leg of the scripted route.
struct Leg {
    name: &'static str,
    seconds: f32,
    input: PlayerInput,
}

fn route() -> Vec<Leg> {
    let mut run = PlayerInput::default();
    run.movement.forward = true;

    let mut hop = run.clone();
    hop.actions.jump = true;

    // A single frame of mouse movement turns the player around.
    let mut turn = PlayerInput::default();
    turn.look = (0.0, 180.0);

    vec![
        Leg { name: "climb stairs", seconds: 1.5, input: run.clone() },
        Leg { name: "bunny hop", seconds: 1.0, input: hop },
        Leg { name: "turn", seconds: 0.0, input: turn },
        Leg { name: "run to door", seconds: 3.5, input: run },
        Leg { name: "idle", seconds: 1.0, input: PlayerInput::default() },
    ]
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = SimulationConfig::default();
    if std::env::args().skip(1).any(|arg| arg == "--low-gravity") {
        config.movement = MovementConfig::low_gravity();
    }
    let tick_rate = config.tick_rate;
    let mut sim = Simulation::new(config, Level::test_arena()).context("failed to create simulation")?;
    let player = sim.spawn_player("runner").context("failed to spawn player")?;
    info!("player {player} spawned, ticking at {tick_rate} Hz");

    for leg in route() {
        // Zero-length legs still get one tick so look input lands.
        let ticks = ((leg.seconds * tick_rate as f32).round() as u32).max(1);
        for _ in 0..ticks {
            sim.tick(&leg.input);
        }

        let player = sim.player().context("player vanished")?;
        info!(
            "{:<12} t={:6.2}s pos=({:7.1}, {:7.1}, {:6.1}) speed={:5.1} ground={}",
            leg.name,
            sim.time,
            player.position().x,
            player.position().y,
            player.position().z,
            player.speed(),
            player.on_ground()
        );
    }

    for entity in sim.entities() {
        info!("{} {} at {:?}", entity.classname, entity.id, entity.position());
    }

    Ok(())
}
