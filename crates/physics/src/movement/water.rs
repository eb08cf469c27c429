//! Liquid sampling, swimming and climbing out of water.

use glam::Vec3;
use log::trace;

use crate::collision::{CollisionOracle, Contents, Hull};

use super::accel::accelerate;
use super::config::MovementConfig;
use super::state::{EntityFlags, KineticState, PlayerCommand, WaterLevel};

/// Forward reach of the water jump ledge probes.
const LEDGE_PROBE_DISTANCE: f32 = 24.0;

/// Height above the origin of the lower ledge probe.
const LEDGE_PROBE_HEIGHT: f32 = 8.0;

/// Sample feet, waist and eyes and record how deep `state` is submerged.
///
/// Sampling stops at the first dry point; `water_type` is the contents of
/// the deepest wet sample.
pub fn sample_water(state: &mut KineticState, oracle: &dyn CollisionOracle, view_height: f32) {
    let origin = state.position;
    let samples = [
        (WaterLevel::Feet, origin.z + state.hull.mins.z + 1.0),
        (WaterLevel::Waist, origin.z),
        (WaterLevel::Eyes, origin.z + view_height),
    ];

    state.water_level = WaterLevel::None;
    state.water_type = Contents::EMPTY;

    for (level, z) in samples {
        let contents = oracle.point_contents(Vec3::new(origin.x, origin.y, z));
        if !contents.is_liquid() {
            break;
        }
        state.water_level = level;
        state.water_type = contents;
    }
}

/// Apply swimming drag and acceleration for one tick.
///
/// Looking up or down steers the swim; with no input the swimmer sinks.
pub fn water_move(state: &mut KineticState, command: &PlayerCommand, config: &MovementConfig, delta_time: f32) {
    let (forward, right, _) = state.view_vectors();

    let mut wish_vel = (forward * command.forward_move + right * command.right_move) * config.max_speed;
    if command.is_idle() {
        wish_vel.z -= config.water_sink_speed;
    } else {
        wish_vel.z += command.up_move * config.max_speed;
    }

    let wish_speed = wish_vel.length().min(config.water_max_speed());
    let wish_dir = wish_vel.normalize_or_zero();

    let speed = state.velocity.length();
    if speed > 0.0 {
        let new_speed = (speed - speed * config.friction * delta_time).max(0.0);
        state.velocity *= new_speed / speed;
    }

    if wish_speed > 0.0 {
        accelerate(&mut state.velocity, wish_dir, wish_speed, config.accelerate, delta_time);
    }
}

/// Check for a ledge to climb out onto.
///
/// Returns the horizontal escape direction when there is solid just ahead at
/// waist height and open space above it.
pub fn check_water_jump(state: &KineticState, oracle: &dyn CollisionOracle) -> Option<Vec3> {
    let (forward, _) = state.yaw_vectors();
    let flat_forward = Vec3::new(forward.x, forward.y, 0.0).normalize_or_zero();
    if flat_forward == Vec3::ZERO {
        return None;
    }

    let low = state.position + Vec3::new(0.0, 0.0, LEDGE_PROBE_HEIGHT);
    let wall = oracle.trace(low, low + flat_forward * LEDGE_PROBE_DISTANCE, &Hull::POINT);
    if !wall.hit_something() {
        return None;
    }

    let high = Vec3::new(low.x, low.y, low.z + state.hull.maxs.z - LEDGE_PROBE_HEIGHT);
    let over = oracle.trace(high, high + flat_forward * LEDGE_PROBE_DISTANCE, &Hull::POINT);
    if over.hit_something() {
        return None;
    }

    let normal = wall.plane_normal;
    let dir = -Vec3::new(normal.x, normal.y, 0.0).normalize_or_zero();
    trace!("water jump towards {dir:?}");
    (dir != Vec3::ZERO).then_some(dir)
}

/// Flag a water jump and give it its upward kick.
pub fn start_water_jump(state: &mut KineticState, config: &MovementConfig) {
    state.flags.set(EntityFlags::WATER_JUMP, true);
    state.velocity.z = config.water_jump_velocity;
}
