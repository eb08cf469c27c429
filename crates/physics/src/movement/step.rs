//! Stair stepping on top of [`fly_move`].
//!
//! When a walking entity runs into a wall, [`walk_move`] retries the move
//! lifted by the step height and then drops back down. The lifted result is
//! kept only if it lands on walkable ground.

use glam::Vec3;
use log::{debug, trace};

use crate::collision::{CollisionOracle, EntityId, DIST_EPSILON};

use super::clip::{fly_move, push_entity, Blocked, SlideOutcome};
use super::config::MovementConfig;
use super::state::{KineticState, WaterLevel};

/// Nudges tried, in order, to free an entity caught on an edge.
const UNSTICK_NUDGES: [(f32, f32); 8] = [
    (2.0, 0.0),
    (0.0, 2.0),
    (-2.0, 0.0),
    (0.0, -2.0),
    (2.0, 2.0),
    (-2.0, 2.0),
    (2.0, -2.0),
    (-2.0, -2.0),
];

/// Time slice used by each unstick attempt.
const UNSTICK_TIME: f32 = 0.1;

/// Net displacement an unstick attempt must exceed on either axis.
const UNSTICK_DISTANCE: f32 = 4.0;

/// Move a walking entity for one tick, climbing steps up to the configured height.
pub fn walk_move(
    state: &mut KineticState,
    oracle: &dyn CollisionOracle,
    config: &MovementConfig,
    delta_time: f32,
) -> SlideOutcome {
    let was_on_ground = state.on_ground;
    let start_position = state.position;
    let start_velocity = state.velocity;

    let mut outcome = fly_move(state, oracle, config, delta_time);

    if let Some(normal) = outcome.step_normal {
        wall_friction(state, normal);
    }

    if !outcome.blocked.wall() {
        return outcome;
    }

    if !was_on_ground && state.water_level == WaterLevel::None {
        return outcome;
    }

    if state.flags.water_jumping() {
        return outcome;
    }

    let no_step = MoveSnapshot::capture(state);

    if let Some(stepped) = step_up(state, oracle, config, delta_time, start_position, start_velocity) {
        outcome.blocked = stepped.blocked;
        outcome.absorb_touches(&stepped);
        return outcome;
    }

    no_step.restore(state);
    outcome
}

/// Position, velocity and ground contact saved before a speculative move.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MoveSnapshot {
    position: Vec3,
    velocity: Vec3,
    on_ground: bool,
    ground_entity: Option<EntityId>,
    ground_normal: Vec3,
}

impl MoveSnapshot {
    pub(crate) fn capture(state: &KineticState) -> Self {
        Self {
            position: state.position,
            velocity: state.velocity,
            on_ground: state.on_ground,
            ground_entity: state.ground_entity,
            ground_normal: state.ground_normal,
        }
    }

    pub(crate) fn restore(self, state: &mut KineticState) {
        state.position = self.position;
        state.velocity = self.velocity;
        state.on_ground = self.on_ground;
        state.ground_entity = self.ground_entity;
        state.ground_normal = self.ground_normal;
    }
}

/// Replay a blocked move lifted by the step height, then drop back down.
///
/// Returns the lifted move's outcome when it landed on walkable ground.
/// Otherwise returns `None` and leaves `state` wherever the attempt ended,
/// for the caller to restore.
pub(crate) fn step_up(
    state: &mut KineticState,
    oracle: &dyn CollisionOracle,
    config: &MovementConfig,
    delta_time: f32,
    start_position: Vec3,
    start_velocity: Vec3,
) -> Option<SlideOutcome> {
    state.position = start_position;
    push_entity(state, oracle, Vec3::new(0.0, 0.0, config.step_size));

    state.velocity = Vec3::new(start_velocity.x, start_velocity.y, 0.0);
    let mut stepped = fly_move(state, oracle, config, delta_time);

    if !stepped.blocked.is_clear() {
        let moved = state.position - start_position;
        if moved.x.abs() < DIST_EPSILON && moved.y.abs() < DIST_EPSILON {
            stepped = try_unstick(state, oracle, config, start_velocity);
        }
    }

    let drop = config.step_size - start_velocity.z * delta_time;
    let down = push_entity(state, oracle, Vec3::new(0.0, 0.0, -drop));

    if !down.hit_something() || down.plane_normal.z <= config.min_walk_normal {
        return None;
    }

    trace!("stepped from z={} to z={}", start_position.z, state.position.z);
    state.set_ground(down.entity, down.plane_normal);
    Some(stepped)
}

/// Slow the entity down when it runs into a wall head-on.
///
/// Scraping along a wall at a shallow angle costs nothing; facing straight
/// into it stops horizontal motion entirely.
fn wall_friction(state: &mut KineticState, normal: Vec3) {
    let (forward, _, _) = state.view_vectors();
    let d = normal.dot(forward) + 0.5;
    if d >= 0.0 {
        return;
    }

    let into = normal.dot(state.velocity);
    let side = state.velocity - normal * into;
    state.velocity.x = side.x * (1.0 + d);
    state.velocity.y = side.y * (1.0 + d);
}

/// Try small horizontal nudges until the entity can move freely again.
fn try_unstick(
    state: &mut KineticState,
    oracle: &dyn CollisionOracle,
    config: &MovementConfig,
    old_velocity: Vec3,
) -> SlideOutcome {
    let origin = state.position;

    for (x, y) in UNSTICK_NUDGES {
        push_entity(state, oracle, Vec3::new(x, y, 0.0));

        state.velocity = Vec3::new(old_velocity.x, old_velocity.y, 0.0);
        let outcome = fly_move(state, oracle, config, UNSTICK_TIME);

        let moved = state.position - origin;
        if moved.x.abs() > UNSTICK_DISTANCE || moved.y.abs() > UNSTICK_DISTANCE {
            debug!("walk_move: unstuck with nudge ({x}, {y})");
            return outcome;
        }

        state.position = origin;
    }

    debug!("walk_move: stuck at {origin:?}");
    state.velocity = Vec3::ZERO;
    SlideOutcome {
        blocked: Blocked::STUCK,
        ..Default::default()
    }
}
