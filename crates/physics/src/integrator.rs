//! Per-tick movement for entities that are not player controlled.
//!
//! [`MovementIntegrator::step`] dispatches on [`MoveType`]: walkers and
//! steppers share the player's stair climbing, thrown objects and fliers
//! are swept with [`push_entity`] and react to whatever they hit.

use glam::Vec3;
use log::trace;

use crate::collision::{CollisionOracle, TraceResult};
use crate::movement::{
    apply_friction, clip_velocity, fly_move, push_entity, step_up, walk_move, KineticState,
    MoveSnapshot, MoveType, MovementConfig,
};

/// Overbounce used by [`MoveType::Bounce`].
const BOUNCE_OVERBOUNCE: f32 = 1.5;

/// Vertical speed below which a bouncing object comes to rest on a floor.
const BOUNCE_REST_SPEED: f32 = 60.0;

/// Length of the ground probe used to settle steppers and walkers.
const SETTLE_PROBE_DISTANCE: f32 = 1.0;

/// Receives every contact made by a swept entity, with the entity that made it.
pub type TouchSink<'a> = dyn FnMut(&mut KineticState, &TraceResult) + 'a;

/// Moves non-player entities according to their [`MoveType`].
#[derive(Debug, Clone, Default)]
pub struct MovementIntegrator {
    pub config: MovementConfig,
}

impl MovementIntegrator {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Advance `state` by `dt` seconds.
    ///
    /// `touch` is called synchronously for each contact made by tossed,
    /// bouncing and flying entities.
    pub fn step(
        &self,
        state: &mut KineticState,
        oracle: &dyn CollisionOracle,
        dt: f32,
        touch: &mut TouchSink<'_>,
    ) {
        state.clamp_velocity(self.config.max_velocity);

        match state.move_type {
            MoveType::None => return,
            MoveType::Walk => self.walk(state, oracle, dt),
            MoveType::Step => self.step_monster(state, oracle, dt),
            MoveType::Toss | MoveType::Bounce | MoveType::Fly => self.toss(state, oracle, dt, touch),
        }

        state.clamp_velocity(self.config.max_velocity);
    }

    fn walk(&self, state: &mut KineticState, oracle: &dyn CollisionOracle, dt: f32) {
        if !state.on_ground {
            state.velocity.z -= self.config.gravity * dt;
        }

        walk_move(state, oracle, &self.config, dt);
        self.settle(state, oracle);
    }

    fn step_monster(&self, state: &mut KineticState, oracle: &dyn CollisionOracle, dt: f32) {
        let was_on_ground = state.on_ground;
        if was_on_ground {
            let speed = state.planar_speed();
            apply_friction(
                &mut state.velocity,
                speed,
                self.config.friction,
                self.config.stop_speed,
                dt,
            );
        } else {
            state.velocity.z -= self.config.gravity * dt;
        }

        let start_position = state.position;
        let start_velocity = state.velocity;
        let outcome = fly_move(state, oracle, &self.config, dt);

        // Wall bits only come from planes too steep to stand on.
        if was_on_ground && outcome.blocked.wall() {
            let blocked = MoveSnapshot::capture(state);
            if step_up(state, oracle, &self.config, dt, start_position, start_velocity).is_none() {
                blocked.restore(state);
            }
        }

        self.settle(state, oracle);
    }

    fn toss(
        &self,
        state: &mut KineticState,
        oracle: &dyn CollisionOracle,
        dt: f32,
        touch: &mut TouchSink<'_>,
    ) {
        let flying = state.move_type == MoveType::Fly;
        if state.on_ground && !flying {
            return;
        }

        if !flying {
            state.velocity.z -= self.config.gravity * dt;
        }
        state.angles += state.angular_velocity * dt;

        let push = state.velocity * dt;
        let trace = push_entity(state, oracle, push);
        if !trace.hit_something() {
            return;
        }

        touch(state, &trace);
        if state.move_type == MoveType::None {
            return;
        }

        let overbounce = if state.move_type == MoveType::Bounce {
            BOUNCE_OVERBOUNCE
        } else {
            1.0
        };
        state.velocity = clip_velocity(state.velocity, trace.plane_normal, overbounce);

        if flying || trace.plane_normal.z <= self.config.min_walk_normal {
            return;
        }

        match state.move_type {
            MoveType::Bounce if state.velocity.z >= BOUNCE_REST_SPEED => {}
            MoveType::Bounce => {
                trace!("bounce came to rest at {:?}", state.position);
                self.land(state, &trace);
                state.move_type = MoveType::None;
            }
            _ => self.land(state, &trace),
        }
    }

    fn land(&self, state: &mut KineticState, trace: &TraceResult) {
        state.set_ground(trace.entity, trace.plane_normal);
        state.velocity = Vec3::ZERO;
        state.angular_velocity = Vec3::ZERO;
    }

    /// Probe just below the hull and record whether it rests on walkable ground.
    fn settle(&self, state: &mut KineticState, oracle: &dyn CollisionOracle) {
        let end = state.position - Vec3::new(0.0, 0.0, SETTLE_PROBE_DISTANCE);
        let trace = oracle.trace(state.position, end, &state.hull);

        if trace.hit_something() && !trace.all_solid && trace.plane_normal.z >= self.config.min_walk_normal {
            state.set_ground(trace.entity, trace.plane_normal);
        } else {
            state.clear_ground();
        }
    }
}
