//! Velocity clipping and the multi-plane fly move.
//!
//! [`fly_move`] advances an entity along its velocity for one tick, sliding
//! along every plane it touches. It is the collision response underneath all
//! other movement code.

use glam::Vec3;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionOracle, EntityId, TraceResult};

use super::config::MovementConfig;
use super::state::KineticState;

/// Velocity components smaller than this snap to zero after clipping.
pub const STOP_EPSILON: f32 = 0.1;

/// Maximum number of planes tracked by a single fly move.
const MAX_CLIP_PLANES: usize = 5;

/// Number of sweep attempts per fly move.
const MAX_BUMPS: usize = 4;

/// What stopped a fly move, as a bitset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocked(pub u8);

impl Blocked {
    pub const NONE: Self = Self(0);
    /// Hit a walkable floor.
    pub const FLOOR: Self = Self(1);
    /// Hit a wall or step face.
    pub const WALL: Self = Self(2);
    /// Could not move at all.
    pub const STUCK: Self = Self(3);

    #[inline]
    pub fn floor(self) -> bool {
        self.0 & Self::FLOOR.0 != 0
    }

    #[inline]
    pub fn wall(self) -> bool {
        self.0 & Self::WALL.0 != 0
    }

    #[inline]
    pub fn is_stuck(self) -> bool {
        self == Self::STUCK
    }

    #[inline]
    pub fn is_clear(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Blocked {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Blocked {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Result of a [`fly_move`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideOutcome {
    pub blocked: Blocked,
    /// Normal of the last wall or step face hit.
    pub step_normal: Option<Vec3>,
    /// Non-world entities hit during the move, each listed once.
    pub touched: Vec<EntityId>,
}

impl SlideOutcome {
    fn stuck(mut self) -> Self {
        self.blocked = Blocked::STUCK;
        self
    }

    /// Record a contact with `entity`, ignoring the world and repeats.
    pub fn record_touch(&mut self, entity: Option<EntityId>) {
        if let Some(entity) = entity.filter(|e| !e.is_world()) {
            if !self.touched.contains(&entity) {
                self.touched.push(entity);
            }
        }
    }

    /// Fold the contacts of a later move into this one.
    pub(crate) fn absorb_touches(&mut self, other: &SlideOutcome) {
        for &entity in &other.touched {
            self.record_touch(Some(entity));
        }
    }
}

/// Clip velocity against a surface normal.
///
/// An overbounce of 1.0 slides along the surface, 1.5 bounces off it.
pub fn clip_velocity(velocity: Vec3, normal: Vec3, overbounce: f32) -> Vec3 {
    let backoff = velocity.dot(normal) * overbounce;
    let mut out = velocity - normal * backoff;

    for axis in 0..3 {
        if out[axis].abs() < STOP_EPSILON {
            out[axis] = 0.0;
        }
    }

    out
}

/// Move `state` along its velocity for `delta_time`, sliding along contact planes.
///
/// Floor contacts update the ground fields on `state`. The velocity is
/// zeroed when the entity is embedded, wedged in a corner or would be sent
/// back against its original direction of travel.
pub fn fly_move(
    state: &mut KineticState,
    oracle: &dyn CollisionOracle,
    config: &MovementConfig,
    delta_time: f32,
) -> SlideOutcome {
    let primal_velocity = state.velocity;
    let mut original_velocity = state.velocity;
    let mut planes = [Vec3::ZERO; MAX_CLIP_PLANES];
    let mut num_planes = 0;
    let mut time_left = delta_time;
    let mut outcome = SlideOutcome::default();

    for _ in 0..MAX_BUMPS {
        if state.velocity == Vec3::ZERO {
            break;
        }

        let end = state.position + state.velocity * time_left;
        let trace = oracle.trace(state.position, end, &state.hull);

        if trace.all_solid {
            debug!("fly_move: embedded at {:?}", state.position);
            state.velocity = Vec3::ZERO;
            return outcome.stuck();
        }

        if trace.fraction > 0.0 {
            state.position = trace.end_position;
            original_velocity = state.velocity;
        }

        if trace.fraction >= 1.0 {
            break;
        }

        outcome.record_touch(trace.entity);

        let normal = trace.plane_normal;
        if normal.z > config.min_walk_normal {
            outcome.blocked |= Blocked::FLOOR;
            state.set_ground(trace.entity, normal);
        } else if normal.z >= 0.0 {
            outcome.blocked |= Blocked::WALL;
            outcome.step_normal = Some(normal);
        }

        time_left -= time_left * trace.fraction;

        if num_planes >= MAX_CLIP_PLANES {
            debug!("fly_move: too many clip planes");
            state.velocity = Vec3::ZERO;
            return outcome.stuck();
        }
        planes[num_planes] = normal;
        num_planes += 1;

        let planes = &planes[..num_planes];
        let clipped = planes.iter().enumerate().find_map(|(i, &plane)| {
            let candidate = clip_velocity(original_velocity, plane, 1.0);
            let fits = planes
                .iter()
                .enumerate()
                .all(|(j, &other)| j == i || candidate.dot(other) >= 0.0);
            fits.then_some(candidate)
        });

        match clipped {
            Some(velocity) => state.velocity = velocity,
            None if num_planes == 2 => {
                let dir = planes[0].cross(planes[1]).normalize_or_zero();
                state.velocity = dir * dir.dot(state.velocity);
                trace!("fly_move: sliding along crease {dir:?}");
            }
            None => {
                debug!("fly_move: wedged between {num_planes} planes");
                state.velocity = Vec3::ZERO;
                return outcome;
            }
        }

        if state.velocity.dot(primal_velocity) <= 0.0 {
            state.velocity = Vec3::ZERO;
            return outcome;
        }
    }

    outcome
}

/// Sweep `state` by `push` and move it to wherever the sweep stopped.
///
/// Velocity is left alone; the caller decides how to respond to the contact.
pub fn push_entity(state: &mut KineticState, oracle: &dyn CollisionOracle, push: Vec3) -> TraceResult {
    let trace = oracle.trace(state.position, state.position + push, &state.hull);
    state.position = trace.end_position;
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{BrushWorld, Contents, DynamicOverlay, EntityId, Hull, MoverBrush};

    fn floor_world() -> BrushWorld {
        let mut world = BrushWorld::new();
        world.add_bounds(
            Vec3::new(-1024.0, -1024.0, -16.0),
            Vec3::new(1024.0, 1024.0, 0.0),
            Contents::SOLID,
        );
        world
    }

    fn player_at(position: Vec3) -> KineticState {
        KineticState::new(position).with_hull(Hull::PLAYER)
    }

    #[test]
    fn test_clip_velocity_slides() {
        let clipped = clip_velocity(Vec3::new(100.0, 0.0, -100.0), Vec3::Z, 1.0);
        assert_eq!(clipped, Vec3::new(100.0, 0.0, 0.0));
    }

    #[test]
    fn test_clip_velocity_bounces() {
        let clipped = clip_velocity(Vec3::new(0.0, 0.0, -100.0), Vec3::Z, 1.5);
        assert!((clipped.z - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_clip_velocity_snaps_small_components() {
        let normal = Vec3::new(1.0, 0.0, 0.0);
        let clipped = clip_velocity(Vec3::new(-10.0, 0.05, 20.0), normal, 1.0);
        assert_eq!(clipped, Vec3::new(0.0, 0.0, 20.0));
    }

    #[test]
    fn test_blocked_bits() {
        let mut blocked = Blocked::NONE;
        assert!(blocked.is_clear());
        blocked |= Blocked::FLOOR;
        assert!(blocked.floor());
        assert!(!blocked.wall());
        blocked |= Blocked::WALL;
        assert!(blocked.is_stuck());
    }

    #[test]
    fn test_fly_move_free_space() {
        let world = BrushWorld::new();
        let config = MovementConfig::default();
        let mut state = player_at(Vec3::ZERO);
        state.velocity = Vec3::new(100.0, 0.0, 0.0);

        let outcome = fly_move(&mut state, &world, &config, 0.1);
        assert!(outcome.blocked.is_clear());
        assert!((state.position.x - 10.0).abs() < 1e-4);
        assert_eq!(state.velocity, Vec3::new(100.0, 0.0, 0.0));
    }

    #[test]
    fn test_fly_move_lands_on_floor() {
        let world = floor_world();
        let config = MovementConfig::default();
        let mut state = player_at(Vec3::new(0.0, 0.0, 25.0));
        state.velocity = Vec3::new(0.0, 0.0, -100.0);

        let outcome = fly_move(&mut state, &world, &config, 0.1);

        assert!(outcome.blocked.floor());
        assert_eq!(state.velocity.z, 0.0);
        assert!(state.on_ground);
        assert_eq!(state.ground_entity, Some(EntityId::WORLD));
        assert!(state.position.z >= 24.0);
    }

    #[test]
    fn test_fly_move_slides_along_floor() {
        let world = floor_world();
        let config = MovementConfig::default();
        let mut state = player_at(Vec3::new(0.0, 0.0, 25.0));
        state.velocity = Vec3::new(100.0, 0.0, -100.0);

        fly_move(&mut state, &world, &config, 0.1);

        assert_eq!(state.velocity, Vec3::new(100.0, 0.0, 0.0));
        assert!(state.position.x > 5.0);
    }

    #[test]
    fn test_fly_move_records_wall() {
        let mut world = BrushWorld::new();
        world.add_bounds(Vec3::new(32.0, -512.0, -512.0), Vec3::new(64.0, 512.0, 512.0), Contents::SOLID);
        let config = MovementConfig::default();
        let mut state = player_at(Vec3::ZERO);
        state.velocity = Vec3::new(100.0, 50.0, 0.0);

        let outcome = fly_move(&mut state, &world, &config, 0.5);

        assert!(outcome.blocked.wall());
        assert_eq!(outcome.step_normal, Some(Vec3::new(-1.0, 0.0, 0.0)));
        assert_eq!(state.velocity.x, 0.0);
        assert_eq!(state.velocity.y, 50.0);
        assert!(state.position.x < 16.0);
        assert!(outcome.touched.is_empty());
    }

    #[test]
    fn test_fly_move_lists_mover_contacts_once() {
        let world = BrushWorld::new();
        let movers = [MoverBrush::new(
            EntityId(5),
            Vec3::new(32.0, -512.0, -512.0),
            Vec3::new(64.0, 512.0, 512.0),
        )];
        let overlay = DynamicOverlay::new(&world, &movers);
        let config = MovementConfig::default();
        let mut state = player_at(Vec3::ZERO);
        state.velocity = Vec3::new(100.0, 50.0, 0.0);

        let outcome = fly_move(&mut state, &overlay, &config, 0.5);

        assert!(outcome.blocked.wall());
        assert_eq!(outcome.touched, vec![EntityId(5)]);

        // Pressing into the same face again does not repeat the contact.
        let mut outcome = outcome;
        outcome.record_touch(Some(EntityId(5)));
        outcome.record_touch(Some(EntityId::WORLD));
        assert_eq!(outcome.touched, vec![EntityId(5)]);
    }

    #[test]
    fn test_fly_move_two_walls_follows_crease() {
        // Two walls meeting along a vertical edge; a sloped velocity slides down the crease.
        let mut world = BrushWorld::new();
        world.add_bounds(Vec3::new(32.0, -512.0, -512.0), Vec3::new(64.0, 512.0, 512.0), Contents::SOLID);
        world.add_bounds(Vec3::new(-512.0, 32.0, -512.0), Vec3::new(512.0, 64.0, 512.0), Contents::SOLID);
        let config = MovementConfig::default();
        let mut state = player_at(Vec3::ZERO);
        state.velocity = Vec3::new(100.0, 100.0, 40.0);

        fly_move(&mut state, &world, &config, 1.0);

        assert_eq!(state.velocity.x, 0.0);
        assert_eq!(state.velocity.y, 0.0);
        assert!(state.velocity.z > 0.0);
        assert!(state.position.x < 16.0 && state.position.y < 16.0);
    }

    #[test]
    fn test_fly_move_embedded_is_stuck() {
        let world = floor_world();
        let config = MovementConfig::default();
        let mut state = player_at(Vec3::new(0.0, 0.0, -8.0));
        state.velocity = Vec3::new(10.0, 0.0, 0.0);

        let outcome = fly_move(&mut state, &world, &config, 0.1);

        assert!(outcome.blocked.is_stuck());
        assert_eq!(state.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_push_entity_stops_at_contact() {
        let world = floor_world();
        let mut state = player_at(Vec3::new(0.0, 0.0, 40.0));

        let trace = push_entity(&mut state, &world, Vec3::new(0.0, 0.0, -100.0));

        assert!(trace.hit_something());
        assert_eq!(trace.plane_normal, Vec3::Z);
        assert!(state.position.z > 24.0 && state.position.z < 24.1);
    }
}
