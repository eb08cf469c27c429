//! Player movement controller.
//!
//! This is the main entry point for player movement. Each tick it samples
//! water, finds the ground, picks ground, air or water movement from the
//! player's command and updates the derived view values.

use glam::Vec3;
use log::{debug, trace};

use crate::collision::{CollisionOracle, EntityId, Hull};

use super::accel::{accelerate, air_accelerate, apply_friction};
use super::clip::{fly_move, SlideOutcome};
use super::config::MovementConfig;
use super::state::{EntityFlags, KineticState, PlayerState, TickContext, WaterLevel};
use super::step::walk_move;
use super::view::{calc_bob, calc_roll};
use super::water::{check_water_jump, sample_water, start_water_jump, water_move};

/// Vertical speed above which the player never counts as grounded.
const GROUND_LAUNCH_SPEED: f32 = 180.0;

/// Length of the downward ground probe.
const GROUND_PROBE_DISTANCE: f32 = 1.0;

/// How far ahead of the player the edge friction probe starts.
const EDGE_PROBE_AHEAD: f32 = 16.0;

/// How far below the feet the edge friction probe looks for ground.
const EDGE_PROBE_DEPTH: f32 = 34.0;

/// Planar speed below which friction stops the player outright.
const FRICTION_STOP_SPEED: f32 = 1.0;

/// Ground normals steeper than this still zero vertical speed on contact.
const FLAT_GROUND_NORMAL: f32 = 0.99;

/// How far [`PlayerController::spawn_at`] looks for a floor.
const SPAWN_DROP_DISTANCE: f32 = 256.0;

/// Player movement controller.
///
/// # Example
///
/// ```ignore
/// let controller = PlayerController::new(MovementConfig::default());
/// let mut player = PlayerState::new(spawn_position);
///
/// // Each tick:
/// player.command = command;
/// controller.update(&mut player, &world, &TickContext::new(time, 1.0 / 72.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlayerController {
    /// Movement configuration.
    pub config: MovementConfig,
}

impl PlayerController {
    /// Create a new player controller with the given configuration.
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Create a controller with default configuration.
    pub fn with_default_config() -> Self {
        Self::new(MovementConfig::default())
    }

    /// Place a player at `spawn_pos`, dropped onto the floor below if there is one.
    pub fn spawn_at(&self, player: &mut PlayerState, spawn_pos: Vec3, oracle: &dyn CollisionOracle) {
        let kinetic = &mut player.kinetic;
        kinetic.position = spawn_pos;
        kinetic.velocity = Vec3::ZERO;
        kinetic.clear_ground();

        let end = spawn_pos - Vec3::new(0.0, 0.0, SPAWN_DROP_DISTANCE);
        let trace = oracle.trace(spawn_pos, end, &kinetic.hull);

        if trace.all_solid {
            debug!("spawn_at: {spawn_pos:?} is inside solid");
            return;
        }

        if trace.hit_something() && trace.plane_normal.z >= self.config.min_walk_normal {
            kinetic.position = trace.end_position;
            kinetic.set_ground(trace.entity, trace.plane_normal);
        }
    }

    /// Advance a player by one tick using `player.command`.
    pub fn update(&self, player: &mut PlayerState, oracle: &dyn CollisionOracle, ctx: &TickContext) {
        player.touched.clear();
        if ctx.intermission {
            return;
        }

        let dt = ctx.delta_time;

        sample_water(&mut player.kinetic, oracle, self.config.view_height);

        if player.kinetic.water_level >= WaterLevel::Waist {
            player.kinetic.clear_ground();
        } else {
            self.check_ground(&mut player.kinetic, oracle);
        }

        if player.kinetic.flags.water_jumping() {
            let expired = ctx.time > player.water_jump_until
                || player.kinetic.water_level == WaterLevel::None;
            if expired {
                trace!("water jump finished");
                player.kinetic.flags.set(EntityFlags::WATER_JUMP, false);
                player.water_jump_until = 0.0;
            } else {
                self.water_jump_move(player, oracle, dt);
                self.finish_tick(player, ctx);
                return;
            }
        }

        if player.kinetic.water_level >= WaterLevel::Waist {
            self.swim(player, oracle, ctx);
        } else if player.kinetic.on_ground {
            self.ground_move(player, oracle, dt);
        } else {
            self.air_move(player, oracle, dt);
        }

        self.finish_tick(player, ctx);
    }

    // ========================================================================
    // Ground Detection
    // ========================================================================

    fn check_ground(&self, kinetic: &mut KineticState, oracle: &dyn CollisionOracle) {
        if kinetic.velocity.z > GROUND_LAUNCH_SPEED {
            kinetic.clear_ground();
            return;
        }

        let end = kinetic.position - Vec3::new(0.0, 0.0, GROUND_PROBE_DISTANCE);
        let trace = oracle.trace(kinetic.position, end, &kinetic.hull);

        let walkable = trace.hit_something()
            && !trace.all_solid
            && trace.plane_normal.z >= self.config.min_walk_normal;
        if !walkable {
            kinetic.clear_ground();
            return;
        }

        kinetic.position = trace.end_position;
        kinetic.set_ground(trace.entity, trace.plane_normal);

        if trace.plane_normal.z > FLAT_GROUND_NORMAL && !kinetic.flags.jumping() {
            kinetic.velocity.z = 0.0;
        }
    }

    // ========================================================================
    // Ground Movement
    // ========================================================================

    fn ground_move(&self, player: &mut PlayerState, oracle: &dyn CollisionOracle, dt: f32) {
        self.friction(&mut player.kinetic, oracle, dt);

        let (wish_dir, wish_speed) = self.wish_velocity(player);
        accelerate(
            &mut player.kinetic.velocity,
            wish_dir,
            wish_speed,
            self.config.accelerate,
            dt,
        );

        let kinetic = &mut player.kinetic;
        if player.command.wants_jump() && !kinetic.flags.jumping() && player.jump_released {
            trace!("jump from z={}", kinetic.position.z);
            kinetic.velocity.z = self.config.jump_velocity;
            kinetic.clear_ground();
            kinetic.flags.set(EntityFlags::JUMPING, true);
        }

        let outcome = walk_move(kinetic, oracle, &self.config, dt);
        note_touches(&mut player.touched, &outcome);
    }

    fn friction(&self, kinetic: &mut KineticState, oracle: &dyn CollisionOracle, dt: f32) {
        let speed = kinetic.planar_speed();
        if speed < FRICTION_STOP_SPEED {
            kinetic.velocity.x = 0.0;
            kinetic.velocity.y = 0.0;
            return;
        }

        // Look for ground just ahead of the feet; running off a ledge doubles friction.
        let ahead = Vec3::new(kinetic.velocity.x, kinetic.velocity.y, 0.0) / speed * EDGE_PROBE_AHEAD;
        let start = Vec3::new(
            kinetic.position.x + ahead.x,
            kinetic.position.y + ahead.y,
            kinetic.position.z + kinetic.hull.mins.z,
        );
        let stop = start - Vec3::new(0.0, 0.0, EDGE_PROBE_DEPTH);
        let probe = oracle.trace(start, stop, &Hull::POINT);

        let friction = if probe.hit_something() {
            self.config.friction
        } else {
            self.config.friction * self.config.edge_friction
        };

        apply_friction(&mut kinetic.velocity, speed, friction, self.config.stop_speed, dt);
    }

    // ========================================================================
    // Air Movement
    // ========================================================================

    fn air_move(&self, player: &mut PlayerState, oracle: &dyn CollisionOracle, dt: f32) {
        let (wish_dir, wish_speed) = self.wish_velocity(player);
        let kinetic = &mut player.kinetic;

        kinetic.velocity.z -= self.config.gravity * dt;
        air_accelerate(
            &mut kinetic.velocity,
            wish_dir,
            wish_speed,
            self.config.air_speed_cap,
            self.config.accelerate,
            dt,
        );

        let outcome = fly_move(kinetic, oracle, &self.config, dt);
        note_touches(&mut player.touched, &outcome);

        if kinetic.velocity.z < 0.0 {
            kinetic.flags.set(EntityFlags::JUMPING, false);
        }
    }

    // ========================================================================
    // Water Movement
    // ========================================================================

    fn swim(&self, player: &mut PlayerState, oracle: &dyn CollisionOracle, ctx: &TickContext) {
        let dt = ctx.delta_time;
        water_move(&mut player.kinetic, &player.command, &self.config, dt);

        let wants_out = player.command.wants_jump() && player.command.forward_move > 0.0;
        if wants_out
            && player.kinetic.water_level == WaterLevel::Waist
            && !player.kinetic.flags.water_jumping()
        {
            if let Some(dir) = check_water_jump(&player.kinetic, oracle) {
                debug!("water jump out of {:?}", player.kinetic.position);
                start_water_jump(&mut player.kinetic, &self.config);
                player.water_jump_dir = dir;
                player.water_jump_until = ctx.time + f64::from(self.config.water_jump_time);
            }
        }

        let outcome = walk_move(&mut player.kinetic, oracle, &self.config, dt);
        note_touches(&mut player.touched, &outcome);
    }

    fn water_jump_move(&self, player: &mut PlayerState, oracle: &dyn CollisionOracle, dt: f32) {
        let kinetic = &mut player.kinetic;
        kinetic.velocity.x = player.water_jump_dir.x * self.config.max_speed;
        kinetic.velocity.y = player.water_jump_dir.y * self.config.max_speed;
        kinetic.velocity.z -= self.config.gravity * 0.5 * dt;

        let outcome = fly_move(kinetic, oracle, &self.config, dt);
        note_touches(&mut player.touched, &outcome);
    }

    // ========================================================================
    // Shared Movement Helpers
    // ========================================================================

    /// Horizontal wish direction and speed from the command and yaw.
    fn wish_velocity(&self, player: &PlayerState) -> (Vec3, f32) {
        let (forward, right) = player.kinetic.yaw_vectors();
        let command = &player.command;

        let wish = forward * command.forward_move + right * command.right_move;
        let wish = Vec3::new(wish.x, wish.y, 0.0);

        let input = (command.forward_move * command.forward_move
            + command.right_move * command.right_move)
            .sqrt();
        let wish_speed = input.min(1.0) * self.config.max_speed;

        (wish.normalize_or_zero(), wish_speed)
    }

    fn finish_tick(&self, player: &mut PlayerState, ctx: &TickContext) {
        let kinetic = &mut player.kinetic;
        let (_, right) = kinetic.yaw_vectors();

        player.view.roll = calc_roll(kinetic.velocity, right, &self.config);
        player.view.bob = calc_bob(ctx.time, kinetic.velocity, &self.config);
        player.view.height = self.config.view_height + player.view.bob;

        kinetic.clamp_velocity(self.config.max_velocity);
        player.jump_released = !player.command.wants_jump();
    }
}

fn note_touches(touched: &mut Vec<EntityId>, outcome: &SlideOutcome) {
    for &entity in &outcome.touched {
        if !touched.contains(&entity) {
            touched.push(entity);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{BrushWorld, Contents, DynamicOverlay, MoverBrush, DIST_EPSILON};
    use crate::movement::state::{CommandButtons, PlayerCommand};

    const DT: f32 = 1.0 / 60.0;

    /// Large floor with its top at z=0.
    fn create_test_world() -> BrushWorld {
        let mut world = BrushWorld::new();
        world.add_bounds(
            Vec3::new(-4096.0, -4096.0, -16.0),
            Vec3::new(4096.0, 4096.0, 0.0),
            Contents::SOLID,
        );
        world
    }

    fn standing_player(world: &BrushWorld, controller: &PlayerController) -> PlayerState {
        let mut player = PlayerState::new(Vec3::ZERO);
        controller.spawn_at(&mut player, Vec3::new(0.0, 0.0, 40.0), world);
        player
    }

    fn run(controller: &PlayerController, player: &mut PlayerState, world: &BrushWorld, ticks: usize, time: &mut f64) {
        for _ in 0..ticks {
            controller.update(player, world, &TickContext::new(*time, DT));
            *time += f64::from(DT);
        }
    }

    fn jump_command() -> PlayerCommand {
        let mut command = PlayerCommand::default();
        command.buttons.press(CommandButtons::JUMP);
        command
    }

    #[test]
    fn test_spawn_at_finds_ground() {
        let world = create_test_world();
        let controller = PlayerController::with_default_config();
        let player = standing_player(&world, &controller);

        assert!(player.kinetic.on_ground);
        assert!((player.kinetic.position.z - (24.0 + DIST_EPSILON)).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_at_no_ground() {
        let world = BrushWorld::new();
        let controller = PlayerController::with_default_config();
        let mut player = PlayerState::new(Vec3::ZERO);

        controller.spawn_at(&mut player, Vec3::new(0.0, 0.0, 100.0), &world);

        assert!(!player.kinetic.on_ground);
        assert_eq!(player.kinetic.position, Vec3::new(0.0, 0.0, 100.0));
    }

    #[test]
    fn test_gravity() {
        let world = BrushWorld::new();
        let controller = PlayerController::with_default_config();
        let mut player = PlayerState::new(Vec3::new(0.0, 0.0, 100.0));

        controller.update(&mut player, &world, &TickContext::new(0.0, 0.1));

        assert!((player.kinetic.velocity.z + 80.0).abs() < 1e-4);
        assert!(player.kinetic.position.z < 100.0);
    }

    #[test]
    fn test_ground_detection() {
        let world = create_test_world();
        let controller = PlayerController::with_default_config();
        let mut player = PlayerState::new(Vec3::new(0.0, 0.0, 24.5));

        controller.update(&mut player, &world, &TickContext::new(0.0, DT));

        assert!(player.kinetic.on_ground);
        assert_eq!(player.kinetic.velocity.z, 0.0);
        assert!((player.kinetic.position.z - (24.0 + DIST_EPSILON)).abs() < 1e-4);
    }

    #[test]
    fn test_forward_movement() {
        let world = create_test_world();
        let controller = PlayerController::with_default_config();
        let mut player = standing_player(&world, &controller);
        player.command.forward_move = 1.0;

        let mut time = 0.0;
        run(&controller, &mut player, &world, 120, &mut time);

        assert!(player.kinetic.position.x > 100.0);
        assert!(player.kinetic.on_ground);
        assert!((player.kinetic.velocity.x - 320.0).abs() < 1.0);
        assert!(player.kinetic.velocity.y.abs() < 1e-3);
    }

    #[test]
    fn test_friction_recurrence() {
        let world = create_test_world();
        let controller = PlayerController::with_default_config();
        let config = &controller.config;
        let mut player = standing_player(&world, &controller);
        player.kinetic.velocity = Vec3::new(320.0, 0.0, 0.0);

        let mut expected = 320.0_f32;
        let mut time = 0.0;
        for _ in 0..60 {
            run(&controller, &mut player, &world, 1, &mut time);

            if expected < FRICTION_STOP_SPEED {
                expected = 0.0;
            } else {
                let drop = expected.max(config.stop_speed) * config.friction * DT;
                expected = (expected - drop).max(0.0);
            }

            assert!(
                (player.kinetic.velocity.x - expected).abs() < 1e-3,
                "got {}, expected {}",
                player.kinetic.velocity.x,
                expected
            );
        }
        assert_eq!(player.kinetic.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_slow_friction_stops_dead() {
        let world = create_test_world();
        let controller = PlayerController::with_default_config();
        let mut player = standing_player(&world, &controller);
        player.kinetic.velocity = Vec3::new(0.5, -0.5, 0.0);

        controller.update(&mut player, &world, &TickContext::new(0.0, DT));

        assert_eq!(player.kinetic.velocity.x, 0.0);
        assert_eq!(player.kinetic.velocity.y, 0.0);
    }

    #[test]
    fn test_edge_friction_doubles_near_ledge() {
        // Floor ends at x=10, under the player's front half; moving towards the drop.
        let mut world = BrushWorld::new();
        world.add_bounds(Vec3::new(-512.0, -512.0, -16.0), Vec3::new(10.0, 512.0, 0.0), Contents::SOLID);
        let controller = PlayerController::with_default_config();
        let mut player = standing_player(&world, &controller);
        player.kinetic.velocity = Vec3::new(200.0, 0.0, 0.0);

        controller.update(&mut player, &world, &TickContext::new(0.0, DT));

        let expected = 200.0 - 200.0 * 4.0 * 2.0 * DT;
        assert!((player.kinetic.velocity.x - expected).abs() < 1e-3);
    }

    #[test]
    fn test_jump() {
        let world = create_test_world();
        let controller = PlayerController::with_default_config();
        let mut player = standing_player(&world, &controller);
        player.command = jump_command();
        player.command.forward_move = 1.0;

        controller.update(&mut player, &world, &TickContext::new(0.0, DT));

        // Ground acceleration lands before takeoff.
        assert!((player.kinetic.velocity.x - 10.0 * 320.0 * DT).abs() < 1e-3);
        assert_eq!(player.kinetic.velocity.z, 270.0);
        assert!(player.kinetic.position.x > 0.0);
        assert!(!player.kinetic.on_ground);
        assert!(player.kinetic.flags.jumping());
        assert!(!player.jump_released);
    }

    #[test]
    fn test_running_into_mover_is_reported() {
        let world = create_test_world();
        let movers = [MoverBrush::new(
            EntityId(7),
            Vec3::new(64.0, -256.0, 0.0),
            Vec3::new(96.0, 256.0, 112.0),
        )];
        let overlay = DynamicOverlay::new(&world, &movers);
        let controller = PlayerController::with_default_config();
        let mut player = standing_player(&world, &controller);
        player.command.forward_move = 1.0;

        let mut time = 0.0;
        for _ in 0..60 {
            controller.update(&mut player, &overlay, &TickContext::new(time, DT));
            time += f64::from(DT);
        }

        assert!(player.kinetic.position.x < 48.0);
        assert_eq!(player.touched, vec![EntityId(7)]);

        // Standing still against it is not a new contact.
        player.command = PlayerCommand::default();
        controller.update(&mut player, &overlay, &TickContext::new(time, DT));
        assert!(player.touched.is_empty());
    }

    #[test]
    fn test_held_jump_does_not_repeat() {
        let world = create_test_world();
        let controller = PlayerController::with_default_config();
        let mut player = standing_player(&world, &controller);
        player.command = jump_command();

        let mut time = 0.0;
        run(&controller, &mut player, &world, 120, &mut time);

        // Landed long ago and never bounced back up.
        assert!(player.kinetic.on_ground);
        assert_eq!(player.kinetic.velocity.z, 0.0);
        assert!(!player.kinetic.flags.jumping());

        // Releasing for one tick re-arms the jump.
        player.command = PlayerCommand::default();
        run(&controller, &mut player, &world, 1, &mut time);
        player.command = jump_command();
        run(&controller, &mut player, &world, 1, &mut time);
        assert_eq!(player.kinetic.velocity.z, 270.0);
    }

    #[test]
    fn test_air_control_is_limited() {
        let world = BrushWorld::new();
        let controller = PlayerController::with_default_config();
        let mut player = PlayerState::new(Vec3::new(0.0, 0.0, 1000.0));
        player.command.forward_move = 1.0;

        controller.update(&mut player, &world, &TickContext::new(0.0, 0.1));

        assert!((player.kinetic.velocity.x - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_intermission_freezes_player() {
        let world = BrushWorld::new();
        let controller = PlayerController::with_default_config();
        let mut player = PlayerState::new(Vec3::new(0.0, 0.0, 100.0));
        let ctx = TickContext {
            intermission: true,
            ..TickContext::new(0.0, DT)
        };

        controller.update(&mut player, &world, &ctx);

        assert_eq!(player.kinetic.position, Vec3::new(0.0, 0.0, 100.0));
        assert_eq!(player.kinetic.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_velocity_is_clamped() {
        let world = BrushWorld::new();
        let controller = PlayerController::with_default_config();
        let mut player = PlayerState::new(Vec3::ZERO);
        player.kinetic.velocity = Vec3::new(5000.0, -5000.0, -5000.0);

        controller.update(&mut player, &world, &TickContext::new(0.0, DT));

        let max = controller.config.max_velocity;
        assert!(player.kinetic.velocity.abs().max_element() <= max);
    }

    #[test]
    fn test_sinks_in_water_without_input() {
        let mut world = create_test_world();
        world.add_bounds(
            Vec3::new(-4096.0, -4096.0, 0.0),
            Vec3::new(4096.0, 4096.0, 2000.0),
            Contents::WATER,
        );
        let controller = PlayerController::with_default_config();
        let mut player = PlayerState::new(Vec3::new(0.0, 0.0, 1000.0));

        let mut time = 0.0;
        run(&controller, &mut player, &world, 60, &mut time);

        assert_eq!(player.kinetic.water_level, WaterLevel::Eyes);
        assert!((player.kinetic.velocity.z + 60.0).abs() < 0.5);
    }

    #[test]
    fn test_water_jump_out_of_pool() {
        // Pool floor at z=-64, water up to z=0, ledge from x=40 with its top at z=0.
        let mut world = BrushWorld::new();
        world.add_bounds(Vec3::new(-512.0, -512.0, -80.0), Vec3::new(512.0, 512.0, -64.0), Contents::SOLID);
        world.add_bounds(Vec3::new(-512.0, -512.0, -64.0), Vec3::new(40.0, 512.0, 0.0), Contents::WATER);
        world.add_bounds(Vec3::new(40.0, -512.0, -64.0), Vec3::new(512.0, 512.0, 0.0), Contents::SOLID);

        let controller = PlayerController::with_default_config();
        let mut player = PlayerState::new(Vec3::new(20.0, 0.0, -10.0));
        player.command.forward_move = 1.0;
        player.command.buttons.press(CommandButtons::JUMP);

        controller.update(&mut player, &world, &TickContext::new(5.0, DT));

        assert!(player.kinetic.flags.water_jumping());
        assert_eq!(player.water_jump_dir, Vec3::X);
        assert_eq!(player.water_jump_until, 7.0);
        assert!(player.kinetic.velocity.z > 200.0);

        let mut time = 5.0 + f64::from(DT);
        run(&controller, &mut player, &world, 90, &mut time);

        assert!(player.kinetic.position.z > 24.0);
        assert!(player.kinetic.position.x > 40.0);
    }

    #[test]
    fn test_view_roll_while_strafing() {
        let world = create_test_world();
        let controller = PlayerController::with_default_config();
        let mut player = standing_player(&world, &controller);
        player.command.right_move = 1.0;

        let mut time = 0.0;
        run(&controller, &mut player, &world, 60, &mut time);

        assert!((player.view.roll - controller.config.roll_angle).abs() < 1e-4);
        assert!(player.view.height >= controller.config.view_height - 7.0);
    }
}
