//! Game simulation - the main game loop.
//!
//! Each tick runs due thinks, carries riders on any brush entity that moved,
//! moves the player, then moves every other entity. All of it is
//! deterministic: the same level and inputs always reproduce the same state.

use glam::Vec3;
use hullrun_physics::{
    CollisionOracle, ConfigError, DynamicOverlay, EntityId, Hull, KineticState, MoveType,
    MoverBrush, MovementConfig, MovementIntegrator, PlayerController, TickContext,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{Behavior, Entity, EntitySlot};
use crate::input::PlayerInput;
use crate::level::{Level, MoverSpawn};
use crate::movers::{Door, Lift};
use crate::player::Player;

/// Errors from simulation setup and entity lookups.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no entity with id {0}")]
    UnknownEntity(EntityId),

    #[error("a player is already in the game")]
    PlayerExists,

    #[error("tick rate must be positive")]
    InvalidTickRate,

    #[error("invalid movement config: {0}")]
    Config(#[from] ConfigError),
}

/// Game simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation tick rate (ticks per second).
    pub tick_rate: u32,

    /// Movement physics configuration.
    pub movement: MovementConfig,

    /// Degrees turned per unit of mouse movement.
    pub mouse_sensitivity: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 72,
            movement: MovementConfig::default(),
            mouse_sensitivity: 1.0,
        }
    }
}

impl SimulationConfig {
    /// Get the time step per tick in seconds.
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.tick_rate == 0 {
            return Err(SimError::InvalidTickRate);
        }
        self.movement.validate()?;
        Ok(())
    }
}

/// The main game simulation.
#[derive(Debug)]
pub struct Simulation {
    /// Current frame/tick number.
    pub frame: u64,

    /// Game clock in seconds.
    pub time: f64,

    /// Simulation configuration.
    pub config: SimulationConfig,

    /// Current level.
    pub level: Level,

    /// The level is over; the player is frozen.
    pub intermission: bool,

    player: Option<Player>,

    /// Indexed by entity id. Slot 0 is the world and always empty.
    entities: Vec<Option<EntitySlot>>,

    controller: PlayerController,

    integrator: MovementIntegrator,
}

impl Simulation {
    /// Create a new simulation with the given configuration and level.
    pub fn new(config: SimulationConfig, level: Level) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self::build(config, level))
    }

    /// Create a simulation with default configuration and test arena.
    pub fn test() -> Self {
        Self::build(SimulationConfig::default(), Level::test_arena())
    }

    fn build(config: SimulationConfig, level: Level) -> Self {
        let controller = PlayerController::new(config.movement.clone());
        let integrator = MovementIntegrator::new(config.movement.clone());

        let mut sim = Self {
            frame: 0,
            time: 0.0,
            config,
            level,
            intermission: false,
            player: None,
            entities: vec![None],
            controller,
            integrator,
        };
        sim.spawn_level_movers();

        info!(
            "simulation started on '{}' with {} entities",
            sim.level.name,
            sim.entities().count()
        );
        sim
    }

    fn spawn_level_movers(&mut self) {
        for spawn in self.level.movers.clone() {
            match spawn {
                MoverSpawn::Door {
                    mins,
                    maxs,
                    open_offset,
                    speed,
                    wait,
                } => {
                    let entity = Entity::new("door", brush_kinetic(mins, maxs)).as_brush();
                    self.spawn(entity, Some(Box::new(Door::new(mins, open_offset, speed, wait))));
                }
                MoverSpawn::Lift {
                    mins,
                    maxs,
                    travel,
                    speed,
                    wait,
                } => {
                    let entity = Entity::new("lift", brush_kinetic(mins, maxs))
                        .as_brush()
                        .thinking_at(f64::from(wait));
                    self.spawn(entity, Some(Box::new(Lift::new(mins, travel, speed, wait))));
                }
            }
        }
    }

    /// Add an entity to the simulation.
    ///
    /// Returns the entity's ID.
    pub fn spawn(&mut self, mut entity: Entity, behavior: Option<Box<dyn Behavior>>) -> EntityId {
        let id = self.next_id();
        entity.id = id;
        debug!("spawned {} {}", entity.classname, id);
        self.entities.push(Some(EntitySlot { entity, behavior }));
        id
    }

    fn next_id(&self) -> EntityId {
        EntityId(self.entities.len() as u32)
    }

    /// Remove an entity from the simulation.
    pub fn remove(&mut self, id: EntityId) -> Result<Entity, SimError> {
        self.entities
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .map(|slot| slot.entity)
            .ok_or(SimError::UnknownEntity(id))
    }

    /// Get an entity by ID.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .map(|slot| &slot.entity)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .map(|slot| &mut slot.entity)
    }

    /// All live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().flatten().map(|slot| &slot.entity)
    }

    /// Add the player at the first spawn point, dropped onto the floor.
    ///
    /// Returns the player's ID.
    pub fn spawn_player(&mut self, name: &str) -> Result<EntityId, SimError> {
        if self.player.is_some() {
            return Err(SimError::PlayerExists);
        }

        // The player owns an id but lives outside the entity table.
        let id = self.next_id();
        self.entities.push(None);

        let spawn = self.level.get_player_spawn(0);
        let position = spawn.map(|s| s.position).unwrap_or(Vec3::ZERO);
        let yaw = spawn.map(|s| s.yaw).unwrap_or(0.0);

        let mut player = Player::new(id, name.to_string(), position);
        player.state.kinetic.angles.y = yaw;

        let movers = collect_movers(&self.entities);
        let overlay = DynamicOverlay::new(&self.level.world, &movers);
        self.controller.spawn_at(&mut player.state, position, &overlay);

        info!("{} joined as {} at {:?}", name, id, player.position());
        self.player = Some(player);
        Ok(id)
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    /// Have `user` activate entity `target`.
    pub fn use_entity(&mut self, target: EntityId, user: EntityId) -> Result<(), SimError> {
        let ctx = self.context();
        let slot = self
            .entities
            .get_mut(target.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(SimError::UnknownEntity(target))?;
        slot.use_by(user, &ctx);
        Ok(())
    }

    fn context(&self) -> TickContext {
        TickContext {
            time: self.time,
            delta_time: self.config.delta_time(),
            intermission: self.intermission,
        }
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self, input: &PlayerInput) {
        let ctx = self.context();

        let before = mover_positions(&self.entities);
        for slot in self.entities.iter_mut().flatten() {
            slot.think(&ctx);
        }
        self.carry_riders(&before);

        self.move_player(input, &ctx);
        self.move_entities(&ctx);

        self.frame += 1;
        self.time += f64::from(ctx.delta_time);
    }

    /// Move whatever stands on a brush entity by the distance the brush moved.
    fn carry_riders(&mut self, before: &[(EntityId, Vec3)]) {
        for &(mover, old) in before {
            let Some(delta) = self.entity(mover).map(|e| e.position() - old) else {
                continue;
            };
            if delta == Vec3::ZERO {
                continue;
            }

            if let Some(player) = self.player.as_mut() {
                if player.state.kinetic.ground_entity == Some(mover) {
                    player.state.kinetic.position += delta;
                }
            }
            for slot in self.entities.iter_mut().flatten() {
                if slot.entity.kinetic.ground_entity == Some(mover) {
                    slot.entity.kinetic.position += delta;
                }
            }
        }
    }

    fn move_player(&mut self, input: &PlayerInput, ctx: &TickContext) {
        if ctx.intermission {
            return;
        }

        let movers = collect_movers(&self.entities);
        let Some(player) = self.player.as_mut() else {
            return;
        };

        input.apply_look(&mut player.state.kinetic.angles, self.config.mouse_sensitivity);
        player.state.command = input.to_command();

        let overlay = DynamicOverlay::new(&self.level.world, &movers).ignoring(player.id);
        self.controller.update(&mut player.state, &overlay, ctx);

        let mut touched = player.state.touched.clone();
        for id in overlay.proximity_touches(player.position()) {
            if !touched.contains(&id) {
                touched.push(id);
            }
        }

        let wants_use = player.state.command.wants_use();
        let use_target = if wants_use && player.use_released {
            let start = player.aim_origin(&self.config.movement);
            let end = start + player.look_direction() * Player::USE_RANGE;
            let trace = overlay.trace(start, end, &Hull::POINT);
            trace
                .entity
                .filter(|id| trace.hit_something() && !id.is_world())
        } else {
            None
        };
        player.use_released = !wants_use;

        let player_id = player.id;
        for id in touched {
            if let Some(Some(slot)) = self.entities.get_mut(id.0 as usize) {
                slot.touch(player_id, ctx);
            }
        }
        if let Some(Some(slot)) = use_target.and_then(|id| self.entities.get_mut(id.0 as usize)) {
            slot.use_by(player_id, ctx);
        }
    }

    fn move_entities(&mut self, ctx: &TickContext) {
        let movers = collect_movers(&self.entities);

        for index in 0..self.entities.len() {
            // Taken out while it moves so its contacts can reach the others.
            let Some(mut slot) = self.entities[index].take() else {
                continue;
            };

            if slot.entity.kinetic.move_type != MoveType::None {
                let id = slot.entity.id;
                let overlay = DynamicOverlay::new(&self.level.world, &movers).ignoring(id);
                let entities = &mut self.entities;

                // The entity sees its state as of the contact, and whatever
                // its touch changes feeds straight back into the move.
                let mut kinetic = slot.entity.kinetic.clone();
                self.integrator.step(&mut kinetic, &overlay, ctx.delta_time, &mut |state, trace| {
                    let Some(other) = trace.entity else {
                        return;
                    };
                    slot.entity.kinetic = state.clone();
                    slot.touch(other, ctx);
                    *state = slot.entity.kinetic.clone();

                    if let Some(Some(other_slot)) = entities.get_mut(other.0 as usize) {
                        other_slot.touch(id, ctx);
                    }
                });
                slot.entity.kinetic = kinetic;
            }

            self.entities[index] = Some(slot);
        }
    }

    /// Get the delta time for this simulation.
    pub fn delta_time(&self) -> f32 {
        self.config.delta_time()
    }
}

/// Kinetic state for a brush entity occupying `mins..maxs`, with its origin at `mins`.
fn brush_kinetic(mins: Vec3, maxs: Vec3) -> KineticState {
    KineticState::new(mins).with_hull(Hull::new(Vec3::ZERO, maxs - mins))
}

fn collect_movers(entities: &[Option<EntitySlot>]) -> Vec<MoverBrush> {
    entities
        .iter()
        .flatten()
        .filter_map(|slot| slot.entity.mover_brush())
        .collect()
}

fn mover_positions(entities: &[Option<EntitySlot>]) -> Vec<(EntityId, Vec3)> {
    entities
        .iter()
        .flatten()
        .filter(|slot| slot.entity.brush)
        .map(|slot| (slot.entity.id, slot.entity.position()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hullrun_physics::DIST_EPSILON;

    fn flat_sim(movers: Vec<MoverSpawn>, spawn: Vec3) -> Simulation {
        let mut level = Level::flat(1024.0);
        level.movers = movers;
        level.spawn_points.push(crate::level::SpawnPoint {
            position: spawn,
            yaw: 0.0,
        });
        Simulation::new(SimulationConfig::default(), level).unwrap()
    }

    fn forward_input() -> PlayerInput {
        let mut input = PlayerInput::default();
        input.movement.forward = true;
        input
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::test();
        assert_eq!(sim.frame, 0);
        assert!(sim.player().is_none());
        assert_eq!(sim.entities().count(), 2);
    }

    #[test]
    fn test_invalid_config() {
        let config = SimulationConfig {
            tick_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config, Level::flat(64.0)),
            Err(SimError::InvalidTickRate)
        ));

        let mut config = SimulationConfig::default();
        config.movement.max_speed = -1.0;
        assert!(matches!(
            Simulation::new(config, Level::flat(64.0)),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_spawn_player() {
        let mut sim = Simulation::test();

        let id = sim.spawn_player("Player1").unwrap();
        assert!(!id.is_world());

        let player = sim.player().unwrap();
        assert_eq!(player.name, "Player1");
        assert!(player.on_ground());
        assert!((player.position().z - (24.0 + DIST_EPSILON)).abs() < 1e-4);

        assert!(matches!(sim.spawn_player("Player2"), Err(SimError::PlayerExists)));
    }

    #[test]
    fn test_tick_advances_frame() {
        let mut sim = Simulation::test();
        sim.spawn_player("Test").unwrap();

        sim.tick(&PlayerInput::default());
        assert_eq!(sim.frame, 1);

        sim.tick(&PlayerInput::default());
        assert_eq!(sim.frame, 2);
        assert!((sim.time - 2.0 * f64::from(sim.delta_time())).abs() < 1e-9);
    }

    #[test]
    fn test_movement_input() {
        let mut sim = Simulation::test();
        sim.spawn_player("Test").unwrap();
        let start_pos = sim.player().unwrap().position();

        for _ in 0..60 {
            sim.tick(&forward_input());
        }

        let end_pos = sim.player().unwrap().position();
        let distance = (end_pos - start_pos).length();
        assert!(distance > 100.0, "Player should have moved, distance={}", distance);
    }

    #[test]
    fn test_determinism() {
        // Run simulation twice with same inputs - should get same results
        let inputs: Vec<_> = (0..200)
            .map(|i| {
                let mut input = PlayerInput::default();
                input.movement.forward = i % 2 == 0;
                input.movement.right = i % 3 == 0;
                input.actions.jump = i % 10 == 0;
                input.look = (0.0, if i % 7 == 0 { 5.0 } else { 0.0 });
                input
            })
            .collect();

        let run = || {
            let mut sim = Simulation::test();
            sim.spawn_player("Test").unwrap();
            for input in &inputs {
                sim.tick(input);
            }
            sim
        };
        let sim1 = run();
        let sim2 = run();

        let p1 = &sim1.player().unwrap().state;
        let p2 = &sim2.player().unwrap().state;
        assert_eq!(p1.kinetic.position, p2.kinetic.position);
        assert_eq!(p1.kinetic.velocity, p2.kinetic.velocity);
        assert_eq!(p1.kinetic.angles, p2.kinetic.angles);

        let doors1: Vec<_> = sim1.entities().map(|e| e.position()).collect();
        let doors2: Vec<_> = sim2.entities().map(|e| e.position()).collect();
        assert_eq!(doors1, doors2);
    }

    /// Gives a flying entity its velocity on first think.
    #[derive(Debug)]
    struct Launcher;

    impl Behavior for Launcher {
        fn think(&mut self, me: &mut Entity, _ctx: &TickContext) {
            me.kinetic.velocity = Vec3::new(100.0, 0.0, 0.0);
        }
    }

    #[test]
    fn test_think_runs_before_movement() {
        let mut sim = flat_sim(Vec::new(), Vec3::new(0.0, 0.0, 32.0));
        let kinetic = KineticState::new(Vec3::new(0.0, 200.0, 100.0)).with_move_type(MoveType::Fly);
        let id = sim.spawn(Entity::new("rocket", kinetic).thinking_at(0.0), Some(Box::new(Launcher)));

        sim.tick(&PlayerInput::default());

        let rocket = sim.entity(id).unwrap();
        let expected = 100.0 * sim.delta_time();
        assert!((rocket.position().x - expected).abs() < 1e-4);
        assert_eq!(rocket.next_think, None);
    }

    /// Stops whatever it is attached to on first contact.
    #[derive(Debug)]
    struct Sticky;

    impl Behavior for Sticky {
        fn touch(&mut self, me: &mut Entity, other: EntityId, _ctx: &TickContext) {
            if other.is_world() {
                me.classname = "stuck".to_string();
                me.kinetic.move_type = MoveType::None;
            }
        }
    }

    #[test]
    fn test_contacts_reach_touch() {
        let mut sim = flat_sim(Vec::new(), Vec3::new(0.0, 0.0, 32.0));
        let kinetic = KineticState::new(Vec3::new(300.0, 0.0, 20.0)).with_move_type(MoveType::Bounce);
        let id = sim.spawn(Entity::new("grenade", kinetic), Some(Box::new(Sticky)));

        for _ in 0..60 {
            sim.tick(&PlayerInput::default());
        }

        let grenade = sim.entity(id).unwrap();
        assert_eq!(grenade.classname, "stuck");
        assert_eq!(grenade.kinetic.move_type, MoveType::None);
    }

    #[test]
    fn test_touch_runs_before_bounce() {
        let mut sim = flat_sim(Vec::new(), Vec3::new(0.0, 0.0, 32.0));
        let mut kinetic = KineticState::new(Vec3::new(0.0, 0.0, 1.0)).with_move_type(MoveType::Bounce);
        kinetic.velocity = Vec3::new(0.0, 0.0, -300.0);
        let id = sim.spawn(Entity::new("grenade", kinetic), Some(Box::new(Sticky)));

        sim.tick(&PlayerInput::default());

        // Stopped by its touch at the moment of impact, so no bounce was applied.
        let grenade = sim.entity(id).unwrap();
        assert_eq!(grenade.classname, "stuck");
        assert_eq!(grenade.kinetic.move_type, MoveType::None);
        assert!(grenade.kinetic.velocity.z < -300.0);
    }

    #[test]
    fn test_projectile_opens_door() {
        let door = MoverSpawn::Door {
            mins: Vec3::new(100.0, -64.0, 0.0),
            maxs: Vec3::new(116.0, 64.0, 112.0),
            open_offset: Vec3::new(0.0, 0.0, 104.0),
            speed: 100.0,
            wait: 3.0,
        };
        let mut sim = flat_sim(vec![door], Vec3::new(-800.0, 0.0, 32.0));
        let door_id = EntityId(1);
        let mut kinetic = KineticState::new(Vec3::new(0.0, 0.0, 50.0)).with_move_type(MoveType::Fly);
        kinetic.velocity = Vec3::new(600.0, 0.0, 0.0);
        sim.spawn(Entity::new("rocket", kinetic), None);

        for _ in 0..30 {
            sim.tick(&PlayerInput::default());
        }

        assert!(sim.entity(door_id).unwrap().position().z > 0.0);
    }

    /// Renames itself after the first entity that touches it.
    #[derive(Debug)]
    struct Marker;

    impl Behavior for Marker {
        fn touch(&mut self, me: &mut Entity, other: EntityId, _ctx: &TickContext) {
            me.classname = format!("touched by {other}");
        }
    }

    #[test]
    fn test_running_into_far_face_of_brush_touches_it() {
        let mut sim = flat_sim(Vec::new(), Vec3::new(0.0, 440.0, 32.0));
        let mins = Vec3::new(200.0, 0.0, 0.0);
        let maxs = Vec3::new(712.0, 512.0, 112.0);
        let wall = sim.spawn(
            Entity::new("wall", brush_kinetic(mins, maxs)).as_brush(),
            Some(Box::new(Marker)),
        );
        let player = sim.spawn_player("Test").unwrap();

        for _ in 0..144 {
            sim.tick(&forward_input());
        }

        // Too far from the centre for the proximity radius; only the bump counts.
        let position = sim.player().unwrap().position();
        assert!(position.x > 180.0 && position.x < 184.0);
        assert_eq!(sim.entity(wall).unwrap().classname, format!("touched by {player}"));
    }

    #[test]
    fn test_rider_moves_with_lift() {
        let lift = MoverSpawn::Lift {
            mins: Vec3::new(-64.0, -64.0, 0.0),
            maxs: Vec3::new(64.0, 64.0, 8.0),
            travel: 64.0,
            speed: 64.0,
            wait: 0.5,
        };
        let mut sim = flat_sim(vec![lift], Vec3::new(0.0, 0.0, 64.0));
        sim.spawn_player("Rider").unwrap();
        let lift_id = EntityId(1);
        assert_eq!(sim.player().unwrap().state.kinetic.ground_entity, Some(lift_id));

        for _ in 0..72 {
            sim.tick(&PlayerInput::default());
        }

        let lift_top = sim.entity(lift_id).unwrap().position().z + 8.0;
        let player = sim.player().unwrap();
        assert!(lift_top > 20.0, "lift should have risen, top={lift_top}");
        assert!((player.position().z - (lift_top + 24.0 + DIST_EPSILON)).abs() < 0.01);
        assert!(player.on_ground());
    }

    #[test]
    fn test_door_opens_on_approach() {
        let door = MoverSpawn::Door {
            mins: Vec3::new(100.0, -64.0, 0.0),
            maxs: Vec3::new(116.0, 64.0, 112.0),
            open_offset: Vec3::new(0.0, 0.0, 104.0),
            speed: 100.0,
            wait: 3.0,
        };
        let mut sim = flat_sim(vec![door], Vec3::new(-100.0, 0.0, 32.0));
        sim.spawn_player("Test").unwrap();
        let door_id = EntityId(1);

        // Out of reach: nothing happens.
        for _ in 0..30 {
            sim.tick(&PlayerInput::default());
        }
        assert_eq!(sim.entity(door_id).unwrap().position().z, 0.0);

        for _ in 0..60 {
            sim.tick(&forward_input());
        }
        assert!(sim.entity(door_id).unwrap().position().z > 0.0);
    }

    #[test]
    fn test_use_entity() {
        let door = MoverSpawn::Door {
            mins: Vec3::new(500.0, -64.0, 0.0),
            maxs: Vec3::new(516.0, 64.0, 112.0),
            open_offset: Vec3::new(0.0, 0.0, 104.0),
            speed: 100.0,
            wait: 3.0,
        };
        let mut sim = flat_sim(vec![door], Vec3::new(0.0, 0.0, 32.0));
        let player = sim.spawn_player("Test").unwrap();
        let door_id = EntityId(1);

        sim.use_entity(door_id, player).unwrap();
        sim.tick(&PlayerInput::default());
        assert!(sim.entity(door_id).unwrap().position().z > 0.0);

        assert!(matches!(
            sim.use_entity(EntityId(99), player),
            Err(SimError::UnknownEntity(EntityId(99)))
        ));
    }

    #[test]
    fn test_intermission_freezes_player() {
        let mut sim = Simulation::test();
        sim.spawn_player("Test").unwrap();
        sim.intermission = true;
        let start = sim.player().unwrap().position();

        for _ in 0..30 {
            sim.tick(&forward_input());
        }

        assert_eq!(sim.player().unwrap().position(), start);
    }

    #[test]
    fn test_remove_entity() {
        let mut sim = Simulation::test();
        let removed = sim.remove(EntityId(1)).unwrap();
        assert_eq!(removed.classname, "door");
        assert!(sim.entity(EntityId(1)).is_none());
        assert!(matches!(sim.remove(EntityId(1)), Err(SimError::UnknownEntity(_))));
    }
}
