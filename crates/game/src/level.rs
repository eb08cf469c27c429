//! Level geometry, spawn points and brush entity placements.

use glam::Vec3;
use hullrun_physics::{BrushWorld, Contents};
use serde::{Deserialize, Serialize};

/// A game level: static brushes plus where things start.
#[derive(Debug)]
pub struct Level {
    /// Level identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Static collision geometry.
    pub world: BrushWorld,

    /// Player spawn points.
    pub spawn_points: Vec<SpawnPoint>,

    /// Brush entities created when the simulation starts.
    pub movers: Vec<MoverSpawn>,
}

/// A spawn point for the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Position in world space.
    pub position: Vec3,

    /// Initial facing (yaw in degrees).
    pub yaw: f32,
}

/// A brush entity placement. Bounds are in world space at the closed/bottom position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MoverSpawn {
    Door {
        mins: Vec3,
        maxs: Vec3,
        /// Offset from closed to fully open.
        open_offset: Vec3,
        speed: f32,
        wait: f32,
    },
    Lift {
        mins: Vec3,
        maxs: Vec3,
        /// Height gained at the top.
        travel: f32,
        speed: f32,
        wait: f32,
    },
}

impl Level {
    /// Create an empty level.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            world: BrushWorld::new(),
            spawn_points: Vec::new(),
            movers: Vec::new(),
        }
    }

    /// A flat floor with its top at z=0 and nothing else.
    pub fn flat(half_size: f32) -> Self {
        let mut level = Self::new("flat", "Flat");
        level.world.add_bounds(
            Vec3::new(-half_size, -half_size, -32.0),
            Vec3::new(half_size, half_size, 0.0),
            Contents::SOLID,
        );
        level
    }

    /// Create a simple test level for development.
    ///
    /// A walled, sky-roofed 2048x2048 arena with a staircase, a wading pool,
    /// a door and a lift.
    pub fn test_arena() -> Self {
        let mut level = Self::new("test_arena", "Test Arena");
        let world = &mut level.world;

        // Floor, leaving a hole for the pool at x -256..0, y 256..512
        world.add_bounds(Vec3::new(-1024.0, -1024.0, -32.0), Vec3::new(1024.0, 256.0, 0.0), Contents::SOLID);
        world.add_bounds(Vec3::new(-1024.0, 256.0, -32.0), Vec3::new(-256.0, 1024.0, 0.0), Contents::SOLID);
        world.add_bounds(Vec3::new(0.0, 256.0, -32.0), Vec3::new(1024.0, 1024.0, 0.0), Contents::SOLID);
        world.add_bounds(Vec3::new(-256.0, 512.0, -32.0), Vec3::new(0.0, 1024.0, 0.0), Contents::SOLID);

        // Pool
        world.add_bounds(Vec3::new(-256.0, 256.0, -160.0), Vec3::new(0.0, 512.0, -128.0), Contents::SOLID);
        world.add_bounds(Vec3::new(-256.0, 256.0, -128.0), Vec3::new(0.0, 512.0, -16.0), Contents::WATER);

        // Walls
        let wall_height = 256.0;
        world.add_bounds(Vec3::new(-1040.0, -1040.0, 0.0), Vec3::new(1040.0, -1024.0, wall_height), Contents::SOLID);
        world.add_bounds(Vec3::new(-1040.0, 1024.0, 0.0), Vec3::new(1040.0, 1040.0, wall_height), Contents::SOLID);
        world.add_bounds(Vec3::new(1024.0, -1024.0, 0.0), Vec3::new(1040.0, 1024.0, wall_height), Contents::SOLID);
        world.add_bounds(Vec3::new(-1040.0, -1024.0, 0.0), Vec3::new(-1024.0, 1024.0, wall_height), Contents::SOLID);

        // Sky ceiling resting on the walls
        world.add_box(Vec3::new(0.0, 0.0, wall_height + 8.0), Vec3::new(1040.0, 1040.0, 8.0), Contents::SKY);

        // Staircase: four 16-unit steps rising along +X
        for step in 0..4 {
            let x = 256.0 + step as f32 * 32.0;
            let top = 16.0 * (step + 1) as f32;
            world.add_bounds(Vec3::new(x, -128.0, 0.0), Vec3::new(512.0, 128.0, top), Contents::SOLID);
        }

        level.movers.push(MoverSpawn::Door {
            mins: Vec3::new(-520.0, -64.0, 0.0),
            maxs: Vec3::new(-504.0, 64.0, 112.0),
            open_offset: Vec3::new(0.0, 0.0, 104.0),
            speed: 100.0,
            wait: 3.0,
        });
        level.movers.push(MoverSpawn::Lift {
            mins: Vec3::new(-128.0, -640.0, 0.0),
            maxs: Vec3::new(0.0, -512.0, 8.0),
            travel: 128.0,
            speed: 64.0,
            wait: 2.0,
        });

        level.spawn_points.push(SpawnPoint {
            position: Vec3::new(0.0, 0.0, 32.0),
            yaw: 0.0,
        });
        level.spawn_points.push(SpawnPoint {
            position: Vec3::new(-400.0, 0.0, 32.0),
            yaw: 180.0,
        });

        level
    }

    /// Get a player spawn point.
    pub fn get_player_spawn(&self, index: usize) -> Option<&SpawnPoint> {
        self.spawn_points.get(index)
    }
}
