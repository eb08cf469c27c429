//! The player entity.

use glam::Vec3;
use hullrun_physics::movement::angle_vectors;
use hullrun_physics::{EntityId, MovementConfig, PlayerState};
use serde::{Deserialize, Serialize};

/// The player in the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Entity id, so brush entities can tell who touched them.
    pub id: EntityId,

    /// Player name/handle.
    pub name: String,

    /// Movement physics state.
    pub state: PlayerState,

    /// The use button was up on the previous tick.
    pub use_released: bool,
}

impl Player {
    /// Reach of the use button.
    pub const USE_RANGE: f32 = 64.0;

    /// Create a new player at the given spawn position.
    pub fn new(id: EntityId, name: String, spawn_position: Vec3) -> Self {
        Self {
            id,
            name,
            state: PlayerState::new(spawn_position),
            use_released: true,
        }
    }

    /// Get the player's current position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.state.kinetic.position
    }

    /// Camera position including view bob.
    pub fn eye_position(&self) -> Vec3 {
        self.position() + Vec3::new(0.0, 0.0, self.state.view.height)
    }

    /// Eye position without bob, used for aiming traces.
    pub fn aim_origin(&self, config: &MovementConfig) -> Vec3 {
        self.position() + Vec3::new(0.0, 0.0, config.view_height)
    }

    /// Get the direction the player is looking.
    #[inline]
    pub fn look_direction(&self) -> Vec3 {
        angle_vectors(self.state.kinetic.angles).0
    }

    /// Check if the player is on the ground.
    #[inline]
    pub fn on_ground(&self) -> bool {
        self.state.kinetic.on_ground
    }

    /// Horizontal speed, as shown on a speedometer.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.state.kinetic.planar_speed()
    }

    /// Put the player back at `position` with fresh movement state, keeping the view direction.
    pub fn respawn(&mut self, position: Vec3) {
        let angles = self.state.kinetic.angles;
        self.state = PlayerState::new(position);
        self.state.kinetic.angles = angles;
        self.use_released = true;
    }
}
