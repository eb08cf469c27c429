//! Player input handling.
//!
//! This module converts raw key and mouse state into commands for the
//! physics system.

use glam::Vec3;
use hullrun_physics::movement::{CommandButtons, PlayerCommand};
use serde::{Deserialize, Serialize};

/// Pitch limit in degrees, either way.
const PITCH_LIMIT: f32 = 89.0;

/// Raw player input for a single frame.
///
/// It gets converted to [`PlayerCommand`] for the physics system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Movement keys pressed.
    pub movement: MovementInput,

    /// Mouse movement this frame as (pitch, yaw) deltas.
    pub look: (f32, f32),

    /// Action buttons pressed.
    pub actions: ActionInput,
}

/// Movement key states.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Swim up.
    pub up: bool,
    /// Swim down.
    pub down: bool,
}

/// Action button states.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActionInput {
    pub fire: bool,
    pub jump: bool,
    pub use_item: bool,
}

impl PlayerInput {
    /// Convert to a physics command.
    pub fn to_command(&self) -> PlayerCommand {
        let mut cmd = PlayerCommand::default();

        // Movement axes
        if self.movement.forward {
            cmd.forward_move += 1.0;
        }
        if self.movement.backward {
            cmd.forward_move -= 1.0;
        }
        if self.movement.right {
            cmd.right_move += 1.0;
        }
        if self.movement.left {
            cmd.right_move -= 1.0;
        }
        if self.movement.up {
            cmd.up_move += 1.0;
        }
        if self.movement.down {
            cmd.up_move -= 1.0;
        }

        // Action buttons
        if self.actions.fire {
            cmd.buttons.press(CommandButtons::FIRE);
        }
        if self.actions.jump {
            cmd.buttons.press(CommandButtons::JUMP);
        }
        if self.actions.use_item {
            cmd.buttons.press(CommandButtons::USE);
        }

        cmd
    }

    /// Turn `angles` by this frame's mouse movement.
    ///
    /// Positive pitch looks down. Yaw wraps to 0..360.
    pub fn apply_look(&self, angles: &mut Vec3, sensitivity: f32) {
        let (pitch, yaw) = self.look;
        angles.x = (angles.x + pitch * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        angles.y = (angles.y + yaw * sensitivity).rem_euclid(360.0);
    }

    /// Check if any movement input is active.
    pub fn has_movement(&self) -> bool {
        self.movement.forward
            || self.movement.backward
            || self.movement.left
            || self.movement.right
            || self.movement.up
            || self.movement.down
    }
}
