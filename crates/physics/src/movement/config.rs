//! Movement configuration constants.
//!
//! All movement tuning is grouped here. The defaults are the classic values
//! and must stay bit-for-bit identical for recorded playback to line up.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from [`MovementConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("air speed cap {cap} exceeds max speed {max_speed}")]
    AirCapAboveMaxSpeed { cap: f32, max_speed: f32 },

    #[error("min walk normal {0} is outside 0..=1")]
    WalkNormalOutOfRange(f32),
}

/// Configuration for player and entity movement physics.
///
/// Distances are in world units, time in seconds, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    // ========================================================================
    // Physics
    // ========================================================================
    /// Gravity acceleration (units/second²).
    pub gravity: f32,

    /// Ground friction coefficient.
    pub friction: f32,

    /// Friction multiplier when the ground ahead drops away.
    pub edge_friction: f32,

    /// Acceleration rate shared by ground, air and water movement.
    pub accelerate: f32,

    /// Speed below which friction works off a fixed control speed.
    pub stop_speed: f32,

    /// Per-axis velocity clamp.
    pub max_velocity: f32,

    // ========================================================================
    // Player speeds
    // ========================================================================
    /// Full-input running speed.
    pub max_speed: f32,

    /// Vertical velocity given by a jump.
    pub jump_velocity: f32,

    /// Wish speed ceiling used for the air-acceleration headroom.
    pub air_speed_cap: f32,

    // ========================================================================
    // Water
    // ========================================================================
    /// Fraction of max speed available while swimming.
    pub water_speed_factor: f32,

    /// Sink rate with no input while submerged.
    pub water_sink_speed: f32,

    /// Vertical velocity of a water jump.
    pub water_jump_velocity: f32,

    /// How long a water jump keeps steering the player (seconds).
    pub water_jump_time: f32,

    // ========================================================================
    // Steps and slopes
    // ========================================================================
    /// Maximum step height climbed without jumping.
    pub step_size: f32,

    /// Minimum plane normal Z that counts as floor.
    pub min_walk_normal: f32,

    // ========================================================================
    // View
    // ========================================================================
    /// Eye height above the origin.
    pub view_height: f32,

    /// Maximum strafe roll (degrees).
    pub roll_angle: f32,

    /// Strafe speed at which the roll reaches its maximum.
    pub roll_speed: f32,

    /// Bob amplitude per unit of planar speed.
    pub bob: f32,

    /// Length of one bob cycle (seconds).
    pub bob_cycle: f32,

    /// Fraction of the cycle spent rising.
    pub bob_up: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            // Physics
            gravity: 800.0,
            friction: 4.0,
            edge_friction: 2.0,
            accelerate: 10.0,
            stop_speed: 100.0,
            max_velocity: 2000.0,

            // Player speeds
            max_speed: 320.0,
            jump_velocity: 270.0,
            air_speed_cap: 30.0,

            // Water
            water_speed_factor: 0.7,
            water_sink_speed: 60.0,
            water_jump_velocity: 225.0,
            water_jump_time: 2.0,

            // Steps
            step_size: 18.0,
            min_walk_normal: 0.7,

            // View
            view_height: 22.0,
            roll_angle: 2.0,
            roll_speed: 200.0,
            bob: 0.02,
            bob_cycle: 0.6,
            bob_up: 0.5,
        }
    }
}

impl MovementConfig {
    /// Reduced gravity, as used on the classic low-gravity maps.
    pub fn low_gravity() -> Self {
        Self {
            gravity: 100.0,
            ..Default::default()
        }
    }

    /// Speed limit while swimming.
    #[inline]
    pub fn water_max_speed(&self) -> f32 {
        self.max_speed * self.water_speed_factor
    }

    /// Check that the tuning can drive the simulation without degenerate math.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_speed", self.max_speed),
            ("max_velocity", self.max_velocity),
            ("accelerate", self.accelerate),
            ("roll_speed", self.roll_speed),
            ("bob_cycle", self.bob_cycle),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        let non_negative = [
            ("gravity", self.gravity),
            ("friction", self.friction),
            ("edge_friction", self.edge_friction),
            ("stop_speed", self.stop_speed),
            ("step_size", self.step_size),
            ("jump_velocity", self.jump_velocity),
            ("water_jump_time", self.water_jump_time),
            ("air_speed_cap", self.air_speed_cap),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.air_speed_cap > self.max_speed {
            return Err(ConfigError::AirCapAboveMaxSpeed {
                cap: self.air_speed_cap,
                max_speed: self.max_speed,
            });
        }

        if !(0.0..=1.0).contains(&self.min_walk_normal) {
            return Err(ConfigError::WalkNormalOutOfRange(self.min_walk_normal));
        }

        Ok(())
    }
}
