//! Camera roll and bob derived from movement.
//!
//! These only feed [`ViewState`](super::state::ViewState); nothing here
//! affects physics.

use std::f32::consts::PI;

use glam::Vec3;

use super::config::MovementConfig;

/// Lowest bob offset.
const BOB_MIN: f32 = -7.0;

/// Highest bob offset.
const BOB_MAX: f32 = 4.0;

/// Strafe roll in degrees for `velocity` given the yaw right vector.
pub fn calc_roll(velocity: Vec3, right: Vec3, config: &MovementConfig) -> f32 {
    let side = velocity.dot(right);
    let sign = if side < 0.0 { -1.0 } else { 1.0 };
    let side = side.abs();

    let roll = if side < config.roll_speed {
        side * config.roll_angle / config.roll_speed
    } else {
        config.roll_angle
    };

    roll * sign
}

/// Vertical bob offset at game time `time`.
pub fn calc_bob(time: f64, velocity: Vec3, config: &MovementConfig) -> f32 {
    let period = f64::from(config.bob_cycle);
    let mut cycle = ((time - (time / period).floor() * period) / period) as f32;

    if cycle < config.bob_up {
        cycle = PI * cycle / config.bob_up;
    } else {
        cycle = PI + PI * (cycle - config.bob_up) / (1.0 - config.bob_up);
    }

    let speed = (velocity.x * velocity.x + velocity.y * velocity.y).sqrt();
    let bob = speed * config.bob;
    let bob = bob * 0.3 + bob * 0.7 * cycle.sin();

    bob.clamp(BOB_MIN, BOB_MAX)
}
