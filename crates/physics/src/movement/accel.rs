//! Acceleration and friction primitives shared by the player and monsters.

use glam::Vec3;

/// Accelerate `velocity` towards `wish_speed` along `wish_dir`.
///
/// Only the component along `wish_dir` is limited, so strafing while moving
/// fast still gains speed.
pub fn accelerate(velocity: &mut Vec3, wish_dir: Vec3, wish_speed: f32, accel: f32, delta_time: f32) {
    let current = velocity.dot(wish_dir);
    let add = wish_speed - current;
    if add <= 0.0 {
        return;
    }

    let speed = (accel * wish_speed * delta_time).min(add);
    *velocity += wish_dir * speed;
}

/// Air acceleration with the headroom capped at `cap`.
///
/// The cap only limits how much speed may be added along `wish_dir`; the
/// rate still scales with the full `wish_speed`.
pub fn air_accelerate(
    velocity: &mut Vec3,
    wish_dir: Vec3,
    wish_speed: f32,
    cap: f32,
    accel: f32,
    delta_time: f32,
) {
    let capped = wish_speed.min(cap);
    let current = velocity.dot(wish_dir);
    let add = capped - current;
    if add <= 0.0 {
        return;
    }

    let speed = (accel * wish_speed * delta_time).min(add);
    *velocity += wish_dir * speed;
}

/// Scale `velocity` down by ground friction.
///
/// Below `stop_speed` the drop is computed as if moving at `stop_speed`, so
/// slow entities come to rest quickly.
pub fn apply_friction(velocity: &mut Vec3, speed: f32, friction: f32, stop_speed: f32, delta_time: f32) {
    if speed <= 0.0 {
        return;
    }

    let control = speed.max(stop_speed);
    let new_speed = (speed - control * friction * delta_time).max(0.0);
    *velocity *= new_speed / speed;
}
