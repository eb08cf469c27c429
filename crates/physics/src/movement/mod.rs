//! Player movement physics system.
//!
//! This module implements Quake-style FPS movement with:
//!
//! - Ground, air and water movement with different physics
//! - Friction and acceleration models, including air strafing
//! - Jumping and climbing out of water
//! - Multi-plane collision sliding
//! - Stair stepping
//!
//! # Design
//!
//! Movement is controlled by the [`PlayerController`] which reads the
//! player's command and updates its [`PlayerState`] through a
//! [`CollisionOracle`](crate::collision::CollisionOracle).
//!
//! All movement is deterministic: the same inputs always produce the same
//! outputs, which recorded playback relies on.

mod accel;
mod clip;
mod config;
mod controller;
mod state;
mod step;
mod view;
mod water;

pub use accel::{accelerate, air_accelerate, apply_friction};
pub use clip::{clip_velocity, fly_move, push_entity, Blocked, SlideOutcome, STOP_EPSILON};
pub use config::{ConfigError, MovementConfig};
pub use controller::PlayerController;
pub use state::{
    angle_vectors, CommandButtons, EntityFlags, KineticState, MoveType, PlayerCommand, PlayerState,
    TickContext, ViewState, WaterLevel,
};
pub use step::walk_move;
pub use view::{calc_bob, calc_roll};
pub use water::{check_water_jump, sample_water, start_water_jump, water_move};

pub(crate) use step::{step_up, MoveSnapshot};
