//! Hullrun Physics Engine
//!
//! Quake-style movement physics for a first-person game: swept-box
//! collision response, stair stepping, ground/air/water player movement and
//! generic thrown/flying/stepping entities. Every step is deterministic so a
//! recorded command stream replays to the same state.
//!
//! # Architecture
//!
//! The physics engine is split into three parts:
//!
//! - **Collision**: the [`CollisionOracle`] trait, a reference brush world
//!   and an overlay that adds moving brushes on top of it
//! - **Movement**: the [`PlayerController`] and the sliding and stepping
//!   primitives it is built from
//! - **Integrator**: per-[`MoveType`] movement for everything that is not a player
//!
//! # Units
//!
//! Z is up. Distances are in world units (a standing player is 56 tall),
//! speeds in units/second, angles in degrees.

pub mod collision;
pub mod integrator;
pub mod movement;

// Re-export commonly used types
pub use collision::{
    BrushWorld, CollisionOracle, Contents, DynamicOverlay, EntityId, Hull, MoverBrush, TraceResult,
    DIST_EPSILON,
};
pub use integrator::{MovementIntegrator, TouchSink};
pub use movement::{
    CommandButtons, ConfigError, EntityFlags, KineticState, MoveType, MovementConfig, PlayerCommand,
    PlayerController, PlayerState, TickContext, WaterLevel,
};
