//! Hullrun Game Logic
//!
//! This crate hosts the physics from `hullrun-physics` in a small game world:
//!
//! - Player state and input handling
//! - Entities with think, touch and use callbacks
//! - Doors and lifts that carry whatever stands on them
//! - Levels built from axis-aligned brushes
//!
//! # Architecture
//!
//! The simulation is deterministic and runs on a fixed timestep. Each tick:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Simulation::tick                       │
//! │  ┌────────┐   ┌──────────┐   ┌─────────────┐   ┌───────────┐  │
//! │  │ Thinks │──►│ Carry    │──►│ Player move │──►│ Entity    │  │
//! │  │ (due)  │   │ riders   │   │ + touches   │   │ moves     │  │
//! │  └────────┘   └──────────┘   └─────────────┘   └───────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod entity;
pub mod input;
pub mod level;
pub mod movers;
pub mod player;
pub mod simulation;

// Re-export main types
pub use entity::{Behavior, Entity};
pub use input::PlayerInput;
pub use level::{Level, MoverSpawn, SpawnPoint};
pub use movers::{Door, Lift};
pub use player::Player;
pub use simulation::{SimError, Simulation, SimulationConfig};

// Re-export physics types for convenience
pub use hullrun_physics::{
    BrushWorld, Contents, EntityId, Hull, KineticState, MoveType, MovementConfig, PlayerCommand,
    PlayerController, TickContext, TraceResult,
};
