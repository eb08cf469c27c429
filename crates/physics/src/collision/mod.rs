//! Collision queries consumed by the movement code.
//!
//! # Key Types
//!
//! - [`CollisionOracle`]: swept-hull traces and point contents
//! - [`TraceResult`]: output of a trace
//! - [`Hull`]: axis-aligned box swept by a trace
//! - [`BrushWorld`]: reference static world of axis-aligned brushes
//! - [`DynamicOverlay`]: static world plus moving brush entities
//!
//! A trace sweeps a hull from a start to an end position and reports how far
//! it got (fraction 0.0-1.0), where it stopped, the plane it hit and whether
//! it was stuck in solid.

mod contents;
mod overlay;
mod trace;
mod world;

pub use contents::Contents;
pub use overlay::{DynamicOverlay, MoverBrush, PROXIMITY_MARGIN, STAND_ON_TOLERANCE};
pub use trace::{CollisionOracle, EntityId, Hull, TraceResult, DIST_EPSILON};
pub use world::{Brush, BrushWorld};
