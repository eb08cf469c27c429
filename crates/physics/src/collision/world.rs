//! Reference collision world built from axis-aligned brushes.
//!
//! Solid brushes block hull sweeps; liquid brushes only show up in
//! [`CollisionOracle::point_contents`]. The world is immutable while a tick
//! runs and answers every query exactly, which is what the movement tests
//! and the headless runner need from a level.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::contents::Contents;
use super::trace::{sweep_box, BoxSweep, CollisionOracle, EntityId, Hull, TraceResult};

/// A box of world geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brush {
    /// Index of this brush in the world.
    pub id: u32,
    pub mins: Vec3,
    pub maxs: Vec3,
    pub contents: Contents,
}

impl Brush {
    #[inline]
    fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.mins).all() && point.cmple(self.maxs).all()
    }
}

/// Static collision world.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BrushWorld {
    brushes: Vec<Brush>,
}

impl BrushWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self {
            brushes: Vec::new(),
        }
    }

    /// Add a box by centre and half extents.
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, contents: Contents) -> u32 {
        let half = half_extents.abs();
        self.add_bounds(center - half, center + half, contents)
    }

    /// Add a box by its corners.
    pub fn add_bounds(&mut self, a: Vec3, b: Vec3, contents: Contents) -> u32 {
        let id = self.brushes.len() as u32;
        self.brushes.push(Brush {
            id,
            mins: a.min(b),
            maxs: a.max(b),
            contents,
        });
        id
    }

    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }
}

impl CollisionOracle for BrushWorld {
    fn trace(&self, start: Vec3, end: Vec3, hull: &Hull) -> TraceResult {
        let mut best = TraceResult::no_hit(end);
        let mut start_solid = false;

        for brush in self.brushes.iter().filter(|b| b.contents.is_solid()) {
            match sweep_box(start, end, hull, brush.mins, brush.maxs) {
                BoxSweep::Miss => {}
                BoxSweep::StartSolid { all_solid: true } => {
                    return TraceResult::embedded(start, EntityId::WORLD);
                }
                BoxSweep::StartSolid { all_solid: false } => start_solid = true,
                BoxSweep::Hit { fraction, normal } => {
                    if fraction < best.fraction {
                        best = TraceResult::hit(
                            fraction,
                            start + (end - start) * fraction,
                            normal,
                            EntityId::WORLD,
                        );
                    }
                }
            }
        }

        best.start_solid = start_solid;
        best
    }

    fn point_contents(&self, point: Vec3) -> Contents {
        let mut contents = Contents::EMPTY;
        for brush in self.brushes.iter().filter(|b| b.contains(point)) {
            if brush.contents.is_solid() {
                return brush.contents;
            }
            if brush.contents.is_liquid() {
                contents = contents.deeper(brush.contents);
            }
        }
        contents
    }
}
