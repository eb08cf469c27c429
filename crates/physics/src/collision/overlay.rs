//! Moving brush entities layered over the static world.
//!
//! Doors, platforms and trains are not part of the static geometry, so every
//! movement trace goes through a [`DynamicOverlay`] that answers with the
//! nearer of the static hit and a slab test against each active mover.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::contents::Contents;
use super::trace::{sweep_box, BoxSweep, CollisionOracle, EntityId, Hull, TraceResult};

/// How far above a mover's top face a hull still counts as standing on it.
pub const STAND_ON_TOLERANCE: f32 = 2.0;

/// Extra reach of the proximity touch pass beyond half the mover's footprint.
pub const PROXIMITY_MARGIN: f32 = 48.0;

/// World-space bounds of a moving brush entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoverBrush {
    pub entity: EntityId,
    pub mins: Vec3,
    pub maxs: Vec3,
    /// Inactive movers (an open door that has been switched off) are ignored.
    pub active: bool,
}

impl MoverBrush {
    pub fn new(entity: EntityId, mins: Vec3, maxs: Vec3) -> Self {
        Self {
            entity,
            mins: mins.min(maxs),
            maxs: mins.max(maxs),
            active: true,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.mins + self.maxs) * 0.5
    }

    /// Radius of the proximity touch pass.
    #[inline]
    pub fn trigger_radius(&self) -> f32 {
        let size = self.maxs - self.mins;
        size.x.max(size.y) * 0.5 + PROXIMITY_MARGIN
    }

    fn overlaps_footprint(&self, position: Vec3, hull: &Hull) -> bool {
        position.x + hull.mins.x < self.maxs.x
            && position.x + hull.maxs.x > self.mins.x
            && position.y + hull.mins.y < self.maxs.y
            && position.y + hull.maxs.y > self.mins.y
    }
}

/// Static world plus moving brushes, answering traces as one oracle.
pub struct DynamicOverlay<'a> {
    world: &'a dyn CollisionOracle,
    movers: &'a [MoverBrush],
    ignore: Option<EntityId>,
}

impl<'a> DynamicOverlay<'a> {
    pub fn new(world: &'a dyn CollisionOracle, movers: &'a [MoverBrush]) -> Self {
        Self {
            world,
            movers,
            ignore: None,
        }
    }

    /// Leave one entity out of the mover tests (the entity doing the tracing).
    pub fn ignoring(mut self, entity: EntityId) -> Self {
        self.ignore = Some(entity);
        self
    }

    fn active_movers(&self) -> impl Iterator<Item = &MoverBrush> + '_ {
        self.movers
            .iter()
            .filter(move |m| m.active && Some(m.entity) != self.ignore)
    }

    /// Movers close enough to `position` to receive a touch from it.
    ///
    /// This fires without any geometric contact so that walking up to a door
    /// opens it before the player bumps into it.
    pub fn proximity_touches(&self, position: Vec3) -> Vec<EntityId> {
        self.active_movers()
            .filter(|mover| {
                let center = mover.center();
                let distance = Vec2::new(position.x - center.x, position.y - center.y).length();
                distance < mover.trigger_radius()
                    && position.z >= mover.mins.z - PROXIMITY_MARGIN
                    && position.z <= mover.maxs.z + PROXIMITY_MARGIN
            })
            .map(|mover| mover.entity)
            .collect()
    }

    /// Synthetic floor contact for a hull resting on (or hovering just over) a mover.
    ///
    /// A ground probe that starts with the hull exactly on the top face, or a
    /// hair above the probe length, would otherwise report open air.
    fn standing_on(&self, start: Vec3, end: Vec3, hull: &Hull) -> Option<TraceResult> {
        let planar = Vec2::new(end.x - start.x, end.y - start.y);
        if end.z >= start.z || planar.length_squared() > 1e-6 {
            return None;
        }

        let feet = start.z + hull.mins.z;
        self.active_movers()
            .find(|mover| {
                let gap = feet - mover.maxs.z;
                (0.0..=STAND_ON_TOLERANCE).contains(&gap) && mover.overlaps_footprint(start, hull)
            })
            .map(|mover| TraceResult::hit(0.0, start, Vec3::Z, mover.entity))
    }
}

impl CollisionOracle for DynamicOverlay<'_> {
    fn trace(&self, start: Vec3, end: Vec3, hull: &Hull) -> TraceResult {
        let mut best = self.world.trace(start, end, hull);
        if best.all_solid {
            return best;
        }

        for mover in self.active_movers() {
            match sweep_box(start, end, hull, mover.mins, mover.maxs) {
                BoxSweep::Miss => {}
                BoxSweep::StartSolid { all_solid: true } => {
                    return TraceResult::embedded(start, mover.entity);
                }
                BoxSweep::StartSolid { all_solid: false } => best.start_solid = true,
                BoxSweep::Hit { fraction, normal } => {
                    if fraction < best.fraction {
                        let start_solid = best.start_solid;
                        best = TraceResult::hit(
                            fraction,
                            start + (end - start) * fraction,
                            normal,
                            mover.entity,
                        );
                        best.start_solid = start_solid;
                    }
                }
            }
        }

        if best.fraction > 0.0 {
            if let Some(hit) = self.standing_on(start, end, hull) {
                return hit;
            }
        }

        best
    }

    fn point_contents(&self, point: Vec3) -> Contents {
        self.world.point_contents(point)
    }
}
