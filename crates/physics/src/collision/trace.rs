//! Trace results, hulls and the collision oracle interface.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::contents::Contents;

/// Distance traces stop short of the plane they hit.
///
/// Keeping every resting hull this far off its contact planes lets the next
/// parallel move start outside the solid instead of on its boundary.
pub const DIST_EPSILON: f32 = 0.03125;

/// Identifier of a simulated entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// The static world. Traces against world geometry report this id.
    pub const WORLD: Self = Self(0);

    #[inline]
    pub fn is_world(self) -> bool {
        self == Self::WORLD
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-aligned collision box, relative to an entity's origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl Hull {
    /// Zero-sized hull used for point traces.
    pub const POINT: Self = Self {
        mins: Vec3::ZERO,
        maxs: Vec3::ZERO,
    };

    /// Standing player box: 32x32 footprint, 56 units tall, origin 24 above the feet.
    pub const PLAYER: Self = Self {
        mins: Vec3::new(-16.0, -16.0, -24.0),
        maxs: Vec3::new(16.0, 16.0, 32.0),
    };

    /// Create a hull, swapping any inverted axis so the box is never negative-sized.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            mins: a.min(b),
            maxs: a.max(b),
        }
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.maxs - self.mins
    }
}

impl Default for Hull {
    fn default() -> Self {
        Self::POINT
    }
}

/// Result of sweeping a hull from a start to an end position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceResult {
    /// Portion of the requested motion completed, `1.0` when nothing was hit.
    pub fraction: f32,

    /// Where the hull ended up.
    pub end_position: Vec3,

    /// Normal of the impacted plane, zero when nothing was hit.
    pub plane_normal: Vec3,

    /// The whole sweep stayed inside solid.
    pub all_solid: bool,

    /// The sweep started inside solid.
    pub start_solid: bool,

    /// What was hit: [`EntityId::WORLD`] for static geometry, `None` for a clean miss.
    pub entity: Option<EntityId>,
}

impl TraceResult {
    /// A sweep that completed without contact.
    pub fn no_hit(end_position: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end_position,
            plane_normal: Vec3::ZERO,
            all_solid: false,
            start_solid: false,
            entity: None,
        }
    }

    /// A sweep that stopped at `fraction` against a plane.
    pub fn hit(fraction: f32, end_position: Vec3, normal: Vec3, entity: EntityId) -> Self {
        Self {
            fraction,
            end_position,
            plane_normal: normal,
            all_solid: false,
            start_solid: false,
            entity: Some(entity),
        }
    }

    /// A sweep that never left solid.
    pub fn embedded(position: Vec3, entity: EntityId) -> Self {
        Self {
            fraction: 0.0,
            end_position: position,
            plane_normal: Vec3::ZERO,
            all_solid: true,
            start_solid: true,
            entity: Some(entity),
        }
    }

    #[inline]
    pub fn hit_something(&self) -> bool {
        self.fraction < 1.0
    }
}

/// Swept-hull collision queries against the world.
///
/// The movement code only ever talks to geometry through this trait; the
/// production level format lives outside this crate.
pub trait CollisionOracle {
    /// Sweep `hull` from `start` to `end`.
    fn trace(&self, start: Vec3, end: Vec3, hull: &Hull) -> TraceResult;

    /// Contents code at a single point.
    fn point_contents(&self, point: Vec3) -> Contents;
}

/// Outcome of sweeping a hull against a single box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BoxSweep {
    Miss,
    Hit { fraction: f32, normal: Vec3 },
    StartSolid { all_solid: bool },
}

/// Slab test of a hull swept from `start` to `end` against the box `mins..maxs`.
///
/// The box is expanded by the hull (Minkowski sum) so the hull reduces to a
/// point. Touching a face while moving parallel to it is not a hit.
pub(crate) fn sweep_box(start: Vec3, end: Vec3, hull: &Hull, mins: Vec3, maxs: Vec3) -> BoxSweep {
    let lo = mins - hull.maxs;
    let hi = maxs - hull.mins;
    let inside = |p: Vec3| p.cmpgt(lo).all() && p.cmplt(hi).all();

    if inside(start) {
        return BoxSweep::StartSolid {
            all_solid: inside(end),
        };
    }

    let delta = end - start;
    let mut enter = f32::NEG_INFINITY;
    let mut exit = f32::INFINITY;
    let mut hit_axis = 0;

    for axis in 0..3 {
        let s = start[axis];
        let d = delta[axis];

        if d == 0.0 {
            if s <= lo[axis] || s >= hi[axis] {
                return BoxSweep::Miss;
            }
            continue;
        }

        let t_lo = (lo[axis] - s) / d;
        let t_hi = (hi[axis] - s) / d;
        let (near, far) = if d > 0.0 { (t_lo, t_hi) } else { (t_hi, t_lo) };

        if near > enter {
            enter = near;
            hit_axis = axis;
        }
        exit = exit.min(far);
    }

    if enter >= exit || enter > 1.0 || exit <= 0.0 {
        return BoxSweep::Miss;
    }

    let d = delta[hit_axis];
    let mut normal = Vec3::ZERO;
    normal[hit_axis] = if d > 0.0 { -1.0 } else { 1.0 };

    BoxSweep::Hit {
        fraction: (enter - DIST_EPSILON / d.abs()).max(0.0),
        normal,
    }
}
