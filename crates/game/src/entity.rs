//! Simulated entities and their callbacks.

use std::fmt;

use glam::Vec3;
use hullrun_physics::{EntityId, KineticState, MoverBrush, TickContext};

/// Game logic attached to an entity.
///
/// Every callback defaults to doing nothing, so a behavior only implements
/// what it reacts to.
pub trait Behavior: fmt::Debug {
    /// Scheduled callback, run once `me.next_think` comes due and before
    /// anything moves that tick. Set `me.next_think` again to keep thinking.
    fn think(&mut self, me: &mut Entity, ctx: &TickContext) {
        let _ = (me, ctx);
    }

    /// Something made contact with `me`, or came close enough to a brush
    /// entity to count as touching it.
    fn touch(&mut self, me: &mut Entity, other: EntityId, ctx: &TickContext) {
        let _ = (me, other, ctx);
    }

    /// `user` activated `me` directly.
    fn use_by(&mut self, me: &mut Entity, user: EntityId, ctx: &TickContext) {
        let _ = (me, user, ctx);
    }
}

/// An entity in the world.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Assigned by the simulation when spawned.
    pub id: EntityId,

    pub classname: String,

    pub kinetic: KineticState,

    /// Game time of the next think, if one is scheduled.
    pub next_think: Option<f64>,

    /// The hull is solid brush geometry that other entities collide with.
    pub brush: bool,
}

impl Entity {
    pub fn new(classname: &str, kinetic: KineticState) -> Self {
        Self {
            id: EntityId::WORLD,
            classname: classname.to_string(),
            kinetic,
            next_think: None,
            brush: false,
        }
    }

    /// Make the entity's hull solid to everything else.
    pub fn as_brush(mut self) -> Self {
        self.brush = true;
        self
    }

    /// Schedule the first think.
    pub fn thinking_at(mut self, time: f64) -> Self {
        self.next_think = Some(time);
        self
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.kinetic.position
    }

    /// Whether a think is due at `time`.
    #[inline]
    pub fn think_due(&self, time: f64) -> bool {
        self.next_think.is_some_and(|t| t <= time)
    }

    /// Collision bounds in world space, if this is a brush entity.
    pub fn mover_brush(&self) -> Option<MoverBrush> {
        self.brush.then(|| {
            let k = &self.kinetic;
            MoverBrush::new(self.id, k.position + k.hull.mins, k.position + k.hull.maxs)
        })
    }
}

/// Slot in the simulation's entity table.
#[derive(Debug)]
pub(crate) struct EntitySlot {
    pub entity: Entity,
    pub behavior: Option<Box<dyn Behavior>>,
}

impl EntitySlot {
    pub fn think(&mut self, ctx: &TickContext) {
        if !self.entity.think_due(ctx.time) {
            return;
        }
        self.entity.next_think = None;
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.think(&mut self.entity, ctx);
        }
    }

    pub fn touch(&mut self, other: EntityId, ctx: &TickContext) {
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.touch(&mut self.entity, other, ctx);
        }
    }

    pub fn use_by(&mut self, user: EntityId, ctx: &TickContext) {
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.use_by(&mut self.entity, user, ctx);
        }
    }
}
