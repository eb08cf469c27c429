//! Brush entities that move on their own: doors and lifts.
//!
//! Movers are positioned directly by their think callbacks, one step per
//! tick. The simulation carries anything standing on them by the same delta.

use glam::Vec3;
use hullrun_physics::{EntityId, TickContext};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::entity::{Behavior, Entity};

/// Step `current` towards `target` by at most `max_step`; true once arrived.
fn move_toward(current: Vec3, target: Vec3, max_step: f32) -> (Vec3, bool) {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_step {
        (target, true)
    } else {
        (current + delta / distance * max_step, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorPhase {
    Closed,
    Opening,
    Open,
    Closing,
}

/// A door that slides open when touched or used, waits, then closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Door {
    pub closed: Vec3,
    pub open: Vec3,
    /// Units per second.
    pub speed: f32,
    /// Seconds spent open before closing.
    pub wait: f32,
    pub phase: DoorPhase,
}

impl Door {
    pub fn new(closed: Vec3, open_offset: Vec3, speed: f32, wait: f32) -> Self {
        Self {
            closed,
            open: closed + open_offset,
            speed,
            wait,
            phase: DoorPhase::Closed,
        }
    }

    fn activate(&mut self, me: &mut Entity, by: EntityId, ctx: &TickContext) {
        match self.phase {
            DoorPhase::Closed | DoorPhase::Closing => {
                debug!("{} {} opened by {}", me.classname, me.id, by);
                self.phase = DoorPhase::Opening;
                me.next_think = Some(ctx.time);
            }
            // Hold the door while someone is still around.
            DoorPhase::Open => me.next_think = Some(ctx.time + f64::from(self.wait)),
            DoorPhase::Opening => {}
        }
    }
}

impl Behavior for Door {
    fn think(&mut self, me: &mut Entity, ctx: &TickContext) {
        if self.phase == DoorPhase::Open {
            self.phase = DoorPhase::Closing;
        }

        let target = match self.phase {
            DoorPhase::Opening => self.open,
            DoorPhase::Closing => self.closed,
            DoorPhase::Closed | DoorPhase::Open => return,
        };

        let (position, arrived) = move_toward(me.kinetic.position, target, self.speed * ctx.delta_time);
        me.kinetic.position = position;

        if !arrived {
            me.next_think = Some(ctx.time + f64::from(ctx.delta_time));
        } else if self.phase == DoorPhase::Opening {
            self.phase = DoorPhase::Open;
            me.next_think = Some(ctx.time + f64::from(self.wait));
        } else {
            self.phase = DoorPhase::Closed;
        }
    }

    fn touch(&mut self, me: &mut Entity, other: EntityId, ctx: &TickContext) {
        self.activate(me, other, ctx);
    }

    fn use_by(&mut self, me: &mut Entity, user: EntityId, ctx: &TickContext) {
        self.activate(me, user, ctx);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiftPhase {
    Rising,
    Top,
    Falling,
    Bottom,
}

/// A platform that shuttles between two heights forever, pausing at each end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lift {
    pub bottom: Vec3,
    pub top: Vec3,
    pub speed: f32,
    pub wait: f32,
    pub phase: LiftPhase,
}

impl Lift {
    pub fn new(bottom: Vec3, travel: f32, speed: f32, wait: f32) -> Self {
        Self {
            bottom,
            top: bottom + Vec3::new(0.0, 0.0, travel),
            speed,
            wait,
            phase: LiftPhase::Bottom,
        }
    }
}

impl Behavior for Lift {
    fn think(&mut self, me: &mut Entity, ctx: &TickContext) {
        self.phase = match self.phase {
            LiftPhase::Bottom => LiftPhase::Rising,
            LiftPhase::Top => LiftPhase::Falling,
            moving => moving,
        };

        let target = if self.phase == LiftPhase::Rising {
            self.top
        } else {
            self.bottom
        };

        let (position, arrived) = move_toward(me.kinetic.position, target, self.speed * ctx.delta_time);
        me.kinetic.position = position;

        if arrived {
            self.phase = if self.phase == LiftPhase::Rising {
                LiftPhase::Top
            } else {
                LiftPhase::Bottom
            };
            me.next_think = Some(ctx.time + f64::from(self.wait));
        } else {
            me.next_think = Some(ctx.time + f64::from(ctx.delta_time));
        }
    }
}
