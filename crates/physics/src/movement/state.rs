//! Movement state and input structures.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{Contents, EntityId, Hull};

/// How an entity is moved each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveType {
    /// Not simulated.
    #[default]
    None,
    /// Player-style walking with step climbing.
    Walk,
    /// Monster stepping: gravity in the air, friction on the ground.
    Step,
    /// Thrown object that stops where it lands.
    Toss,
    /// No gravity; slides off whatever it hits.
    Fly,
    /// Thrown object that rebounds until it comes to rest.
    Bounce,
}

/// Flags describing an entity's current movement state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFlags(pub u16);

impl EntityFlags {
    /// Airborne from a jump; blocks auto-repeat while the button is held.
    pub const JUMPING: u16 = 1 << 0;

    /// Climbing out of water over a ledge.
    pub const WATER_JUMP: u16 = 1 << 1;

    /// Check if a flag is set.
    #[inline]
    pub fn has(self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set(&mut self, flag: u16, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    #[inline]
    pub fn jumping(self) -> bool {
        self.has(Self::JUMPING)
    }

    #[inline]
    pub fn water_jumping(self) -> bool {
        self.has(Self::WATER_JUMP)
    }
}

/// How deep an entity is submerged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum WaterLevel {
    #[default]
    None = 0,
    Feet = 1,
    Waist = 2,
    Eyes = 3,
}

/// Kinetic state owned by every simulated entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KineticState {
    /// Origin in world space.
    pub position: Vec3,

    /// Velocity in units/second.
    pub velocity: Vec3,

    /// Pitch, yaw and roll in degrees.
    pub angles: Vec3,

    /// Angular velocity in degrees/second (thrown objects only).
    pub angular_velocity: Vec3,

    /// Collision box relative to the origin.
    pub hull: Hull,

    pub move_type: MoveType,

    pub on_ground: bool,

    /// What the entity stands on. `Some` only while `on_ground` is set.
    pub ground_entity: Option<EntityId>,

    /// Normal of the plane stood on.
    pub ground_normal: Vec3,

    pub flags: EntityFlags,

    pub water_level: WaterLevel,

    /// Contents of the deepest liquid sample.
    pub water_type: Contents,
}

impl Default for KineticState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angles: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            hull: Hull::POINT,
            move_type: MoveType::None,
            on_ground: false,
            ground_entity: None,
            ground_normal: Vec3::Z,
            flags: EntityFlags::default(),
            water_level: WaterLevel::None,
            water_type: Contents::EMPTY,
        }
    }
}

impl KineticState {
    /// Create a state at the given position.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder-style hull assignment.
    pub fn with_hull(mut self, hull: Hull) -> Self {
        self.hull = hull;
        self
    }

    /// Builder-style move type assignment.
    pub fn with_move_type(mut self, move_type: MoveType) -> Self {
        self.move_type = move_type;
        self
    }

    /// Record a floor contact.
    pub fn set_ground(&mut self, entity: Option<EntityId>, normal: Vec3) {
        self.on_ground = true;
        self.ground_entity = entity;
        self.ground_normal = normal;
    }

    /// Forget the current floor contact.
    pub fn clear_ground(&mut self) {
        self.on_ground = false;
        self.ground_entity = None;
        self.ground_normal = Vec3::Z;
    }

    /// Clamp every velocity component to `±max`.
    pub fn clamp_velocity(&mut self, max: f32) {
        self.velocity = self.velocity.clamp(Vec3::splat(-max), Vec3::splat(max));
    }

    /// Speed in the horizontal plane.
    #[inline]
    pub fn planar_speed(&self) -> f32 {
        (self.velocity.x * self.velocity.x + self.velocity.y * self.velocity.y).sqrt()
    }

    /// Forward and right vectors from yaw alone.
    pub fn yaw_vectors(&self) -> (Vec3, Vec3) {
        let (forward, right, _) = angle_vectors(Vec3::new(0.0, self.angles.y, 0.0));
        (forward, right)
    }

    /// Forward, right and up vectors from the full view angles.
    pub fn view_vectors(&self) -> (Vec3, Vec3, Vec3) {
        angle_vectors(self.angles)
    }
}

/// Convert pitch/yaw/roll in degrees to forward, right and up vectors.
///
/// Z is up; yaw 0 faces +X and its right vector is -Y.
pub fn angle_vectors(angles: Vec3) -> (Vec3, Vec3, Vec3) {
    let (sp, cp) = angles.x.to_radians().sin_cos();
    let (sy, cy) = angles.y.to_radians().sin_cos();
    let (sr, cr) = angles.z.to_radians().sin_cos();

    let forward = Vec3::new(cp * cy, cp * sy, -sp);
    let right = Vec3::new(
        -sr * sp * cy + cr * sy,
        -sr * sp * sy - cr * cy,
        -sr * cp,
    );
    let up = Vec3::new(
        cr * sp * cy + sr * sy,
        cr * sp * sy - sr * cy,
        cr * cp,
    );

    (forward, right, up)
}

/// Button state flags for player commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandButtons(pub u8);

impl CommandButtons {
    pub const FIRE: u8 = 1 << 0;
    pub const JUMP: u8 = 1 << 1;
    pub const USE: u8 = 1 << 2;

    #[inline]
    pub fn pressed(self, button: u8) -> bool {
        (self.0 & button) != 0
    }

    #[inline]
    pub fn press(&mut self, button: u8) {
        self.0 |= button;
    }

    #[inline]
    pub fn release(&mut self, button: u8) {
        self.0 &= !button;
    }
}

/// Input command from the player for a single tick.
///
/// Axes run from -1.0 to 1.0 and are scaled by the max speed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerCommand {
    /// Positive = forward.
    pub forward_move: f32,

    /// Positive = right.
    pub right_move: f32,

    /// Positive = up (swimming only).
    pub up_move: f32,

    pub buttons: CommandButtons,
}

impl PlayerCommand {
    #[inline]
    pub fn wants_jump(&self) -> bool {
        self.buttons.pressed(CommandButtons::JUMP)
    }

    #[inline]
    pub fn wants_use(&self) -> bool {
        self.buttons.pressed(CommandButtons::USE)
    }

    /// No movement axis is deflected.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.forward_move == 0.0 && self.right_move == 0.0 && self.up_move == 0.0
    }
}

/// Camera values derived from movement. Never fed back into physics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Strafe roll in degrees.
    pub roll: f32,
    /// Vertical bob offset.
    pub bob: f32,
    /// Eye height above the origin including bob.
    pub height: f32,
}

/// Everything the controller keeps for a player between ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub kinetic: KineticState,

    /// Input for the current tick.
    pub command: PlayerCommand,

    /// The jump button was up on the previous tick.
    pub jump_released: bool,

    /// Horizontal direction of an active water jump.
    pub water_jump_dir: Vec3,

    /// Game time at which an active water jump ends.
    pub water_jump_until: f64,

    pub view: ViewState,

    /// Non-world entities the player ran into during the last update.
    pub touched: Vec<EntityId>,
}

impl PlayerState {
    /// A walking player with the standard hull at `position`.
    pub fn new(position: Vec3) -> Self {
        Self {
            kinetic: KineticState::new(position)
                .with_hull(Hull::PLAYER)
                .with_move_type(MoveType::Walk),
            command: PlayerCommand::default(),
            jump_released: true,
            water_jump_dir: Vec3::ZERO,
            water_jump_until: 0.0,
            view: ViewState::default(),
            touched: Vec::new(),
        }
    }
}

/// Per-tick values shared by every entity update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickContext {
    /// Game clock at the start of the tick (seconds).
    pub time: f64,

    /// Tick length (seconds).
    pub delta_time: f32,

    /// Level is over; players are frozen.
    pub intermission: bool,
}

impl TickContext {
    pub fn new(time: f64, delta_time: f32) -> Self {
        Self {
            time,
            delta_time,
            intermission: false,
        }
    }
}
