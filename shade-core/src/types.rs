//! Core type definitions shared by the ledger, guards and engine layer.
//!
//! Content indices (doors, tasks, checkpoints, ...) are typed so that an
//! out-of-range index can only enter the system through the checked
//! `TryFrom<usize>` conversions used when loading content.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ShadeError;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a guard instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GuardId(pub Uuid);

impl GuardId {
    /// Create a new random guard ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GuardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GuardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A 3D vector used for positions, directions and euler rotations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate (up).
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// World up.
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    /// World forward (+Z).
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);

    /// Create a vector from components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for a degenerate vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < f32::EPSILON {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Unsigned angle between two vectors in degrees (0 to 180).
    ///
    /// Returns 0.0 when either vector is degenerate.
    #[must_use]
    pub fn angle_to(self, other: Self) -> f32 {
        let denom = self.length() * other.length();
        if denom < f32::EPSILON {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Move `self` toward `target` by at most `max_step`.
    #[must_use]
    pub fn move_towards(self, target: Self, max_step: f32) -> Self {
        let delta = target - self;
        let dist = delta.length();
        if dist <= max_step || dist < f32::EPSILON {
            target
        } else {
            self + delta * (max_step / dist)
        }
    }

    /// Linear interpolation, `t` clamped to [0, 1].
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        self + (other - self) * t
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// A location plus euler rotation (degrees), as saved per room.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// World position.
    pub location: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
}

impl Transform {
    /// Create a transform.
    #[must_use]
    pub const fn new(location: Vec3, rotation: Vec3) -> Self {
        Self { location, rotation }
    }
}

// ---------------------------------------------------------------------------
// Content indices
// ---------------------------------------------------------------------------

macro_rules! content_index {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every value, in index order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];
            /// Number of values.
            pub const COUNT: usize = Self::ALL.len();

            /// Position of this value in ledger arrays.
            #[must_use]
            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = ShadeError;

            fn try_from(index: usize) -> Result<Self, Self::Error> {
                Self::ALL.get(index).copied().ok_or(ShadeError::IndexOutOfRange {
                    kind: $kind,
                    index,
                    len: Self::COUNT,
                })
            }
        }
    };
}

content_index! {
    /// A loadable room. The engine's scene index is `index + 1`; scene 0 is
    /// the main menu.
    Room, "room" {
        /// The king's meeting room (opening scene).
        MeetingRoom,
        /// The overworld with both castles.
        MainScene,
        /// The undead queen's throne room.
        ThroneRoom,
    }
}

impl Room {
    /// Engine scene index for this room.
    #[must_use]
    pub fn scene_index(self) -> usize {
        self.index() + 1
    }
}

content_index! {
    /// A door or gate whose open state persists across room loads.
    Door, "door" {
        /// Door out of the meeting room.
        MeetingRoomDoor,
        /// Human castle door (paired with the meeting room door).
        HumanCastleDoor,
        /// Human castle portcullis.
        HumanCastleGate,
        /// Entrance to the undead castle.
        UndeadCastleDoor,
        /// Throne room door (paired with the undead castle door).
        ThroneRoomDoor,
    }
}

content_index! {
    /// A scripted NPC interaction.
    Interaction, "interaction" {
        /// The king sets the pickpocketing test.
        KingSetsTestTask,
        /// Gold handed to the king; the main task is set.
        KingSetsMainTask,
        /// The undead queen asks for help.
        QueenAsksForHelp,
        /// The undead queen confronts the player.
        QueenConfrontsPlayer,
    }
}

content_index! {
    /// A quest task.
    Task, "task" {
        /// Pickpocket the thief.
        RobThief,
        /// Retrieve the crystal.
        RetrieveCrystal,
        /// Visit the wizard.
        VisitWizard,
    }
}

content_index! {
    /// A binary story choice.
    Choice, "choice" {
        /// Give all gold to the king (`true`) or keep half (`false`).
        GiveAllGold,
        /// Help the undead queen (`true`) or leave her (`false`).
        HelpUndeadQueen,
    }
}

content_index! {
    /// Story act, used to key caught counters.
    Act, "act" {
        /// Act one: the thief in the human kingdom.
        One,
        /// Act two: roaming thieves.
        Two,
        /// Act three: undead guards.
        Three,
    }
}

/// Number of checkpoints in the main scene route.
pub const CHECKPOINT_COUNT: usize = 18;

/// Index of a checkpoint along the main scene route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckpointId(usize);

impl CheckpointId {
    /// Checked constructor.
    ///
    /// # Errors
    /// Returns [`ShadeError::IndexOutOfRange`] when `index >= CHECKPOINT_COUNT`.
    pub fn new(index: usize) -> crate::error::Result<Self> {
        if index < CHECKPOINT_COUNT {
            Ok(Self(index))
        } else {
            Err(ShadeError::IndexOutOfRange {
                kind: "checkpoint",
                index,
                len: CHECKPOINT_COUNT,
            })
        }
    }

    /// Unchecked constructor for content tables authored in code.
    ///
    /// An out-of-range id is a content bug; the ledger panics when it is used.
    #[must_use]
    pub const fn from_raw(index: usize) -> Self {
        Self(index)
    }

    /// Position in ledger arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "checkpoint#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_between_perpendicular_vectors() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 0.0, 1.0);
        assert!((a.angle_to(b) - 90.0).abs() < 0.01);
        assert!(a.angle_to(a).abs() < 0.01);
        assert!((a.angle_to(-a) - 180.0).abs() < 0.01);
    }

    #[test]
    fn degenerate_angle_is_zero() {
        assert_eq!(Vec3::ZERO.angle_to(Vec3::FORWARD), 0.0);
    }

    #[test]
    fn move_towards_does_not_overshoot() {
        let from = Vec3::ZERO;
        let to = Vec3::new(3.0, 0.0, 4.0);
        let step = from.move_towards(to, 2.5);
        assert!((step.length() - 2.5).abs() < 0.001);
        assert_eq!(from.move_towards(to, 10.0), to);
    }

    #[test]
    fn content_index_round_trips_and_rejects_overflow() {
        assert_eq!(Door::try_from(2).ok(), Some(Door::HumanCastleGate));
        assert_eq!(Door::COUNT, 5);
        assert!(matches!(
            Task::try_from(3),
            Err(ShadeError::IndexOutOfRange { kind: "task", index: 3, len: 3 })
        ));
    }

    #[test]
    fn room_scene_index_skips_main_menu() {
        assert_eq!(Room::MeetingRoom.scene_index(), 1);
        assert_eq!(Room::ThroneRoom.scene_index(), 3);
    }

    #[test]
    fn checkpoint_bounds() {
        assert!(CheckpointId::new(17).is_ok());
        assert!(CheckpointId::new(18).is_err());
    }
}
