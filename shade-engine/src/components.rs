//! Authored content for a room: who stands where and where the save
//! points are.
//!
//! In a full engine integration these would come from the level files. The
//! structs are `serde` so a scenario can also be loaded from TOML.

use serde::{Deserialize, Serialize};
use shade_core::types::{Act, Room, Transform, Vec3};

use crate::checkpoints::SavePoint;

/// A guard to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardSpawn {
    /// Spawn position.
    pub position: Vec3,
    /// Facing at spawn.
    #[serde(default = "default_forward")]
    pub forward: Vec3,
    /// Patrol loop, in order.
    #[serde(default)]
    pub waypoints: Vec<Vec3>,
    /// Act whose caught counter this guard bumps.
    #[serde(default)]
    pub act: Option<Act>,
}

/// A pickpocketable townsperson to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BystanderSpawn {
    /// Position.
    pub position: Vec3,
    /// Gold carried; the configured default when absent.
    #[serde(default)]
    pub gold: Option<i32>,
}

/// Everything placed in one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldContent {
    /// Which room this is.
    pub room: Room,
    /// Guards.
    #[serde(default)]
    pub guards: Vec<GuardSpawn>,
    /// Bystanders.
    #[serde(default)]
    pub bystanders: Vec<BystanderSpawn>,
    /// Save points, in firing order.
    #[serde(default)]
    pub save_points: Vec<SavePoint>,
}

fn default_forward() -> Vec3 {
    Vec3::FORWARD
}

impl WorldContent {
    /// An empty room.
    #[must_use]
    pub fn empty(room: Room) -> Self {
        Self {
            room,
            guards: Vec::new(),
            bystanders: Vec::new(),
            save_points: Vec::new(),
        }
    }

    /// A small main-scene courtyard: the thief, two patrolling guards, a
    /// bystander and two save points.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            room: Room::MainScene,
            guards: vec![
                GuardSpawn {
                    position: Vec3::new(0.0, 0.0, 20.0),
                    forward: -Vec3::FORWARD,
                    waypoints: vec![Vec3::new(0.0, 0.0, 20.0), Vec3::new(-10.0, 0.0, 20.0)],
                    act: Some(Act::One),
                },
                GuardSpawn {
                    position: Vec3::new(15.0, 0.0, 30.0),
                    forward: Vec3::new(-1.0, 0.0, 0.0),
                    waypoints: vec![Vec3::new(15.0, 0.0, 30.0), Vec3::new(15.0, 0.0, 40.0)],
                    act: Some(Act::Two),
                },
                GuardSpawn {
                    position: Vec3::new(-20.0, 0.0, 45.0),
                    forward: Vec3::new(1.0, 0.0, 0.0),
                    waypoints: Vec::new(),
                    act: Some(Act::Three),
                },
            ],
            bystanders: vec![BystanderSpawn {
                position: Vec3::new(4.0, 0.0, 8.0),
                gold: None,
            }],
            save_points: vec![
                SavePoint {
                    index: 0,
                    transform: Transform::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO),
                },
                SavePoint {
                    index: 1,
                    transform: Transform::new(Vec3::new(0.0, 0.0, 35.0), Vec3::ZERO),
                },
            ],
        }
    }
}
