//! Guided-route checkpoints and one-shot save points.

use serde::{Deserialize, Serialize};
use shade_core::collab::{AudioSink, Cue, ObjectRef, SceneLoader};
use shade_core::types::{CheckpointId, Door, Room, Transform, CHECKPOINT_COUNT};
use shade_core::ProgressionLedger;
use tracing::{debug, info};

use crate::doors::DoorController;

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// What happens when the last checkpoint of a route is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEnd {
    /// Arrived back in the human kingdom: the player comments on it.
    Kingdom,
    /// Arrived at the undead castle: its door opens.
    Castle,
}

/// One checkpoint in a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteNode {
    /// This checkpoint.
    pub id: CheckpointId,
    /// Checkpoint to activate once this one is reached.
    pub next: Option<CheckpointId>,
    /// Set on the final checkpoint of a route.
    pub end: Option<RouteEnd>,
}

/// What entering a checkpoint did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointOutcome {
    /// Not active, or already reached.
    Ignored,
    /// Reached; the next checkpoint is now active.
    Advanced(CheckpointId),
    /// Reached the end of a route.
    Finished(RouteEnd),
}

/// The main scene's checkpoint graph.
#[derive(Debug, Clone)]
pub struct CheckpointRoute {
    nodes: Vec<RouteNode>,
}

impl CheckpointRoute {
    /// Route from explicit nodes, one per checkpoint id.
    #[must_use]
    pub fn new(nodes: Vec<RouteNode>) -> Self {
        Self { nodes }
    }

    /// The authored main scene: checkpoints 0..=8 lead back to the kingdom,
    /// 9..=17 lead to the undead castle.
    #[must_use]
    pub fn main_scene() -> Self {
        const KINGDOM_END: usize = 8;
        let nodes = (0..CHECKPOINT_COUNT)
            .map(|i| {
                let end = match i {
                    KINGDOM_END => Some(RouteEnd::Kingdom),
                    i if i == CHECKPOINT_COUNT - 1 => Some(RouteEnd::Castle),
                    _ => None,
                };
                RouteNode {
                    id: CheckpointId::from_raw(i),
                    next: end.is_none().then_some(CheckpointId::from_raw(i + 1)),
                    end,
                }
            })
            .collect();
        Self { nodes }
    }

    /// Checkpoints in the route.
    #[must_use]
    pub fn nodes(&self) -> &[RouteNode] {
        &self.nodes
    }

    fn node(&self, id: CheckpointId) -> Option<&RouteNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Make `id` the live checkpoint.
    pub fn activate(&self, id: CheckpointId, ledger: &mut ProgressionLedger, scene: &mut dyn SceneLoader) {
        scene.set_active(ObjectRef::Checkpoint(id.index()), true);
        ledger.activate_checkpoint(id);
        debug!(checkpoint = %id, "Checkpoint activated");
    }

    /// The player walked into checkpoint `id`.
    pub fn enter(
        &self,
        id: CheckpointId,
        ledger: &mut ProgressionLedger,
        scene: &mut dyn SceneLoader,
        audio: &mut dyn AudioSink,
        doors: &mut DoorController,
    ) -> CheckpointOutcome {
        let Some(node) = self.node(id).copied() else {
            debug!(checkpoint = %id, "Checkpoint not on route");
            return CheckpointOutcome::Ignored;
        };
        if !ledger.is_checkpoint_activated(id) || ledger.is_checkpoint_reached(id) {
            return CheckpointOutcome::Ignored;
        }

        scene.set_active(ObjectRef::Checkpoint(id.index()), false);
        ledger.reach_checkpoint(id);
        audio.play_one_shot(Cue::Checkpoint);

        match (node.end, node.next) {
            (Some(RouteEnd::Kingdom), _) => {
                audio.play_one_shot(Cue::PlayerSpeech);
                info!(checkpoint = %id, "Kingdom route finished");
                CheckpointOutcome::Finished(RouteEnd::Kingdom)
            }
            (Some(RouteEnd::Castle), _) => {
                doors.open(Door::UndeadCastleDoor, ledger, scene, audio);
                info!(checkpoint = %id, "Castle route finished");
                CheckpointOutcome::Finished(RouteEnd::Castle)
            }
            (None, Some(next)) => {
                self.activate(next, ledger, scene);
                CheckpointOutcome::Advanced(next)
            }
            (None, None) => CheckpointOutcome::Ignored,
        }
    }

    /// Show every checkpoint that was activated but not yet reached.
    pub fn on_room_loaded(&self, room: Room, ledger: &ProgressionLedger, scene: &mut dyn SceneLoader) {
        if room != Room::MainScene {
            return;
        }
        for node in &self.nodes {
            let pending = ledger.is_checkpoint_activated(node.id) && !ledger.is_checkpoint_reached(node.id);
            scene.set_active(ObjectRef::Checkpoint(node.id.index()), pending);
        }
    }
}

// ---------------------------------------------------------------------------
// Save points
// ---------------------------------------------------------------------------

/// A trigger that saves the game the first time the player passes it, in
/// authored order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavePoint {
    /// Order in which save points fire.
    pub index: u32,
    /// Where the player respawns after a restore.
    pub transform: Transform,
}

impl SavePoint {
    /// Save if this is the next save point due. Returns whether it fired.
    pub fn enter(&self, ledger: &mut ProgressionLedger) -> bool {
        if ledger.next_save() != self.index {
            return false;
        }
        ledger.save_game_at(self.transform);
        ledger.increment_next_save();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{RecordingAudio, RecordingScene};
    use shade_core::config::DoorsConfig;
    use shade_core::types::Vec3;

    fn id(i: usize) -> CheckpointId {
        CheckpointId::from_raw(i)
    }

    #[test]
    fn main_scene_has_two_ends() {
        let route = CheckpointRoute::main_scene();
        assert_eq!(route.nodes().len(), CHECKPOINT_COUNT);
        assert_eq!(route.nodes()[8].end, Some(RouteEnd::Kingdom));
        assert_eq!(route.nodes()[8].next, None);
        assert_eq!(route.nodes()[17].end, Some(RouteEnd::Castle));
        assert_eq!(route.nodes()[3].next, Some(id(4)));
    }

    #[test]
    fn inactive_checkpoint_is_ignored() {
        let route = CheckpointRoute::main_scene();
        let mut ledger = ProgressionLedger::new();
        let mut scene = RecordingScene::default();
        let mut audio = RecordingAudio::default();
        let mut doors = DoorController::new(DoorsConfig::default());
        let outcome = route.enter(id(0), &mut ledger, &mut scene, &mut audio, &mut doors);
        assert_eq!(outcome, CheckpointOutcome::Ignored);
        assert!(audio.cues.is_empty());
    }

    #[test]
    fn entering_advances_and_reaching_twice_is_ignored() {
        let route = CheckpointRoute::main_scene();
        let mut ledger = ProgressionLedger::new();
        let mut scene = RecordingScene::default();
        let mut audio = RecordingAudio::default();
        let mut doors = DoorController::new(DoorsConfig::default());
        route.activate(id(0), &mut ledger, &mut scene);

        let outcome = route.enter(id(0), &mut ledger, &mut scene, &mut audio, &mut doors);
        assert_eq!(outcome, CheckpointOutcome::Advanced(id(1)));
        assert!(ledger.is_checkpoint_reached(id(0)));
        assert!(ledger.is_checkpoint_activated(id(1)));
        assert!(!scene.is_active(ObjectRef::Checkpoint(0)));
        assert!(scene.is_active(ObjectRef::Checkpoint(1)));

        let again = route.enter(id(0), &mut ledger, &mut scene, &mut audio, &mut doors);
        assert_eq!(again, CheckpointOutcome::Ignored);
        assert_eq!(audio.count(Cue::Checkpoint), 1);
    }

    #[test]
    fn castle_end_opens_undead_door() {
        let route = CheckpointRoute::main_scene();
        let mut ledger = ProgressionLedger::new();
        let mut scene = RecordingScene::default();
        let mut audio = RecordingAudio::default();
        let mut doors = DoorController::new(DoorsConfig::default());
        route.activate(id(17), &mut ledger, &mut scene);
        let outcome = route.enter(id(17), &mut ledger, &mut scene, &mut audio, &mut doors);
        assert_eq!(outcome, CheckpointOutcome::Finished(RouteEnd::Castle));
        assert!(ledger.is_door_open(Door::UndeadCastleDoor));
        assert!(ledger.is_door_open(Door::ThroneRoomDoor));
    }

    #[test]
    fn kingdom_end_plays_speech() {
        let route = CheckpointRoute::main_scene();
        let mut ledger = ProgressionLedger::new();
        let mut scene = RecordingScene::default();
        let mut audio = RecordingAudio::default();
        let mut doors = DoorController::new(DoorsConfig::default());
        route.activate(id(8), &mut ledger, &mut scene);
        route.enter(id(8), &mut ledger, &mut scene, &mut audio, &mut doors);
        assert_eq!(audio.cues, vec![Cue::Checkpoint, Cue::PlayerSpeech]);
    }

    #[test]
    fn room_load_reshows_pending_checkpoints_in_main_scene_only() {
        let route = CheckpointRoute::main_scene();
        let mut ledger = ProgressionLedger::new();
        ledger.activate_checkpoint(id(2));
        ledger.activate_checkpoint(id(3));
        ledger.reach_checkpoint(id(2));

        let mut scene = RecordingScene::default();
        route.on_room_loaded(Room::ThroneRoom, &ledger, &mut scene);
        assert!(scene.active.is_empty());

        route.on_room_loaded(Room::MainScene, &ledger, &mut scene);
        assert!(scene.is_active(ObjectRef::Checkpoint(3)));
        assert!(!scene.is_active(ObjectRef::Checkpoint(2)));
    }

    #[test]
    fn save_points_fire_in_order() {
        let mut ledger = ProgressionLedger::new();
        let first = SavePoint { index: 0, transform: Transform::new(Vec3::new(1.0, 0.0, 1.0), Vec3::ZERO) };
        let second = SavePoint { index: 1, transform: Transform::new(Vec3::new(2.0, 0.0, 2.0), Vec3::ZERO) };

        assert!(!second.enter(&mut ledger));
        assert!(first.enter(&mut ledger));
        assert!(!first.enter(&mut ledger));
        assert_eq!(ledger.next_save(), 1);
        assert!(second.enter(&mut ledger));
        assert_eq!(ledger.next_save(), 2);
    }
}
