//! Session lifecycle.
//!
//! A [`GameSession`] is created when the player starts a new game and
//! dropped when they return to the main menu. It owns the one
//! [`ProgressionLedger`] for that play-through; nothing else holds it.

use shade_core::collab::{Collaborators, SceneLoader};
use shade_core::{ProgressionLedger, ShadeConfig};
use tracing::info;

use crate::components::WorldContent;
use crate::events::TriggerEvent;
use crate::systems::{World, WorldTick};

/// One play-through: the ledger plus the loaded room.
pub struct GameSession {
    ledger: ProgressionLedger,
    world: World,
}

impl GameSession {
    /// Start a new game in `content.room`, saving the starting state as the
    /// first restore point.
    #[must_use]
    pub fn start(config: ShadeConfig, content: &WorldContent) -> Self {
        let mut ledger = ProgressionLedger::new();
        ledger.change_room(content.room);
        ledger.save_game();
        info!(room = ?content.room, "Session started");
        Self {
            ledger,
            world: World::new(config, content),
        }
    }

    /// Register the layout spawned when the player enters `content.room`.
    pub fn add_room(&mut self, content: WorldContent) {
        self.world.add_room(content);
    }

    /// Initialise the loaded room from the ledger.
    pub fn load_room(&mut self, scene: &mut dyn SceneLoader) {
        self.world.on_room_loaded(&self.ledger, scene);
    }

    /// Advance the world by `dt` seconds.
    pub fn tick(&mut self, dt: f32, collab: &mut Collaborators<'_>) -> WorldTick {
        let report = self.world.tick(dt, &mut self.ledger, collab);
        self.world.check_budget();
        report
    }

    /// Forward a host trigger to the world.
    ///
    /// # Errors
    /// See [`World::handle_event`].
    pub fn handle_event(&mut self, event: TriggerEvent, collab: &mut Collaborators<'_>) -> shade_core::error::Result<()> {
        self.world.handle_event(event, &mut self.ledger, collab)
    }

    /// Run hold-to-interact for one frame. Returns the prompt to display.
    pub fn update_interaction(&mut self, dt: f32, holding: bool, collab: &mut Collaborators<'_>) -> Option<String> {
        self.world.update_interaction(dt, holding, &mut self.ledger, collab)
    }

    /// The progression ledger.
    #[must_use]
    pub fn ledger(&self) -> &ProgressionLedger {
        &self.ledger
    }

    /// Mutable access for story scripts (dialogue outcomes, quest steps).
    pub fn ledger_mut(&mut self) -> &mut ProgressionLedger {
        &mut self.ledger
    }

    /// The loaded room.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the loaded room.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// End the play-through, handing back the final ledger.
    #[must_use]
    pub fn return_to_main_menu(self) -> ProgressionLedger {
        info!(
            gold = self.ledger.player_gold(),
            alignment = %self.ledger.morality_alignment(),
            "Returning to main menu"
        );
        self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shade_core::types::Room;

    #[test]
    fn start_saves_a_baseline() {
        let session = GameSession::start(ShadeConfig::default(), &WorldContent::demo());
        assert_eq!(session.ledger().current_room(), Room::MainScene);
        assert_eq!(session.ledger().snapshot(), session.ledger().state());
        assert_eq!(session.world().guards().len(), 3);
    }

    #[test]
    fn entering_a_room_swaps_its_actors() {
        use crate::components::GuardSpawn;
        use crate::events::TriggerEvent;
        use crate::headless::{OpenField, RecordingAudio, RecordingPresentation, RecordingScene, ScriptedTarget};
        use shade_core::types::Vec3;

        let mut session = GameSession::start(ShadeConfig::default(), &WorldContent::demo());
        session.add_room(WorldContent {
            guards: vec![GuardSpawn {
                position: Vec3::new(0.0, 0.0, 10.0),
                forward: -Vec3::FORWARD,
                waypoints: Vec::new(),
                act: None,
            }],
            ..WorldContent::empty(Room::ThroneRoom)
        });
        let mut scene = RecordingScene::default();
        let mut audio = RecordingAudio::default();
        let mut ui = RecordingPresentation::default();
        let player = ScriptedTarget::new(Vec3::new(40.0, 0.0, 40.0), Vec::new(), 0.0);
        let field = OpenField::new(Vec3::new(-50.0, 0.0, -50.0), Vec3::new(50.0, 0.0, 50.0));
        let mut collab = Collaborators {
            scene: &mut scene,
            audio: &mut audio,
            target: &player,
            space: &field,
            presentation: &mut ui,
        };

        assert_eq!(session.world().guards().len(), 3);
        session
            .handle_event(TriggerEvent::EnterRoom { room: Room::ThroneRoom }, &mut collab)
            .expect("throne room");
        assert_eq!(session.world().room(), Room::ThroneRoom);
        assert_eq!(session.world().guards().len(), 1);
        assert_eq!(session.world().guards()[0].position(), Vec3::new(0.0, 0.0, 10.0));
        assert!(session.world().bystanders().is_empty());

        session
            .handle_event(TriggerEvent::EnterRoom { room: Room::MeetingRoom }, &mut collab)
            .expect("meeting room");
        assert!(session.world().guards().is_empty());

        session
            .handle_event(TriggerEvent::EnterRoom { room: Room::MainScene }, &mut collab)
            .expect("main scene");
        assert_eq!(session.world().guards().len(), 3);
        assert_eq!(session.world().bystanders().len(), 1);
    }

    #[test]
    fn teardown_returns_the_ledger() {
        let mut session = GameSession::start(ShadeConfig::default(), &WorldContent::empty(Room::MeetingRoom));
        session.ledger_mut().add_player_gold(7);
        let ledger = session.return_to_main_menu();
        assert_eq!(ledger.player_gold(), 7);
    }
}
