//! Integration tests: a session driven through hooks and world ticks with the
//! headless backends.

use shade_core::collab::{Collaborators, Cue, ObjectRef};
use shade_core::spell::SpellKind;
use shade_core::types::{Act, CheckpointId, Door, Room, Task, Transform, Vec3};
use shade_core::{GuardState, ShadeConfig};
use shade_engine::checkpoints::SavePoint;
use shade_engine::components::{GuardSpawn, WorldContent};
use shade_engine::headless::{
    OpenField, RecordingAudio, RecordingPresentation, RecordingScene, ScriptedTarget,
};
use shade_engine::hooks;
use shade_engine::session::GameSession;
use shade_engine::systems::WorldTick;

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

struct Host {
    scene: RecordingScene,
    audio: RecordingAudio,
    ui: RecordingPresentation,
    field: OpenField,
    player: ScriptedTarget,
}

impl Host {
    fn at(position: Vec3) -> Self {
        let mut field = OpenField::new(Vec3::new(-50.0, 0.0, -50.0), Vec3::new(50.0, 0.0, 50.0));
        field.set_target(position);
        Self {
            scene: RecordingScene::default(),
            audio: RecordingAudio::default(),
            ui: RecordingPresentation::default(),
            field,
            player: ScriptedTarget::new(position, Vec::new(), 0.0),
        }
    }

    fn teleport(&mut self, position: Vec3) {
        self.player.place(position, Vec3::FORWARD);
        self.field.set_target(position);
    }

    fn collab(&mut self) -> Collaborators<'_> {
        Collaborators {
            scene: &mut self.scene,
            audio: &mut self.audio,
            target: &self.player,
            space: &self.field,
            presentation: &mut self.ui,
        }
    }
}

fn run_until_restored(session: &mut GameSession, host: &mut Host, max_ticks: u32) -> (u32, bool) {
    let mut catches = 0;
    for _ in 0..max_ticks {
        let WorldTick { caught, restored } = session.tick(0.5, &mut host.collab());
        catches += u32::from(caught);
        if restored {
            return (catches, true);
        }
    }
    (catches, false)
}

fn sentry_room() -> WorldContent {
    WorldContent {
        guards: vec![GuardSpawn {
            position: Vec3::new(0.0, 0.0, 20.0),
            forward: -Vec3::FORWARD,
            waypoints: Vec::new(),
            act: Some(Act::Three),
        }],
        save_points: vec![SavePoint {
            index: 0,
            transform: Transform::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 180.0, 0.0)),
        }],
        ..WorldContent::empty(Room::MainScene)
    }
}

// ---------------------------------------------------------------------------
// Save and catch
// ---------------------------------------------------------------------------

#[test]
fn caught_player_respawns_at_last_save_point() {
    let mut session = GameSession::start(ShadeConfig::default(), &sentry_room());
    let mut host = Host::at(Vec3::new(0.0, 0.0, 5.0));
    session.load_room(&mut host.scene);

    session
        .handle_event(hooks::on_save_point_entered(0), &mut host.collab())
        .expect("save point");
    assert_eq!(session.ledger().next_save(), 1);

    session.ledger_mut().add_player_gold(40);
    host.teleport(Vec3::new(0.0, 0.0, 15.0));

    let (catches, restored) = run_until_restored(&mut session, &mut host, 40);
    assert_eq!(catches, 1);
    assert!(restored);

    let ledger = session.ledger();
    assert_eq!(ledger.player_gold(), 0);
    assert_eq!(ledger.location(), Vec3::new(0.0, 0.0, 5.0));
    assert_eq!(ledger.rotation(), Vec3::new(0.0, 180.0, 0.0));
    assert_eq!(ledger.next_save(), 1);
    assert_eq!(ledger.act_caught_count(Act::Three), 1);
    assert_eq!(host.scene.reloads, vec![Room::MainScene]);
    assert_eq!(host.ui.caught_message.as_deref(), Some("Caught!"));

    let guard = &session.world().guards()[0];
    assert_eq!(guard.state(), GuardState::Patrolling);
    assert_eq!(guard.position(), Vec3::new(0.0, 0.0, 20.0));
    assert!(!session.world().spotted().is_locked());
}

#[test]
fn guards_saturating_together_each_count_a_catch() {
    let content = WorldContent {
        guards: vec![
            GuardSpawn {
                position: Vec3::new(-1.0, 0.0, 20.0),
                forward: -Vec3::FORWARD,
                waypoints: Vec::new(),
                act: Some(Act::One),
            },
            GuardSpawn {
                position: Vec3::new(1.0, 0.0, 20.0),
                forward: -Vec3::FORWARD,
                waypoints: Vec::new(),
                act: Some(Act::Two),
            },
        ],
        ..WorldContent::empty(Room::MainScene)
    };
    let mut session = GameSession::start(ShadeConfig::default(), &content);
    let mut host = Host::at(Vec3::new(0.0, 0.0, 15.0));
    session.load_room(&mut host.scene);

    let (_, restored) = run_until_restored(&mut session, &mut host, 40);
    assert!(restored);
    assert_eq!(session.ledger().act_caught_count(Act::One), 1);
    assert_eq!(session.ledger().act_caught_count(Act::Two), 1);
    assert_eq!(session.world().counters().snapshot().catches, 2);
    assert_eq!(session.world().counters().snapshot().restores, 1);
}

#[test]
fn player_right_behind_a_guard_is_not_seen() {
    let mut session = GameSession::start(ShadeConfig::default(), &sentry_room());
    let mut host = Host::at(Vec3::new(0.0, 0.0, 20.3));
    session.load_room(&mut host.scene);

    let (catches, restored) = run_until_restored(&mut session, &mut host, 20);
    assert_eq!((catches, restored), (0, false));
    let guard = &session.world().guards()[0];
    assert_eq!(guard.current_detection(), 0.0);
    assert_eq!(guard.state(), GuardState::Patrolling);
}

#[test]
fn save_points_fire_in_order_only() {
    let content = WorldContent::demo();
    let mut session = GameSession::start(ShadeConfig::default(), &content);
    let mut host = Host::at(Vec3::ZERO);

    session
        .handle_event(hooks::on_save_point_entered(1), &mut host.collab())
        .expect("known save point");
    assert_eq!(session.ledger().next_save(), 0);

    for index in [0, 0, 1] {
        session
            .handle_event(hooks::on_save_point_entered(index), &mut host.collab())
            .expect("known save point");
    }
    assert_eq!(session.ledger().next_save(), 2);
    assert_eq!(session.world().counters().snapshot().saves, 2);
}

// ---------------------------------------------------------------------------
// Checkpoints and doors
// ---------------------------------------------------------------------------

#[test]
fn walking_the_castle_route_opens_the_undead_door() {
    let mut session = GameSession::start(ShadeConfig::default(), &WorldContent::empty(Room::MainScene));
    let mut host = Host::at(Vec3::ZERO);

    {
        let world = session.world();
        let route = world.route().clone();
        route.activate(CheckpointId::from_raw(9), session.ledger_mut(), &mut host.scene);
    }
    for index in 9..18 {
        session
            .handle_event(hooks::on_checkpoint_entered(index).expect("index"), &mut host.collab())
            .expect("checkpoint");
    }

    let ledger = session.ledger();
    assert!((9..18).all(|i| ledger.is_checkpoint_reached(CheckpointId::from_raw(i))));
    assert!(ledger.is_door_open(Door::UndeadCastleDoor));
    assert!(ledger.is_door_open(Door::ThroneRoomDoor));
    assert_eq!(host.audio.count(Cue::Checkpoint), 9);
    assert!(host.scene.is_active(ObjectRef::Door(Door::UndeadCastleDoor)));
}

#[test]
fn out_of_order_checkpoint_is_ignored() {
    let mut session = GameSession::start(ShadeConfig::default(), &WorldContent::empty(Room::MainScene));
    let mut host = Host::at(Vec3::ZERO);
    session
        .handle_event(hooks::on_checkpoint_entered(4).expect("index"), &mut host.collab())
        .expect("checkpoint");
    assert!(!session.ledger().is_checkpoint_reached(CheckpointId::from_raw(4)));
    assert!(host.audio.cues.is_empty());
}

#[test]
fn door_commands_respect_pairing() {
    let mut session = GameSession::start(ShadeConfig::default(), &WorldContent::empty(Room::MeetingRoom));
    let mut host = Host::at(Vec3::ZERO);

    session
        .handle_event(hooks::on_door_open(0).expect("index"), &mut host.collab())
        .expect("door");
    assert!(session.ledger().is_door_open(Door::HumanCastleDoor));

    session
        .handle_event(hooks::on_door_close(1).expect("index"), &mut host.collab())
        .expect("door");
    assert!(!session.ledger().is_door_open(Door::MeetingRoomDoor));
    assert_eq!(host.audio.count(Cue::DoorOpen), 1);
    assert_eq!(host.audio.count(Cue::DoorClose), 1);
}

#[test]
fn room_transition_reapplies_saved_door_state() {
    let mut session = GameSession::start(ShadeConfig::default(), &WorldContent::empty(Room::MainScene));
    let mut host = Host::at(Vec3::ZERO);
    session
        .handle_event(hooks::on_door_open(2).expect("index"), &mut host.collab())
        .expect("gate");
    session.tick(1.0, &mut host.collab());
    assert!(session.world().doors().is_moving(Door::HumanCastleGate));

    session
        .handle_event(hooks::on_room_entered(1).expect("index"), &mut host.collab())
        .expect("room");
    assert!(!session.world().doors().is_moving(Door::HumanCastleGate));
    assert!((session.world().doors().gate_height() - 4.7).abs() < 1e-4);
}

// ---------------------------------------------------------------------------
// Spells and interaction
// ---------------------------------------------------------------------------

#[test]
fn invisibility_keeps_detection_empty_until_it_ends() {
    let mut session = GameSession::start(ShadeConfig::default(), &sentry_room());
    let mut host = Host::at(Vec3::new(0.0, 0.0, 15.0));
    session.ledger_mut().add_player_gold(10);

    session
        .handle_event(hooks::on_spell_purchase(SpellKind::Invisibility), &mut host.collab())
        .expect("buy");
    assert_eq!(session.ledger().player_gold(), 0);
    session
        .handle_event(hooks::on_spell_key(SpellKind::Invisibility), &mut host.collab())
        .expect("cast");

    for _ in 0..9 {
        session.tick(0.5, &mut host.collab());
        assert_eq!(session.world().guards()[0].current_detection(), 0.0);
    }
    session.tick(0.5, &mut host.collab());
    session.tick(0.5, &mut host.collab());
    assert!(session.world().guards()[0].current_detection() > 0.0);
}

#[test]
fn thief_pickpocket_completes_the_robbery() {
    let content = WorldContent {
        guards: vec![GuardSpawn {
            position: Vec3::new(0.0, 0.0, 3.0),
            forward: Vec3::FORWARD,
            waypoints: Vec::new(),
            act: Some(Act::One),
        }],
        ..WorldContent::empty(Room::MainScene)
    };
    let config = ShadeConfig::default();
    let mut session = GameSession::start(config.clone(), &content);
    session.ledger_mut().begin_task(Task::RobThief);
    let mut host = Host::at(Vec3::ZERO);

    let mut prompt = None;
    for _ in 0..4 {
        prompt = session.update_interaction(0.5, true, &mut host.collab());
    }
    assert_eq!(session.ledger().player_gold(), config.guard.gold_amount);
    assert!(session.ledger().is_task_complete(Task::RobThief));
    assert_eq!(prompt.as_deref(), Some("Hold E to Pickpocket (0%)"));

    let prompt = session.update_interaction(0.5, true, &mut host.collab());
    assert_eq!(prompt.as_deref(), Some("Cannot Pickpocket"));
}
