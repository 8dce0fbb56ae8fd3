//! Doors, the castle gate, and their persisted open state.
//!
//! Two pairs of doors are the same doorway seen from either side: the
//! meeting room door and the human castle door, and the undead castle door
//! and the throne room door. Opening either side records both as open, and a
//! pair only moves when both sides agree on its current state.

use shade_core::collab::{AudioSink, Cue, ObjectRef, SceneLoader};
use shade_core::config::DoorsConfig;
use shade_core::sequence::SequenceSlot;
use shade_core::types::{Door, Room};
use shade_core::ProgressionLedger;
use tracing::debug;

/// A swing or lift between two openness values.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Motion {
    from: f32,
    to: f32,
}

/// How a door shows that it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorKind {
    /// Swings on a hinge.
    Hinged,
    /// Lifts vertically.
    Gate,
    /// Appears when open, hidden when closed.
    Portal,
}

/// The other side of a paired doorway.
#[must_use]
pub fn partner(door: Door) -> Option<Door> {
    match door {
        Door::MeetingRoomDoor => Some(Door::HumanCastleDoor),
        Door::HumanCastleDoor => Some(Door::MeetingRoomDoor),
        Door::UndeadCastleDoor => Some(Door::ThroneRoomDoor),
        Door::ThroneRoomDoor => Some(Door::UndeadCastleDoor),
        Door::HumanCastleGate => None,
    }
}

/// Room a door is placed in.
#[must_use]
pub fn room_of(door: Door) -> Room {
    match door {
        Door::MeetingRoomDoor => Room::MeetingRoom,
        Door::HumanCastleDoor | Door::HumanCastleGate | Door::UndeadCastleDoor => Room::MainScene,
        Door::ThroneRoomDoor => Room::ThroneRoom,
    }
}

/// How the door animates.
#[must_use]
pub fn kind_of(door: Door) -> DoorKind {
    match door {
        Door::HumanCastleGate => DoorKind::Gate,
        Door::UndeadCastleDoor => DoorKind::Portal,
        Door::MeetingRoomDoor | Door::HumanCastleDoor | Door::ThroneRoomDoor => DoorKind::Hinged,
    }
}

/// Animates doors and keeps the ledger's door flags consistent.
#[derive(Debug, Clone)]
pub struct DoorController {
    config: DoorsConfig,
    openness: [f32; Door::COUNT],
    motion: [SequenceSlot<Motion>; Door::COUNT],
}

impl DoorController {
    /// All doors closed and still.
    #[must_use]
    pub fn new(config: DoorsConfig) -> Self {
        Self {
            config,
            openness: [0.0; Door::COUNT],
            motion: Default::default(),
        }
    }

    /// Open `door` (and its partner). Returns `false` if nothing changed.
    pub fn open(
        &mut self,
        door: Door,
        ledger: &mut ProgressionLedger,
        scene: &mut dyn SceneLoader,
        audio: &mut dyn AudioSink,
    ) -> bool {
        self.set(door, true, ledger, scene, audio)
    }

    /// Close `door` (and its partner). Returns `false` if nothing changed.
    pub fn close(
        &mut self,
        door: Door,
        ledger: &mut ProgressionLedger,
        scene: &mut dyn SceneLoader,
        audio: &mut dyn AudioSink,
    ) -> bool {
        self.set(door, false, ledger, scene, audio)
    }

    fn set(
        &mut self,
        door: Door,
        open: bool,
        ledger: &mut ProgressionLedger,
        scene: &mut dyn SceneLoader,
        audio: &mut dyn AudioSink,
    ) -> bool {
        let pair = partner(door);
        let in_opposite_state = ledger.is_door_open(door) != open
            && pair.is_none_or(|p| ledger.is_door_open(p) != open);
        if !in_opposite_state {
            debug!(door = ?door, open, "Door already in requested state");
            return false;
        }

        for d in std::iter::once(door).chain(pair) {
            if open {
                ledger.open_door(d);
            } else {
                ledger.close_door(d);
            }
        }

        match kind_of(door) {
            DoorKind::Hinged => {
                audio.play_one_shot(if open { Cue::DoorOpen } else { Cue::DoorClose });
                self.animate(door, open, self.config.rotation_duration);
            }
            DoorKind::Gate => {
                audio.play_one_shot(if open { Cue::GateOpen } else { Cue::GateClose });
                self.animate(door, open, self.config.gate_lift_duration);
            }
            DoorKind::Portal => {
                scene.set_active(ObjectRef::Door(door), open);
                self.openness[door.index()] = if open { 1.0 } else { 0.0 };
            }
        }
        debug!(door = ?door, partner = ?pair, open, "Door moved");
        true
    }

    /// Move from the current pose; a door reversed mid-swing covers only
    /// the distance it has travelled, at the same speed.
    fn animate(&mut self, door: Door, open: bool, full_duration: f32) {
        let i = door.index();
        let from = self.openness[i];
        let to = if open { 1.0 } else { 0.0 };
        self.motion[i].start(Motion { from, to }, full_duration * (to - from).abs());
    }

    /// Advance running animations.
    pub fn tick(&mut self, dt: f32) {
        for door in Door::ALL {
            let i = door.index();
            let slot = &mut self.motion[i];
            let Some(motion) = slot.phase() else { continue };
            let finished = slot.advance(dt).is_some();
            let progress = slot.countdown().map_or(1.0, |c| c.fraction());
            let progress = if finished { 1.0 } else { progress };
            self.openness[i] = motion.from + (motion.to - motion.from) * progress;
        }
    }

    /// Snap every open door in `room` to its open pose, as on scene load.
    pub fn restore_for_room(&mut self, room: Room, ledger: &ProgressionLedger, scene: &mut dyn SceneLoader) {
        for door in Door::ALL.iter().copied().filter(|&d| room_of(d) == room) {
            let open = ledger.is_door_open(door);
            self.motion[door.index()].cancel();
            self.openness[door.index()] = if open { 1.0 } else { 0.0 };
            if kind_of(door) == DoorKind::Portal {
                scene.set_active(ObjectRef::Door(door), open);
            }
        }
    }

    /// 0 closed, 1 fully open.
    #[must_use]
    pub fn openness(&self, door: Door) -> f32 {
        self.openness[door.index()]
    }

    /// Whether an animation is playing.
    #[must_use]
    pub fn is_moving(&self, door: Door) -> bool {
        self.motion[door.index()].is_running()
    }

    /// Current hinge angle in degrees (hinged doors only).
    #[must_use]
    pub fn swing_angle(&self, door: Door) -> f32 {
        let sign = if door == Door::HumanCastleDoor { 1.0 } else { -1.0 };
        sign * self.config.rotation_degrees * self.openness(door)
    }

    /// Current gate height.
    #[must_use]
    pub fn gate_height(&self) -> f32 {
        self.config.gate_lift_height * self.openness(Door::HumanCastleGate)
    }
}
