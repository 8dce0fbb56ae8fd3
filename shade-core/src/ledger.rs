//! The progression ledger: everything the player has done so far.
//!
//! [`ProgressionLedger`] holds the live [`LedgerState`], one restore
//! snapshot of it, and a small [`SessionRecord`] of counters that live for
//! the whole play session and are never rolled back by a restore.
//!
//! The ledger is an explicit context object: a session creates one, hands
//! `&mut ProgressionLedger` to whichever component needs it during a tick,
//! and drops it on teardown.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::collab::SceneLoader;
use crate::error::LedgerError;
use crate::metrics::spans;
use crate::spell::SpellKind;
use crate::types::{
    Act, CheckpointId, Choice, Door, Interaction, Room, Task, Transform, Vec3, CHECKPOINT_COUNT,
};

/// Spawn transforms each room starts with before the player moves.
const DEFAULT_ROOM_TRANSFORMS: [Transform; Room::COUNT] = [
    Transform::new(Vec3::new(18.94, 0.0, 36.4), Vec3::new(0.0, 90.0, 0.0)),
    Transform::new(Vec3::new(181.48, 0.27, 191.56), Vec3::new(0.0, -90.0, 0.0)),
    Transform::new(Vec3::new(4.76, -2.378, 75.13), Vec3::new(0.0, -90.0, 0.0)),
];

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Which spells the player has bought.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellPurchases {
    /// Invisibility spell owned.
    pub invisibility: bool,
    /// Speed spell owned.
    pub speed: bool,
    /// Reveal spell owned.
    pub reveal: bool,
}

impl SpellPurchases {
    fn slot(&mut self, kind: SpellKind) -> &mut bool {
        match kind {
            SpellKind::Invisibility => &mut self.invisibility,
            SpellKind::Speed => &mut self.speed,
            SpellKind::Reveal => &mut self.reveal,
        }
    }

    /// Whether `kind` has been bought.
    #[must_use]
    pub fn get(&self, kind: SpellKind) -> bool {
        match kind {
            SpellKind::Invisibility => self.invisibility,
            SpellKind::Speed => self.speed,
            SpellKind::Reveal => self.reveal,
        }
    }
}

/// Everything that is saved and restored as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Room the player is in.
    pub current_room: Room,
    /// Open state per door.
    pub doors_open: [bool; Door::COUNT],
    /// Interactions that have begun.
    pub interactions_started: [bool; Interaction::COUNT],
    /// Interactions that have finished.
    pub interactions_completed: [bool; Interaction::COUNT],
    /// Tasks that have begun.
    pub tasks_started: [bool; Task::COUNT],
    /// Tasks that have finished.
    pub tasks_completed: [bool; Task::COUNT],
    /// Choice outcomes.
    pub choices_made: [bool; Choice::COUNT],
    /// Checkpoints the route has armed.
    pub checkpoints_activated: [bool; CHECKPOINT_COUNT],
    /// Checkpoints the player has walked through.
    pub checkpoints_reached: [bool; CHECKPOINT_COUNT],
    /// Per-room player transform.
    pub room_transforms: [Transform; Room::COUNT],
    /// Gold carried. May go negative if a caller removes more than it checked.
    pub player_gold: i32,
    /// Positive is virtuous, negative deceptive.
    pub morality_score: i32,
    /// Set once the player agrees to return to the undead queen.
    pub return_to_queen: bool,
    /// Purchased spells.
    pub spells: SpellPurchases,
    /// Day/night cycle flag.
    pub is_day: bool,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            current_room: Room::MeetingRoom,
            doors_open: [false; Door::COUNT],
            interactions_started: [false; Interaction::COUNT],
            interactions_completed: [false; Interaction::COUNT],
            tasks_started: [false; Task::COUNT],
            tasks_completed: [false; Task::COUNT],
            choices_made: [false; Choice::COUNT],
            checkpoints_activated: [false; CHECKPOINT_COUNT],
            checkpoints_reached: [false; CHECKPOINT_COUNT],
            room_transforms: DEFAULT_ROOM_TRANSFORMS,
            player_gold: 0,
            morality_score: 0,
            return_to_queen: false,
            spells: SpellPurchases::default(),
            is_day: true,
        }
    }
}

/// Session counters that survive restores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Times the player was caught, per act.
    pub act_caught_counters: [u32; Act::COUNT],
    /// Index of the next save point allowed to fire.
    pub next_save: u32,
}

/// Label derived from the morality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoralityAlignment {
    /// Score above zero.
    Virtuous,
    /// Score below zero.
    Deceptive,
    /// Exactly zero.
    Neutral,
}

impl std::fmt::Display for MoralityAlignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Virtuous => "Virtuous",
            Self::Deceptive => "Deceptive",
            Self::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Live progression state plus one restore snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressionLedger {
    live: LedgerState,
    snapshot: LedgerState,
    session: SessionRecord,
}

impl ProgressionLedger {
    /// A fresh ledger whose snapshot equals the starting state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the live state.
    #[must_use]
    pub fn state(&self) -> &LedgerState {
        &self.live
    }

    /// Read-only view of the restore snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &LedgerState {
        &self.snapshot
    }

    /// Read-only view of the session counters.
    #[must_use]
    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    // -- doors & rooms -----------------------------------------------------

    /// Mark a door open.
    pub fn open_door(&mut self, door: Door) {
        self.live.doors_open[door.index()] = true;
    }

    /// Mark a door closed.
    pub fn close_door(&mut self, door: Door) {
        self.live.doors_open[door.index()] = false;
    }

    /// Whether a door is open.
    #[must_use]
    pub fn is_door_open(&self, door: Door) -> bool {
        self.live.doors_open[door.index()]
    }

    /// The room the player is in.
    #[must_use]
    pub fn current_room(&self) -> Room {
        self.live.current_room
    }

    /// Move the player to another room.
    pub fn change_room(&mut self, room: Room) {
        debug!(from = ?self.live.current_room, to = ?room, "Changing room");
        self.live.current_room = room;
    }

    // -- interactions ------------------------------------------------------

    /// Record that an interaction has begun.
    pub fn begin_interaction(&mut self, interaction: Interaction) {
        self.live.interactions_started[interaction.index()] = true;
    }

    /// Whether the interaction has begun. Stays set after completion;
    /// only [`reset_interaction`](Self::reset_interaction) clears it.
    #[must_use]
    pub fn is_interaction_ongoing(&self, interaction: Interaction) -> bool {
        self.live.interactions_started[interaction.index()]
    }

    /// Record that an interaction has finished.
    ///
    /// # Errors
    /// Returns [`LedgerError::CompletedBeforeStarted`] if it was never begun;
    /// the ledger is left untouched.
    pub fn complete_interaction(&mut self, interaction: Interaction) -> Result<(), LedgerError> {
        let i = interaction.index();
        if !self.live.interactions_started[i] {
            return Err(LedgerError::CompletedBeforeStarted {
                kind: "interaction",
                index: i,
            });
        }
        self.live.interactions_completed[i] = true;
        Ok(())
    }

    /// Clear both flags so the interaction can run again.
    pub fn reset_interaction(&mut self, interaction: Interaction) {
        let i = interaction.index();
        self.live.interactions_started[i] = false;
        self.live.interactions_completed[i] = false;
    }

    /// Whether an interaction has finished.
    #[must_use]
    pub fn is_interaction_complete(&self, interaction: Interaction) -> bool {
        self.live.interactions_completed[interaction.index()]
    }

    // -- tasks -------------------------------------------------------------

    /// Record that a task has begun.
    pub fn begin_task(&mut self, task: Task) {
        self.live.tasks_started[task.index()] = true;
    }

    /// Whether the task has begun. Stays set after completion.
    #[must_use]
    pub fn is_task_ongoing(&self, task: Task) -> bool {
        self.live.tasks_started[task.index()]
    }

    /// Record that a task has finished.
    ///
    /// # Errors
    /// Returns [`LedgerError::CompletedBeforeStarted`] if it was never begun.
    pub fn complete_task(&mut self, task: Task) -> Result<(), LedgerError> {
        let i = task.index();
        if !self.live.tasks_started[i] {
            return Err(LedgerError::CompletedBeforeStarted { kind: "task", index: i });
        }
        self.live.tasks_completed[i] = true;
        Ok(())
    }

    /// Whether a task has finished.
    #[must_use]
    pub fn is_task_complete(&self, task: Task) -> bool {
        self.live.tasks_completed[task.index()]
    }

    // -- choices & checkpoints --------------------------------------------

    /// Record the outcome of a choice.
    pub fn make_choice(&mut self, choice: Choice, value: bool) {
        self.live.choices_made[choice.index()] = value;
    }

    /// Outcome of a choice (`false` until made).
    #[must_use]
    pub fn choice(&self, choice: Choice) -> bool {
        self.live.choices_made[choice.index()]
    }

    /// Arm a checkpoint.
    ///
    /// # Panics
    /// Panics if `id` was built with [`CheckpointId::from_raw`] out of range.
    pub fn activate_checkpoint(&mut self, id: CheckpointId) {
        self.live.checkpoints_activated[id.index()] = true;
    }

    /// Whether a checkpoint is armed.
    #[must_use]
    pub fn is_checkpoint_activated(&self, id: CheckpointId) -> bool {
        self.live.checkpoints_activated[id.index()]
    }

    /// Record that the player walked through a checkpoint.
    pub fn reach_checkpoint(&mut self, id: CheckpointId) {
        self.live.checkpoints_reached[id.index()] = true;
    }

    /// Whether the player walked through a checkpoint.
    #[must_use]
    pub fn is_checkpoint_reached(&self, id: CheckpointId) -> bool {
        self.live.checkpoints_reached[id.index()]
    }

    // -- transforms --------------------------------------------------------

    /// Store the player location for the current room.
    pub fn set_location(&mut self, location: Vec3) {
        let room = self.live.current_room.index();
        self.live.room_transforms[room].location = location;
    }

    /// Player location saved for the current room.
    #[must_use]
    pub fn location(&self) -> Vec3 {
        self.live.room_transforms[self.live.current_room.index()].location
    }

    /// Store the player rotation for the current room.
    pub fn set_rotation(&mut self, rotation: Vec3) {
        let room = self.live.current_room.index();
        self.live.room_transforms[room].rotation = rotation;
    }

    /// Player rotation saved for the current room.
    #[must_use]
    pub fn rotation(&self) -> Vec3 {
        self.live.room_transforms[self.live.current_room.index()].rotation
    }

    // -- gold, flags, morality --------------------------------------------

    /// Gold carried.
    #[must_use]
    pub fn player_gold(&self) -> i32 {
        self.live.player_gold
    }

    /// Add gold.
    pub fn add_player_gold(&mut self, gold: i32) {
        self.live.player_gold += gold;
    }

    /// Remove gold unconditionally.
    pub fn remove_player_gold(&mut self, gold: i32) {
        self.live.player_gold -= gold;
    }

    /// Remove `cost` gold if the player can afford it.
    pub fn try_spend_gold(&mut self, cost: i32) -> bool {
        if self.live.player_gold >= cost {
            self.live.player_gold -= cost;
            true
        } else {
            false
        }
    }

    /// Set the return-to-queen flag.
    pub fn set_return_to_queen(&mut self, value: bool) {
        self.live.return_to_queen = value;
    }

    /// Whether the player agreed to return to the undead queen.
    #[must_use]
    pub fn return_to_queen(&self) -> bool {
        self.live.return_to_queen
    }

    /// Set a spell's purchased flag.
    pub fn set_spell_purchased(&mut self, kind: SpellKind, purchased: bool) {
        *self.live.spells.slot(kind) = purchased;
    }

    /// Whether a spell has been bought.
    #[must_use]
    pub fn is_spell_purchased(&self, kind: SpellKind) -> bool {
        self.live.spells.get(kind)
    }

    /// Shift the morality score.
    pub fn adjust_morality(&mut self, delta: i32) {
        self.live.morality_score += delta;
        debug!(score = self.live.morality_score, "Morality updated");
    }

    /// Current morality score.
    #[must_use]
    pub fn morality_score(&self) -> i32 {
        self.live.morality_score
    }

    /// Alignment label for the current score.
    #[must_use]
    pub fn morality_alignment(&self) -> MoralityAlignment {
        match self.live.morality_score {
            s if s > 0 => MoralityAlignment::Virtuous,
            s if s < 0 => MoralityAlignment::Deceptive,
            _ => MoralityAlignment::Neutral,
        }
    }

    /// Whether it is daytime.
    #[must_use]
    pub fn is_day(&self) -> bool {
        self.live.is_day
    }

    /// Set the day/night flag.
    pub fn set_day(&mut self, is_day: bool) {
        self.live.is_day = is_day;
    }

    /// Shop price after the morality discount or surcharge.
    ///
    /// `ceil(base × (1 − morality × 1.5 / 100))`, never below 1. Each point of
    /// morality moves the price by 1.5%.
    #[must_use]
    pub fn calculate_adjusted_price(&self, base_price: i32) -> i32 {
        adjusted_price(base_price, self.live.morality_score)
    }

    // -- session counters --------------------------------------------------

    /// Times the player was caught during `act`.
    #[must_use]
    pub fn act_caught_count(&self, act: Act) -> u32 {
        self.session.act_caught_counters[act.index()]
    }

    /// Count one more catch during `act`.
    pub fn increment_act_caught(&mut self, act: Act) {
        let counter = &mut self.session.act_caught_counters[act.index()];
        *counter = counter.saturating_add(1);
    }

    /// Index of the next save point allowed to fire.
    #[must_use]
    pub fn next_save(&self) -> u32 {
        self.session.next_save
    }

    /// Advance the save point cursor.
    pub fn increment_next_save(&mut self) {
        self.session.next_save += 1;
    }

    // -- save / restore ----------------------------------------------------

    /// Copy the live state into the snapshot.
    pub fn save_game(&mut self) {
        self.snapshot.clone_from(&self.live);
        info!(room = ?self.live.current_room, gold = self.live.player_gold, "Game saved");
    }

    /// Save, recording `respawn` as where the player reappears after a
    /// restore into the current room.
    pub fn save_game_at(&mut self, respawn: Transform) {
        self.save_game();
        let room = self.snapshot.current_room.index();
        self.snapshot.room_transforms[room] = respawn;
    }

    /// Copy the snapshot back into the live state, then ask the host to
    /// reload the restored room.
    ///
    /// The copy is complete before `reload_scene` is called.
    pub fn restore_to_snapshot(&mut self, scene: &mut dyn SceneLoader) {
        let _span = info_span!(spans::RESTORE).entered();
        self.live.clone_from(&self.snapshot);
        info!(room = ?self.live.current_room, "Restored to last save");
        scene.reload_scene(self.live.current_room);
    }
}

/// `ceil(base × (200 − 3m) / 200)` floored at 1, in integer arithmetic.
fn adjusted_price(base_price: i32, morality: i32) -> i32 {
    let numerator = i64::from(base_price) * (200 - 3 * i64::from(morality));
    let adjusted = numerator.div_euclid(200) + i64::from(numerator.rem_euclid(200) != 0);
    i32::try_from(adjusted.max(1)).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Reloads(Vec<Room>);

    impl SceneLoader for Reloads {
        fn reload_scene(&mut self, room: Room) {
            self.0.push(room);
        }

        fn set_active(&mut self, _object: crate::collab::ObjectRef, _active: bool) {}
    }

    fn with_morality(score: i32) -> ProgressionLedger {
        let mut ledger = ProgressionLedger::new();
        ledger.adjust_morality(score);
        ledger
    }

    #[test]
    fn adjusted_price_examples() {
        assert_eq!(with_morality(0).calculate_adjusted_price(100), 100);
        assert_eq!(with_morality(20).calculate_adjusted_price(100), 70);
        assert_eq!(with_morality(-20).calculate_adjusted_price(100), 130);
    }

    #[test]
    fn adjusted_price_rounds_up_and_floors_at_one() {
        // 10 * (1 - 0.015) = 9.85 -> 10
        assert_eq!(with_morality(1).calculate_adjusted_price(10), 10);
        assert_eq!(with_morality(100).calculate_adjusted_price(100), 1);
        assert_eq!(with_morality(0).calculate_adjusted_price(0), 1);
    }

    #[test]
    fn completion_requires_start() {
        let mut ledger = ProgressionLedger::new();
        assert_eq!(
            ledger.complete_task(Task::RetrieveCrystal),
            Err(LedgerError::CompletedBeforeStarted { kind: "task", index: 1 })
        );
        assert!(!ledger.is_task_complete(Task::RetrieveCrystal));

        ledger.begin_task(Task::RetrieveCrystal);
        assert!(ledger.is_task_ongoing(Task::RetrieveCrystal));
        assert!(ledger.complete_task(Task::RetrieveCrystal).is_ok());
        assert!(ledger.is_task_complete(Task::RetrieveCrystal));
    }

    #[test]
    fn started_flags_survive_completion() {
        let mut ledger = ProgressionLedger::new();
        ledger.begin_task(Task::KingSetsTestTask);
        ledger.complete_task(Task::KingSetsTestTask).expect("started");
        assert!(ledger.is_task_ongoing(Task::KingSetsTestTask));
        assert!(ledger.is_task_complete(Task::KingSetsTestTask));

        ledger.begin_interaction(Interaction::QueenAsksForHelp);
        ledger
            .complete_interaction(Interaction::QueenAsksForHelp)
            .expect("started");
        assert!(ledger.is_interaction_ongoing(Interaction::QueenAsksForHelp));
    }

    #[test]
    fn reset_interaction_clears_both_flags() {
        let mut ledger = ProgressionLedger::new();
        ledger.begin_interaction(Interaction::QueenAsksForHelp);
        ledger
            .complete_interaction(Interaction::QueenAsksForHelp)
            .expect("started");
        ledger.reset_interaction(Interaction::QueenAsksForHelp);
        assert!(!ledger.is_interaction_complete(Interaction::QueenAsksForHelp));
        assert!(!ledger.is_interaction_ongoing(Interaction::QueenAsksForHelp));
    }

    #[test]
    fn save_mutate_restore_reproduces_snapshot() {
        let mut ledger = ProgressionLedger::new();
        ledger.add_player_gold(40);
        ledger.open_door(Door::MeetingRoomDoor);
        ledger.change_room(Room::MainScene);
        ledger.save_game();
        let saved = ledger.state().clone();

        ledger.add_player_gold(100);
        ledger.open_door(Door::HumanCastleGate);
        ledger.set_spell_purchased(SpellKind::Reveal, true);
        ledger.change_room(Room::ThroneRoom);
        ledger.set_location(Vec3::new(1.0, 2.0, 3.0));

        let mut scene = Reloads::default();
        ledger.restore_to_snapshot(&mut scene);
        assert_eq!(ledger.state(), &saved);
        assert_eq!(scene.0, vec![Room::MainScene]);
    }

    #[test]
    fn session_counters_survive_restore() {
        let mut ledger = ProgressionLedger::new();
        ledger.increment_act_caught(Act::Two);
        ledger.increment_next_save();
        ledger.restore_to_snapshot(&mut Reloads::default());
        assert_eq!(ledger.act_caught_count(Act::Two), 1);
        assert_eq!(ledger.next_save(), 1);
    }

    #[test]
    fn save_at_sets_respawn_for_current_room() {
        let mut ledger = ProgressionLedger::new();
        ledger.change_room(Room::MainScene);
        let respawn = Transform::new(Vec3::new(177.6, 1.2, 191.2), Vec3::new(0.0, -90.0, 0.0));
        ledger.save_game_at(respawn);
        ledger.set_location(Vec3::ZERO);

        ledger.restore_to_snapshot(&mut Reloads::default());
        assert_eq!(ledger.location(), respawn.location);
        assert_eq!(ledger.rotation(), respawn.rotation);
    }

    #[test]
    fn transforms_are_per_room() {
        let mut ledger = ProgressionLedger::new();
        ledger.set_location(Vec3::new(5.0, 0.0, 5.0));
        ledger.change_room(Room::ThroneRoom);
        assert_eq!(ledger.location(), DEFAULT_ROOM_TRANSFORMS[2].location);
        ledger.change_room(Room::MeetingRoom);
        assert_eq!(ledger.location(), Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn try_spend_refuses_when_short() {
        let mut ledger = ProgressionLedger::new();
        ledger.add_player_gold(5);
        assert!(!ledger.try_spend_gold(10));
        assert_eq!(ledger.player_gold(), 5);
        assert!(ledger.try_spend_gold(5));
        assert_eq!(ledger.player_gold(), 0);
    }

    #[test]
    fn alignment_follows_sign() {
        assert_eq!(with_morality(3).morality_alignment(), MoralityAlignment::Virtuous);
        assert_eq!(with_morality(-1).morality_alignment(), MoralityAlignment::Deceptive);
        assert_eq!(with_morality(0).morality_alignment().to_string(), "Neutral");
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn unchecked_checkpoint_out_of_range_panics() {
        let mut ledger = ProgressionLedger::new();
        ledger.activate_checkpoint(CheckpointId::from_raw(CHECKPOINT_COUNT));
    }
}
