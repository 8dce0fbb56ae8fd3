//! The per-tick world system.
//!
//! [`World`] owns every runtime actor in the loaded room and advances them in
//! lock-step. The ledger and the host collaborators are borrowed for the
//! duration of each call, never stored.
//!
//! ## Tick order
//!
//! | Step            | Notes                                           |
//! |-----------------|-------------------------------------------------|
//! | Spells          | Active/cooldown timers, overlays                |
//! | Reveal outlines | Guards within the reveal radius                 |
//! | Guards          | Detection, catch, state machine, movement       |
//! | Spotted         | Vignette fade                                   |
//! | Doors           | Swing and lift animations                       |
//!
//! A guard whose catch effect finishes restores the ledger; the rest of that
//! tick is skipped and the room is re-initialised from the restored state.

use std::sync::Arc;

use shade_core::collab::{Collaborators, ObjectRef, SceneLoader, Target};
use shade_core::guard::GuardEnv;
use shade_core::interact::{Bystander, InteractContext};
use shade_core::metrics::{spans, ShadeCounters, TickBudgetMonitor};
use shade_core::spell::{ActivateOutcome, PurchaseOutcome, SpellController, SpellKind, SpellTransition};
use shade_core::types::{GuardId, Room, Vec3};
use shade_core::{
    Guard, Interactable, ProgressionLedger, ShadeConfig, ShadeError, SpottedIndicator,
};
use tracing::{debug, debug_span, info, warn};

use crate::checkpoints::{CheckpointRoute, SavePoint};
use crate::components::WorldContent;
use crate::doors::DoorController;
use crate::events::TriggerEvent;
use crate::interactor::{Focus, FocusView, Interactor};

/// Half-angle of the cone in front of the player in which interactables can
/// be focused, in degrees.
const FOCUS_CONE_DEGREES: f32 = 30.0;

/// What happened during one world tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldTick {
    /// A guard caught the player.
    pub caught: bool,
    /// A catch finished; the ledger was restored and the room re-initialised.
    pub restored: bool,
}

/// Presents the host target as invisible while the invisibility spell runs.
struct CloakedTarget<'a> {
    inner: &'a dyn Target,
    cloaked: bool,
}

impl Target for CloakedTarget<'_> {
    fn position(&self) -> Vec3 {
        self.inner.position()
    }

    fn forward(&self) -> Vec3 {
        self.inner.forward()
    }

    fn is_invisible(&self) -> bool {
        self.cloaked || self.inner.is_invisible()
    }
}

fn spell_slot(kind: SpellKind) -> usize {
    match kind {
        SpellKind::Invisibility => 0,
        SpellKind::Speed => 1,
        SpellKind::Reveal => 2,
    }
}

fn spell_controllers(config: &ShadeConfig) -> [SpellController; 3] {
    SpellKind::ALL.map(|kind| SpellController::new(kind, config.spells.get(kind).clone()))
}

fn spawn_guards(config: &ShadeConfig, content: &WorldContent) -> Vec<Guard> {
    content
        .guards
        .iter()
        .zip(0_u64..)
        .map(|(spawn, i)| {
            let guard = Guard::new(spawn.position, spawn.waypoints.clone(), config)
                .with_forward(spawn.forward)
                .with_seed(config.sim.seed.wrapping_add(i));
            match spawn.act {
                Some(act) => guard.with_act(act),
                None => guard,
            }
        })
        .collect()
}

fn spawn_bystanders(config: &ShadeConfig, content: &WorldContent) -> Vec<Bystander> {
    content
        .bystanders
        .iter()
        .map(|b| {
            Bystander::new(
                b.position,
                b.gold.unwrap_or(config.interaction.bystander_gold),
                config.guard.interact_distance,
            )
        })
        .collect()
}

/// Every runtime actor in the loaded room.
pub struct World {
    config: ShadeConfig,
    room: Room,
    rooms: Vec<WorldContent>,
    guards: Vec<Guard>,
    bystanders: Vec<Bystander>,
    spotted: SpottedIndicator,
    spells: [SpellController; 3],
    doors: DoorController,
    route: CheckpointRoute,
    save_points: Vec<SavePoint>,
    interactor: Interactor,
    counters: Arc<ShadeCounters>,
    monitor: Arc<TickBudgetMonitor>,
}

impl World {
    /// Spawn `content` with the given tuning.
    ///
    /// `content` is also registered as the layout of its room; see
    /// [`World::add_room`] for the others.
    #[must_use]
    pub fn new(config: ShadeConfig, content: &WorldContent) -> Self {
        Self {
            room: content.room,
            rooms: vec![content.clone()],
            guards: spawn_guards(&config, content),
            bystanders: spawn_bystanders(&config, content),
            spotted: SpottedIndicator::new(&config.spotted),
            spells: spell_controllers(&config),
            doors: DoorController::new(config.doors.clone()),
            route: CheckpointRoute::main_scene(),
            save_points: content.save_points.clone(),
            interactor: Interactor::new(config.interaction.hold_time),
            counters: Arc::new(ShadeCounters::new()),
            monitor: Arc::new(TickBudgetMonitor::new(f64::from(config.performance.tick_budget_ms))),
            config,
        }
    }

    /// Register the layout spawned when the player enters `content.room`,
    /// replacing any earlier one. Rooms without a layout spawn empty.
    pub fn add_room(&mut self, content: WorldContent) {
        self.rooms.retain(|c| c.room != content.room);
        self.rooms.push(content);
    }

    /// Replace every actor with the layout registered for `room`.
    fn spawn_room(&mut self, room: Room) {
        let content = self
            .rooms
            .iter()
            .find(|c| c.room == room)
            .cloned()
            .unwrap_or_else(|| WorldContent::empty(room));
        self.guards = spawn_guards(&self.config, &content);
        self.bystanders = spawn_bystanders(&self.config, &content);
        self.save_points = content.save_points;
        self.room = room;
        info!(room = ?room, guards = self.guards.len(), "Room spawned");
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the room by `dt` seconds.
    pub fn tick(&mut self, dt: f32, ledger: &mut ProgressionLedger, collab: &mut Collaborators<'_>) -> WorldTick {
        let _span = debug_span!(spans::TICK, dt).entered();
        let monitor = Arc::clone(&self.monitor);
        let _timer = monitor.begin_tick();

        self.tick_spells(dt, collab.scene);
        self.show_revealed_guards(collab.target.position(), collab.scene);

        let report = self.tick_guards(dt, ledger, collab);
        if report.restored {
            self.on_room_loaded(ledger, collab.scene);
            return report;
        }

        self.spotted.tick(dt, collab.presentation);
        self.doors.tick(dt);
        report
    }

    fn tick_spells(&mut self, dt: f32, scene: &mut dyn SceneLoader) {
        for spell in &mut self.spells {
            match spell.tick(dt) {
                Some(SpellTransition::Ended) => scene.set_active(ObjectRef::SpellOverlay(spell.kind()), false),
                Some(SpellTransition::Ready) | None => {}
            }
        }
    }

    fn show_revealed_guards(&self, player: Vec3, scene: &mut dyn SceneLoader) {
        let reveal = self.spell(SpellKind::Reveal);
        let radius = reveal.config().reveal_radius;
        for guard in &self.guards {
            let shown = reveal.is_active() && guard.position().distance(player) <= radius;
            scene.set_active(ObjectRef::GuardOutline(guard.id()), shown);
        }
    }

    fn tick_guards(&mut self, dt: f32, ledger: &mut ProgressionLedger, collab: &mut Collaborators<'_>) -> WorldTick {
        let cloaked = CloakedTarget {
            inner: collab.target,
            cloaked: self.spell(SpellKind::Invisibility).is_active(),
        };
        let mut view = Collaborators {
            scene: &mut *collab.scene,
            audio: &mut *collab.audio,
            target: &cloaked,
            space: collab.space,
            presentation: &mut *collab.presentation,
        };

        let mut report = WorldTick::default();
        for guard in &mut self.guards {
            let _span = debug_span!(spans::GUARD_TICK, guard = %guard.id()).entered();
            let mut env = GuardEnv {
                ledger: &mut *ledger,
                spotted: &mut self.spotted,
                collab: &mut view,
            };
            let step = guard.tick(dt, &mut env);
            if step.gained_sight {
                ShadeCounters::bump(&self.counters.sightings);
            }
            if step.caught {
                ShadeCounters::bump(&self.counters.catches);
                report.caught = true;
            }
            if step.restored {
                ShadeCounters::bump(&self.counters.restores);
                report.restored = true;
                break;
            }
        }
        report
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// React to a trigger raised by the host.
    ///
    /// # Errors
    /// Returns [`ShadeError::IndexOutOfRange`] for a save point index that is
    /// not placed in this room.
    pub fn handle_event(
        &mut self,
        event: TriggerEvent,
        ledger: &mut ProgressionLedger,
        collab: &mut Collaborators<'_>,
    ) -> shade_core::error::Result<()> {
        let _span = debug_span!(spans::TRIGGER, event = event.label()).entered();
        match event {
            TriggerEvent::CheckpointEntered { checkpoint } => {
                let outcome = self.route.enter(checkpoint, ledger, collab.scene, collab.audio, &mut self.doors);
                debug!(checkpoint = %checkpoint, ?outcome, "Checkpoint handled");
            }
            TriggerEvent::SavePointEntered { index } => {
                let point = self.save_points.iter().find(|s| s.index == index).ok_or(
                    ShadeError::IndexOutOfRange {
                        kind: "save point",
                        index: index as usize,
                        len: self.save_points.len(),
                    },
                )?;
                if point.enter(ledger) {
                    ShadeCounters::bump(&self.counters.saves);
                }
            }
            TriggerEvent::DoorCommand { door, open } => {
                if open {
                    self.doors.open(door, ledger, collab.scene, collab.audio);
                } else {
                    self.doors.close(door, ledger, collab.scene, collab.audio);
                }
            }
            TriggerEvent::CastSpell { spell } => {
                let controller = &mut self.spells[spell_slot(spell)];
                if controller.activate(ledger, collab.audio) == ActivateOutcome::Activated {
                    collab.scene.set_active(ObjectRef::SpellOverlay(spell), true);
                    ShadeCounters::bump(&self.counters.spells_cast);
                }
            }
            TriggerEvent::BuySpell { spell } => {
                if let PurchaseOutcome::InsufficientGold { price } = self.spell(spell).purchase(ledger) {
                    info!(?spell, price, gold = ledger.player_gold(), "Cannot afford spell");
                }
            }
            TriggerEvent::EnterRoom { room } => {
                ledger.change_room(room);
                collab.scene.reload_scene(room);
                self.on_room_loaded(ledger, collab.scene);
            }
        }
        Ok(())
    }

    /// Re-initialise the room from the ledger, as after a scene load.
    ///
    /// When the ledger names a different room than the one loaded, that
    /// room's actors are spawned first.
    pub fn on_room_loaded(&mut self, ledger: &ProgressionLedger, scene: &mut dyn SceneLoader) {
        let room = ledger.current_room();
        if room != self.room {
            self.spawn_room(room);
        }
        for guard in &mut self.guards {
            guard.reset(ledger);
        }
        for bystander in &mut self.bystanders {
            bystander.reset();
        }
        self.spotted.stop_effect();
        for kind in SpellKind::ALL {
            scene.set_active(ObjectRef::SpellOverlay(kind), false);
        }
        self.spells = spell_controllers(&self.config);
        self.interactor.reset(scene);
        self.doors.restore_for_room(self.room, ledger, scene);
        self.route.on_room_loaded(self.room, ledger, scene);
        debug!(room = ?self.room, "Room initialised");
    }

    // -----------------------------------------------------------------------
    // Interaction
    // -----------------------------------------------------------------------

    /// Run hold-to-interact for one frame. Returns the prompt to display.
    pub fn update_interaction(
        &mut self,
        dt: f32,
        holding: bool,
        ledger: &mut ProgressionLedger,
        collab: &mut Collaborators<'_>,
    ) -> Option<String> {
        let view = self.focus_for(collab.target);
        if let Some(focus) = self.interactor.update(dt, view, holding, collab.scene) {
            let mut ctx = InteractContext {
                ledger,
                audio: &mut *collab.audio,
            };
            match focus {
                Focus::Guard(id) => {
                    if let Some(guard) = self.guards.iter_mut().find(|g| g.id() == id) {
                        guard.interact(&mut ctx);
                    }
                }
                Focus::Bystander(id) => {
                    if let Some(bystander) = self.bystanders.iter_mut().find(|b| b.id == id) {
                        bystander.interact(&mut ctx);
                    }
                }
            }
            ShadeCounters::bump(&self.counters.pickpockets);
        }
        self.interactor.prompt()
    }

    /// The nearest interactable in front of `player` and within reach.
    fn focus_for(&self, player: &dyn Target) -> Option<FocusView> {
        let origin = player.position();
        let facing = player.forward();
        let guards = self
            .guards
            .iter()
            .map(|g| (Focus::Guard(g.id()), g.position(), g.interact_distance(), g.has_pickpocketed()));
        let bystanders = self
            .bystanders
            .iter()
            .map(|b| (Focus::Bystander(b.id), b.position, b.interact_distance(), b.has_pickpocketed()));

        guards
            .chain(bystanders)
            .filter_map(|(focus, position, reach, exhausted)| {
                let offset = position - origin;
                let distance = offset.length();
                let in_front = distance <= f32::EPSILON || facing.angle_to(offset) <= FOCUS_CONE_DEGREES;
                (distance <= reach && in_front).then_some((distance, FocusView { focus, exhausted }))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, view)| view)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Room the world was last initialised for.
    #[must_use]
    pub fn room(&self) -> Room {
        self.room
    }

    /// Tuning in use.
    #[must_use]
    pub fn config(&self) -> &ShadeConfig {
        &self.config
    }

    /// All guards.
    #[must_use]
    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    /// A guard by id.
    #[must_use]
    pub fn guard(&self, id: GuardId) -> Option<&Guard> {
        self.guards.iter().find(|g| g.id() == id)
    }

    /// A guard by id, for hosts that drive guard movement themselves.
    pub fn guard_mut(&mut self, id: GuardId) -> Option<&mut Guard> {
        self.guards.iter_mut().find(|g| g.id() == id)
    }

    /// All bystanders.
    #[must_use]
    pub fn bystanders(&self) -> &[Bystander] {
        &self.bystanders
    }

    /// The shared spotted indicator.
    #[must_use]
    pub fn spotted(&self) -> &SpottedIndicator {
        &self.spotted
    }

    /// A spell controller.
    #[must_use]
    pub fn spell(&self, kind: SpellKind) -> &SpellController {
        &self.spells[spell_slot(kind)]
    }

    /// Door animation state.
    #[must_use]
    pub fn doors(&self) -> &DoorController {
        &self.doors
    }

    /// The checkpoint route.
    #[must_use]
    pub fn route(&self) -> &CheckpointRoute {
        &self.route
    }

    /// Hold-to-interact state.
    #[must_use]
    pub fn interactor(&self) -> &Interactor {
        &self.interactor
    }

    /// Movement multiplier the host should apply to the player.
    #[must_use]
    pub fn player_speed_multiplier(&self) -> f32 {
        self.spells.iter().map(SpellController::speed_multiplier).product()
    }

    /// Gameplay counters, shareable with a dashboard thread.
    #[must_use]
    pub fn counters(&self) -> &Arc<ShadeCounters> {
        &self.counters
    }

    /// Tick timing, shareable with a dashboard thread.
    #[must_use]
    pub fn monitor(&self) -> &Arc<TickBudgetMonitor> {
        &self.monitor
    }

    /// Log a warning when the last tick overran its budget.
    pub fn check_budget(&self) {
        if self.monitor.is_over_budget() {
            warn!(
                last_ms = self.monitor.last_tick_ms(),
                budget_ms = self.monitor.budget_ms(),
                overruns = self.monitor.overruns(),
                "World tick over budget"
            );
        }
    }
}
