//! Guard detection and pursuit.
//!
//! A [`Guard`] runs a cyclic three-state machine:
//!
//! ```text
//!   Patrolling ──sees target──▶ Chasing ──out of sight for chase_duration──▶ Searching
//!        ▲                                                                      │
//!        └──────────────────────── search_duration elapsed ─────────────────────┘
//! ```
//!
//! Detection runs every tick in every state. While the target is visible the
//! detection meter fills at 1/s; while it is not, the meter drains at
//! `depletion_rate`/s. A full meter latches a catch: the act counter is
//! bumped, the caught screen plays for `effect_duration`, and then the
//! ledger is restored to its snapshot. The latch is per guard: it prevents a
//! second catch from the same guard until the restore has happened, while
//! other guards still latch and count their own catches.
//!
//! Movement is simple kinematics toward a destination; the host is free to
//! override `position`/`forward` each tick from its own navigation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::collab::{Collaborators, Collider, Cue, RayHit, SpatialQuery, Target};
use crate::config::{GuardConfig, ShadeConfig};
use crate::interact::{InteractContext, Interactable};
use crate::ledger::ProgressionLedger;
use crate::metrics::spans;
use crate::sequence::SequenceSlot;
use crate::spotted::SpottedIndicator;
use crate::types::{Act, GuardId, Task, Vec3};

/// Behaviour state of a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardState {
    /// Walking the waypoint loop.
    Patrolling,
    /// Running at the target's last known position.
    Chasing,
    /// Wandering around the last known position.
    Searching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PatrolPause;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CatchEffect;

/// Shared state a guard reads and writes during its tick.
pub struct GuardEnv<'a, 'c> {
    /// Progression ledger (caught counters, restore).
    pub ledger: &'a mut ProgressionLedger,
    /// Shared spotted indicator.
    pub spotted: &'a mut SpottedIndicator,
    /// Host collaborators.
    pub collab: &'a mut Collaborators<'c>,
}

/// What happened during one guard tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardTick {
    /// The guard started seeing the target this tick.
    pub gained_sight: bool,
    /// The guard caught the target this tick.
    pub caught: bool,
    /// The catch effect finished and the ledger was restored.
    pub restored: bool,
}

/// One guard NPC.
#[derive(Debug, Clone)]
pub struct Guard {
    id: GuardId,
    act: Option<Act>,
    config: GuardConfig,
    caught_effect_duration: f32,
    caught_message: String,

    spawn: Vec3,
    spawn_forward: Vec3,
    position: Vec3,
    forward: Vec3,
    waypoints: Vec<Vec3>,
    next_waypoint: usize,
    destination: Vec3,

    state: GuardState,
    current_detection: f32,
    in_sight: bool,
    chase_time_remaining: f32,
    last_known_target: Vec3,
    caught_latched: bool,
    alert_played: bool,
    pickpocketed: bool,
    speeds_frozen: bool,

    dwell: SequenceSlot<PatrolPause>,
    search_timer: SequenceSlot<SearchTimer>,
    catch_effect: SequenceSlot<CatchEffect>,
    rng: StdRng,
}

impl Guard {
    /// A guard standing at `spawn` facing +Z, patrolling `waypoints`.
    ///
    /// An empty waypoint list degenerates to a single static patrol point at
    /// `spawn`.
    #[must_use]
    pub fn new(spawn: Vec3, waypoints: Vec<Vec3>, config: &ShadeConfig) -> Self {
        let id = GuardId::new();
        let waypoints = if waypoints.is_empty() {
            warn!(guard = %id, "No patrol waypoints, guarding spawn point");
            vec![spawn]
        } else {
            waypoints
        };
        let (_, low) = id.0.as_u64_pair();
        let mut guard = Self {
            id,
            act: None,
            config: config.guard.clone(),
            caught_effect_duration: config.caught.effect_duration,
            caught_message: config.caught.message.clone(),
            spawn,
            spawn_forward: Vec3::FORWARD,
            position: spawn,
            forward: Vec3::FORWARD,
            waypoints,
            next_waypoint: 0,
            destination: spawn,
            state: GuardState::Patrolling,
            current_detection: 0.0,
            in_sight: false,
            chase_time_remaining: config.guard.chase_duration,
            last_known_target: spawn,
            caught_latched: false,
            alert_played: false,
            pickpocketed: false,
            speeds_frozen: false,
            dwell: SequenceSlot::new(),
            search_timer: SequenceSlot::new(),
            catch_effect: SequenceSlot::new(),
            rng: StdRng::seed_from_u64(config.sim.seed ^ low),
        };
        guard.set_next_patrol_point();
        guard
    }

    /// Tag the guard with the act whose caught counter it bumps.
    #[must_use]
    pub fn with_act(mut self, act: Act) -> Self {
        self.act = Some(act);
        self
    }

    /// Set the facing at spawn.
    #[must_use]
    pub fn with_forward(mut self, forward: Vec3) -> Self {
        self.spawn_forward = forward.normalized();
        self.forward = self.spawn_forward;
        self
    }

    /// Reseed the search RNG.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Guard identity.
    #[must_use]
    pub fn id(&self) -> GuardId {
        self.id
    }

    /// Act category, if any.
    #[must_use]
    pub fn act(&self) -> Option<Act> {
        self.act
    }

    /// Current behaviour state.
    #[must_use]
    pub fn state(&self) -> GuardState {
        self.state
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Facing direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Override the position (host navigation).
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Override the facing (host navigation).
    pub fn set_forward(&mut self, forward: Vec3) {
        self.forward = forward.normalized();
    }

    /// Where the guard is heading.
    #[must_use]
    pub fn destination(&self) -> Vec3 {
        self.destination
    }

    /// Patrol loop (never empty).
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Seconds of accumulated detection.
    #[must_use]
    pub fn current_detection(&self) -> f32 {
        self.current_detection
    }

    /// Detection meter fill, 0..=1.
    #[must_use]
    pub fn detection_fraction(&self) -> f32 {
        if self.config.detection_time <= 0.0 {
            return if self.current_detection > 0.0 { 1.0 } else { 0.0 };
        }
        (self.current_detection / self.config.detection_time).clamp(0.0, 1.0)
    }

    /// Whether the target was visible on the last tick.
    #[must_use]
    pub fn is_in_sight(&self) -> bool {
        self.in_sight
    }

    /// Whether a catch effect is playing.
    #[must_use]
    pub fn is_caught_latched(&self) -> bool {
        self.caught_latched
    }

    /// Whether the guard's pocket has been emptied (or can no longer be).
    #[must_use]
    pub fn has_pickpocketed(&self) -> bool {
        self.pickpocketed
    }

    /// Chase time left before searching.
    #[must_use]
    pub fn chase_time_remaining(&self) -> f32 {
        self.chase_time_remaining
    }

    /// Where the target was last seen.
    #[must_use]
    pub fn last_known_target(&self) -> Vec3 {
        self.last_known_target
    }

    /// Movement speed for the current state.
    #[must_use]
    pub fn speed(&self) -> f32 {
        if self.speeds_frozen {
            return 0.0;
        }
        match self.state {
            GuardState::Chasing => self.config.chase_speed,
            GuardState::Patrolling | GuardState::Searching => self.config.walking_speed,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Put the guard back at spawn, as after a scene load.
    ///
    /// The act-one thief stays emptied once its robbery task is complete.
    pub fn reset(&mut self, ledger: &ProgressionLedger) {
        self.position = self.spawn;
        self.forward = self.spawn_forward;
        self.state = GuardState::Patrolling;
        self.current_detection = 0.0;
        self.in_sight = false;
        self.chase_time_remaining = self.config.chase_duration;
        self.last_known_target = self.spawn;
        self.caught_latched = false;
        self.alert_played = false;
        self.speeds_frozen = false;
        self.dwell.cancel();
        self.search_timer.cancel();
        self.catch_effect.cancel();
        self.pickpocketed =
            self.act == Some(Act::One) && ledger.is_task_complete(Task::RobThief);
        self.next_waypoint = 0;
        self.set_next_patrol_point();
    }

    /// Advance the guard by `dt` seconds.
    pub fn tick(&mut self, dt: f32, env: &mut GuardEnv<'_, '_>) -> GuardTick {
        let mut report = GuardTick::default();

        if self.catch_effect.advance(dt).is_some() {
            self.finish_catch(env);
            report.restored = true;
            return report;
        }

        let visible = self.detect(dt, env, &mut report);

        match self.state {
            GuardState::Patrolling => {
                self.alert_played = false;
                self.patrol(dt);
            }
            GuardState::Chasing => self.chase(dt, visible, env.collab.space),
            GuardState::Searching => {
                self.alert_played = false;
                self.search(dt, env.collab.space);
            }
        }

        if !visible {
            self.current_detection =
                (self.current_detection - dt * self.config.depletion_rate).max(0.0);
        }

        env.collab
            .presentation
            .set_detection_fraction(self.id, self.detection_fraction());
        report
    }

    // -----------------------------------------------------------------------
    // Detection
    // -----------------------------------------------------------------------

    /// Vision cone plus line-of-sight test against `target`.
    #[must_use]
    pub fn can_see(&self, target: &dyn Target, space: &dyn SpatialQuery) -> bool {
        let to_target = target.position() - self.position;
        let distance = to_target.length();
        if distance > self.config.vision_range {
            return false;
        }
        // A target standing inside the guard is looked for along its facing.
        let direction = if distance > f32::EPSILON { to_target.normalized() } else { self.forward };
        if self.forward.angle_to(direction) > self.config.field_of_view_angle / 2.0 {
            return false;
        }
        let eye = self.position + Vec3::UP * self.config.eye_height;
        matches!(
            space.raycast(eye, direction, self.config.vision_range),
            Some(RayHit { collider: Collider::Target, .. })
        )
    }

    fn detect(&mut self, dt: f32, env: &mut GuardEnv<'_, '_>, report: &mut GuardTick) -> bool {
        if env.collab.target.is_invisible() {
            self.lose_sight(env.spotted);
            self.current_detection = 0.0;
            return false;
        }
        if !self.can_see(env.collab.target, env.collab.space) {
            self.lose_sight(env.spotted);
            return false;
        }

        if !self.in_sight {
            self.in_sight = true;
            report.gained_sight = true;
            debug!(guard = %self.id, "Target in sight");
        }
        if !env.spotted.contains(self.id) {
            env.spotted.add(self.id);
        }

        self.last_known_target = env.collab.target.position();
        self.current_detection = (self.current_detection + dt).min(self.config.detection_time);

        if self.current_detection >= self.config.detection_time && !self.caught_latched {
            self.begin_catch(env);
            report.caught = true;
        }

        if self.state != GuardState::Chasing {
            self.start_chasing(env.collab);
        }
        true
    }

    fn lose_sight(&mut self, spotted: &mut SpottedIndicator) {
        if self.in_sight {
            self.in_sight = false;
            spotted.remove(self.id);
            debug!(guard = %self.id, "Target lost");
        }
    }

    // -----------------------------------------------------------------------
    // Catch
    // -----------------------------------------------------------------------

    fn begin_catch(&mut self, env: &mut GuardEnv<'_, '_>) {
        let _span = info_span!(spans::CATCH, guard = %self.id).entered();
        self.caught_latched = true;
        if let Some(act) = self.act {
            env.ledger.increment_act_caught(act);
        }
        env.spotted.stop_effect();
        env.spotted.lock();
        env.collab.presentation.set_caught_message(&self.caught_message);
        env.collab.presentation.trigger_caught_effect();
        self.pickpocketed = true;
        self.speeds_frozen = true;
        self.catch_effect.start(CatchEffect, self.caught_effect_duration);
        info!(guard = %self.id, act = ?self.act, "Player caught");
    }

    fn finish_catch(&mut self, env: &mut GuardEnv<'_, '_>) {
        env.ledger.restore_to_snapshot(env.collab.scene);
        self.caught_latched = false;
        env.spotted.unlock();
        self.current_detection = 0.0;
        self.speeds_frozen = false;
        debug!(guard = %self.id, "Catch effect finished");
    }

    // -----------------------------------------------------------------------
    // States
    // -----------------------------------------------------------------------

    fn set_next_patrol_point(&mut self) {
        self.destination = self.waypoints[self.next_waypoint];
        self.next_waypoint = (self.next_waypoint + 1) % self.waypoints.len();
    }

    fn patrol(&mut self, dt: f32) {
        if self.dwell.is_running() {
            if self.dwell.advance(dt).is_some() {
                self.set_next_patrol_point();
            }
            return;
        }
        if self.move_towards_destination(dt) {
            self.dwell.start(PatrolPause, self.config.pause_duration);
        }
    }

    fn start_chasing(&mut self, collab: &mut Collaborators<'_>) {
        self.state = GuardState::Chasing;
        self.dwell.cancel();
        self.search_timer.cancel();
        if !self.alert_played {
            if self.config.alert_variants > 0 {
                let variant = self.rng.gen_range(0..self.config.alert_variants);
                collab.audio.play_one_shot(Cue::GuardAlert(variant));
            }
            self.alert_played = true;
        }
        self.chase_time_remaining = self.config.chase_duration;
        debug!(guard = %self.id, "Chasing");
    }

    fn chase(&mut self, dt: f32, visible: bool, space: &dyn SpatialQuery) {
        if visible {
            self.chase_time_remaining = self.config.chase_duration;
        } else {
            self.chase_time_remaining -= dt;
            if self.chase_time_remaining <= 0.0 {
                self.start_searching(space);
                return;
            }
        }
        self.destination = self.last_known_target;
        // Close in to arm's reach, never onto the spot itself.
        let gap = self.position.distance(self.destination) - self.config.arrival_tolerance;
        if gap > 0.0 {
            self.step_towards(self.destination, (self.speed() * dt).min(gap));
        }
    }

    fn start_searching(&mut self, space: &dyn SpatialQuery) {
        self.state = GuardState::Searching;
        self.search_timer.start(SearchTimer, self.config.search_duration);
        self.pick_search_point(space);
        debug!(guard = %self.id, around = %self.last_known_target, "Searching");
    }

    fn search(&mut self, dt: f32, space: &dyn SpatialQuery) {
        if self.search_timer.advance(dt).is_some() {
            self.state = GuardState::Patrolling;
            self.set_next_patrol_point();
            debug!(guard = %self.id, "Search over, resuming patrol");
            return;
        }
        if self.move_towards_destination(dt) {
            self.pick_search_point(space);
        }
    }

    fn pick_search_point(&mut self, space: &dyn SpatialQuery) -> bool {
        let radius = self.config.search_radius;
        for _ in 0..self.config.search_sample_attempts {
            let candidate = self.last_known_target + random_in_unit_sphere(&mut self.rng) * radius;
            if let Some(point) = space.sample_reachable_point(candidate, radius) {
                self.destination = point;
                return true;
            }
        }
        debug!(guard = %self.id, "No reachable search point");
        false
    }

    /// Step toward the destination; returns `true` once within tolerance.
    fn move_towards_destination(&mut self, dt: f32) -> bool {
        self.step_towards(self.destination, self.speed() * dt);
        self.position.distance(self.destination) <= self.config.arrival_tolerance
    }

    fn step_towards(&mut self, to: Vec3, max_step: f32) {
        let next = self.position.move_towards(to, max_step);
        let heading = next - self.position;
        if heading.length() > f32::EPSILON {
            self.forward = heading.normalized();
        }
        self.position = next;
    }
}

/// Uniform point inside the unit sphere.
fn random_in_unit_sphere(rng: &mut StdRng) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
    let r = rng.r#gen::<f32>().cbrt();
    let ring = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(ring * theta.cos(), z, ring * theta.sin()) * r
}

impl Interactable for Guard {
    fn interact(&mut self, ctx: &mut InteractContext<'_>) {
        if self.pickpocketed {
            return;
        }
        ctx.ledger.add_player_gold(self.config.gold_amount);
        self.pickpocketed = true;
        ctx.audio.play_one_shot(Cue::Pickpocket);
        info!(guard = %self.id, gold = self.config.gold_amount, "Guard pickpocketed");

        if self.act == Some(Act::One) {
            if let Err(e) = ctx.ledger.complete_task(Task::RobThief) {
                warn!(guard = %self.id, error = %e, "Thief robbed before the task was set");
            }
        }
    }

    fn interact_distance(&self) -> f32 {
        self.config.interact_distance
    }
}
