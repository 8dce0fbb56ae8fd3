//! Narrow interfaces to the host engine.
//!
//! The core never owns rendering, audio, physics or scene management. It
//! calls out through these traits as fire-and-forget notifications and reads
//! the few values it needs (target pose, ray hits) back. Implementations are
//! wired once per tick through [`Collaborators`].

use serde::{Deserialize, Serialize};

use crate::types::{Door, GuardId, Room, Vec3};

/// A scene object the core can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectRef {
    /// The checkpoint trigger at a route index.
    Checkpoint(usize),
    /// A door that appears rather than swings.
    Door(Door),
    /// A guard's outline, shown by the reveal spell.
    GuardOutline(GuardId),
    /// The hold-to-interact prompt.
    InteractPrompt,
    /// The interact progress bar.
    InteractProgress,
    /// A spell's active overlay.
    SpellOverlay(crate::spell::SpellKind),
}

/// Audio clip identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// One of the guard's alert barks, by variant.
    GuardAlert(u32),
    /// Gold lifted from a pocket.
    Pickpocket,
    /// Checkpoint passed.
    Checkpoint,
    /// The player remarks on reaching the end of a route.
    PlayerSpeech,
    /// A spell was cast.
    SpellCast(crate::spell::SpellKind),
    /// A door started opening.
    DoorOpen,
    /// A door started closing.
    DoorClose,
    /// The castle gate started rising.
    GateOpen,
    /// The castle gate started falling.
    GateClose,
}

/// Scene management.
pub trait SceneLoader {
    /// Reload the scene that hosts `room`.
    fn reload_scene(&mut self, room: Room);
    /// Show or hide an object.
    fn set_active(&mut self, object: ObjectRef, active: bool);
}

/// One-shot audio.
pub trait AudioSink {
    /// Play a clip once.
    fn play_one_shot(&mut self, cue: Cue);
}

/// The object guards try to see.
pub trait Target {
    /// World position (feet).
    fn position(&self) -> Vec3;
    /// Facing direction.
    fn forward(&self) -> Vec3;
    /// Whether guards are currently unable to see it.
    fn is_invisible(&self) -> bool;
}

/// What a line-of-sight ray struck first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collider {
    /// The tracked target.
    Target,
    /// Any other geometry.
    Obstacle,
}

/// Result of a raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin.
    pub distance: f32,
    /// What was hit.
    pub collider: Collider,
}

/// Physics and navigation queries.
pub trait SpatialQuery {
    /// First hit along `direction` within `max_distance`, if any.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
    /// Nearest walkable point to `center` within `radius`.
    fn sample_reachable_point(&self, center: Vec3, radius: f32) -> Option<Vec3>;
}

/// UI and screen effects.
pub trait Presentation {
    /// Fill of a guard's detection meter, 0..=1.
    fn set_detection_fraction(&mut self, guard: GuardId, fraction: f32);
    /// Intensity of the shared "spotted" vignette.
    fn set_spotted_intensity(&mut self, intensity: f32);
    /// Text for the caught screen.
    fn set_caught_message(&mut self, message: &str);
    /// Start the caught screen effect.
    fn trigger_caught_effect(&mut self);
}

/// Every collaborator a tick may call, borrowed for the duration of the tick.
pub struct Collaborators<'a> {
    /// Scene management.
    pub scene: &'a mut dyn SceneLoader,
    /// Audio.
    pub audio: &'a mut dyn AudioSink,
    /// The tracked target.
    pub target: &'a dyn Target,
    /// Physics queries.
    pub space: &'a dyn SpatialQuery,
    /// UI.
    pub presentation: &'a mut dyn Presentation,
}
