//! Headless collaborator backends.
//!
//! Stand-ins for the engine services the core calls out to, used by the
//! `shade-sim` binary, the benches and the integration tests. They record
//! what they were asked to do so callers can assert on it afterwards.

use std::collections::HashMap;

use shade_core::collab::{
    AudioSink, Collider, Cue, ObjectRef, Presentation, RayHit, SceneLoader, SpatialQuery, Target,
};
use shade_core::types::{GuardId, Room, Vec3};

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A spherical obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Centre.
    pub center: Vec3,
    /// Radius.
    pub radius: f32,
}

impl Sphere {
    /// Distance along a unit-length ray to the first surface hit.
    fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let oc = origin - self.center;
        let b = oc.dot(direction);
        let c = oc.dot(oc) - self.radius * self.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let near = -b - root;
        if near >= 0.0 {
            return Some(near);
        }
        // Origin inside the sphere.
        let far = -b + root;
        (far >= 0.0).then_some(0.0)
    }

    fn contains(&self, point: Vec3) -> bool {
        point.distance(self.center) < self.radius
    }
}

/// Flat rectangular ground with sphere occluders.
///
/// The target is modelled as a sphere of `target_radius` centred
/// `target_height` above its feet; [`OpenField::set_target`] must be called
/// whenever it moves.
#[derive(Debug, Clone)]
pub struct OpenField {
    min: Vec3,
    max: Vec3,
    occluders: Vec<Sphere>,
    target: Vec3,
    target_height: f32,
    target_radius: f32,
}

impl OpenField {
    /// Ground spanning `min..max` on the XZ plane.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            occluders: Vec::new(),
            target: Vec3::ZERO,
            target_height: 1.0,
            target_radius: 0.5,
        }
    }

    /// Add an occluder.
    #[must_use]
    pub fn with_occluder(mut self, center: Vec3, radius: f32) -> Self {
        self.occluders.push(Sphere { center, radius });
        self
    }

    /// Where the target's feet are.
    pub fn set_target(&mut self, position: Vec3) {
        self.target = position;
    }

    fn clamp(&self, p: Vec3) -> Vec3 {
        Vec3::new(p.x.clamp(self.min.x, self.max.x), 0.0, p.z.clamp(self.min.z, self.max.z))
    }
}

impl SpatialQuery for OpenField {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let direction = direction.normalized();
        if direction == Vec3::ZERO {
            return None;
        }
        let obstacle = self
            .occluders
            .iter()
            .filter_map(|s| s.intersect(origin, direction))
            .filter(|&t| t <= max_distance)
            .min_by(f32::total_cmp);
        let target = Sphere {
            center: self.target + Vec3::UP * self.target_height,
            radius: self.target_radius,
        }
        .intersect(origin, direction)
        .filter(|&t| t <= max_distance);

        match (obstacle, target) {
            (Some(o), Some(t)) if t <= o => Some(RayHit { distance: t, collider: Collider::Target }),
            (Some(o), _) => Some(RayHit { distance: o, collider: Collider::Obstacle }),
            (None, Some(t)) => Some(RayHit { distance: t, collider: Collider::Target }),
            (None, None) => None,
        }
    }

    fn sample_reachable_point(&self, center: Vec3, radius: f32) -> Option<Vec3> {
        let point = self.clamp(center);
        if point.distance(Vec3::new(center.x, 0.0, center.z)) > radius {
            return None;
        }
        if self.occluders.iter().any(|s| s.contains(point)) {
            return None;
        }
        Some(point)
    }
}

// ---------------------------------------------------------------------------
// Recorders
// ---------------------------------------------------------------------------

/// Records scene reloads and object toggles.
#[derive(Debug, Default)]
pub struct RecordingScene {
    /// Every reload request, in order.
    pub reloads: Vec<Room>,
    /// Last requested visibility per object.
    pub active: HashMap<ObjectRef, bool>,
}

impl RecordingScene {
    /// Whether `object` was last set active.
    #[must_use]
    pub fn is_active(&self, object: ObjectRef) -> bool {
        self.active.get(&object).copied().unwrap_or(false)
    }
}

impl SceneLoader for RecordingScene {
    fn reload_scene(&mut self, room: Room) {
        self.reloads.push(room);
    }

    fn set_active(&mut self, object: ObjectRef, active: bool) {
        self.active.insert(object, active);
    }
}

/// Records every cue played.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    /// Cues in play order.
    pub cues: Vec<Cue>,
}

impl RecordingAudio {
    /// How many times `cue` was played.
    #[must_use]
    pub fn count(&self, cue: Cue) -> usize {
        self.cues.iter().filter(|&&c| c == cue).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play_one_shot(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}

/// Keeps the latest UI state.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    /// Latest detection meter per guard.
    pub detection: HashMap<GuardId, f32>,
    /// Latest spotted vignette intensity.
    pub spotted_intensity: f32,
    /// Latest caught message.
    pub caught_message: Option<String>,
    /// Times the caught effect was triggered.
    pub caught_effects: u32,
}

impl Presentation for RecordingPresentation {
    fn set_detection_fraction(&mut self, guard: GuardId, fraction: f32) {
        self.detection.insert(guard, fraction);
    }

    fn set_spotted_intensity(&mut self, intensity: f32) {
        self.spotted_intensity = intensity;
    }

    fn set_caught_message(&mut self, message: &str) {
        self.caught_message = Some(message.to_owned());
    }

    fn trigger_caught_effect(&mut self) {
        self.caught_effects += 1;
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// A player that walks a fixed route.
#[derive(Debug, Clone)]
pub struct ScriptedTarget {
    position: Vec3,
    forward: Vec3,
    route: Vec<Vec3>,
    cursor: usize,
    speed: f32,
    /// Host-side invisibility (e.g. a cutscene), on top of any spell.
    pub invisible: bool,
}

impl ScriptedTarget {
    /// Start at `start` and walk `route` in order at `speed`.
    #[must_use]
    pub fn new(start: Vec3, route: Vec<Vec3>, speed: f32) -> Self {
        Self {
            position: start,
            forward: Vec3::FORWARD,
            route,
            cursor: 0,
            speed,
            invisible: false,
        }
    }

    /// Teleport, as on a respawn.
    pub fn place(&mut self, position: Vec3, forward: Vec3) {
        self.position = position;
        self.forward = forward.normalized();
        self.cursor = 0;
    }

    /// Whether the route has been walked to its end.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.cursor >= self.route.len()
    }

    /// Walk for `dt` seconds at `speed × multiplier`.
    pub fn advance(&mut self, dt: f32, multiplier: f32) {
        let Some(&goal) = self.route.get(self.cursor) else {
            return;
        };
        let next = self.position.move_towards(goal, self.speed * multiplier * dt);
        let heading = next - self.position;
        if heading.length() > f32::EPSILON {
            self.forward = heading.normalized();
        }
        self.position = next;
        if self.position.distance(goal) <= f32::EPSILON {
            self.cursor += 1;
        }
    }
}

impl Target for ScriptedTarget {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn is_invisible(&self) -> bool {
        self.invisible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> OpenField {
        OpenField::new(Vec3::new(-50.0, 0.0, -50.0), Vec3::new(50.0, 0.0, 50.0))
    }

    #[test]
    fn ray_hits_target_in_open_ground() {
        let mut f = field();
        f.set_target(Vec3::new(0.0, 0.0, 5.0));
        let hit = f.raycast(Vec3::UP, Vec3::FORWARD, 10.0).expect("hit");
        assert_eq!(hit.collider, Collider::Target);
        assert!((hit.distance - 4.5).abs() < 1e-4);
    }

    #[test]
    fn occluder_in_front_blocks_target() {
        let mut f = field().with_occluder(Vec3::new(0.0, 1.0, 2.5), 1.0);
        f.set_target(Vec3::new(0.0, 0.0, 5.0));
        let hit = f.raycast(Vec3::UP, Vec3::FORWARD, 10.0).expect("hit");
        assert_eq!(hit.collider, Collider::Obstacle);
    }

    #[test]
    fn target_beyond_range_is_missed() {
        let mut f = field();
        f.set_target(Vec3::new(0.0, 0.0, 30.0));
        assert!(f.raycast(Vec3::UP, Vec3::FORWARD, 10.0).is_none());
    }

    #[test]
    fn reachable_points_stay_in_bounds() {
        let f = field().with_occluder(Vec3::new(10.0, 0.0, 10.0), 2.0);
        assert_eq!(
            f.sample_reachable_point(Vec3::new(3.0, 2.0, 4.0), 5.0),
            Some(Vec3::new(3.0, 0.0, 4.0))
        );
        assert_eq!(f.sample_reachable_point(Vec3::new(10.0, 0.0, 10.0), 5.0), None);
        assert_eq!(f.sample_reachable_point(Vec3::new(80.0, 0.0, 0.0), 5.0), None);
        assert_eq!(
            f.sample_reachable_point(Vec3::new(52.0, 0.0, 0.0), 5.0),
            Some(Vec3::new(50.0, 0.0, 0.0))
        );
    }

    #[test]
    fn scripted_target_walks_route() {
        let mut t = ScriptedTarget::new(Vec3::ZERO, vec![Vec3::new(0.0, 0.0, 2.0)], 1.0);
        t.advance(1.0, 1.0);
        assert!((t.position().z - 1.0).abs() < 1e-6);
        t.advance(1.0, 2.0);
        assert!(t.finished());
        assert_eq!(t.position(), Vec3::new(0.0, 0.0, 2.0));
    }
}
