//! Shared "you are spotted" indicator.
//!
//! Every guard that currently has the target in sight registers here. The
//! vignette is shown while at least one guard is registered and fades out
//! once the last one loses sight. Registration is keyed by [`GuardId`], so a
//! guard reporting the same loss twice cannot drive the count out of step
//! with reality.

use std::collections::BTreeSet;

use tracing::debug;

use crate::collab::Presentation;
use crate::config::SpottedConfig;
use crate::sequence::SequenceSlot;
use crate::types::GuardId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpottedPhase {
    FadeOut,
}

/// Aggregates sightings across guards into one screen effect.
#[derive(Debug, Clone)]
pub struct SpottedIndicator {
    spotters: BTreeSet<GuardId>,
    locked: bool,
    intensity: f32,
    fade: SequenceSlot<SpottedPhase>,
    spotted_intensity: f32,
    fade_out_speed: f32,
}

impl SpottedIndicator {
    /// Create an idle indicator.
    #[must_use]
    pub fn new(config: &SpottedConfig) -> Self {
        Self {
            spotters: BTreeSet::new(),
            locked: false,
            intensity: 0.0,
            fade: SequenceSlot::new(),
            spotted_intensity: config.spotted_intensity,
            fade_out_speed: config.fade_out_speed,
        }
    }

    /// Register a guard that gained sight. Refused while locked.
    ///
    /// Returns `true` if the guard was newly registered.
    pub fn add(&mut self, guard: GuardId) -> bool {
        if self.locked {
            return false;
        }
        let added = self.spotters.insert(guard);
        if added && self.spotters.len() == 1 {
            self.fade.cancel();
            self.intensity = self.spotted_intensity;
            debug!(guard = %guard, "Spotted effect started");
        }
        added
    }

    /// Unregister a guard that lost sight.
    ///
    /// Returns `true` if the guard was registered.
    pub fn remove(&mut self, guard: GuardId) -> bool {
        let removed = self.spotters.remove(&guard);
        if removed && self.spotters.is_empty() {
            let duration = if self.fade_out_speed > 0.0 {
                self.intensity / self.fade_out_speed
            } else {
                0.0
            };
            self.fade.start(SpottedPhase::FadeOut, duration);
            debug!(guard = %guard, "Spotted effect fading");
        }
        removed
    }

    /// Refuse new registrations (a catch is playing).
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Accept registrations again.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Whether registrations are refused.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Drop every registration and hide the effect immediately.
    pub fn stop_effect(&mut self) {
        self.spotters.clear();
        self.fade.cancel();
        self.intensity = 0.0;
    }

    /// Number of guards that currently see the target.
    #[must_use]
    pub fn count(&self) -> usize {
        self.spotters.len()
    }

    /// Whether `guard` is registered.
    #[must_use]
    pub fn contains(&self, guard: GuardId) -> bool {
        self.spotters.contains(&guard)
    }

    /// Whether the effect is active (at least one spotter).
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.spotters.is_empty()
    }

    /// Current vignette intensity.
    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Advance the fade and push the intensity to the presentation layer.
    pub fn tick(&mut self, dt: f32, presentation: &mut dyn Presentation) {
        if self.fade.is_running() {
            self.intensity = (self.intensity - self.fade_out_speed * dt).max(0.0);
            if self.fade.advance(dt).is_some() {
                self.intensity = 0.0;
            }
        }
        presentation.set_spotted_intensity(self.intensity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sink(f32);

    impl Presentation for Sink {
        fn set_detection_fraction(&mut self, _guard: GuardId, _fraction: f32) {}
        fn set_spotted_intensity(&mut self, intensity: f32) {
            self.0 = intensity;
        }
        fn set_caught_message(&mut self, _message: &str) {}
        fn trigger_caught_effect(&mut self) {}
    }

    fn indicator() -> SpottedIndicator {
        SpottedIndicator::new(&SpottedConfig::default())
    }

    #[test]
    fn two_guards_count_and_clear() {
        let (a, b) = (GuardId::new(), GuardId::new());
        let mut spotted = indicator();
        spotted.add(a);
        spotted.add(b);
        assert_eq!(spotted.count(), 2);
        spotted.remove(a);
        assert_eq!(spotted.count(), 1);
        assert!(spotted.is_visible());
        spotted.remove(b);
        assert_eq!(spotted.count(), 0);
        assert!(!spotted.is_visible());
    }

    #[test]
    fn duplicate_add_and_remove_are_idempotent() {
        let a = GuardId::new();
        let mut spotted = indicator();
        assert!(spotted.add(a));
        assert!(!spotted.add(a));
        assert!(spotted.remove(a));
        assert!(!spotted.remove(a));
        assert_eq!(spotted.count(), 0);
    }

    #[test]
    fn locked_refuses_new_spotters() {
        let mut spotted = indicator();
        spotted.lock();
        assert!(!spotted.add(GuardId::new()));
        spotted.unlock();
        assert!(spotted.add(GuardId::new()));
    }

    #[test]
    fn fade_reaches_zero_and_respot_cancels_it() {
        let a = GuardId::new();
        let mut spotted = indicator();
        let mut sink = Sink::default();
        spotted.add(a);
        spotted.tick(0.1, &mut sink);
        assert!((sink.0 - 0.4).abs() < f32::EPSILON);

        spotted.remove(a);
        spotted.tick(0.4, &mut sink);
        assert!((sink.0 - 0.2).abs() < 1e-5);

        spotted.add(a);
        spotted.tick(0.4, &mut sink);
        assert!((sink.0 - 0.4).abs() < f32::EPSILON);

        spotted.remove(a);
        for _ in 0..20 {
            spotted.tick(0.1, &mut sink);
        }
        assert_eq!(sink.0, 0.0);
    }

    #[test]
    fn stop_effect_clears_everything() {
        let mut spotted = indicator();
        spotted.add(GuardId::new());
        spotted.stop_effect();
        assert_eq!(spotted.count(), 0);
        assert_eq!(spotted.intensity(), 0.0);
    }
}
