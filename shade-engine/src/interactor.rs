//! Hold-to-interact.
//!
//! The host decides what the player is looking at each frame and passes it
//! in as a [`Focus`]. Holding the interact key on the same focus for
//! `hold_time` seconds fires the interaction once; looking away or releasing
//! the key throws the progress away.

use shade_core::collab::{ObjectRef, SceneLoader};
use shade_core::sequence::Countdown;
use shade_core::types::GuardId;
use tracing::debug;
use uuid::Uuid;

/// The interactable currently under the crosshair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    /// A guard (or the thief).
    Guard(GuardId),
    /// A townsperson.
    Bystander(Uuid),
}

/// What the host sees this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusView {
    /// The focused interactable.
    pub focus: Focus,
    /// Whether its pocket is already empty.
    pub exhausted: bool,
}

/// Tracks hold progress against one focus at a time.
#[derive(Debug, Clone)]
pub struct Interactor {
    hold_time: f32,
    focus: Option<FocusView>,
    hold: Option<Countdown>,
}

impl Interactor {
    /// Create an interactor needing `hold_time` seconds of holding.
    #[must_use]
    pub fn new(hold_time: f32) -> Self {
        Self {
            hold_time,
            focus: None,
            hold: None,
        }
    }

    /// Advance one frame. Returns the focus to interact with when the hold
    /// completes this frame.
    pub fn update(
        &mut self,
        dt: f32,
        view: Option<FocusView>,
        holding: bool,
        scene: &mut dyn SceneLoader,
    ) -> Option<Focus> {
        let focus_changed = self.focus.map(|v| v.focus) != view.map(|v| v.focus);
        if focus_changed && self.hold.take().is_some() {
            debug!("Interaction cancelled: focus changed");
        }
        self.focus = view;

        let fired = match view {
            Some(v) if holding && !v.exhausted => {
                let hold = self.hold.get_or_insert_with(|| Countdown::new(self.hold_time));
                if hold.advance(dt) {
                    self.hold = None;
                    Some(v.focus)
                } else {
                    None
                }
            }
            _ => {
                self.hold = None;
                None
            }
        };

        scene.set_active(ObjectRef::InteractPrompt, self.focus.is_some());
        scene.set_active(ObjectRef::InteractProgress, self.hold.is_some());
        fired
    }

    /// Drop focus and progress, as on a room load.
    pub fn reset(&mut self, scene: &mut dyn SceneLoader) {
        self.focus = None;
        self.hold = None;
        scene.set_active(ObjectRef::InteractPrompt, false);
        scene.set_active(ObjectRef::InteractProgress, false);
    }

    /// Hold progress, 0..=1.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.hold.as_ref().map_or(0.0, Countdown::fraction)
    }

    /// Current focus.
    #[must_use]
    pub fn focus(&self) -> Option<Focus> {
        self.focus.map(|v| v.focus)
    }

    /// Prompt text for the current focus.
    #[must_use]
    pub fn prompt(&self) -> Option<String> {
        let view = self.focus?;
        if view.exhausted {
            return Some("Cannot Pickpocket".to_owned());
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (self.progress() * 100.0).floor() as u32;
        Some(format!("Hold E to Pickpocket ({percent}%)"))
    }
}
