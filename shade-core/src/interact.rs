//! The interactable capability and the simplest thing that has it.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::collab::{AudioSink, Cue};
use crate::ledger::ProgressionLedger;
use crate::types::Vec3;

/// What an interaction may touch.
pub struct InteractContext<'a> {
    /// The progression ledger.
    pub ledger: &'a mut ProgressionLedger,
    /// Audio for feedback cues.
    pub audio: &'a mut dyn AudioSink,
}

/// Something the player can hold the interact key on.
pub trait Interactable {
    /// Run the interaction.
    fn interact(&mut self, ctx: &mut InteractContext<'_>);
    /// Maximum distance the player may stand from it.
    fn interact_distance(&self) -> f32;
}

/// A pickpocketable townsperson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bystander {
    /// Stable identifier.
    pub id: Uuid,
    /// World position.
    pub position: Vec3,
    gold_amount: i32,
    interact_distance: f32,
    pickpocketed: bool,
}

impl Bystander {
    /// A bystander carrying `gold_amount`.
    #[must_use]
    pub fn new(position: Vec3, gold_amount: i32, interact_distance: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            gold_amount,
            interact_distance,
            pickpocketed: false,
        }
    }

    /// Whether the pocket is already empty.
    #[must_use]
    pub fn has_pickpocketed(&self) -> bool {
        self.pickpocketed
    }

    /// Refill the pocket, as on a scene reload.
    pub fn reset(&mut self) {
        self.pickpocketed = false;
    }
}

impl Interactable for Bystander {
    fn interact(&mut self, ctx: &mut InteractContext<'_>) {
        if self.pickpocketed {
            return;
        }
        ctx.ledger.add_player_gold(self.gold_amount);
        self.pickpocketed = true;
        ctx.audio.play_one_shot(Cue::Pickpocket);
        debug!(bystander = %self.id, gold = self.gold_amount, "Bystander pickpocketed");
    }

    fn interact_distance(&self) -> f32 {
        self.interact_distance
    }
}
