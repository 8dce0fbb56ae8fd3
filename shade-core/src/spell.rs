//! Player spells: invisibility, speed and reveal.
//!
//! Each [`SpellController`] cycles Ready → Active → Cooldown → Ready as it is
//! ticked. Purchasing and casting are recorded through the ledger; redundant
//! requests are no-ops reported through outcome enums.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collab::{AudioSink, Cue};
use crate::config::SpellConfig;
use crate::ledger::ProgressionLedger;
use crate::sequence::SequenceSlot;

/// The purchasable spells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellKind {
    /// Guards cannot see the player.
    Invisibility,
    /// The player moves faster.
    Speed,
    /// Nearby guards are outlined.
    Reveal,
}

impl SpellKind {
    /// Every spell.
    pub const ALL: [Self; 3] = [Self::Invisibility, Self::Speed, Self::Reveal];
}

/// Result of a purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Already owned; nothing changed.
    AlreadyPurchased,
    /// Not enough gold; nothing changed.
    InsufficientGold {
        /// Price that was asked.
        price: i32,
    },
    /// Gold deducted and the spell recorded as owned.
    Purchased {
        /// Price that was paid.
        price: i32,
    },
}

/// Result of a cast attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivateOutcome {
    /// The spell is not owned.
    NotPurchased,
    /// The spell is already running.
    AlreadyActive,
    /// The spell is recharging.
    OnCooldown,
    /// The spell started.
    Activated,
}

/// Phase change reported by [`SpellController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellTransition {
    /// The effect ended; cooldown started.
    Ended,
    /// Cooldown finished; the spell can be cast again.
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpellPhase {
    Active,
    Cooldown,
}

/// Runtime state of one spell.
#[derive(Debug, Clone)]
pub struct SpellController {
    kind: SpellKind,
    config: SpellConfig,
    phase: SequenceSlot<SpellPhase>,
}

impl SpellController {
    /// A ready controller for `kind`.
    #[must_use]
    pub fn new(kind: SpellKind, config: SpellConfig) -> Self {
        Self {
            kind,
            config,
            phase: SequenceSlot::new(),
        }
    }

    /// Which spell this is.
    #[must_use]
    pub fn kind(&self) -> SpellKind {
        self.kind
    }

    /// Tuning for this spell.
    #[must_use]
    pub fn config(&self) -> &SpellConfig {
        &self.config
    }

    /// Buy the spell at the morality-adjusted price.
    pub fn purchase(&self, ledger: &mut ProgressionLedger) -> PurchaseOutcome {
        if ledger.is_spell_purchased(self.kind) {
            debug!(spell = ?self.kind, "Spell already purchased");
            return PurchaseOutcome::AlreadyPurchased;
        }
        let price = ledger.calculate_adjusted_price(self.config.cost);
        if !ledger.try_spend_gold(price) {
            debug!(spell = ?self.kind, price, gold = ledger.player_gold(), "Not enough gold");
            return PurchaseOutcome::InsufficientGold { price };
        }
        ledger.set_spell_purchased(self.kind, true);
        info!(spell = ?self.kind, price, "Spell purchased");
        PurchaseOutcome::Purchased { price }
    }

    /// Cast the spell.
    pub fn activate(&mut self, ledger: &ProgressionLedger, audio: &mut dyn AudioSink) -> ActivateOutcome {
        if !ledger.is_spell_purchased(self.kind) {
            debug!(spell = ?self.kind, "Spell not purchased, cannot activate");
            return ActivateOutcome::NotPurchased;
        }
        match self.phase.phase() {
            Some(SpellPhase::Active) => {
                debug!(spell = ?self.kind, "Spell already active");
                ActivateOutcome::AlreadyActive
            }
            Some(SpellPhase::Cooldown) => {
                debug!(spell = ?self.kind, "Spell on cooldown");
                ActivateOutcome::OnCooldown
            }
            None => {
                self.phase.start(SpellPhase::Active, self.config.duration);
                audio.play_one_shot(Cue::SpellCast(self.kind));
                info!(spell = ?self.kind, "Spell activated");
                ActivateOutcome::Activated
            }
        }
    }

    /// Advance the active or cooldown timer.
    pub fn tick(&mut self, dt: f32) -> Option<SpellTransition> {
        match self.phase.advance(dt)? {
            SpellPhase::Active => {
                self.phase.start(SpellPhase::Cooldown, self.config.cooldown);
                debug!(spell = ?self.kind, "Spell ended");
                Some(SpellTransition::Ended)
            }
            SpellPhase::Cooldown => {
                debug!(spell = ?self.kind, "Spell ready");
                Some(SpellTransition::Ready)
            }
        }
    }

    /// Whether the effect is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase.phase() == Some(SpellPhase::Active)
    }

    /// Whether the spell is recharging.
    #[must_use]
    pub fn is_on_cooldown(&self) -> bool {
        self.phase.phase() == Some(SpellPhase::Cooldown)
    }

    /// Fill of the duration icon: drains while active, full otherwise.
    #[must_use]
    pub fn duration_fill(&self) -> f32 {
        match (self.phase.phase(), self.phase.countdown()) {
            (Some(SpellPhase::Active), Some(c)) => 1.0 - c.fraction(),
            _ => 1.0,
        }
    }

    /// Status text: "Ready", "Active", or whole seconds of cooldown left.
    #[must_use]
    pub fn status_label(&self) -> String {
        match (self.phase.phase(), self.phase.countdown()) {
            (Some(SpellPhase::Active), _) => "Active".to_string(),
            (Some(SpellPhase::Cooldown), Some(c)) => format!("{}s", c.remaining().ceil()),
            _ => "Ready".to_string(),
        }
    }

    /// Speed multiplier to apply to the player right now.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        if self.kind == SpellKind::Speed && self.is_active() {
            self.config.speed_multiplier
        } else {
            1.0
        }
    }
}
