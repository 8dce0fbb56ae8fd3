//! Trigger events raised by the host.
//!
//! Trigger volumes, key presses and shop buttons in the host engine are
//! translated into [`TriggerEvent`]s (see [`crate::hooks`]) and fed to
//! [`crate::systems::World::handle_event`].

use shade_core::spell::SpellKind;
use shade_core::types::{CheckpointId, Door, Room};

/// Something the player did that the world must react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// The player walked into a checkpoint trigger.
    CheckpointEntered {
        /// Which checkpoint.
        checkpoint: CheckpointId,
    },

    /// The player walked into a save point trigger.
    SavePointEntered {
        /// The save point's position in the save order.
        index: u32,
    },

    /// A story beat asked for a door to open or close.
    DoorCommand {
        /// Which door.
        door: Door,
        /// `true` to open, `false` to close.
        open: bool,
    },

    /// The player pressed a spell's cast key.
    CastSpell {
        /// Which spell.
        spell: SpellKind,
    },

    /// The player pressed a shop button.
    BuySpell {
        /// Which spell.
        spell: SpellKind,
    },

    /// The player walked through a room transition.
    EnterRoom {
        /// Destination room.
        room: Room,
    },
}

impl TriggerEvent {
    /// Short name for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::CheckpointEntered { .. } => "checkpoint",
            Self::SavePointEntered { .. } => "save_point",
            Self::DoorCommand { .. } => "door",
            Self::CastSpell { .. } => "cast_spell",
            Self::BuySpell { .. } => "buy_spell",
            Self::EnterRoom { .. } => "enter_room",
        }
    }

    /// Whether handling this event can change what is saved.
    #[must_use]
    pub fn touches_ledger(&self) -> bool {
        !matches!(self, Self::CastSpell { .. })
    }
}
