//! Constructors that turn raw host callbacks into [`TriggerEvent`]s.
//!
//! Hosts identify content by plain indices. These hooks are the boundary
//! where an index is checked; anything past them is typed.

use shade_core::error::Result;
use shade_core::spell::SpellKind;
use shade_core::types::{CheckpointId, Door, Room};

use crate::events::TriggerEvent;

/// A checkpoint trigger fired.
///
/// # Errors
/// Returns `ShadeError::IndexOutOfRange` for an unknown checkpoint.
pub fn on_checkpoint_entered(index: usize) -> Result<TriggerEvent> {
    Ok(TriggerEvent::CheckpointEntered {
        checkpoint: CheckpointId::new(index)?,
    })
}

/// A save point trigger fired.
#[must_use]
pub fn on_save_point_entered(index: u32) -> TriggerEvent {
    TriggerEvent::SavePointEntered { index }
}

/// A door should open.
///
/// # Errors
/// Returns `ShadeError::IndexOutOfRange` for an unknown door.
pub fn on_door_open(index: usize) -> Result<TriggerEvent> {
    Ok(TriggerEvent::DoorCommand {
        door: Door::try_from(index)?,
        open: true,
    })
}

/// A door should close.
///
/// # Errors
/// Returns `ShadeError::IndexOutOfRange` for an unknown door.
pub fn on_door_close(index: usize) -> Result<TriggerEvent> {
    Ok(TriggerEvent::DoorCommand {
        door: Door::try_from(index)?,
        open: false,
    })
}

/// A spell key was pressed.
#[must_use]
pub fn on_spell_key(spell: SpellKind) -> TriggerEvent {
    TriggerEvent::CastSpell { spell }
}

/// A shop button was pressed.
#[must_use]
pub fn on_spell_purchase(spell: SpellKind) -> TriggerEvent {
    TriggerEvent::BuySpell { spell }
}

/// A room transition was walked through.
///
/// # Errors
/// Returns `ShadeError::IndexOutOfRange` for an unknown room.
pub fn on_room_entered(index: usize) -> Result<TriggerEvent> {
    Ok(TriggerEvent::EnterRoom {
        room: Room::try_from(index)?,
    })
}
