//! # SHADE Core Library
//!
//! Engine-agnostic core of a narrative stealth adventure: guards that patrol,
//! spot, chase and search for the player, and the progression ledger that
//! records what the player has done so far.
//!
//! - [`ledger`]: the [`ProgressionLedger`] of doors, interactions, tasks,
//!   choices, checkpoints, gold, morality and spells, plus a single restore
//!   snapshot.
//! - [`guard`]: the [`Guard`] state machine (Patrolling → Chasing →
//!   Searching → Patrolling) driven by a vision-cone check.
//! - [`spotted`]: the shared "you are spotted" indicator.
//! - [`sequence`]: resumable timers that replace engine coroutines.
//! - [`spell`]: purchasable player spells with duration and cooldown.
//! - [`interact`]: the two-operation [`Interactable`] capability.
//! - [`collab`]: the narrow traits through which the core talks to the
//!   host engine (scene loading, audio, physics queries, UI).
//! - [`metrics`]: gameplay counters and the per-tick budget monitor.
//!
//! ## Execution model
//!
//! Everything here is single-threaded and advanced in lock-step, once per
//! tick, by the caller. Nothing blocks; long-running behaviour is expressed
//! as a [`sequence::Countdown`] that is advanced by `dt` each tick.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collab;
pub mod config;
pub mod error;
pub mod guard;
pub mod interact;
pub mod ledger;
pub mod metrics;
pub mod sequence;
pub mod spell;
pub mod spotted;
pub mod types;

pub use config::ShadeConfig;
pub use error::ShadeError;
pub use guard::{Guard, GuardState};
pub use interact::Interactable;
pub use ledger::ProgressionLedger;
pub use spotted::SpottedIndicator;
pub use types::*;
