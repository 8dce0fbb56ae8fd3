//! # shade-engine: Host Integration for SHADE
//!
//! This crate sits between the engine-agnostic `shade-core` library and a
//! host game engine. The host raises trigger events and ticks the world;
//! the crate calls back out through the `shade_core::collab` traits.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               Host engine               │
//! │  ┌───────────────────────────────────┐  │
//! │  │          shade-engine             │  │
//! │  │  ┌─────────────┐ ┌─────────────┐  │  │
//! │  │  │ Events/Hooks│ │   Systems   │  │  │
//! │  │  └──────┬──────┘ └──────┬──────┘  │  │
//! │  │         │               │         │  │
//! │  │         ▼               ▼         │  │
//! │  │    ┌─────────────────────────┐    │  │
//! │  │    │       shade-core        │    │  │
//! │  │    └─────────────────────────┘    │  │
//! │  └───────────────────────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events` / `hooks`: trigger events and the constructors that check raw
//!   host indices
//! - `systems`: the per-tick [`systems::World`]
//! - `doors`, `checkpoints`, `interactor`: room furniture driven by the world
//! - `components`: authored room content
//! - `session`: one play-through and its ledger
//! - `headless`: recording backends for tests, benches and `shade-sim`

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod checkpoints;
pub mod components;
pub mod doors;
pub mod events;
pub mod headless;
pub mod hooks;
pub mod interactor;
pub mod session;
pub mod systems;
