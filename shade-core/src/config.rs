//! Configuration for the SHADE stealth core.
//!
//! Maps directly to `shade.toml`. Every field has a serde default, so an
//! empty file yields the tuning the game shipped with.

use serde::{Deserialize, Serialize};

use crate::spell::SpellKind;

/// Top-level SHADE configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadeConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Guard perception and movement tuning.
    #[serde(default)]
    pub guard: GuardConfig,
    /// Shared "spotted" indicator.
    #[serde(default)]
    pub spotted: SpottedConfig,
    /// Catch effect.
    #[serde(default)]
    pub caught: CaughtConfig,
    /// Player spells.
    #[serde(default)]
    pub spells: SpellsConfig,
    /// Hold-to-interact tuning.
    #[serde(default)]
    pub interaction: InteractionConfig,
    /// Door and gate animation timings.
    #[serde(default)]
    pub doors: DoorsConfig,
    /// Per-tick budget enforcement.
    #[serde(default)]
    pub performance: PerformanceConfig,
    /// Headless simulation settings.
    #[serde(default)]
    pub sim: SimConfig,
}

impl ShadeConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ShadeError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::ShadeError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Guard perception, pursuit and patrol tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Maximum distance the guard can see.
    #[serde(default = "default_10_0")]
    pub vision_range: f32,
    /// Full vision cone angle in degrees.
    #[serde(default = "default_45_0")]
    pub field_of_view_angle: f32,
    /// Seconds of continuous sight needed for a catch.
    #[serde(default = "default_3_0")]
    pub detection_time: f32,
    /// Fraction of `dt` removed from detection per tick out of sight.
    #[serde(default = "default_0_5")]
    pub depletion_rate: f32,
    /// Eye height above the guard's position for line-of-sight rays.
    #[serde(default = "default_1_0")]
    pub eye_height: f32,
    /// Seconds the guard keeps chasing after losing sight.
    #[serde(default = "default_3_0")]
    pub chase_duration: f32,
    /// Seconds spent searching before returning to patrol.
    #[serde(default = "default_5_0")]
    pub search_duration: f32,
    /// Radius around the last known position to search.
    #[serde(default = "default_5_0")]
    pub search_radius: f32,
    /// Reachable-point sampling attempts per search leg.
    #[serde(default = "default_3_u32")]
    pub search_sample_attempts: u32,
    /// Dwell time at each patrol waypoint.
    #[serde(default = "default_5_0")]
    pub pause_duration: f32,
    /// Patrol / search speed.
    #[serde(default = "default_4_0")]
    pub walking_speed: f32,
    /// Chase speed.
    #[serde(default = "default_8_0")]
    pub chase_speed: f32,
    /// Distance at which a destination counts as reached.
    #[serde(default = "default_0_5")]
    pub arrival_tolerance: f32,
    /// Distance from which the guard can be pickpocketed.
    #[serde(default = "default_15_0")]
    pub interact_distance: f32,
    /// Gold carried by the guard.
    #[serde(default = "default_20_i32")]
    pub gold_amount: i32,
    /// Number of alert barks to pick from when a chase starts.
    #[serde(default = "default_3_u32")]
    pub alert_variants: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            vision_range: 10.0,
            field_of_view_angle: 45.0,
            detection_time: 3.0,
            depletion_rate: 0.5,
            eye_height: 1.0,
            chase_duration: 3.0,
            search_duration: 5.0,
            search_radius: 5.0,
            search_sample_attempts: 3,
            pause_duration: 5.0,
            walking_speed: 4.0,
            chase_speed: 8.0,
            arrival_tolerance: 0.5,
            interact_distance: 15.0,
            gold_amount: 20,
            alert_variants: 3,
        }
    }
}

/// Shared "spotted" indicator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpottedConfig {
    /// Vignette intensity while any guard has the player in sight.
    #[serde(default = "default_0_4")]
    pub spotted_intensity: f32,
    /// Intensity removed per second once no guard sees the player.
    #[serde(default = "default_0_5")]
    pub fade_out_speed: f32,
}

impl Default for SpottedConfig {
    fn default() -> Self {
        Self {
            spotted_intensity: 0.4,
            fade_out_speed: 0.5,
        }
    }
}

/// Catch effect tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaughtConfig {
    /// Seconds the catch effect plays before the ledger is restored.
    #[serde(default = "default_5_0")]
    pub effect_duration: f32,
    /// Message shown on the caught screen.
    #[serde(default = "default_caught_message")]
    pub message: String,
}

impl Default for CaughtConfig {
    fn default() -> Self {
        Self {
            effect_duration: 5.0,
            message: default_caught_message(),
        }
    }
}

/// Settings for every player spell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpellsConfig {
    /// Invisibility: guards cannot detect the player.
    #[serde(default)]
    pub invisibility: SpellConfig,
    /// Speed: movement multiplier.
    #[serde(default)]
    pub speed: SpellConfig,
    /// Reveal: outlines guards within a radius.
    #[serde(default)]
    pub reveal: SpellConfig,
}

impl SpellsConfig {
    /// Settings for one spell.
    #[must_use]
    pub fn get(&self, kind: SpellKind) -> &SpellConfig {
        match kind {
            SpellKind::Invisibility => &self.invisibility,
            SpellKind::Speed => &self.speed,
            SpellKind::Reveal => &self.reveal,
        }
    }
}

/// A single spell's tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellConfig {
    /// Active duration in seconds.
    #[serde(default = "default_5_0")]
    pub duration: f32,
    /// Shop price in gold.
    #[serde(default = "default_10_i32")]
    pub cost: i32,
    /// Cooldown after the spell ends, in seconds.
    #[serde(default = "default_20_0")]
    pub cooldown: f32,
    /// Speed multiplier (speed spell only).
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f32,
    /// Reveal radius (reveal spell only).
    #[serde(default = "default_15_0")]
    pub reveal_radius: f32,
}

impl Default for SpellConfig {
    fn default() -> Self {
        Self {
            duration: 5.0,
            cost: 10,
            cooldown: 20.0,
            speed_multiplier: 1.15,
            reveal_radius: 15.0,
        }
    }
}

/// Hold-to-interact tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Seconds the interact key must be held.
    #[serde(default = "default_2_0")]
    pub hold_time: f32,
    /// Gold carried by a pickpocketable bystander.
    #[serde(default = "default_30_i32")]
    pub bystander_gold: i32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hold_time: 2.0,
            bystander_gold: 30,
        }
    }
}

/// Door and gate animation timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorsConfig {
    /// Seconds for a hinged door to swing.
    #[serde(default = "default_1_0")]
    pub rotation_duration: f32,
    /// Degrees a hinged door swings.
    #[serde(default = "default_135_0")]
    pub rotation_degrees: f32,
    /// Seconds for the castle gate to lift.
    #[serde(default = "default_3_0")]
    pub gate_lift_duration: f32,
    /// Height the castle gate lifts.
    #[serde(default = "default_gate_lift")]
    pub gate_lift_height: f32,
}

impl Default for DoorsConfig {
    fn default() -> Self {
        Self {
            rotation_duration: 1.0,
            rotation_degrees: 135.0,
            gate_lift_duration: 3.0,
            gate_lift_height: 4.7,
        }
    }
}

/// Per-tick budget enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Hard limit: total SHADE time per tick in milliseconds.
    #[serde(default = "default_1_0")]
    pub tick_budget_ms: f32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self { tick_budget_ms: 1.0 }
    }
}

/// Headless simulation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// RNG seed for search sampling and alert barks.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Ticks per simulated second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            tick_rate: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_caught_message() -> String { "Caught!".to_string() }
fn default_0_4() -> f32 { 0.4 }
fn default_0_5() -> f32 { 0.5 }
fn default_1_0() -> f32 { 1.0 }
fn default_2_0() -> f32 { 2.0 }
fn default_3_0() -> f32 { 3.0 }
fn default_4_0() -> f32 { 4.0 }
fn default_5_0() -> f32 { 5.0 }
fn default_8_0() -> f32 { 8.0 }
fn default_10_0() -> f32 { 10.0 }
fn default_15_0() -> f32 { 15.0 }
fn default_20_0() -> f32 { 20.0 }
fn default_45_0() -> f32 { 45.0 }
fn default_135_0() -> f32 { 135.0 }
fn default_speed_multiplier() -> f32 { 1.15 }
fn default_gate_lift() -> f32 { 4.7 }
fn default_3_u32() -> u32 { 3 }
fn default_10_i32() -> i32 { 10 }
fn default_20_i32() -> i32 { 20 }
fn default_30_i32() -> i32 { 30 }
fn default_seed() -> u64 { 0x5EED }
fn default_tick_rate() -> u32 { 60 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = ShadeConfig::from_toml("").expect("empty config parses");
        assert!((config.guard.vision_range - 10.0).abs() < f32::EPSILON);
        assert!((config.guard.detection_time - 3.0).abs() < f32::EPSILON);
        assert_eq!(config.caught.message, "Caught!");
        assert_eq!(config.spells.speed.cost, 10);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = ShadeConfig::from_toml(
            r#"
            [guard]
            vision_range = 25.0

            [spells.reveal]
            reveal_radius = 30.0
            "#,
        )
        .expect("valid config");
        assert!((config.guard.vision_range - 25.0).abs() < f32::EPSILON);
        assert!((config.guard.field_of_view_angle - 45.0).abs() < f32::EPSILON);
        assert!((config.spells.get(SpellKind::Reveal).reveal_radius - 30.0).abs() < f32::EPSILON);
        assert!((config.spells.get(SpellKind::Reveal).duration - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ShadeConfig::from_toml("[guard\nvision_range = ").expect_err("must fail");
        assert!(matches!(err, crate::ShadeError::Config(_)));
    }
}
