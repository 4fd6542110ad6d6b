//! Configuration for the bot decision core.
//!
//! Maps directly to `ffbot.toml`. Every field is defaulted so a partial
//! file (or none at all) yields a playable configuration. The same values can
//! be read from the flat cvar-style [`Settings`](crate::settings::Settings)
//! facility through [`BotConfig::from_settings`].

use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::types::Difficulty;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Tactical and scenario thresholds.
    #[serde(default)]
    pub behavior: BehaviorConfig,
    /// Statement queue and arbitration settings.
    #[serde(default)]
    pub chatter: ChatterConfig,
    /// Debug hooks.
    #[serde(default)]
    pub debug: DebugConfig,
}

impl BotConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `BotError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::BotError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Build a configuration from cvar-style settings, falling back to the
    /// default for every key that is absent or mistyped.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let d = Self::default();
        let verbosity = settings
            .get_string("ff_bot_chatter")
            .and_then(|v| ChatterVerbosity::parse(&v))
            .unwrap_or(d.chatter.verbosity);
        let difficulty = settings
            .get_string("ff_bot_difficulty")
            .and_then(|v| Difficulty::parse(&v))
            .unwrap_or(d.general.difficulty);

        Self {
            general: GeneralConfig {
                difficulty,
                enabled: settings.get_bool("ff_bot_enabled", d.general.enabled),
            },
            behavior: BehaviorConfig {
                health_critical_ratio: settings
                    .get_f32("ff_bot_health_critical_ratio", d.behavior.health_critical_ratio),
                health_ok_ratio: settings.get_f32("ff_bot_health_ok_ratio", d.behavior.health_ok_ratio),
                ammo_low_ratio: settings.get_f32("ff_bot_ammo_low_ratio", d.behavior.ammo_low_ratio),
                pickup_check_min: settings
                    .get_f32("ff_bot_pickup_check_min", d.behavior.pickup_check_min),
                pickup_check_max: settings
                    .get_f32("ff_bot_pickup_check_max", d.behavior.pickup_check_max),
                retreat_cooldown: settings
                    .get_f32("ff_bot_retreat_cooldown", d.behavior.retreat_cooldown),
                flag_grace_period: settings
                    .get_f32("ff_bot_flag_grace_period", d.behavior.flag_grace_period),
                fetch_lost_flag_time: settings
                    .get_f32("ff_bot_fetch_lost_flag_time", d.behavior.fetch_lost_flag_time),
                repath_interval: settings.get_f32("ff_bot_repath_interval", d.behavior.repath_interval),
                max_repath_attempts: settings
                    .get_u32("ff_bot_max_repath_attempts", d.behavior.max_repath_attempts),
                teleporter_max_distance: settings
                    .get_f32("ff_bot_teleporter_max_distance", d.behavior.teleporter_max_distance),
                teleporter_min_gain: settings
                    .get_f32("ff_bot_teleporter_min_gain", d.behavior.teleporter_min_gain),
                spy_evade_range: settings.get_f32("ff_bot_spy_evade_range", d.behavior.spy_evade_range),
                formation_tolerance: settings
                    .get_f32("ff_bot_formation_tolerance", d.behavior.formation_tolerance),
                human_ack_cooldown: settings
                    .get_f32("ff_bot_human_ack_cooldown", d.behavior.human_ack_cooldown),
            },
            chatter: ChatterConfig {
                verbosity,
                report_in_interval: settings
                    .get_f32("ff_bot_report_in_interval", d.chatter.report_in_interval),
                ack_delay_min: settings.get_f32("ff_bot_ack_delay_min", d.chatter.ack_delay_min),
                ack_delay_max: settings.get_f32("ff_bot_ack_delay_max", d.chatter.ack_delay_max),
                radio_signal_duration: settings
                    .get_f32("ff_bot_radio_signal_duration", d.chatter.radio_signal_duration),
                help_request_enemy_count: settings
                    .get_u32("ff_bot_help_request_enemy_count", d.chatter.help_request_enemy_count),
                default_validity: settings
                    .get_f32("ff_bot_statement_validity", d.chatter.default_validity),
            },
            debug: DebugConfig {
                force_jump: settings.get_bool("ff_bot_force_jump", d.debug.force_jump),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether bots think at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Default skill for bots that don't carry their own.
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            difficulty: Difficulty::Normal,
        }
    }
}

/// Tactical and scenario thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Retreat when health falls below this fraction while in combat.
    #[serde(default = "default_0_3")]
    pub health_critical_ratio: f32,
    /// Go looking for health when below this fraction.
    #[serde(default = "default_0_8")]
    pub health_ok_ratio: f32,
    /// Go looking for ammo when below this fraction.
    #[serde(default = "default_0_2")]
    pub ammo_low_ratio: f32,
    /// Lower bound of the jittered pickup check cooldown (seconds).
    #[serde(default = "default_0_3")]
    pub pickup_check_min: f32,
    /// Upper bound of the jittered pickup check cooldown (seconds).
    #[serde(default = "default_0_5")]
    pub pickup_check_max: f32,
    /// Minimum gap between two retreat interruptions (seconds).
    #[serde(default = "default_2")]
    pub retreat_cooldown: f32,
    /// A freshly dropped objective is ignored for this long after the scenario monitor starts.
    #[serde(default = "default_20")]
    pub flag_grace_period: f32,
    /// An objective must be loose this long before a bot commits to fetching it.
    #[serde(default = "default_10")]
    pub fetch_lost_flag_time: f32,
    /// Seconds between path recomputations after a failure.
    #[serde(default = "default_1")]
    pub repath_interval: f32,
    /// Consecutive path failures before a behavior gives up.
    #[serde(default = "default_3_u32")]
    pub max_repath_attempts: u32,
    /// Farthest a teleporter entrance may be for an opportunistic detour.
    #[serde(default = "default_1000")]
    pub teleporter_max_distance: f32,
    /// Minimum incursion gained by teleporting.
    #[serde(default = "default_500")]
    pub teleporter_min_gain: f32,
    /// Spies steer away from visible enemies closer than this.
    #[serde(default = "default_500")]
    pub spy_evade_range: f32,
    /// Squad leaders wait while the formation error exceeds this.
    #[serde(default = "default_0_3")]
    pub formation_tolerance: f32,
    /// Minimum gap between acknowledging humans during setup (seconds).
    #[serde(default = "default_10")]
    pub human_ack_cooldown: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            health_critical_ratio: 0.3,
            health_ok_ratio: 0.8,
            ammo_low_ratio: 0.2,
            pickup_check_min: 0.3,
            pickup_check_max: 0.5,
            retreat_cooldown: 2.0,
            flag_grace_period: 20.0,
            fetch_lost_flag_time: 10.0,
            repath_interval: 1.0,
            max_repath_attempts: 3,
            teleporter_max_distance: 1000.0,
            teleporter_min_gain: 500.0,
            spy_evade_range: 500.0,
            formation_tolerance: 0.3,
            human_ack_cooldown: 10.0,
        }
    }
}

/// How much bots talk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatterVerbosity {
    /// Bots never talk.
    Off,
    /// Only statements flagged important.
    Minimal,
    /// Everything.
    #[default]
    Normal,
}

impl ChatterVerbosity {
    /// Parse a settings value (`off`, `minimal`, `normal`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Some(Self::Off),
            "minimal" | "radio" | "1" => Some(Self::Minimal),
            "normal" | "2" => Some(Self::Normal),
            _ => None,
        }
    }
}

/// Statement queue and arbitration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatterConfig {
    /// Verbosity gate applied at enqueue time.
    #[serde(default)]
    pub verbosity: ChatterVerbosity,
    /// Team radio silence (seconds) after which a bot asks for a report.
    #[serde(default = "default_30")]
    pub report_in_interval: f32,
    /// Lower bound of the "me too" delay (seconds).
    #[serde(default = "default_0_5")]
    pub ack_delay_min: f32,
    /// Upper bound of the "me too" delay (seconds).
    #[serde(default = "default_1_5")]
    pub ack_delay_max: f32,
    /// How long a radio signal fallback occupies the speaker.
    #[serde(default = "default_1")]
    pub radio_signal_duration: f32,
    /// Visible enemy count at which an enemy report turns into a help request.
    #[serde(default = "default_3_u32")]
    pub help_request_enemy_count: u32,
    /// Validity window of a statement when the caller gives none (seconds).
    #[serde(default = "default_10")]
    pub default_validity: f32,
}

impl Default for ChatterConfig {
    fn default() -> Self {
        Self {
            verbosity: ChatterVerbosity::Normal,
            report_in_interval: 30.0,
            ack_delay_min: 0.5,
            ack_delay_max: 1.5,
            radio_signal_duration: 1.0,
            help_request_enemy_count: 3,
            default_validity: 10.0,
        }
    }
}

/// Debug hooks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Make every bot jump whenever the tactical monitor runs.
    #[serde(default)]
    pub force_jump: bool,
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_0_2() -> f32 {
    0.2
}
fn default_0_3() -> f32 {
    0.3
}
fn default_0_5() -> f32 {
    0.5
}
fn default_0_8() -> f32 {
    0.8
}
fn default_1() -> f32 {
    1.0
}
fn default_1_5() -> f32 {
    1.5
}
fn default_2() -> f32 {
    2.0
}
fn default_10() -> f32 {
    10.0
}
fn default_20() -> f32 {
    20.0
}
fn default_30() -> f32 {
    30.0
}
fn default_500() -> f32 {
    500.0
}
fn default_1000() -> f32 {
    1000.0
}
fn default_3_u32() -> u32 {
    3
}
