//! Core type definitions shared by the behavior engine and the chatter system.
//!
//! Identity, simulation time, places, teams, classes and the read-only actor
//! snapshot the world hands to behaviors.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for any entity (bot, human player, building, flag) in the game world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team index. Teams are small integers assigned by the game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team-{}", self.0)
    }
}

/// Named navigation region ("courtyard", "lower route"). Used by chatter to
/// tag statements and select place-specific phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceId(pub u32);

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "place-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A 3D position in the game world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Location {
    /// Construct a location.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance to `other`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// A point `distance` units from `self`, directly away from `from`.
    /// Returns `self` when the two points coincide.
    #[must_use]
    pub fn away_from(&self, from: &Self, distance: f32) -> Self {
        let len = self.distance(from);
        if len < f32::EPSILON {
            return *self;
        }
        let scale = distance / len;
        Self {
            x: self.x + (self.x - from.x) * scale,
            y: self.y + (self.y - from.y) * scale,
            z: self.z,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Simulation clock in seconds since map start.
///
/// All timers are relative to this clock rather than to tick counts, so a
/// suspended behavior that resumes later sees its timers as already elapsed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct GameTime(pub f32);

impl GameTime {
    /// Map start.
    pub const ZERO: Self = Self(0.0);

    /// Seconds elapsed since `earlier` (never negative).
    #[must_use]
    pub fn since(self, earlier: Self) -> f32 {
        (self.0 - earlier.0).max(0.0)
    }

    /// Total-order key, for sorting.
    #[must_use]
    pub fn key(self) -> OrderedFloat<f32> {
        OrderedFloat(self.0)
    }
}

impl Add<f32> for GameTime {
    type Output = Self;

    fn add(self, seconds: f32) -> Self {
        Self(self.0 + seconds)
    }
}

impl Sub for GameTime {
    type Output = f32;

    fn sub(self, rhs: Self) -> f32 {
        self.0 - rhs.0
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game Rules Vocabulary
// ---------------------------------------------------------------------------

/// Player class. Several tactical and scenario decisions are class-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerClass {
    /// Fast flanker.
    Scout,
    /// Long-range marksman.
    Sniper,
    /// Rocket launcher.
    Soldier,
    /// Grenade/pipe launcher.
    Demoman,
    /// Healer.
    Medic,
    /// Heavy weapons.
    HwGuy,
    /// Flamethrower.
    Pyro,
    /// Infiltrator.
    Spy,
    /// Builds sentries and teleporters.
    Engineer,
    /// Unarmed VIP.
    Civilian,
}

impl PlayerClass {
    /// Whether the class's primary weapon fires in clip-sized barrages that
    /// leave the bot defenceless while reloading.
    #[must_use]
    pub fn uses_barrage_weapon(self) -> bool {
        matches!(self, Self::Soldier | Self::Demoman)
    }

    /// Whether the class can reasonably take out a sentry gun.
    #[must_use]
    pub fn can_demolish_sentries(self) -> bool {
        matches!(self, Self::Soldier | Self::Demoman | Self::Spy | Self::HwGuy)
    }
}

/// Bot skill level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Slow reactions, no advanced tactics.
    Easy,
    /// Default.
    #[default]
    Normal,
    /// Uses reload retreats and demolition errands.
    Hard,
    /// Everything `Hard` does, with tighter timings.
    Expert,
}

impl Difficulty {
    /// Parse a settings value (`easy`, `normal`, `hard`, `expert` or `0..=3`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" | "0" => Some(Self::Easy),
            "normal" | "1" => Some(Self::Normal),
            "hard" | "2" => Some(Self::Hard),
            "expert" | "3" => Some(Self::Expert),
            _ => None,
        }
    }
}

/// Game mode of the current map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Capture the flag.
    CaptureTheFlag,
    /// Capture/defend control points.
    ControlPoint,
    /// Escort a payload or VIP.
    Escort,
    /// Deathmatch-style; no objectives.
    Arena,
    /// Special cooperative mode against scripted NPC waves. Retreat is disabled.
    Siege,
}

/// Current phase of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    /// Waiting for players; doors closed.
    PreRound,
    /// Setup time before the objective unlocks.
    Setup,
    /// Normal play.
    Running,
    /// Round decided in favour of the given team.
    Won(TeamId),
    /// Round ended without a winner.
    Stalemate,
}

/// Standing order given to a bot by a scripted mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mission {
    /// No override; the scenario decision table applies.
    #[default]
    None,
    /// Hunt down enemy sentries.
    DestroySentries,
    /// Hold a sniping position.
    Snipe,
    /// Infiltrate and backstab.
    Infiltrate,
}

/// Role of a scripted NPC in the special mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcRole {
    /// A boss: never stops pushing.
    Boss,
    /// Regular wave member.
    Minion,
}

/// Squad membership as seen by one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadInfo {
    /// Current squad leader (may be the member itself).
    pub leader: EntityId,
}

/// Read-only snapshot of one actor's public state, produced by the game rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Team.
    pub team: TeamId,
    /// Class.
    pub class: PlayerClass,
    /// Skill level; `None` uses the configured default.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Alive and in play.
    pub alive: bool,
    /// Controlled by a human.
    pub is_human: bool,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Fraction of reserve ammo remaining (0.0–1.0).
    pub ammo_ratio: f32,
    /// Primary weapon clip is empty.
    pub primary_clip_empty: bool,
    /// World position.
    pub position: Location,
    /// Navigation place the actor stands in, if any.
    pub place: Option<PlaceId>,
    /// Carrying the contested objective item.
    pub carrying_flag: bool,
    /// Has an activatable item or ability ready.
    pub has_usable_item: bool,
    /// Squad membership.
    pub squad: Option<SquadInfo>,
    /// Scripted mission.
    pub mission: Mission,
    /// Special-mode NPC role.
    pub role: Option<NpcRole>,
}

impl ActorSnapshot {
    /// A healthy, mission-less bot at the origin.
    #[must_use]
    pub fn new(id: EntityId, team: TeamId, class: PlayerClass) -> Self {
        Self {
            id,
            team,
            class,
            difficulty: None,
            alive: true,
            is_human: false,
            health: 100.0,
            max_health: 100.0,
            ammo_ratio: 1.0,
            primary_clip_empty: false,
            position: Location::default(),
            place: None,
            carrying_flag: false,
            has_usable_item: false,
            squad: None,
            mission: Mission::None,
            role: None,
        }
    }

    /// Health as a fraction of maximum.
    #[must_use]
    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// This actor's own skill, or `fallback` if it carries none.
    #[must_use]
    pub fn skill(&self, fallback: Difficulty) -> Difficulty {
        self.difficulty.unwrap_or(fallback)
    }

    /// In a squad but not leading it.
    #[must_use]
    pub fn is_squad_follower(&self) -> bool {
        self.squad.is_some_and(|s| s.leader != self.id)
    }

    /// Leading a squad.
    #[must_use]
    pub fn is_squad_leader(&self) -> bool {
        self.squad.is_some_and(|s| s.leader == self.id)
    }
}
