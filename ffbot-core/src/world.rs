//! External collaborator interfaces.
//!
//! The decision core never talks to the navigation mesh, the perception
//! system, the game rules or the audio layer directly. It consumes them
//! through the traits below, which the host implements.
//!
//! | Trait          | Consumed by                                             |
//! |----------------|---------------------------------------------------------|
//! | [`Navigator`]  | leaf behaviors (paths, cover, roam points)              |
//! | [`Perception`] | query defaults, tactical tiers, statement conditions    |
//! | [`GameRules`]  | scenario decision table, statement gating, actor state  |
//! | [`Voice`]      | chatter playback                                        |

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::chatter::phrase::{PhraseSound, RadioSignal};
use crate::types::{
    ActorSnapshot, EntityId, GameMode, GameTime, Location, PlaceId, RoundState, TeamId,
};

// ---------------------------------------------------------------------------
// Perception vocabulary
// ---------------------------------------------------------------------------

/// An entity the observer knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownEntity {
    /// Entity id.
    pub id: EntityId,
    /// Last known position.
    pub position: Location,
    /// When it was last seen.
    pub last_seen: GameTime,
    /// Currently in line of sight.
    pub visible: bool,
    /// Distance from the observer when last evaluated.
    pub distance: f32,
}

/// Kind of pickup the bot can go looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    /// Health kit or dispenser.
    Health,
    /// Ammo pack or dispenser.
    Ammo,
}

// ---------------------------------------------------------------------------
// Objective vocabulary
// ---------------------------------------------------------------------------

/// Where the contested objective item currently is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlagState {
    /// Sitting at its home base.
    Home,
    /// Carried by the given entity.
    Carried(EntityId),
    /// Dropped on the ground since the given time.
    Dropped {
        /// When it hit the ground.
        since: GameTime,
    },
}

/// The objective item a team is trying to move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlagInfo {
    /// Entity id of the item.
    pub id: EntityId,
    /// Where it is.
    pub position: Location,
    /// Home, carried or loose.
    pub state: FlagState,
    /// Where it must be delivered.
    pub capture_zone: Location,
}

impl FlagInfo {
    /// Lying on the ground and unclaimed.
    #[must_use]
    pub fn is_loose(&self) -> bool {
        matches!(self.state, FlagState::Dropped { .. })
    }

    /// Available for pickup (home or loose).
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.state, FlagState::Carried(_))
    }
}

/// A capturable point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Entity id of the point.
    pub id: EntityId,
    /// Position.
    pub position: Location,
    /// Navigation place the point sits in.
    pub place: Option<PlaceId>,
    /// Current owner, if any.
    pub owner: Option<TeamId>,
    /// Whether the point is currently unlocked for capture.
    pub locked: bool,
}

impl ControlPoint {
    /// Whether `team` may capture this point right now.
    #[must_use]
    pub fn can_be_captured_by(&self, team: TeamId) -> bool {
        !self.locked && self.owner != Some(team)
    }

    /// Whether `team` owns this point.
    #[must_use]
    pub fn is_owned_by(&self, team: TeamId) -> bool {
        self.owner == Some(team)
    }
}

/// A friendly teleporter pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Teleporter {
    /// Entity id of the entrance.
    pub id: EntityId,
    /// Entrance position.
    pub entrance: Location,
    /// Exit position.
    pub exit: Location,
    /// Charged and usable.
    pub ready: bool,
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Navigation-mesh queries.
pub trait Navigator {
    /// Compute a path of waypoints from `from` to `to`, `None` if unreachable.
    fn compute_path(&self, from: Location, to: Location) -> Option<Vec<Location>>;

    /// Whether `to` can be reached from `from`.
    fn is_reachable(&self, from: Location, to: Location) -> bool {
        self.compute_path(from, to).is_some()
    }

    /// A random walkable point inside `place`.
    fn random_point_in_place(&self, place: PlaceId, rng: &mut dyn RngCore) -> Option<Location>;

    /// A nearby spot hidden from every threat position, if one exists.
    fn find_cover(&self, from: Location, threats: &[Location]) -> Option<Location>;

    /// Place that contains `at`.
    fn place_of(&self, at: Location) -> Option<PlaceId>;
}

/// What an actor can see and knows about.
pub trait Perception {
    /// Enemies known to `observer`, most recently seen first.
    fn known_enemies(&self, observer: EntityId) -> Vec<KnownEntity>;

    /// Whether `from` has an unobstructed line of sight to `to`.
    fn is_line_of_sight_clear(&self, from: EntityId, to: EntityId) -> bool;

    /// Enemy sentry guns known to `observer`.
    fn known_enemy_sentries(&self, observer: EntityId) -> Vec<KnownEntity>;

    /// A human teammate currently looking at `observer`, if any.
    fn human_looking_at(&self, observer: EntityId) -> Option<EntityId>;

    /// Closest pickup of `kind` to `from`.
    fn nearest_pickup(&self, from: Location, kind: PickupKind) -> Option<Location>;
}

/// Game rules, mode flags and rosters.
pub trait GameRules {
    /// Current game mode.
    fn mode(&self) -> GameMode;

    /// Current round phase.
    fn round_state(&self) -> RoundState;

    /// Public state of an actor.
    fn actor(&self, id: EntityId) -> Option<ActorSnapshot>;

    /// Members of `team`, in roster order.
    fn teammates(&self, team: TeamId) -> Vec<EntityId>;

    /// Living enemies of `team`.
    fn enemies_remaining(&self, team: TeamId) -> usize;

    /// The objective item `team` is trying to move, if the mode has one.
    fn flag(&self, team: TeamId) -> Option<FlagInfo>;

    /// Every control point on the map.
    fn control_points(&self) -> Vec<ControlPoint>;

    /// Teleporters built by `team`.
    fn teleporters(&self, team: TeamId) -> Vec<Teleporter>;

    /// Designer-placed sentry build spots for `team`.
    fn sentry_hints(&self, team: TeamId) -> Vec<Location>;

    /// How far `at` lies along `team`'s route toward the enemy.
    fn incursion_distance(&self, team: TeamId, at: Location) -> f32;

    /// How far the squad led by `leader` is from its formation (0 = perfect).
    fn squad_formation_error(&self, leader: EntityId) -> f32;
}

/// Everything a behavior may query about the world.
pub trait World: Navigator + Perception + GameRules {}

impl<T: Navigator + Perception + GameRules> World for T {}

/// Audio/text output for chatter.
pub trait Voice {
    /// Play a resolved phrase instance for `speaker`.
    fn speak(&mut self, speaker: EntityId, sound: &PhraseSound);

    /// Broadcast a low-bandwidth radio signal for `speaker`.
    fn broadcast_signal(&mut self, speaker: EntityId, signal: RadioSignal);
}
