//! In-memory world for tests, benches and headless hosts.
//!
//! Everything is a plain public field so a scenario can be staged directly.
//! Paths are straight lines unless a destination is listed in `blocked`.

use std::collections::HashMap;

use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::blackboard::Blackboard;
use crate::chatter::arbitrator::{ChatterState, Chatterer};
use crate::chatter::phrase::{PhraseSound, RadioSignal};
use crate::chatter::queue::StatementQueue;
use crate::types::{
    ActorSnapshot, EntityId, GameMode, GameTime, Location, PlaceId, RoundState, TeamId,
};
use crate::world::{
    ControlPoint, FlagInfo, GameRules, KnownEntity, Navigator, Perception, PickupKind, Teleporter,
    Voice,
};

/// A named region of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SandboxPlace {
    /// Place id.
    pub id: PlaceId,
    /// Centre.
    pub center: Location,
    /// Radius.
    pub radius: f32,
}

/// Staged world state.
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    /// Game mode.
    pub mode: GameMode,
    /// Round phase.
    pub round_state: RoundState,
    /// Every actor, in roster order.
    pub actors: Vec<ActorSnapshot>,
    /// Enemies known to each observer.
    pub enemies: HashMap<EntityId, Vec<KnownEntity>>,
    /// Enemy sentries known to each observer.
    pub sentries: HashMap<EntityId, Vec<KnownEntity>>,
    /// Objective item per team.
    pub flags: HashMap<TeamId, FlagInfo>,
    /// Control points.
    pub control_points: Vec<ControlPoint>,
    /// Friendly teleporters per team.
    pub teleporters: HashMap<TeamId, Vec<Teleporter>>,
    /// Suggested sentry spots per team.
    pub sentry_hints: HashMap<TeamId, Vec<Location>>,
    /// Destinations no path reaches.
    pub blocked: Vec<Location>,
    /// Cover spot returned for any request.
    pub cover: Option<Location>,
    /// Pickups.
    pub pickups: Vec<(PickupKind, Location)>,
    /// Map regions.
    pub places: Vec<SandboxPlace>,
    /// Squad formation error per leader.
    pub formation_error: HashMap<EntityId, f32>,
    /// Entity each human observer is looking at.
    pub human_gaze: HashMap<EntityId, EntityId>,
    /// Pairs without line of sight.
    pub los_blocked: Vec<(EntityId, EntityId)>,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self {
            mode: GameMode::Arena,
            round_state: RoundState::Running,
            actors: Vec::new(),
            enemies: HashMap::new(),
            sentries: HashMap::new(),
            flags: HashMap::new(),
            control_points: Vec::new(),
            teleporters: HashMap::new(),
            sentry_hints: HashMap::new(),
            blocked: Vec::new(),
            cover: None,
            pickups: Vec::new(),
            places: Vec::new(),
            formation_error: HashMap::new(),
            human_gaze: HashMap::new(),
            los_blocked: Vec::new(),
        }
    }
}

impl SandboxWorld {
    /// Add an actor at the end of the roster.
    pub fn add_actor(&mut self, actor: ActorSnapshot) {
        self.actors.push(actor);
    }

    /// Mutable access to an actor.
    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut ActorSnapshot> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    /// Make `observer` see a fresh enemy at `position`. Returns its id.
    pub fn set_visible_enemy(&mut self, observer: EntityId, position: Location) -> EntityId {
        let id = EntityId::new();
        let from = self
            .actors
            .iter()
            .find(|a| a.id == observer)
            .map_or(Location::default(), |a| a.position);
        self.enemies.entry(observer).or_default().push(KnownEntity {
            id,
            position,
            last_seen: GameTime::ZERO,
            visible: true,
            distance: from.distance(&position),
        });
        id
    }

    /// Forget what `observer` knows about enemies.
    pub fn clear_enemies(&mut self, observer: EntityId) {
        self.enemies.remove(&observer);
    }
}

impl Navigator for SandboxWorld {
    fn compute_path(&self, _from: Location, to: Location) -> Option<Vec<Location>> {
        if self.blocked.iter().any(|b| b.distance(&to) < 1.0) {
            None
        } else {
            Some(vec![to])
        }
    }

    fn random_point_in_place(&self, place: PlaceId, _rng: &mut dyn RngCore) -> Option<Location> {
        self.places.iter().find(|p| p.id == place).map(|p| p.center)
    }

    fn find_cover(&self, _from: Location, _threats: &[Location]) -> Option<Location> {
        self.cover
    }

    fn place_of(&self, at: Location) -> Option<PlaceId> {
        self.places
            .iter()
            .find(|p| p.center.distance(&at) <= p.radius)
            .map(|p| p.id)
    }
}

impl Perception for SandboxWorld {
    fn known_enemies(&self, observer: EntityId) -> Vec<KnownEntity> {
        self.enemies.get(&observer).cloned().unwrap_or_default()
    }

    fn is_line_of_sight_clear(&self, from: EntityId, to: EntityId) -> bool {
        !self
            .los_blocked
            .iter()
            .any(|&(a, b)| (a == from && b == to) || (a == to && b == from))
    }

    fn known_enemy_sentries(&self, observer: EntityId) -> Vec<KnownEntity> {
        self.sentries.get(&observer).cloned().unwrap_or_default()
    }

    fn human_looking_at(&self, observer: EntityId) -> Option<EntityId> {
        self.human_gaze.get(&observer).copied()
    }

    fn nearest_pickup(&self, from: Location, kind: PickupKind) -> Option<Location> {
        self.pickups
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, at)| *at)
            .min_by(|a, b| from.distance(a).total_cmp(&from.distance(b)))
    }
}

impl GameRules for SandboxWorld {
    fn mode(&self) -> GameMode {
        self.mode
    }

    fn round_state(&self) -> RoundState {
        self.round_state
    }

    fn actor(&self, id: EntityId) -> Option<ActorSnapshot> {
        self.actors.iter().find(|a| a.id == id).cloned()
    }

    fn teammates(&self, team: TeamId) -> Vec<EntityId> {
        self.actors
            .iter()
            .filter(|a| a.team == team)
            .map(|a| a.id)
            .collect()
    }

    fn enemies_remaining(&self, team: TeamId) -> usize {
        self.actors
            .iter()
            .filter(|a| a.team != team && a.alive)
            .count()
    }

    fn flag(&self, team: TeamId) -> Option<FlagInfo> {
        self.flags.get(&team).copied()
    }

    fn control_points(&self) -> Vec<ControlPoint> {
        self.control_points.clone()
    }

    fn teleporters(&self, team: TeamId) -> Vec<Teleporter> {
        self.teleporters.get(&team).cloned().unwrap_or_default()
    }

    fn sentry_hints(&self, team: TeamId) -> Vec<Location> {
        self.sentry_hints.get(&team).cloned().unwrap_or_default()
    }

    fn incursion_distance(&self, team: TeamId, at: Location) -> f32 {
        if team.0 % 2 == 0 { at.x } else { -at.x }
    }

    fn squad_formation_error(&self, leader: EntityId) -> f32 {
        self.formation_error.get(&leader).copied().unwrap_or(0.0)
    }
}

/// Something a [`RecordingVoice`] heard.
#[derive(Debug, Clone, PartialEq)]
pub enum Utterance {
    /// A recording, by sound handle.
    Sound(String),
    /// A radio signal.
    Signal(RadioSignal),
}

/// Voice that records everything instead of playing it.
#[derive(Debug, Clone, Default)]
pub struct RecordingVoice {
    /// Speaker and utterance, in order.
    pub log: Vec<(EntityId, Utterance)>,
}

impl Voice for RecordingVoice {
    fn speak(&mut self, speaker: EntityId, sound: &PhraseSound) {
        self.log.push((speaker, Utterance::Sound(sound.sound.clone())));
    }

    fn broadcast_signal(&mut self, speaker: EntityId, signal: RadioSignal) {
        self.log.push((speaker, Utterance::Signal(signal)));
    }
}

/// Bare team member for chatter-only scenarios.
#[derive(Debug)]
pub struct SandboxChatterer {
    /// Entity id.
    pub id: EntityId,
    /// Pending statements.
    pub queue: StatementQueue,
    /// Private knowledge.
    pub blackboard: Blackboard,
    /// Random stream.
    pub rng: StdRng,
}

impl SandboxChatterer {
    /// Member with a seeded random stream.
    #[must_use]
    pub fn new(id: EntityId, seed: u64) -> Self {
        Self {
            id,
            queue: StatementQueue::new(),
            blackboard: Blackboard::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Chatterer for SandboxChatterer {
    fn id(&self) -> EntityId {
        self.id
    }

    fn statements(&self) -> &StatementQueue {
        &self.queue
    }

    fn chatter_mut(&mut self) -> ChatterState<'_> {
        ChatterState {
            queue: &mut self.queue,
            blackboard: &mut self.blackboard,
            rng: &mut self.rng,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerClass;

    #[test]
    fn enemies_remaining_counts_living_opponents() {
        let mut world = SandboxWorld::default();
        let red = EntityId::new();
        let blue = EntityId::new();
        world.add_actor(ActorSnapshot::new(red, TeamId(0), PlayerClass::Scout));
        world.add_actor(ActorSnapshot::new(blue, TeamId(1), PlayerClass::Scout));
        assert_eq!(world.enemies_remaining(TeamId(0)), 1);
        if let Some(b) = world.actor_mut(blue) {
            b.alive = false;
        }
        assert_eq!(world.enemies_remaining(TeamId(0)), 0);
    }

    #[test]
    fn blocked_destinations_have_no_path() {
        let mut world = SandboxWorld::default();
        let target = Location::new(10.0, 0.0, 0.0);
        assert!(world.is_reachable(Location::default(), target));
        world.blocked.push(target);
        assert!(!world.is_reachable(Location::default(), target));
    }
}
