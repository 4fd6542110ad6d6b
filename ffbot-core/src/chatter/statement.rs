//! Statements: scheduled utterances.
//!
//! A statement is built by a behavior or a meme handler, queued in its
//! owner's [`StatementQueue`](super::queue::StatementQueue) and played part
//! by part by the [`ChatterArbitrator`](super::arbitrator::ChatterArbitrator).
//! Playback state is an explicit cursor plus the time the current part ends.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::meme::Meme;
use super::phrase::names;
use crate::types::{ActorSnapshot, EntityId, GameTime, PlaceId};
use crate::world::World;

/// Identifier of a statement within its owner's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementId(pub u64);

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stmt-{}", self.0)
    }
}

/// Intentions a bot can announce to its team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Taking a control point.
    CapturePoint,
    /// Holding a control point.
    DefendPoint,
    /// Going for the objective item.
    FetchFlag,
    /// Bringing the objective item home.
    DeliverFlag,
    /// Escorting the squad leader.
    Escort,
    /// Hunting enemies.
    Attack,
    /// Sniping.
    Snipe,
    /// Building a sentry.
    BuildSentry,
    /// Sneaking behind enemy lines.
    Infiltrate,
    /// Healing teammates.
    Heal,
}

impl Plan {
    /// Phrase announcing this plan.
    #[must_use]
    pub fn phrase(self) -> &'static str {
        match self {
            Self::CapturePoint => "plan_capture",
            Self::DefendPoint => "plan_defend",
            Self::FetchFlag => "plan_fetch_flag",
            Self::DeliverFlag => "plan_deliver_flag",
            Self::Escort => "plan_escort",
            Self::Attack => "plan_attack",
            Self::Snipe => "plan_snipe",
            Self::BuildSentry => "plan_build_sentry",
            Self::Infiltrate => "plan_infiltrate",
            Self::Heal => "plan_heal",
        }
    }
}

/// What a statement is about. Two statements with the same topic and the
/// same place/subject tags say the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// "My plan is ...".
    Plan(Plan),
    /// "Me too" after a teammate's identical plan.
    Acknowledge,
    /// Asking the team to report.
    ReportIn,
    /// Answering a report request.
    ReportingIn,
    /// Enemy contact callout.
    EnemySpotted,
    /// Asking for backup.
    HelpRequest,
    /// The objective item is on the ground.
    FlagLoose,
    /// "Follow me".
    FollowMe,
    /// "Defend here".
    DefendHere,
    /// Sniper callout.
    SniperWarning,
    /// Heard something.
    Noise,
    /// "Affirmative".
    Affirmative,
    /// Falling back.
    Retreating,
    /// Reloading.
    Reloading,
    /// Gloating after a round win.
    Celebrate,
}

/// A part whose phrase is chosen when the part is reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContextPart {
    /// Number of visible enemies. May attach a help request.
    EnemyCount,
    /// Number of living enemies.
    RemainingEnemies,
    /// The speaker's current place.
    CurrentPlace,
    /// Silence for the given seconds.
    Pause(f32),
}

/// One part of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementPart {
    /// A literal phrase from the bank.
    Phrase(String),
    /// A context-dependent part.
    Context(ContextPart),
}

/// Must hold for a pending statement to stay queued.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// The owner is fighting.
    InCombat,
    /// The owner is not fighting.
    NotInCombat,
    /// The team has been silent at least this many seconds.
    RadioSilence(f32),
    /// The enemy team has living members.
    EnemiesRemaining,
    /// The owner stands in the given place.
    AtPlace(PlaceId),
    /// The owner carries the objective item.
    CarryingFlag,
}

/// What a condition is checked against.
#[derive(Clone, Copy)]
pub struct ConditionScope<'a> {
    /// Statement owner.
    pub owner: &'a ActorSnapshot,
    /// World collaborators.
    pub world: &'a dyn World,
    /// Current time.
    pub now: GameTime,
    /// Seconds since the team last spoke.
    pub silence: f32,
}

impl Condition {
    /// Whether the condition holds.
    #[must_use]
    pub fn holds(&self, scope: &ConditionScope<'_>) -> bool {
        let in_combat = || {
            scope.world.known_enemies(scope.owner.id).iter().any(|e| {
                e.visible || scope.now.since(e.last_seen) <= crate::context::COMBAT_MEMORY
            })
        };
        match *self {
            Self::InCombat => in_combat(),
            Self::NotInCombat => !in_combat(),
            Self::RadioSilence(seconds) => scope.silence >= seconds,
            Self::EnemiesRemaining => scope.world.enemies_remaining(scope.owner.team) > 0,
            Self::AtPlace(place) => scope.owner.place == Some(place),
            Self::CarryingFlag => scope.owner.carrying_flag,
        }
    }
}

/// One scheduled utterance.
#[derive(Debug)]
pub struct Statement {
    pub(crate) id: StatementId,
    owner: EntityId,
    topic: Topic,
    place: Option<PlaceId>,
    subject: Option<EntityId>,
    parts: Vec<StatementPart>,
    pub(crate) meme: Option<Box<dyn Meme>>,
    conditions: Vec<Condition>,
    important: bool,
    forced: bool,
    validity: Option<f32>,
    created_at: GameTime,
    pub(crate) start_at: GameTime,
    pub(crate) expire_at: GameTime,
    pub(crate) speaking: bool,
    pub(crate) cursor: usize,
    pub(crate) part_ends_at: Option<GameTime>,
    pub(crate) count: Option<u32>,
}

impl Statement {
    /// A statement due immediately, with no parts yet.
    #[must_use]
    pub fn new(owner: EntityId, topic: Topic, now: GameTime) -> Self {
        Self {
            id: StatementId(0),
            owner,
            topic,
            place: None,
            subject: None,
            parts: Vec::new(),
            meme: None,
            conditions: Vec::new(),
            important: false,
            forced: false,
            validity: None,
            created_at: now,
            start_at: now,
            expire_at: now,
            speaking: false,
            cursor: 0,
            part_ends_at: None,
            count: None,
        }
    }

    /// "My plan is `plan` at `place`".
    #[must_use]
    pub fn plan(owner: EntityId, plan: Plan, place: Option<PlaceId>, now: GameTime) -> Self {
        Self::new(owner, Topic::Plan(plan), now)
            .at_place(place)
            .phrase(plan.phrase())
            .with_meme(super::meme::PlanAnnouncement { plan, place })
    }

    /// Tag with a place.
    #[must_use]
    pub fn at_place(mut self, place: Option<PlaceId>) -> Self {
        self.place = place;
        self
    }

    /// Tag with a subject entity.
    #[must_use]
    pub fn about(mut self, subject: EntityId) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Append a literal phrase.
    #[must_use]
    pub fn phrase(mut self, name: &str) -> Self {
        self.parts.push(StatementPart::Phrase(name.to_owned()));
        self
    }

    /// Append a context-dependent part.
    #[must_use]
    pub fn context(mut self, part: ContextPart) -> Self {
        self.parts.push(StatementPart::Context(part));
        self
    }

    /// Attach the payload broadcast when the statement finishes.
    #[must_use]
    pub fn with_meme(mut self, meme: impl Meme + 'static) -> Self {
        self.meme = Some(Box::new(meme));
        self
    }

    /// Require `condition` to hold while pending.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Survives "minimal" verbosity.
    #[must_use]
    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }

    /// Accepted even if the owner is dead.
    #[must_use]
    pub fn forced(mut self) -> Self {
        self.forced = true;
        self
    }

    /// Start `seconds` later than now.
    #[must_use]
    pub fn delayed(mut self, seconds: f32) -> Self {
        self.start_at = self.start_at + seconds.max(0.0);
        self
    }

    /// Validity window after the start time; defaults to the configured value.
    #[must_use]
    pub fn valid_for(mut self, seconds: f32) -> Self {
        self.validity = Some(seconds.max(0.0));
        self
    }

    /// Fix the expiry once the default validity is known.
    pub(crate) fn seal(&mut self, default_validity: f32) {
        self.expire_at = self.start_at + self.validity.unwrap_or(default_validity);
    }

    /// Turn a pending plan into an acknowledgement of a teammate's identical plan.
    pub(crate) fn rewrite_as_acknowledgement(&mut self, start_at: GameTime) {
        let window = self.expire_at - self.start_at;
        self.topic = Topic::Acknowledge;
        self.parts = vec![StatementPart::Phrase(names::ACKNOWLEDGE.to_owned())];
        self.meme = None;
        self.start_at = start_at;
        self.expire_at = start_at + window.max(0.0);
    }

    /// Whether `self` and `other` say the same thing.
    #[must_use]
    pub fn is_redundant_with(&self, other: &Self) -> bool {
        self.redundant_with_tags(other.topic, other.place, other.subject)
    }

    pub(crate) fn redundant_with_tags(
        &self,
        topic: Topic,
        place: Option<PlaceId>,
        subject: Option<EntityId>,
    ) -> bool {
        self.topic == topic && self.place == place && self.subject == subject
    }

    /// Every condition holds.
    #[must_use]
    pub fn conditions_hold(&self, scope: &ConditionScope<'_>) -> bool {
        self.conditions.iter().all(|c| c.holds(scope))
    }

    /// Queue-local id.
    #[must_use]
    pub fn id(&self) -> StatementId {
        self.id
    }

    /// Owning bot.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Topic.
    #[must_use]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Place tag.
    #[must_use]
    pub fn place(&self) -> Option<PlaceId> {
        self.place
    }

    /// Subject tag.
    #[must_use]
    pub fn subject(&self) -> Option<EntityId> {
        self.subject
    }

    /// Parts.
    #[must_use]
    pub fn parts(&self) -> &[StatementPart] {
        &self.parts
    }

    /// Whether a meme is attached.
    #[must_use]
    pub fn has_meme(&self) -> bool {
        self.meme.is_some()
    }

    /// Flagged important.
    #[must_use]
    pub fn is_important(&self) -> bool {
        self.important
    }

    /// Allowed from a dead speaker.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> GameTime {
        self.created_at
    }

    /// Scheduled start.
    #[must_use]
    pub fn start_at(&self) -> GameTime {
        self.start_at
    }

    /// Expiry.
    #[must_use]
    pub fn expire_at(&self) -> GameTime {
        self.expire_at
    }

    /// Currently being spoken.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// Index of the part being played.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Due to start at `now`.
    #[must_use]
    pub fn is_due(&self, now: GameTime) -> bool {
        self.start_at <= now
    }

    /// Past its validity window (never true while speaking).
    #[must_use]
    pub fn is_expired(&self, now: GameTime) -> bool {
        !self.speaking && now > self.expire_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundancy_needs_same_topic_and_tags() {
        let now = GameTime(1.0);
        let a = Statement::new(EntityId::new(), Topic::EnemySpotted, now).at_place(Some(PlaceId(1)));
        let b = Statement::new(EntityId::new(), Topic::EnemySpotted, now).at_place(Some(PlaceId(1)));
        let c = Statement::new(EntityId::new(), Topic::EnemySpotted, now).at_place(Some(PlaceId(2)));
        let d = Statement::new(EntityId::new(), Topic::HelpRequest, now).at_place(Some(PlaceId(1)));
        assert!(a.is_redundant_with(&b));
        assert!(!a.is_redundant_with(&c));
        assert!(!a.is_redundant_with(&d));

        let untagged = Statement::new(EntityId::new(), Topic::ReportIn, now);
        let also_untagged = Statement::new(EntityId::new(), Topic::ReportIn, now);
        assert!(untagged.is_redundant_with(&also_untagged));
    }

    #[test]
    fn plans_differ_by_plan() {
        let now = GameTime::ZERO;
        let owner = EntityId::new();
        let capture = Statement::plan(owner, Plan::CapturePoint, Some(PlaceId(1)), now);
        let defend = Statement::plan(owner, Plan::DefendPoint, Some(PlaceId(1)), now);
        assert!(!capture.is_redundant_with(&defend));
        assert!(capture.has_meme());
    }

    #[test]
    fn acknowledgement_rewrite_keeps_place_and_window() {
        let mut s = Statement::plan(EntityId::new(), Plan::FetchFlag, Some(PlaceId(9)), GameTime(5.0));
        s.seal(10.0);
        s.rewrite_as_acknowledgement(GameTime(6.0));
        assert_eq!(s.topic(), Topic::Acknowledge);
        assert_eq!(s.place(), Some(PlaceId(9)));
        assert!(!s.has_meme());
        assert!((s.expire_at() - s.start_at() - 10.0).abs() < 1e-5);
        assert_eq!(s.parts(), &[StatementPart::Phrase(names::ACKNOWLEDGE.to_owned())]);
    }

    #[test]
    fn delay_and_expiry() {
        let mut s = Statement::new(EntityId::new(), Topic::Noise, GameTime(1.0))
            .delayed(2.0)
            .valid_for(3.0);
        s.seal(10.0);
        assert!(!s.is_due(GameTime(2.0)));
        assert!(s.is_due(GameTime(3.0)));
        assert!(!s.is_expired(GameTime(6.0)));
        assert!(s.is_expired(GameTime(6.5)));
    }
}
