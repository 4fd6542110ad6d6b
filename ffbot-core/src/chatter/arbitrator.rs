//! Team-wide chatter arbitration.
//!
//! One [`ChatterArbitrator`] per team decides, fresh every tick, which single
//! statement on the whole team is active. Only the owner of that statement
//! makes progress; everything else waits, expires or is pruned.
//!
//! Per tick:
//!
//! 1. Dead members stop talking (forced statements excepted).
//! 2. After long radio silence with enemies remaining, every living member
//!    queues a "report in"; duplicates collapse through redundancy pruning.
//! 3. The active statement is computed: a statement already being spoken
//!    wins; otherwise the earliest due one, ties by creation time, then
//!    roster order.
//! 4. The active statement advances by one step. When its last part ends,
//!    it is removed and its meme is interpreted by every living teammate.
//! 5. Pending statements are pruned when their conditions fail, their
//!    window expired, or they repeat what the active speaker is saying. A
//!    repeated plan is instead rewritten into a delayed acknowledgement.

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use super::meme::{MemeReceiver, ReportRequest, RequestHelp};
use super::phrase::{PhraseBank, names};
use super::queue::{EnqueueGate, StatementQueue};
use super::statement::{
    Condition, ConditionScope, ContextPart, Statement, StatementId, StatementPart, Topic,
};
use crate::blackboard::Blackboard;
use crate::config::ChatterConfig;
use crate::types::{EntityId, GameTime, PlaceId, TeamId};
use crate::world::{Voice, World};

/// Mutable chatter state a team member lends to the arbitrator.
#[derive(Debug)]
pub struct ChatterState<'a> {
    /// The member's statement queue.
    pub queue: &'a mut StatementQueue,
    /// The member's private knowledge, updated by memes.
    pub blackboard: &'a mut Blackboard,
    /// The member's random stream.
    pub rng: &'a mut StdRng,
}

/// A team member as seen by the arbitrator.
pub trait Chatterer {
    /// Entity id.
    fn id(&self) -> EntityId;

    /// Pending statements.
    fn statements(&self) -> &StatementQueue;

    /// Borrow the member's chatter state.
    fn chatter_mut(&mut self) -> ChatterState<'_>;
}

/// Collaborators for one arbitration pass.
pub struct ChatterFrame<'a> {
    /// Current time.
    pub now: GameTime,
    /// World collaborators.
    pub world: &'a dyn World,
    /// Audio/text output.
    pub voice: &'a mut dyn Voice,
    /// Phrase bank for the current map, if loaded.
    pub phrases: Option<&'a PhraseBank>,
    /// Chatter settings.
    pub config: &'a ChatterConfig,
}

impl std::fmt::Debug for ChatterFrame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatterFrame")
            .field("now", &self.now)
            .field("phrases", &self.phrases.map(PhraseBank::len))
            .finish_non_exhaustive()
    }
}

/// What one arbitration pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatterReport {
    /// Owner and id of the active statement.
    pub active: Option<(EntityId, StatementId)>,
    /// The active statement started speaking this tick.
    pub started: bool,
    /// Topic of a statement that finished this tick.
    pub finished: Option<Topic>,
    /// Teammates that interpreted a meme.
    pub memes_delivered: usize,
    /// Pending statements removed.
    pub pruned: usize,
    /// Plans rewritten into acknowledgements.
    pub acknowledged: usize,
}

/// Per-team arbitration state.
#[derive(Debug, Clone)]
pub struct ChatterArbitrator {
    team: TeamId,
    last_radio_at: Option<GameTime>,
}

struct ActiveTags {
    index: usize,
    topic: Topic,
    place: Option<PlaceId>,
    subject: Option<EntityId>,
}

impl ChatterArbitrator {
    /// Arbitrator for `team`.
    #[must_use]
    pub fn new(team: TeamId) -> Self {
        Self {
            team,
            last_radio_at: None,
        }
    }

    /// Team this arbitrator serves.
    #[must_use]
    pub fn team(&self) -> TeamId {
        self.team
    }

    /// When the team last spoke.
    #[must_use]
    pub fn last_radio_at(&self) -> Option<GameTime> {
        self.last_radio_at
    }

    /// Seconds of radio silence at `now`.
    #[must_use]
    pub fn silence(&self, now: GameTime) -> f32 {
        self.last_radio_at.map_or(0.0, |t| now.since(t))
    }

    /// Forget per-map state.
    pub fn on_map_change(&mut self) {
        self.last_radio_at = None;
    }

    /// The single active statement team-wide: whatever is being spoken,
    /// else the earliest due statement of a living member.
    #[must_use]
    pub fn active_statement<C: Chatterer>(
        &self,
        members: &[C],
        world: &dyn World,
        now: GameTime,
    ) -> Option<(usize, StatementId)> {
        for (index, member) in members.iter().enumerate() {
            if let Some(speaking) = member.statements().speaking() {
                return Some((index, speaking.id()));
            }
        }

        let mut best: Option<(usize, &Statement)> = None;
        for (index, member) in members.iter().enumerate() {
            let alive = is_alive(world, member.id());
            let candidate = member
                .statements()
                .iter()
                .filter(|s| s.is_due(now) && (alive || s.is_forced()))
                .min_by_key(|s| (s.start_at().key(), s.created_at().key(), s.id()));
            let Some(candidate) = candidate else {
                continue;
            };
            let earlier = best.is_none_or(|(_, current)| {
                (candidate.start_at().key(), candidate.created_at().key())
                    < (current.start_at().key(), current.created_at().key())
            });
            if earlier {
                best = Some((index, candidate));
            }
        }
        best.map(|(index, s)| (index, s.id()))
    }

    /// Run one arbitration pass over `members` (roster order).
    pub fn update<C: Chatterer>(
        &mut self,
        members: &mut [C],
        frame: &mut ChatterFrame<'_>,
    ) -> ChatterReport {
        let now = frame.now;
        let mut report = ChatterReport::default();
        self.last_radio_at.get_or_insert(now);

        for member in members.iter_mut() {
            if !is_alive(frame.world, member.id()) {
                member.chatter_mut().queue.retain_mut(|s| s.is_forced());
            }
        }

        self.request_reports(members, frame);

        let active = self.active_statement(members, frame.world, now);
        let Some((index, id)) = active else {
            report.pruned = self.prune(members, None, frame, &mut report.acknowledged);
            return report;
        };
        report.active = Some((members[index].id(), id));
        let tags = members[index].statements().get(id).map(|s| ActiveTags {
            index,
            topic: s.topic(),
            place: s.place(),
            subject: s.subject(),
        });

        let sender = members[index].id();
        let step = self.advance(&mut members[index], id, frame);
        report.started = step.started;
        if let Some(finished) = step.finished {
            report.finished = Some(finished.topic());
            self.last_radio_at = Some(now);
            report.memes_delivered = broadcast(members, index, sender, finished, frame);
        }

        report.pruned = self.prune(members, tags.as_ref(), frame, &mut report.acknowledged);
        report
    }

    fn request_reports<C: Chatterer>(&self, members: &mut [C], frame: &ChatterFrame<'_>) {
        let interval = frame.config.report_in_interval;
        if self.silence(frame.now) <= interval || frame.world.enemies_remaining(self.team) == 0 {
            return;
        }
        let gate = EnqueueGate::new(frame.config, true);
        for member in members.iter_mut() {
            let id = member.id();
            if !is_alive(frame.world, id)
                || member.statements().iter().any(|s| s.topic() == Topic::ReportIn)
            {
                continue;
            }
            let statement = Statement::new(id, Topic::ReportIn, frame.now)
                .phrase(names::REPORT_IN)
                .with_meme(ReportRequest)
                .when(Condition::RadioSilence(interval))
                .when(Condition::EnemiesRemaining);
            if member.chatter_mut().queue.enqueue(statement, &gate).is_ok() {
                debug!(bot = %id, "Radio silence; asking for a report");
            }
        }
    }

    fn advance<C: Chatterer>(
        &mut self,
        member: &mut C,
        id: StatementId,
        frame: &mut ChatterFrame<'_>,
    ) -> Step {
        let owner = member.id();
        let now = frame.now;
        let ChatterState { queue, rng, .. } = member.chatter_mut();
        let Some(statement) = queue.get_mut(id) else {
            return Step::default();
        };

        let mut step = Step::default();
        if !statement.speaking {
            statement.speaking = true;
            statement.cursor = 0;
            self.last_radio_at = Some(now);
            step.started = true;
            info!(bot = %owner, topic = ?statement.topic(), "Speaking");
            start_part(owner, statement, frame, rng);
        } else if statement.part_ends_at.is_none_or(|end| now >= end) {
            statement.cursor += 1;
            if statement.cursor < statement.parts().len() {
                start_part(owner, statement, frame, rng);
            }
        }

        if statement.cursor >= statement.parts().len() {
            step.finished = queue.remove(id);
        }
        step
    }

    fn prune<C: Chatterer>(
        &self,
        members: &mut [C],
        active: Option<&ActiveTags>,
        frame: &ChatterFrame<'_>,
        acknowledged: &mut usize,
    ) -> usize {
        let now = frame.now;
        let silence = self.silence(now);
        let (lo, hi) = ordered(frame.config.ack_delay_min, frame.config.ack_delay_max);
        let mut pruned = 0;

        for (index, member) in members.iter_mut().enumerate() {
            let Some(owner) = frame.world.actor(member.id()) else {
                continue;
            };
            let scope = ConditionScope {
                owner: &owner,
                world: frame.world,
                now,
                silence,
            };
            let repeats = active.filter(|a| a.index != index);
            let mut rewritten = false;
            let ChatterState { queue, rng, .. } = member.chatter_mut();

            queue.retain_mut(|s| {
                if s.is_speaking() {
                    return true;
                }
                if s.is_expired(now) {
                    debug!(bot = %owner.id, topic = ?s.topic(), "Pruned expired statement");
                    pruned += 1;
                    return false;
                }
                if !s.conditions_hold(&scope) {
                    debug!(bot = %owner.id, topic = ?s.topic(), "Pruned statement with failed condition");
                    pruned += 1;
                    return false;
                }
                let Some(a) = repeats else {
                    return true;
                };
                if !s.redundant_with_tags(a.topic, a.place, a.subject) {
                    return true;
                }
                if matches!(s.topic(), Topic::Plan(_)) {
                    let base = if s.start_at() > now { s.start_at() } else { now };
                    s.rewrite_as_acknowledgement(base + rng.gen_range(lo..=hi));
                    debug!(bot = %owner.id, "Teammate announced the same plan; acknowledging");
                    *acknowledged += 1;
                    rewritten = true;
                    return true;
                }
                debug!(bot = %owner.id, topic = ?s.topic(), "Pruned statement repeated by active speaker");
                pruned += 1;
                false
            });

            if rewritten {
                queue.resort();
            }
        }
        pruned
    }
}

/// Number of statements being spoken across `members`.
#[must_use]
pub fn speaking_count<C: Chatterer>(members: &[C]) -> usize {
    members
        .iter()
        .map(|m| m.statements().iter().filter(|s| s.is_speaking()).count())
        .sum()
}

#[derive(Debug, Default)]
struct Step {
    started: bool,
    finished: Option<Statement>,
}

fn is_alive(world: &dyn World, id: EntityId) -> bool {
    world.actor(id).is_some_and(|a| a.alive)
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

fn clamp_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn start_part(owner: EntityId, statement: &mut Statement, frame: &mut ChatterFrame<'_>, rng: &mut StdRng) {
    let now = frame.now;
    let Some(part) = statement.parts().get(statement.cursor).cloned() else {
        statement.part_ends_at = Some(now);
        return;
    };
    let actor = frame.world.actor(owner);
    let duration = match part {
        StatementPart::Phrase(name) => {
            play(owner, &name, statement.place(), statement.count, frame, rng)
        }
        StatementPart::Context(ContextPart::EnemyCount) => {
            let seen = frame
                .world
                .known_enemies(owner)
                .iter()
                .filter(|e| e.visible)
                .count();
            let count = clamp_count(seen);
            statement.count = Some(count);
            if count >= frame.config.help_request_enemy_count && statement.meme.is_none() {
                let place = actor.as_ref().and_then(|a| a.place);
                statement.meme = Some(Box::new(RequestHelp { place }));
                debug!(bot = %owner, count, "Outnumbered; attaching help request");
            }
            if count == 0 {
                0.0
            } else {
                play(owner, names::ENEMY_COUNT, None, Some(count), frame, rng)
            }
        }
        StatementPart::Context(ContextPart::RemainingEnemies) => {
            let remaining = actor
                .as_ref()
                .map_or(0, |a| frame.world.enemies_remaining(a.team));
            let count = clamp_count(remaining);
            statement.count = Some(count);
            play(owner, names::ENEMIES_REMAINING, None, Some(count), frame, rng)
        }
        StatementPart::Context(ContextPart::CurrentPlace) => {
            match actor.as_ref().and_then(|a| a.place) {
                Some(place) => play(owner, names::PLACE, Some(place), None, frame, rng),
                None => 0.0,
            }
        }
        StatementPart::Context(ContextPart::Pause(seconds)) => seconds.max(0.0),
    };
    statement.part_ends_at = Some(now + duration);
}

/// Play a phrase, falling back to its radio signal. Returns the time the
/// speaker stays busy.
fn play(
    owner: EntityId,
    name: &str,
    place: Option<PlaceId>,
    count: Option<u32>,
    frame: &mut ChatterFrame<'_>,
    rng: &mut StdRng,
) -> f32 {
    let Some(bank) = frame.phrases else {
        debug!(phrase = name, "No phrase bank loaded");
        return 0.0;
    };
    let phrase = match bank.get(name) {
        Ok(phrase) => phrase,
        Err(err) => {
            warn!(phrase = name, error = %err, "Skipping statement part");
            return 0.0;
        }
    };
    if let Some(sound) = phrase.select(place, count, rng) {
        frame.voice.speak(owner, sound);
        return sound.duration;
    }
    match phrase.radio {
        Some(signal) => {
            frame.voice.broadcast_signal(owner, signal);
            frame.config.radio_signal_duration
        }
        None => {
            debug!(phrase = name, "No suitable variant and no radio fallback");
            0.0
        }
    }
}

fn broadcast<C: Chatterer>(
    members: &mut [C],
    sender_index: usize,
    sender: EntityId,
    finished: Statement,
    frame: &ChatterFrame<'_>,
) -> usize {
    let Some(meme) = finished.meme else {
        return 0;
    };
    info!(bot = %sender, meme = meme.name(), "Broadcasting meme");
    let gate = EnqueueGate::new(frame.config, true);
    let mut delivered = 0;

    for (index, member) in members.iter_mut().enumerate() {
        let me = member.id();
        if index == sender_index || !is_alive(frame.world, me) {
            continue;
        }
        let ChatterState {
            queue, blackboard, ..
        } = member.chatter_mut();
        let mut replies = Vec::new();
        let mut receiver = MemeReceiver {
            me,
            now: frame.now,
            world: frame.world,
            blackboard,
            replies: &mut replies,
        };
        meme.interpret(sender, &mut receiver);
        for reply in replies {
            if let Err(reason) = queue.enqueue(reply, &gate) {
                debug!(bot = %me, %reason, "Meme reply dropped");
            }
        }
        delivered += 1;
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatter::statement::Plan;
    use crate::sandbox::{RecordingVoice, SandboxChatterer, SandboxWorld, Utterance};
    use crate::types::{ActorSnapshot, Location, PlayerClass};

    const BANK: &str = r#"
[[phrase]]
name = "plan_capture"
[[phrase.variant]]
sound = "capture.wav"
duration = 1.0

[[phrase]]
name = "acknowledge"
radio = "affirmative"

[[phrase]]
name = "report_in"
[[phrase.variant]]
sound = "report.wav"
duration = 0.5

[[phrase]]
name = "enemy_count"
radio = "enemy_spotted"
"#;

    struct Team {
        world: SandboxWorld,
        members: Vec<SandboxChatterer>,
        voice: RecordingVoice,
        bank: PhraseBank,
        config: ChatterConfig,
        arbitrator: ChatterArbitrator,
    }

    impl Team {
        fn new(size: usize) -> Self {
            let mut world = SandboxWorld::default();
            let mut members = Vec::new();
            for seed in 0..size {
                let id = EntityId::new();
                world.add_actor(ActorSnapshot::new(id, TeamId(0), PlayerClass::Soldier));
                members.push(SandboxChatterer::new(id, u64::try_from(seed).expect("seed")));
            }
            Self {
                world,
                members,
                voice: RecordingVoice::default(),
                bank: PhraseBank::from_toml(BANK).expect("bank"),
                config: ChatterConfig::default(),
                arbitrator: ChatterArbitrator::new(TeamId(0)),
            }
        }

        fn say(&mut self, who: usize, statement: Statement) -> Option<StatementId> {
            let gate = EnqueueGate::new(&self.config, true);
            self.members[who].queue.enqueue(statement, &gate).ok()
        }

        fn tick(&mut self, now: f32) -> ChatterReport {
            let mut frame = ChatterFrame {
                now: GameTime(now),
                world: &self.world,
                voice: &mut self.voice,
                phrases: Some(&self.bank),
                config: &self.config,
            };
            self.arbitrator.update(&mut self.members, &mut frame)
        }
    }

    #[test]
    fn identical_plans_converge() {
        let mut team = Team::new(2);
        let place = Some(PlaceId(5));
        let (a, b) = (team.members[0].id, team.members[1].id);
        team.say(0, Statement::plan(a, Plan::CapturePoint, place, GameTime::ZERO));
        team.say(1, Statement::plan(b, Plan::CapturePoint, place, GameTime::ZERO));

        let first = team.tick(0.0);
        assert_eq!(first.active.map(|(owner, _)| owner), Some(a));
        assert_eq!(first.acknowledged, 1);
        let ack = team.members[1].queue.iter().next().expect("ack");
        assert_eq!(ack.topic(), Topic::Acknowledge);
        assert!(ack.start_at() > GameTime::ZERO);

        let mut t = 0.0;
        while t < 5.0 {
            t += 0.1;
            team.tick(t);
        }
        let plans = team
            .voice
            .log
            .iter()
            .filter(|(_, u)| matches!(u, Utterance::Sound(s) if s == "capture.wav"))
            .count();
        assert_eq!(plans, 1);
        assert!(team.members[1].blackboard.teammate_has_plan(Plan::CapturePoint, place));
        assert!(team.members.iter().all(|m| m.queue.is_empty()));
        assert!(
            team.voice
                .log
                .iter()
                .any(|(who, u)| *who == b && matches!(u, Utterance::Signal(_)))
        );
    }

    #[test]
    fn at_most_one_speaker() {
        let mut team = Team::new(3);
        for i in 0..3 {
            let id = team.members[i].id;
            let place = Some(PlaceId(u32::try_from(i).expect("small")));
            team.say(i, Statement::plan(id, Plan::CapturePoint, place, GameTime::ZERO));
        }
        let mut t = 0.0;
        while t < 6.0 {
            team.tick(t);
            assert!(speaking_count(&team.members) <= 1);
            t += 0.25;
        }
    }

    #[test]
    fn radio_silence_triggers_single_report() {
        let mut team = Team::new(3);
        let enemy = EntityId::new();
        team.world
            .add_actor(ActorSnapshot::new(enemy, TeamId(1), PlayerClass::Scout));

        team.tick(0.0);
        let report = team.tick(31.0);
        assert!(report.started);
        assert_eq!(report.pruned, 2);

        let mut t = 31.0;
        while t < 33.0 {
            t += 0.1;
            team.tick(t);
        }
        let asked = team
            .voice
            .log
            .iter()
            .filter(|(_, u)| matches!(u, Utterance::Sound(s) if s == "report.wav"))
            .count();
        assert_eq!(asked, 1);
        assert!(team.members[1].blackboard.report_requested);
    }

    #[test]
    fn enemy_count_attaches_help_request() {
        let mut team = Team::new(2);
        let speaker = team.members[0].id;
        for x in 0u8..3 {
            team.world
                .set_visible_enemy(speaker, Location::new(100.0 + f32::from(x), 0.0, 0.0));
        }
        team.say(
            0,
            Statement::new(speaker, Topic::EnemySpotted, GameTime::ZERO)
                .context(ContextPart::EnemyCount),
        );
        let mut t = 0.0;
        while t < 3.0 {
            team.tick(t);
            t += 0.5;
        }
        let help = team.members[1].blackboard.help_request.as_ref().expect("help");
        assert_eq!(help.from, speaker);
    }

    #[test]
    fn dead_members_fall_silent() {
        let mut team = Team::new(2);
        let id = team.members[0].id;
        team.say(0, Statement::plan(id, Plan::Attack, None, GameTime::ZERO));
        if let Some(a) = team.world.actor_mut(id) {
            a.alive = false;
        }
        let report = team.tick(0.0);
        assert!(report.active.is_none());
        assert!(team.members[0].queue.is_empty());
    }

    #[test]
    fn failed_conditions_prune() {
        let mut team = Team::new(1);
        let id = team.members[0].id;
        team.say(
            0,
            Statement::new(id, Topic::Reloading, GameTime::ZERO)
                .phrase("reloading")
                .delayed(5.0)
                .when(Condition::InCombat),
        );
        let report = team.tick(0.0);
        assert_eq!(report.pruned, 1);
        assert!(team.members[0].queue.is_empty());
    }
}
