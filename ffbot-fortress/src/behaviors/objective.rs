//! Objective behaviors chosen by the scenario monitor.
//!
//! Every objective announces its plan when it starts, so teammates that
//! picked the same plan at the same place converge on one speaker.

use ffbot_core::behavior::query::defaults;
use ffbot_core::behavior::{ActionResult, Behavior, EventDesiredResult, Importance, QueryAnswer};
use ffbot_core::chatter::meme::DefendHereRequest;
use ffbot_core::chatter::phrase::names;
use ffbot_core::chatter::statement::{Condition, Plan, Statement, Topic};
use ffbot_core::context::{BotContext, QueryContext};
use ffbot_core::event::BotEvent;
use ffbot_core::types::{EntityId, Location, PlaceId};
use ffbot_core::world::{ControlPoint, FlagState, KnownEntity};

use super::combat::Attack;
use super::path::{ARRIVE_DISTANCE, PathFollower, PathStatus};

/// Escorts stay within this distance of their leader.
const FOLLOW_DISTANCE: f32 = 300.0;
/// Medic beam range.
const HEAL_RANGE: f32 = 450.0;
/// Spies strike from this close.
const BACKSTAB_RANGE: f32 = 64.0;

fn announce(ctx: &mut BotContext<'_>, plan: Plan, place: Option<PlaceId>) {
    ctx.say(Statement::plan(ctx.me, plan, place, ctx.now));
}

fn refresh_point(ctx: &BotContext<'_>, id: EntityId) -> Option<ControlPoint> {
    ctx.world.control_points().into_iter().find(|p| p.id == id)
}

fn follow(path: &mut PathFollower, ctx: &mut BotContext<'_>, goal: Location) -> ActionResult {
    path.set_goal(goal);
    match path.update(ctx, ARRIVE_DISTANCE) {
        PathStatus::Moving | PathStatus::Arrived => ActionResult::Continue,
        PathStatus::Failed => ActionResult::done("goal unreachable"),
    }
}

// ---------------------------------------------------------------------------
// Control points
// ---------------------------------------------------------------------------

/// Stand on a point until the team owns it.
#[derive(Debug, Clone)]
pub struct CapturePoint {
    point: ControlPoint,
    path: PathFollower,
}

impl CapturePoint {
    /// Capture `point`.
    #[must_use]
    pub fn new(point: ControlPoint) -> Self {
        Self {
            point,
            path: PathFollower::new(),
        }
    }

    /// The point being taken.
    #[must_use]
    pub fn point(&self) -> &ControlPoint {
        &self.point
    }
}

impl Behavior for CapturePoint {
    fn name(&self) -> &'static str {
        "CapturePoint"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        announce(ctx, Plan::CapturePoint, self.point.place);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::done("no body");
        };
        let Some(point) = refresh_point(ctx, self.point.id) else {
            return ActionResult::done("point vanished");
        };
        self.point = point;
        if point.is_owned_by(me.team) {
            return ActionResult::done("point captured");
        }
        if point.locked {
            return ActionResult::done("point locked");
        }
        follow(&mut self.path, ctx, point.position)
    }

    fn task(&self) -> Option<String> {
        Some(format!("capturing {}", self.point.id))
    }
}

/// Hold an owned point.
#[derive(Debug, Clone)]
pub struct DefendPoint {
    point: ControlPoint,
    path: PathFollower,
    called_for_help: bool,
}

impl DefendPoint {
    /// Defend `point`.
    #[must_use]
    pub fn new(point: ControlPoint) -> Self {
        Self {
            point,
            path: PathFollower::new(),
            called_for_help: false,
        }
    }

    /// Ask the team to hold this point with us, once per defense.
    fn call_for_help(&mut self, ctx: &mut BotContext<'_>) {
        let Some(place) = self.point.place.filter(|_| !self.called_for_help) else {
            return;
        };
        self.called_for_help = true;
        let request = Statement::new(ctx.me, Topic::DefendHere, ctx.now)
            .at_place(Some(place))
            .phrase(names::DEFEND_HERE)
            .when(Condition::InCombat)
            .with_meme(DefendHereRequest { place });
        ctx.say(request);
    }
}

impl Behavior for DefendPoint {
    fn name(&self) -> &'static str {
        "DefendPoint"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        announce(ctx, Plan::DefendPoint, self.point.place);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::done("no body");
        };
        let Some(point) = refresh_point(ctx, self.point.id) else {
            return ActionResult::done("point vanished");
        };
        self.point = point;
        if !point.is_owned_by(me.team) {
            if point.place.is_some() && ctx.blackboard.defend_request == point.place {
                ctx.blackboard.defend_request = None;
            }
            return ActionResult::done("point lost");
        }
        if let Some(threat) = ctx.query().threats().into_iter().find(|t| t.visible) {
            self.call_for_help(ctx);
            return ActionResult::suspend_for(Attack::new(threat.id), "intruder");
        }
        let result = follow(&mut self.path, ctx, point.position);
        if self.path.goal().is_some_and(|g| g.distance(&me.position) <= ARRIVE_DISTANCE) {
            ctx.body.crouch = true;
        }
        result
    }

    fn task(&self) -> Option<String> {
        Some(format!("defending {}", self.point.id))
    }
}

// ---------------------------------------------------------------------------
// Flag
// ---------------------------------------------------------------------------

/// Go pick up the objective item.
#[derive(Debug, Clone, Default)]
pub struct FetchFlag {
    path: PathFollower,
}

impl FetchFlag {
    /// A fresh fetch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for FetchFlag {
    fn name(&self) -> &'static str {
        "FetchFlag"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        announce(ctx, Plan::FetchFlag, None);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::done("no body");
        };
        if me.carrying_flag {
            return ActionResult::done("picked up flag");
        }
        let Some(flag) = ctx.world.flag(me.team) else {
            return ActionResult::done("no flag in this mode");
        };
        if let FlagState::Carried(_) = flag.state {
            ctx.blackboard.loose_flag = None;
            return ActionResult::done("flag taken by someone else");
        }
        follow(&mut self.path, ctx, flag.position)
    }

    fn task(&self) -> Option<String> {
        Some("fetching flag".to_owned())
    }
}

/// Carry the objective item to its capture zone.
#[derive(Debug, Clone, Default)]
pub struct DeliverFlag {
    path: PathFollower,
}

impl DeliverFlag {
    /// A fresh delivery.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for DeliverFlag {
    fn name(&self) -> &'static str {
        "DeliverFlag"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        announce(ctx, Plan::DeliverFlag, None);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::done("no body");
        };
        if !me.carrying_flag {
            return ActionResult::done("no longer carrying");
        }
        let Some(flag) = ctx.world.flag(me.team) else {
            return ActionResult::done("no flag in this mode");
        };
        follow(&mut self.path, ctx, flag.capture_zone)
    }

    fn interruptibility(&self) -> Importance {
        Importance::Important
    }

    fn should_hurry(&self, _q: &QueryContext<'_>) -> QueryAnswer {
        QueryAnswer::Yes
    }

    fn task(&self) -> Option<String> {
        Some("delivering flag".to_owned())
    }
}

// ---------------------------------------------------------------------------
// Hunting
// ---------------------------------------------------------------------------

/// Roam toward likely enemy contact and attack what shows up.
#[derive(Debug, Clone, Default)]
pub struct SeekAndDestroy {
    roam: Option<Location>,
    path: PathFollower,
}

impl SeekAndDestroy {
    /// A fresh hunt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pick_roam(ctx: &mut BotContext<'_>) -> Option<Location> {
        let me = ctx.actor()?;
        if let Some(place) = ctx.blackboard.help_request.as_ref().and_then(|h| h.place) {
            if let Some(spot) = ctx.world.random_point_in_place(place, &mut *ctx.rng) {
                return Some(spot);
            }
        }
        if let Some(noise) = ctx.blackboard.noises.last() {
            return Some(noise.position);
        }
        ctx.world
            .control_points()
            .into_iter()
            .filter(|p| !p.is_owned_by(me.team))
            .min_by(|a, b| {
                let da = a.position.distance(&me.position);
                let db = b.position.distance(&me.position);
                da.total_cmp(&db)
            })
            .map(|p| p.position)
    }
}

impl Behavior for SeekAndDestroy {
    fn name(&self) -> &'static str {
        "SeekAndDestroy"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        announce(ctx, Plan::Attack, None);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let q = ctx.query();
        let target = q
            .threats()
            .into_iter()
            .filter(|t| t.visible)
            .reduce(|a, b| {
                if defaults::select_more_dangerous_threat(&q, &a, &b) == a.id { a } else { b }
            });
        if let Some(target) = target {
            return ActionResult::suspend_for(Attack::new(target.id), "enemy sighted");
        }

        if self.roam.is_none() {
            self.roam = Self::pick_roam(ctx);
        }
        let Some(goal) = self.roam else {
            return ActionResult::Continue;
        };
        self.path.set_goal(goal);
        match self.path.update(ctx, ARRIVE_DISTANCE) {
            PathStatus::Moving => ActionResult::Continue,
            PathStatus::Arrived => {
                ctx.blackboard.help_request = None;
                ctx.blackboard.noises.retain(|n| n.position.distance(&goal) > ARRIVE_DISTANCE);
                self.roam = None;
                ActionResult::Continue
            }
            PathStatus::Failed => ActionResult::done("roam target unreachable"),
        }
    }

    fn on_resume(&mut self, _ctx: &mut BotContext<'_>, _finished: &dyn Behavior) -> ActionResult {
        self.roam = None;
        self.path.clear();
        ActionResult::Continue
    }

    fn task(&self) -> Option<String> {
        Some(match self.roam {
            Some(goal) => format!("hunting near {goal}"),
            None => "hunting".to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Squad
// ---------------------------------------------------------------------------

/// Stay close to the squad leader and run `inner` while in range.
#[derive(Debug)]
pub struct EscortLeader {
    leader: EntityId,
    inner: Box<dyn Behavior>,
    inner_started: bool,
    path: PathFollower,
}

impl EscortLeader {
    /// Escort `leader` while doing `inner`.
    #[must_use]
    pub fn new(leader: EntityId, inner: Box<dyn Behavior>) -> Self {
        Self {
            leader,
            inner,
            inner_started: false,
            path: PathFollower::new(),
        }
    }

    /// The leader being escorted.
    #[must_use]
    pub fn leader(&self) -> EntityId {
        self.leader
    }

    /// The wrapped behavior.
    #[must_use]
    pub fn inner(&self) -> &dyn Behavior {
        self.inner.as_ref()
    }
}

impl Behavior for EscortLeader {
    fn name(&self) -> &'static str {
        "EscortLeader"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        announce(ctx, Plan::Escort, None);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::done("no body");
        };
        let Some(leader) = ctx.world.actor(self.leader).filter(|l| l.alive) else {
            if ctx.blackboard.follow_request == Some(self.leader) {
                ctx.blackboard.follow_request = None;
            }
            return ActionResult::done("leader gone");
        };
        if leader.position.distance(&me.position) > FOLLOW_DISTANCE {
            return follow(&mut self.path, ctx, leader.position);
        }
        self.path.clear();
        if self.inner_started {
            self.inner.update(ctx)
        } else {
            self.inner_started = true;
            self.inner.on_start(ctx, None)
        }
    }

    fn on_suspend(&mut self, ctx: &mut BotContext<'_>, interruptor: &dyn Behavior) {
        if self.inner_started {
            self.inner.on_suspend(ctx, interruptor);
        }
    }

    fn on_resume(&mut self, ctx: &mut BotContext<'_>, finished: &dyn Behavior) -> ActionResult {
        if self.inner_started {
            self.inner.on_resume(ctx, finished)
        } else {
            ActionResult::Continue
        }
    }

    fn on_end(&mut self, ctx: &mut BotContext<'_>, next: Option<&dyn Behavior>) {
        if self.inner_started {
            self.inner.on_end(ctx, next);
        }
    }

    fn on_event(&mut self, ctx: &mut BotContext<'_>, event: &BotEvent) -> EventDesiredResult {
        self.inner.on_event(ctx, event)
    }

    fn interruptibility(&self) -> Importance {
        self.inner.interruptibility()
    }

    fn task(&self) -> Option<String> {
        let inner = self.inner.task().unwrap_or_else(|| self.inner.name().to_owned());
        Some(format!("escorting {}: {inner}", self.leader))
    }

    fn should_retreat(&self, q: &QueryContext<'_>) -> QueryAnswer {
        self.inner.should_retreat(q)
    }

    fn should_hurry(&self, q: &QueryContext<'_>) -> QueryAnswer {
        self.inner.should_hurry(q)
    }

    fn should_attack(&self, q: &QueryContext<'_>, threat: &KnownEntity) -> QueryAnswer {
        self.inner.should_attack(q, threat)
    }

    fn is_hindrance(&self, q: &QueryContext<'_>, entity: EntityId) -> QueryAnswer {
        if entity == self.leader {
            return QueryAnswer::No;
        }
        self.inner.is_hindrance(q, entity)
    }
}

// ---------------------------------------------------------------------------
// Class roles
// ---------------------------------------------------------------------------

/// Keep the most hurt teammate topped up.
#[derive(Debug, Clone, Default)]
pub struct Heal {
    patient: Option<EntityId>,
    path: PathFollower,
}

impl Heal {
    /// A fresh heal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Who is being healed.
    #[must_use]
    pub fn patient(&self) -> Option<EntityId> {
        self.patient
    }

    fn choose_patient(ctx: &BotContext<'_>) -> Option<(EntityId, Location)> {
        let me = ctx.actor()?;
        let mates: Vec<_> = ctx
            .world
            .teammates(me.team)
            .into_iter()
            .filter(|id| *id != ctx.me)
            .filter_map(|id| ctx.world.actor(id))
            .filter(|a| a.alive)
            .collect();
        let hurt = |id: EntityId| mates.iter().find(|a| a.id == id && a.health_ratio() < 1.0);

        let preferred = me
            .squad
            .map(|s| s.leader)
            .and_then(hurt)
            .or_else(|| ctx.blackboard.help_request.as_ref().and_then(|h| hurt(h.from)));
        if let Some(p) = preferred {
            return Some((p.id, p.position));
        }
        let most_hurt = mates
            .iter()
            .filter(|a| a.health_ratio() < 1.0)
            .min_by(|a, b| a.health_ratio().total_cmp(&b.health_ratio()));
        let nearest = || {
            mates.iter().min_by(|a, b| {
                a.position
                    .distance(&me.position)
                    .total_cmp(&b.position.distance(&me.position))
            })
        };
        most_hurt.or_else(nearest).map(|a| (a.id, a.position))
    }
}

impl Behavior for Heal {
    fn name(&self) -> &'static str {
        "Heal"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        announce(ctx, Plan::Heal, None);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::done("no body");
        };
        let Some((patient, at)) = Self::choose_patient(ctx) else {
            self.patient = None;
            return ActionResult::Continue;
        };
        self.patient = Some(patient);
        if at.distance(&me.position) > HEAL_RANGE {
            return follow(&mut self.path, ctx, at);
        }
        self.path.clear();
        ctx.body.look_at = Some(at);
        ctx.body.heal_target = Some(patient);
        ActionResult::Continue
    }

    fn should_attack(&self, _q: &QueryContext<'_>, _threat: &KnownEntity) -> QueryAnswer {
        if self.patient.is_some() {
            QueryAnswer::No
        } else {
            QueryAnswer::DontCare
        }
    }

    fn task(&self) -> Option<String> {
        self.patient.map(|p| format!("healing {p}"))
    }
}

/// Hold a lane and pick off visible enemies from range.
#[derive(Debug, Clone, Default)]
pub struct Snipe {
    spot: Option<Location>,
    path: PathFollower,
}

impl Snipe {
    /// A fresh snipe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for Snipe {
    fn name(&self) -> &'static str {
        "Snipe"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::Continue;
        };
        let contested = ctx
            .world
            .control_points()
            .into_iter()
            .find(|p| !p.is_owned_by(me.team))
            .map(|p| p.position);
        self.spot = contested.and_then(|c| ctx.world.find_cover(me.position, &[c]));
        let place = self.spot.and_then(|s| ctx.world.place_of(s));
        announce(ctx, Plan::Snipe, place);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let target = ctx
            .query()
            .threats()
            .into_iter()
            .filter(|t| t.visible && ctx.world.is_line_of_sight_clear(ctx.me, t.id))
            .min_by(|a, b| a.distance.total_cmp(&b.distance));
        if let Some(target) = target {
            ctx.body.look_at = Some(target.position);
            ctx.body.fire_at = Some(target.id);
            ctx.body.crouch = true;
            return ActionResult::Continue;
        }
        match self.spot {
            Some(spot) => {
                self.path.set_goal(spot);
                match self.path.update(ctx, ARRIVE_DISTANCE) {
                    PathStatus::Moving => ActionResult::Continue,
                    PathStatus::Arrived => {
                        ctx.body.crouch = true;
                        ActionResult::Continue
                    }
                    PathStatus::Failed => ActionResult::done("sniper nest unreachable"),
                }
            }
            None => {
                ctx.body.crouch = true;
                ActionResult::Continue
            }
        }
    }

    fn should_attack(&self, _q: &QueryContext<'_>, threat: &KnownEntity) -> QueryAnswer {
        QueryAnswer::from(threat.visible)
    }

    fn task(&self) -> Option<String> {
        Some("sniping".to_owned())
    }
}

/// Sneak up on one enemy and strike from behind.
#[derive(Debug, Clone, Default)]
pub struct SpyInfiltrate {
    victim: Option<EntityId>,
    path: PathFollower,
}

impl SpyInfiltrate {
    /// A fresh infiltration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current victim.
    #[must_use]
    pub fn victim(&self) -> Option<EntityId> {
        self.victim
    }
}

impl Behavior for SpyInfiltrate {
    fn name(&self) -> &'static str {
        "SpyInfiltrate"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        announce(ctx, Plan::Infiltrate, None);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let known = ctx.world.known_enemies(ctx.me);
        let victim = self
            .victim
            .and_then(|id| known.iter().find(|e| e.id == id))
            .or_else(|| known.iter().min_by(|a, b| a.distance.total_cmp(&b.distance)));
        let Some(victim) = victim.cloned() else {
            self.victim = None;
            return ActionResult::Continue;
        };
        if self.victim != Some(victim.id) {
            self.path.clear();
        }
        self.victim = Some(victim.id);

        ctx.body.look_at = Some(victim.position);
        if victim.distance <= BACKSTAB_RANGE {
            ctx.body.fire_at = Some(victim.id);
            return ActionResult::Continue;
        }
        follow(&mut self.path, ctx, victim.position)
    }

    fn on_event(&mut self, _ctx: &mut BotContext<'_>, event: &BotEvent) -> EventDesiredResult {
        if let BotEvent::OtherKilled { victim, .. } = event {
            if self.victim == Some(*victim) {
                self.victim = None;
                self.path.clear();
            }
        }
        EventDesiredResult::TryContinue
    }

    fn should_attack(&self, _q: &QueryContext<'_>, threat: &KnownEntity) -> QueryAnswer {
        QueryAnswer::from(self.victim == Some(threat.id))
    }

    fn is_hindrance(&self, _q: &QueryContext<'_>, entity: EntityId) -> QueryAnswer {
        if self.victim == Some(entity) {
            QueryAnswer::No
        } else {
            QueryAnswer::DontCare
        }
    }

    fn task(&self) -> Option<String> {
        self.victim.map(|v| format!("stalking {v}"))
    }
}

/// Walk to a build spot and place a sentry.
#[derive(Debug, Clone)]
pub struct BuildSentry {
    spot: Location,
    path: PathFollower,
}

impl BuildSentry {
    /// Build at `spot`.
    #[must_use]
    pub fn new(spot: Location) -> Self {
        Self {
            spot,
            path: PathFollower::new(),
        }
    }

    /// Where the sentry goes.
    #[must_use]
    pub fn spot(&self) -> Location {
        self.spot
    }
}

impl Behavior for BuildSentry {
    fn name(&self) -> &'static str {
        "BuildSentry"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        let place = ctx.world.place_of(self.spot);
        announce(ctx, Plan::BuildSentry, place);
        self.path.set_goal(self.spot);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        match self.path.update(ctx, ARRIVE_DISTANCE) {
            PathStatus::Moving => ActionResult::Continue,
            PathStatus::Arrived => {
                ctx.body.build_at = Some(self.spot);
                ActionResult::done("sentry placed")
            }
            PathStatus::Failed => ActionResult::done("build spot unreachable"),
        }
    }

    fn task(&self) -> Option<String> {
        Some(format!("building sentry at {}", self.spot))
    }
}
