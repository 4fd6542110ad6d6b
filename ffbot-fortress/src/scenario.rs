//! The scenario monitor: picks and re-picks the bot's primary objective.
//!
//! The choice itself is a pure function of the bot's snapshot, the world
//! and its blackboard ([`desired_scenario_and_class_action`]), so it can be
//! tested without a stack. The monitor adds the per-tick flag overrides.

use ffbot_core::behavior::{ActionResult, Behavior, EventDesiredResult, StackView};
use ffbot_core::blackboard::Blackboard;
use ffbot_core::chatter::meme::FlagLoose;
use ffbot_core::chatter::phrase::names;
use ffbot_core::chatter::statement::{Plan, Statement, Topic};
use ffbot_core::context::BotContext;
use ffbot_core::timer::CountdownTimer;
use ffbot_core::types::{
    ActorSnapshot, EntityId, GameMode, GameTime, Location, Mission, NpcRole, PlayerClass,
};
use ffbot_core::world::{ControlPoint, FlagInfo, FlagState, World};
use tracing::debug;

use crate::behaviors::{
    BuildSentry, CapturePoint, DefendPoint, DeliverFlag, DestroySentry, EscortLeader, FetchFlag,
    Heal, SeekAndDestroy, Snipe, SpyInfiltrate,
};

/// A primary objective, before it becomes a behavior.
#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    /// Knock out a known enemy sentry.
    DestroySentry(EntityId),
    /// Hold a lane as a sniper.
    Snipe,
    /// Stalk enemies as a spy.
    Infiltrate,
    /// Keep teammates alive.
    Heal,
    /// Build a sentry at a hint spot.
    BuildSentry(Location),
    /// Bring the carried flag home.
    DeliverFlag,
    /// Go get the flag.
    FetchFlag,
    /// Take a point.
    CapturePoint(ControlPoint),
    /// Hold an owned point.
    DefendPoint(ControlPoint),
    /// Hunt enemies.
    SeekAndDestroy,
    /// Stay with `leader` while doing `inner`.
    Escort {
        /// The squad leader or boss.
        leader: EntityId,
        /// What to do while close to the leader.
        inner: Box<Objective>,
    },
}

impl Objective {
    /// The plan this objective announces.
    #[must_use]
    pub fn plan(&self) -> Plan {
        match self {
            Self::DestroySentry(_) | Self::SeekAndDestroy => Plan::Attack,
            Self::Snipe => Plan::Snipe,
            Self::Infiltrate => Plan::Infiltrate,
            Self::Heal => Plan::Heal,
            Self::BuildSentry(_) => Plan::BuildSentry,
            Self::DeliverFlag => Plan::DeliverFlag,
            Self::FetchFlag => Plan::FetchFlag,
            Self::CapturePoint(_) => Plan::CapturePoint,
            Self::DefendPoint(_) => Plan::DefendPoint,
            Self::Escort { .. } => Plan::Escort,
        }
    }

    /// Build the behavior that pursues this objective.
    #[must_use]
    pub fn into_behavior(self) -> Box<dyn Behavior> {
        match self {
            Self::DestroySentry(sentry) => Box::new(DestroySentry::new(sentry)),
            Self::Snipe => Box::new(Snipe::new()),
            Self::Infiltrate => Box::new(SpyInfiltrate::new()),
            Self::Heal => Box::new(Heal::new()),
            Self::BuildSentry(spot) => Box::new(BuildSentry::new(spot)),
            Self::DeliverFlag => Box::new(DeliverFlag::new()),
            Self::FetchFlag => Box::new(FetchFlag::new()),
            Self::CapturePoint(point) => Box::new(CapturePoint::new(point)),
            Self::DefendPoint(point) => Box::new(DefendPoint::new(point)),
            Self::SeekAndDestroy => Box::new(SeekAndDestroy::new()),
            Self::Escort { leader, inner } => {
                Box::new(EscortLeader::new(leader, inner.into_behavior()))
            }
        }
    }
}

/// Choose the primary objective for `me`. First applicable branch wins:
///
/// 1. explicit mission
/// 2. NPC role in arena mode (boss hunts, minions escort the boss)
/// 3. class role in arena mode
/// 4. class specialization (sniper, medic, engineer, spy)
/// 5. carrying the flag
/// 6. flag available to fetch
/// 7. point a teammate asked us to hold
/// 8. capturable point
/// 9. owned point to defend
/// 10. seek and destroy
///
/// Squad followers other than medics get the result wrapped in an escort,
/// as do unsquadded bots a teammate asked to follow.
#[must_use]
pub fn desired_scenario_and_class_action(
    me: &ActorSnapshot,
    world: &dyn World,
    blackboard: &Blackboard,
) -> Objective {
    if let Some(objective) = mission_objective(me, world) {
        return escorted(me, world, blackboard, objective);
    }
    if world.mode() == GameMode::Arena {
        if let Some(role) = me.role {
            return match role {
                NpcRole::Boss => Objective::SeekAndDestroy,
                NpcRole::Minion => boss_of(me, world).map_or(Objective::SeekAndDestroy, |boss| {
                    Objective::Escort {
                        leader: boss,
                        inner: Box::new(Objective::SeekAndDestroy),
                    }
                }),
            };
        }
    }
    escorted(me, world, blackboard, choose_unwrapped(me, world, blackboard))
}

fn mission_objective(me: &ActorSnapshot, world: &dyn World) -> Option<Objective> {
    match me.mission {
        Mission::DestroySentries => Some(
            nearest_sentry(me, world).map_or(Objective::SeekAndDestroy, Objective::DestroySentry),
        ),
        Mission::Snipe => Some(Objective::Snipe),
        Mission::Infiltrate => Some(Objective::Infiltrate),
        Mission::None => None,
    }
}

fn escorted(
    me: &ActorSnapshot,
    world: &dyn World,
    blackboard: &Blackboard,
    chosen: Objective,
) -> Objective {
    let leader = match me.squad {
        Some(squad) if me.is_squad_follower() => Some(squad.leader),
        Some(_) => None,
        None => blackboard.follow_request.filter(|id| *id != me.id),
    };
    match leader {
        Some(leader)
            if me.class != PlayerClass::Medic && world.actor(leader).is_some_and(|l| l.alive) =>
        {
            Objective::Escort {
                leader,
                inner: Box::new(chosen),
            }
        }
        _ => chosen,
    }
}

fn choose_unwrapped(me: &ActorSnapshot, world: &dyn World, blackboard: &Blackboard) -> Objective {
    if world.mode() == GameMode::Arena {
        return match me.class {
            PlayerClass::Medic => Objective::Heal,
            _ => Objective::SeekAndDestroy,
        };
    }

    match me.class {
        PlayerClass::Sniper => return Objective::Snipe,
        PlayerClass::Medic => return Objective::Heal,
        PlayerClass::Spy => return Objective::Infiltrate,
        PlayerClass::Engineer => {
            let unclaimed = world.sentry_hints(me.team).into_iter().find(|hint| {
                !blackboard.teammate_has_plan(Plan::BuildSentry, world.place_of(*hint))
            });
            if let Some(hint) = unclaimed {
                return Objective::BuildSentry(hint);
            }
        }
        _ => {}
    }

    if me.carrying_flag {
        return Objective::DeliverFlag;
    }
    if world.mode() == GameMode::CaptureTheFlag
        && world.flag(me.team).is_some_and(|f| f.is_available())
    {
        return Objective::FetchFlag;
    }

    let points = world.control_points();
    let requested = blackboard.defend_request.and_then(|place| {
        nearest_point(&points, me.position, |p| {
            p.place == Some(place) && p.is_owned_by(me.team)
        })
    });
    if let Some(point) = requested {
        return Objective::DefendPoint(point);
    }
    if let Some(point) = nearest_point(&points, me.position, |p| p.can_be_captured_by(me.team)) {
        return Objective::CapturePoint(point);
    }
    if let Some(point) = nearest_point(&points, me.position, |p| p.is_owned_by(me.team)) {
        return Objective::DefendPoint(point);
    }
    Objective::SeekAndDestroy
}

fn nearest_point(
    points: &[ControlPoint],
    from: Location,
    pred: impl Fn(&ControlPoint) -> bool,
) -> Option<ControlPoint> {
    points
        .iter()
        .filter(|p| pred(p))
        .min_by(|a, b| a.position.distance(&from).total_cmp(&b.position.distance(&from)))
        .copied()
}

fn boss_of(me: &ActorSnapshot, world: &dyn World) -> Option<EntityId> {
    world
        .teammates(me.team)
        .into_iter()
        .filter_map(|id| world.actor(id))
        .find(|a| a.alive && a.role == Some(NpcRole::Boss))
        .map(|a| a.id)
}

fn nearest_sentry(me: &ActorSnapshot, world: &dyn World) -> Option<EntityId> {
    world
        .known_enemy_sentries(me.id)
        .into_iter()
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
        .map(|s| s.id)
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Inner long-lived behavior. Always suspended under the chosen objective.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMonitor {
    grace: CountdownTimer,
    last_choice: Option<Plan>,
    reported_drop: Option<GameTime>,
}

impl ScenarioMonitor {
    /// A fresh monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan of the objective chosen most recently.
    #[must_use]
    pub fn last_choice(&self) -> Option<Plan> {
        self.last_choice
    }

    fn choose(&mut self, ctx: &BotContext<'_>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::suspend_for(SeekAndDestroy::new(), "no snapshot");
        };
        let objective = desired_scenario_and_class_action(&me, ctx.world, ctx.blackboard);
        debug!(bot = %ctx.me, objective = ?objective.plan(), "Scenario chose objective");
        self.last_choice = Some(objective.plan());
        ActionResult::SuspendFor(objective.into_behavior(), "scenario objective")
    }

    /// Tell the team once per drop.
    fn report_drop(&mut self, ctx: &mut BotContext<'_>, flag: &FlagInfo, since: GameTime) {
        if self.reported_drop == Some(since) {
            return;
        }
        self.reported_drop = Some(since);
        let callout = Statement::new(ctx.me, Topic::FlagLoose, ctx.now)
            .at_place(ctx.world.place_of(flag.position))
            .phrase(names::FLAG_LOOSE)
            .important()
            .with_meme(FlagLoose {
                position: flag.position,
            });
        ctx.say(callout);
    }
}

impl Behavior for ScenarioMonitor {
    fn name(&self) -> &'static str {
        "ScenarioMonitor"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        self.grace.start(ctx.now, ctx.config.behavior.flag_grace_period);
        self.choose(ctx)
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        self.choose(ctx)
    }

    fn on_resume(&mut self, ctx: &mut BotContext<'_>, _finished: &dyn Behavior) -> ActionResult {
        self.choose(ctx)
    }

    fn monitor(&mut self, ctx: &mut BotContext<'_>, view: &StackView<'_>) -> EventDesiredResult {
        let Some(me) = ctx.actor() else {
            return EventDesiredResult::TryContinue;
        };
        if me.carrying_flag {
            if view.above_contains("DeliverFlag") {
                return EventDesiredResult::TryContinue;
            }
            return EventDesiredResult::important(DeliverFlag::new(), "carrying flag");
        }

        let Some(flag) = ctx.world.flag(me.team) else {
            return EventDesiredResult::TryContinue;
        };
        let FlagState::Dropped { since } = flag.state else {
            ctx.blackboard.loose_flag = None;
            return EventDesiredResult::TryContinue;
        };
        self.report_drop(ctx, &flag, since);

        // A teammate's callout cuts the grace period short, never the loose timer.
        let grace_over = self.grace.is_elapsed(ctx.now) || ctx.blackboard.loose_flag.is_some();
        let loose_long_enough =
            ctx.now.since(since) >= ctx.config.behavior.fetch_lost_flag_time;
        if grace_over
            && loose_long_enough
            && view.tip_name() != Some("Heal")
            && !view.above_contains("FetchFlag")
        {
            return EventDesiredResult::important(FetchFlag::new(), "flag loose");
        }
        EventDesiredResult::TryContinue
    }

    fn task(&self) -> Option<String> {
        self.last_choice.map(|p| format!("objective {}", p.phrase()))
    }
}

#[cfg(test)]
mod tests {
    use ffbot_core::behavior::BehaviorStack;
    use ffbot_core::blackboard::TeammatePlan;
    use ffbot_core::config::BotConfig;
    use ffbot_core::context::Locals;
    use ffbot_core::sandbox::SandboxWorld;
    use ffbot_core::types::{PlaceId, SquadInfo, TeamId};

    use super::*;

    fn point(x: f32, owner: Option<TeamId>) -> ControlPoint {
        ControlPoint {
            id: EntityId::new(),
            position: Location::new(x, 0.0, 0.0),
            place: None,
            owner,
            locked: false,
        }
    }

    fn soldier(world: &mut SandboxWorld) -> ActorSnapshot {
        let me = ActorSnapshot::new(EntityId::new(), TeamId(0), PlayerClass::Soldier);
        world.add_actor(me.clone());
        me
    }

    #[test]
    fn mission_overrides_class() {
        let mut world = SandboxWorld::default();
        let mut me = soldier(&mut world);
        me.mission = Mission::Snipe;
        let choice = desired_scenario_and_class_action(&me, &world, &Blackboard::default());
        assert_eq!(choice, Objective::Snipe);
    }

    #[test]
    fn carrier_delivers() {
        let mut world = SandboxWorld::default();
        world.mode = GameMode::CaptureTheFlag;
        let mut me = soldier(&mut world);
        me.carrying_flag = true;
        let choice = desired_scenario_and_class_action(&me, &world, &Blackboard::default());
        assert_eq!(choice, Objective::DeliverFlag);
    }

    #[test]
    fn available_flag_is_fetched() {
        let mut world = SandboxWorld::default();
        world.mode = GameMode::CaptureTheFlag;
        let me = soldier(&mut world);
        world.flags.insert(
            TeamId(0),
            FlagInfo {
                id: EntityId::new(),
                position: Location::new(900.0, 0.0, 0.0),
                state: FlagState::Home,
                capture_zone: Location::default(),
            },
        );
        let choice = desired_scenario_and_class_action(&me, &world, &Blackboard::default());
        assert_eq!(choice, Objective::FetchFlag);
    }

    #[test]
    fn defends_when_nothing_to_capture() {
        let mut world = SandboxWorld::default();
        world.mode = GameMode::ControlPoint;
        let me = soldier(&mut world);
        let owned = point(300.0, Some(TeamId(0)));
        world.control_points.push(owned);
        let choice = desired_scenario_and_class_action(&me, &world, &Blackboard::default());
        assert_eq!(choice, Objective::DefendPoint(owned));
    }

    #[test]
    fn engineer_skips_claimed_hint() {
        let mut world = SandboxWorld::default();
        world.mode = GameMode::ControlPoint;
        let mut me = soldier(&mut world);
        me.class = PlayerClass::Engineer;
        let claimed = Location::new(100.0, 0.0, 0.0);
        let free = Location::new(2000.0, 0.0, 0.0);
        world.sentry_hints.insert(TeamId(0), vec![claimed, free]);
        world.places.push(ffbot_core::sandbox::SandboxPlace {
            id: PlaceId(1),
            center: claimed,
            radius: 50.0,
        });
        let mut blackboard = Blackboard::default();
        blackboard.teammate_plans.insert(
            EntityId::new(),
            TeammatePlan {
                plan: Plan::BuildSentry,
                place: Some(PlaceId(1)),
            },
        );
        let choice = desired_scenario_and_class_action(&me, &world, &blackboard);
        assert_eq!(choice, Objective::BuildSentry(free));
    }

    #[test]
    fn squad_followers_escort_except_medics() {
        let mut world = SandboxWorld::default();
        let leader = soldier(&mut world);
        let mut me = soldier(&mut world);
        me.squad = Some(SquadInfo { leader: leader.id });

        let choice = desired_scenario_and_class_action(&me, &world, &Blackboard::default());
        assert_eq!(
            choice,
            Objective::Escort {
                leader: leader.id,
                inner: Box::new(Objective::SeekAndDestroy),
            }
        );

        me.class = PlayerClass::Medic;
        let choice = desired_scenario_and_class_action(&me, &world, &Blackboard::default());
        assert_eq!(choice, Objective::Heal);
    }

    #[test]
    fn minions_follow_the_boss() {
        let mut world = SandboxWorld::default();
        let mut boss = ActorSnapshot::new(EntityId::new(), TeamId(1), PlayerClass::HwGuy);
        boss.role = Some(NpcRole::Boss);
        world.add_actor(boss.clone());
        let mut minion = ActorSnapshot::new(EntityId::new(), TeamId(1), PlayerClass::Scout);
        minion.role = Some(NpcRole::Minion);
        world.add_actor(minion.clone());

        let choice = desired_scenario_and_class_action(&minion, &world, &Blackboard::default());
        assert!(matches!(choice, Objective::Escort { leader, .. } if leader == boss.id));
        let choice = desired_scenario_and_class_action(&boss, &world, &Blackboard::default());
        assert_eq!(choice, Objective::SeekAndDestroy);
    }

    #[test]
    fn mission_outranks_minion_role() {
        let mut world = SandboxWorld {
            mode: GameMode::ControlPoint,
            ..SandboxWorld::default()
        };
        let mut boss = ActorSnapshot::new(EntityId::new(), TeamId(1), PlayerClass::HwGuy);
        boss.role = Some(NpcRole::Boss);
        world.add_actor(boss);
        let mut minion = ActorSnapshot::new(EntityId::new(), TeamId(1), PlayerClass::Scout);
        minion.role = Some(NpcRole::Minion);
        minion.mission = Mission::Snipe;
        world.add_actor(minion.clone());

        let choice = desired_scenario_and_class_action(&minion, &world, &Blackboard::default());
        assert_eq!(choice, Objective::Snipe);

        world.mode = GameMode::Arena;
        let choice = desired_scenario_and_class_action(&minion, &world, &Blackboard::default());
        assert_eq!(choice, Objective::Snipe);
    }

    #[test]
    fn roles_only_matter_in_arena() {
        let mut world = SandboxWorld {
            mode: GameMode::ControlPoint,
            ..SandboxWorld::default()
        };
        let mut boss = ActorSnapshot::new(EntityId::new(), TeamId(1), PlayerClass::HwGuy);
        boss.role = Some(NpcRole::Boss);
        world.add_actor(boss);
        let mut minion = ActorSnapshot::new(EntityId::new(), TeamId(1), PlayerClass::Scout);
        minion.role = Some(NpcRole::Minion);
        world.add_actor(minion.clone());
        let open = point(500.0, None);
        world.control_points.push(open);

        let choice = desired_scenario_and_class_action(&minion, &world, &Blackboard::default());
        assert_eq!(choice, Objective::CapturePoint(open));
    }

    #[test]
    fn follow_request_wraps_unsquadded_bots() {
        let mut world = SandboxWorld {
            mode: GameMode::ControlPoint,
            ..SandboxWorld::default()
        };
        let leader = soldier(&mut world);
        let mut me = soldier(&mut world);
        let mut blackboard = Blackboard {
            follow_request: Some(leader.id),
            ..Blackboard::default()
        };

        let choice = desired_scenario_and_class_action(&me, &world, &blackboard);
        assert_eq!(
            choice,
            Objective::Escort {
                leader: leader.id,
                inner: Box::new(Objective::SeekAndDestroy),
            }
        );

        me.class = PlayerClass::Medic;
        assert_eq!(desired_scenario_and_class_action(&me, &world, &blackboard), Objective::Heal);

        me.class = PlayerClass::Soldier;
        if let Some(l) = world.actor_mut(leader.id) {
            l.alive = false;
        }
        assert_eq!(
            desired_scenario_and_class_action(&me, &world, &blackboard),
            Objective::SeekAndDestroy
        );

        blackboard.follow_request = Some(me.id);
        assert_eq!(
            desired_scenario_and_class_action(&me, &world, &blackboard),
            Objective::SeekAndDestroy
        );
    }

    #[test]
    fn defend_request_beats_capturing() {
        let mut world = SandboxWorld {
            mode: GameMode::ControlPoint,
            ..SandboxWorld::default()
        };
        let me = soldier(&mut world);
        let open = point(100.0, None);
        let mut held = point(3000.0, Some(TeamId(0)));
        held.place = Some(PlaceId(5));
        world.control_points.extend([open, held]);
        let mut blackboard = Blackboard::default();

        assert_eq!(
            desired_scenario_and_class_action(&me, &world, &blackboard),
            Objective::CapturePoint(open)
        );
        blackboard.defend_request = Some(PlaceId(5));
        assert_eq!(
            desired_scenario_and_class_action(&me, &world, &blackboard),
            Objective::DefendPoint(held)
        );
        blackboard.defend_request = Some(PlaceId(6));
        assert_eq!(
            desired_scenario_and_class_action(&me, &world, &blackboard),
            Objective::CapturePoint(open)
        );
    }

    // -----------------------------------------------------------------------
    // Flag overrides, driven through a stack
    // -----------------------------------------------------------------------

    struct Stage {
        me: EntityId,
        world: SandboxWorld,
        config: BotConfig,
        locals: Locals,
        stack: BehaviorStack,
    }

    impl Stage {
        fn ctf(class: PlayerClass) -> Self {
            let me = EntityId::new();
            let mut world = SandboxWorld {
                mode: GameMode::CaptureTheFlag,
                ..SandboxWorld::default()
            };
            world.add_actor(ActorSnapshot::new(me, TeamId(0), class));
            world.flags.insert(
                TeamId(0),
                FlagInfo {
                    id: EntityId::new(),
                    position: Location::new(700.0, 0.0, 0.0),
                    state: FlagState::Dropped { since: GameTime::ZERO },
                    capture_zone: Location::default(),
                },
            );
            Self {
                me,
                world,
                config: BotConfig::default(),
                locals: Locals::new(8),
                stack: BehaviorStack::new(Box::new(|| Box::new(ScenarioMonitor::new()))),
            }
        }

        fn tick(&mut self, now: f32) {
            let mut ctx = self.locals.context(self.me, GameTime(now), &self.world, &self.config);
            self.stack.update(&mut ctx, &[]);
        }

        fn set_flag(&mut self, state: FlagState) {
            if let Some(flag) = self.world.flags.get_mut(&TeamId(0)) {
                flag.state = state;
            }
        }

        fn callouts(&self) -> usize {
            self.locals
                .outbox
                .iter()
                .filter(|s| s.topic() == Topic::FlagLoose && s.has_meme())
                .count()
        }
    }

    #[test]
    fn carrier_is_pushed_into_delivery_once() {
        let mut stage = Stage::ctf(PlayerClass::Sniper);
        let me = stage.me;
        stage.set_flag(FlagState::Carried(me));
        if let Some(actor) = stage.world.actor_mut(me) {
            actor.carrying_flag = true;
        }

        stage.tick(0.0);
        stage.tick(0.1);
        stage.tick(0.2);
        assert_eq!(
            stage.stack.behavior_path(),
            vec!["ScenarioMonitor", "Snipe", "DeliverFlag"]
        );
    }

    #[test]
    fn loose_flag_waits_for_grace_and_loose_timer() {
        let mut stage = Stage::ctf(PlayerClass::Sniper);
        stage.tick(0.0);
        assert_eq!(stage.stack.top_behavior_name(), "Snipe");
        assert_eq!(stage.callouts(), 1);

        stage.tick(15.0);
        assert_eq!(stage.stack.top_behavior_name(), "Snipe");
        assert_eq!(stage.callouts(), 1);

        stage.tick(21.0);
        assert_eq!(stage.stack.top_behavior_name(), "FetchFlag");
    }

    #[test]
    fn teammate_callout_skips_the_grace_period() {
        let mut stage = Stage::ctf(PlayerClass::Sniper);
        stage.tick(0.0);
        stage.tick(5.0);
        assert_eq!(stage.stack.top_behavior_name(), "Snipe");

        stage.locals.blackboard.loose_flag = Some(Location::new(700.0, 0.0, 0.0));
        stage.tick(11.0);
        assert_eq!(stage.stack.top_behavior_name(), "FetchFlag");
    }

    #[test]
    fn healing_medic_leaves_the_flag_alone() {
        let mut stage = Stage::ctf(PlayerClass::Medic);
        stage.tick(0.0);
        assert_eq!(stage.stack.top_behavior_name(), "Heal");
        stage.tick(30.0);
        assert_eq!(stage.stack.top_behavior_name(), "Heal");
        assert!(!stage.stack.contains("FetchFlag"));
    }

    #[test]
    fn recovered_flag_forgets_the_report() {
        let mut stage = Stage::ctf(PlayerClass::Sniper);
        stage.tick(0.0);
        stage.locals.blackboard.loose_flag = Some(Location::new(700.0, 0.0, 0.0));
        stage.set_flag(FlagState::Home);
        stage.tick(1.0);
        assert!(stage.locals.blackboard.loose_flag.is_none());

        stage.set_flag(FlagState::Dropped { since: GameTime(1.5) });
        stage.tick(2.0);
        assert_eq!(stage.callouts(), 2);
    }
}
