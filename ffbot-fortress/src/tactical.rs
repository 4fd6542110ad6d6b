//! The tactical monitor: root of every bot's stack.
//!
//! It keeps the [`ScenarioMonitor`] suspended beneath it and, each tick,
//! checks a fixed list of objective-independent needs. The first need that
//! applies interrupts whatever is running; otherwise the objective carries on.
//!
//! Tiers, in priority order:
//!
//! 1. round decided: celebrate or flee
//! 2. forced debug jump
//! 3. pre-round blackboard cleanup
//! 4. item or ability use
//! 5. acknowledging a human during setup
//! 6. retreat (never in siege mode)
//! 7. reload retreat for barrage classes on hard and expert
//!
//! Tiers 6 and 7 share a cooldown.
//! 8. health or ammo pickup, unless hurried
//! 9. enemy sentry demolition
//! 10. teleporter use
//! 11. spy evasion
//! 12. squad leader waiting for formation

use ffbot_core::behavior::{
    ActionResult, Behavior, EventDesiredResult, Importance, QueryChain, StackView,
};
use ffbot_core::chatter::meme::NoiseHeard;
use ffbot_core::chatter::phrase::names;
use ffbot_core::chatter::statement::{Statement, Topic};
use ffbot_core::context::BotContext;
use ffbot_core::event::BotEvent;
use ffbot_core::timer::CountdownTimer;
use ffbot_core::types::{
    ActorSnapshot, Difficulty, EntityId, GameMode, Location, PlayerClass, RoundState,
};
use ffbot_core::world::{PickupKind, Teleporter};
use rand::Rng;
use tracing::{debug, info};

use crate::behaviors::{
    AcknowledgeHuman, BuildSentry, Celebrate, Despawn, DestroySentry, EvadeEnemies, FetchSupplies,
    FleeVictors, ForcedJump, RetreatToCover, Taunt, UseItem, UseTeleporter, WaitForFormation,
};
use crate::scenario::ScenarioMonitor;

/// Seconds between teleporter checks.
const TELEPORT_CHECK_INTERVAL: f32 = 1.0;
/// Seconds between relayed noise reports.
const NOISE_REPORT_INTERVAL: f32 = 5.0;

/// Outer long-lived behavior.
#[derive(Debug, Clone, Default)]
pub struct TacticalMonitor {
    retreat_cooldown: CountdownTimer,
    pickup_check: CountdownTimer,
    human_ack: CountdownTimer,
    teleport_check: CountdownTimer,
    noise_report: CountdownTimer,
    round_handled: bool,
    pre_round_cleaned: bool,
}

impl TacticalMonitor {
    /// A fresh monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pickup_jitter(ctx: &mut BotContext<'_>) -> f32 {
        let b = &ctx.config.behavior;
        let (lo, hi) = (
            b.pickup_check_min.min(b.pickup_check_max),
            b.pickup_check_min.max(b.pickup_check_max),
        );
        ctx.rng.gen_range(lo..=hi)
    }

    fn round_outcome(&mut self, me: &ActorSnapshot, round: RoundState) -> Option<EventDesiredResult> {
        let RoundState::Won(winner) = round else {
            self.round_handled = false;
            return None;
        };
        if self.round_handled {
            return Some(EventDesiredResult::TryContinue);
        }
        self.round_handled = true;
        if winner == me.team {
            Some(EventDesiredResult::critical(Celebrate::new(), "round won"))
        } else {
            Some(EventDesiredResult::critical(FleeVictors::new(), "round lost"))
        }
    }

    fn supplies_needed(ctx: &BotContext<'_>, me: &ActorSnapshot) -> Option<PickupKind> {
        let b = &ctx.config.behavior;
        let kind = if me.health_ratio() < b.health_ok_ratio {
            PickupKind::Health
        } else if me.ammo_ratio < b.ammo_low_ratio {
            PickupKind::Ammo
        } else {
            return None;
        };
        ctx.world.nearest_pickup(me.position, kind).map(|_| kind)
    }

    fn useful_teleporter(ctx: &BotContext<'_>, me: &ActorSnapshot) -> Option<Teleporter> {
        let limits = &ctx.config.behavior;
        let here = ctx.world.incursion_distance(me.team, me.position);
        ctx.world
            .teleporters(me.team)
            .into_iter()
            .filter(|t| t.ready && t.entrance.distance(&me.position) <= limits.teleporter_max_distance)
            .filter(|t| {
                ctx.world.incursion_distance(me.team, t.exit) - here >= limits.teleporter_min_gain
            })
            .min_by(|a, b| {
                a.entrance
                    .distance(&me.position)
                    .total_cmp(&b.entrance.distance(&me.position))
            })
    }

    /// "Heard something" when hurt by an enemy this bot cannot see.
    fn unseen_attacker_report(
        ctx: &BotContext<'_>,
        attacker: Option<EntityId>,
    ) -> Option<Statement> {
        let me = ctx.actor()?;
        let known = attacker.and_then(|id| {
            ctx.world
                .known_enemies(ctx.me)
                .into_iter()
                .find(|e| e.id == id)
        });
        if known.as_ref().is_some_and(|e| e.visible) {
            return None;
        }
        let position = known.map_or(me.position, |e| e.position);
        let report = Statement::new(ctx.me, Topic::Noise, ctx.now)
            .at_place(ctx.world.place_of(position))
            .phrase(names::NOISE)
            .with_meme(NoiseHeard { position });
        Some(report)
    }

    fn nearest_sentry_hint(ctx: &BotContext<'_>) -> Option<Location> {
        let me = ctx.actor()?;
        ctx.world.sentry_hints(me.team).into_iter().min_by(|a, b| {
            a.distance(&me.position).total_cmp(&b.distance(&me.position))
        })
    }
}

/// An advisory request, or `None` if the tip would veto it. A vetoed request
/// still ends the monitor pass.
fn offer(
    view: &StackView<'_>,
    child: impl Behavior + 'static,
    reason: &'static str,
) -> Option<EventDesiredResult> {
    view.would_accept(Importance::Try)
        .then(|| EventDesiredResult::try_suspend_for(child, reason))
}

impl Behavior for TacticalMonitor {
    fn name(&self) -> &'static str {
        "TacticalMonitor"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        self.pickup_check.start(ctx.now, Self::pickup_jitter(ctx));
        ActionResult::suspend_for(ScenarioMonitor::new(), "choose objective")
    }

    fn update(&mut self, _ctx: &mut BotContext<'_>) -> ActionResult {
        ActionResult::suspend_for(ScenarioMonitor::new(), "choose objective")
    }

    fn on_resume(&mut self, _ctx: &mut BotContext<'_>, _finished: &dyn Behavior) -> ActionResult {
        ActionResult::suspend_for(ScenarioMonitor::new(), "choose objective")
    }

    fn monitor(&mut self, ctx: &mut BotContext<'_>, view: &StackView<'_>) -> EventDesiredResult {
        let Some(me) = ctx.actor().filter(|a| a.alive) else {
            return EventDesiredResult::TryContinue;
        };
        let round = ctx.world.round_state();
        let config = ctx.config;
        let behavior = &config.behavior;

        if let Some(request) = self.round_outcome(&me, round) {
            return request;
        }

        if config.debug.force_jump && !view.above_contains("ForcedJump") {
            return EventDesiredResult::critical(ForcedJump, "debug force jump");
        }

        if round == RoundState::PreRound {
            if !self.pre_round_cleaned {
                self.pre_round_cleaned = true;
                ctx.blackboard.clear();
                debug!(bot = %ctx.me, "Pre-round cleanup");
            }
            return EventDesiredResult::TryContinue;
        }
        self.pre_round_cleaned = false;

        let in_combat = ctx.query().in_combat();
        let hurt = me.health_ratio() < behavior.health_ok_ratio;

        if me.has_usable_item && (in_combat || hurt) && !view.above_contains("UseItem") {
            if let Some(request) = offer(view, UseItem, "use item") {
                return request;
            }
        }

        if round == RoundState::Setup && self.human_ack.is_elapsed(ctx.now) {
            if let Some(human) = ctx.world.human_looking_at(ctx.me) {
                if let Some(request) = offer(view, AcknowledgeHuman::new(human), "human looking") {
                    self.human_ack.start(ctx.now, behavior.human_ack_cooldown);
                    return request;
                }
            }
        }

        // Both retreats share one cooldown, started only once the tip admits the request.
        let can_fall_back = !view.above_contains("RetreatToCover")
            && self.retreat_cooldown.is_elapsed(ctx.now)
            && view.would_accept(Importance::Important);

        if can_fall_back
            && ctx.world.mode() != GameMode::Siege
            && view.should_retreat(&ctx.query())
        {
            self.retreat_cooldown.start(ctx.now, behavior.retreat_cooldown);
            info!(bot = %ctx.me, health = me.health_ratio(), "Retreating");
            return EventDesiredResult::important(RetreatToCover::new(), "should retreat");
        }

        if can_fall_back
            && in_combat
            && me.primary_clip_empty
            && me.class.uses_barrage_weapon()
            && me.skill(config.general.difficulty) >= Difficulty::Hard
        {
            self.retreat_cooldown.start(ctx.now, behavior.retreat_cooldown);
            debug!(bot = %ctx.me, "Reloading in cover");
            return EventDesiredResult::important(RetreatToCover::reloading(), "reload in cover");
        }

        if self.pickup_check.is_elapsed(ctx.now) {
            let jitter = Self::pickup_jitter(ctx);
            self.pickup_check.start(ctx.now, jitter);
            if !view.should_hurry(&ctx.query()) && !view.above_contains("FetchSupplies") {
                if let Some(kind) = Self::supplies_needed(ctx, &me) {
                    if let Some(request) = offer(view, FetchSupplies::new(kind), "low supplies") {
                        return request;
                    }
                }
            }
        }

        if me.class.can_demolish_sentries() && !view.above_contains("DestroySentry") {
            let sentry = ctx
                .world
                .known_enemy_sentries(ctx.me)
                .into_iter()
                .filter(|s| !ctx.blackboard.destroyed_sentries.contains(&s.id))
                .min_by(|a, b| a.distance.total_cmp(&b.distance));
            if let Some(sentry) = sentry {
                if let Some(request) = offer(view, DestroySentry::new(sentry.id), "enemy sentry") {
                    return request;
                }
            }
        }

        if self.teleport_check.is_elapsed(ctx.now) {
            self.teleport_check.start(ctx.now, TELEPORT_CHECK_INTERVAL);
            if !view.above_contains("UseTeleporter") {
                if let Some(teleporter) = Self::useful_teleporter(ctx, &me) {
                    if let Some(request) = offer(view, UseTeleporter::new(teleporter), "teleporter") {
                        return request;
                    }
                }
            }
        }

        if me.class == PlayerClass::Spy && !view.above_contains("EvadeEnemies") {
            let q = ctx.query();
            let spotted = q.threats().into_iter().find(|e| {
                e.visible && e.distance <= behavior.spy_evade_range && !view.should_attack(&q, e)
            });
            if let Some(enemy) = spotted {
                if let Some(request) = offer(view, EvadeEnemies::new(enemy.id), "spy spotted") {
                    return request;
                }
            }
        }

        if me.is_squad_leader()
            && !in_combat
            && !view.above_contains("WaitForFormation")
            && ctx.world.squad_formation_error(ctx.me) > behavior.formation_tolerance
        {
            if let Some(request) = offer(view, WaitForFormation::new(), "squad straggling") {
                return request;
            }
        }

        EventDesiredResult::TryContinue
    }

    fn on_event(&mut self, ctx: &mut BotContext<'_>, event: &BotEvent) -> EventDesiredResult {
        match event {
            BotEvent::Command(command) => {
                match command.trim().to_ascii_lowercase().as_str() {
                    "despawn" => return EventDesiredResult::critical(Despawn, "despawn command"),
                    "taunt" => return EventDesiredResult::try_suspend_for(Taunt::new(), "taunt command"),
                    "build sentry" | "build_sentry" => {
                        if let Some(spot) = Self::nearest_sentry_hint(ctx) {
                            return EventDesiredResult::important(
                                BuildSentry::new(spot),
                                "build command",
                            );
                        }
                        debug!(bot = %ctx.me, "No sentry hint for build command");
                    }
                    other => debug!(bot = %ctx.me, command = other, "Unknown command"),
                }
                EventDesiredResult::TryContinue
            }
            BotEvent::Injured { attacker, .. } => {
                if self.noise_report.is_elapsed(ctx.now) {
                    if let Some(report) = Self::unseen_attacker_report(ctx, *attacker) {
                        self.noise_report.start(ctx.now, NOISE_REPORT_INTERVAL);
                        ctx.say(report);
                    }
                }
                EventDesiredResult::TryContinue
            }
            BotEvent::EntityDestroyed { entity } => {
                let known = ctx
                    .world
                    .known_enemy_sentries(ctx.me)
                    .iter()
                    .any(|s| s.id == *entity);
                if known && !ctx.blackboard.destroyed_sentries.contains(entity) {
                    ctx.blackboard.destroyed_sentries.push(*entity);
                }
                EventDesiredResult::TryContinue
            }
            _ => EventDesiredResult::TryContinue,
        }
    }

    fn interruptibility(&self) -> Importance {
        Importance::Try
    }
}

#[cfg(test)]
mod tests {
    use ffbot_core::behavior::BehaviorStack;
    use ffbot_core::config::BotConfig;
    use ffbot_core::context::Locals;
    use ffbot_core::sandbox::SandboxWorld;
    use ffbot_core::types::{GameTime, TeamId};
    use ffbot_core::world::KnownEntity;

    use super::*;

    struct Rig {
        me: EntityId,
        world: SandboxWorld,
        config: BotConfig,
        locals: Locals,
        stack: BehaviorStack,
    }

    impl Rig {
        fn new(class: PlayerClass) -> Self {
            let me = EntityId::new();
            let mut world = SandboxWorld::default();
            world.mode = GameMode::ControlPoint;
            world.add_actor(ActorSnapshot::new(me, TeamId(0), class));
            Self {
                me,
                world,
                config: BotConfig::default(),
                locals: Locals::new(3),
                stack: BehaviorStack::new(Box::new(|| Box::new(TacticalMonitor::new()))),
            }
        }

        fn tick(&mut self, now: f32, events: &[BotEvent]) {
            let mut ctx = self.locals.context(self.me, GameTime(now), &self.world, &self.config);
            self.stack.update(&mut ctx, events);
        }
    }

    #[test]
    fn root_sits_under_scenario() {
        let mut rig = Rig::new(PlayerClass::Soldier);
        rig.tick(0.0, &[]);
        let path = rig.stack.behavior_path();
        assert_eq!(&path[..2], &["TacticalMonitor", "ScenarioMonitor"]);
        assert_eq!(rig.stack.top_behavior_name(), "SeekAndDestroy");
    }

    #[test]
    fn winning_team_celebrates_once() {
        let mut rig = Rig::new(PlayerClass::Soldier);
        rig.tick(0.0, &[]);
        rig.world.round_state = RoundState::Won(TeamId(0));
        rig.tick(0.1, &[]);
        assert_eq!(rig.stack.top_behavior_name(), "Celebrate");
        rig.tick(10.0, &[]);
        assert!(!rig.stack.contains("Celebrate"));
        rig.tick(10.1, &[]);
        assert!(!rig.stack.contains("Celebrate"));
    }

    #[test]
    fn losing_team_flees() {
        let mut rig = Rig::new(PlayerClass::Soldier);
        rig.tick(0.0, &[]);
        rig.world.round_state = RoundState::Won(TeamId(1));
        rig.tick(0.1, &[]);
        assert_eq!(rig.stack.top_behavior_name(), "FleeVictors");
    }

    #[test]
    fn despawn_command_is_critical() {
        let mut rig = Rig::new(PlayerClass::Soldier);
        rig.tick(0.0, &[]);
        rig.tick(0.1, &[BotEvent::Command("despawn".to_owned())]);
        assert_eq!(rig.stack.top_behavior_name(), "Despawn");
        assert!(rig.locals.body.despawn);
    }

    #[test]
    fn siege_mode_never_retreats() {
        let mut rig = Rig::new(PlayerClass::Soldier);
        rig.world.mode = GameMode::Siege;
        if let Some(me) = rig.world.actor_mut(rig.me) {
            me.health = me.max_health * 0.1;
        }
        let me = rig.me;
        let _enemy = rig.world.set_visible_enemy(me, Location::new(300.0, 0.0, 0.0));
        rig.tick(0.0, &[]);
        rig.tick(0.1, &[]);
        assert!(!rig.stack.contains("RetreatToCover"));
    }

    #[test]
    fn empty_clip_without_cover_reloads_and_keeps_fighting() {
        let mut rig = Rig::new(PlayerClass::Soldier);
        if let Some(me) = rig.world.actor_mut(rig.me) {
            me.difficulty = Some(Difficulty::Hard);
            me.primary_clip_empty = true;
        }
        let me = rig.me;
        let enemy = rig.world.set_visible_enemy(me, Location::new(300.0, 0.0, 0.0));

        for step in 0..10u8 {
            rig.tick(f32::from(step) * 0.1, &[]);
        }
        assert!(rig.locals.body.reload);
        assert_eq!(rig.stack.top_behavior_name(), "Attack");
        assert_eq!(rig.locals.body.fire_at, Some(enemy));
    }

    #[test]
    fn configured_skill_applies_to_bots_without_their_own() {
        let mut rig = Rig::new(PlayerClass::Demoman);
        rig.world.cover = Some(Location::new(-500.0, 0.0, 0.0));
        if let Some(me) = rig.world.actor_mut(rig.me) {
            me.primary_clip_empty = true;
        }
        let me = rig.me;
        let _enemy = rig.world.set_visible_enemy(me, Location::new(300.0, 0.0, 0.0));

        rig.tick(0.0, &[]);
        rig.tick(0.1, &[]);
        assert!(!rig.stack.contains("RetreatToCover"));

        rig.config.general.difficulty = Difficulty::Expert;
        rig.tick(0.2, &[]);
        assert_eq!(rig.stack.top_behavior_name(), "RetreatToCover");
        assert_eq!(rig.stack.current_task(), Some("reloading in cover".to_owned()));
    }

    #[test]
    fn vetoed_retreat_does_not_burn_the_cooldown() {
        let mut rig = Rig::new(PlayerClass::Soldier);
        rig.world.cover = Some(Location::new(-500.0, 0.0, 0.0));
        let me = rig.me;
        let _enemy = rig.world.set_visible_enemy(me, Location::new(300.0, 0.0, 0.0));
        rig.tick(0.0, &[]);

        rig.world.round_state = RoundState::Won(TeamId(0));
        rig.tick(0.1, &[]);
        assert_eq!(rig.stack.top_behavior_name(), "Celebrate");

        rig.world.round_state = RoundState::Running;
        if let Some(actor) = rig.world.actor_mut(me) {
            actor.health = actor.max_health * 0.1;
        }
        rig.tick(0.2, &[]);
        assert_eq!(rig.stack.top_behavior_name(), "Celebrate");

        rig.tick(5.2, &[]);
        assert!(!rig.stack.contains("Celebrate"));
        rig.tick(5.3, &[]);
        assert_eq!(rig.stack.top_behavior_name(), "RetreatToCover");
    }

    #[test]
    fn unseen_attacker_is_reported_as_noise() {
        let mut rig = Rig::new(PlayerClass::Soldier);
        let hidden = EntityId::new();
        rig.world.enemies.insert(
            rig.me,
            vec![KnownEntity {
                id: hidden,
                position: Location::new(0.0, 700.0, 0.0),
                last_seen: GameTime::ZERO,
                visible: false,
                distance: 700.0,
            }],
        );
        let hit = BotEvent::Injured {
            attacker: Some(hidden),
            damage: 20.0,
        };
        rig.tick(0.0, &[]);
        rig.tick(0.1, &[hit.clone()]);
        rig.tick(0.2, &[hit]);

        let reports: Vec<_> = rig
            .locals
            .outbox
            .iter()
            .filter(|s| s.topic() == Topic::Noise)
            .collect();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].has_meme());
    }

    #[test]
    fn low_health_fetches_health_when_not_hurried() {
        let mut rig = Rig::new(PlayerClass::Scout);
        if let Some(me) = rig.world.actor_mut(rig.me) {
            me.health = me.max_health * 0.5;
        }
        rig.world
            .pickups
            .push((PickupKind::Health, Location::new(800.0, 0.0, 0.0)));
        rig.tick(0.0, &[]);
        rig.tick(1.0, &[]);
        assert_eq!(rig.stack.top_behavior_name(), "FetchSupplies");
    }

    #[test]
    fn destroyed_sentry_is_remembered() {
        let mut rig = Rig::new(PlayerClass::Soldier);
        let sentry = EntityId::new();
        rig.world.sentries.insert(
            rig.me,
            vec![KnownEntity {
                id: sentry,
                position: Location::new(5000.0, 0.0, 0.0),
                last_seen: GameTime::ZERO,
                visible: false,
                distance: 5000.0,
            }],
        );
        rig.tick(0.0, &[]);
        rig.tick(0.1, &[BotEvent::EntityDestroyed { entity: sentry }]);
        assert!(rig.locals.blackboard.destroyed_sentries.contains(&sentry));
    }
}
