//! Fighting, falling back and topping off.

use ffbot_core::behavior::query::defaults;
use ffbot_core::behavior::{ActionResult, Behavior, EventDesiredResult, Importance, QueryAnswer};
use ffbot_core::chatter::meme::SniperWarning;
use ffbot_core::chatter::phrase::names;
use ffbot_core::chatter::statement::{Condition, ContextPart, Statement, Topic};
use ffbot_core::context::{BotContext, COMBAT_MEMORY, QueryContext};
use ffbot_core::event::BotEvent;
use ffbot_core::timer::CountdownTimer;
use ffbot_core::types::{EntityId, Location, PlayerClass};
use ffbot_core::world::{KnownEntity, PickupKind};

use super::path::{ARRIVE_DISTANCE, PathFollower, PathStatus};

/// Seconds a bot stays in cover before reconsidering.
const COVER_HOLD: f32 = 2.0;
/// Range at which sentries are shot at.
const SENTRY_ENGAGE_RANGE: f32 = 600.0;
/// Longest an evasion lasts.
const EVADE_TIME: f32 = 1.5;

fn find_threat(ctx: &BotContext<'_>, id: EntityId) -> Option<KnownEntity> {
    ctx.world.known_enemies(ctx.me).into_iter().find(|e| e.id == id)
}

/// "Sniper over there", if `target` is a sniper standing in a known place.
fn sniper_warning(ctx: &BotContext<'_>, target: EntityId) -> Option<Statement> {
    let sniper = ctx
        .world
        .actor(target)
        .filter(|a| a.alive && a.class == PlayerClass::Sniper)?;
    let place = sniper.place.or_else(|| ctx.world.place_of(sniper.position))?;
    let warning = Statement::new(ctx.me, Topic::SniperWarning, ctx.now)
        .at_place(Some(place))
        .phrase(names::SNIPER_WARNING)
        .important()
        .with_meme(SniperWarning { place });
    Some(warning)
}

// ---------------------------------------------------------------------------
// Attack
// ---------------------------------------------------------------------------

/// Engage one enemy until it dies or is lost.
#[derive(Debug, Clone)]
pub struct Attack {
    target: EntityId,
    last_known: Option<Location>,
    shots: u32,
    chase: PathFollower,
}

impl Attack {
    /// Attack `target`.
    #[must_use]
    pub fn new(target: EntityId) -> Self {
        Self {
            target,
            last_known: None,
            shots: 0,
            chase: PathFollower::new(),
        }
    }

    /// The enemy being engaged.
    #[must_use]
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Ticks spent firing at the target.
    #[must_use]
    pub fn shots_fired(&self) -> u32 {
        self.shots
    }

    /// Where the target was last seen.
    #[must_use]
    pub fn last_known(&self) -> Option<Location> {
        self.last_known
    }
}

impl Behavior for Attack {
    fn name(&self) -> &'static str {
        "Attack"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        let callout = Statement::new(ctx.me, Topic::EnemySpotted, ctx.now)
            .about(self.target)
            .context(ContextPart::EnemyCount)
            .when(Condition::InCombat);
        ctx.say(callout);
        if let Some(warning) = sniper_warning(ctx, self.target) {
            ctx.say(warning);
        }
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let Some(threat) = find_threat(ctx, self.target) else {
            return ActionResult::done("target unknown");
        };
        if ctx.world.actor(self.target).is_some_and(|a| !a.alive) {
            return ActionResult::done("target dead");
        }
        if !threat.visible && ctx.now.since(threat.last_seen) > COMBAT_MEMORY {
            return ActionResult::done("lost track of target");
        }

        self.last_known = Some(threat.position);
        ctx.body.look_at = Some(threat.position);
        if threat.visible && ctx.world.is_line_of_sight_clear(ctx.me, self.target) {
            ctx.body.fire_at = Some(self.target);
            self.shots += 1;
            self.chase.clear();
            return ActionResult::Continue;
        }

        self.chase.set_goal(threat.position);
        if self.chase.update(ctx, ARRIVE_DISTANCE) == PathStatus::Failed {
            return ActionResult::done("cannot reach target");
        }
        ActionResult::Continue
    }

    fn on_event(&mut self, ctx: &mut BotContext<'_>, event: &BotEvent) -> EventDesiredResult {
        let BotEvent::Injured {
            attacker: Some(attacker),
            ..
        } = *event
        else {
            return EventDesiredResult::TryContinue;
        };
        if attacker == self.target {
            return EventDesiredResult::TryContinue;
        }
        let (Some(new), Some(current)) = (find_threat(ctx, attacker), find_threat(ctx, self.target))
        else {
            return EventDesiredResult::TryContinue;
        };
        if defaults::select_more_dangerous_threat(&ctx.query(), &new, &current) == attacker {
            EventDesiredResult::try_suspend_for(Attack::new(attacker), "retaliating")
        } else {
            EventDesiredResult::TryContinue
        }
    }

    fn task(&self) -> Option<String> {
        Some(format!("attacking {} ({} shots)", self.target, self.shots))
    }

    fn should_attack(&self, _q: &QueryContext<'_>, threat: &KnownEntity) -> QueryAnswer {
        if threat.id == self.target {
            QueryAnswer::Yes
        } else {
            QueryAnswer::DontCare
        }
    }
}

// ---------------------------------------------------------------------------
// RetreatToCover
// ---------------------------------------------------------------------------

/// Fall back to cover away from known threats.
#[derive(Debug, Clone, Default)]
pub struct RetreatToCover {
    cover: Option<Location>,
    path: PathFollower,
    hold: CountdownTimer,
    reloading: bool,
}

impl RetreatToCover {
    /// Retreat because of low health.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retreat to reload an empty primary weapon.
    #[must_use]
    pub fn reloading() -> Self {
        Self {
            reloading: true,
            ..Self::default()
        }
    }

    /// Chosen cover spot, if any.
    #[must_use]
    pub fn cover(&self) -> Option<Location> {
        self.cover
    }
}

impl Behavior for RetreatToCover {
    fn name(&self) -> &'static str {
        "RetreatToCover"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::Continue;
        };
        let threats: Vec<Location> = ctx.query().threats().iter().map(|t| t.position).collect();
        self.cover = ctx.world.find_cover(me.position, &threats);
        if let Some(cover) = self.cover {
            self.path.set_goal(cover);
            ctx.say(Statement::new(ctx.me, Topic::Retreating, ctx.now).phrase("retreating"));
        }
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        if self.reloading {
            ctx.body.reload = true;
        }
        if self.cover.is_none() {
            return ActionResult::done("no cover found");
        }
        match self.path.update(ctx, ARRIVE_DISTANCE) {
            PathStatus::Failed => ActionResult::done("no path to cover"),
            PathStatus::Moving => ActionResult::Continue,
            PathStatus::Arrived => {
                ctx.body.crouch = true;
                if !self.hold.has_started() {
                    self.hold.start(ctx.now, COVER_HOLD);
                }
                let recovered = if self.reloading {
                    ctx.actor().is_none_or(|a| !a.primary_clip_empty)
                } else {
                    !ctx.query().in_combat()
                };
                if recovered || self.hold.is_elapsed(ctx.now) {
                    ActionResult::done("recovered in cover")
                } else {
                    ActionResult::Continue
                }
            }
        }
    }

    fn interruptibility(&self) -> Importance {
        Importance::Important
    }

    fn task(&self) -> Option<String> {
        let task = if self.reloading { "reloading in cover" } else { "retreating" };
        Some(task.to_owned())
    }

    fn should_hurry(&self, _q: &QueryContext<'_>) -> QueryAnswer {
        QueryAnswer::Yes
    }
}

// ---------------------------------------------------------------------------
// FetchSupplies
// ---------------------------------------------------------------------------

/// Walk to the nearest health or ammo pickup.
#[derive(Debug, Clone)]
pub struct FetchSupplies {
    kind: PickupKind,
    target: Option<Location>,
    path: PathFollower,
}

impl FetchSupplies {
    /// Fetch a pickup of `kind`.
    #[must_use]
    pub fn new(kind: PickupKind) -> Self {
        Self {
            kind,
            target: None,
            path: PathFollower::new(),
        }
    }

    fn topped_off(&self, ctx: &BotContext<'_>) -> bool {
        let Some(me) = ctx.actor() else {
            return true;
        };
        match self.kind {
            PickupKind::Health => me.health_ratio() >= ctx.config.behavior.health_ok_ratio,
            PickupKind::Ammo => me.ammo_ratio >= 1.0,
        }
    }
}

impl Behavior for FetchSupplies {
    fn name(&self) -> &'static str {
        "FetchSupplies"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        self.target = ctx
            .actor()
            .and_then(|me| ctx.world.nearest_pickup(me.position, self.kind));
        if let Some(target) = self.target {
            self.path.set_goal(target);
        }
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        if self.target.is_none() {
            return ActionResult::done("no pickup known");
        }
        if self.topped_off(ctx) {
            return ActionResult::done("topped off");
        }
        match self.path.update(ctx, ARRIVE_DISTANCE) {
            PathStatus::Moving => ActionResult::Continue,
            PathStatus::Arrived => ActionResult::done("reached pickup"),
            PathStatus::Failed => ActionResult::done("pickup unreachable"),
        }
    }

    fn task(&self) -> Option<String> {
        Some(match self.kind {
            PickupKind::Health => "fetching health".to_owned(),
            PickupKind::Ammo => "fetching ammo".to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// EvadeEnemies
// ---------------------------------------------------------------------------

/// Sidestep away from an enemy that is too close (spies keep their cover).
#[derive(Debug, Clone)]
pub struct EvadeEnemies {
    from: EntityId,
    path: PathFollower,
    until: CountdownTimer,
}

impl EvadeEnemies {
    /// Evade `from`.
    #[must_use]
    pub fn new(from: EntityId) -> Self {
        Self {
            from,
            path: PathFollower::new(),
            until: CountdownTimer::new(),
        }
    }
}

impl Behavior for EvadeEnemies {
    fn name(&self) -> &'static str {
        "EvadeEnemies"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        self.until.start(ctx.now, EVADE_TIME);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let range = ctx.config.behavior.spy_evade_range;
        let (Some(me), Some(threat)) = (ctx.actor(), find_threat(ctx, self.from)) else {
            return ActionResult::done("threat gone");
        };
        if threat.distance > range || self.until.is_elapsed(ctx.now) {
            return ActionResult::done("clear");
        }
        self.path.set_goal(me.position.away_from(&threat.position, range));
        if self.path.update(ctx, ARRIVE_DISTANCE) == PathStatus::Failed {
            return ActionResult::done("nowhere to go");
        }
        ActionResult::Continue
    }

    fn should_attack(&self, _q: &QueryContext<'_>, _threat: &KnownEntity) -> QueryAnswer {
        QueryAnswer::No
    }
}

// ---------------------------------------------------------------------------
// DestroySentry
// ---------------------------------------------------------------------------

/// Hunt down a known enemy sentry.
#[derive(Debug, Clone)]
pub struct DestroySentry {
    sentry: EntityId,
    destroyed: bool,
    path: PathFollower,
}

impl DestroySentry {
    /// Destroy `sentry`.
    #[must_use]
    pub fn new(sentry: EntityId) -> Self {
        Self {
            sentry,
            destroyed: false,
            path: PathFollower::new(),
        }
    }
}

impl Behavior for DestroySentry {
    fn name(&self) -> &'static str {
        "DestroySentry"
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        if self.destroyed || ctx.blackboard.destroyed_sentries.contains(&self.sentry) {
            return ActionResult::done("sentry destroyed");
        }
        let Some(sentry) = ctx
            .world
            .known_enemy_sentries(ctx.me)
            .into_iter()
            .find(|s| s.id == self.sentry)
        else {
            return ActionResult::done("sentry unknown");
        };

        ctx.body.look_at = Some(sentry.position);
        if sentry.distance <= SENTRY_ENGAGE_RANGE && sentry.visible {
            ctx.body.fire_at = Some(self.sentry);
            return ActionResult::Continue;
        }
        self.path.set_goal(sentry.position);
        match self.path.update(ctx, SENTRY_ENGAGE_RANGE) {
            PathStatus::Failed => ActionResult::done("sentry unreachable"),
            PathStatus::Moving | PathStatus::Arrived => ActionResult::Continue,
        }
    }

    fn on_event(&mut self, ctx: &mut BotContext<'_>, event: &BotEvent) -> EventDesiredResult {
        if let BotEvent::EntityDestroyed { entity } = *event {
            if entity == self.sentry {
                self.destroyed = true;
                if !ctx.blackboard.destroyed_sentries.contains(&entity) {
                    ctx.blackboard.destroyed_sentries.push(entity);
                }
            }
        }
        EventDesiredResult::TryContinue
    }

    fn task(&self) -> Option<String> {
        Some(format!("destroying sentry {}", self.sentry))
    }
}

#[cfg(test)]
mod tests {
    use ffbot_core::config::BotConfig;
    use ffbot_core::context::Locals;
    use ffbot_core::sandbox::SandboxWorld;
    use ffbot_core::types::{ActorSnapshot, GameTime, PlaceId, TeamId};

    use super::*;

    struct Scene {
        me: EntityId,
        world: SandboxWorld,
        config: BotConfig,
        locals: Locals,
    }

    impl Scene {
        fn new() -> Self {
            let me = EntityId::new();
            let mut world = SandboxWorld::default();
            world.add_actor(ActorSnapshot::new(me, TeamId(0), PlayerClass::Soldier));
            Self {
                me,
                world,
                config: BotConfig::default(),
                locals: Locals::new(3),
            }
        }

        fn ctx(&mut self, now: f32) -> BotContext<'_> {
            self.locals
                .context(self.me, GameTime(now), &self.world, &self.config)
        }
    }

    #[test]
    fn attack_fires_at_visible_target_and_quits_when_it_dies() {
        let mut scene = Scene::new();
        let enemy = scene.world.set_visible_enemy(scene.me, Location::new(200.0, 0.0, 0.0));
        let mut attack = Attack::new(enemy);

        let mut ctx = scene.ctx(0.0);
        assert!(attack.update(&mut ctx).is_continue());
        assert_eq!(ctx.body.fire_at, Some(enemy));
        assert_eq!(attack.shots_fired(), 1);

        scene.world.clear_enemies(scene.me);
        let mut ctx = scene.ctx(0.1);
        assert!(matches!(attack.update(&mut ctx), ActionResult::Done(_)));
    }

    #[test]
    fn retreat_without_cover_ends_on_first_update() {
        let mut scene = Scene::new();
        let mut retreat = RetreatToCover::new();
        let mut ctx = scene.ctx(0.0);
        assert!(retreat.on_start(&mut ctx, None).is_continue());
        assert!(matches!(retreat.update(&mut ctx), ActionResult::Done(_)));
    }

    #[test]
    fn reload_retreat_reloads_even_without_cover() {
        let mut scene = Scene::new();
        let mut retreat = RetreatToCover::reloading();
        let mut ctx = scene.ctx(0.0);
        assert!(retreat.on_start(&mut ctx, None).is_continue());
        assert!(matches!(retreat.update(&mut ctx), ActionResult::Done(_)));
        assert!(ctx.body.reload);
    }

    #[test]
    fn engaging_a_sniper_warns_the_team() {
        let mut scene = Scene::new();
        let enemy = scene.world.set_visible_enemy(scene.me, Location::new(900.0, 0.0, 0.0));
        let mut sniper = ActorSnapshot::new(enemy, TeamId(1), PlayerClass::Sniper);
        sniper.place = Some(PlaceId(7));
        scene.world.add_actor(sniper);
        let mut attack = Attack::new(enemy);

        let mut ctx = scene.ctx(0.0);
        assert!(attack.on_start(&mut ctx, None).is_continue());
        let warning = ctx
            .outbox
            .iter()
            .find(|s| s.topic() == Topic::SniperWarning)
            .expect("sniper callout");
        assert_eq!(warning.place(), Some(PlaceId(7)));
        assert!(warning.has_meme());
    }

    #[test]
    fn engaging_anyone_else_stays_quiet_about_snipers() {
        let mut scene = Scene::new();
        let enemy = scene.world.set_visible_enemy(scene.me, Location::new(200.0, 0.0, 0.0));
        scene
            .world
            .add_actor(ActorSnapshot::new(enemy, TeamId(1), PlayerClass::Pyro));
        let mut attack = Attack::new(enemy);

        let mut ctx = scene.ctx(0.0);
        assert!(attack.on_start(&mut ctx, None).is_continue());
        assert!(ctx.outbox.iter().all(|s| s.topic() != Topic::SniperWarning));
    }

    #[test]
    fn retreat_heads_for_cover() {
        let mut scene = Scene::new();
        let cover = Location::new(-400.0, 0.0, 0.0);
        scene.world.cover = Some(cover);
        let mut retreat = RetreatToCover::new();
        let mut ctx = scene.ctx(0.0);
        assert!(retreat.on_start(&mut ctx, None).is_continue());
        assert!(retreat.update(&mut ctx).is_continue());
        assert_eq!(ctx.body.move_to, Some(cover));
        assert_eq!(ctx.outbox.len(), 1);
    }

    #[test]
    fn sentry_destroyed_event_ends_errand() {
        let mut scene = Scene::new();
        let sentry = EntityId::new();
        let mut errand = DestroySentry::new(sentry);
        let mut ctx = scene.ctx(0.0);
        errand.on_event(&mut ctx, &BotEvent::EntityDestroyed { entity: sentry });
        assert!(ctx.blackboard.destroyed_sentries.contains(&sentry));
        assert!(matches!(errand.update(&mut ctx), ActionResult::Done(_)));
    }
}
