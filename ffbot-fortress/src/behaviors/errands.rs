//! Short errands the tactical monitor interrupts into.

use ffbot_core::behavior::{ActionResult, Behavior, Importance, QueryAnswer};
use ffbot_core::chatter::meme::FollowRequest;
use ffbot_core::chatter::phrase::names;
use ffbot_core::chatter::statement::{Condition, Statement, Topic};
use ffbot_core::context::{BotContext, QueryContext};
use ffbot_core::timer::CountdownTimer;
use ffbot_core::types::{EntityId, Location};
use ffbot_core::world::{KnownEntity, Teleporter};

use super::path::{ARRIVE_DISTANCE, PathFollower, PathStatus};

const CELEBRATE_TIME: f32 = 5.0;
const FLEE_DISTANCE: f32 = 1500.0;
const ACKNOWLEDGE_TIME: f32 = 1.5;
const TAUNT_TIME: f32 = 2.0;
const FORMATION_TIMEOUT: f32 = 5.0;

// ---------------------------------------------------------------------------
// Round outcome
// ---------------------------------------------------------------------------

/// Taunt after the team won the round.
#[derive(Debug, Clone, Default)]
pub struct Celebrate {
    until: CountdownTimer,
}

impl Celebrate {
    /// A fresh celebration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for Celebrate {
    fn name(&self) -> &'static str {
        "Celebrate"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        self.until.start(ctx.now, CELEBRATE_TIME);
        ctx.say(Statement::new(ctx.me, Topic::Celebrate, ctx.now).phrase("celebrate"));
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        if self.until.is_elapsed(ctx.now) {
            return ActionResult::done("celebrated");
        }
        ctx.body.taunt = true;
        ActionResult::Continue
    }

    fn interruptibility(&self) -> Importance {
        Importance::Critical
    }
}

/// Run from the winning team after a lost round.
#[derive(Debug, Clone, Default)]
pub struct FleeVictors {
    path: PathFollower,
}

impl FleeVictors {
    /// A fresh flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for FleeVictors {
    fn name(&self) -> &'static str {
        "FleeVictors"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::Continue;
        };
        let threats: Vec<Location> = ctx
            .world
            .known_enemies(ctx.me)
            .iter()
            .map(|e| e.position)
            .collect();
        let goal = ctx.world.find_cover(me.position, &threats).or_else(|| {
            threats
                .first()
                .map(|t| me.position.away_from(t, FLEE_DISTANCE))
        });
        if let Some(goal) = goal {
            self.path.set_goal(goal);
        }
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        match self.path.update(ctx, ARRIVE_DISTANCE) {
            PathStatus::Moving => ActionResult::Continue,
            PathStatus::Arrived => {
                ctx.body.crouch = true;
                ActionResult::Continue
            }
            PathStatus::Failed => ActionResult::done("nowhere to flee"),
        }
    }

    fn interruptibility(&self) -> Importance {
        Importance::Critical
    }

    fn should_attack(&self, _q: &QueryContext<'_>, _threat: &KnownEntity) -> QueryAnswer {
        QueryAnswer::No
    }
}

// ---------------------------------------------------------------------------
// Debug and commands
// ---------------------------------------------------------------------------

/// Jump every tick while the debug toggle is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForcedJump;

impl Behavior for ForcedJump {
    fn name(&self) -> &'static str {
        "ForcedJump"
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        if !ctx.config.debug.force_jump {
            return ActionResult::done("debug toggle cleared");
        }
        ctx.body.jump = true;
        ActionResult::Continue
    }

    fn interruptibility(&self) -> Importance {
        Importance::Critical
    }
}

/// Play a taunt.
#[derive(Debug, Clone, Default)]
pub struct Taunt {
    until: CountdownTimer,
}

impl Taunt {
    /// A fresh taunt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for Taunt {
    fn name(&self) -> &'static str {
        "Taunt"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        self.until.start(ctx.now, TAUNT_TIME);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        if self.until.is_elapsed(ctx.now) {
            return ActionResult::done("taunted");
        }
        ctx.body.taunt = true;
        ActionResult::Continue
    }
}

/// Leave the game. Never ends; the host removes the bot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Despawn;

impl Behavior for Despawn {
    fn name(&self) -> &'static str {
        "Despawn"
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        ctx.body.despawn = true;
        ActionResult::Continue
    }

    fn interruptibility(&self) -> Importance {
        Importance::Critical
    }

    fn task(&self) -> Option<String> {
        Some("despawning".to_owned())
    }
}

// ---------------------------------------------------------------------------
// Opportunistic
// ---------------------------------------------------------------------------

/// Activate the carried item or ability once.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseItem;

impl Behavior for UseItem {
    fn name(&self) -> &'static str {
        "UseItem"
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        ctx.body.use_item = true;
        ActionResult::done("item used")
    }
}

/// Look at a human who is looking at us during setup.
#[derive(Debug, Clone)]
pub struct AcknowledgeHuman {
    human: EntityId,
    until: CountdownTimer,
}

impl AcknowledgeHuman {
    /// Acknowledge `human`.
    #[must_use]
    pub fn new(human: EntityId) -> Self {
        Self {
            human,
            until: CountdownTimer::new(),
        }
    }
}

impl Behavior for AcknowledgeHuman {
    fn name(&self) -> &'static str {
        "AcknowledgeHuman"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        self.until.start(ctx.now, ACKNOWLEDGE_TIME);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let Some(human) = ctx.world.actor(self.human) else {
            return ActionResult::done("human left");
        };
        if self.until.is_elapsed(ctx.now) {
            return ActionResult::done("acknowledged");
        }
        ctx.body.look_at = Some(human.position);
        ActionResult::Continue
    }
}

/// Walk into a friendly teleporter entrance.
#[derive(Debug, Clone)]
pub struct UseTeleporter {
    teleporter: Teleporter,
    path: PathFollower,
}

impl UseTeleporter {
    /// Use `teleporter`.
    #[must_use]
    pub fn new(teleporter: Teleporter) -> Self {
        Self {
            teleporter,
            path: PathFollower::new(),
        }
    }
}

impl Behavior for UseTeleporter {
    fn name(&self) -> &'static str {
        "UseTeleporter"
    }

    fn on_start(&mut self, _ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        self.path.set_goal(self.teleporter.entrance);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let Some(me) = ctx.actor() else {
            return ActionResult::done("no body");
        };
        let still_there = ctx
            .world
            .teleporters(me.team)
            .iter()
            .any(|t| t.id == self.teleporter.id && t.ready);
        if !still_there {
            return ActionResult::done("teleporter unavailable");
        }
        if me.position.distance(&self.teleporter.exit) <= ARRIVE_DISTANCE {
            return ActionResult::done("teleported");
        }
        match self.path.update(ctx, ARRIVE_DISTANCE) {
            PathStatus::Moving => ActionResult::Continue,
            PathStatus::Arrived => {
                ctx.body.move_to = Some(self.teleporter.entrance);
                ActionResult::Continue
            }
            PathStatus::Failed => ActionResult::done("entrance unreachable"),
        }
    }
}

// ---------------------------------------------------------------------------
// Squad
// ---------------------------------------------------------------------------

/// Squad leader holds position until the squad catches up.
#[derive(Debug, Clone, Default)]
pub struct WaitForFormation {
    timeout: CountdownTimer,
}

impl WaitForFormation {
    /// A fresh wait.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Behavior for WaitForFormation {
    fn name(&self) -> &'static str {
        "WaitForFormation"
    }

    fn on_start(&mut self, ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        self.timeout.start(ctx.now, FORMATION_TIMEOUT);
        let rally = Statement::new(ctx.me, Topic::FollowMe, ctx.now)
            .phrase(names::FOLLOW_ME)
            .when(Condition::NotInCombat)
            .with_meme(FollowRequest);
        ctx.say(rally);
        ActionResult::Continue
    }

    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult {
        let error = ctx.world.squad_formation_error(ctx.me);
        if error <= ctx.config.behavior.formation_tolerance {
            return ActionResult::done("squad in formation");
        }
        if self.timeout.is_elapsed(ctx.now) {
            return ActionResult::done("gave up waiting");
        }
        if ctx.query().in_combat() {
            return ActionResult::done("under fire");
        }
        ActionResult::Continue
    }

    fn task(&self) -> Option<String> {
        Some("waiting for squad".to_owned())
    }
}

#[cfg(test)]
mod tests {
    use ffbot_core::config::BotConfig;
    use ffbot_core::context::Locals;
    use ffbot_core::sandbox::SandboxWorld;
    use ffbot_core::types::{ActorSnapshot, GameTime, PlayerClass, TeamId};

    use super::*;

    fn world_with(me: EntityId) -> SandboxWorld {
        let mut world = SandboxWorld::default();
        world.add_actor(ActorSnapshot::new(me, TeamId(0), PlayerClass::Engineer));
        world
    }

    #[test]
    fn celebration_runs_out() {
        let me = EntityId::new();
        let world = world_with(me);
        let config = BotConfig::default();
        let mut locals = Locals::new(5);
        let mut celebrate = Celebrate::new();

        let mut ctx = locals.context(me, GameTime(0.0), &world, &config);
        assert!(celebrate.on_start(&mut ctx, None).is_continue());
        assert!(celebrate.update(&mut ctx).is_continue());
        assert!(ctx.body.taunt);

        let mut ctx = locals.context(me, GameTime(6.0), &world, &config);
        assert!(matches!(celebrate.update(&mut ctx), ActionResult::Done(_)));
    }

    #[test]
    fn formation_wait_ends_once_squad_is_close() {
        let me = EntityId::new();
        let mut world = world_with(me);
        world.formation_error.insert(me, 0.9);
        let config = BotConfig::default();
        let mut locals = Locals::new(5);
        let mut wait = WaitForFormation::new();

        let mut ctx = locals.context(me, GameTime(0.0), &world, &config);
        assert!(wait.on_start(&mut ctx, None).is_continue());
        assert!(wait.update(&mut ctx).is_continue());
        assert_eq!(ctx.outbox.len(), 1);
        assert_eq!(ctx.outbox[0].topic(), Topic::FollowMe);
        assert!(ctx.outbox[0].has_meme());

        world.formation_error.insert(me, 0.1);
        let mut ctx = locals.context(me, GameTime(1.0), &world, &config);
        assert!(matches!(wait.update(&mut ctx), ActionResult::Done(_)));
    }

    #[test]
    fn forced_jump_follows_toggle() {
        let me = EntityId::new();
        let world = world_with(me);
        let mut config = BotConfig::default();
        config.debug.force_jump = true;
        let mut locals = Locals::new(5);

        let mut ctx = locals.context(me, GameTime(0.0), &world, &config);
        assert!(ForcedJump.update(&mut ctx).is_continue());
        assert!(ctx.body.jump);
    }
}
