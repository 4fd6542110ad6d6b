//! A bot: one behavior stack, one statement queue and the state both share.

use chrono::Utc;
use ffbot_core::behavior::{BehaviorStack, QueryChain, TickReport};
use ffbot_core::blackboard::Blackboard;
use ffbot_core::body::BodyCommands;
use ffbot_core::chatter::arbitrator::{ChatterState, Chatterer};
use ffbot_core::chatter::queue::{EnqueueGate, StatementQueue};
use ffbot_core::config::{BotConfig, ChatterConfig};
use ffbot_core::context::{Locals, QueryContext};
use ffbot_core::event::BotEvent;
use ffbot_core::types::{EntityId, GameTime};
use ffbot_core::world::World;
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::hooks::{HookError, parse_event};
use crate::snapshot::{BotSnapshot, StatementSummary};
use crate::tactical::TacticalMonitor;

/// One computer-controlled player.
///
/// Events are buffered by [`Bot::on_event`] and delivered on the next
/// [`Bot::update`], before the tip runs. Statements produced by behaviors
/// are admitted to the queue at the end of the same update.
#[derive(Debug)]
pub struct Bot {
    id: EntityId,
    name: String,
    stack: BehaviorStack,
    queue: StatementQueue,
    locals: Locals,
    pending: Vec<BotEvent>,
    dead: bool,
    needs_reset: bool,
}

impl Bot {
    /// A bot whose random stream starts from `seed`.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>, seed: u64) -> Self {
        Self {
            id,
            name: name.into(),
            stack: BehaviorStack::new(Box::new(|| Box::new(TacticalMonitor::new()))),
            queue: StatementQueue::new(),
            locals: Locals::new(seed),
            pending: Vec::new(),
            dead: false,
            needs_reset: false,
        }
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // -----------------------------------------------------------------------
    // Host entry points
    // -----------------------------------------------------------------------

    /// Buffer an event for the next update.
    pub fn on_event(&mut self, event: BotEvent) {
        self.pending.push(event);
    }

    /// Buffer a named host event.
    ///
    /// # Errors
    /// Returns a [`HookError`] if the name or payload is not recognized; the
    /// event is then dropped.
    pub fn on_named_event(&mut self, name: &str, payload: &Value) -> Result<(), HookError> {
        let event = parse_event(name, payload)?;
        self.on_event(event);
        Ok(())
    }

    /// Run one tick: deliver buffered events, advance the behavior stack and
    /// queue whatever the behaviors said.
    pub fn update(&mut self, world: &dyn World, config: &BotConfig, now: GameTime) -> TickReport {
        self.locals.body.clear();

        let mut batch = Vec::with_capacity(self.pending.len());
        for event in self.pending.drain(..) {
            match event {
                BotEvent::Killed { by } => {
                    batch.clear();
                    self.queue.clear();
                    self.locals.outbox.clear();
                    self.locals.blackboard.clear();
                    self.dead = true;
                    self.needs_reset = true;
                    info!(bot = %self.id, killer = ?by, "Bot killed");
                }
                BotEvent::Spawned => {
                    batch.clear();
                    self.needs_reset = true;
                    debug!(bot = %self.id, "Bot spawned");
                }
                other => batch.push(other),
            }
        }

        let alive = world.actor(self.id).is_some_and(|a| a.alive);
        if !config.general.enabled || !alive {
            return TickReport::default();
        }
        self.dead = false;

        let mut ctx = self.locals.context(self.id, now, world, config);
        if self.needs_reset {
            self.needs_reset = false;
            self.stack.reset(&mut ctx);
        }
        let report = self.stack.update(&mut ctx, &batch);
        self.flush_outbox(&config.chatter, alive);
        report
    }

    fn flush_outbox(&mut self, config: &ChatterConfig, alive: bool) {
        let gate = EnqueueGate::new(config, alive);
        for statement in self.locals.outbox.drain(..) {
            if let Err(reason) = self.queue.enqueue(statement, &gate) {
                trace!(bot = %self.id, %reason, "Statement not queued");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Body commands written during the last update.
    #[must_use]
    pub fn body(&self) -> &BodyCommands {
        &self.locals.body
    }

    /// Private knowledge.
    #[must_use]
    pub fn blackboard(&self) -> &Blackboard {
        &self.locals.blackboard
    }

    /// Whether the last known state was dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Name of the behavior in control.
    #[must_use]
    pub fn top_behavior_name(&self) -> &'static str {
        self.stack.top_behavior_name()
    }

    /// What the behavior in control says it is doing.
    #[must_use]
    pub fn current_task(&self) -> Option<String> {
        self.stack.current_task()
    }

    /// Behavior names, root first.
    #[must_use]
    pub fn behavior_path(&self) -> Vec<&'static str> {
        self.stack.behavior_path()
    }

    /// The behavior stack.
    #[must_use]
    pub fn stack(&self) -> &BehaviorStack {
        &self.stack
    }

    fn query<'a>(&'a self, world: &'a dyn World, config: &'a BotConfig, now: GameTime) -> QueryContext<'a> {
        QueryContext {
            me: self.id,
            now,
            world,
            config,
            blackboard: &self.locals.blackboard,
        }
    }

    /// Whether the active behaviors want this bot to fall back.
    #[must_use]
    pub fn should_retreat(&self, world: &dyn World, config: &BotConfig, now: GameTime) -> bool {
        self.stack.should_retreat(&self.query(world, config, now))
    }

    /// Whether locomotion should steer around `entity`.
    #[must_use]
    pub fn is_hindrance(
        &self,
        world: &dyn World,
        config: &BotConfig,
        now: GameTime,
        entity: EntityId,
    ) -> bool {
        self.stack.is_hindrance(&self.query(world, config, now), entity)
    }

    /// Overlay snapshot.
    #[must_use]
    pub fn debug_snapshot(&self, now: GameTime) -> BotSnapshot {
        BotSnapshot {
            id: self.id,
            name: self.name.clone(),
            now,
            path: self.behavior_path().into_iter().map(str::to_owned).collect(),
            tip: self.top_behavior_name().to_owned(),
            task: self.current_task(),
            statements: self
                .queue
                .iter()
                .map(|s| StatementSummary {
                    id: s.id(),
                    topic: s.topic(),
                    start_at: s.start_at(),
                    speaking: s.is_speaking(),
                })
                .collect(),
            captured_at: Utc::now(),
        }
    }
}

impl Chatterer for Bot {
    fn id(&self) -> EntityId {
        self.id
    }

    fn statements(&self) -> &StatementQueue {
        &self.queue
    }

    fn chatter_mut(&mut self) -> ChatterState<'_> {
        ChatterState {
            queue: &mut self.queue,
            blackboard: &mut self.locals.blackboard,
            rng: &mut self.locals.rng,
        }
    }
}

#[cfg(test)]
mod tests {
    use ffbot_core::chatter::statement::{Plan, Topic};
    use ffbot_core::config::ChatterVerbosity;
    use ffbot_core::sandbox::SandboxWorld;
    use ffbot_core::types::{ActorSnapshot, GameMode, Location, PlayerClass, TeamId};
    use ffbot_core::world::ControlPoint;
    use serde_json::json;

    use super::*;

    fn staged() -> (SandboxWorld, Bot) {
        let id = EntityId::new();
        let mut world = SandboxWorld::default();
        world.mode = GameMode::ControlPoint;
        world.add_actor(ActorSnapshot::new(id, TeamId(0), PlayerClass::Soldier));
        world.control_points.push(ControlPoint {
            id: EntityId::new(),
            position: Location::new(600.0, 0.0, 0.0),
            place: None,
            owner: None,
            locked: false,
        });
        (world, Bot::new(id, "Grunt", 9))
    }

    #[test]
    fn first_update_announces_plan() {
        let (world, mut bot) = staged();
        let config = BotConfig::default();
        bot.update(&world, &config, GameTime::ZERO);

        assert_eq!(bot.top_behavior_name(), "CapturePoint");
        assert_eq!(bot.statements().len(), 1);
        let queued = bot.statements().iter().next().map(|s| s.topic());
        assert_eq!(queued, Some(Topic::Plan(Plan::CapturePoint)));
        assert!(bot.body().move_to.is_some());
    }

    #[test]
    fn silenced_bot_drops_its_chatter_but_keeps_working() {
        let (world, mut bot) = staged();
        let mut config = BotConfig::default();
        config.chatter.verbosity = ChatterVerbosity::Off;
        bot.update(&world, &config, GameTime::ZERO);
        bot.update(&world, &config, GameTime(0.1));

        assert_eq!(bot.top_behavior_name(), "CapturePoint");
        assert!(bot.statements().is_empty());
        assert!(bot.locals.outbox.is_empty());
    }

    #[test]
    fn death_clears_chatter_and_respawn_restarts_stack() {
        let (mut world, mut bot) = staged();
        let config = BotConfig::default();
        bot.update(&world, &config, GameTime::ZERO);
        assert!(!bot.statements().is_empty());

        bot.on_event(BotEvent::Killed { by: None });
        if let Some(me) = world.actor_mut(bot.id()) {
            me.alive = false;
        }
        let report = bot.update(&world, &config, GameTime(1.0));
        assert!(bot.statements().is_empty());
        assert!(bot.is_dead());
        assert_eq!(report, TickReport::default());

        if let Some(me) = world.actor_mut(bot.id()) {
            me.alive = true;
        }
        bot.on_event(BotEvent::Spawned);
        bot.update(&world, &config, GameTime(2.0));
        assert!(!bot.is_dead());
        assert_eq!(bot.behavior_path()[0], "TacticalMonitor");
        assert_eq!(bot.top_behavior_name(), "CapturePoint");
    }

    #[test]
    fn named_events_reach_the_stack() {
        let (world, mut bot) = staged();
        let config = BotConfig::default();
        bot.update(&world, &config, GameTime::ZERO);
        bot.on_named_event("command", &json!("despawn")).expect("known event");
        bot.update(&world, &config, GameTime(0.1));
        assert_eq!(bot.top_behavior_name(), "Despawn");
        assert!(bot.body().despawn);

        assert!(bot.on_named_event("teleported", &json!({})).is_err());
    }

    #[test]
    fn snapshot_serializes() {
        let (world, mut bot) = staged();
        let config = BotConfig::default();
        bot.update(&world, &config, GameTime::ZERO);
        let snapshot = bot.debug_snapshot(GameTime::ZERO);
        assert_eq!(snapshot.tip, "CapturePoint");
        assert_eq!(snapshot.path.first().map(String::as_str), Some("TacticalMonitor"));
        let json = snapshot.to_json().expect("serializable");
        assert!(json.contains("\"name\":\"Grunt\""));
    }

    #[test]
    fn hindrance_defaults_to_everyone_else() {
        let (world, mut bot) = staged();
        let config = BotConfig::default();
        bot.update(&world, &config, GameTime::ZERO);
        assert!(bot.is_hindrance(&world, &config, GameTime::ZERO, EntityId::new()));
        assert!(!bot.is_hindrance(&world, &config, GameTime::ZERO, bot.id()));
        assert!(!bot.should_retreat(&world, &config, GameTime::ZERO));
    }
}
