//! Per-tick views handed to behaviors and query answerers.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::blackboard::Blackboard;
use crate::body::BodyCommands;
use crate::chatter::statement::Statement;
use crate::config::BotConfig;
use crate::types::{ActorSnapshot, EntityId, GameTime};
use crate::world::{KnownEntity, World};

/// Enemies seen this recently still count as "in combat".
pub const COMBAT_MEMORY: f32 = 3.0;

/// Mutable per-tick context for lifecycle callbacks, events and monitors.
pub struct BotContext<'a> {
    /// The bot being updated.
    pub me: EntityId,
    /// Current simulation time.
    pub now: GameTime,
    /// Read-only world collaborators.
    pub world: &'a dyn World,
    /// Thresholds and toggles.
    pub config: &'a BotConfig,
    /// The bot's private knowledge.
    pub blackboard: &'a mut Blackboard,
    /// Commands for the host's body layers.
    pub body: &'a mut BodyCommands,
    /// The bot's own random stream.
    pub rng: &'a mut StdRng,
    /// Statements produced this tick, flushed into the queue afterwards.
    pub outbox: &'a mut Vec<Statement>,
}

impl BotContext<'_> {
    /// Current public state of this bot.
    #[must_use]
    pub fn actor(&self) -> Option<ActorSnapshot> {
        self.world.actor(self.me)
    }

    /// Queue a statement for the chatter system.
    pub fn say(&mut self, statement: Statement) {
        self.outbox.push(statement);
    }

    /// Read-only view for query answering.
    #[must_use]
    pub fn query(&self) -> QueryContext<'_> {
        QueryContext {
            me: self.me,
            now: self.now,
            world: self.world,
            config: self.config,
            blackboard: self.blackboard,
        }
    }
}

impl std::fmt::Debug for BotContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotContext")
            .field("me", &self.me)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

/// Read-only view used while walking the stack for a query answer.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    /// The bot being asked.
    pub me: EntityId,
    /// Current simulation time.
    pub now: GameTime,
    /// Read-only world collaborators.
    pub world: &'a dyn World,
    /// Thresholds and toggles.
    pub config: &'a BotConfig,
    /// The bot's private knowledge.
    pub blackboard: &'a Blackboard,
}

impl QueryContext<'_> {
    /// Current public state of this bot.
    #[must_use]
    pub fn actor(&self) -> Option<ActorSnapshot> {
        self.world.actor(self.me)
    }

    /// Known enemies that are visible or were seen within [`COMBAT_MEMORY`].
    #[must_use]
    pub fn threats(&self) -> Vec<KnownEntity> {
        self.world
            .known_enemies(self.me)
            .into_iter()
            .filter(|e| e.visible || self.now.since(e.last_seen) <= COMBAT_MEMORY)
            .collect()
    }

    /// Whether the bot is fighting anyone right now.
    #[must_use]
    pub fn in_combat(&self) -> bool {
        !self.threats().is_empty()
    }
}

impl std::fmt::Debug for QueryContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("me", &self.me)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

/// State a bot owns privately between ticks and lends to its context.
#[derive(Debug)]
pub struct Locals {
    /// Private knowledge.
    pub blackboard: Blackboard,
    /// This tick's body commands.
    pub body: BodyCommands,
    /// Random stream.
    pub rng: StdRng,
    /// Statements produced but not yet queued.
    pub outbox: Vec<Statement>,
}

impl Locals {
    /// Fresh state with a seeded random stream.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            blackboard: Blackboard::default(),
            body: BodyCommands::default(),
            rng: StdRng::seed_from_u64(seed),
            outbox: Vec::new(),
        }
    }

    /// Lend everything to a [`BotContext`] for one tick.
    pub fn context<'a>(
        &'a mut self,
        me: EntityId,
        now: GameTime,
        world: &'a dyn World,
        config: &'a BotConfig,
    ) -> BotContext<'a> {
        BotContext {
            me,
            now,
            world,
            config,
            blackboard: &mut self.blackboard,
            body: &mut self.body,
            rng: &mut self.rng,
            outbox: &mut self.outbox,
        }
    }
}
