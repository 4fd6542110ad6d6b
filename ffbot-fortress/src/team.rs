//! Per-team tick driver.
//!
//! One [`Team::tick`] is one simulation frame for the team: every bot
//! updates in roster order, then the chatter arbitrator picks and advances
//! the single team-wide speaker.

use ffbot_core::behavior::TickReport;
use ffbot_core::chatter::arbitrator::{ChatterArbitrator, ChatterFrame, ChatterReport};
use ffbot_core::chatter::phrase::PhraseRegistry;
use ffbot_core::config::BotConfig;
use ffbot_core::types::{EntityId, GameTime, TeamId};
use ffbot_core::world::{Voice, World};
use tracing::trace;

use crate::bot::Bot;

/// What one team tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamReport {
    /// Behavior stack report per bot, in roster order.
    pub bots: Vec<(EntityId, TickReport)>,
    /// Chatter arbitration report.
    pub chatter: ChatterReport,
}

/// Bots sharing one radio channel.
#[derive(Debug)]
pub struct Team {
    id: TeamId,
    bots: Vec<Bot>,
    arbitrator: ChatterArbitrator,
}

impl Team {
    /// An empty team.
    #[must_use]
    pub fn new(id: TeamId) -> Self {
        Self {
            id,
            bots: Vec::new(),
            arbitrator: ChatterArbitrator::new(id),
        }
    }

    /// Team id.
    #[must_use]
    pub fn id(&self) -> TeamId {
        self.id
    }

    /// Append a bot to the roster.
    pub fn add_bot(&mut self, bot: Bot) {
        self.bots.push(bot);
    }

    /// Remove a bot, returning it.
    pub fn remove_bot(&mut self, id: EntityId) -> Option<Bot> {
        let at = self.bots.iter().position(|b| b.id() == id)?;
        Some(self.bots.remove(at))
    }

    /// Look up a bot.
    #[must_use]
    pub fn bot(&self, id: EntityId) -> Option<&Bot> {
        self.bots.iter().find(|b| b.id() == id)
    }

    /// Look up a bot mutably, e.g. to deliver an event.
    pub fn bot_mut(&mut self, id: EntityId) -> Option<&mut Bot> {
        self.bots.iter_mut().find(|b| b.id() == id)
    }

    /// Roster.
    #[must_use]
    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    /// The team's chatter arbitrator.
    #[must_use]
    pub fn arbitrator(&self) -> &ChatterArbitrator {
        &self.arbitrator
    }

    /// Run one frame for every bot, then the chatter arbitration.
    pub fn tick(
        &mut self,
        world: &dyn World,
        config: &BotConfig,
        voice: &mut dyn Voice,
        phrases: &PhraseRegistry,
        now: GameTime,
    ) -> TeamReport {
        let bots = self
            .bots
            .iter_mut()
            .map(|bot| (bot.id(), bot.update(world, config, now)))
            .collect();

        let bank = phrases.current();
        let mut frame = ChatterFrame {
            now,
            world,
            voice,
            phrases: bank.as_deref(),
            config: &config.chatter,
        };
        let chatter = self.arbitrator.update(&mut self.bots, &mut frame);
        trace!(team = %self.id, ?chatter, "Team tick");
        TeamReport { bots, chatter }
    }

    /// Forget radio state carried over from the previous map.
    pub fn on_map_change(&mut self) {
        self.arbitrator.on_map_change();
    }
}
