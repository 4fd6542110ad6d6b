//! Per-bot private knowledge.
//!
//! The blackboard is the only state of one bot that another bot can
//! influence, and only through memes. Behaviors read it through the
//! [`BotContext`](crate::context::BotContext).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chatter::statement::Plan;
use crate::types::{EntityId, GameTime, Location, PlaceId};

/// A teammate asking for backup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HelpRequest {
    /// Who asked.
    pub from: EntityId,
    /// Where they are.
    pub place: Option<PlaceId>,
    /// When the request arrived.
    pub received_at: GameTime,
}

/// A teammate's announced plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeammatePlan {
    /// What they intend to do.
    pub plan: Plan,
    /// Where.
    pub place: Option<PlaceId>,
}

/// Heard position of something noisy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Noise {
    /// Where it came from.
    pub position: Location,
    /// When it was relayed.
    pub heard_at: GameTime,
}

/// Private knowledge of one bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blackboard {
    /// Latest plan announced by each teammate.
    pub teammate_plans: HashMap<EntityId, TeammatePlan>,
    /// Most recent unanswered help request.
    pub help_request: Option<HelpRequest>,
    /// Position the objective item was reported loose at.
    pub loose_flag: Option<Location>,
    /// Teammate that asked this bot to follow.
    pub follow_request: Option<EntityId>,
    /// Place this bot was asked to defend.
    pub defend_request: Option<PlaceId>,
    /// Places where an enemy sniper was reported.
    pub sniper_warnings: Vec<PlaceId>,
    /// Relayed noises.
    pub noises: Vec<Noise>,
    /// A teammate asked everyone to report in.
    pub report_requested: bool,
    /// Enemy sentries this bot knows were destroyed.
    pub destroyed_sentries: Vec<EntityId>,
}

impl Blackboard {
    /// Whether any teammate announced `plan` at `place`.
    #[must_use]
    pub fn teammate_has_plan(&self, plan: Plan, place: Option<PlaceId>) -> bool {
        self.teammate_plans
            .values()
            .any(|p| p.plan == plan && p.place == place)
    }

    /// Forget everything; used on death and round reset.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
