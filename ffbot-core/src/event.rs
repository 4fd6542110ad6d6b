//! World events delivered into a bot's behavior stack.

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, PlaceId};

/// A world event, delivered tip-to-root through the active stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BotEvent {
    /// Took damage.
    Injured {
        /// Who dealt it, if known.
        attacker: Option<EntityId>,
        /// How much.
        damage: f32,
    },
    /// Bumped into another entity.
    Contact {
        /// The other entity.
        other: EntityId,
    },
    /// Locomotion reports no progress.
    Stuck,
    /// Locomotion recovered.
    Unstuck,
    /// Free-form command string ("despawn", "taunt", ...).
    Command(String),
    /// Entered a different navigation place.
    NavAreaChanged {
        /// Previous place.
        from: Option<PlaceId>,
        /// New place.
        to: Option<PlaceId>,
    },
    /// Some entity was destroyed (sentries, teleporters, ...).
    EntityDestroyed {
        /// The destroyed entity.
        entity: EntityId,
    },
    /// This bot died.
    Killed {
        /// Who killed it, if known.
        by: Option<EntityId>,
    },
    /// This bot (re)spawned.
    Spawned,
    /// Another actor died.
    OtherKilled {
        /// The victim.
        victim: EntityId,
        /// The killer, if known.
        by: Option<EntityId>,
    },
}

impl BotEvent {
    /// Stable event name, matching the named entry point.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Injured { .. } => "injured",
            Self::Contact { .. } => "contact",
            Self::Stuck => "stuck",
            Self::Unstuck => "unstuck",
            Self::Command(_) => "command",
            Self::NavAreaChanged { .. } => "nav_area_changed",
            Self::EntityDestroyed { .. } => "entity_destroyed",
            Self::Killed { .. } => "killed",
            Self::Spawned => "spawned",
            Self::OtherKilled { .. } => "other_killed",
        }
    }
}
