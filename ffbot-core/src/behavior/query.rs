//! Query interface.
//!
//! A query walks the active nodes from the innermost outward. The first node
//! with an opinion wins; if nobody opines, a built-in default answers. The
//! defaults depend only on the world and configuration, so repeated calls
//! without a state change give the same answer.

use crate::context::QueryContext;
use crate::types::EntityId;
use crate::world::KnownEntity;

use super::{Behavior, QueryAnswer};

/// Anything that can list active nodes innermost-first and answer queries.
pub trait QueryChain {
    /// Active nodes, innermost first.
    fn innermost_first(&self) -> Vec<&dyn Behavior>;

    /// Should the bot fall back?
    fn should_retreat(&self, q: &QueryContext<'_>) -> bool {
        first_opinion(self.innermost_first(), |b| b.should_retreat(q))
            .unwrap_or_else(|| defaults::should_retreat(q))
    }

    /// Is the bot in a hurry (skip errands such as pickups)?
    fn should_hurry(&self, q: &QueryContext<'_>) -> bool {
        first_opinion(self.innermost_first(), |b| b.should_hurry(q))
            .unwrap_or_else(|| defaults::should_hurry(q))
    }

    /// Should the bot engage `threat`?
    fn should_attack(&self, q: &QueryContext<'_>, threat: &KnownEntity) -> bool {
        first_opinion(self.innermost_first(), |b| b.should_attack(q, threat))
            .unwrap_or_else(|| defaults::should_attack(q, threat))
    }

    /// Should locomotion route around `entity`?
    fn is_hindrance(&self, q: &QueryContext<'_>, entity: EntityId) -> bool {
        first_opinion(self.innermost_first(), |b| b.is_hindrance(q, entity))
            .unwrap_or_else(|| defaults::is_hindrance(q, entity))
    }

    /// Pick the more dangerous of two threats.
    fn select_more_dangerous_threat(
        &self,
        q: &QueryContext<'_>,
        a: &KnownEntity,
        b: &KnownEntity,
    ) -> EntityId {
        self.innermost_first()
            .into_iter()
            .find_map(|node| node.select_more_dangerous_threat(q, a, b))
            .unwrap_or_else(|| defaults::select_more_dangerous_threat(q, a, b))
    }
}

fn first_opinion<'a>(
    nodes: Vec<&'a dyn Behavior>,
    ask: impl Fn(&'a dyn Behavior) -> QueryAnswer,
) -> Option<bool> {
    nodes.into_iter().find_map(|node| ask(node).opinion())
}

/// Answers used when no active node has an opinion.
pub mod defaults {
    use super::{EntityId, KnownEntity, QueryContext};

    /// Retreat when badly hurt in combat. Inside a place where a teammate
    /// reported an enemy sniper, merely hurt is enough.
    #[must_use]
    pub fn should_retreat(q: &QueryContext<'_>) -> bool {
        q.actor().is_some_and(|me| {
            let limits = &q.config.behavior;
            let exposed = me
                .place
                .is_some_and(|place| q.blackboard.sniper_warnings.contains(&place));
            let threshold = if exposed {
                limits.health_ok_ratio
            } else {
                limits.health_critical_ratio
            };
            me.alive && me.health_ratio() < threshold && q.in_combat()
        })
    }

    /// Never hurried unless a behavior says so.
    #[must_use]
    pub fn should_hurry(_q: &QueryContext<'_>) -> bool {
        false
    }

    /// Engage anything.
    #[must_use]
    pub fn should_attack(_q: &QueryContext<'_>, _threat: &KnownEntity) -> bool {
        true
    }

    /// Everyone but yourself is in the way.
    #[must_use]
    pub fn is_hindrance(q: &QueryContext<'_>, entity: EntityId) -> bool {
        entity != q.me
    }

    /// Visible beats hidden, then nearer beats farther, then `a`.
    #[must_use]
    pub fn select_more_dangerous_threat(
        _q: &QueryContext<'_>,
        a: &KnownEntity,
        b: &KnownEntity,
    ) -> EntityId {
        if a.visible != b.visible {
            return if a.visible { a.id } else { b.id };
        }
        if b.distance < a.distance { b.id } else { a.id }
    }
}
