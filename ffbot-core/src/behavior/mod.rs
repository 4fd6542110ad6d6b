//! Interruptible hierarchical behavior engine.
//!
//! Every bot owns one [`BehaviorStack`]: root = long-lived monitor, tip =
//! the behavior currently in control. Only the tip's [`Behavior::update`]
//! runs each tick. Nodes below the tip are suspended but keep their state,
//! and they participate only through their dedicated hooks:
//!
//! - [`Behavior::on_event`] while an event is delivered tip-to-root
//! - [`Behavior::monitor`] during the root-first monitor pass
//! - the query methods while a query walks tip-to-root
//!
//! ```text
//!   tip   ┌──────────────┐  update() every tick
//!         │    Attack    │
//!         ├──────────────┤  monitor(): may ask to interrupt the tip
//!         │   Scenario   │
//!         ├──────────────┤
//!   root  │   Tactical   │
//!         └──────────────┘
//! ```

pub mod query;
pub mod result;
pub mod stack;

use std::fmt;

use crate::context::{BotContext, QueryContext};
use crate::event::BotEvent;
use crate::types::EntityId;
use crate::world::KnownEntity;

pub use query::QueryChain;
pub use result::{ActionResult, EventDesiredResult, Importance, QueryAnswer};
pub use stack::{BehaviorStack, RootFactory, StackView, TickReport};

/// One unit of decision logic.
///
/// Every hook except [`Behavior::name`] and [`Behavior::update`] has a
/// neutral default, so concrete behaviors implement only what they use.
pub trait Behavior: fmt::Debug {
    /// Debug name, shown in overlays and logs.
    fn name(&self) -> &'static str;

    /// Called once when the node is pushed. `prior` is the node it
    /// interrupted, if any.
    fn on_start(&mut self, _ctx: &mut BotContext<'_>, _prior: Option<&dyn Behavior>) -> ActionResult {
        ActionResult::Continue
    }

    /// Called every tick while this node is the tip.
    fn update(&mut self, ctx: &mut BotContext<'_>) -> ActionResult;

    /// Called when `interruptor` is about to be pushed above this node.
    fn on_suspend(&mut self, _ctx: &mut BotContext<'_>, _interruptor: &dyn Behavior) {}

    /// Called when the child above this node finished.
    fn on_resume(&mut self, _ctx: &mut BotContext<'_>, _finished: &dyn Behavior) -> ActionResult {
        ActionResult::Continue
    }

    /// Called when this node is popped. `next` is the node that regains control.
    fn on_end(&mut self, _ctx: &mut BotContext<'_>, _next: Option<&dyn Behavior>) {}

    /// Offered to every non-tip node each tick, root first.
    fn monitor(&mut self, _ctx: &mut BotContext<'_>, _view: &StackView<'_>) -> EventDesiredResult {
        EventDesiredResult::TryContinue
    }

    /// Handle a world event.
    fn on_event(&mut self, _ctx: &mut BotContext<'_>, _event: &BotEvent) -> EventDesiredResult {
        EventDesiredResult::TryContinue
    }

    /// Lowest importance an interruption needs to preempt this node.
    fn interruptibility(&self) -> Importance {
        Importance::Try
    }

    /// Short description of what the node is doing, for overlays.
    fn task(&self) -> Option<String> {
        None
    }

    /// Opinion on retreating.
    fn should_retreat(&self, _q: &QueryContext<'_>) -> QueryAnswer {
        QueryAnswer::DontCare
    }

    /// Opinion on hurrying.
    fn should_hurry(&self, _q: &QueryContext<'_>) -> QueryAnswer {
        QueryAnswer::DontCare
    }

    /// Opinion on engaging `threat`.
    fn should_attack(&self, _q: &QueryContext<'_>, _threat: &KnownEntity) -> QueryAnswer {
        QueryAnswer::DontCare
    }

    /// Opinion on whether locomotion should avoid `entity`.
    fn is_hindrance(&self, _q: &QueryContext<'_>, _entity: EntityId) -> QueryAnswer {
        QueryAnswer::DontCare
    }

    /// Opinion on which threat is worse; `None` for no opinion.
    fn select_more_dangerous_threat(
        &self,
        _q: &QueryContext<'_>,
        _a: &KnownEntity,
        _b: &KnownEntity,
    ) -> Option<EntityId> {
        None
    }
}
