//! The per-bot behavior stack.
//!
//! Per tick, in order:
//!
//! 1. A transition result deferred by the previous tick is applied.
//! 2. Pending events are delivered tip-to-root; the first node that asks to
//!    interrupt claims the event and its request is arbitrated.
//! 3. Every non-tip node is offered [`Behavior::monitor`], root first; the
//!    first interruption request is arbitrated.
//! 4. The tip's [`Behavior::update`] runs and its result is applied.
//!
//! Arbitration of an interruption request against the current tip:
//!
//! | Request     | Accepted when                                                        |
//! |-------------|----------------------------------------------------------------------|
//! | `Critical`  | always                                                               |
//! | `Important` | tip was not pushed `Critical` and its interruptibility is ≤ `Important` |
//! | `Try`       | tip's interruptibility is `Try` and it was pushed below `Important`  |
//!
//! A request raised by the tip itself is always accepted.

use std::fmt;

use tracing::{debug, info, warn};

use crate::context::BotContext;
use crate::event::BotEvent;

use super::{ActionResult, Behavior, EventDesiredResult, Importance, QueryChain};

/// Upper bound on push/pop transitions applied in one tick.
pub const MAX_TRANSITIONS: usize = 32;

/// Builds a fresh root whenever the stack would otherwise be empty.
pub type RootFactory = Box<dyn Fn() -> Box<dyn Behavior>>;

/// Arbitration of a request of `importance` against `tip`.
fn admits(tip: Option<&Slot>, importance: Importance) -> bool {
    let Some(tip) = tip else {
        return true;
    };
    let floor = tip.behavior.interruptibility();
    match importance {
        Importance::Critical => true,
        Importance::Important => {
            tip.pushed_with != Some(Importance::Critical) && floor <= Importance::Important
        }
        Importance::Try => {
            floor == Importance::Try && tip.pushed_with.is_none_or(|i| i < Importance::Important)
        }
    }
}

#[derive(Debug)]
struct Slot {
    behavior: Box<dyn Behavior>,
    pushed_with: Option<Importance>,
}

impl Slot {
    fn root(behavior: Box<dyn Behavior>) -> Self {
        Self {
            behavior,
            pushed_with: None,
        }
    }
}

/// What happened during one [`BehaviorStack::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Name of the node whose `update` ran, if any.
    pub updated: Option<&'static str>,
    /// Push/pop transitions applied.
    pub transitions: usize,
    /// A transition was left for the next tick.
    pub deferred: bool,
}

#[derive(Debug, Default)]
struct Budget {
    spent: usize,
}

impl Budget {
    fn spend(&mut self) -> bool {
        if self.spent >= MAX_TRANSITIONS {
            return false;
        }
        self.spent += 1;
        true
    }
}

/// Ordered chain of active behaviors, root to tip. Never empty.
pub struct BehaviorStack {
    slots: Vec<Slot>,
    make_root: RootFactory,
    started: bool,
    deferred: Option<ActionResult>,
}

impl BehaviorStack {
    /// A stack holding a fresh, not yet started root.
    #[must_use]
    pub fn new(make_root: RootFactory) -> Self {
        let root = make_root();
        Self {
            slots: vec![Slot::root(root)],
            make_root,
            started: false,
            deferred: None,
        }
    }

    /// Run one tick: deferred transition, events, monitor pass, tip update.
    pub fn update(&mut self, ctx: &mut BotContext<'_>, events: &[BotEvent]) -> TickReport {
        let mut budget = Budget::default();

        if !self.started {
            self.started = true;
            let result = self.tip_mut().on_start(ctx, None);
            self.settle(ctx, result, &mut budget);
        }

        if let Some(result) = self.deferred.take() {
            self.settle(ctx, result, &mut budget);
        }

        for event in events {
            self.deliver(ctx, event, &mut budget);
        }

        self.run_monitors(ctx, &mut budget);

        if self.deferred.is_some() {
            return TickReport {
                updated: None,
                transitions: budget.spent,
                deferred: true,
            };
        }

        let tip = self.tip_mut();
        let updated = tip.name();
        let result = tip.update(ctx);
        self.settle(ctx, result, &mut budget);

        TickReport {
            updated: Some(updated),
            transitions: budget.spent,
            deferred: self.deferred.is_some(),
        }
    }

    /// End every node and start over from a fresh root on the next update.
    pub fn reset(&mut self, ctx: &mut BotContext<'_>) {
        while let Some(mut slot) = self.slots.pop() {
            slot.behavior.on_end(ctx, None);
        }
        self.deferred = None;
        self.started = false;
        self.slots.push(Slot::root((self.make_root)()));
        debug!(bot = %ctx.me, "Behavior stack reset");
    }

    /// Name of the tip.
    #[must_use]
    pub fn top_behavior_name(&self) -> &'static str {
        self.slots.last().map_or("<none>", |s| s.behavior.name())
    }

    /// First task description found walking tip-to-root.
    #[must_use]
    pub fn current_task(&self) -> Option<String> {
        self.slots.iter().rev().find_map(|s| s.behavior.task())
    }

    /// Node names, root first.
    #[must_use]
    pub fn behavior_path(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.behavior.name()).collect()
    }

    /// Number of active nodes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Whether a node named `name` is active.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.behavior.name() == name)
    }

    // -- transitions --------------------------------------------------------

    fn tip_mut(&mut self) -> &mut dyn Behavior {
        if self.slots.is_empty() {
            self.slots.push(Slot::root((self.make_root)()));
        }
        let last = self.slots.len() - 1;
        self.slots[last].behavior.as_mut()
    }

    fn settle(&mut self, ctx: &mut BotContext<'_>, mut result: ActionResult, budget: &mut Budget) {
        loop {
            if result.is_continue() {
                return;
            }
            if !budget.spend() {
                warn!(
                    bot = %ctx.me,
                    limit = MAX_TRANSITIONS,
                    tip = self.top_behavior_name(),
                    "Transition limit reached; deferring to next tick"
                );
                self.deferred = Some(result);
                return;
            }
            result = match result {
                ActionResult::Continue => return,
                ActionResult::Done(reason) => self.pop(ctx, reason),
                ActionResult::SuspendFor(child, reason) => self.push(ctx, child, None, reason),
            };
        }
    }

    fn push(
        &mut self,
        ctx: &mut BotContext<'_>,
        child: Box<dyn Behavior>,
        importance: Option<Importance>,
        reason: &'static str,
    ) -> ActionResult {
        let suspended = {
            let tip = self.tip_mut();
            tip.on_suspend(ctx, child.as_ref());
            tip.name()
        };
        debug!(
            bot = %ctx.me,
            behavior = child.name(),
            suspended,
            reason,
            importance = ?importance,
            "Push"
        );
        self.slots.push(Slot {
            behavior: child,
            pushed_with: importance,
        });

        let len = self.slots.len();
        let (below, top) = self.slots.split_at_mut(len - 1);
        let prior = below.last().map(|s| s.behavior.as_ref());
        match top.first_mut() {
            Some(new_tip) => new_tip.behavior.on_start(ctx, prior),
            None => ActionResult::Continue,
        }
    }

    fn pop(&mut self, ctx: &mut BotContext<'_>, reason: &'static str) -> ActionResult {
        let Some(mut finished) = self.slots.pop() else {
            return self.reseed(ctx, None);
        };
        let next = self.slots.last().map(|s| s.behavior.as_ref());
        finished.behavior.on_end(ctx, next);
        debug!(bot = %ctx.me, behavior = finished.behavior.name(), reason, "Pop");

        if self.slots.is_empty() {
            return self.reseed(ctx, Some(finished.behavior.as_ref()));
        }
        self.tip_mut().on_resume(ctx, finished.behavior.as_ref())
    }

    fn reseed(&mut self, ctx: &mut BotContext<'_>, previous: Option<&dyn Behavior>) -> ActionResult {
        let root = (self.make_root)();
        info!(bot = %ctx.me, behavior = root.name(), "Root finished; re-seeding");
        self.slots.push(Slot::root(root));
        self.tip_mut().on_start(ctx, previous)
    }

    // -- interruptions ------------------------------------------------------

    fn accepts(&self, importance: Importance) -> bool {
        admits(self.slots.last(), importance)
    }

    fn interrupt(
        &mut self,
        ctx: &mut BotContext<'_>,
        from_tip: bool,
        child: Box<dyn Behavior>,
        importance: Importance,
        reason: &'static str,
        budget: &mut Budget,
    ) {
        if !from_tip && !self.accepts(importance) {
            debug!(
                bot = %ctx.me,
                behavior = child.name(),
                tip = self.top_behavior_name(),
                importance = %importance,
                reason,
                "Interruption vetoed"
            );
            return;
        }
        if !budget.spend() {
            warn!(
                bot = %ctx.me,
                behavior = child.name(),
                limit = MAX_TRANSITIONS,
                "Transition limit reached; dropping interruption"
            );
            return;
        }
        let result = self.push(ctx, child, Some(importance), reason);
        self.settle(ctx, result, budget);
    }

    fn deliver(&mut self, ctx: &mut BotContext<'_>, event: &BotEvent, budget: &mut Budget) {
        let tip = self.slots.len().saturating_sub(1);
        for index in (0..self.slots.len()).rev() {
            let request = self.slots[index].behavior.on_event(ctx, event);
            if let EventDesiredResult::TrySuspendFor {
                child,
                importance,
                reason,
            } = request
            {
                debug!(
                    bot = %ctx.me,
                    event = event.name(),
                    claimed_by = self.slots[index].behavior.name(),
                    "Event claimed"
                );
                self.interrupt(ctx, index == tip, child, importance, reason, budget);
                return;
            }
        }
    }

    fn run_monitors(&mut self, ctx: &mut BotContext<'_>, budget: &mut Budget) {
        let tip = self.slots.len().saturating_sub(1);
        for index in 0..tip {
            let (lower, rest) = self.slots.split_at_mut(index);
            let Some((node, upper)) = rest.split_first_mut() else {
                break;
            };
            let view = StackView {
                below: lower,
                above: upper,
            };
            let request = node.behavior.monitor(ctx, &view);
            if let EventDesiredResult::TrySuspendFor {
                child,
                importance,
                reason,
            } = request
            {
                self.interrupt(ctx, false, child, importance, reason, budget);
                return;
            }
        }
    }
}

impl QueryChain for BehaviorStack {
    fn innermost_first(&self) -> Vec<&dyn Behavior> {
        self.slots.iter().rev().map(|s| s.behavior.as_ref()).collect()
    }
}

impl fmt::Debug for BehaviorStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorStack")
            .field("path", &self.behavior_path())
            .field("started", &self.started)
            .field("deferred", &self.deferred.is_some())
            .finish_non_exhaustive()
    }
}

/// What a monitoring node can see of the rest of the stack.
///
/// Queries through a view skip the monitoring node itself.
pub struct StackView<'a> {
    below: &'a [Slot],
    above: &'a [Slot],
}

impl StackView<'_> {
    /// The current tip, `None` if the monitoring node is the tip.
    #[must_use]
    pub fn tip(&self) -> Option<&dyn Behavior> {
        self.above.last().map(|s| s.behavior.as_ref())
    }

    /// Name of the current tip.
    #[must_use]
    pub fn tip_name(&self) -> Option<&'static str> {
        self.tip().map(Behavior::name)
    }

    /// Whether a node named `name` sits above the monitoring node.
    #[must_use]
    pub fn above_contains(&self, name: &str) -> bool {
        self.above.iter().any(|s| s.behavior.name() == name)
    }

    /// Whether a node named `name` is active anywhere besides the monitoring node.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.above_contains(name) || self.below.iter().any(|s| s.behavior.name() == name)
    }

    /// Nodes above the monitoring node.
    #[must_use]
    pub fn depth_above(&self) -> usize {
        self.above.len()
    }

    /// Whether a request of `importance` would currently be accepted.
    #[must_use]
    pub fn would_accept(&self, importance: Importance) -> bool {
        admits(self.above.last(), importance)
    }
}

impl QueryChain for StackView<'_> {
    fn innermost_first(&self) -> Vec<&dyn Behavior> {
        self.above
            .iter()
            .rev()
            .chain(self.below.iter().rev())
            .map(|s| s.behavior.as_ref())
            .collect()
    }
}

impl fmt::Debug for StackView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackView")
            .field("below", &self.below.len())
            .field("above", &self.above.len())
            .field("tip", &self.tip_name())
            .finish()
    }
}
