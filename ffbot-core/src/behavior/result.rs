//! Lifecycle and event results.

use serde::{Deserialize, Serialize};

use super::Behavior;

/// How hard an interruption request pushes against the current tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Importance {
    /// Advisory; dropped if the tip is busy.
    Try,
    /// Wins unless the tip is itself running under a critical interruption.
    Important,
    /// Always wins.
    Critical,
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Try => "try",
            Self::Important => "important",
            Self::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// What a lifecycle callback wants the stack to do next.
#[derive(Debug)]
pub enum ActionResult {
    /// Keep running this behavior.
    Continue,
    /// This behavior is finished; pop it and resume the parent.
    Done(&'static str),
    /// Push `child` above this behavior and suspend.
    SuspendFor(Box<dyn Behavior>, &'static str),
}

impl ActionResult {
    /// Finished with the given reason.
    #[must_use]
    pub fn done(reason: &'static str) -> Self {
        Self::Done(reason)
    }

    /// Suspend for `child`.
    #[must_use]
    pub fn suspend_for(child: impl Behavior + 'static, reason: &'static str) -> Self {
        Self::SuspendFor(Box::new(child), reason)
    }

    /// Whether this is [`ActionResult::Continue`].
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// What an event handler or monitor would like to happen.
#[derive(Debug)]
pub enum EventDesiredResult {
    /// No change of control.
    TryContinue,
    /// Ask to push `child` above the current tip.
    TrySuspendFor {
        /// The behavior to push.
        child: Box<dyn Behavior>,
        /// How hard to push.
        importance: Importance,
        /// Debug reason.
        reason: &'static str,
    },
}

impl EventDesiredResult {
    /// Advisory request.
    #[must_use]
    pub fn try_suspend_for(child: impl Behavior + 'static, reason: &'static str) -> Self {
        Self::suspend_for(child, Importance::Try, reason)
    }

    /// Request that only a critical tip may veto.
    #[must_use]
    pub fn important(child: impl Behavior + 'static, reason: &'static str) -> Self {
        Self::suspend_for(child, Importance::Important, reason)
    }

    /// Request that cannot be vetoed.
    #[must_use]
    pub fn critical(child: impl Behavior + 'static, reason: &'static str) -> Self {
        Self::suspend_for(child, Importance::Critical, reason)
    }

    /// Request with an explicit importance.
    #[must_use]
    pub fn suspend_for(
        child: impl Behavior + 'static,
        importance: Importance,
        reason: &'static str,
    ) -> Self {
        Self::TrySuspendFor {
            child: Box::new(child),
            importance,
            reason,
        }
    }
}

/// A query answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryAnswer {
    /// Yes.
    Yes,
    /// No.
    No,
    /// No opinion; ask the next node outward.
    DontCare,
}

impl QueryAnswer {
    /// `Some(bool)` for an opinion, `None` for [`QueryAnswer::DontCare`].
    #[must_use]
    pub fn opinion(self) -> Option<bool> {
        match self {
            Self::Yes => Some(true),
            Self::No => Some(false),
            Self::DontCare => None,
        }
    }
}

impl From<bool> for QueryAnswer {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_is_ordered() {
        assert!(Importance::Critical > Importance::Important);
        assert!(Importance::Important > Importance::Try);
    }

    #[test]
    fn answers_map_to_opinions() {
        assert_eq!(QueryAnswer::Yes.opinion(), Some(true));
        assert_eq!(QueryAnswer::No.opinion(), Some(false));
        assert_eq!(QueryAnswer::DontCare.opinion(), None);
        assert_eq!(QueryAnswer::from(true), QueryAnswer::Yes);
    }
}
