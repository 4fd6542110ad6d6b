//! Wall-clock relative timers.
//!
//! Timers store absolute [`GameTime`] deadlines, never tick counts. A
//! behavior that is suspended keeps its timers, and they continue to run
//! while it is buried; on resume an expired timer simply reads as elapsed.

use serde::{Deserialize, Serialize};

use crate::types::GameTime;

/// A one-shot countdown. An unstarted timer reads as elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CountdownTimer {
    started_at: Option<GameTime>,
    duration: f32,
}

impl CountdownTimer {
    /// A timer that has never been started.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            started_at: None,
            duration: 0.0,
        }
    }

    /// (Re)start the countdown at `now` for `duration` seconds.
    pub fn start(&mut self, now: GameTime, duration: f32) {
        self.started_at = Some(now);
        self.duration = duration.max(0.0);
    }

    /// Stop the timer; it reads as elapsed afterwards.
    pub fn invalidate(&mut self) {
        self.started_at = None;
    }

    /// Whether the timer has been started and not invalidated.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whether the countdown has run out (or was never started).
    #[must_use]
    pub fn is_elapsed(&self, now: GameTime) -> bool {
        match self.started_at {
            Some(start) => now.since(start) >= self.duration,
            None => true,
        }
    }

    /// Seconds left before the timer elapses.
    #[must_use]
    pub fn remaining(&self, now: GameTime) -> f32 {
        match self.started_at {
            Some(start) => (self.duration - now.since(start)).max(0.0),
            None => 0.0,
        }
    }
}

/// Measures how long ago something last happened.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IntervalTimer {
    started_at: Option<GameTime>,
}

impl IntervalTimer {
    /// An unstarted interval.
    #[must_use]
    pub const fn new() -> Self {
        Self { started_at: None }
    }

    /// Mark "now" as the reference point.
    pub fn start(&mut self, now: GameTime) {
        self.started_at = Some(now);
    }

    /// Forget the reference point.
    pub fn invalidate(&mut self) {
        self.started_at = None;
    }

    /// Whether the interval has a reference point.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Seconds since the reference point, `None` if never started.
    #[must_use]
    pub fn elapsed(&self, now: GameTime) -> Option<f32> {
        self.started_at.map(|start| now.since(start))
    }

    /// Whether more than `seconds` have passed. Unstarted intervals are never "greater than".
    #[must_use]
    pub fn is_greater_than(&self, now: GameTime, seconds: f32) -> bool {
        self.elapsed(now).is_some_and(|e| e > seconds)
    }
}
