//! Shared path following with bounded repathing.

use ffbot_core::context::BotContext;
use ffbot_core::timer::CountdownTimer;
use ffbot_core::types::Location;
use tracing::debug;

/// Distance at which a waypoint or goal counts as reached.
pub const ARRIVE_DISTANCE: f32 = 32.0;

/// Progress of a [`PathFollower`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// Still on the way (or waiting to retry).
    Moving,
    /// Within tolerance of the goal.
    Arrived,
    /// No goal, or the retry budget ran out.
    Failed,
}

/// Walks toward a goal through the navigator. When no route exists it
/// retries after `repath_interval`, and gives up after
/// `max_repath_attempts` consecutive failures.
#[derive(Debug, Clone, Default)]
pub struct PathFollower {
    goal: Option<Location>,
    path: Vec<Location>,
    retry: CountdownTimer,
    failures: u32,
}

impl PathFollower {
    /// A follower with no goal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current goal.
    #[must_use]
    pub fn goal(&self) -> Option<Location> {
        self.goal
    }

    /// Head for `goal`. Keeps the current path if the goal did not move.
    pub fn set_goal(&mut self, goal: Location) {
        if self.goal.is_some_and(|g| g.distance(&goal) < ARRIVE_DISTANCE) {
            return;
        }
        self.goal = Some(goal);
        self.path.clear();
        self.failures = 0;
        self.retry.invalidate();
    }

    /// Forget the goal.
    pub fn clear(&mut self) {
        self.goal = None;
        self.path.clear();
        self.failures = 0;
        self.retry.invalidate();
    }

    /// Advance one tick, writing the next waypoint into the body commands.
    pub fn update(&mut self, ctx: &mut BotContext<'_>, tolerance: f32) -> PathStatus {
        let Some(goal) = self.goal else {
            return PathStatus::Failed;
        };
        let Some(me) = ctx.actor() else {
            return PathStatus::Failed;
        };
        if me.position.distance(&goal) <= tolerance {
            self.path.clear();
            return PathStatus::Arrived;
        }

        if self.path.is_empty() {
            if !self.retry.is_elapsed(ctx.now) {
                return PathStatus::Moving;
            }
            match ctx.world.compute_path(me.position, goal) {
                Some(path) if !path.is_empty() => {
                    self.path = path;
                    self.failures = 0;
                }
                _ => {
                    self.failures += 1;
                    let limit = ctx.config.behavior.max_repath_attempts;
                    debug!(bot = %ctx.me, attempt = self.failures, limit, "No path to goal");
                    if self.failures >= limit {
                        return PathStatus::Failed;
                    }
                    self.retry.start(ctx.now, ctx.config.behavior.repath_interval);
                    return PathStatus::Moving;
                }
            }
        }

        while self
            .path
            .first()
            .is_some_and(|w| w.distance(&me.position) <= ARRIVE_DISTANCE)
        {
            self.path.remove(0);
        }
        ctx.body.move_to = self.path.first().copied().or(Some(goal));
        PathStatus::Moving
    }
}

#[cfg(test)]
mod tests {
    use ffbot_core::config::BotConfig;
    use ffbot_core::context::Locals;
    use ffbot_core::sandbox::SandboxWorld;
    use ffbot_core::types::{ActorSnapshot, EntityId, GameTime, PlayerClass, TeamId};

    use super::*;

    #[test]
    fn gives_up_after_bounded_retries() {
        let me = EntityId::new();
        let goal = Location::new(500.0, 0.0, 0.0);
        let mut world = SandboxWorld::default();
        world.add_actor(ActorSnapshot::new(me, TeamId(0), PlayerClass::Scout));
        world.blocked.push(goal);
        let config = BotConfig::default();
        let mut locals = Locals::new(1);

        let mut follower = PathFollower::new();
        follower.set_goal(goal);
        let mut statuses = Vec::new();
        for step in 0..6u8 {
            let mut ctx = locals.context(me, GameTime(f32::from(step) * 1.1), &world, &config);
            statuses.push(follower.update(&mut ctx, ARRIVE_DISTANCE));
        }
        assert_eq!(statuses[0], PathStatus::Moving);
        assert_eq!(statuses[2], PathStatus::Failed);
    }

    #[test]
    fn steers_toward_reachable_goal() {
        let me = EntityId::new();
        let goal = Location::new(500.0, 0.0, 0.0);
        let mut world = SandboxWorld::default();
        world.add_actor(ActorSnapshot::new(me, TeamId(0), PlayerClass::Scout));
        let config = BotConfig::default();
        let mut locals = Locals::new(1);

        let mut follower = PathFollower::new();
        follower.set_goal(goal);
        let mut ctx = locals.context(me, GameTime::ZERO, &world, &config);
        assert_eq!(follower.update(&mut ctx, ARRIVE_DISTANCE), PathStatus::Moving);
        assert_eq!(ctx.body.move_to, Some(goal));
    }
}
