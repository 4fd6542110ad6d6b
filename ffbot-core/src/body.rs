//! Per-tick command buffer.
//!
//! Behaviors never drive locomotion or weapons directly. They write intents
//! here and the host's locomotion/weapon layers read them after the tick.

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, Location};

/// What the bot's body should do this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyCommands {
    /// Next waypoint to walk toward.
    pub move_to: Option<Location>,
    /// Point to aim the view at.
    pub look_at: Option<Location>,
    /// Entity to shoot at.
    pub fire_at: Option<EntityId>,
    /// Teammate to heal.
    pub heal_target: Option<EntityId>,
    /// Jump once.
    pub jump: bool,
    /// Crouch and stay still.
    pub crouch: bool,
    /// Play the taunt animation.
    pub taunt: bool,
    /// Activate the carried item or ability.
    pub use_item: bool,
    /// Reload the primary weapon.
    pub reload: bool,
    /// Build a sentry at the given spot.
    pub build_at: Option<Location>,
    /// Remove this bot from the game.
    pub despawn: bool,
}

impl BodyCommands {
    /// Drop every command; called at the start of each bot update.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// No command has been issued this tick.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_everything() {
        let mut body = BodyCommands {
            jump: true,
            move_to: Some(Location::new(1.0, 2.0, 3.0)),
            ..BodyCommands::default()
        };
        assert!(!body.is_idle());
        body.clear();
        assert!(body.is_idle());
    }
}
