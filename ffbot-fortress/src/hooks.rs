//! Integration hooks for the host game's event stream.
//!
//! The host reports events by name with a JSON payload
//! ([`parse_event`]), or builds them directly with the `on_*` helpers.

use ffbot_core::event::BotEvent;
use ffbot_core::types::{EntityId, PlaceId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Why a named event could not be turned into a [`BotEvent`].
#[derive(Debug, Error)]
pub enum HookError {
    /// No event has this name.
    #[error("unknown event {0:?}")]
    UnknownEvent(String),

    /// The payload does not match the event's shape.
    #[error("bad payload for {event}: {source}")]
    BadPayload {
        /// Event name.
        event: &'static str,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct Injured {
    #[serde(default)]
    attacker: Option<EntityId>,
    damage: f32,
}

#[derive(Deserialize)]
struct Other {
    other: EntityId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Command {
    Bare(String),
    Wrapped { command: String },
}

#[derive(Deserialize)]
struct NavAreaChanged {
    #[serde(default)]
    from: Option<PlaceId>,
    #[serde(default)]
    to: Option<PlaceId>,
}

#[derive(Deserialize)]
struct Entity {
    entity: EntityId,
}

#[derive(Deserialize)]
struct Killed {
    #[serde(default)]
    by: Option<EntityId>,
}

#[derive(Deserialize)]
struct OtherKilled {
    victim: EntityId,
    #[serde(default)]
    by: Option<EntityId>,
}

fn payload<T: DeserializeOwned>(event: &'static str, value: &Value) -> Result<T, HookError> {
    T::deserialize(value).map_err(|source| HookError::BadPayload { event, source })
}

/// Decode a named host event.
///
/// # Errors
/// [`HookError::UnknownEvent`] for an unrecognized name and
/// [`HookError::BadPayload`] when the payload has the wrong shape.
pub fn parse_event(name: &str, value: &Value) -> Result<BotEvent, HookError> {
    let event = match name {
        "injured" => {
            let p: Injured = payload("injured", value)?;
            on_injured(p.attacker, p.damage)
        }
        "contact" => {
            let p: Other = payload("contact", value)?;
            BotEvent::Contact { other: p.other }
        }
        "stuck" => BotEvent::Stuck,
        "unstuck" => BotEvent::Unstuck,
        "command" => {
            let command = match payload::<Command>("command", value)? {
                Command::Bare(c) | Command::Wrapped { command: c } => c,
            };
            on_command(command)
        }
        "nav_area_changed" => {
            let p: NavAreaChanged = payload("nav_area_changed", value)?;
            on_nav_area_changed(p.from, p.to)
        }
        "entity_destroyed" => {
            let p: Entity = payload("entity_destroyed", value)?;
            on_entity_destroyed(p.entity)
        }
        "killed" => {
            let p: Killed = payload("killed", value)?;
            BotEvent::Killed { by: p.by }
        }
        "spawned" => BotEvent::Spawned,
        "other_killed" => {
            let p: OtherKilled = payload("other_killed", value)?;
            BotEvent::OtherKilled {
                victim: p.victim,
                by: p.by,
            }
        }
        other => return Err(HookError::UnknownEvent(other.to_owned())),
    };
    Ok(event)
}

/// Damage taken.
#[must_use]
pub fn on_injured(attacker: Option<EntityId>, damage: f32) -> BotEvent {
    BotEvent::Injured { attacker, damage }
}

/// Free-form console or script command.
#[must_use]
pub fn on_command(command: impl Into<String>) -> BotEvent {
    BotEvent::Command(command.into())
}

/// The bot walked into a different navigation place.
#[must_use]
pub fn on_nav_area_changed(from: Option<PlaceId>, to: Option<PlaceId>) -> BotEvent {
    BotEvent::NavAreaChanged { from, to }
}

/// A world entity (sentry, teleporter, flag) was destroyed.
#[must_use]
pub fn on_entity_destroyed(entity: EntityId) -> BotEvent {
    BotEvent::EntityDestroyed { entity }
}
