//! Serializable debug snapshots for overlays and logs.

use chrono::{DateTime, Utc};
use ffbot_core::chatter::statement::{StatementId, Topic};
use ffbot_core::types::{EntityId, GameTime};
use serde::{Deserialize, Serialize};

/// One queued statement as shown in an overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    /// Statement id.
    pub id: StatementId,
    /// What it is about.
    pub topic: Topic,
    /// Scheduled start.
    pub start_at: GameTime,
    /// Currently playing.
    pub speaking: bool,
}

/// What a bot is doing, frozen at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotSnapshot {
    /// Bot id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Simulation time of the snapshot.
    pub now: GameTime,
    /// Behavior names, root first.
    pub path: Vec<String>,
    /// Name of the behavior in control.
    pub tip: String,
    /// What the tip says it is doing.
    pub task: Option<String>,
    /// Queued statements in start order.
    pub statements: Vec<StatementSummary>,
    /// Wall-clock capture time.
    pub captured_at: DateTime<Utc>,
}

impl BotSnapshot {
    /// Render as JSON.
    ///
    /// # Errors
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> ffbot_core::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render as indented JSON.
    ///
    /// # Errors
    /// Returns a serialization error if encoding fails.
    pub fn to_json_pretty(&self) -> ffbot_core::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
