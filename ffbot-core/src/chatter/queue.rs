//! Per-bot statement queue, ordered by scheduled start time.

use thiserror::Error;
use tracing::debug;

use super::statement::{Statement, StatementId};
use crate::config::{ChatterConfig, ChatterVerbosity};
use crate::types::GameTime;

/// Why a statement was not queued.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Chatter verbosity is off.
    #[error("chatter is disabled")]
    ChatterDisabled,
    /// Verbosity is minimal and the statement is not important.
    #[error("statement is not important enough for minimal chatter")]
    NotImportant,
    /// The owner is dead and the statement was not forced.
    #[error("speaker is dead")]
    SpeakerDead,
    /// The statement has nothing to say.
    #[error("statement has no parts")]
    NoParts,
    /// An equivalent statement is already queued.
    #[error("redundant with queued {0}")]
    Redundant(StatementId),
}

/// Admission settings for [`StatementQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnqueueGate {
    /// Verbosity in effect.
    pub verbosity: ChatterVerbosity,
    /// Whether the owner is alive.
    pub speaker_alive: bool,
    /// Validity window for statements that don't set one.
    pub default_validity: f32,
}

impl EnqueueGate {
    /// Gate built from configuration.
    #[must_use]
    pub fn new(config: &ChatterConfig, speaker_alive: bool) -> Self {
        Self {
            verbosity: config.verbosity,
            speaker_alive,
            default_validity: config.default_validity,
        }
    }
}

/// Pending statements of one bot. The queue is their sole owner.
#[derive(Debug, Default)]
pub struct StatementQueue {
    statements: Vec<Statement>,
    next_id: u64,
}

impl StatementQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `statement`, keeping the queue sorted by start time. Ties keep
    /// arrival order. A redundant newcomer is dropped; the queued one stays.
    ///
    /// # Errors
    /// Returns the [`Rejection`] reason when the statement is discarded.
    pub fn enqueue(
        &mut self,
        mut statement: Statement,
        gate: &EnqueueGate,
    ) -> Result<StatementId, Rejection> {
        let verdict = self.admit(&statement, gate);
        if let Err(reason) = verdict {
            debug!(
                bot = %statement.owner(),
                topic = ?statement.topic(),
                %reason,
                "Statement rejected"
            );
            return Err(reason);
        }

        self.next_id += 1;
        let id = StatementId(self.next_id);
        statement.id = id;
        statement.seal(gate.default_validity);
        self.insert_sorted(statement);
        Ok(id)
    }

    fn admit(&self, statement: &Statement, gate: &EnqueueGate) -> Result<(), Rejection> {
        match gate.verbosity {
            ChatterVerbosity::Off => return Err(Rejection::ChatterDisabled),
            ChatterVerbosity::Minimal if !statement.is_important() => {
                return Err(Rejection::NotImportant);
            }
            _ => {}
        }
        if !gate.speaker_alive && !statement.is_forced() {
            return Err(Rejection::SpeakerDead);
        }
        if statement.parts().is_empty() {
            return Err(Rejection::NoParts);
        }
        if let Some(existing) = self.statements.iter().find(|s| s.is_redundant_with(statement)) {
            return Err(Rejection::Redundant(existing.id()));
        }
        Ok(())
    }

    fn insert_sorted(&mut self, statement: Statement) {
        let key = statement.start_at().key();
        let at = self.statements.partition_point(|s| s.start_at().key() <= key);
        self.statements.insert(at, statement);
    }

    /// Number of queued statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Statements in start order.
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Look up a statement.
    #[must_use]
    pub fn get(&self, id: StatementId) -> Option<&Statement> {
        self.statements.iter().find(|s| s.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: StatementId) -> Option<&mut Statement> {
        self.statements.iter_mut().find(|s| s.id() == id)
    }

    /// Remove and return a statement.
    pub fn remove(&mut self, id: StatementId) -> Option<Statement> {
        let index = self.statements.iter().position(|s| s.id() == id)?;
        Some(self.statements.remove(index))
    }

    /// The statement currently being spoken, if any.
    #[must_use]
    pub fn speaking(&self) -> Option<&Statement> {
        self.statements.iter().find(|s| s.is_speaking())
    }

    /// Earliest statement that is due at `now`.
    #[must_use]
    pub fn earliest_due(&self, now: GameTime) -> Option<&Statement> {
        self.statements
            .iter()
            .filter(|s| s.is_due(now))
            .min_by_key(|s| (s.start_at().key(), s.created_at().key(), s.id()))
    }

    /// Keep only the statements for which `keep` returns true.
    pub(crate) fn retain_mut(&mut self, keep: impl FnMut(&mut Statement) -> bool) {
        self.statements.retain_mut(keep);
    }

    /// Restore start-time order after start times changed in place.
    pub(crate) fn resort(&mut self) {
        self.statements.sort_by_key(|s| s.start_at().key());
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.statements.clear();
    }
}
