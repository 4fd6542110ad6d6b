//! Team chatter: statements, memes and the per-team arbitrator.
//!
//! Behaviors build [`Statement`]s and hand them to the bot's
//! [`StatementQueue`]. Once per tick the team's [`ChatterArbitrator`] picks
//! the one statement allowed to speak, plays it through the [`Voice`]
//! collaborator and, when it finishes, delivers its [`Meme`] to every living
//! teammate.
//!
//! [`Voice`]: crate::world::Voice

pub mod arbitrator;
pub mod meme;
pub mod phrase;
pub mod queue;
pub mod statement;

pub use arbitrator::{ChatterArbitrator, ChatterFrame, ChatterReport, ChatterState, Chatterer};
pub use meme::{Meme, MemeReceiver};
pub use phrase::{Phrase, PhraseBank, PhraseRegistry, PhraseSound, RadioSignal};
pub use queue::{EnqueueGate, Rejection, StatementQueue};
pub use statement::{
    Condition, ConditionScope, ContextPart, Plan, Statement, StatementId, StatementPart, Topic,
};
