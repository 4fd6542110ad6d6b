//! # ffbot Core Library
//!
//! Game-agnostic decision core for team-based shooter bots.
//!
//! Each bot owns a [`BehaviorStack`]: a stack of interruptible behaviors
//! where only the tip acts, lower nodes watch through monitors and events,
//! and queries ("should I retreat?") walk from the tip toward the root until
//! someone has an opinion. Bots talk through [`Statement`]s; a per-team
//! [`ChatterArbitrator`] lets one of them speak at a time and delivers the
//! attached [`Meme`]s so teammates converge on shared plans.
//!
//! The host supplies the world through the traits in [`world`]; the
//! [`sandbox`] module provides an in-memory version for tests and tools.
//!
//! ## Performance Contract
//!
//! - Behavior stack tick (depth 4, no events): < 5μs
//! - Team chatter arbitration (16 bots): < 20μs

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod behavior;
pub mod blackboard;
pub mod body;
pub mod chatter;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod sandbox;
pub mod settings;
pub mod timer;
pub mod types;
pub mod world;

pub use behavior::{
    ActionResult, Behavior, BehaviorStack, EventDesiredResult, Importance, QueryAnswer,
    QueryChain,
};
pub use blackboard::Blackboard;
pub use body::BodyCommands;
pub use chatter::{ChatterArbitrator, Meme, Statement, StatementQueue};
pub use config::BotConfig;
pub use context::{BotContext, Locals, QueryContext};
pub use error::BotError;
pub use event::BotEvent;
pub use types::*;
pub use world::World;
