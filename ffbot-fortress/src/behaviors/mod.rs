//! Leaf behaviors pushed by the tactical and scenario monitors.
//!
//! Every leaf that walks somewhere goes through [`path::PathFollower`], so
//! an unreachable goal ends the leaf after a bounded number of retries and
//! control falls back to the monitor that pushed it.

pub mod combat;
pub mod errands;
pub mod objective;
pub mod path;

pub use combat::{Attack, DestroySentry, EvadeEnemies, FetchSupplies, RetreatToCover};
pub use errands::{
    AcknowledgeHuman, Celebrate, Despawn, FleeVictors, ForcedJump, Taunt, UseItem, UseTeleporter,
    WaitForFormation,
};
pub use objective::{
    BuildSentry, CapturePoint, DeliverFlag, DefendPoint, EscortLeader, FetchFlag, Heal,
    SeekAndDestroy, Snipe, SpyInfiltrate,
};
pub use path::{PathFollower, PathStatus};
