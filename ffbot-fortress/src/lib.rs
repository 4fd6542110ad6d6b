//! # ffbot-fortress — Fortress Integration for ffbot
//!
//! This crate wires the game-agnostic `ffbot-core` engine to a class-based
//! fortress shooter: the two long-lived monitors, the leaf behaviors they
//! push, the [`Bot`] actor and the per-team tick driver.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Host game                    │
//! │   events ──► hooks ──► Bot ◄── Team::tick     │
//! │                         │                     │
//! │   ┌─────────────────────┴──────────────────┐  │
//! │   │ stack: TacticalMonitor                 │  │
//! │   │          └─ ScenarioMonitor            │  │
//! │   │               └─ objective / errand    │  │
//! │   └────────────────────────────────────────┘  │
//! │                         │ statements          │
//! │                 ChatterArbitrator ──► Voice   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `behaviors` — leaf behaviors (combat, errands, objectives, path following)
//! - `tactical` — objective-independent interruptions (root of every stack)
//! - `scenario` — objective choice and flag overrides
//! - `bot` — one bot: stack, statement queue, pending events
//! - `team` — per-frame driver for a team's bots and chatter
//! - `hooks` — named host events
//! - `snapshot` — serializable debug overlays

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod behaviors;
pub mod bot;
pub mod hooks;
pub mod scenario;
pub mod snapshot;
pub mod tactical;
pub mod team;

pub use bot::Bot;
pub use hooks::{HookError, parse_event};
pub use scenario::{Objective, ScenarioMonitor, desired_scenario_and_class_action};
pub use snapshot::BotSnapshot;
pub use tactical::TacticalMonitor;
pub use team::{Team, TeamReport};
