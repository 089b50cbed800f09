//! Game rules for Deepdig.
//!
//! Generates the mine, applies the player's digging and shop purchases,
//! runs the collapse and gravity rules and drives the day cycle. All
//! state lives in [`Game`]; the engines borrow it through a
//! [`GameContext`] for the duration of one action.

/// Commands a driver feeds to the game.
pub mod command;
/// Mutable context passed to the engines.
pub mod context;
/// The day cycle state machine.
pub mod day_cycle;
/// Error types for the simulation crate.
pub mod error;
/// Game event types, the event log and the observer interface.
pub mod event;
/// Top-level game orchestrator.
pub mod game;
/// Digging, blasting and placement rules.
pub mod mining;
/// Player movement and falling.
pub mod movement;
/// Collapse timers and dirt settling.
pub mod support;
/// Procedural mine generation.
pub mod terrain;

/// Re-export of [`command::Command`].
pub use command::Command;
/// Re-export of [`context::GameContext`].
pub use context::GameContext;
/// Re-exports of [`day_cycle::DayCycleController`], [`day_cycle::DayStep`] and [`day_cycle::Phase`].
pub use day_cycle::{DayCycleController, DayStep, Phase};
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of [`event::EventLog`], [`event::GameEvent`], [`event::GameEventKind`] and [`event::GameObserver`].
pub use event::{EventLog, GameEvent, GameEventKind, GameObserver};
/// Re-export of [`game::Game`].
pub use game::Game;
/// Re-exports of [`mining::Detonation`] and [`mining::MiningEngine`].
pub use mining::{Detonation, MiningEngine};
/// Re-exports of [`movement::Direction`] and [`movement::MoveOutcome`].
pub use movement::{Direction, MoveOutcome};
/// Re-exports of [`support::Collapse`], [`support::SettleMove`] and [`support::SupportSimulator`].
pub use support::{Collapse, SettleMove, SupportSimulator};
/// Re-exports of [`terrain::TerrainGenerator`] and [`terrain::Vein`].
pub use terrain::{TerrainGenerator, Vein};
