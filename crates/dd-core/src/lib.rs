//! Core types for Deepdig: tiles, the mine grid, economy and player state.
//!
//! This crate holds the data model the simulation mutates. It has no
//! randomness and no rendering; the grid only records which cells changed
//! so a presentation layer can refresh them.

/// Game configuration: grid size, terrain tuning, prices and quotas.
pub mod config;
/// Grid coordinates used as keys for sparse per-tile state.
pub mod coord;
/// Money, daily mining progress and the day counter.
pub mod economy;
/// Error types used throughout the crate.
pub mod error;
/// The tile grid with collapse timers and dynamite placements.
pub mod grid;
/// Player position and visibility.
pub mod player;
/// Tile and ore kinds.
pub mod tile;

/// Re-export configuration types.
pub use config::{GameConfig, OreConfig, ShopPrices, VeinConfig};
/// Re-export the coordinate type.
pub use coord::Coord;
/// Re-export the economy.
pub use economy::Economy;
/// Re-export error types.
pub use error::{DigError, DigResult};
/// Re-export the grid.
pub use grid::Grid;
/// Re-export player state.
pub use player::PlayerState;
/// Re-export tile types.
pub use tile::{OreKind, ShopItem, TileKind};
