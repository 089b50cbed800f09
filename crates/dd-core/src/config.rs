use serde::{Deserialize, Serialize};

use crate::error::{DigError, DigResult};
use crate::tile::{OreKind, ShopItem};

/// How veins of one ore are carved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VeinConfig {
    /// Number of veins to attempt.
    pub count: u32,
    /// Shortest random walk, in steps.
    pub min_length: u32,
    /// Longest random walk, in steps (inclusive).
    pub max_length: u32,
    /// Whether the vein may replace dirt as well as stone.
    pub allow_in_dirt: bool,
}

/// Value and vein shape for one ore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OreConfig {
    /// Which ore this entry describes.
    pub kind: OreKind,
    /// Money credited for mining one tile.
    pub value: u64,
    /// Vein carving parameters.
    pub vein: VeinConfig,
}

impl OreConfig {
    fn new(kind: OreKind, value: u64, count: u32, lengths: (u32, u32), allow_in_dirt: bool) -> Self {
        Self {
            kind,
            value,
            vein: VeinConfig {
                count,
                min_length: lengths.0,
                max_length: lengths.1,
                allow_in_dirt,
            },
        }
    }
}

/// Shop prices per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopPrices {
    /// Price of one ladder segment.
    pub ladder: u64,
    /// Price of one shoring segment.
    pub shoring: u64,
    /// Price of one stick of dynamite.
    pub dynamite: u64,
}

impl Default for ShopPrices {
    fn default() -> Self {
        Self {
            ladder: 10,
            shoring: 100,
            dynamite: 50,
        }
    }
}

impl ShopPrices {
    /// Price of a single item.
    pub fn price(&self, item: ShopItem) -> u64 {
        match item {
            ShopItem::Ladder => self.ladder,
            ShopItem::Shoring => self.shoring,
            ShopItem::Dynamite => self.dynamite,
        }
    }
}

/// Every tunable constant of a game.
///
/// Missing fields in a JSON file fall back to the defaults, so a config
/// file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// RNG seed for terrain generation.
    pub seed: u64,
    /// Grid width in tiles.
    pub width: usize,
    /// Grid height in tiles.
    pub height: usize,
    /// Tile size in pixels. Only presentation layers read this.
    pub tile_size: u32,
    /// First row below the sky.
    pub surface_height: i32,
    /// Deepest row dirt may still appear on, give or take a little noise.
    pub max_dirt_depth: i32,
    /// Base of the exponential decay of dirt probability with depth.
    pub dirt_decay_rate: f64,
    /// Ore values and vein shapes, in carving order.
    pub ores: Vec<OreConfig>,
    /// Shop prices.
    pub prices: ShopPrices,
    /// Day-advances an unsupported tile survives before collapsing.
    pub initial_collapse_timer: u32,
    /// Non-dirt tiles that may be mined per day.
    pub daily_quota: u32,
    /// Upper bound on full-grid settle passes per day advance.
    pub max_settle_iterations: usize,
    /// Longest fall the player survives, in tiles.
    pub max_safe_fall: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            width: 40,
            height: 27,
            tile_size: 32,
            surface_height: 3,
            max_dirt_depth: 15,
            dirt_decay_rate: 0.75,
            ores: vec![
                OreConfig::new(OreKind::Coal, 15, 16, (8, 16), true),
                OreConfig::new(OreKind::Iron, 50, 8, (6, 12), true),
                OreConfig::new(OreKind::Copper, 30, 7, (4, 8), true),
                OreConfig::new(OreKind::Gold, 100, 5, (3, 6), false),
            ],
            prices: ShopPrices::default(),
            initial_collapse_timer: 3,
            daily_quota: 10,
            max_settle_iterations: 100,
            max_safe_fall: 2,
        }
    }
}

impl GameConfig {
    /// Parse a config from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> DigResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DigError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values describe a playable map.
    pub fn validate(&self) -> DigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DigError::InvalidConfig(format!(
                "grid must not be empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.surface_height < 1 || self.surface_height as usize >= self.height {
            return Err(DigError::InvalidConfig(format!(
                "surface height {} must lie inside a grid of height {}",
                self.surface_height, self.height
            )));
        }
        if !(0.0..=1.0).contains(&self.dirt_decay_rate) {
            return Err(DigError::InvalidConfig(format!(
                "dirt decay rate {} must be within 0..=1",
                self.dirt_decay_rate
            )));
        }
        for ore in &self.ores {
            if ore.vein.min_length > ore.vein.max_length {
                return Err(DigError::InvalidConfig(format!(
                    "{} vein length range {}..={} is empty",
                    ore.kind, ore.vein.min_length, ore.vein.max_length
                )));
            }
        }
        Ok(())
    }

    /// Money credited for mining one tile of `ore`. Unconfigured ores are worthless.
    pub fn ore_value(&self, ore: OreKind) -> u64 {
        self.ore_config(ore).map_or(0, |c| c.value)
    }

    /// The config entry for `ore`, if present.
    pub fn ore_config(&self, ore: OreKind) -> Option<&OreConfig> {
        self.ores.iter().find(|c| c.kind == ore)
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the grid size.
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the surface row.
    pub fn with_surface_height(mut self, surface_height: i32) -> Self {
        self.surface_height = surface_height;
        self
    }

    /// Set the daily mining quota.
    pub fn with_daily_quota(mut self, quota: u32) -> Self {
        self.daily_quota = quota;
        self
    }

    /// Set the shop prices.
    pub fn with_prices(mut self, prices: ShopPrices) -> Self {
        self.prices = prices;
        self
    }

    /// Replace the ore table.
    pub fn with_ores(mut self, ores: Vec<OreConfig>) -> Self {
        self.ores = ores;
        self
    }
}
