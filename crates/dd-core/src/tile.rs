use std::fmt;

use serde::{Deserialize, Serialize};

/// The contents of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Open air above the surface.
    Sky,
    /// A mined-out void.
    Empty,
    /// Solid rock.
    Stone,
    /// Loose soil. Falls when undermined.
    Dirt,
    /// Iron ore.
    Iron,
    /// Copper ore.
    Copper,
    /// Gold ore.
    Gold,
    /// Coal.
    Coal,
    /// A climbable ladder.
    Ladder,
    /// Shoring that props up its horizontal neighbours.
    Shoring,
    /// Armed, unexploded dynamite.
    Dynamite,
}

impl TileKind {
    /// All tile kinds, in declaration order.
    pub const ALL: [TileKind; 11] = [
        TileKind::Sky,
        TileKind::Empty,
        TileKind::Stone,
        TileKind::Dirt,
        TileKind::Iron,
        TileKind::Copper,
        TileKind::Gold,
        TileKind::Coal,
        TileKind::Ladder,
        TileKind::Shoring,
        TileKind::Dynamite,
    ];

    /// The ore this tile holds, if any.
    pub fn ore(self) -> Option<OreKind> {
        match self {
            Self::Iron => Some(OreKind::Iron),
            Self::Copper => Some(OreKind::Copper),
            Self::Gold => Some(OreKind::Gold),
            Self::Coal => Some(OreKind::Coal),
            _ => None,
        }
    }

    /// Whether this tile is one of the ores.
    pub fn is_ore(self) -> bool {
        self.ore().is_some()
    }

    /// Anything but `Empty` and `Sky`.
    pub fn is_solid(self) -> bool {
        !matches!(self, Self::Empty | Self::Sky)
    }

    /// Stone and ore can lose support and collapse into dirt.
    pub fn is_collapsible(self) -> bool {
        self == Self::Stone || self.is_ore()
    }

    /// Tiles that make nearby rock reachable for dynamite.
    pub fn is_access_point(self) -> bool {
        matches!(self, Self::Empty | Self::Ladder | Self::Shoring)
    }

    /// Tiles the player can stand in.
    pub fn is_passable(self) -> bool {
        matches!(self, Self::Empty | Self::Sky | Self::Ladder | Self::Shoring)
    }

    /// Tiles the player's pick does nothing to.
    pub fn is_unmineable(self) -> bool {
        matches!(self, Self::Sky | Self::Empty | Self::Ladder | Self::Shoring)
    }

    /// Single-character symbol used by text renders.
    pub fn symbol(self) -> char {
        match self {
            Self::Sky => '~',
            Self::Empty => '.',
            Self::Stone => '#',
            Self::Dirt => ':',
            Self::Iron => 'i',
            Self::Copper => 'c',
            Self::Gold => 'g',
            Self::Coal => 'k',
            Self::Ladder => '|',
            Self::Shoring => '=',
            Self::Dynamite => '*',
        }
    }

    /// Inverse of [`TileKind::symbol`].
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.symbol() == symbol)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sky => "sky",
            Self::Empty => "empty",
            Self::Stone => "stone",
            Self::Dirt => "dirt",
            Self::Iron => "iron",
            Self::Copper => "copper",
            Self::Gold => "gold",
            Self::Coal => "coal",
            Self::Ladder => "ladder",
            Self::Shoring => "shoring",
            Self::Dynamite => "dynamite",
        };
        f.write_str(name)
    }
}

/// The four ore kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OreKind {
    /// Coal, the most common ore.
    Coal,
    /// Iron.
    Iron,
    /// Copper.
    Copper,
    /// Gold, the rarest ore.
    Gold,
}

impl OreKind {
    /// Ores in vein carving order.
    pub const ALL: [OreKind; 4] = [OreKind::Coal, OreKind::Iron, OreKind::Copper, OreKind::Gold];

    /// The tile that holds this ore.
    pub fn tile(self) -> TileKind {
        match self {
            Self::Coal => TileKind::Coal,
            Self::Iron => TileKind::Iron,
            Self::Copper => TileKind::Copper,
            Self::Gold => TileKind::Gold,
        }
    }
}

impl fmt::Display for OreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tile().fmt(f)
    }
}

/// Items sold in the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItem {
    /// A ladder segment.
    Ladder,
    /// A shoring segment.
    Shoring,
    /// One stick of dynamite.
    Dynamite,
}

impl ShopItem {
    /// Every item on sale.
    pub const ALL: [ShopItem; 3] = [ShopItem::Ladder, ShopItem::Shoring, ShopItem::Dynamite];

    /// The tile a placed item becomes.
    pub fn tile(self) -> TileKind {
        match self {
            Self::Ladder => TileKind::Ladder,
            Self::Shoring => TileKind::Shoring,
            Self::Dynamite => TileKind::Dynamite,
        }
    }
}

impl fmt::Display for ShopItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tile().fmt(f)
    }
}

impl std::str::FromStr for ShopItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ladder" => Ok(Self::Ladder),
            "shoring" => Ok(Self::Shoring),
            "dynamite" => Ok(Self::Dynamite),
            other => Err(format!("unknown shop item: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ore_round_trip() {
        for ore in OreKind::ALL {
            assert_eq!(ore.tile().ore(), Some(ore));
        }
        assert_eq!(TileKind::Stone.ore(), None);
        assert_eq!(TileKind::Dirt.ore(), None);
    }

    #[test]
    fn classification() {
        assert!(TileKind::Stone.is_collapsible());
        assert!(TileKind::Copper.is_collapsible());
        assert!(!TileKind::Dirt.is_collapsible());
        assert!(!TileKind::Shoring.is_collapsible());

        assert!(TileKind::Dirt.is_solid());
        assert!(TileKind::Ladder.is_solid());
        assert!(!TileKind::Empty.is_solid());
        assert!(!TileKind::Sky.is_solid());

        assert!(TileKind::Ladder.is_access_point());
        assert!(!TileKind::Sky.is_access_point());
    }

    #[test]
    fn symbols_are_unique() {
        for kind in TileKind::ALL {
            assert_eq!(TileKind::from_symbol(kind.symbol()), Some(kind));
        }
        assert_eq!(TileKind::from_symbol('?'), None);
    }

    #[test]
    fn shop_item_parse() {
        assert_eq!("Ladder".parse::<ShopItem>(), Ok(ShopItem::Ladder));
        assert_eq!("dynamite".parse::<ShopItem>(), Ok(ShopItem::Dynamite));
        assert!("pickaxe".parse::<ShopItem>().is_err());
    }
}
