use dd_core::{Coord, ShopItem};

use crate::movement::Direction;

/// An input the game understands, already translated from keys or clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Walk, climb or dig in a direction.
    Move(Direction),
    /// Pick a shop item, or put it back if it is already selected.
    SelectShopItem(ShopItem),
    /// Place one of the selected item.
    PlaceAt(Coord),
    /// Place a straight run of the selected item.
    PlaceRun {
        /// One end of the run.
        from: Coord,
        /// The other end.
        to: Coord,
    },
    /// Close the day and run it through to the next morning.
    AdvanceDay,
}
