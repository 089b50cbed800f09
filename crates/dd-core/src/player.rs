use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::grid::Grid;

/// Where the miner is and whether they are drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Current cell.
    pub position: Coord,
    /// Hidden while the shop is open.
    pub visible: bool,
}

impl PlayerState {
    /// A visible player at `position`.
    pub fn at(position: Coord) -> Self {
        Self {
            position,
            visible: true,
        }
    }

    /// Put the player on top of the highest solid tile in column 0,
    /// searching down from the surface row.
    ///
    /// Falls back to the row just above the surface when the column has
    /// been dug out completely.
    pub fn reset_to_surface(&mut self, grid: &Grid, surface_height: i32) {
        let x = 0;
        let y = (surface_height..grid.height() as i32)
            .find(|y| grid.tile(Coord::new(x, *y)).is_some_and(|t| t.is_solid()))
            .map_or(surface_height - 1, |y| y - 1);
        self.position = Coord::new(x, y);
    }
}
