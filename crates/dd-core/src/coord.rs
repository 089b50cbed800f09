use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell position on the grid. Row 0 is the top of the map.
///
/// Signed so that neighbours of edge cells can be expressed and then
/// rejected by the grid instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row, counted downwards from the top.
    pub y: i32,
    /// Column, counted from the left.
    pub x: i32,
}

impl Coord {
    /// Create a coordinate from a column and row.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The coordinate shifted by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The cell directly above.
    pub const fn above(self) -> Self {
        self.offset(0, -1)
    }

    /// The cell directly below.
    pub const fn below(self) -> Self {
        self.offset(0, 1)
    }

    /// The cell to the left.
    pub const fn left(self) -> Self {
        self.offset(-1, 0)
    }

    /// The cell to the right.
    pub const fn right(self) -> Self {
        self.offset(1, 0)
    }

    /// The four orthogonal neighbours: up, down, left, right.
    pub fn orthogonal(self) -> [Coord; 4] {
        [self.above(), self.below(), self.left(), self.right()]
    }

    /// The four diagonal neighbours, top row first.
    pub fn diagonals(self) -> [Coord; 4] {
        [
            self.offset(-1, -1),
            self.offset(1, -1),
            self.offset(-1, 1),
            self.offset(1, 1),
        ]
    }

    /// Every coordinate in the square of the given radius around `self`,
    /// row by row, including `self`.
    pub fn square(self, radius: i32) -> impl Iterator<Item = Coord> {
        (-radius..=radius)
            .flat_map(move |dy| (-radius..=radius).map(move |dx| self.offset(dx, dy)))
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_sq(self, other: Coord) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
