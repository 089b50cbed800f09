use crate::coord::Coord;

/// Alias for `Result<T, DigError>`.
pub type DigResult<T> = Result<T, DigError>;

/// Errors that can occur when reading or changing the mine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigError {
    /// A coordinate lies outside the grid.
    #[error("coordinate ({x}, {y}) is outside the grid")]
    OutOfBounds {
        /// Column of the rejected coordinate.
        x: i32,
        /// Row of the rejected coordinate.
        y: i32,
    },

    /// A purchase costs more than the player has.
    #[error("not enough money: need ${needed}, have ${available}")]
    InsufficientFunds {
        /// Total price of the purchase.
        needed: u64,
        /// Money currently held.
        available: u64,
    },

    /// A placement breaks the placement rules.
    #[error("invalid placement: {0}")]
    InvalidPlacement(String),

    /// Internal state no longer agrees with itself.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A configuration value is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl DigError {
    /// Build an [`DigError::OutOfBounds`] for a coordinate.
    pub fn out_of_bounds(at: Coord) -> Self {
        Self::OutOfBounds { x: at.x, y: at.y }
    }
}
