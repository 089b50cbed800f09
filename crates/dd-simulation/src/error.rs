use dd_core::DigError;

use crate::day_cycle::Phase;

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while running the game.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// A grid, economy or placement rule rejected the action.
    #[error(transparent)]
    Dig(#[from] DigError),

    /// The action is not available in the current phase.
    #[error("cannot do that during {actual}, only during {expected}")]
    WrongPhase {
        /// Phase the action needs.
        expected: Phase,
        /// Phase the game is in.
        actual: Phase,
    },

    /// The player tried to move or dig after the day ended.
    #[error("mining is disabled until the next day starts")]
    MiningDisabled,

    /// A placement was requested with no shop item selected.
    #[error("no shop item selected")]
    NoItemSelected,
}
