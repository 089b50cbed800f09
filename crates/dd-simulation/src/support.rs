//! Structural support: collapse timers and loose-dirt gravity.

use tracing::{debug, warn};

use dd_core::grid::CollapseCause;
use dd_core::{Coord, GameConfig, Grid, TileKind};

/// One discrete movement of a dirt tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleMove {
    /// Where the dirt was.
    pub from: Coord,
    /// Where it ended up.
    pub to: Coord,
}

/// A tile whose collapse timer ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collapse {
    /// The tile, now dirt.
    pub at: Coord,
    /// What it was before collapsing.
    pub from: TileKind,
}

/// Decides which tiles are losing support and moves loose dirt.
///
/// Holds no grid state of its own; every method works on the grid it is
/// given.
#[derive(Debug, Clone)]
pub struct SupportSimulator {
    initial_timer: u32,
    max_iterations: usize,
}

impl SupportSimulator {
    /// Create a simulator using the timer length and iteration cap from `config`.
    pub fn new(config: &GameConfig) -> Self {
        Self {
            initial_timer: config.initial_collapse_timer,
            max_iterations: config.max_settle_iterations,
        }
    }

    /// Whether shoring stands directly left or right of `at`.
    pub fn has_horizontal_shoring(grid: &Grid, at: Coord) -> bool {
        grid.is(at.left(), TileKind::Shoring) || grid.is(at.right(), TileKind::Shoring)
    }

    /// Stone or ore with empty space directly below and no shoring beside it.
    pub fn is_unsupported(grid: &Grid, at: Coord) -> bool {
        grid.tile(at).is_some_and(TileKind::is_collapsible)
            && grid.is(at.below(), TileKind::Empty)
            && !Self::has_horizontal_shoring(grid, at)
    }

    /// Whether a running timer of `cause` still applies to the tile at `at`.
    /// Shoring cancels every timer; blast damage ignores what lies below.
    fn keeps_counting(grid: &Grid, at: Coord, cause: CollapseCause) -> bool {
        match cause {
            CollapseCause::Unsupported => Self::is_unsupported(grid, at),
            CollapseCause::Blast => !Self::has_horizontal_shoring(grid, at),
        }
    }

    /// Dirt that is free to move: not held by shoring.
    fn is_loose_dirt(grid: &Grid, at: Coord) -> bool {
        grid.is(at, TileKind::Dirt) && !Self::has_horizontal_shoring(grid, at)
    }

    /// Start timers on newly unsupported tiles and clear them on tiles
    /// that regained support. Returns the tiles whose countdown started.
    pub fn refresh_collapse_candidates(&self, grid: &mut Grid) -> Vec<Coord> {
        let mut started = Vec::new();
        for at in grid.coords() {
            if !grid.tile(at).is_some_and(TileKind::is_collapsible) {
                continue;
            }
            if Self::is_unsupported(grid, at) {
                if grid.start_timer(at, self.initial_timer, CollapseCause::Unsupported) {
                    started.push(at);
                }
            } else if grid
                .collapse_timer(at)
                .is_some_and(|t| !Self::keeps_counting(grid, at, t.cause))
            {
                grid.clear_timer(at);
            }
        }
        started
    }

    /// Count every timer down by one. Tiles that reach zero turn to dirt.
    ///
    /// Support-driven timers whose tile is supported again are dropped
    /// instead. Blast timers count down on supported tiles too, until
    /// shoring is put beside them.
    pub fn advance_timers(&self, grid: &mut Grid) -> Vec<Collapse> {
        let mut collapsed = Vec::new();
        for at in grid.timer_coords() {
            let Some(timer) = grid.collapse_timer(at) else {
                continue;
            };
            let Some(tile) = grid.tile(at).filter(|t| t.is_collapsible()) else {
                grid.clear_timer(at);
                continue;
            };
            if !Self::keeps_counting(grid, at, timer.cause) {
                grid.clear_timer(at);
                continue;
            }
            if grid.decrement_timer(at) == Some(0) {
                grid.clear_timer(at);
                grid.set(at, TileKind::Dirt);
                debug!(%at, from = %tile, "tile collapsed");
                collapsed.push(Collapse { at, from: tile });
            }
        }
        collapsed
    }

    /// Let loose dirt fall straight down until nothing moves.
    ///
    /// Each pass scans bottom-up and moves every loose dirt tile with
    /// empty space below it by one row.
    pub fn settle_loose(&self, grid: &mut Grid) -> Vec<SettleMove> {
        let mut moves = Vec::new();
        for _ in 0..self.max_iterations {
            if !Self::fall_pass(grid, &mut moves) {
                return moves;
            }
        }
        warn!(passes = self.max_iterations, "vertical settling hit the pass limit");
        moves
    }

    fn fall_pass(grid: &mut Grid, moves: &mut Vec<SettleMove>) -> bool {
        let mut changed = false;
        for y in (0..grid.height() as i32 - 1).rev() {
            for x in 0..grid.width() as i32 {
                let at = Coord::new(x, y);
                if Self::is_loose_dirt(grid, at) && grid.is(at.below(), TileKind::Empty) {
                    moves.push(Self::move_dirt(grid, at, at.below()));
                    changed = true;
                }
            }
        }
        changed
    }

    /// Settle vertically, then slide dirt diagonally into empty cells,
    /// re-settling vertically after every slide, until neither rule moves
    /// anything.
    ///
    /// A cell with dirt above-left and above-right takes the dirt from the left.
    pub fn settle_diagonal(&self, grid: &mut Grid) -> Vec<SettleMove> {
        let mut moves = self.settle_loose(grid);
        for _ in 0..self.max_iterations {
            let mut changed = false;
            for y in 1..grid.height() as i32 {
                for x in 0..grid.width() as i32 {
                    let at = Coord::new(x, y);
                    if let Some(source) = Self::diagonal_source(grid, at) {
                        moves.push(Self::move_dirt(grid, source, at));
                        moves.extend(self.settle_loose(grid));
                        changed = true;
                    }
                }
            }
            if !changed {
                return moves;
            }
        }
        warn!(passes = self.max_iterations, "diagonal settling hit the pass limit");
        moves
    }

    /// Perform the next single settle move, vertical moves first.
    ///
    /// Calling this until it returns `None` reaches the same kind of
    /// resting state as [`SupportSimulator::settle_diagonal`], one step at
    /// a time, so a driver can animate between steps.
    pub fn settle_step(&self, grid: &mut Grid) -> Option<SettleMove> {
        let width = grid.width() as i32;
        let height = grid.height() as i32;
        for y in (0..height - 1).rev() {
            for x in 0..width {
                let at = Coord::new(x, y);
                if Self::is_loose_dirt(grid, at) && grid.is(at.below(), TileKind::Empty) {
                    return Some(Self::move_dirt(grid, at, at.below()));
                }
            }
        }
        for y in 1..height {
            for x in 0..width {
                let at = Coord::new(x, y);
                if let Some(source) = Self::diagonal_source(grid, at) {
                    return Some(Self::move_dirt(grid, source, at));
                }
            }
        }
        None
    }

    /// Run [`SupportSimulator::settle_step`] until nothing moves and
    /// return the moves in the order they happened.
    pub fn settle(&self, grid: &mut Grid) -> Vec<SettleMove> {
        let budget = self.step_budget(grid);
        let mut moves = Vec::new();
        while let Some(mv) = self.settle_step(grid) {
            moves.push(mv);
            if moves.len() >= budget {
                warn!(budget, "settling hit the step limit");
                break;
            }
        }
        moves
    }

    /// Upper bound on [`SupportSimulator::settle_step`] calls for one settle.
    pub fn step_budget(&self, grid: &Grid) -> usize {
        self.max_iterations * grid.width() * grid.height()
    }

    fn diagonal_source(grid: &Grid, at: Coord) -> Option<Coord> {
        if !grid.is(at, TileKind::Empty) {
            return None;
        }
        [at.offset(-1, -1), at.offset(1, -1)]
            .into_iter()
            .find(|source| Self::is_loose_dirt(grid, *source))
    }

    fn move_dirt(grid: &mut Grid, from: Coord, to: Coord) -> SettleMove {
        grid.set(to, TileKind::Dirt);
        grid.set(from, TileKind::Empty);
        SettleMove { from, to }
    }
}
