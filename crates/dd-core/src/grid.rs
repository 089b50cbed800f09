use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::coord::Coord;
use crate::error::{DigError, DigResult};
use crate::tile::TileKind;

/// Why a collapse timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseCause {
    /// Empty space below and no shoring beside. Cleared once support returns.
    Unsupported,
    /// Shaken loose by a nearby blast. Counts down even on a supported tile;
    /// only shoring beside it cancels the countdown.
    Blast,
}

/// Remaining day-advances before a tile turns into dirt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseTimer {
    /// Ticks left. The tile collapses when this reaches zero.
    pub remaining: u32,
    /// What started the countdown.
    pub cause: CollapseCause,
}

/// The mine: a fixed-size grid of tiles plus the sparse per-tile state
/// that hangs off it (collapse timers and armed dynamite).
///
/// Every effective write is queued in a change list that a presentation
/// layer drains to know which cells to redraw.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
    timers: BTreeMap<Coord, CollapseTimer>,
    dynamite: Vec<Coord>,
    changes: VecDeque<Coord>,
}

impl Grid {
    /// Create a grid filled with sky.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, TileKind::Sky)
    }

    /// Create a grid with every cell set to `kind`.
    ///
    /// Filling with [`TileKind::Dynamite`] is not supported; use
    /// [`Grid::arm_dynamite`] for individual sticks.
    pub fn filled(width: usize, height: usize, kind: TileKind) -> Self {
        Self {
            width,
            height,
            tiles: vec![kind; width * height],
            timers: BTreeMap::new(),
            dynamite: Vec::new(),
            changes: VecDeque::new(),
        }
    }

    /// Width in tiles.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether `at` lies inside the grid.
    pub fn in_bounds(&self, at: Coord) -> bool {
        at.x >= 0 && at.y >= 0 && (at.x as usize) < self.width && (at.y as usize) < self.height
    }

    fn index(&self, at: Coord) -> Option<usize> {
        if self.in_bounds(at) {
            Some(at.y as usize * self.width + at.x as usize)
        } else {
            None
        }
    }

    /// The tile at `at`, or [`DigError::OutOfBounds`].
    pub fn get(&self, at: Coord) -> DigResult<TileKind> {
        self.tile(at).ok_or_else(|| DigError::out_of_bounds(at))
    }

    /// The tile at `at`, or `None` outside the grid.
    pub fn tile(&self, at: Coord) -> Option<TileKind> {
        self.index(at).map(|i| self.tiles[i])
    }

    /// Whether the tile at `at` exists and is `kind`.
    pub fn is(&self, at: Coord, kind: TileKind) -> bool {
        self.tile(at) == Some(kind)
    }

    /// Write a tile. Out-of-bounds writes are ignored and return `false`.
    ///
    /// Overwriting dynamite disarms it, and a tile that can no longer
    /// collapse loses its collapse timer.
    pub fn set(&mut self, at: Coord, kind: TileKind) -> bool {
        let Some(i) = self.index(at) else {
            return false;
        };
        let old = self.tiles[i];
        if old == kind {
            return true;
        }
        self.tiles[i] = kind;
        if old == TileKind::Dynamite {
            self.dynamite.retain(|c| *c != at);
        }
        if !kind.is_collapsible() {
            self.timers.remove(&at);
        }
        self.changes.push_back(at);
        true
    }

    /// Write a tile, failing with [`DigError::OutOfBounds`] outside the grid.
    pub fn try_set(&mut self, at: Coord, kind: TileKind) -> DigResult<()> {
        if self.set(at, kind) {
            Ok(())
        } else {
            Err(DigError::out_of_bounds(at))
        }
    }

    /// Number of tiles that are neither sky, empty nor dirt.
    pub fn count_solid(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| !matches!(t, TileKind::Sky | TileKind::Empty | TileKind::Dirt))
            .count()
    }

    /// Number of tiles of one kind.
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|t| **t == kind).count()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, TileKind)> + '_ {
        self.tiles.iter().enumerate().map(|(i, kind)| {
            let x = (i % self.width) as i32;
            let y = (i / self.width) as i32;
            (Coord::new(x, y), *kind)
        })
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..height).flat_map(move |y| (0..width).map(move |x| Coord::new(x, y)))
    }

    // -----------------------------------------------------------------------
    // Collapse timers
    // -----------------------------------------------------------------------

    /// Remaining ticks for the tile at `at`, if it is counting down.
    pub fn timer(&self, at: Coord) -> Option<u32> {
        self.timers.get(&at).map(|t| t.remaining)
    }

    /// The full timer entry for `at`.
    pub fn collapse_timer(&self, at: Coord) -> Option<CollapseTimer> {
        self.timers.get(&at).copied()
    }

    /// Start a countdown unless one already runs. Returns whether a new
    /// timer was started. Only collapsible tiles can carry a timer.
    pub fn start_timer(&mut self, at: Coord, remaining: u32, cause: CollapseCause) -> bool {
        if self.timers.contains_key(&at) || !self.tile(at).is_some_and(TileKind::is_collapsible) {
            return false;
        }
        self.timers.insert(at, CollapseTimer { remaining, cause });
        self.changes.push_back(at);
        true
    }

    /// Drop the timer at `at`. Returns whether one existed.
    pub fn clear_timer(&mut self, at: Coord) -> bool {
        let removed = self.timers.remove(&at).is_some();
        if removed {
            self.changes.push_back(at);
        }
        removed
    }

    /// Count a timer down by one and return what is left.
    pub fn decrement_timer(&mut self, at: Coord) -> Option<u32> {
        let timer = self.timers.get_mut(&at)?;
        timer.remaining = timer.remaining.saturating_sub(1);
        let remaining = timer.remaining;
        self.changes.push_back(at);
        Some(remaining)
    }

    /// Coordinates with a running timer, row-major.
    pub fn timer_coords(&self) -> Vec<Coord> {
        self.timers.keys().copied().collect()
    }

    /// Number of running timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    // -----------------------------------------------------------------------
    // Dynamite
    // -----------------------------------------------------------------------

    /// Place a dynamite tile and remember it as armed.
    pub fn arm_dynamite(&mut self, at: Coord) -> DigResult<()> {
        self.try_set(at, TileKind::Dynamite)?;
        if !self.dynamite.contains(&at) {
            self.dynamite.push(at);
        }
        Ok(())
    }

    /// Armed dynamite, in placement order.
    pub fn dynamite(&self) -> &[Coord] {
        &self.dynamite
    }

    /// Verify that armed dynamite and dynamite tiles agree.
    pub fn check_invariants(&self) -> DigResult<()> {
        for (i, at) in self.dynamite.iter().enumerate() {
            if !self.is(*at, TileKind::Dynamite) {
                return Err(DigError::InvariantViolation(format!(
                    "armed dynamite at {at} sits on {}",
                    self.tile(*at).map_or("nothing".to_string(), |t| t.to_string())
                )));
            }
            if self.dynamite[..i].contains(at) {
                return Err(DigError::InvariantViolation(format!(
                    "dynamite at {at} armed twice"
                )));
            }
        }
        if let Some((at, _)) = self
            .cells()
            .find(|(at, kind)| *kind == TileKind::Dynamite && !self.dynamite.contains(at))
        {
            return Err(DigError::InvariantViolation(format!(
                "dynamite tile at {at} is not armed"
            )));
        }
        Ok(())
    }

    /// Make the armed list agree with the tiles again, treating the tiles
    /// as authoritative: entries on non-dynamite tiles and duplicates are
    /// dropped, and unlisted dynamite tiles are armed in row-major order.
    /// Returns the number of corrections.
    pub fn reconcile_dynamite(&mut self) -> usize {
        let armed = std::mem::take(&mut self.dynamite);
        let mut fixed = 0;
        for at in armed {
            if self.is(at, TileKind::Dynamite) && !self.dynamite.contains(&at) {
                self.dynamite.push(at);
            } else {
                fixed += 1;
            }
        }
        let stray: Vec<Coord> = self
            .cells()
            .filter(|(at, kind)| *kind == TileKind::Dynamite && !self.dynamite.contains(at))
            .map(|(at, _)| at)
            .collect();
        fixed += stray.len();
        self.dynamite.extend(stray);
        fixed
    }

    // -----------------------------------------------------------------------
    // Change tracking
    // -----------------------------------------------------------------------

    /// Take the coordinates written since the last drain, oldest first.
    /// A cell written several times is reported once per write.
    pub fn drain_changes(&mut self) -> Vec<Coord> {
        self.changes.drain(..).collect()
    }

    /// Whether any change is waiting to be drained.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    // -----------------------------------------------------------------------
    // Text form
    // -----------------------------------------------------------------------

    /// One line per row, one [`TileKind::symbol`] per cell.
    pub fn render(&self) -> String {
        self.tiles
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|t| t.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build a grid from the format produced by [`Grid::render`].
    ///
    /// Surrounding whitespace and blank lines are ignored. Dynamite tiles
    /// are armed in row-major order.
    pub fn parse(text: &str) -> DigResult<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut grid = Grid::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(DigError::InvalidConfig(format!(
                    "row {y} has {} tiles, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, symbol) in row.chars().enumerate() {
                let kind = TileKind::from_symbol(symbol).ok_or_else(|| {
                    DigError::InvalidConfig(format!("unknown tile symbol '{symbol}'"))
                })?;
                let at = Coord::new(x as i32, y as i32);
                if kind == TileKind::Dynamite {
                    grid.arm_dynamite(at)?;
                } else {
                    grid.set(at, kind);
                }
            }
        }
        grid.changes.clear();
        Ok(grid)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn new_grid_is_sky() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert!(grid.cells().all(|(_, t)| t == TileKind::Sky));
        assert_eq!(grid.count_solid(), 0);
    }

    #[test]
    fn get_and_set() {
        let mut grid = Grid::new(4, 3);
        assert!(grid.set(c(1, 2), TileKind::Stone));
        assert_eq!(grid.get(c(1, 2)), Ok(TileKind::Stone));
        assert_eq!(grid.drain_changes(), vec![c(1, 2)]);
        // Writing the same value is not a change.
        assert!(grid.set(c(1, 2), TileKind::Stone));
        assert!(!grid.has_changes());
    }

    #[test]
    fn out_of_bounds_rejected() {
        let mut grid = Grid::new(4, 3);
        assert_eq!(
            grid.get(c(-1, 0)),
            Err(DigError::OutOfBounds { x: -1, y: 0 })
        );
        assert!(grid.get(c(4, 0)).is_err());
        assert!(grid.get(c(0, 3)).is_err());
        assert!(!grid.set(c(0, 3), TileKind::Stone));
        assert!(grid.try_set(c(9, 9), TileKind::Stone).is_err());
        assert!(!grid.has_changes());
    }

    #[test]
    fn count_solid_skips_loose_and_open_tiles() {
        let grid = Grid::parse(
            "
            ~~~
            :.#
            gi|
            ",
        )
        .unwrap();
        assert_eq!(grid.count_solid(), 4);
    }

    #[test]
    fn timers_only_on_collapsible_tiles() {
        let mut grid = Grid::parse("#:.").unwrap();
        assert!(grid.start_timer(c(0, 0), 3, CollapseCause::Unsupported));
        assert!(!grid.start_timer(c(0, 0), 5, CollapseCause::Unsupported));
        assert!(!grid.start_timer(c(1, 0), 3, CollapseCause::Unsupported));
        assert!(!grid.start_timer(c(2, 0), 3, CollapseCause::Unsupported));
        assert_eq!(grid.timer(c(0, 0)), Some(3));
        assert_eq!(grid.decrement_timer(c(0, 0)), Some(2));
        assert_eq!(grid.timer_count(), 1);
    }

    #[test]
    fn overwriting_clears_timer() {
        let mut grid = Grid::parse("#").unwrap();
        grid.start_timer(c(0, 0), 3, CollapseCause::Unsupported);
        grid.set(c(0, 0), TileKind::Empty);
        assert_eq!(grid.timer(c(0, 0)), None);
    }

    #[test]
    fn dynamite_set_tracks_tiles() {
        let mut grid = Grid::parse("...").unwrap();
        grid.arm_dynamite(c(2, 0)).unwrap();
        grid.arm_dynamite(c(0, 0)).unwrap();
        assert_eq!(grid.dynamite(), &[c(2, 0), c(0, 0)]);
        assert!(grid.check_invariants().is_ok());

        grid.set(c(2, 0), TileKind::Empty);
        assert_eq!(grid.dynamite(), &[c(0, 0)]);
        assert!(grid.check_invariants().is_ok());
    }

    #[test]
    fn unarmed_dynamite_is_an_invariant_violation() {
        let mut grid = Grid::parse("..").unwrap();
        grid.set(c(1, 0), TileKind::Dynamite);
        assert!(matches!(
            grid.check_invariants(),
            Err(DigError::InvariantViolation(_))
        ));
    }

    #[test]
    fn reconcile_repairs_armed_list() {
        let mut grid = Grid::parse("*..\n..*").unwrap();
        // An unlisted tile, and a listed cell whose tile was swapped behind
        // the grid's back.
        grid.set(c(1, 0), TileKind::Dynamite);
        grid.tiles[3 + 2] = TileKind::Empty;
        assert!(grid.check_invariants().is_err());

        assert_eq!(grid.reconcile_dynamite(), 2);
        assert_eq!(grid.dynamite(), &[c(0, 0), c(1, 0)]);
        assert!(grid.check_invariants().is_ok());
        assert_eq!(grid.reconcile_dynamite(), 0);
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        assert!(Grid::parse("##\n#").is_err());
        assert!(Grid::parse("#?").is_err());
    }

    #[test]
    fn render_small_grid() {
        let mut grid = Grid::filled(5, 3, TileKind::Stone);
        for x in 0..5 {
            grid.set(c(x, 0), TileKind::Sky);
        }
        grid.set(c(2, 1), TileKind::Empty);
        grid.set(c(2, 2), TileKind::Ladder);
        grid.set(c(4, 2), TileKind::Gold);
        insta::assert_snapshot!(grid.render(), @r"
        ~~~~~
        ##.##
        ##|#g
        ");
    }

    #[test]
    fn parse_then_render_is_stable() {
        let text = "~~~~\n:.#*\ngi|=";
        let grid = Grid::parse(text).unwrap();
        assert_eq!(grid.render(), text);
        assert_eq!(grid.dynamite(), &[c(3, 1)]);
        assert!(!grid.has_changes());
    }

    proptest! {
        #[test]
        fn outside_coordinates_never_change_the_grid(x in -50i32..50, y in -50i32..50) {
            let mut grid = Grid::filled(6, 5, TileKind::Stone);
            let at = Coord::new(x, y);
            let inside = (0..6).contains(&x) && (0..5).contains(&y);
            prop_assert_eq!(grid.get(at).is_ok(), inside);
            grid.set(at, TileKind::Empty);
            prop_assert_eq!(grid.count(TileKind::Empty), usize::from(inside));
        }
    }
}
