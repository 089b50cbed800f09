//! Procedural terrain: dirt and stone layers, then ore veins.

use rand::Rng;
use tracing::{debug, info};

use dd_core::{Coord, GameConfig, Grid, OreConfig, OreKind, TileKind};

/// Dirt probability added per dirt tile already placed above or to the left.
const NEIGHBOUR_DIRT_BOOST: f64 = 0.2;
/// Chance of a local dirt pocket below the dirt layer.
const DIRT_SPIKE_CHANCE: f64 = 0.05;
/// Dirt probability inside such a pocket.
const DIRT_SPIKE_VALUE: f64 = 0.8;
/// Rows below `max_dirt_depth` that pockets may still reach.
const DIRT_SPIKE_DEPTH: i32 = 3;
/// Fraction of the map height above which veins never start.
const ORE_ZONE_TOP: f64 = 0.4;
/// Random start positions tried per vein before giving up on it.
const VEIN_START_ATTEMPTS: u32 = 100;

/// The cells carved by one vein.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vein {
    /// Ore the vein is made of.
    pub ore: OreKind,
    /// Every cell converted while carving it, start cell first.
    pub cells: Vec<Coord>,
}

/// Builds the starting grid from a [`GameConfig`].
#[derive(Debug)]
pub struct TerrainGenerator<'a> {
    config: &'a GameConfig,
}

impl<'a> TerrainGenerator<'a> {
    /// Create a generator for the given config.
    pub fn new(config: &'a GameConfig) -> Self {
        Self { config }
    }

    /// Generate a complete map: sky, layered dirt and stone, ore veins.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        let mut grid = Grid::new(self.config.width, self.config.height);
        self.fill_layers(&mut grid, rng);
        let veins = self.carve_all_veins(&mut grid, rng);
        grid.drain_changes();
        info!(
            width = grid.width(),
            height = grid.height(),
            veins = veins.len(),
            solid = grid.count_solid(),
            "generated terrain"
        );
        grid
    }

    /// Replace everything at or below the surface with dirt and stone.
    ///
    /// Each column gets a solid dirt cap two to five rows deep. Below it
    /// dirt thins out exponentially with depth, clumps next to dirt that
    /// is already there, and occasionally forms a pocket.
    pub fn fill_layers<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) {
        let surface = self.config.surface_height;
        let height = grid.height() as i32;
        for x in 0..grid.width() as i32 {
            let column_dirt_depth = surface + rng.random_range(2..=5);
            for y in surface..height {
                let at = Coord::new(x, y);
                let kind = if y < column_dirt_depth {
                    TileKind::Dirt
                } else {
                    self.roll_deep_tile(grid, at, column_dirt_depth, rng)
                };
                grid.set(at, kind);
            }
        }
    }

    fn roll_deep_tile<R: Rng + ?Sized>(
        &self,
        grid: &Grid,
        at: Coord,
        column_dirt_depth: i32,
        rng: &mut R,
    ) -> TileKind {
        let depth_below_cap = f64::from(at.y - column_dirt_depth);
        let mut chance = self.config.dirt_decay_rate.powf(depth_below_cap * 0.5);

        let dirt_neighbours = [at.above(), at.left()]
            .into_iter()
            .filter(|n| grid.is(*n, TileKind::Dirt))
            .count();
        chance += NEIGHBOUR_DIRT_BOOST * dirt_neighbours as f64;

        if rng.random_bool(DIRT_SPIKE_CHANCE)
            && at.y < self.config.max_dirt_depth + DIRT_SPIKE_DEPTH
        {
            chance = DIRT_SPIKE_VALUE;
        }

        let dirt_floor = self.config.max_dirt_depth + rng.random_range(0..3);
        if rng.random::<f64>() < chance && at.y < dirt_floor {
            TileKind::Dirt
        } else {
            TileKind::Stone
        }
    }

    /// Carve the configured number of veins for every ore, in config order.
    pub fn carve_all_veins<R: Rng + ?Sized>(&self, grid: &mut Grid, rng: &mut R) -> Vec<Vein> {
        let mut veins = Vec::new();
        for ore in &self.config.ores {
            for _ in 0..ore.vein.count {
                if let Some(vein) = self.carve_vein(grid, ore, rng) {
                    veins.push(vein);
                }
            }
        }
        veins
    }

    /// Carve a single vein. Returns `None` if no start cell was found.
    ///
    /// The vein starts in the lower part of the map and grows by a random
    /// walk. Every cell it converts is orthogonally connected to the start.
    pub fn carve_vein<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid,
        ore: &OreConfig,
        rng: &mut R,
    ) -> Option<Vein> {
        let tile = ore.kind.tile();
        let allow_dirt = ore.vein.allow_in_dirt;
        let start = self.find_vein_start(grid, allow_dirt, rng)?;
        let length = rng.random_range(ore.vein.min_length..=ore.vein.max_length);

        grid.set(start, tile);
        let mut cells = vec![start];
        grow_vein(grid, start, length, tile, allow_dirt, rng, &mut cells);
        connect_diagonals(grid, &mut cells, tile);

        debug!(ore = %ore.kind, %start, cells = cells.len(), "carved vein");
        Some(Vein {
            ore: ore.kind,
            cells,
        })
    }

    fn find_vein_start<R: Rng + ?Sized>(
        &self,
        grid: &Grid,
        allow_dirt: bool,
        rng: &mut R,
    ) -> Option<Coord> {
        let width = grid.width() as i32;
        let height = grid.height() as i32;
        if width == 0 || height == 0 {
            return None;
        }
        let top = ((f64::from(height) * ORE_ZONE_TOP).floor() as i32).min(height - 1);
        (0..VEIN_START_ATTEMPTS)
            .map(|_| Coord::new(rng.random_range(0..width), rng.random_range(top..height)))
            .find(|at| can_host(grid, *at, allow_dirt))
    }
}

/// Whether ore may be placed at `at`.
fn can_host(grid: &Grid, at: Coord, allow_dirt: bool) -> bool {
    match grid.tile(at) {
        Some(TileKind::Stone) => true,
        Some(TileKind::Dirt) => allow_dirt,
        _ => false,
    }
}

/// Random walk from `start`. Steps onto cells that cannot host ore are
/// skipped. A diagonal step also converts the two cells it cuts across,
/// and is only taken when at least one of them is, or can become, ore, so
/// the vein never hangs together by a corner alone.
fn grow_vein<R: Rng + ?Sized>(
    grid: &mut Grid,
    start: Coord,
    length: u32,
    tile: TileKind,
    allow_dirt: bool,
    rng: &mut R,
    cells: &mut Vec<Coord>,
) {
    let mut current = start;
    for _ in 0..length {
        let mut dx = rng.random_range(-1..=1);
        let dy = rng.random_range(-1..=1);
        if dx == 0 && dy == 0 {
            dx = 1;
        }
        let next = current.offset(dx, dy);
        if !can_host(grid, next, allow_dirt) {
            continue;
        }

        if dx != 0 && dy != 0 {
            let connectors = [Coord::new(next.x, current.y), Coord::new(current.x, next.y)];
            let linked = connectors
                .iter()
                .any(|c| grid.is(*c, tile) || can_host(grid, *c, allow_dirt));
            if !linked {
                continue;
            }
            grid.set(next, tile);
            cells.push(next);
            for connector in connectors {
                if can_host(grid, connector, allow_dirt) {
                    grid.set(connector, tile);
                    cells.push(connector);
                }
            }
        } else {
            grid.set(next, tile);
            cells.push(next);
        }
        current = next;
    }
}

/// Where two cells of the vein touch only diagonally, turn one of the
/// stone cells between them into ore.
fn connect_diagonals(grid: &mut Grid, cells: &mut Vec<Coord>, tile: TileKind) {
    let mut added = Vec::new();
    for at in cells.iter() {
        for diagonal in at.diagonals() {
            if !grid.is(diagonal, tile) {
                continue;
            }
            let horizontal = Coord::new(diagonal.x, at.y);
            let vertical = Coord::new(at.x, diagonal.y);
            if grid.is(horizontal, tile) || grid.is(vertical, tile) {
                continue;
            }
            if grid.is(horizontal, TileKind::Stone) {
                grid.set(horizontal, tile);
                added.push(horizontal);
            } else if grid.is(vertical, TileKind::Stone) {
                grid.set(vertical, tile);
                added.push(vertical);
            }
        }
    }
    cells.extend(added);
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};

    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn connected(grid: &Grid, vein: &Vein) -> bool {
        let tile = vein.ore.tile();
        let start = vein.cells[0];
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(at) = queue.pop_front() {
            for next in at.orthogonal() {
                if grid.is(next, tile) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        vein.cells.iter().all(|c| seen.contains(c))
    }

    /// Alternating stone and dirt columns.
    fn striped(width: usize, height: usize) -> Grid {
        let mut grid = Grid::filled(width, height, TileKind::Stone);
        for at in grid.coords().filter(|c| c.x % 2 == 1).collect::<Vec<_>>() {
            grid.set(at, TileKind::Dirt);
        }
        grid
    }

    #[test]
    fn same_seed_same_map() {
        let config = GameConfig::default();
        let generator = TerrainGenerator::new(&config);
        let a = generator.generate(&mut StdRng::seed_from_u64(5));
        let b = generator.generate(&mut StdRng::seed_from_u64(5));
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn generated_map_has_every_ore() {
        let config = GameConfig::default();
        let grid = TerrainGenerator::new(&config).generate(&mut StdRng::seed_from_u64(1));
        for ore in OreKind::ALL {
            assert!(grid.count(ore.tile()) > 0, "no {ore} generated");
        }
        assert_eq!(grid.count(TileKind::Empty), 0);
        assert!(!grid.has_changes());
    }

    #[test]
    fn dirt_cap_below_surface() {
        let config = GameConfig::default();
        let grid = TerrainGenerator::new(&config).generate(&mut StdRng::seed_from_u64(3));
        for x in 0..config.width as i32 {
            for y in config.surface_height..config.surface_height + 2 {
                let tile = grid.tile(Coord::new(x, y)).unwrap();
                assert!(tile == TileKind::Dirt || tile.is_ore(), "{tile} at ({x}, {y})");
            }
        }
    }

    #[test]
    fn vein_gives_up_without_host_rock() {
        let config = GameConfig::default().with_size(8, 8);
        let mut grid = Grid::filled(8, 8, TileKind::Dirt);
        let gold = config.ore_config(OreKind::Gold).unwrap().clone();
        let vein = TerrainGenerator::new(&config).carve_vein(
            &mut grid,
            &gold,
            &mut StdRng::seed_from_u64(0),
        );
        assert!(vein.is_none());
        assert_eq!(grid.count(TileKind::Gold), 0);
    }

    #[test]
    fn vein_starts_in_lower_zone() {
        let config = GameConfig::default().with_size(10, 10);
        let coal = config.ore_config(OreKind::Coal).unwrap().clone();
        for seed in 0..20 {
            let mut grid = Grid::filled(10, 10, TileKind::Stone);
            let vein = TerrainGenerator::new(&config)
                .carve_vein(&mut grid, &coal, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            assert!(vein.cells[0].y >= 4);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn sky_exactly_above_surface(seed in any::<u64>()) {
            let config = GameConfig::default();
            let grid = TerrainGenerator::new(&config).generate(&mut StdRng::seed_from_u64(seed));
            for (at, tile) in grid.cells() {
                prop_assert_eq!(tile == TileKind::Sky, at.y < config.surface_height);
            }
        }

        #[test]
        fn veins_are_orthogonally_connected(seed in any::<u64>()) {
            let config = GameConfig::default();
            let generator = TerrainGenerator::new(&config);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut grid = Grid::new(config.width, config.height);
            generator.fill_layers(&mut grid, &mut rng);
            let veins = generator.carve_all_veins(&mut grid, &mut rng);
            prop_assert!(!veins.is_empty());
            for vein in &veins {
                prop_assert!(connected(&grid, vein), "disconnected {:?}", vein);
            }
        }

        #[test]
        fn veins_only_replace_host_rock(seed in any::<u64>()) {
            let config = GameConfig::default().with_size(12, 12);
            let gold = config.ore_config(OreKind::Gold).unwrap().clone();
            let mut grid = striped(12, 12);
            let before = grid.clone();
            if let Some(vein) = TerrainGenerator::new(&config)
                .carve_vein(&mut grid, &gold, &mut StdRng::seed_from_u64(seed))
            {
                for cell in &vein.cells {
                    prop_assert_eq!(before.tile(*cell), Some(TileKind::Stone));
                }
            }
        }
    }
}
