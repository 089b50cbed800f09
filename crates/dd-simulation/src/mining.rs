//! Digging, blasting and shop placement.

use tracing::{debug, info};

use dd_core::grid::CollapseCause;
use dd_core::{Coord, DigError, DigResult, GameConfig, Grid, ShopItem, TileKind};

use crate::context::GameContext;
use crate::event::GameEventKind;
use crate::support::SupportSimulator;

/// Result of one detonation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Detonation {
    /// Tiles removed by the blast, not counting the dynamite itself.
    pub destroyed: usize,
    /// Money credited for ore caught in the blast.
    pub earned: u64,
    /// Outer-ring tiles that started a delayed collapse.
    pub weakened: usize,
}

/// Applies the player's and the day cycle's writes to the mine.
///
/// Every write that can change support is followed by a collapse
/// candidate refresh.
#[derive(Debug, Clone)]
pub struct MiningEngine {
    support: SupportSimulator,
}

impl MiningEngine {
    /// Create an engine for the given configuration.
    pub fn new(config: &GameConfig) -> Self {
        Self {
            support: SupportSimulator::new(config),
        }
    }

    /// Dig out the tile at `at`.
    ///
    /// Returns the tile that was removed, or `None` when there was nothing
    /// to dig. Dynamite is detonated instead of dug.
    pub fn mine(&self, ctx: &mut GameContext<'_>, at: Coord) -> DigResult<Option<TileKind>> {
        let tile = ctx.grid.get(at)?;
        if tile.is_unmineable() {
            return Ok(None);
        }
        if tile == TileKind::Dynamite {
            self.detonate(ctx, at)?;
            return Ok(Some(tile));
        }

        ctx.grid.set(at, TileKind::Empty);
        match tile.ore() {
            Some(ore) => {
                let value = ctx.config.ore_value(ore);
                ctx.economy.credit(value);
                ctx.emit(
                    GameEventKind::OreMined { at, ore, value },
                    format!("Mined {tile} at {at} for ${value}"),
                );
            }
            None => ctx.emit(
                GameEventKind::TileMined { at, kind: tile },
                format!("Dug out {tile} at {at}"),
            ),
        }
        if tile != TileKind::Dirt {
            ctx.economy.record_mined();
        }

        let player = ctx.player.position;
        if at == player.below() && !ctx.grid.is(player, TileKind::Ladder) {
            ctx.player.position = at;
            ctx.emit(
                GameEventKind::PlayerMoved { to: at },
                format!("Dropped into {at}"),
            );
        }

        self.refresh(ctx);
        Ok(Some(tile))
    }

    /// Set off the dynamite at `at`.
    ///
    /// Clears the 3x3 block around it except ladders, shoring and other
    /// dynamite, paying for any ore. In the surrounding ring dirt is
    /// blown away and stone or ore starts a collapse countdown unless
    /// shoring holds it.
    pub fn detonate(&self, ctx: &mut GameContext<'_>, at: Coord) -> DigResult<Detonation> {
        if !ctx.grid.is(at, TileKind::Dynamite) {
            return Err(DigError::InvariantViolation(format!(
                "no dynamite to detonate at {at}"
            )));
        }

        let mut blast = Detonation::default();
        for cell in at.square(2).filter(|c| *c != at) {
            let Some(tile) = ctx.grid.tile(cell) else {
                continue;
            };
            let inner = (cell.x - at.x).abs() <= 1 && (cell.y - at.y).abs() <= 1;
            if inner {
                if tile.is_unmineable() || tile == TileKind::Dynamite {
                    continue;
                }
                ctx.grid.set(cell, TileKind::Empty);
                blast.destroyed += 1;
                if let Some(ore) = tile.ore() {
                    blast.earned += ctx.config.ore_value(ore);
                }
            } else if tile == TileKind::Dirt {
                ctx.grid.set(cell, TileKind::Empty);
                blast.destroyed += 1;
            } else if tile.is_collapsible()
                && !SupportSimulator::has_horizontal_shoring(ctx.grid, cell)
                && ctx.grid.start_timer(
                    cell,
                    ctx.config.initial_collapse_timer,
                    CollapseCause::Blast,
                )
            {
                blast.weakened += 1;
                ctx.emit(
                    GameEventKind::CollapseStarted {
                        at: cell,
                        remaining: ctx.config.initial_collapse_timer,
                    },
                    format!("Blast cracked the {tile} at {cell}"),
                );
            }
        }
        ctx.grid.set(at, TileKind::Empty);
        ctx.economy.credit(blast.earned);

        info!(%at, destroyed = blast.destroyed, earned = blast.earned, "dynamite detonated");
        ctx.emit(
            GameEventKind::DynamiteDetonated {
                at,
                destroyed: blast.destroyed,
                earned: blast.earned,
            },
            format!(
                "Dynamite at {at} destroyed {} tiles worth ${}",
                blast.destroyed, blast.earned
            ),
        );
        self.refresh(ctx);
        Ok(blast)
    }

    /// Whether `item` may stand at `at`, ignoring price and occupancy.
    pub fn can_place(grid: &Grid, config: &GameConfig, item: ShopItem, at: Coord) -> bool {
        if !grid.in_bounds(at) {
            return false;
        }
        let solid_below = grid.tile(at.below()).is_some_and(TileKind::is_solid);
        match item {
            ShopItem::Ladder => {
                at.y >= config.surface_height
                    || grid.is(at.above(), TileKind::Ladder)
                    || grid.is(at.below(), TileKind::Ladder)
                    || solid_below
            }
            // Shoring counts as solid, so stacked shoring is covered.
            ShopItem::Shoring => at.y == grid.height() as i32 - 1 || solid_below,
            ShopItem::Dynamite => {
                let crowded = at
                    .square(2)
                    .any(|c| grid.is(c, TileKind::Dynamite));
                // The target cell is always empty, so it cannot be its own access point.
                !crowded
                    && at.square(2).any(|c| {
                        c != at
                            && at.distance_sq(c) <= 4
                            && grid.tile(c).is_some_and(TileKind::is_access_point)
                    })
            }
        }
    }

    /// Buy one `item` and put it at `at`.
    pub fn place(&self, ctx: &mut GameContext<'_>, item: ShopItem, at: Coord) -> DigResult<()> {
        let tile = ctx.grid.get(at)?;
        if tile != TileKind::Empty {
            return Err(DigError::InvalidPlacement(format!(
                "{item} needs an empty tile, {at} holds {tile}"
            )));
        }
        let price = ctx.config.prices.price(item);
        if !ctx.economy.can_afford(price) {
            return Err(DigError::InsufficientFunds {
                needed: price,
                available: ctx.economy.money(),
            });
        }
        if !Self::can_place(ctx.grid, ctx.config, item, at) {
            return Err(DigError::InvalidPlacement(format!(
                "{item} cannot go at {at}"
            )));
        }

        ctx.economy.try_spend(price)?;
        if item == ShopItem::Dynamite {
            ctx.grid.arm_dynamite(at)?;
            ctx.emit(
                GameEventKind::DynamiteArmed { at },
                format!("Armed dynamite at {at}"),
            );
        } else {
            ctx.grid.set(at, item.tile());
        }
        debug!(%item, %at, price, "item placed");
        ctx.emit(
            GameEventKind::ItemPlaced {
                item,
                count: 1,
                cost: price,
            },
            format!("Placed {item} at {at} for ${price}"),
        );
        self.refresh(ctx);
        Ok(())
    }

    /// Buy and place a run of ladder (one column) or shoring (one row)
    /// between `from` and `to` inclusive.
    ///
    /// Cells that are occupied or where the item cannot stand are
    /// skipped. The whole run is paid for up front; if the money does not
    /// cover it nothing is placed. Returns the number of tiles placed.
    pub fn place_run(
        &self,
        ctx: &mut GameContext<'_>,
        item: ShopItem,
        from: Coord,
        to: Coord,
    ) -> DigResult<usize> {
        ctx.grid.get(from)?;
        ctx.grid.get(to)?;
        let line: Vec<Coord> = match item {
            ShopItem::Ladder if from.x == to.x => (from.y.min(to.y)..=from.y.max(to.y))
                .map(|y| Coord::new(from.x, y))
                .collect(),
            ShopItem::Shoring if from.y == to.y => (from.x.min(to.x)..=from.x.max(to.x))
                .map(|x| Coord::new(x, from.y))
                .collect(),
            ShopItem::Ladder => {
                return Err(DigError::InvalidPlacement(
                    "ladder runs must stay in one column".into(),
                ));
            }
            ShopItem::Shoring => {
                return Err(DigError::InvalidPlacement(
                    "shoring runs must stay in one row".into(),
                ));
            }
            ShopItem::Dynamite => {
                return Err(DigError::InvalidPlacement(
                    "dynamite is placed one stick at a time".into(),
                ));
            }
        };

        let cells: Vec<Coord> = line
            .into_iter()
            .filter(|c| {
                ctx.grid.is(*c, TileKind::Empty) && Self::can_place(ctx.grid, ctx.config, item, *c)
            })
            .collect();
        if cells.is_empty() {
            return Err(DigError::InvalidPlacement(format!(
                "no room for {item} between {from} and {to}"
            )));
        }

        let cost = ctx.config.prices.price(item) * cells.len() as u64;
        ctx.economy.try_spend(cost)?;
        for cell in &cells {
            ctx.grid.set(*cell, item.tile());
        }
        debug!(%item, count = cells.len(), cost, "run placed");
        ctx.emit(
            GameEventKind::ItemPlaced {
                item,
                count: cells.len(),
                cost,
            },
            format!("Placed {} {item} tiles for ${cost}", cells.len()),
        );
        self.refresh(ctx);
        Ok(cells.len())
    }

    /// Re-evaluate collapse candidates after a write.
    pub fn refresh(&self, ctx: &mut GameContext<'_>) {
        let remaining = ctx.config.initial_collapse_timer;
        for at in self.support.refresh_collapse_candidates(ctx.grid) {
            ctx.emit(
                GameEventKind::CollapseStarted { at, remaining },
                format!("The tile at {at} is losing support"),
            );
        }
    }

    /// The support rules this engine refreshes with.
    pub fn support(&self) -> &SupportSimulator {
        &self.support
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Fixture;
    use dd_core::OreKind;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    fn engine(fx: &Fixture) -> MiningEngine {
        MiningEngine::new(&fx.config)
    }

    #[test]
    fn mining_ore_pays_its_value() {
        for (symbol, value) in [("g", 100), ("i", 50), ("c", 30), ("k", 15)] {
            let mut fx = Fixture::new(&format!("~~\n{symbol}#\n##"));
            let engine = engine(&fx);
            engine.mine(&mut fx.ctx(), c(0, 1)).unwrap();
            assert_eq!(fx.economy.money(), value);
            assert_eq!(fx.grid.tile(c(0, 1)), Some(TileKind::Empty));
            assert_eq!(fx.economy.mined_today(), 1);
        }
    }

    #[test]
    fn dirt_is_free_progress() {
        let mut fx = Fixture::new("~\n:\n#");
        let engine = engine(&fx);
        let mined = engine.mine(&mut fx.ctx(), c(0, 1)).unwrap();
        assert_eq!(mined, Some(TileKind::Dirt));
        assert_eq!(fx.economy.money(), 0);
        assert_eq!(fx.economy.mined_today(), 0);
    }

    #[test]
    fn unmineable_tiles_are_left_alone() {
        let mut fx = Fixture::new("~.|=");
        let engine = engine(&fx);
        for x in 0..4 {
            assert_eq!(engine.mine(&mut fx.ctx(), c(x, 0)).unwrap(), None);
        }
        assert!(fx.events.is_empty());
    }

    #[test]
    fn mining_out_of_bounds_is_rejected() {
        let mut fx = Fixture::new("#");
        let engine = engine(&fx);
        let err = engine.mine(&mut fx.ctx(), c(3, 0)).unwrap_err();
        assert_eq!(err, DigError::OutOfBounds { x: 3, y: 0 });
    }

    #[test]
    fn player_drops_into_dug_cell() {
        let mut fx = Fixture::new("~\n#\n#").with_player(0, 0);
        let engine = engine(&fx);
        engine.mine(&mut fx.ctx(), c(0, 1)).unwrap();
        assert_eq!(fx.player.position, c(0, 1));
    }

    #[test]
    fn player_on_ladder_stays_put() {
        let mut fx = Fixture::new("|\n#\n#").with_player(0, 0);
        let engine = engine(&fx);
        engine.mine(&mut fx.ctx(), c(0, 1)).unwrap();
        assert_eq!(fx.player.position, c(0, 0));
    }

    #[test]
    fn digging_under_stone_starts_countdown() {
        let mut fx = Fixture::new("~~~\n###\n###");
        let engine = engine(&fx);
        engine.mine(&mut fx.ctx(), c(1, 2)).unwrap();
        assert_eq!(fx.grid.timer(c(1, 1)), Some(3));
        assert!(fx.has_event(|k| matches!(k, GameEventKind::CollapseStarted { .. })));
    }

    #[test]
    fn ladder_purchase_scenario() {
        let mut fx = Fixture::new("~.~\n###").with_money(10);
        let engine = engine(&fx);
        engine
            .place(&mut fx.ctx(), ShopItem::Ladder, c(1, 0))
            .unwrap();
        assert_eq!(fx.economy.money(), 0);
        assert_eq!(fx.grid.tile(c(1, 0)), Some(TileKind::Ladder));

        fx.grid.set(c(0, 0), TileKind::Empty);
        let err = engine
            .place(&mut fx.ctx(), ShopItem::Ladder, c(0, 0))
            .unwrap_err();
        assert_eq!(
            err,
            DigError::InsufficientFunds {
                needed: 10,
                available: 0
            }
        );
        assert_eq!(fx.grid.tile(c(0, 0)), Some(TileKind::Empty));
    }

    #[test]
    fn placement_needs_an_empty_tile() {
        let mut fx = Fixture::new("#").with_money(500);
        let engine = engine(&fx);
        let err = engine
            .place(&mut fx.ctx(), ShopItem::Shoring, c(0, 0))
            .unwrap_err();
        assert!(matches!(err, DigError::InvalidPlacement(_)));
        assert_eq!(fx.economy.money(), 500);
    }

    #[test]
    fn ladder_rules() {
        let config = GameConfig::default().with_surface_height(2);
        let grid = Grid::parse(
            "
            .|..
            ....
            ...#
            ",
        )
        .unwrap();
        // Hanging from a ladder above.
        assert!(MiningEngine::can_place(&grid, &config, ShopItem::Ladder, c(1, 1)));
        // Resting on stone.
        assert!(MiningEngine::can_place(&grid, &config, ShopItem::Ladder, c(3, 1)));
        // Below the surface line.
        assert!(MiningEngine::can_place(&grid, &config, ShopItem::Ladder, c(0, 2)));
        // Floating in open air above the surface.
        assert!(!MiningEngine::can_place(&grid, &config, ShopItem::Ladder, c(0, 0)));
        assert!(!MiningEngine::can_place(&grid, &config, ShopItem::Ladder, c(9, 9)));
    }

    #[test]
    fn shoring_rules() {
        let config = GameConfig::default();
        let grid = Grid::parse(
            "
            ...
            =..
            .#.
            ",
        )
        .unwrap();
        assert!(MiningEngine::can_place(&grid, &config, ShopItem::Shoring, c(0, 0)));
        assert!(MiningEngine::can_place(&grid, &config, ShopItem::Shoring, c(1, 1)));
        assert!(MiningEngine::can_place(&grid, &config, ShopItem::Shoring, c(2, 2)));
        assert!(!MiningEngine::can_place(&grid, &config, ShopItem::Shoring, c(2, 1)));
    }

    #[test]
    fn dynamite_rules() {
        let config = GameConfig::default();
        let grid = Grid::parse(
            "
            #######
            #.###.#
            #######
            #######
            ######*
            ",
        )
        .unwrap();
        // Next to the pocket at (1, 1).
        assert!(MiningEngine::can_place(&grid, &config, ShopItem::Dynamite, c(2, 1)));
        // Two cells straight away is still within reach.
        assert!(MiningEngine::can_place(&grid, &config, ShopItem::Dynamite, c(1, 3)));
        // (3, 3) is diagonal-two away: sqrt(8) > 2.
        assert!(!MiningEngine::can_place(&grid, &config, ShopItem::Dynamite, c(3, 3)));
        // Reachable from (5, 1) but too close to the stick at (6, 4).
        assert!(!MiningEngine::can_place(&grid, &config, ShopItem::Dynamite, c(5, 2)));
    }

    #[test]
    fn buried_pocket_is_not_reachable() {
        let mut fx = Fixture::new("###\n#.#\n###").with_money(50);
        assert!(!MiningEngine::can_place(
            &fx.grid,
            &fx.config,
            ShopItem::Dynamite,
            c(1, 1)
        ));
        let engine = engine(&fx);
        let err = engine
            .place(&mut fx.ctx(), ShopItem::Dynamite, c(1, 1))
            .unwrap_err();
        assert!(matches!(err, DigError::InvalidPlacement(_)));
        assert_eq!(fx.economy.money(), 50);
        assert!(fx.grid.dynamite().is_empty());
    }

    #[test]
    fn armed_dynamite_is_tracked() {
        let mut fx = Fixture::new("#.\n.#").with_money(50);
        let engine = engine(&fx);
        engine
            .place(&mut fx.ctx(), ShopItem::Dynamite, c(0, 1))
            .unwrap();
        assert_eq!(fx.grid.dynamite(), &[c(0, 1)]);
        assert_eq!(fx.economy.money(), 0);
        assert!(fx.grid.check_invariants().is_ok());
    }

    #[test]
    fn blast_clears_inner_block_and_pays_ore() {
        let mut fx = Fixture::new(
            "
            #####
            #g:i#
            #|*##
            #=#c#
            #####
            ",
        );
        let engine = engine(&fx);
        let blast = engine.detonate(&mut fx.ctx(), c(2, 2)).unwrap();

        assert_eq!(blast.earned, 100 + 50 + 30);
        assert_eq!(fx.economy.money(), 180);
        assert!(fx.grid.dynamite().is_empty());
        insta::assert_snapshot!(fx.grid.render(), @r"
        #####
        #...#
        #|..#
        #=..#
        #####
        ");
        // Ladder and shoring survive, the rest of the ring is cracked stone.
        assert_eq!(blast.destroyed, 6);
        assert!(fx.grid.timer(c(0, 0)).is_some());
        assert_eq!(fx.grid.timer(c(0, 3)), None);
    }

    #[test]
    fn shoring_saves_blast_cracked_stone() {
        let mut fx = Fixture::new(
            "
            ######
            ######
            ##*##.
            ######
            ######
            ",
        )
        .with_money(100);
        let engine = engine(&fx);
        engine.detonate(&mut fx.ctx(), c(2, 2)).unwrap();
        assert_eq!(fx.grid.timer(c(4, 2)), Some(3));

        engine
            .place(&mut fx.ctx(), ShopItem::Shoring, c(5, 2))
            .unwrap();
        assert_eq!(fx.grid.timer(c(4, 2)), None);
        for _ in 0..3 {
            engine.support().advance_timers(&mut fx.grid);
        }
        assert_eq!(fx.grid.tile(c(4, 2)), Some(TileKind::Stone));
    }

    #[test]
    fn blast_spares_other_dynamite() {
        let mut fx = Fixture::new("*:*\n###");
        let engine = engine(&fx);
        engine.detonate(&mut fx.ctx(), c(0, 0)).unwrap();
        assert_eq!(fx.grid.render(), "..*\n..#");
        assert_eq!(fx.grid.dynamite(), &[c(2, 0)]);
    }

    #[test]
    fn outer_ring_dirt_is_blown_away() {
        let mut fx = Fixture::new(
            "
            :::::
            :###:
            :#*#:
            :###:
            :::::
            ",
        );
        let engine = engine(&fx);
        let blast = engine.detonate(&mut fx.ctx(), c(2, 2)).unwrap();
        assert_eq!(blast.destroyed, 24);
        assert_eq!(fx.grid.count(TileKind::Empty), 25);
    }

    #[test]
    fn mining_dynamite_sets_it_off() {
        let mut fx = Fixture::new("k*\n##");
        let engine = engine(&fx);
        engine.mine(&mut fx.ctx(), c(1, 0)).unwrap();
        assert_eq!(fx.economy.money(), 15);
        assert!(fx.has_event(|k| matches!(k, GameEventKind::DynamiteDetonated { .. })));
        assert!(!fx.has_event(|k| matches!(
            k,
            GameEventKind::OreMined {
                ore: OreKind::Coal,
                ..
            }
        )));
    }

    #[test]
    fn detonating_nothing_is_an_invariant_violation() {
        let mut fx = Fixture::new("#");
        let engine = engine(&fx);
        let err = engine.detonate(&mut fx.ctx(), c(0, 0)).unwrap_err();
        assert!(matches!(err, DigError::InvariantViolation(_)));
    }

    #[test]
    fn ladder_run_skips_occupied_cells() {
        let mut fx = Fixture::new(
            "
            ~.~
            ~.~
            ~#~
            ~.~
            ###
            ",
        )
        .with_money(100);
        let engine = engine(&fx);
        let placed = engine
            .place_run(&mut fx.ctx(), ShopItem::Ladder, c(1, 3), c(1, 0))
            .unwrap();
        // (1, 0) is above the surface with nothing under it yet.
        assert_eq!(placed, 2);
        assert_eq!(fx.economy.money(), 80);
        assert_eq!(fx.grid.count(TileKind::Ladder), 2);
        assert_eq!(fx.grid.tile(c(1, 0)), Some(TileKind::Empty));
        assert_eq!(fx.grid.tile(c(1, 2)), Some(TileKind::Stone));
    }

    #[test]
    fn run_is_all_or_nothing() {
        let mut fx = Fixture::new("....\n####").with_money(250);
        let engine = engine(&fx);
        let err = engine
            .place_run(&mut fx.ctx(), ShopItem::Shoring, c(0, 0), c(3, 0))
            .unwrap_err();
        assert_eq!(
            err,
            DigError::InsufficientFunds {
                needed: 400,
                available: 250
            }
        );
        assert_eq!(fx.grid.count(TileKind::Shoring), 0);
        assert_eq!(fx.economy.money(), 250);
    }

    #[test]
    fn runs_must_be_straight() {
        let mut fx = Fixture::new("..\n..").with_money(1000);
        let engine = engine(&fx);
        for item in ShopItem::ALL {
            let err = engine
                .place_run(&mut fx.ctx(), item, c(0, 0), c(1, 1))
                .unwrap_err();
            assert!(matches!(err, DigError::InvalidPlacement(_)), "{item}");
        }
    }
}
