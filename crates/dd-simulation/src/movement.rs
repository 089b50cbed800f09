//! Player movement and falling.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use dd_core::{Coord, DigResult, TileKind};

use crate::context::GameContext;
use crate::event::GameEventKind;
use crate::mining::MiningEngine;

/// A direction the player can push in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards x = 0.
    Left,
    /// Away from x = 0.
    Right,
    /// Towards the sky.
    Up,
    /// Deeper.
    Down,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    /// The neighbour of `at` in this direction.
    pub fn step(self, at: Coord) -> Coord {
        match self {
            Self::Left => at.left(),
            Self::Right => at.right(),
            Self::Up => at.above(),
            Self::Down => at.below(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        };
        f.write_str(name)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "left" => Ok(Self::Left),
            "d" | "right" => Ok(Self::Right),
            "w" | "up" => Ok(Self::Up),
            "s" | "down" => Ok(Self::Down),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// What a push in some direction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The player ended up at a new cell.
    Moved(Coord),
    /// The player dug out a tile instead of moving.
    Mined(TileKind),
    /// Nothing happened.
    Blocked,
}

/// Push the player one step in `direction`.
///
/// Walking into a solid tile digs it. Up and down only move the player
/// along ladders; otherwise they dig. Stepping sideways off a ledge falls
/// unless a ladder is involved. Standing in shoring blocks digging up or
/// down.
pub fn try_move(
    ctx: &mut GameContext<'_>,
    mining: &MiningEngine,
    direction: Direction,
) -> DigResult<MoveOutcome> {
    let from = ctx.player.position;
    let target = direction.step(from);
    let Some(target_tile) = ctx.grid.tile(target) else {
        return Ok(MoveOutcome::Blocked);
    };
    let current = ctx.grid.tile(from).unwrap_or(TileKind::Sky);

    match direction {
        Direction::Left | Direction::Right => {
            if target_tile.is_passable() {
                walk(ctx, target);
                if current != TileKind::Ladder && target_tile != TileKind::Ladder {
                    fall(ctx);
                }
                return Ok(MoveOutcome::Moved(ctx.player.position));
            }
            dig(ctx, mining, target)
        }
        Direction::Up => {
            if current == TileKind::Ladder || target_tile == TileKind::Ladder {
                if target_tile.is_passable() {
                    walk(ctx, target);
                    return Ok(MoveOutcome::Moved(target));
                }
                return dig(ctx, mining, target);
            }
            if current == TileKind::Shoring {
                return Ok(MoveOutcome::Blocked);
            }
            dig(ctx, mining, target)
        }
        Direction::Down => {
            if current == TileKind::Ladder || target_tile == TileKind::Ladder {
                if target_tile.is_passable() {
                    walk(ctx, target);
                    return Ok(MoveOutcome::Moved(target));
                }
                return dig(ctx, mining, target);
            }
            if target_tile.is_passable() {
                return Ok(match fall(ctx) {
                    0 => MoveOutcome::Blocked,
                    _ => MoveOutcome::Moved(ctx.player.position),
                });
            }
            if current == TileKind::Shoring {
                return Ok(MoveOutcome::Blocked);
            }
            dig(ctx, mining, target)
        }
    }
}

/// Drop the player down through open space. Returns the distance fallen.
///
/// Ladders catch the player. A fall longer than the configured safe
/// distance sends the player back to the surface.
pub fn fall(ctx: &mut GameContext<'_>) -> i32 {
    let from = ctx.player.position;
    let mut landing = from;
    loop {
        let below = landing.below();
        if ctx.grid.is(landing, TileKind::Ladder) || ctx.grid.is(below, TileKind::Ladder) {
            break;
        }
        match ctx.grid.tile(below) {
            Some(TileKind::Empty | TileKind::Sky) => landing = below,
            _ => break,
        }
    }

    let distance = landing.y - from.y;
    if distance == 0 {
        return 0;
    }
    if distance > ctx.config.max_safe_fall {
        warn!(distance, "player fell too far");
        ctx.player
            .reset_to_surface(ctx.grid, ctx.config.surface_height);
        ctx.emit(
            GameEventKind::PlayerFellTooFar { distance },
            format!("Fell {distance} tiles and had to be hauled back to the surface"),
        );
    } else {
        ctx.player.position = landing;
        ctx.emit(
            GameEventKind::PlayerFell { from, to: landing },
            format!("Fell from {from} to {landing}"),
        );
    }
    distance
}

fn walk(ctx: &mut GameContext<'_>, to: Coord) {
    ctx.player.position = to;
    ctx.emit(GameEventKind::PlayerMoved { to }, format!("Moved to {to}"));
}

fn dig(ctx: &mut GameContext<'_>, mining: &MiningEngine, at: Coord) -> DigResult<MoveOutcome> {
    Ok(match mining.mine(ctx, at)? {
        Some(tile) => MoveOutcome::Mined(tile),
        None => MoveOutcome::Blocked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Fixture;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    fn push(fx: &mut Fixture, direction: Direction) -> MoveOutcome {
        let mining = MiningEngine::new(&fx.config);
        try_move(&mut fx.ctx(), &mining, direction).unwrap()
    }

    #[test]
    fn parses_keys_and_names() {
        assert_eq!("a".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!("RIGHT".parse::<Direction>(), Ok(Direction::Right));
        assert_eq!("w".parse::<Direction>(), Ok(Direction::Up));
        assert!("x".parse::<Direction>().is_err());
        for d in Direction::ALL {
            assert_eq!(d.to_string().parse::<Direction>(), Ok(d));
        }
    }

    #[test]
    fn walks_along_the_surface() {
        let mut fx = Fixture::new("~~~\n###").with_player(0, 0);
        assert_eq!(push(&mut fx, Direction::Right), MoveOutcome::Moved(c(1, 0)));
        assert_eq!(push(&mut fx, Direction::Left), MoveOutcome::Moved(c(0, 0)));
        assert_eq!(push(&mut fx, Direction::Left), MoveOutcome::Blocked);
    }

    #[test]
    fn bumping_into_rock_digs_it() {
        let mut fx = Fixture::new("~g\n##").with_player(0, 0);
        assert_eq!(
            push(&mut fx, Direction::Right),
            MoveOutcome::Mined(TileKind::Gold)
        );
        assert_eq!(fx.player.position, c(0, 0));
        assert_eq!(fx.economy.money(), 100);
    }

    #[test]
    fn digging_down_drops_the_player() {
        let mut fx = Fixture::new("~\n:\n#").with_player(0, 0);
        assert_eq!(
            push(&mut fx, Direction::Down),
            MoveOutcome::Mined(TileKind::Dirt)
        );
        assert_eq!(fx.player.position, c(0, 1));
    }

    #[test]
    fn short_fall_lands() {
        let mut fx = Fixture::new("~~\n#.\n#.\n##").with_player(0, 0);
        assert_eq!(push(&mut fx, Direction::Right), MoveOutcome::Moved(c(1, 2)));
        assert!(fx.has_event(|k| matches!(k, GameEventKind::PlayerFell { .. })));
    }

    #[test]
    fn long_fall_resets_to_surface() {
        let mut fx = Fixture::new("~~\n:.\n#.\n#.\n##").with_player(0, 0);
        push(&mut fx, Direction::Right);
        assert_eq!(fx.player.position, c(0, 0));
        assert!(fx.has_event(|k| matches!(k, GameEventKind::PlayerFellTooFar { distance: 3 })));
    }

    #[test]
    fn ladders_catch_and_carry() {
        let mut fx = Fixture::new("~~\n#|\n#|\n#.\n##").with_player(0, 0);
        // The ladder below stops the fall.
        assert_eq!(push(&mut fx, Direction::Right), MoveOutcome::Moved(c(1, 0)));
        assert_eq!(push(&mut fx, Direction::Down), MoveOutcome::Moved(c(1, 1)));
        assert_eq!(push(&mut fx, Direction::Down), MoveOutcome::Moved(c(1, 2)));
        assert_eq!(push(&mut fx, Direction::Down), MoveOutcome::Moved(c(1, 3)));
        assert_eq!(push(&mut fx, Direction::Up), MoveOutcome::Moved(c(1, 2)));
        assert_eq!(push(&mut fx, Direction::Up), MoveOutcome::Moved(c(1, 1)));
    }

    #[test]
    fn up_without_ladder_digs() {
        let mut fx = Fixture::new("#\n.\n#").with_player(0, 1);
        assert_eq!(
            push(&mut fx, Direction::Up),
            MoveOutcome::Mined(TileKind::Stone)
        );
        assert_eq!(fx.player.position, c(0, 1));
    }

    #[test]
    fn shoring_blocks_vertical_digging() {
        let mut fx = Fixture::new("#\n=\n#").with_player(0, 1);
        assert_eq!(push(&mut fx, Direction::Up), MoveOutcome::Blocked);
        assert_eq!(push(&mut fx, Direction::Down), MoveOutcome::Blocked);
        assert_eq!(fx.grid.count(TileKind::Stone), 2);
    }

    #[test]
    fn down_over_a_gap_falls() {
        let mut fx = Fixture::new("=\n.\n#").with_player(0, 0);
        assert_eq!(push(&mut fx, Direction::Down), MoveOutcome::Moved(c(0, 1)));
    }
}
