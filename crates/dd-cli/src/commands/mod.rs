pub mod generate;
pub mod play;
pub mod survey;

use std::path::Path;

use colored::{ColoredString, Colorize};

use dd_core::{Coord, GameConfig, Grid, TileKind};

/// Read the game constants from `path` (or use the defaults) and apply
/// the seed override.
pub fn load_config(seed: Option<u64>, path: Option<&Path>) -> Result<GameConfig, String> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            GameConfig::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Draw the mine with colours, the player as `@` when given.
fn render_grid(grid: &Grid, player: Option<Coord>) -> String {
    let mut out = String::new();
    for y in 0..grid.height() as i32 {
        out.push_str("  ");
        for x in 0..grid.width() as i32 {
            let at = Coord::new(x, y);
            if player == Some(at) {
                out.push_str(&"@".bold().bright_white().to_string());
                continue;
            }
            let tile = grid.tile(at).unwrap_or(TileKind::Sky);
            let mut cell = paint(tile);
            if grid.timer(at).is_some() {
                cell = cell.on_red();
            }
            out.push_str(&cell.to_string());
        }
        out.push('\n');
    }
    out
}

fn paint(tile: TileKind) -> ColoredString {
    let symbol = tile.symbol().to_string();
    match tile {
        TileKind::Sky => symbol.bright_blue(),
        TileKind::Empty => symbol.dimmed(),
        TileKind::Stone => symbol.white(),
        TileKind::Dirt => symbol.yellow(),
        TileKind::Iron => symbol.bright_white().bold(),
        TileKind::Copper => symbol.bright_red().bold(),
        TileKind::Gold => symbol.bright_yellow().bold(),
        TileKind::Coal => symbol.bright_black().bold(),
        TileKind::Ladder => symbol.cyan(),
        TileKind::Shoring => symbol.magenta(),
        TileKind::Dynamite => symbol.red().bold(),
    }
}
