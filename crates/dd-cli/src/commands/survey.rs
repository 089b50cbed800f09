use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table};

use dd_core::{GameConfig, TileKind};
use dd_simulation::Game;

pub fn run(config: GameConfig) -> Result<(), String> {
    let seed = config.seed;
    let game = Game::new(config).map_err(|e| format!("generation failed: {e}"))?;
    let grid = game.grid();

    println!(
        "  {} {}",
        "Survey".bold(),
        format!("({}x{}, seed={seed})", grid.width(), grid.height()).dimmed()
    );
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Tile", "Symbol", "Count", "Value"]);

    let mut total_value = 0;
    for kind in TileKind::ALL {
        let count = grid.count(kind);
        if count == 0 {
            continue;
        }
        let value = kind
            .ore()
            .map(|ore| game.config().ore_value(ore) * count as u64);
        total_value += value.unwrap_or(0);
        table.add_row(vec![
            Cell::new(kind),
            Cell::new(kind.symbol()),
            Cell::new(count),
            Cell::new(value.map_or_else(|| "-".to_string(), |v| format!("${v}"))),
        ]);
    }
    println!("{table}");
    println!();
    println!("  Solid tiles: {}", game.total_tiles());
    println!("  Total ore value: {}", format!("${total_value}").green());
    Ok(())
}
