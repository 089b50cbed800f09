use dd_core::GameConfig;
use dd_simulation::Game;

/// Print a freshly generated mine in its plain text form.
pub fn run(config: GameConfig) -> Result<(), String> {
    let game = Game::new(config).map_err(|e| format!("generation failed: {e}"))?;
    println!("{}", game.grid().render());
    Ok(())
}
