use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use colored::Colorize;
use tracing::{debug, info};

use dd_core::{Coord, Economy, GameConfig, ShopItem};
use dd_simulation::{Command, DayStep, Direction, Game, GameEvent, GameEventKind, GameObserver};

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Command(Command),
    Status,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(first) = words.first() else {
        return Err("empty command".into());
    };
    let command = match (first.to_ascii_lowercase().as_str(), &words[1..]) {
        ("quit" | "q" | "exit", []) => return Ok(Input::Quit),
        ("status", []) => return Ok(Input::Status),
        ("next", []) => Command::AdvanceDay,
        ("buy", [item]) => Command::SelectShopItem(item.parse::<ShopItem>()?),
        ("place", [x, y]) => Command::PlaceAt(parse_coord(x, y)?),
        ("run", [x1, y1, x2, y2]) => Command::PlaceRun {
            from: parse_coord(x1, y1)?,
            to: parse_coord(x2, y2)?,
        },
        (word, []) => Command::Move(word.parse::<Direction>().map_err(|_| {
            format!("unknown command '{word}' (try a/d/w/s, buy, place, run, next, status, quit)")
        })?),
        (word, _) => return Err(format!("wrong arguments for '{word}'")),
    };
    Ok(Input::Command(command))
}

fn parse_coord(x: &str, y: &str) -> Result<Coord, String> {
    let parse = |s: &str| {
        s.parse::<i32>()
            .map_err(|_| format!("'{s}' is not a coordinate"))
    };
    Ok(Coord::new(parse(x)?, parse(y)?))
}

/// Prints notifications as the game reports them.
struct Printer {
    quota: u32,
}

impl GameObserver for Printer {
    fn on_economy_changed(&mut self, economy: &Economy) {
        println!("  {}", economy_line(economy, self.quota));
    }

    fn on_event(&mut self, event: &GameEvent) {
        let text = match &event.kind {
            GameEventKind::DirtSettled { .. } | GameEventKind::PlayerMoved { .. } => return,
            GameEventKind::OreMined { .. } | GameEventKind::DynamiteDetonated { .. } => {
                event.description.green()
            }
            GameEventKind::CollapseStarted { .. } | GameEventKind::TileCollapsed { .. } => {
                event.description.yellow()
            }
            GameEventKind::PlayerFellTooFar { .. } | GameEventKind::DayAdvanceRecovered { .. } => {
                event.description.red().bold()
            }
            GameEventKind::QuotaReached { .. } | GameEventKind::DayStarted { .. } => {
                event.description.bold()
            }
            _ => event.description.normal(),
        };
        println!("  {text}");
    }
}

fn economy_line(economy: &Economy, quota: u32) -> String {
    format!(
        "Day {} | ${} | mined {}/{}",
        economy.day(),
        economy.money(),
        economy.mined_today(),
        quota
    )
}

fn print_status(game: &Game) {
    let selected = game
        .selected_item()
        .map_or_else(|| "nothing".to_string(), |item| item.to_string());
    println!(
        "  {} | {} | selected: {selected}",
        economy_line(game.economy(), game.config().daily_quota),
        game.phase()
    );
}

fn draw(game: &Game) {
    let player = game.player();
    let at = player.visible.then_some(player.position);
    print!("{}", super::render_grid(game.grid(), at));
}

/// Drive the day advance step by step so the settling can be watched.
fn advance_day(game: &mut Game, printer: &mut Printer, delay: Option<Duration>, quiet: bool) {
    if let Err(e) = game.begin_day_advance() {
        debug!(error = %e, phase = %game.phase(), "day advance refused");
        println!("  {} {e}", "!".red().bold());
        return;
    }
    loop {
        match game.step_day() {
            Ok(DayStep::Finished) => return,
            Ok(DayStep::Settled(_) | DayStep::Detonated { .. }) => {
                if let Some(delay) = delay {
                    game.flush(printer);
                    if !quiet {
                        draw(game);
                    }
                    thread::sleep(delay);
                }
            }
            Ok(_) => {}
            Err(e) => {
                println!("  {} {e}", "!".red().bold());
                return;
            }
        }
    }
}

pub fn run(config: GameConfig, delay_ms: u64, quiet: bool) -> Result<(), String> {
    let quota = config.daily_quota;
    let mut game = Game::new(config).map_err(|e| format!("cannot start the game: {e}"))?;
    let mut printer = Printer { quota };
    let delay = match delay_ms {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    };

    info!(seed = game.config().seed, "session started");
    if !quiet {
        draw(&game);
    }
    game.flush(&mut printer);

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| format!("cannot read input: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_input(&line) {
            Ok(Input::Quit) => break,
            Ok(Input::Status) => {
                print_status(&game);
                continue;
            }
            Ok(Input::Command(Command::AdvanceDay)) => {
                advance_day(&mut game, &mut printer, delay, quiet);
            }
            Ok(Input::Command(command)) => {
                if let Err(e) = game.handle(command) {
                    debug!(?command, error = %e, "command rejected");
                    println!("  {} {e}", "!".red().bold());
                }
            }
            Err(e) => {
                println!("  {} {e}", "?".yellow().bold());
                continue;
            }
        }
        game.flush(&mut printer);
        if !quiet {
            draw(&game);
        }
    }

    println!(
        "  {} day {} with ${}",
        "Finished on".bold(),
        game.economy().day(),
        game.economy().money()
    );
    Ok(())
}
