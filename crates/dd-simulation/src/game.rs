use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info, warn};

use dd_core::{Coord, Economy, GameConfig, Grid, PlayerState, ShopItem};

use crate::command::Command;
use crate::context::GameContext;
use crate::day_cycle::{DayCycleController, DayStep, Phase};
use crate::error::{SimError, SimResult};
use crate::event::{EventLog, GameEventKind, GameObserver};
use crate::mining::MiningEngine;
use crate::movement;
use crate::support::SupportSimulator;
use crate::terrain::TerrainGenerator;

/// Events kept in memory before the oldest are dropped.
const EVENT_LOG_CAPACITY: usize = 10_000;

/// The top-level game.
///
/// Owns the mine, the economy, the player, the event log and the day
/// cycle, and routes [`Command`]s to the engines. A driver feeds it
/// commands, calls [`Game::tick`] periodically and drains notifications
/// with [`Game::flush`].
pub struct Game {
    config: GameConfig,
    grid: Grid,
    economy: Economy,
    player: PlayerState,
    events: EventLog,
    cycle: DayCycleController,
    mining: MiningEngine,
    support: SupportSimulator,
    selected: Option<ShopItem>,
    total_tiles: usize,
    flushed_economy: Option<Economy>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("day", &self.economy.day())
            .field("phase", &self.cycle.phase())
            .field("money", &self.economy.money())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Game {
    /// Start a game on a freshly generated mine.
    pub fn new(config: GameConfig) -> SimResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let grid = TerrainGenerator::new(&config).generate(&mut rng);
        Ok(Self::from_grid(config, grid))
    }

    /// Start a game on an existing mine.
    pub fn from_grid(config: GameConfig, grid: Grid) -> Self {
        let total_tiles = grid.count_solid();
        let mut player = PlayerState::at(Coord::new(0, config.surface_height - 1));
        player.reset_to_surface(&grid, config.surface_height);
        let mut game = Self {
            mining: MiningEngine::new(&config),
            support: SupportSimulator::new(&config),
            config,
            grid,
            economy: Economy::new(),
            player,
            events: EventLog::new(EVENT_LOG_CAPACITY),
            cycle: DayCycleController::new(),
            selected: None,
            total_tiles,
            flushed_economy: None,
        };
        game.tick();
        info!(
            width = game.grid.width(),
            height = game.grid.height(),
            total_tiles,
            "game started"
        );
        game
    }

    /// Apply one command.
    pub fn handle(&mut self, command: Command) -> SimResult<()> {
        match command {
            Command::Move(direction) => {
                if !self.cycle.mining_enabled() {
                    return Err(SimError::MiningDisabled);
                }
                let mut ctx = GameContext {
                    grid: &mut self.grid,
                    economy: &mut self.economy,
                    player: &mut self.player,
                    events: &mut self.events,
                    config: &self.config,
                };
                movement::try_move(&mut ctx, &self.mining, direction)?;
                self.cycle.check_quota(&mut ctx);
            }
            Command::SelectShopItem(item) => {
                self.selected = if self.selected == Some(item) {
                    None
                } else {
                    Some(item)
                };
            }
            Command::PlaceAt(at) => {
                let item = self.shop_item()?;
                let mut ctx = GameContext {
                    grid: &mut self.grid,
                    economy: &mut self.economy,
                    player: &mut self.player,
                    events: &mut self.events,
                    config: &self.config,
                };
                self.mining.place(&mut ctx, item, at)?;
            }
            Command::PlaceRun { from, to } => {
                let item = self.shop_item()?;
                let mut ctx = GameContext {
                    grid: &mut self.grid,
                    economy: &mut self.economy,
                    player: &mut self.player,
                    events: &mut self.events,
                    config: &self.config,
                };
                self.mining.place_run(&mut ctx, item, from, to)?;
            }
            Command::AdvanceDay => {
                self.advance_day()?;
            }
        }
        Ok(())
    }

    fn shop_item(&self) -> SimResult<ShopItem> {
        if !self.cycle.shop_enabled() {
            return Err(SimError::WrongPhase {
                expected: Phase::EndOfDay,
                actual: self.cycle.phase(),
            });
        }
        self.selected.ok_or(SimError::NoItemSelected)
    }

    /// Periodic upkeep: re-evaluate which tiles are losing support.
    pub fn tick(&mut self) {
        let mut ctx = GameContext {
            grid: &mut self.grid,
            economy: &mut self.economy,
            player: &mut self.player,
            events: &mut self.events,
            config: &self.config,
        };
        self.mining.refresh(&mut ctx);
    }

    /// Run the whole day advance and return the steps it took.
    ///
    /// Only valid at the end of a day. A failure part-way is logged and
    /// the game is put back into a playable mining state.
    pub fn advance_day(&mut self) -> SimResult<Vec<DayStep>> {
        self.begin_day_advance()?;
        let mut steps = Vec::new();
        loop {
            let step = self.step_day()?;
            steps.push(step);
            if step == DayStep::Finished {
                return Ok(steps);
            }
        }
    }

    /// Start a day advance to be driven with [`Game::step_day`].
    pub fn begin_day_advance(&mut self) -> SimResult<()> {
        let phase = self.cycle.phase();
        if phase != Phase::EndOfDay {
            return Err(SimError::WrongPhase {
                expected: Phase::EndOfDay,
                actual: phase,
            });
        }
        let mut ctx = GameContext {
            grid: &mut self.grid,
            economy: &mut self.economy,
            player: &mut self.player,
            events: &mut self.events,
            config: &self.config,
        };
        if let Err(err) = self.cycle.begin_advance(&mut ctx) {
            self.recover(err);
        }
        Ok(())
    }

    /// Perform one unit of the running day advance.
    ///
    /// Returns [`DayStep::Finished`] once mining has reopened, including
    /// when a failure forced it open early.
    pub fn step_day(&mut self) -> SimResult<DayStep> {
        if !self.cycle.is_advancing() {
            if self.cycle.phase() == Phase::Mining {
                return Ok(DayStep::Finished);
            }
            return Err(SimError::WrongPhase {
                expected: Phase::EndOfDay,
                actual: self.cycle.phase(),
            });
        }
        let mut ctx = GameContext {
            grid: &mut self.grid,
            economy: &mut self.economy,
            player: &mut self.player,
            events: &mut self.events,
            config: &self.config,
        };
        match self.cycle.step(&mut ctx, &self.mining, &self.support) {
            Ok(step) => Ok(step),
            Err(err) => {
                self.recover(err);
                Ok(DayStep::Finished)
            }
        }
    }

    fn recover(&mut self, err: SimError) {
        error!(error = %err, phase = %self.cycle.phase(), "day advance failed, reopening the mine");
        let mut ctx = GameContext {
            grid: &mut self.grid,
            economy: &mut self.economy,
            player: &mut self.player,
            events: &mut self.events,
            config: &self.config,
        };
        let repaired = ctx.grid.reconcile_dynamite();
        if repaired > 0 {
            warn!(repaired, "repaired dynamite bookkeeping");
        }
        ctx.economy.set_mined_today(0);
        ctx.emit(
            GameEventKind::DayAdvanceRecovered {
                error: err.to_string(),
            },
            format!("The day could not be finished ({err}); mining resumes"),
        );
        self.cycle.force_mining(&mut ctx);
    }

    /// Hand pending tile changes, economy changes and new events to `observer`.
    pub fn flush(&mut self, observer: &mut dyn GameObserver) {
        for at in self.grid.drain_changes() {
            observer.on_tile_changed(at);
        }
        if self.flushed_economy.as_ref() != Some(&self.economy) {
            observer.on_economy_changed(&self.economy);
            self.flushed_economy = Some(self.economy.clone());
        }
        for event in self.events.take_unseen() {
            observer.on_event(&event);
        }
    }

    /// Game constants.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The mine.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct write access to the mine, bypassing the game rules.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Money and counters.
    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    /// Direct write access to the economy, bypassing the game rules.
    pub fn economy_mut(&mut self) -> &mut Economy {
        &mut self.economy
    }

    /// The miner.
    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Everything that has happened so far.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The current phase of the day.
    pub fn phase(&self) -> Phase {
        self.cycle.phase()
    }

    /// Whether the player may move and dig.
    pub fn mining_enabled(&self) -> bool {
        self.cycle.mining_enabled()
    }

    /// Whether shop items may be placed.
    pub fn shop_enabled(&self) -> bool {
        self.cycle.shop_enabled()
    }

    /// The shop item placements will use.
    pub fn selected_item(&self) -> Option<ShopItem> {
        self.selected
    }

    /// Solid tiles in the mine when the game started.
    pub fn total_tiles(&self) -> usize {
        self.total_tiles
    }
}
