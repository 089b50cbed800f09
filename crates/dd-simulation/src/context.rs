use dd_core::{Economy, GameConfig, Grid, PlayerState};

use crate::event::{EventLog, GameEvent, GameEventKind};

/// Mutable view of the game handed to the engines for one action.
///
/// The engines never keep references between calls; they receive the
/// state they act on through this context.
pub struct GameContext<'a> {
    /// The mine.
    pub grid: &'a mut Grid,
    /// Money and counters.
    pub economy: &'a mut Economy,
    /// The miner.
    pub player: &'a mut PlayerState,
    /// Event sink.
    pub events: &'a mut EventLog,
    /// Game constants.
    pub config: &'a GameConfig,
}

impl GameContext<'_> {
    /// Record an event on the current day.
    pub fn emit(&mut self, kind: GameEventKind, description: impl Into<String>) {
        self.events
            .push(GameEvent::new(self.economy.day(), kind, description));
    }
}

/// Owned game state for tests, lent out as a [`GameContext`].
#[cfg(test)]
pub(crate) struct Fixture {
    pub grid: Grid,
    pub economy: Economy,
    pub player: PlayerState,
    pub events: EventLog,
    pub config: GameConfig,
}

#[cfg(test)]
impl Fixture {
    /// A fixture over a parsed map with the surface on row 1.
    pub fn new(map: &str) -> Self {
        Self {
            grid: Grid::parse(map).unwrap(),
            economy: Economy::new(),
            player: PlayerState::at(dd_core::Coord::new(0, 0)),
            events: EventLog::new(0),
            config: GameConfig::default().with_surface_height(1),
        }
    }

    pub fn with_money(mut self, money: u64) -> Self {
        self.economy = Economy::with_money(money);
        self
    }

    pub fn with_player(mut self, x: i32, y: i32) -> Self {
        self.player = PlayerState::at(dd_core::Coord::new(x, y));
        self
    }

    pub fn ctx(&mut self) -> GameContext<'_> {
        GameContext {
            grid: &mut self.grid,
            economy: &mut self.economy,
            player: &mut self.player,
            events: &mut self.events,
            config: &self.config,
        }
    }

    pub fn has_event(&self, pred: impl Fn(&GameEventKind) -> bool) -> bool {
        self.events.events().iter().any(|e| pred(&e.kind))
    }
}
