use dd_core::{Coord, OreKind, ShopItem, TileKind};

use crate::day_cycle::Phase;

/// What kind of game event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEventKind {
    // Mining
    /// An ore tile was dug out and paid for.
    OreMined {
        /// Where the ore was.
        at: Coord,
        /// Which ore.
        ore: OreKind,
        /// Money credited.
        value: u64,
    },
    /// A non-ore tile was dug out.
    TileMined {
        /// Where the tile was.
        at: Coord,
        /// What it was.
        kind: TileKind,
    },
    /// Today's mining quota was met.
    QuotaReached {
        /// Tiles mined today.
        mined: u32,
    },

    // Shop
    /// Items were bought and placed.
    ItemPlaced {
        /// What was placed.
        item: ShopItem,
        /// How many tiles.
        count: usize,
        /// Total price paid.
        cost: u64,
    },
    /// A stick of dynamite was armed.
    DynamiteArmed {
        /// Where it sits.
        at: Coord,
    },
    /// A stick of dynamite went off.
    DynamiteDetonated {
        /// Blast centre.
        at: Coord,
        /// Tiles destroyed by the blast.
        destroyed: usize,
        /// Money earned from destroyed ore.
        earned: u64,
    },

    // Structure
    /// An unsupported tile started counting down.
    CollapseStarted {
        /// The tile.
        at: Coord,
        /// Ticks until collapse.
        remaining: u32,
    },
    /// A tile's countdown ran out and it crumbled to dirt.
    TileCollapsed {
        /// The tile.
        at: Coord,
        /// What it was before.
        from: TileKind,
    },
    /// A dirt tile fell one step.
    DirtSettled {
        /// Where it was.
        from: Coord,
        /// Where it landed.
        to: Coord,
    },

    // Player
    /// The player moved or climbed.
    PlayerMoved {
        /// New position.
        to: Coord,
    },
    /// The player fell and survived.
    PlayerFell {
        /// Where the fall started.
        from: Coord,
        /// Where the player landed.
        to: Coord,
    },
    /// The player fell further than is survivable and was sent back to the surface.
    PlayerFellTooFar {
        /// Tiles fallen.
        distance: i32,
    },

    // Day cycle
    /// The day cycle moved to another phase.
    PhaseChanged {
        /// Previous phase.
        from: Phase,
        /// New phase.
        to: Phase,
    },
    /// A new day began.
    DayStarted {
        /// The new day number.
        day: u32,
    },
    /// The day advance failed part-way and the game was forced back to mining.
    DayAdvanceRecovered {
        /// What went wrong.
        error: String,
    },
}

impl GameEventKind {
    /// The grid cell this event is about, if any.
    pub fn location(&self) -> Option<Coord> {
        match self {
            Self::OreMined { at, .. }
            | Self::TileMined { at, .. }
            | Self::DynamiteArmed { at }
            | Self::DynamiteDetonated { at, .. }
            | Self::CollapseStarted { at, .. }
            | Self::TileCollapsed { at, .. } => Some(*at),
            Self::DirtSettled { to, .. }
            | Self::PlayerMoved { to }
            | Self::PlayerFell { to, .. } => Some(*to),
            Self::QuotaReached { .. }
            | Self::ItemPlaced { .. }
            | Self::PlayerFellTooFar { .. }
            | Self::PhaseChanged { .. }
            | Self::DayStarted { .. }
            | Self::DayAdvanceRecovered { .. } => None,
        }
    }
}

/// A record of something that happened in the mine.
#[derive(Debug, Clone)]
pub struct GameEvent {
    /// The day it happened on.
    pub day: u32,
    /// What happened.
    pub kind: GameEventKind,
    /// A human-readable description.
    pub description: String,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(day: u32, kind: GameEventKind, description: impl Into<String>) -> Self {
        Self {
            day,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events as the game runs.
///
/// Tracks how many events an observer has already been shown so that
/// [`EventLog::take_unseen`] hands out each event once.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<GameEvent>,
    max_events: usize,
    seen: usize,
}

impl EventLog {
    /// Create a log holding at most `max_events` events (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
            seen: 0,
        }
    }

    /// Append an event, dropping the oldest if the log is full.
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
            self.seen = self.seen.saturating_sub(drain_count);
        }
    }

    /// All retained events.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Events recorded since the previous call.
    pub fn take_unseen(&mut self) -> Vec<GameEvent> {
        let unseen = self.events[self.seen..].to_vec();
        self.seen = self.events.len();
        unseen
    }

    /// Events that happened on `day`.
    pub fn events_on_day(&self, day: u32) -> Vec<&GameEvent> {
        self.events.iter().filter(|e| e.day == day).collect()
    }

    /// Events about the cell `at`.
    pub fn events_at(&self, at: Coord) -> Vec<&GameEvent> {
        self.events
            .iter()
            .filter(|e| e.kind.location() == Some(at))
            .collect()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all events.
    pub fn clear(&mut self) {
        self.events.clear();
        self.seen = 0;
    }
}

/// Receives change notifications from the game.
///
/// A presentation layer implements this to redraw cells and counters;
/// every method has a no-op default.
pub trait GameObserver {
    /// A cell was written and should be redrawn.
    fn on_tile_changed(&mut self, _at: Coord) {}

    /// Money, the mined count or the day changed.
    fn on_economy_changed(&mut self, _economy: &dd_core::Economy) {}

    /// Something noteworthy happened.
    fn on_event(&mut self, _event: &GameEvent) {}
}
