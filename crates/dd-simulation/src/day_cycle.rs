//! The quota-gated day loop.

use std::fmt;

use tracing::{info, warn};

use dd_core::Coord;

use crate::context::GameContext;
use crate::error::{SimError, SimResult};
use crate::event::GameEventKind;
use crate::mining::MiningEngine;
use crate::support::{SettleMove, SupportSimulator};

/// Where the day cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The player digs until the quota is met.
    Mining,
    /// The quota is met; the shop is open and armed dynamite waits.
    EndOfDay,
    /// Collapse timers run and loose dirt falls.
    Settling,
    /// The next day is being prepared.
    Shopping,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mining => "mining",
            Self::EndOfDay => "end of day",
            Self::Settling => "settling",
            Self::Shopping => "shopping",
        };
        f.write_str(name)
    }
}

/// One unit of day-advance work, as reported by [`DayCycleController::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStep {
    /// A stick of dynamite went off.
    Detonated {
        /// Where it was.
        at: Coord,
    },
    /// All collapse timers counted down once.
    TimersAdvanced {
        /// Tiles that crumbled to dirt.
        collapsed: usize,
    },
    /// One dirt tile moved.
    Settled(SettleMove),
    /// Day bookkeeping is done for the new day.
    NewDay {
        /// The day that is starting.
        day: u32,
    },
    /// The advance is complete and mining is open again.
    Finished,
}

/// Drives the `Mining -> EndOfDay -> Settling -> Shopping -> Mining` loop.
///
/// The advance from `EndOfDay` back to `Mining` is a sequence of small
/// steps so that a driver can pace or animate it.
#[derive(Debug, Clone)]
pub struct DayCycleController {
    phase: Phase,
    mining_enabled: bool,
    shop_enabled: bool,
    advancing: bool,
    timers_done: bool,
    settle_steps: usize,
}

impl Default for DayCycleController {
    fn default() -> Self {
        Self::new()
    }
}

impl DayCycleController {
    /// A controller at the start of a mining day.
    pub fn new() -> Self {
        Self {
            phase: Phase::Mining,
            mining_enabled: true,
            shop_enabled: false,
            advancing: false,
            timers_done: false,
            settle_steps: 0,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the player may move and dig.
    pub fn mining_enabled(&self) -> bool {
        self.mining_enabled
    }

    /// Whether shop items may be placed.
    pub fn shop_enabled(&self) -> bool {
        self.shop_enabled
    }

    /// Whether a day advance is under way.
    pub fn is_advancing(&self) -> bool {
        self.advancing
    }

    /// End the day if the quota has been met. Returns whether it ended.
    pub fn check_quota(&mut self, ctx: &mut GameContext<'_>) -> bool {
        if self.phase != Phase::Mining || !ctx.economy.quota_reached(ctx.config.daily_quota) {
            return false;
        }
        let mined = ctx.economy.mined_today();
        ctx.emit(
            GameEventKind::QuotaReached { mined },
            format!("Quota met with {mined} tiles mined"),
        );
        self.mining_enabled = false;
        self.shop_enabled = true;
        ctx.player.visible = false;
        self.enter(ctx, Phase::EndOfDay);
        true
    }

    /// Start advancing to the next day. Only valid at the end of a day.
    pub fn begin_advance(&mut self, ctx: &mut GameContext<'_>) -> SimResult<()> {
        if self.phase != Phase::EndOfDay {
            return Err(SimError::WrongPhase {
                expected: Phase::EndOfDay,
                actual: self.phase,
            });
        }
        if !self.advancing {
            ctx.grid.check_invariants()?;
            self.advancing = true;
            self.shop_enabled = false;
            self.timers_done = false;
            self.settle_steps = 0;
        }
        Ok(())
    }

    /// Perform the next unit of day-advance work.
    ///
    /// Armed dynamite goes off one stick per step in the order it was
    /// placed. Then timers advance once, then dirt settles one move per
    /// step, then the new day is prepared and mining reopens.
    pub fn step(
        &mut self,
        ctx: &mut GameContext<'_>,
        mining: &MiningEngine,
        support: &SupportSimulator,
    ) -> SimResult<DayStep> {
        if !self.advancing {
            return Err(SimError::WrongPhase {
                expected: Phase::EndOfDay,
                actual: self.phase,
            });
        }
        match self.phase {
            Phase::EndOfDay => {
                ctx.grid.check_invariants()?;
                if let Some(&at) = ctx.grid.dynamite().first() {
                    mining.detonate(ctx, at)?;
                    return Ok(DayStep::Detonated { at });
                }
                self.enter(ctx, Phase::Settling);
                Ok(self.advance_timers(ctx, support))
            }
            Phase::Settling if !self.timers_done => Ok(self.advance_timers(ctx, support)),
            Phase::Settling => {
                let budget = support.step_budget(ctx.grid);
                if self.settle_steps < budget {
                    if let Some(mv) = support.settle_step(ctx.grid) {
                        self.settle_steps += 1;
                        ctx.emit(
                            GameEventKind::DirtSettled {
                                from: mv.from,
                                to: mv.to,
                            },
                            format!("Dirt fell from {} to {}", mv.from, mv.to),
                        );
                        return Ok(DayStep::Settled(mv));
                    }
                } else {
                    warn!(budget, "settling stopped at the step limit");
                }
                self.enter(ctx, Phase::Shopping);
                Ok(self.start_new_day(ctx, mining))
            }
            Phase::Shopping => {
                self.open_mining(ctx);
                Ok(DayStep::Finished)
            }
            Phase::Mining => Err(SimError::WrongPhase {
                expected: Phase::EndOfDay,
                actual: Phase::Mining,
            }),
        }
    }

    /// Put the game back into a playable mining state no matter where the
    /// advance stopped.
    pub fn force_mining(&mut self, ctx: &mut GameContext<'_>) {
        self.open_mining(ctx);
    }

    fn advance_timers(&mut self, ctx: &mut GameContext<'_>, support: &SupportSimulator) -> DayStep {
        let collapsed = support.advance_timers(ctx.grid);
        for c in &collapsed {
            ctx.emit(
                GameEventKind::TileCollapsed {
                    at: c.at,
                    from: c.from,
                },
                format!("The {} at {} collapsed", c.from, c.at),
            );
        }
        self.timers_done = true;
        DayStep::TimersAdvanced {
            collapsed: collapsed.len(),
        }
    }

    fn start_new_day(&mut self, ctx: &mut GameContext<'_>, mining: &MiningEngine) -> DayStep {
        ctx.economy.start_new_day();
        let day = ctx.economy.day();
        mining.refresh(ctx);
        ctx.player
            .reset_to_surface(ctx.grid, ctx.config.surface_height);
        info!(day, "day started");
        ctx.emit(GameEventKind::DayStarted { day }, format!("Day {day} begins"));
        DayStep::NewDay { day }
    }

    fn open_mining(&mut self, ctx: &mut GameContext<'_>) {
        self.mining_enabled = true;
        self.shop_enabled = false;
        self.advancing = false;
        self.timers_done = false;
        self.settle_steps = 0;
        ctx.player.visible = true;
        self.enter(ctx, Phase::Mining);
    }

    fn enter(&mut self, ctx: &mut GameContext<'_>, to: Phase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        ctx.emit(
            GameEventKind::PhaseChanged { from, to },
            format!("{from} -> {to}"),
        );
    }
}
