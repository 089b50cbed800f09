use serde::{Deserialize, Serialize};

use crate::error::{DigError, DigResult};

/// Money, today's mining progress and the day counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Economy {
    money: u64,
    mined_today: u32,
    day: u32,
}

impl Default for Economy {
    fn default() -> Self {
        Self::new()
    }
}

impl Economy {
    /// A fresh economy: no money, nothing mined, day 1.
    pub fn new() -> Self {
        Self::with_money(0)
    }

    /// Start with some money in hand.
    pub fn with_money(money: u64) -> Self {
        Self {
            money,
            mined_today: 0,
            day: 1,
        }
    }

    /// Money held.
    pub fn money(&self) -> u64 {
        self.money
    }

    /// Non-dirt tiles mined today.
    pub fn mined_today(&self) -> u32 {
        self.mined_today
    }

    /// Current day, starting at 1.
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Add money from mined ore.
    pub fn credit(&mut self, amount: u64) {
        self.money = self.money.saturating_add(amount);
    }

    /// Whether `amount` is affordable.
    pub fn can_afford(&self, amount: u64) -> bool {
        self.money >= amount
    }

    /// Pay `amount`, or fail without touching the balance.
    pub fn try_spend(&mut self, amount: u64) -> DigResult<()> {
        if !self.can_afford(amount) {
            return Err(DigError::InsufficientFunds {
                needed: amount,
                available: self.money,
            });
        }
        self.money -= amount;
        Ok(())
    }

    /// Count one more mined tile toward today's quota.
    pub fn record_mined(&mut self) {
        self.mined_today += 1;
    }

    /// Whether today's quota has been met.
    pub fn quota_reached(&self, quota: u32) -> bool {
        self.mined_today >= quota
    }

    /// Set today's mined count directly.
    pub fn set_mined_today(&mut self, mined: u32) {
        self.mined_today = mined;
    }

    /// Move to the next day and reset today's progress.
    pub fn start_new_day(&mut self) {
        self.day += 1;
        self.mined_today = 0;
    }
}
