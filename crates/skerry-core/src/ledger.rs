//! Resource ledgers: bounded multisets of resource units.
//!
//! The bank and every player hand are the same abstraction. Units are only
//! ever moved between ledgers, never created or destroyed mid-game, so for
//! every resource kind the sum over bank plus hands stays constant.

use crate::board::Resource;
use serde::{Deserialize, Serialize};

/// The bank's starting reserve per resource kind.
pub const BANK_RESERVE_PER_KIND: u32 = 19;

/// Counts of each resource kind held by one party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    pub brick: u32,
    pub lumber: u32,
    pub ore: u32,
    pub grain: u32,
    pub wool: u32,
}

impl ResourceLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger with specific amounts
    pub fn with_amounts(brick: u32, lumber: u32, ore: u32, grain: u32, wool: u32) -> Self {
        Self {
            brick,
            lumber,
            ore,
            grain,
            wool,
        }
    }

    /// The bank's starting ledger
    pub fn bank() -> Self {
        Self::with_amounts(
            BANK_RESERVE_PER_KIND,
            BANK_RESERVE_PER_KIND,
            BANK_RESERVE_PER_KIND,
            BANK_RESERVE_PER_KIND,
            BANK_RESERVE_PER_KIND,
        )
    }

    /// A ledger holding a single kind
    pub fn single(kind: Resource, amount: u32) -> Self {
        let mut ledger = Self::new();
        ledger.add(kind, amount);
        ledger
    }

    /// Total number of units across all kinds
    pub fn total(&self) -> u32 {
        self.brick + self.lumber + self.ore + self.grain + self.wool
    }

    /// Whether the ledger holds nothing
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Count of a specific kind
    pub fn get(&self, kind: Resource) -> u32 {
        match kind {
            Resource::Brick => self.brick,
            Resource::Lumber => self.lumber,
            Resource::Ore => self.ore,
            Resource::Grain => self.grain,
            Resource::Wool => self.wool,
        }
    }

    /// Add units of one kind
    pub fn add(&mut self, kind: Resource, amount: u32) {
        match kind {
            Resource::Brick => self.brick += amount,
            Resource::Lumber => self.lumber += amount,
            Resource::Ore => self.ore += amount,
            Resource::Grain => self.grain += amount,
            Resource::Wool => self.wool += amount,
        }
    }

    /// Add every kind of another ledger
    pub fn add_all(&mut self, other: &ResourceLedger) {
        self.brick += other.brick;
        self.lumber += other.lumber;
        self.ore += other.ore;
        self.grain += other.grain;
        self.wool += other.wool;
    }

    /// Whether this ledger covers `cost` in every kind
    pub fn can_afford(&self, cost: &ResourceLedger) -> bool {
        self.brick >= cost.brick
            && self.lumber >= cost.lumber
            && self.ore >= cost.ore
            && self.grain >= cost.grain
            && self.wool >= cost.wool
    }

    /// Remove `cost`, or return false and leave the ledger untouched.
    pub fn try_subtract(&mut self, cost: &ResourceLedger) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.brick -= cost.brick;
        self.lumber -= cost.lumber;
        self.ore -= cost.ore;
        self.grain -= cost.grain;
        self.wool -= cost.wool;
        true
    }

    /// The kind holding the unit at `index` when the multiset is laid out in
    /// the fixed `Resource::ALL` order. Gives weighted-uniform selection when
    /// `index` is drawn uniformly from `0..total()`.
    pub fn kind_at_index(&self, index: u32) -> Option<Resource> {
        let mut remaining = index;
        for kind in Resource::ALL {
            let count = self.get(kind);
            if remaining < count {
                return Some(kind);
            }
            remaining -= count;
        }
        None
    }
}
