//! Fixed-ratio maritime trading between a player and the bank.
//!
//! The rule is a capability the engine receives at construction, so tests can
//! substitute their own implementation.

use crate::ledger::ResourceLedger;
use crate::board::Resource;

/// The default bank exchange rate: give 4, receive 1.
pub const DEFAULT_BANK_RATIO: u32 = 4;

/// Validates and executes exchanges against the bank.
pub trait TradingRule {
    /// Whether `hand` covers `bundle` in every kind.
    fn has_resources(&self, hand: &ResourceLedger, bundle: &ResourceLedger) -> bool;

    /// Execute `give` from the player against `receive` from the bank.
    /// Returns false and mutates nothing when the exchange is malformed or
    /// either side cannot cover its part.
    fn trade_with_bank(
        &self,
        player: &mut ResourceLedger,
        bank: &mut ResourceLedger,
        give: &ResourceLedger,
        receive: &ResourceLedger,
    ) -> bool;
}

/// The standard rule: `give` names exactly one kind in an exact multiple of
/// the ratio, `receive` exactly one different kind at `give / ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRatioTrade {
    ratio: u32,
}

impl FixedRatioTrade {
    pub fn new(ratio: u32) -> Self {
        assert!(ratio > 0, "trade ratio must be positive");
        Self { ratio }
    }

    pub fn ratio(&self) -> u32 {
        self.ratio
    }
}

impl Default for FixedRatioTrade {
    fn default() -> Self {
        Self::new(DEFAULT_BANK_RATIO)
    }
}

impl TradingRule for FixedRatioTrade {
    fn has_resources(&self, hand: &ResourceLedger, bundle: &ResourceLedger) -> bool {
        hand.can_afford(bundle)
    }

    fn trade_with_bank(
        &self,
        player: &mut ResourceLedger,
        bank: &mut ResourceLedger,
        give: &ResourceLedger,
        receive: &ResourceLedger,
    ) -> bool {
        let Some((give_kind, give_amount)) = sole_kind(give) else {
            return false;
        };
        let Some((receive_kind, receive_amount)) = sole_kind(receive) else {
            return false;
        };
        if give_kind == receive_kind
            || give_amount % self.ratio != 0
            || receive_amount != give_amount / self.ratio
        {
            return false;
        }
        if !player.can_afford(give) || !bank.can_afford(receive) {
            return false;
        }

        // Both sides verified above; the exchange is all-or-nothing.
        player.try_subtract(give);
        bank.add(give_kind, give_amount);
        bank.try_subtract(receive);
        player.add(receive_kind, receive_amount);
        true
    }
}

/// The single kind a bundle names, or None when it is empty or mixes kinds.
fn sole_kind(bundle: &ResourceLedger) -> Option<(Resource, u32)> {
    let mut found: Option<(Resource, u32)> = None;
    for kind in Resource::ALL {
        let count = bundle.get(kind);
        if count > 0 {
            if found.is_some() {
                return None;
            }
            found = Some((kind, count));
        }
    }
    found
}
