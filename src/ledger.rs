//! Reservation ledger
//!
//! Tracks how many units of each stock key earlier bundle applications have already
//! claimed during one evaluation. Reserved units of a key are taken from its stock
//! lines in cart order.

use rustc_hash::FxHashMap;

use crate::{cart::StockLine, matching::MatchResult, products::StockKey};

/// Reserved units per stock key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationLedger {
    reserved: FxHashMap<StockKey, u32>,
}

impl ReservationLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Units of a key already reserved.
    pub fn reserved(&self, key: &StockKey) -> u32 {
        self.reserved.get(key).copied().unwrap_or(0)
    }

    /// Units of a stock line still free to match.
    ///
    /// A line is only open once the earlier lines of its key are fully reserved.
    pub fn available(&self, line: &StockLine<'_>) -> u32 {
        let reserved = self.reserved(&line.key);

        if reserved < line.preceding {
            return 0;
        }

        line.preceding
            .saturating_add(line.quantity)
            .saturating_sub(reserved)
    }

    /// Reserve units of a key.
    pub fn reserve(&mut self, key: &StockKey, quantity: u32) {
        if quantity == 0 {
            return;
        }

        let reserved = self.reserved.entry(key.clone()).or_insert(0);
        *reserved = reserved.saturating_add(quantity);
    }

    /// Reserve every unit a match consumed.
    pub fn commit(&mut self, result: &MatchResult<'_>) {
        for consumption in result.matched_slots() {
            self.reserve(&consumption.stock_key(), consumption.quantity);
        }
    }

    /// Total units reserved across all keys.
    pub fn total_reserved(&self) -> u32 {
        self.reserved.values().fold(0, |total, units| total.saturating_add(*units))
    }
}
