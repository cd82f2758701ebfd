//! Slot Matcher
//!
//! Fills one bundle's slots from the unreserved part of the cart stock. The matcher
//! works on its own copy of the ledger: it never commits anything, so the allocation
//! engine decides whether a match is kept.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};

use crate::{
    bundles::{Bundle, BundleSlot},
    cart::{Stock, StockLine},
    ledger::ReservationLedger,
    products::{ProductId, StockKey, VariantId},
};

/// Units of one stock line consumed by one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotConsumption<'a> {
    /// Slot being filled
    pub slot: &'a BundleSlot,

    /// Declaration index of the slot in its bundle
    pub slot_index: usize,

    /// Product consumed; the slot's primary product or one of its alternatives
    pub product_id: ProductId,

    /// Variant consumed
    pub variant_id: Option<VariantId>,

    /// Units consumed
    pub quantity: u32,

    /// Price of one consumed unit
    pub unit_price: Money<'a, Currency>,
}

impl SlotConsumption<'_> {
    /// Ledger key of the consumed stock line.
    pub fn stock_key(&self) -> StockKey {
        StockKey::new(self.product_id.clone(), self.variant_id.clone())
    }

    /// Consumed quantity times unit price, in minor units.
    pub fn total_minor(&self) -> i64 {
        self.unit_price
            .to_minor_units()
            .saturating_mul(i64::from(self.quantity))
    }
}

/// A slot the cart did not fill entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingSlot<'a> {
    /// Slot left short
    pub slot: &'a BundleSlot,

    /// Declaration index of the slot in its bundle
    pub slot_index: usize,

    /// Units still needed
    pub missing: u32,
}

/// Outcome of matching one bundle against the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'a> {
    bundle: &'a Bundle<'a>,
    matched: Vec<SlotConsumption<'a>>,
    missing: Vec<MissingSlot<'a>>,
    complete: bool,
    completion_percent: Decimal,
    matched_quantity: u32,
    subtotal: Money<'a, Currency>,
}

impl<'a> MatchResult<'a> {
    /// Bundle that was matched
    pub fn bundle(&self) -> &'a Bundle<'a> {
        self.bundle
    }

    /// Consumed stock, one entry per slot and stock line.
    pub fn matched_slots(&self) -> &[SlotConsumption<'a>] {
        &self.matched
    }

    /// Slots, required or optional, that were not filled entirely.
    pub fn missing_slots(&self) -> &[MissingSlot<'a>] {
        &self.missing
    }

    /// True when every required slot is full and the quantity threshold is met.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Completion in percent points (0-100, two decimal places).
    pub fn completion_percent(&self) -> Decimal {
        self.completion_percent
    }

    /// Total units consumed across slots.
    pub fn matched_quantity(&self) -> u32 {
        self.matched_quantity
    }

    /// Sum of unit price times consumed quantity.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Units consumed from stock lines of one product.
    pub fn quantity_of(&self, product: &ProductId) -> u32 {
        self.matched
            .iter()
            .filter(|consumption| &consumption.product_id == product)
            .fold(0, |total, consumption| total.saturating_add(consumption.quantity))
    }
}

/// Match a bundle's slots against the stock still free in the ledger.
///
/// Required slots are filled before optional ones. For every unit still needed, the
/// candidate stock lines accepted by the slot are ranked:
///
/// 1. the slot's primary product before its alternatives
/// 2. lines that can cover the remaining need alone before those that cannot
/// 3. among covering lines the smallest available quantity, among the others the largest
/// 4. product id, then variant id
///
/// A slot may be filled from several lines. No unit fills two slots of the bundle.
pub fn match_bundle<'a>(
    bundle: &'a Bundle<'a>,
    stock: &Stock<'a>,
    ledger: &ReservationLedger,
) -> MatchResult<'a> {
    let mut tentative = ledger.clone();
    let mut matched: Vec<SlotConsumption<'a>> = Vec::new();
    let mut missing: Vec<MissingSlot<'a>> = Vec::new();
    let mut required_filled: u32 = 0;

    for (slot_index, slot) in bundle.slots_in_match_order() {
        let filled = fill_slot(slot, slot_index, stock, &mut tentative, &mut matched);

        if slot.is_required() {
            required_filled = required_filled.saturating_add(filled);
        }

        if filled < slot.quantity() {
            missing.push(MissingSlot {
                slot,
                slot_index,
                missing: slot.quantity() - filled,
            });
        }
    }

    missing.sort_by_key(|slot| slot.slot_index);

    let matched_quantity = matched
        .iter()
        .fold(0, |total: u32, consumption| total.saturating_add(consumption.quantity));

    let subtotal_minor = matched
        .iter()
        .fold(0, |total: i64, consumption| total.saturating_add(consumption.total_minor()));

    let required_quantity = bundle.required_quantity();
    let threshold = bundle.quantity_threshold().filter(|threshold| *threshold > 0);

    let required_met = required_filled >= required_quantity;
    let threshold_met = threshold.is_none_or(|threshold| matched_quantity >= threshold);

    let mut completion = if required_quantity == 0 {
        Decimal::ONE_HUNDRED
    } else {
        ratio_percent(required_filled, required_quantity)
    };

    if let Some(threshold) = threshold {
        completion = completion.min(ratio_percent(matched_quantity.min(threshold), threshold));
    }

    MatchResult {
        bundle,
        matched,
        missing,
        complete: required_met && threshold_met,
        completion_percent: completion
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        matched_quantity,
        subtotal: Money::from_minor(subtotal_minor, stock.currency()),
    }
}

/// Fill one slot from the stock and return the units it got.
fn fill_slot<'a>(
    slot: &'a BundleSlot,
    slot_index: usize,
    stock: &Stock<'a>,
    ledger: &mut ReservationLedger,
    matched: &mut Vec<SlotConsumption<'a>>,
) -> u32 {
    let mut remaining = slot.quantity();

    while remaining > 0 {
        let Some((line, available)) = best_candidate(slot, remaining, stock, ledger) else {
            break;
        };

        let taken = remaining.min(available);

        ledger.reserve(&line.key, taken);
        remaining -= taken;

        matched.push(SlotConsumption {
            slot,
            slot_index,
            product_id: line.key.product.clone(),
            variant_id: line.key.variant.clone(),
            quantity: taken,
            unit_price: line.unit_price,
        });
    }

    slot.quantity() - remaining
}

fn best_candidate<'s, 'a>(
    slot: &BundleSlot,
    remaining: u32,
    stock: &'s Stock<'a>,
    ledger: &ReservationLedger,
) -> Option<(&'s StockLine<'a>, u32)> {
    stock
        .iter()
        .filter(|line| slot.accepts(&line.key))
        .map(|line| (line, ledger.available(line)))
        .filter(|(_, available)| *available > 0)
        .min_by(|(a, a_available), (b, b_available)| {
            candidate_rank(slot, a, *a_available, remaining)
                .cmp(&candidate_rank(slot, b, *b_available, remaining))
        })
}

fn candidate_rank<'l>(
    slot: &BundleSlot,
    line: &'l StockLine<'_>,
    available: u32,
    remaining: u32,
) -> (bool, bool, u32, &'l ProductId, Option<&'l VariantId>) {
    let covers = available >= remaining;
    let size = if covers { available } else { u32::MAX - available };

    (
        !slot.is_primary(&line.key.product),
        !covers,
        size,
        &line.key.product,
        line.key.variant.as_ref(),
    )
}

fn ratio_percent(part: u32, whole: u32) -> Decimal {
    (Decimal::from(part) * Decimal::ONE_HUNDRED)
        .checked_div(Decimal::from(whole))
        .unwrap_or(Decimal::ZERO)
}
