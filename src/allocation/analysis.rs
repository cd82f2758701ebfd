//! Analysis results

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

use crate::{
    bundles::Bundle,
    matching::{MissingSlot, SlotConsumption},
    products::StockKey,
};

/// One firing of a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleApplication<'a> {
    /// Bundle applied
    pub bundle: &'a Bundle<'a>,

    /// Cart stock the application reserved
    pub matched_products: Vec<SlotConsumption<'a>>,

    /// Sum of unit price times consumed quantity
    pub original_total: Money<'a, Currency>,

    /// Discount granted
    pub discount_amount: Money<'a, Currency>,

    /// `original_total - discount_amount`
    pub final_total: Money<'a, Currency>,
}

/// Why a partially matched bundle did not fire.
#[derive(Debug, Clone, PartialEq)]
pub enum Shortfall<'a> {
    /// Slots are still missing units.
    MissingSlots,

    /// Every slot matched, but the matched subtotal is below the bundle minimum.
    BelowMinimumValue {
        /// Amount still needed to reach the minimum
        missing: Money<'a, Currency>,
    },
}

/// A bundle the cart has partly filled.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialMatch<'a> {
    /// Bundle matched
    pub bundle: &'a Bundle<'a>,

    /// Stock the bundle would use, given what applied bundles reserved
    pub matched_slots: Vec<SlotConsumption<'a>>,

    /// Slots still short
    pub missing_slots: Vec<MissingSlot<'a>>,

    /// Completion in percent points
    pub completion_percent: Decimal,

    /// What holds the bundle back
    pub shortfall: Shortfall<'a>,
}

/// Outcome of analysing one cart against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CartBundleAnalysis<'a> {
    /// Bundles applied, in the order they fired
    pub applied_bundles: Vec<BundleApplication<'a>>,

    /// Active bundles that never fired but matched something
    pub partial_matches: Vec<PartialMatch<'a>>,

    /// Upsell suggestions, closest to completion first
    pub suggestions: Vec<&'a Bundle<'a>>,

    /// Sum of the applied discounts
    pub total_bundle_discount: Money<'a, Currency>,

    /// Cart subtotal before bundle discounts
    pub original_total: Money<'a, Currency>,

    /// `original_total - total_bundle_discount`, never below zero
    pub final_total: Money<'a, Currency>,
}

impl<'a> CartBundleAnalysis<'a> {
    /// Units of a stock key reserved across every applied bundle.
    pub fn consumed_quantity(&self, key: &StockKey) -> u32 {
        self.applied_bundles
            .iter()
            .flat_map(|application| application.matched_products.iter())
            .filter(|consumption| &consumption.stock_key() == key)
            .fold(0, |total, consumption| total.saturating_add(consumption.quantity))
    }

    /// Number of times a bundle was applied.
    pub fn applications_of(&self, bundle_id: &str) -> usize {
        self.applied_bundles
            .iter()
            .filter(|application| application.bundle.id() == bundle_id)
            .count()
    }

    /// Partial match for a bundle, if any.
    pub fn partial_match(&self, bundle_id: &str) -> Option<&PartialMatch<'a>> {
        self.partial_matches
            .iter()
            .find(|partial| partial.bundle.id() == bundle_id)
    }
}
