//! Allocation Engine
//!
//! Runs the Slot Matcher and Discount Calculator over the whole catalog for one cart.
//! Bundles fire in priority order and reserve the stock they consume, so a lower
//! priority bundle only ever sees what is left. The result is a pure function of the
//! cart, the catalog and the evaluation instant.

use std::cmp::Reverse;

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use rusty_money::Money;
use thiserror::Error;
use tracing::debug;

use crate::{
    bundles::{Bundle, BundleCategory},
    cart::{Cart, CartError},
    catalog::BundleCatalog,
    discounts::{DiscountError, calculate_discount},
    ledger::ReservationLedger,
    matching::{MatchResult, match_bundle},
};

mod analysis;

pub use analysis::{BundleApplication, CartBundleAnalysis, PartialMatch, Shortfall};

/// Errors raised while analysing a cart.
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    /// The cart is priced in another currency than the catalog (cart, catalog).
    #[error("cart has currency {0}, but catalog has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// Cart totals could not be computed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A discount could not be computed.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Caller-tunable analysis settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Maximum number of suggestions returned
    pub suggestion_limit: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            suggestion_limit: 5,
        }
    }
}

/// Allocation engine
#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    options: AnalysisOptions,
}

impl AllocationEngine {
    /// Create an engine with the given options.
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> AnalysisOptions {
        self.options
    }

    /// Analyse a cart against the bundles active at `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the cart and catalog currencies differ (`AllocationError::CurrencyMismatch`).
    /// - the cart subtotal overflows (`AllocationError::Cart`).
    /// - a discount cannot be computed (`AllocationError::Discount`).
    #[tracing::instrument(
        name = "analyze",
        skip_all,
        fields(lines = cart.len(), bundles = catalog.len(), at = %at)
    )]
    pub fn analyze<'a>(
        &self,
        cart: &Cart<'a>,
        catalog: &'a BundleCatalog<'a>,
        at: Timestamp,
    ) -> Result<CartBundleAnalysis<'a>, AllocationError> {
        let currency = catalog.currency();

        if cart.currency() != currency {
            return Err(AllocationError::CurrencyMismatch(
                cart.currency().iso_alpha_code,
                currency.iso_alpha_code,
            ));
        }

        let original_total = cart.subtotal()?;
        let stock = cart.stock();
        let active = catalog.active_at(at);

        let mut ledger = ReservationLedger::new();
        let mut applied_bundles: Vec<BundleApplication<'a>> = Vec::new();

        for &bundle in &active {
            for _ in 0..bundle.max_applications() {
                let result = match_bundle(bundle, &stock, &ledger);

                if !result.is_complete() || result.matched_quantity() == 0 {
                    break;
                }

                let original = result.subtotal();

                if below_minimum(bundle, &result) {
                    debug!(bundle_id = bundle.id(), subtotal = %original, "below minimum value");
                    break;
                }

                let discount = calculate_discount(&result, bundle.discount(), original)?;
                let final_total = Money::from_minor(
                    original.to_minor_units() - discount.to_minor_units(),
                    currency,
                );

                ledger.commit(&result);

                debug!(
                    bundle_id = bundle.id(),
                    original = %original,
                    discount = %discount,
                    "applied bundle"
                );

                applied_bundles.push(BundleApplication {
                    bundle,
                    matched_products: result.matched_slots().to_vec(),
                    original_total: original,
                    discount_amount: discount,
                    final_total,
                });
            }
        }

        let fired: FxHashSet<&str> = applied_bundles.iter().map(|a| a.bundle.id()).collect();

        let mut partial_matches: Vec<PartialMatch<'a>> = Vec::new();
        let mut untouched: Vec<&'a Bundle<'a>> = Vec::new();

        for bundle in active.iter().copied().filter(|bundle| !fired.contains(bundle.id())) {
            let result = match_bundle(bundle, &stock, &ledger);

            if result.completion_percent().is_zero() {
                untouched.push(bundle);
            } else {
                partial_matches.push(partial_match(result));
            }
        }

        let suggestions = self.suggestions(&applied_bundles, &partial_matches, untouched);

        let total_bundle_discount = applied_bundles.iter().fold(0, |total: i64, application| {
            total.saturating_add(application.discount_amount.to_minor_units())
        });

        let final_total = original_total
            .to_minor_units()
            .saturating_sub(total_bundle_discount)
            .max(0);

        debug!(
            applied = applied_bundles.len(),
            partial = partial_matches.len(),
            discount = total_bundle_discount,
            "analysis complete"
        );

        Ok(CartBundleAnalysis {
            applied_bundles,
            partial_matches,
            suggestions,
            total_bundle_discount: Money::from_minor(total_bundle_discount, currency),
            original_total,
            final_total: Money::from_minor(final_total, currency),
        })
    }

    /// Rank partial matches, then untouched bundles of categories the cart already
    /// touches, and keep the first `suggestion_limit`.
    fn suggestions<'a>(
        &self,
        applied: &[BundleApplication<'a>],
        partials: &[PartialMatch<'a>],
        mut untouched: Vec<&'a Bundle<'a>>,
    ) -> Vec<&'a Bundle<'a>> {
        let represented: FxHashSet<BundleCategory> = applied
            .iter()
            .map(|application| application.bundle.category())
            .chain(partials.iter().map(|partial| partial.bundle.category()))
            .collect();

        let mut ranked: Vec<&PartialMatch<'a>> = partials.iter().collect();

        ranked.sort_by(|a, b| {
            (Reverse(a.completion_percent), a.bundle.priority(), a.bundle.id()).cmp(&(
                Reverse(b.completion_percent),
                b.bundle.priority(),
                b.bundle.id(),
            ))
        });

        untouched.retain(|bundle| represented.contains(&bundle.category()));

        ranked
            .into_iter()
            .map(|partial| partial.bundle)
            .chain(untouched)
            .take(self.options.suggestion_limit)
            .collect()
    }
}

/// Analyse a cart with the default options.
///
/// # Errors
///
/// See [`AllocationEngine::analyze`].
pub fn analyze<'a>(
    cart: &Cart<'a>,
    catalog: &'a BundleCatalog<'a>,
    at: Timestamp,
) -> Result<CartBundleAnalysis<'a>, AllocationError> {
    AllocationEngine::default().analyze(cart, catalog, at)
}

fn below_minimum(bundle: &Bundle<'_>, result: &MatchResult<'_>) -> bool {
    bundle
        .min_value()
        .is_some_and(|min| result.subtotal().to_minor_units() < min.to_minor_units())
}

fn partial_match(result: MatchResult<'_>) -> PartialMatch<'_> {
    let bundle = result.bundle();

    let shortfall = match bundle.min_value() {
        Some(min) if result.is_complete() && below_minimum(bundle, &result) => {
            Shortfall::BelowMinimumValue {
                missing: Money::from_minor(
                    min.to_minor_units() - result.subtotal().to_minor_units(),
                    result.subtotal().currency(),
                ),
            }
        }
        _ => Shortfall::MissingSlots,
    };

    PartialMatch {
        bundle,
        matched_slots: result.matched_slots().to_vec(),
        missing_slots: result.missing_slots().to_vec(),
        completion_percent: result.completion_percent(),
        shortfall,
    }
}
