//! Bundle validation

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::bundles::{Bundle, BundleSlot, DiscountRule};

/// Reasons a bundle definition is rejected from a catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BundleValidationError {
    /// The bundle has no slots and no product to draw free units from.
    #[error("bundle has no slots")]
    EmptySlots,

    /// A slot asks for zero units.
    #[error("slot {slot_index} has a quantity of zero")]
    ZeroSlotQuantity {
        /// Declaration index of the slot
        slot_index: usize,
    },

    /// Percentage rule outside 0-100 %.
    #[error("percentage {0} is outside 0 to 1")]
    PercentageOutOfRange(Decimal),

    /// A money amount on the bundle is negative.
    #[error("amount {0} is negative")]
    NegativeAmount(String),

    /// Buy-X-get-Y rule with a zero `buy` or `get`.
    #[error("buy-x-get-y rule needs a non-zero buy and get")]
    ZeroBuyOrGet,

    /// Buy-X-get-Y group larger than the slots can hold.
    #[error("buy-x-get-y group needs {needed} units, but the slots hold {available}")]
    UnreachableGroup {
        /// Units in one group
        needed: u32,

        /// Units the slots can take
        available: u32,
    },

    /// The bundle may never apply.
    #[error("max applications per cart is zero")]
    ZeroApplications,

    /// The activity window ends before it starts.
    #[error("start date is after end date")]
    InvalidWindow,

    /// Money on the bundle is in another currency than the catalog.
    #[error("bundle uses currency {0}, but catalog has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// Another bundle in the catalog already uses this id.
    #[error("bundle id is already in use")]
    DuplicateId,
}

impl Bundle<'_> {
    /// Check the bundle can be evaluated against carts priced in `currency`.
    ///
    /// # Errors
    ///
    /// Returns the first [`BundleValidationError`] found.
    pub fn validate(&self, currency: &Currency) -> Result<(), BundleValidationError> {
        if self.slots.is_empty() && self.implicit_slot().is_none() {
            return Err(BundleValidationError::EmptySlots);
        }

        if let Some(slot_index) = self.slots.iter().position(|slot| slot.quantity == 0) {
            return Err(BundleValidationError::ZeroSlotQuantity { slot_index });
        }

        match &self.discount {
            DiscountRule::Percentage { percent, .. } => {
                let fraction = *percent * Decimal::ONE;

                if fraction < Decimal::ZERO || fraction > Decimal::ONE {
                    return Err(BundleValidationError::PercentageOutOfRange(fraction));
                }
            }
            DiscountRule::BuyXGetY { buy, get, .. } => {
                if *buy == 0 || *get == 0 {
                    return Err(BundleValidationError::ZeroBuyOrGet);
                }

                let needed = buy.saturating_add(*get);
                let available = self.slot_capacity();

                if !self.slots.is_empty() && available < needed {
                    return Err(BundleValidationError::UnreachableGroup { needed, available });
                }
            }
            DiscountRule::Fixed(_) => {}
        }

        for amount in self.discount.amount().into_iter().chain(self.min_value.as_ref()) {
            check_amount(amount, currency)?;
        }

        if self.max_applications == 0 {
            return Err(BundleValidationError::ZeroApplications);
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            return Err(BundleValidationError::InvalidWindow);
        }

        Ok(())
    }

    /// Replace an empty slot list with the implicit slot of its buy-X-get-Y rule.
    #[must_use]
    pub(crate) fn normalized(mut self) -> Self {
        if self.slots.is_empty()
            && let Some(slot) = self.implicit_slot()
        {
            self.slots.push(slot);
        }

        self
    }

    fn implicit_slot(&self) -> Option<BundleSlot> {
        match &self.discount {
            DiscountRule::BuyXGetY {
                buy,
                get,
                apply_to: Some(product),
            } => Some(BundleSlot::optional(product.clone(), buy.saturating_add(*get))),
            DiscountRule::BuyXGetY { apply_to: None, .. }
            | DiscountRule::Percentage { .. }
            | DiscountRule::Fixed(_) => None,
        }
    }
}

fn check_amount(amount: &Money<'_, Currency>, currency: &Currency) -> Result<(), BundleValidationError> {
    if amount.currency() != currency {
        return Err(BundleValidationError::CurrencyMismatch(
            amount.currency().iso_alpha_code,
            currency.iso_alpha_code,
        ));
    }

    if amount.to_minor_units() < 0 {
        return Err(BundleValidationError::NegativeAmount(amount.to_string()));
    }

    Ok(())
}
