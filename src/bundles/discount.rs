//! Bundle discount rules

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};

use crate::products::ProductId;

/// The discount a complete bundle grants.
///
/// Each shape only exposes its own fields, so a rule can't be half percentage and half
/// fixed amount.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountRule<'a> {
    /// Percentage off the matched subtotal (e.g. "15% off the kit").
    Percentage {
        /// Fraction of the matched subtotal to take off
        percent: Percentage,

        /// Total matched units needed before the rule is earned
        min_quantity: Option<u32>,

        /// Upper bound on the discount amount
        max_discount: Option<Money<'a, Currency>>,
    },

    /// Fixed amount off the matched subtotal, never more than the subtotal itself.
    Fixed(Money<'a, Currency>),

    /// Every group of `buy + get` matched units grants `get` units free.
    BuyXGetY {
        /// Units paid for in each group
        buy: u32,

        /// Units free in each group
        get: u32,

        /// Product the free units must be drawn from; the cheapest units otherwise
        apply_to: Option<ProductId>,
    },
}

impl<'a> DiscountRule<'a> {
    /// Plain percentage rule without a minimum quantity or cap.
    pub fn percentage(percent: Percentage) -> Self {
        DiscountRule::Percentage {
            percent,
            min_quantity: None,
            max_discount: None,
        }
    }

    /// Buy-X-get-Y rule that frees the cheapest units.
    pub fn buy_x_get_y(buy: u32, get: u32) -> Self {
        DiscountRule::BuyXGetY {
            buy,
            get,
            apply_to: None,
        }
    }

    /// Units in one buy-X-get-Y group, if this is such a rule.
    pub fn group_size(&self) -> Option<u32> {
        match self {
            DiscountRule::BuyXGetY { buy, get, .. } => Some(buy.saturating_add(*get)),
            DiscountRule::Percentage { .. } | DiscountRule::Fixed(_) => None,
        }
    }

    /// The money amount carried by the rule, if any.
    pub(crate) fn amount(&self) -> Option<&Money<'a, Currency>> {
        match self {
            DiscountRule::Percentage { max_discount, .. } => max_discount.as_ref(),
            DiscountRule::Fixed(amount) => Some(amount),
            DiscountRule::BuyXGetY { .. } => None,
        }
    }
}
