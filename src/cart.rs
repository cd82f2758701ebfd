//! Cart
//!
//! The point-in-time cart snapshot supplied by the cart store. The engine reads it and
//! never changes it.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::products::{ProductId, StockKey, VariantId};

/// Errors related to cart construction or totals.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A line's currency differs from the cart currency (index, line currency, cart currency).
    #[error("Line {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// A line total could not be represented in minor units.
    #[error("Line {0} total overflows the money range")]
    AmountOverflow(usize),
}

/// A single cart line as held by the cart store.
///
/// Quantities are signed and the price is optional, since the cart can pass through such
/// states while a customer edits it. Such lines are ignored rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem<'a> {
    product_id: ProductId,
    variant_id: Option<VariantId>,
    quantity: i64,
    unit_price: Option<Money<'a, Currency>>,
}

impl<'a> CartLineItem<'a> {
    /// Create a new line for a product without a variant.
    pub fn new(
        product_id: impl Into<ProductId>,
        quantity: i64,
        unit_price: Money<'a, Currency>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: None,
            quantity,
            unit_price: Some(unit_price),
        }
    }

    /// Create a line with every field given explicitly.
    pub fn with_parts(
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i64,
        unit_price: Option<Money<'a, Currency>>,
    ) -> Self {
        Self {
            product_id,
            variant_id,
            quantity,
            unit_price,
        }
    }

    /// Pin the line to a variant.
    #[must_use]
    pub fn with_variant(mut self, variant_id: impl Into<VariantId>) -> Self {
        self.variant_id = Some(variant_id.into());
        self
    }

    /// Product of the line
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Variant of the line
    pub fn variant_id(&self) -> Option<&VariantId> {
        self.variant_id.as_ref()
    }

    /// Quantity as supplied by the cart store
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Unit price, if resolved
    pub fn unit_price(&self) -> Option<&Money<'a, Currency>> {
        self.unit_price.as_ref()
    }

    /// The ledger key for this line.
    pub fn stock_key(&self) -> StockKey {
        StockKey::new(self.product_id.clone(), self.variant_id.clone())
    }

    /// True if the line has a positive quantity and a non-negative price.
    pub fn is_usable(&self) -> bool {
        self.quantity > 0
            && self
                .unit_price
                .is_some_and(|price| price.to_minor_units() >= 0)
    }
}

/// Cart snapshot
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    items: Vec<CartLineItem<'a>>,
    currency: &'a Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    #[must_use]
    pub fn new(currency: &'a Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Create a cart with the given lines.
    ///
    /// # Errors
    ///
    /// Returns a `CartError::CurrencyMismatch` if a priced line uses another currency.
    pub fn with_items(
        items: impl Into<Vec<CartLineItem<'a>>>,
        currency: &'a Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();

        items.iter().enumerate().try_for_each(|(i, item)| {
            let Some(price) = item.unit_price() else {
                return Ok(());
            };

            if price.currency() == currency {
                Ok(())
            } else {
                Err(CartError::CurrencyMismatch(
                    i,
                    price.currency().iso_alpha_code,
                    currency.iso_alpha_code,
                ))
            }
        })?;

        Ok(Cart { items, currency })
    }

    /// Sum of quantity x unit price over the usable lines.
    ///
    /// # Errors
    ///
    /// Returns a `CartError::AmountOverflow` if a line total cannot be represented.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, CartError> {
        let mut total: i64 = 0;

        for (i, item) in self.items.iter().enumerate() {
            let Some(price) = item.unit_price().filter(|_| item.is_usable()) else {
                continue;
            };

            total = price
                .to_minor_units()
                .checked_mul(item.quantity())
                .and_then(|line| total.checked_add(line))
                .ok_or(CartError::AmountOverflow(i))?;
        }

        Ok(Money::from_minor(total, self.currency))
    }

    /// Turn the usable lines into stock, one stock line per cart line.
    ///
    /// Lines sharing a key keep their own price. Units of a key are consumed in cart
    /// order, so each line records how many units of its key come before it.
    pub fn stock(&self) -> Stock<'a> {
        let mut lines: Vec<StockLine<'a>> = Vec::new();

        for item in self.items.iter().filter(|item| item.is_usable()) {
            let Some(unit_price) = item.unit_price().copied() else {
                continue;
            };

            let quantity = u32::try_from(item.quantity()).unwrap_or(u32::MAX);
            let key = item.stock_key();

            let preceding = lines
                .iter()
                .filter(|line| line.key == key)
                .fold(0, |total: u32, line| total.saturating_add(line.quantity));

            lines.push(StockLine {
                key,
                quantity,
                preceding,
                unit_price,
            });
        }

        Stock {
            lines,
            currency: self.currency,
        }
    }

    /// Iterate over the lines in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartLineItem<'a>> {
        self.items.iter()
    }

    /// Get the number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }
}

/// One cart line available for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct StockLine<'a> {
    /// Product and variant
    pub key: StockKey,

    /// Units in the cart
    pub quantity: u32,

    /// Units of the same key on earlier stock lines
    pub preceding: u32,

    /// Price of one unit
    pub unit_price: Money<'a, Currency>,
}

/// Usable cart contents in cart order.
#[derive(Debug, Clone)]
pub struct Stock<'a> {
    lines: Vec<StockLine<'a>>,
    currency: &'a Currency,
}

impl<'a> Stock<'a> {
    /// Iterate over the stock lines in cart order.
    pub fn iter(&self) -> impl Iterator<Item = &StockLine<'a>> {
        self.lines.iter()
    }

    /// Units in the cart for a key, across every line.
    pub fn quantity_of(&self, key: &StockKey) -> u32 {
        self.lines
            .iter()
            .filter(|line| &line.key == key)
            .fold(0, |total, line| total.saturating_add(line.quantity))
    }

    /// Currency of the cart the stock came from.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Check if there is nothing to match.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
