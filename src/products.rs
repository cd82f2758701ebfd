//! Products
//!
//! Identifiers for the products and variants a cart line refers to. The engine never looks
//! products up; prices arrive already resolved on each cart line.

use std::fmt;

use serde::Deserialize;

/// Product identifier, as used by the storefront catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new product id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Variant identifier (shade, length, size...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    /// Create a new variant id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A product, optionally narrowed to one variant.
///
/// This is the unit of stock the reservation ledger counts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StockKey {
    /// Product
    pub product: ProductId,

    /// Variant, if the cart line names one
    pub variant: Option<VariantId>,
}

impl StockKey {
    /// Create a new stock key.
    pub fn new(product: ProductId, variant: Option<VariantId>) -> Self {
        Self { product, variant }
    }

    /// Stock key for a product without a variant.
    pub fn product(product: impl Into<ProductId>) -> Self {
        Self::new(product.into(), None)
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}/{variant}", self.product),
            None => write!(f, "{}", self.product),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_ids_order_lexicographically() {
        let mut ids = vec![
            ProductId::from("cocochoco-shampoo-gold"),
            ProductId::from("10"),
            ProductId::from("2"),
        ];

        ids.sort();

        assert_eq!(
            ids.iter().map(ProductId::as_str).collect::<Vec<_>>(),
            vec!["10", "2", "cocochoco-shampoo-gold"]
        );
    }

    #[test]
    fn stock_key_display_includes_variant() {
        let plain = StockKey::product("bt-lips-bruna");
        let pinned = StockKey::new("1".into(), Some(VariantId::from("60cm")));

        assert_eq!(plain.to_string(), "bt-lips-bruna");
        assert_eq!(pinned.to_string(), "1/60cm");
    }
}
