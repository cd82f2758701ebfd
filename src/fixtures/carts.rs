//! Cart Fixtures

use rusty_money::Money;
use serde::Deserialize;

use crate::{
    cart::CartLineItem,
    fixtures::{FixtureError, prices::parse_price},
    products::{ProductId, VariantId},
};

/// Wrapper for a cart in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Cart currency (e.g., "EUR")
    pub currency: String,

    /// Cart lines
    #[serde(default)]
    pub items: Vec<LineItemFixture>,
}

/// Cart line fixture
#[derive(Debug, Deserialize)]
pub struct LineItemFixture {
    /// Product id
    pub product: ProductId,

    /// Variant id
    #[serde(default)]
    pub variant: Option<VariantId>,

    /// Quantity, possibly zero or negative
    pub quantity: i64,

    /// Unit price (e.g., "90.00 EUR"); missing while the price is unresolved
    #[serde(default)]
    pub price: Option<String>,
}

impl TryFrom<LineItemFixture> for CartLineItem<'_> {
    type Error = FixtureError;

    fn try_from(fixture: LineItemFixture) -> Result<Self, Self::Error> {
        let unit_price = fixture
            .price
            .as_deref()
            .map(parse_price)
            .transpose()?
            .map(|(minor_units, currency)| Money::from_minor(minor_units, currency));

        Ok(CartLineItem::with_parts(
            fixture.product,
            fixture.variant,
            fixture.quantity,
            unit_price,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn line_fixture_converts_into_line_item() -> TestResult {
        let yaml = r#"
product: "1"
variant: 60cm
quantity: 2
price: "90.00 EUR"
"#;
        let fixture: LineItemFixture = serde_norway::from_str(yaml)?;
        let item = CartLineItem::try_from(fixture)?;

        assert_eq!(item.product_id().as_str(), "1");
        assert_eq!(item.variant_id().map(VariantId::as_str), Some("60cm"));
        assert_eq!(item.quantity(), 2);
        assert_eq!(item.unit_price(), Some(&Money::from_minor(9000, EUR)));

        Ok(())
    }

    #[test]
    fn line_fixture_without_price_is_unusable() -> TestResult {
        let fixture: LineItemFixture = serde_norway::from_str("product: pam-mascara\nquantity: 1")?;
        let item = CartLineItem::try_from(fixture)?;

        assert!(!item.is_usable());

        Ok(())
    }

    #[test]
    fn line_fixture_rejects_bad_price() -> TestResult {
        let fixture: LineItemFixture =
            serde_norway::from_str("product: pam-mascara\nquantity: 1\nprice: cheap")?;

        assert!(matches!(
            CartLineItem::try_from(fixture),
            Err(FixtureError::InvalidPrice(_))
        ));

        Ok(())
    }
}
