//! Bundle Fixtures

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    bundles::{Bundle, BundleCategory, BundleSlot, DiscountRule},
    fixtures::{FixtureError, prices::parse_price},
    products::{ProductId, VariantId},
};

/// Wrapper for a bundle catalog in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Currency every bundle amount is in (e.g., "EUR")
    pub currency: String,

    /// Bundles in declaration order
    pub bundles: Vec<BundleFixture>,
}

/// Bundle Fixture
#[derive(Debug, Deserialize)]
pub struct BundleFixture {
    /// Unique bundle id
    pub id: String,

    /// Display name
    pub name: String,

    /// Marketing description
    #[serde(default)]
    pub description: String,

    /// Storefront category (e.g., `MEGA_HAIR`)
    pub category: BundleCategory,

    /// Product slots
    #[serde(default)]
    pub slots: Vec<SlotFixture>,

    /// Discount rule
    pub discount: DiscountFixtureConfig,

    /// Lower fires first
    #[serde(default)]
    pub priority: i32,

    /// Master switch
    #[serde(default = "default_active")]
    pub active: bool,

    /// Activity window start (RFC 3339)
    #[serde(default)]
    pub start_date: Option<Timestamp>,

    /// Activity window end (RFC 3339)
    #[serde(default)]
    pub end_date: Option<Timestamp>,

    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Minimum matched subtotal (e.g., "200.00 EUR")
    #[serde(default)]
    pub min_value: Option<String>,

    /// Maximum applications per cart
    #[serde(default = "default_max_applications")]
    pub max_applications: u32,

    /// Storefront badge
    #[serde(default)]
    pub badge: Option<String>,

    /// Storefront slug
    #[serde(default)]
    pub slug: Option<String>,
}

/// Slot Fixture
#[derive(Debug, Deserialize)]
pub struct SlotFixture {
    /// Primary product id
    pub product: ProductId,

    /// Substitute product ids
    #[serde(default)]
    pub alternatives: Vec<ProductId>,

    /// Units needed; negative values read as zero and fail validation
    pub quantity: i64,

    /// Whether the slot must be filled
    #[serde(default = "default_required")]
    pub required: bool,

    /// Pinned variant
    #[serde(default)]
    pub variant: Option<VariantId>,
}

/// Discount configuration from YAML fixtures
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountFixtureConfig {
    /// Percentage off the matched subtotal
    Percentage {
        /// Percent points (e.g., 15 for 15%)
        value: f64,

        /// Total matched units required
        #[serde(default)]
        min_quantity: Option<u32>,

        /// Cap on the discount (e.g., "50.00 EUR")
        #[serde(default)]
        max_discount: Option<String>,
    },

    /// Fixed amount off (e.g., "10.00 EUR")
    Fixed {
        /// Amount string
        value: String,
    },

    /// Buy X, get Y free
    BuyXGetY {
        /// Units paid for per group
        buy: u32,

        /// Units free per group
        get: u32,

        /// Product the free units come from
        #[serde(default)]
        apply_to: Option<ProductId>,
    },
}

fn default_active() -> bool {
    true
}

fn default_required() -> bool {
    true
}

fn default_max_applications() -> u32 {
    1
}

impl TryFrom<DiscountFixtureConfig> for DiscountRule<'_> {
    type Error = FixtureError;

    fn try_from(config: DiscountFixtureConfig) -> Result<Self, Self::Error> {
        match config {
            DiscountFixtureConfig::Percentage {
                value,
                min_quantity,
                max_discount,
            } => Ok(DiscountRule::Percentage {
                percent: percent_from_points(value)?,
                min_quantity,
                max_discount: max_discount.as_deref().map(money).transpose()?,
            }),
            DiscountFixtureConfig::Fixed { value } => Ok(DiscountRule::Fixed(money(&value)?)),
            DiscountFixtureConfig::BuyXGetY { buy, get, apply_to } => {
                Ok(DiscountRule::BuyXGetY { buy, get, apply_to })
            }
        }
    }
}

impl TryFrom<BundleFixture> for Bundle<'_> {
    type Error = FixtureError;

    fn try_from(fixture: BundleFixture) -> Result<Self, Self::Error> {
        let slots = fixture.slots.into_iter().map(BundleSlot::from).collect();
        let discount = DiscountRule::try_from(fixture.discount)?;

        let mut bundle = Bundle::new(fixture.id, fixture.name, fixture.category, slots, discount)
            .with_description(fixture.description)
            .with_priority(fixture.priority)
            .with_active(fixture.active)
            .with_window(fixture.start_date, fixture.end_date)
            .with_tags(fixture.tags.iter().collect())
            .with_max_applications(fixture.max_applications)
            .with_listing(fixture.badge, fixture.slug);

        if let Some(min_value) = fixture.min_value {
            bundle = bundle.with_min_value(money(&min_value)?);
        }

        Ok(bundle)
    }
}

impl From<SlotFixture> for BundleSlot {
    fn from(fixture: SlotFixture) -> Self {
        let quantity = u32::try_from(fixture.quantity.max(0)).unwrap_or(u32::MAX);

        let slot = if fixture.required {
            BundleSlot::required(fixture.product, quantity)
        } else {
            BundleSlot::optional(fixture.product, quantity)
        };

        let slot = slot.with_alternatives(fixture.alternatives);

        match fixture.variant {
            Some(variant) => slot.with_variant(variant),
            None => slot,
        }
    }
}

fn money(value: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let (minor_units, currency) = parse_price(value)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Convert percent points (15 for 15%) into a `Percentage`.
fn percent_from_points(points: f64) -> Result<Percentage, FixtureError> {
    let fraction = Decimal::from_f64(points)
        .and_then(|points| points.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| FixtureError::InvalidPercentage(points.to_string()))?;

    Ok(Percentage::from(fraction))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use crate::products::StockKey;

    use super::*;

    const MEGA_HAIR: &str = r#"
id: bundle-mega-hair-care
name: Kit Mega Hair Completo
category: MEGA_HAIR
priority: 1
tags: [mega-hair, Promocao]
badge: POUPE 15%
slots:
  - product: "1"
    alternatives: ["2", "3"]
    quantity: 1
  - product: cocochoco-shampoo-gold
    quantity: 1
    required: false
    variant: 300ml
discount:
  type: percentage
  value: 15
  max_discount: "50.00 EUR"
"#;

    #[test]
    fn bundle_fixture_converts_into_bundle() -> TestResult {
        let fixture: BundleFixture = serde_norway::from_str(MEGA_HAIR)?;
        let bundle = Bundle::try_from(fixture)?;

        assert_eq!(bundle.id(), "bundle-mega-hair-care");
        assert_eq!(bundle.category(), BundleCategory::MegaHair);
        assert_eq!(bundle.priority(), 1);
        assert_eq!(bundle.max_applications(), 1);
        assert!(bundle.tags().contains("promocao"));
        assert_eq!(bundle.badge(), Some("POUPE 15%"));

        let slots = bundle.slots();

        assert_eq!(slots.len(), 2);
        assert!(slots.first().is_some_and(|slot| slot.is_required()));
        assert!(slots.first().is_some_and(|slot| slot.accepts(&StockKey::product("3"))));
        assert!(slots.get(1).is_some_and(|slot| !slot.is_required()));
        assert_eq!(
            slots.get(1).and_then(BundleSlot::variant),
            Some(&VariantId::from("300ml"))
        );

        assert_eq!(
            bundle.discount(),
            &DiscountRule::Percentage {
                percent: Percentage::from(Decimal::new(15, 2)),
                min_quantity: None,
                max_discount: Some(Money::from_minor(5000, EUR)),
            }
        );

        Ok(())
    }

    #[test]
    fn discount_fixture_parses_buy_x_get_y() -> TestResult {
        let yaml = r"
type: buy_x_get_y
buy: 2
get: 1
apply_to: impala-esmalte-vermelho
";
        let config: DiscountFixtureConfig = serde_norway::from_str(yaml)?;
        let rule = DiscountRule::try_from(config)?;

        assert_eq!(
            rule,
            DiscountRule::BuyXGetY {
                buy: 2,
                get: 1,
                apply_to: Some("impala-esmalte-vermelho".into()),
            }
        );

        Ok(())
    }

    #[test]
    fn discount_fixture_parses_fixed_amount() -> TestResult {
        let config: DiscountFixtureConfig = serde_norway::from_str("type: fixed\nvalue: 10.00 EUR")?;

        assert_eq!(
            DiscountRule::try_from(config)?,
            DiscountRule::Fixed(Money::from_minor(1000, EUR))
        );

        Ok(())
    }

    #[test]
    fn discount_fixture_rejects_string_for_percentage() {
        let yaml = "type: percentage\nvalue: fifteen";
        let result: Result<DiscountFixtureConfig, _> = serde_norway::from_str(yaml);

        assert!(result.is_err());
    }

    #[test]
    fn nan_percentage_is_rejected() {
        assert!(matches!(
            percent_from_points(f64::NAN),
            Err(FixtureError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn negative_slot_quantity_reads_as_zero() -> TestResult {
        let fixture: SlotFixture = serde_norway::from_str("product: pam-mascara\nquantity: -2")?;

        assert_eq!(BundleSlot::from(fixture).quantity(), 0);

        Ok(())
    }
}
