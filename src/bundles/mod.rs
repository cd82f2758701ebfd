//! Bundles
//!
//! A bundle ("kit") is a set of product slots plus the discount granted once the cart
//! fills them. Bundles are authored once, loaded into a [`BundleCatalog`] and never
//! mutated; only whether they are active depends on the evaluation instant.
//!
//! [`BundleCatalog`]: crate::catalog::BundleCatalog

use std::fmt;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    products::{ProductId, StockKey, VariantId},
    tags::TagSet,
};

pub mod discount;
pub mod validation;

pub use discount::DiscountRule;
pub use validation::BundleValidationError;

/// Storefront category a bundle is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleCategory {
    /// Hair extensions
    MegaHair,

    /// Straightening and treatments
    Tratamentos,

    /// Make-up
    Maquiagem,

    /// Full care kits
    Completo,

    /// Promotional offers
    Promocional,

    /// Salon products
    Profissional,
}

impl BundleCategory {
    /// Category code as written in catalog files.
    pub fn as_str(self) -> &'static str {
        match self {
            BundleCategory::MegaHair => "MEGA_HAIR",
            BundleCategory::Tratamentos => "TRATAMENTOS",
            BundleCategory::Maquiagem => "MAQUIAGEM",
            BundleCategory::Completo => "COMPLETO",
            BundleCategory::Promocional => "PROMOCIONAL",
            BundleCategory::Profissional => "PROFISSIONAL",
        }
    }
}

impl fmt::Display for BundleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product requirement inside a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleSlot {
    primary: ProductId,
    alternatives: SmallVec<[ProductId; 4]>,
    quantity: u32,
    required: bool,
    variant: Option<VariantId>,
}

impl BundleSlot {
    /// Create a slot that must be filled for the bundle to fire.
    pub fn required(primary: impl Into<ProductId>, quantity: u32) -> Self {
        Self::new(primary.into(), quantity, true)
    }

    /// Create a slot that widens the bundle but does not block it.
    pub fn optional(primary: impl Into<ProductId>, quantity: u32) -> Self {
        Self::new(primary.into(), quantity, false)
    }

    fn new(primary: ProductId, quantity: u32, required: bool) -> Self {
        Self {
            primary,
            alternatives: SmallVec::new(),
            quantity,
            required,
            variant: None,
        }
    }

    /// Accept these products as substitutes for the primary one.
    ///
    /// The primary product and repeated ids are dropped.
    #[must_use]
    pub fn with_alternatives<I, P>(mut self, alternatives: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProductId>,
    {
        for alternative in alternatives {
            let alternative = alternative.into();

            if alternative != self.primary && !self.alternatives.contains(&alternative) {
                self.alternatives.push(alternative);
            }
        }

        self
    }

    /// Only accept one variant of the product.
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<VariantId>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Canonical product for the slot
    pub fn primary(&self) -> &ProductId {
        &self.primary
    }

    /// Substitutes for the primary product
    pub fn alternatives(&self) -> &[ProductId] {
        &self.alternatives
    }

    /// Units needed to fill the slot
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Whether the slot must be filled
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Pinned variant
    pub fn variant(&self) -> Option<&VariantId> {
        self.variant.as_ref()
    }

    /// Check whether a unit of stock can fill this slot.
    pub fn accepts(&self, key: &StockKey) -> bool {
        let product_matches = key.product == self.primary || self.alternatives.contains(&key.product);
        let variant_matches = self
            .variant
            .as_ref()
            .is_none_or(|variant| key.variant.as_ref() == Some(variant));

        product_matches && variant_matches
    }

    /// Check whether a product is this slot's primary product.
    pub fn is_primary(&self, product: &ProductId) -> bool {
        &self.primary == product
    }
}

/// Bundle definition
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle<'a> {
    id: String,
    name: String,
    description: String,
    category: BundleCategory,
    slots: Vec<BundleSlot>,
    discount: DiscountRule<'a>,
    priority: i32,
    is_active: bool,
    start_date: Option<Timestamp>,
    end_date: Option<Timestamp>,
    tags: TagSet,
    min_value: Option<Money<'a, Currency>>,
    max_applications: u32,
    badge: Option<String>,
    slug: Option<String>,
}

impl<'a> Bundle<'a> {
    /// Create an active, unbounded bundle applying at most once per cart.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: BundleCategory,
        slots: Vec<BundleSlot>,
        discount: DiscountRule<'a>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            slots,
            discount,
            priority: 0,
            is_active: true,
            start_date: None,
            end_date: None,
            tags: TagSet::default(),
            min_value: None,
            max_applications: 1,
            badge: None,
            slug: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the priority; lower numbers fire first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Switch the bundle on or off regardless of dates.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Limit the bundle to an activity window. Missing bounds are unbounded.
    #[must_use]
    pub fn with_window(mut self, start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    /// Only fire when the matched subtotal reaches this value.
    #[must_use]
    pub fn with_min_value(mut self, min_value: Money<'a, Currency>) -> Self {
        self.min_value = Some(min_value);
        self
    }

    /// Allow the bundle to fire more than once per cart.
    #[must_use]
    pub fn with_max_applications(mut self, max_applications: u32) -> Self {
        self.max_applications = max_applications;
        self
    }

    /// Set the storefront badge and slug.
    #[must_use]
    pub fn with_listing(mut self, badge: Option<String>, slug: Option<String>) -> Self {
        self.badge = badge;
        self.slug = slug;
        self
    }

    /// Unique bundle id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marketing description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Storefront category
    pub fn category(&self) -> BundleCategory {
        self.category
    }

    /// Slots in declaration order
    pub fn slots(&self) -> &[BundleSlot] {
        &self.slots
    }

    /// Discount rule
    pub fn discount(&self) -> &DiscountRule<'a> {
        &self.discount
    }

    /// Priority; lower fires first
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Activity window start
    pub fn start_date(&self) -> Option<Timestamp> {
        self.start_date
    }

    /// Activity window end
    pub fn end_date(&self) -> Option<Timestamp> {
        self.end_date
    }

    /// Tags
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Minimum matched subtotal
    pub fn min_value(&self) -> Option<&Money<'a, Currency>> {
        self.min_value.as_ref()
    }

    /// Maximum applications per cart
    pub fn max_applications(&self) -> u32 {
        self.max_applications
    }

    /// Storefront badge (e.g. "POUPE 15%")
    pub fn badge(&self) -> Option<&str> {
        self.badge.as_deref()
    }

    /// Storefront slug
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    /// True iff the bundle is switched on and `at` falls inside its window.
    pub fn is_active_at(&self, at: Timestamp) -> bool {
        self.is_active
            && self.start_date.is_none_or(|start| start <= at)
            && self.end_date.is_none_or(|end| at <= end)
    }

    /// Slots with their declaration index, required slots first.
    pub fn slots_in_match_order(&self) -> impl Iterator<Item = (usize, &BundleSlot)> {
        let required = self.slots.iter().enumerate().filter(|(_, slot)| slot.required);
        let optional = self.slots.iter().enumerate().filter(|(_, slot)| !slot.required);

        required.chain(optional)
    }

    /// Total units needed by the required slots.
    pub fn required_quantity(&self) -> u32 {
        self.slots
            .iter()
            .filter(|slot| slot.required)
            .map(BundleSlot::quantity)
            .fold(0, u32::saturating_add)
    }

    /// Total units the slots can take.
    pub fn slot_capacity(&self) -> u32 {
        self.slots
            .iter()
            .map(BundleSlot::quantity)
            .fold(0, u32::saturating_add)
    }

    /// Total matched units the bundle needs on top of filling its required slots.
    ///
    /// `min_quantity` for percentage rules, one full group for buy-X-get-Y and, for
    /// bundles made only of optional slots, every slot filled.
    pub fn quantity_threshold(&self) -> Option<u32> {
        let from_rule = match &self.discount {
            DiscountRule::Percentage { min_quantity, .. } => *min_quantity,
            DiscountRule::BuyXGetY { .. } => self.discount.group_size(),
            DiscountRule::Fixed(_) => None,
        };

        from_rule.or_else(|| (self.required_quantity() == 0).then(|| self.slot_capacity()))
    }
}
