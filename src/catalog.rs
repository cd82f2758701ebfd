//! Bundle Catalog
//!
//! The validated, read-only set of bundles one storefront deploy ships with. Bundles
//! that fail validation are left out and reported, the rest of the catalog still loads.

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::{SlotMap, new_key_type};
use tracing::warn;

use crate::bundles::{Bundle, BundleCategory, BundleValidationError};

new_key_type! {
    /// Bundle Key
    pub struct BundleKey;
}

/// A bundle left out of the catalog at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogExclusion {
    /// Id of the rejected bundle
    pub bundle_id: String,

    /// Why it was rejected
    pub error: BundleValidationError,
}

/// Bundle catalog
#[derive(Debug)]
pub struct BundleCatalog<'a> {
    bundles: SlotMap<BundleKey, Bundle<'a>>,
    order: Vec<BundleKey>,
    ids: FxHashMap<String, BundleKey>,
    exclusions: Vec<CatalogExclusion>,
    currency: &'a Currency,
}

impl<'a> BundleCatalog<'a> {
    /// Create an empty catalog.
    pub fn new(currency: &'a Currency) -> Self {
        Self {
            bundles: SlotMap::with_key(),
            order: Vec::new(),
            ids: FxHashMap::default(),
            exclusions: Vec::new(),
            currency,
        }
    }

    /// Validate and load bundles, keeping their declaration order.
    ///
    /// Invalid bundles and repeated ids are excluded, logged, and listed in
    /// [`BundleCatalog::exclusions`].
    pub fn load(bundles: impl IntoIterator<Item = Bundle<'a>>, currency: &'a Currency) -> Self {
        let mut catalog = Self::new(currency);

        for bundle in bundles {
            let verdict = if catalog.ids.contains_key(bundle.id()) {
                Err(BundleValidationError::DuplicateId)
            } else {
                bundle.validate(currency)
            };

            match verdict {
                Ok(()) => {
                    let bundle = bundle.normalized();
                    let id = bundle.id().to_string();
                    let key = catalog.bundles.insert(bundle);

                    catalog.ids.insert(id, key);
                    catalog.order.push(key);
                }
                Err(error) => {
                    warn!(bundle_id = bundle.id(), %error, "excluding bundle from catalog");

                    catalog.exclusions.push(CatalogExclusion {
                        bundle_id: bundle.id().to_string(),
                        error,
                    });
                }
            }
        }

        catalog
    }

    /// Currency every bundle amount is in
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Bundles rejected at load time
    pub fn exclusions(&self) -> &[CatalogExclusion] {
        &self.exclusions
    }

    /// Look up a bundle by id, active or not.
    pub fn get(&self, id: &str) -> Option<&Bundle<'a>> {
        self.ids.get(id).and_then(|key| self.bundles.get(*key))
    }

    /// Iterate over all bundles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Bundle<'a>> {
        self.order.iter().filter_map(|key| self.bundles.get(*key))
    }

    /// Number of loaded bundles
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether no bundle loaded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bundles active at `at`, by priority then id.
    pub fn active_at(&self, at: Timestamp) -> Vec<&Bundle<'a>> {
        let mut active: Vec<&Bundle<'a>> = self.iter().filter(|b| b.is_active_at(at)).collect();

        active.sort_by(|a, b| (a.priority(), a.id()).cmp(&(b.priority(), b.id())));

        active
    }

    /// Active bundles in one category.
    pub fn by_category(&self, category: BundleCategory, at: Timestamp) -> Vec<&Bundle<'a>> {
        self.active_at(at)
            .into_iter()
            .filter(|bundle| bundle.category() == category)
            .collect()
    }

    /// Active bundles carrying a tag, ignoring case.
    pub fn by_tag(&self, tag: &str, at: Timestamp) -> Vec<&Bundle<'a>> {
        self.active_at(at)
            .into_iter()
            .filter(|bundle| bundle.tags().contains(tag))
            .collect()
    }

    /// Active bundles whose name, description or tags contain `query`, ignoring case.
    pub fn search(&self, query: &str, at: Timestamp) -> Vec<&Bundle<'a>> {
        let query = query.trim().to_lowercase();

        self.active_at(at)
            .into_iter()
            .filter(|bundle| {
                bundle.name().to_lowercase().contains(&query)
                    || bundle.description().to_lowercase().contains(&query)
                    || bundle.tags().any_contains(&query)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::{Money, iso::EUR};
    use testresult::TestResult;

    use crate::{
        bundles::{BundleSlot, DiscountRule},
        tags::TagSet,
    };

    use super::*;

    fn kit<'a>(id: &str, priority: i32, category: BundleCategory) -> Bundle<'a> {
        Bundle::new(
            id,
            format!("Kit {id}"),
            category,
            vec![BundleSlot::required("pam-mascara", 1)],
            DiscountRule::percentage(Percentage::from(0.1)),
        )
        .with_priority(priority)
    }

    fn at() -> Result<Timestamp, jiff::Error> {
        "2026-10-14T12:00:00Z".parse()
    }

    #[test]
    fn invalid_and_duplicate_bundles_are_excluded() {
        let catalog = BundleCatalog::load(
            [
                kit("a", 1, BundleCategory::Maquiagem),
                kit("a", 2, BundleCategory::Maquiagem),
                kit("b", 1, BundleCategory::Maquiagem).with_max_applications(0),
                kit("c", 1, BundleCategory::Maquiagem),
            ],
            EUR,
        );

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.exclusions(),
            &[
                CatalogExclusion {
                    bundle_id: "a".to_string(),
                    error: BundleValidationError::DuplicateId,
                },
                CatalogExclusion {
                    bundle_id: "b".to_string(),
                    error: BundleValidationError::ZeroApplications,
                },
            ]
        );
        assert_eq!(catalog.get("a").map(Bundle::priority), Some(1));
    }

    #[test]
    fn foreign_currency_bundles_are_excluded() {
        let catalog = BundleCatalog::load(
            [kit("a", 1, BundleCategory::Maquiagem)
                .with_min_value(Money::from_minor(100, rusty_money::iso::GBP))],
            EUR,
        );

        assert!(catalog.is_empty());
        assert_eq!(catalog.exclusions().len(), 1);
    }

    #[test]
    fn active_at_sorts_by_priority_then_id() -> TestResult {
        let catalog = BundleCatalog::load(
            [
                kit("c", 2, BundleCategory::Maquiagem),
                kit("b", 1, BundleCategory::Maquiagem),
                kit("a", 2, BundleCategory::Maquiagem),
                kit("d", 0, BundleCategory::Maquiagem).with_active(false),
            ],
            EUR,
        );

        let ids: Vec<&str> = catalog.active_at(at()?).into_iter().map(Bundle::id).collect();

        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(catalog.get("d").is_some());

        Ok(())
    }

    #[test]
    fn category_tag_and_search_queries() -> TestResult {
        let catalog = BundleCatalog::load(
            [
                kit("bundle-mega-hair-care", 1, BundleCategory::MegaHair)
                    .with_tags(TagSet::from_strs(&["mega-hair", "kit-completo"])),
                kit("bundle-pam-completo", 5, BundleCategory::Maquiagem)
                    .with_description("Paleta, batom e gloss")
                    .with_tags(TagSet::from_strs(&["pam", "maquiagem"])),
            ],
            EUR,
        );

        let at = at()?;
        let ids = |bundles: Vec<&Bundle<'_>>| -> Vec<String> {
            bundles.into_iter().map(|b| b.id().to_string()).collect()
        };

        assert_eq!(
            ids(catalog.by_category(BundleCategory::MegaHair, at)),
            vec!["bundle-mega-hair-care"]
        );
        assert_eq!(ids(catalog.by_tag("PAM", at)), vec!["bundle-pam-completo"]);
        assert_eq!(ids(catalog.search("GLOSS", at)), vec!["bundle-pam-completo"]);
        assert_eq!(ids(catalog.search("completo", at)).len(), 2);
        assert!(catalog.search("perfume", at).is_empty());

        Ok(())
    }
}
