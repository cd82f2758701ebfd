//! Kitbag prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    allocation::{
        AllocationEngine, AllocationError, AnalysisOptions, BundleApplication,
        CartBundleAnalysis, PartialMatch, Shortfall, analyze,
    },
    bundles::{Bundle, BundleCategory, BundleSlot, BundleValidationError, DiscountRule},
    cart::{Cart, CartError, CartLineItem, Stock, StockLine},
    catalog::{BundleCatalog, BundleKey, CatalogExclusion},
    discounts::{DiscountError, calculate_discount},
    fixtures::{Fixture, FixtureError},
    ledger::ReservationLedger,
    matching::{MatchResult, MissingSlot, SlotConsumption, match_bundle},
    products::{ProductId, StockKey, VariantId},
    receipt::{ReceiptError, write_analysis},
    tags::TagSet,
};
