//! Kitbag
//!
//! Kitbag matches a storefront cart against a catalog of product bundles ("kits"),
//! applies the discounts of the bundles the cart completes without counting any cart
//! unit twice, and reports how close the cart is to the bundles it has not completed.

pub mod allocation;
pub mod bundles;
pub mod cart;
pub mod catalog;
pub mod discounts;
pub mod fixtures;
pub mod ledger;
pub mod matching;
pub mod prelude;
pub mod products;
pub mod receipt;
pub mod tags;
