//! Fixtures

use std::{fs, path::PathBuf};

use thiserror::Error;

use crate::{
    bundles::Bundle,
    cart::{Cart, CartError, CartLineItem},
    catalog::BundleCatalog,
    fixtures::{bundles::CatalogFixture, carts::CartFixture},
};

pub mod bundles;
pub mod carts;
pub mod prices;

pub use prices::{parse_currency, parse_price};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// No catalog loaded
    #[error("No catalog loaded")]
    NoCatalog,

    /// No cart loaded
    #[error("No cart loaded")]
    NoCart,

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Catalog loaded from `catalogs/<name>.yml`
    catalog: Option<BundleCatalog<'a>>,

    /// Cart loaded from `carts/<name>.yml`
    cart: Option<Cart<'a>>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: None,
            cart: None,
        }
    }

    /// Load a bundle catalog from a YAML fixture file
    ///
    /// Bundles that fail validation are excluded from the catalog, not reported as errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a bundle has an
    /// unreadable price or percentage.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("catalogs").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CatalogFixture = serde_norway::from_str(&contents)?;

        let currency = parse_currency(&fixture.currency)?;
        let bundles = fixture
            .bundles
            .into_iter()
            .map(Bundle::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        self.catalog = Some(BundleCatalog::load(bundles, currency));

        Ok(self)
    }

    /// Load a cart from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a line is priced in
    /// another currency than the cart.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("carts").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CartFixture = serde_norway::from_str(&contents)?;

        let currency = parse_currency(&fixture.currency)?;
        let items = fixture
            .items
            .into_iter()
            .map(CartLineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        self.cart = Some(Cart::with_items(items, currency)?);

        Ok(self)
    }

    /// Load a catalog and a cart
    ///
    /// # Errors
    ///
    /// Returns an error if either fixture file cannot be loaded.
    pub fn from_set(catalog: &str, cart: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_catalog(catalog)?.load_cart(cart)?;

        Ok(fixture)
    }

    /// Get the loaded catalog
    ///
    /// # Errors
    ///
    /// Returns an error if no catalog has been loaded.
    pub fn catalog(&self) -> Result<&BundleCatalog<'a>, FixtureError> {
        self.catalog.as_ref().ok_or(FixtureError::NoCatalog)
    }

    /// Get the loaded cart
    ///
    /// # Errors
    ///
    /// Returns an error if no cart has been loaded.
    pub fn cart(&self) -> Result<&Cart<'a>, FixtureError> {
        self.cart.as_ref().ok_or(FixtureError::NoCart)
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
