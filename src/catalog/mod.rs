//! Catalog
//!
//! Read-only product records loaded from a YAML fixture. Every price in a catalog shares a
//! single currency.

use std::{fs, io, path::Path};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::SlotMap;
use tabled::builder::Builder;
use thiserror::Error;
use tracing::debug;

use crate::{
    products::{Product, ProductKey, ProductKind, ProductType},
    render::{self, RenderError},
};

pub mod fixtures;

pub use fixtures::parse_price;

const BUNDLED_CATALOG: &str = include_str!("../../fixtures/catalog/sportsphere.yml");

/// Catalog loading and lookup errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Two products share an identifier
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),

    /// A product is missing required variant data
    #[error("Invalid product {id}: {reason}")]
    InvalidProduct {
        /// Product identifier
        id: String,
        /// What is wrong with it
        reason: String,
    },

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// The catalog holds no products
    #[error("Catalog is empty")]
    Empty,
}

/// Catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    products: SlotMap<ProductKey, Product>,
    ids: FxHashMap<String, ProductKey>,
    order: Vec<ProductKey>,
    currency: &'static Currency,
}

impl Catalog {
    /// Build a catalog from products in display order.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Empty`]: no products were given.
    /// - [`CatalogError::DuplicateProduct`]: two products share an id.
    /// - [`CatalogError::CurrencyMismatch`]: prices use more than one currency.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Result<Self, CatalogError> {
        let mut slots = SlotMap::with_key();
        let mut ids = FxHashMap::default();
        let mut order = Vec::new();
        let mut currency: Option<&'static Currency> = None;

        for product in products {
            let mut amounts = product.prices();

            if let ProductKind::Offer { original_price, .. } = &product.kind {
                amounts.push(*original_price);
            }

            for amount in amounts {
                match currency {
                    Some(expected) if expected != amount.currency() => {
                        return Err(CatalogError::CurrencyMismatch(
                            expected.iso_alpha_code.to_string(),
                            amount.currency().iso_alpha_code.to_string(),
                        ));
                    }
                    Some(_) => {}
                    None => currency = Some(amount.currency()),
                }
            }

            if ids.contains_key(&product.id) {
                return Err(CatalogError::DuplicateProduct(product.id));
            }

            let id = product.id.clone();
            let key = slots.insert(product);

            ids.insert(id, key);
            order.push(key);
        }

        let currency = currency.ok_or(CatalogError::Empty)?;

        Ok(Self {
            products: slots,
            ids,
            order,
            currency,
        })
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, a price cannot be parsed, or any check in
    /// [`Catalog::from_products`] fails.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: fixtures::CatalogFixture = serde_norway::from_str(yaml)?;

        let products = fixture
            .products
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_products(products)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise as
    /// [`Catalog::from_yaml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let catalog = Self::from_yaml_str(&fs::read_to_string(path)?)?;

        debug!(path = %path.display(), products = catalog.len(), "loaded catalog");

        Ok(catalog)
    }

    /// The `SportSphere` shop catalog compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled fixture is invalid.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUNDLED_CATALOG)
    }

    /// Look up a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] for unknown ids.
    pub fn get(&self, id: &str) -> Result<&Product, CatalogError> {
        self.ids
            .get(id)
            .and_then(|key| self.products.get(*key))
            .ok_or_else(|| CatalogError::ProductNotFound(id.to_string()))
    }

    /// Products in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.order.iter().filter_map(|key| self.products.get(*key))
    }

    /// Products of one family, in display order.
    pub fn of_type(&self, product_type: ProductType) -> impl Iterator<Item = &Product> {
        self.iter()
            .filter(move |product| product.product_type() == product_type)
    }

    /// Products whose name contains `term`, ignoring case.
    pub fn search<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a Product> + use<'a> {
        let term = term.to_lowercase();

        self.iter()
            .filter(move |product| product.name.to_lowercase().contains(&term))
    }

    /// Products of an optional family whose name contains an optional search term.
    pub fn filter(&self, product_type: Option<ProductType>, term: Option<&str>) -> Vec<&Product> {
        let mut products: Vec<&Product> = match term {
            Some(term) => self.search(term).collect(),
            None => self.iter().collect(),
        };

        if let Some(product_type) = product_type {
            let family: Vec<&str> = self.of_type(product_type).map(|p| p.id.as_str()).collect();

            products.retain(|product| family.contains(&product.id.as_str()));
        }

        products
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false for a loaded catalog.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Currency of every price in the catalog.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Render products as a table.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::IO`] if the output cannot be written.
    pub fn write_to<'a>(
        mut out: impl io::Write,
        products: impl IntoIterator<Item = &'a Product>,
    ) -> Result<(), RenderError> {
        let mut builder = Builder::default();

        builder.push_record(["ID", "Type", "Name", "Options", "From"]);

        for product in products {
            builder.push_record([
                product.id.clone(),
                product.product_type().to_string(),
                product.name.clone(),
                options(product),
                product
                    .from_price()
                    .map(|price| price.to_string())
                    .unwrap_or_default(),
            ]);
        }

        render::write_table(&mut out, builder, 4..5)
    }
}

fn options(product: &Product) -> String {
    match &product.kind {
        ProductKind::Merchandise { colors, sizes, .. } => {
            format!("color: {}; size: {}", colors.join(", "), sizes.join(", "))
        }
        ProductKind::Ticket { classes } => classes
            .iter()
            .map(|class| format!("{} {}", class.name, class.price))
            .collect::<Vec<_>>()
            .join(", "),
        ProductKind::Membership { tiers } => tiers
            .iter()
            .map(|tier| format!("{} ({}) {}", tier.name, tier.duration, tier.price))
            .collect::<Vec<_>>()
            .join(", "),
        ProductKind::Hardware { description, .. } => description.clone(),
        ProductKind::Subscription { duration, .. } => duration.clone(),
        ProductKind::Offer { original_price, .. } => format!("was {original_price}"),
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{
        Money,
        iso::{TZS, USD},
    };
    use testresult::TestResult;

    use super::*;

    #[test]
    fn bundled_catalog_loads_every_family() -> TestResult {
        let catalog = Catalog::bundled()?;

        assert_eq!(catalog.currency(), TZS);
        assert_eq!(catalog.of_type(ProductType::Merchandise).count(), 6);
        assert_eq!(catalog.of_type(ProductType::Ticket).count(), 4);
        assert_eq!(catalog.of_type(ProductType::Membership).count(), 5);
        assert_eq!(catalog.of_type(ProductType::Hardware).count(), 2);
        assert_eq!(catalog.of_type(ProductType::Subscription).count(), 4);
        assert_eq!(catalog.of_type(ProductType::Offer).count(), 4);
        assert_eq!(catalog.len(), 25);

        Ok(())
    }

    #[test]
    fn bundled_jersey_has_expected_price() -> TestResult {
        let catalog = Catalog::bundled()?;
        let jersey = catalog.get("yanga_jersey_home")?;

        assert_eq!(jersey.from_price(), Some(Money::from_minor(75_000_00, TZS)));

        Ok(())
    }

    #[test]
    fn unknown_product_is_not_found() -> TestResult {
        let catalog = Catalog::bundled()?;

        assert!(matches!(
            catalog.get("nope"),
            Err(CatalogError::ProductNotFound(id)) if id == "nope"
        ));

        Ok(())
    }

    #[test]
    fn iteration_keeps_fixture_order() -> TestResult {
        let catalog = Catalog::bundled()?;
        let first: Vec<&str> = catalog.iter().take(2).map(|p| p.id.as_str()).collect();

        assert_eq!(first, ["yanga_jersey_home", "simba_jersey_home"]);

        Ok(())
    }

    #[test]
    fn search_ignores_case() -> TestResult {
        let catalog = Catalog::bundled()?;
        let ids: Vec<&str> = catalog.search("SCARF").map(|p| p.id.as_str()).collect();

        assert_eq!(ids, ["taifa_stars_scarf", "barcelona_scarf", "offer_jersey_bundle"]);

        Ok(())
    }

    #[test]
    fn filter_combines_family_and_search() -> TestResult {
        let catalog = Catalog::bundled()?;

        let ids: Vec<&str> = catalog
            .filter(Some(ProductType::Merchandise), Some("scarf"))
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();

        assert_eq!(ids, ["taifa_stars_scarf", "barcelona_scarf"]);
        assert_eq!(catalog.filter(Some(ProductType::Ticket), None).len(), 4);
        assert_eq!(catalog.filter(None, None).len(), catalog.len());

        Ok(())
    }

    #[test]
    fn mixed_currencies_are_rejected() {
        let result = Catalog::from_products([
            Product::new(
                "a",
                "A",
                ProductKind::Hardware {
                    price: Money::from_minor(100, TZS),
                    description: String::new(),
                },
            ),
            Product::new(
                "b",
                "B",
                ProductKind::Hardware {
                    price: Money::from_minor(100, USD),
                    description: String::new(),
                },
            ),
        ]);

        assert!(matches!(result, Err(CatalogError::CurrencyMismatch(..))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let product = Product::new(
            "a",
            "A",
            ProductKind::Subscription {
                price: Money::from_minor(100, TZS),
                duration: "1 Month".to_string(),
            },
        );

        let result = Catalog::from_products([product.clone(), product]);

        assert!(matches!(result, Err(CatalogError::DuplicateProduct(id)) if id == "a"));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            Catalog::from_yaml_str("products: []"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn load_reads_yaml_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("catalog.yml");

        fs::write(
            &path,
            "products:\n  - id: sub\n    name: Basic\n    type: subscription\n    price: 20000 TZS\n    duration: 1 Month\n",
        )?;

        let catalog = Catalog::load(&path)?;

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("sub")?.product_type(), ProductType::Subscription);

        Ok(())
    }

    #[test]
    fn table_lists_each_product() -> TestResult {
        let catalog = Catalog::bundled()?;
        let mut out = Vec::new();

        Catalog::write_to(&mut out, catalog.of_type(ProductType::Hardware))?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("azam_kit"));
        assert!(rendered.contains("azam_decoder"));
        assert!(!rendered.contains("yanga"));

        Ok(())
    }
}
