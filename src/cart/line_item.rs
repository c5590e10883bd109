//! Cart line items

use std::fmt::{self, Display, Formatter};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    pricing::{TotalPriceError, line_total},
    products::ProductType,
    variants::VariantSelection,
};

/// Identity of a line item: the product id joined with every selected variant axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineKey(String);

impl LineKey {
    /// Derive a key from a product id and the variant values that affect price or fulfilment.
    pub fn derive(product_id: &str, axes: &[&str]) -> Self {
        let mut key = String::from(product_id);

        for axis in axes {
            key.push('-');
            key.push_str(axis);
        }

        Self(key)
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LineKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LineKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One row of the cart: a product + variant combination and its quantity.
///
/// Display fields are copied from the catalog when the line is first added and are
/// never refreshed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem {
    pub(crate) key: LineKey,
    pub(crate) product_id: String,
    pub(crate) product_type: ProductType,
    pub(crate) variant: VariantSelection,
    pub(crate) name: String,
    pub(crate) image: Option<String>,
    pub(crate) unit_price: Money<'static, Currency>,
    pub(crate) quantity: u32,
}

impl CartLineItem {
    /// Line key
    pub fn key(&self) -> &LineKey {
        &self.key
    }

    /// Catalog id of the product
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Product family
    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    /// Variant selection this line was added with
    pub fn variant(&self) -> &VariantSelection {
        &self.variant
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image URL
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Unit price fixed at first add
    pub fn unit_price(&self) -> Money<'static, Currency> {
        self.unit_price
    }

    /// Quantity, always at least 1
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError::Overflow`] if the product does not fit in minor units.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, TotalPriceError> {
        line_total(&self.unit_price, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::TZS;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn derive_joins_axes_with_dashes() {
        assert_eq!(
            LineKey::derive("yanga_jersey_home", &["Green", "M"]).as_str(),
            "yanga_jersey_home-Green-M"
        );
        assert_eq!(LineKey::derive("azam_kit", &[]).as_str(), "azam_kit");
    }

    #[test]
    fn line_total_multiplies_quantity() -> TestResult {
        let item = CartLineItem {
            key: LineKey::from("taifa_stars_scarf-Yellow-One Size"),
            product_id: "taifa_stars_scarf".to_string(),
            product_type: ProductType::Merchandise,
            variant: VariantSelection::merchandise("Yellow", "One Size"),
            name: "Taifa Stars Supporter Scarf".to_string(),
            image: None,
            unit_price: Money::from_minor(25_000_00, TZS),
            quantity: 3,
        };

        assert_eq!(item.line_total()?, Money::from_minor(75_000_00, TZS));

        Ok(())
    }
}
