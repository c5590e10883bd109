//! Catalog Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, TZS, USD},
};
use serde::Deserialize;

use crate::{
    catalog::CatalogError,
    products::{MembershipTier, Product, ProductKind, TicketClass},
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Products in display order
    pub products: Vec<ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Catalog identifier
    pub id: String,

    /// Product name
    pub name: String,

    /// Image URL
    #[serde(default)]
    pub image: Option<String>,

    /// Type-specific fields, tagged by `type`
    #[serde(flatten)]
    pub kind: ProductKindFixture,
}

/// Type-specific product fields
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductKindFixture {
    /// Jerseys, scarves and other kit
    Merchandise {
        /// Price (e.g., "75000 TZS")
        price: String,
        /// Colors
        colors: Vec<String>,
        /// Sizes
        sizes: Vec<String>,
    },

    /// Match ticket
    Ticket {
        /// Ticket classes in display order
        classes: Vec<TicketClassFixture>,
    },

    /// Club membership
    Membership {
        /// Tiers in display order
        tiers: Vec<MembershipTierFixture>,
    },

    /// Decoder hardware
    Hardware {
        /// Price
        price: String,
        /// Description
        #[serde(default)]
        description: String,
    },

    /// TV subscription
    Subscription {
        /// Price
        price: String,
        /// Duration, e.g. "3 Months"
        duration: String,
    },

    /// Bundled offer
    Offer {
        /// Offer price
        price: String,
        /// Price before the offer
        original_price: String,
        /// Description
        #[serde(default)]
        description: String,
    },
}

/// Ticket class fixture
#[derive(Debug, Deserialize)]
pub struct TicketClassFixture {
    /// Class name
    pub name: String,

    /// Price
    pub price: String,
}

/// Membership tier fixture
#[derive(Debug, Deserialize)]
pub struct MembershipTierFixture {
    /// Tier name
    pub name: String,

    /// Duration, e.g. "1 Year"
    pub duration: String,

    /// Price
    pub price: String,
}

impl TryFrom<ProductFixture> for Product {
    type Error = CatalogError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| CatalogError::InvalidProduct {
            id: fixture.id.clone(),
            reason: reason.to_string(),
        };

        let kind = match fixture.kind {
            ProductKindFixture::Merchandise {
                price,
                colors,
                sizes,
            } => {
                if colors.is_empty() {
                    return Err(invalid("merchandise needs at least one color"));
                }

                if sizes.is_empty() {
                    return Err(invalid("merchandise needs at least one size"));
                }

                ProductKind::Merchandise {
                    price: money(&price)?,
                    colors,
                    sizes,
                }
            }
            ProductKindFixture::Ticket { classes } => {
                if classes.is_empty() {
                    return Err(invalid("ticket needs at least one class"));
                }

                ProductKind::Ticket {
                    classes: classes
                        .into_iter()
                        .map(|class| {
                            Ok(TicketClass {
                                price: money(&class.price)?,
                                name: class.name,
                            })
                        })
                        .collect::<Result<_, CatalogError>>()?,
                }
            }
            ProductKindFixture::Membership { tiers } => {
                if tiers.is_empty() {
                    return Err(invalid("membership needs at least one tier"));
                }

                ProductKind::Membership {
                    tiers: tiers
                        .into_iter()
                        .map(|tier| {
                            Ok(MembershipTier {
                                price: money(&tier.price)?,
                                name: tier.name,
                                duration: tier.duration,
                            })
                        })
                        .collect::<Result<_, CatalogError>>()?,
                }
            }
            ProductKindFixture::Hardware { price, description } => ProductKind::Hardware {
                price: money(&price)?,
                description,
            },
            ProductKindFixture::Subscription { price, duration } => ProductKind::Subscription {
                price: money(&price)?,
                duration,
            },
            ProductKindFixture::Offer {
                price,
                original_price,
                description,
            } => ProductKind::Offer {
                price: money(&price)?,
                original_price: money(&original_price)?,
                description,
            },
        };

        Ok(Product {
            id: fixture.id,
            name: fixture.name,
            image: fixture.image,
            kind,
        })
    }
}

fn money(s: &str) -> Result<Money<'static, Currency>, CatalogError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse price string (e.g., "75000 TZS") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a non-negative decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), CatalogError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(CatalogError::InvalidPrice(s.to_string()));
    }

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "TZS" => TZS,
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(CatalogError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_reads_whole_shillings() -> TestResult {
        let (minor, currency) = parse_price("75000 TZS")?;

        assert_eq!(minor, 75_000_00);
        assert_eq!(currency, TZS);

        Ok(())
    }

    #[test]
    fn parse_price_accepts_usd_and_eur() -> TestResult {
        let (usd_minor, usd) = parse_price("1.00 USD")?;
        let (eur_minor, eur) = parse_price("2.50 EUR")?;

        assert_eq!(usd_minor, 100);
        assert_eq!(usd, USD);
        assert_eq!(eur_minor, 250);
        assert_eq!(eur, EUR);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        assert!(matches!(parse_price("75000TZS"), Err(CatalogError::InvalidPrice(_))));
        assert!(matches!(parse_price("75000 TZS extra"), Err(CatalogError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_negative_amounts() {
        assert!(matches!(parse_price("-5 TZS"), Err(CatalogError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(CatalogError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn ticket_classes_keep_declared_order() -> TestResult {
        let fixture: ProductFixture = serde_norway::from_str(
            "id: ticket_1\nname: 'Ticket: A vs B'\ntype: ticket\nclasses:\n  - { name: VIP, price: 30000 TZS }\n  - { name: Regular, price: 15000 TZS }\n",
        )?;

        let product = Product::try_from(fixture)?;

        let ProductKind::Ticket { classes } = product.kind else {
            return Err("expected a ticket".into());
        };

        let names: Vec<&str> = classes.iter().map(|class| class.name.as_str()).collect();

        assert_eq!(names, ["VIP", "Regular"]);

        Ok(())
    }

    #[test]
    fn merchandise_without_sizes_is_invalid() -> TestResult {
        let fixture: ProductFixture = serde_norway::from_str(
            "id: scarf\nname: Scarf\ntype: merchandise\nprice: 25000 TZS\ncolors: [Yellow]\nsizes: []\n",
        )?;

        let result = Product::try_from(fixture);

        assert!(matches!(result, Err(CatalogError::InvalidProduct { id, .. }) if id == "scarf"));

        Ok(())
    }
}
