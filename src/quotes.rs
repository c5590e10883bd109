//! Quotes
//!
//! Shipping and insurance surcharges on top of a cart subtotal.

use std::{
    fmt::{self, Display, Formatter},
    io,
    str::FromStr,
};

use rustc_hash::FxHashMap;
use rusty_money::{
    Money, MoneyError,
    iso::{Currency, TZS},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::{self, RenderError};

/// Errors produced while pricing an order.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// The shipping option is not recognised or has no configured cost.
    #[error("invalid shipping option {0:?}")]
    InvalidShippingOption(String),

    /// The subtotal is negative (minor units).
    #[error("subtotal must not be negative, got {0} minor units")]
    NegativeSubtotal(i64),

    /// A configured amount uses a different currency than the configuration.
    #[error("pricing amount has currency {found}, expected {expected}")]
    CurrencyMismatch {
        /// Configuration currency code
        expected: &'static str,
        /// Offending currency code
        found: &'static str,
    },

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Delivery speed selected at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingOption {
    /// Standard delivery
    Standard,

    /// Express delivery
    Express,
}

impl ShippingOption {
    /// Capitalised label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Express => "Express",
        }
    }
}

impl Display for ShippingOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::Express => "express",
        })
    }
}

impl FromStr for ShippingOption {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            _ => Err(PricingError::InvalidShippingOption(s.to_string())),
        }
    }
}

/// Fixed surcharge configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    currency: &'static Currency,
    shipping: FxHashMap<ShippingOption, Money<'static, Currency>>,
    insurance_surcharge: Money<'static, Currency>,
}

impl PricingConfig {
    /// Build a configuration from a shipping cost table and an insurance surcharge.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::CurrencyMismatch`] if any amount is not in `currency`.
    pub fn new(
        currency: &'static Currency,
        shipping: impl IntoIterator<Item = (ShippingOption, Money<'static, Currency>)>,
        insurance_surcharge: Money<'static, Currency>,
    ) -> Result<Self, PricingError> {
        let shipping: FxHashMap<_, _> = shipping.into_iter().collect();

        shipping
            .values()
            .chain([&insurance_surcharge])
            .try_for_each(|amount| {
                let found = amount.currency();

                if found == currency {
                    Ok(())
                } else {
                    Err(PricingError::CurrencyMismatch {
                        expected: currency.iso_alpha_code,
                        found: found.iso_alpha_code,
                    })
                }
            })?;

        Ok(Self {
            currency,
            shipping,
            insurance_surcharge,
        })
    }

    /// `SportSphere` shop rates: standard 5,000 TZS, express 15,000 TZS, insurance 2,000 TZS.
    pub fn sportsphere() -> Self {
        Self {
            currency: TZS,
            shipping: [
                (ShippingOption::Standard, Money::from_minor(5_000_00, TZS)),
                (ShippingOption::Express, Money::from_minor(15_000_00, TZS)),
            ]
            .into_iter()
            .collect(),
            insurance_surcharge: Money::from_minor(2_000_00, TZS),
        }
    }

    /// Currency of every configured amount.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Shipping cost for `option`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidShippingOption`] if the option has no configured cost.
    pub fn shipping_cost(
        &self,
        option: ShippingOption,
    ) -> Result<Money<'static, Currency>, PricingError> {
        self.shipping
            .get(&option)
            .copied()
            .ok_or_else(|| PricingError::InvalidShippingOption(option.to_string()))
    }

    /// Insurance surcharge.
    pub fn insurance_surcharge(&self) -> Money<'static, Currency> {
        self.insurance_surcharge
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::sportsphere()
    }
}

/// A computed total prior to payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    subtotal: Money<'static, Currency>,
    shipping: ShippingOption,
    shipping_cost: Money<'static, Currency>,
    insured: bool,
    insurance_cost: Money<'static, Currency>,
    total: Money<'static, Currency>,
}

impl Quote {
    /// Cart subtotal the quote was computed from
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Selected shipping option
    pub fn shipping(&self) -> ShippingOption {
        self.shipping
    }

    /// Shipping cost
    pub fn shipping_cost(&self) -> Money<'static, Currency> {
        self.shipping_cost
    }

    /// Whether insurance was opted in
    pub fn insured(&self) -> bool {
        self.insured
    }

    /// Insurance cost, zero when not opted in
    pub fn insurance_cost(&self) -> Money<'static, Currency> {
        self.insurance_cost
    }

    /// `subtotal + shipping_cost + insurance_cost`
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Render the quote breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::IO`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), RenderError> {
        render::write_summary(
            &mut out,
            &[
                (" Subtotal:", self.subtotal.to_string()),
                (
                    " Shipping:",
                    format!("({}) {}", self.shipping.label(), self.shipping_cost),
                ),
                (
                    " Insurance:",
                    format!(
                        "({}) {}",
                        if self.insured { "Yes" } else { "No" },
                        self.insurance_cost
                    ),
                ),
                (" Total:", self.total.to_string()),
            ],
        )
    }
}

/// Order pricer
#[derive(Debug, Clone, Default)]
pub struct OrderPricer {
    config: PricingConfig,
}

impl OrderPricer {
    /// Create a pricer for the given configuration.
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// The pricing configuration.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// `total = subtotal + shipping_cost[shipping] + (insured ? insurance_surcharge : 0)`
    ///
    /// # Errors
    ///
    /// - [`PricingError::NegativeSubtotal`]: `subtotal` is below zero.
    /// - [`PricingError::InvalidShippingOption`]: `shipping` has no configured cost.
    /// - [`PricingError::Money`]: `subtotal` is not in the configured currency.
    pub fn quote(
        &self,
        subtotal: Money<'static, Currency>,
        shipping: ShippingOption,
        insured: bool,
    ) -> Result<Quote, PricingError> {
        let subtotal_minor = subtotal.to_minor_units();

        if subtotal_minor < 0 {
            return Err(PricingError::NegativeSubtotal(subtotal_minor));
        }

        let shipping_cost = self.config.shipping_cost(shipping)?;

        let insurance_cost = if insured {
            self.config.insurance_surcharge
        } else {
            Money::from_minor(0, self.config.currency)
        };

        let total = subtotal.add(shipping_cost)?.add(insurance_cost)?;

        Ok(Quote {
            subtotal,
            shipping,
            shipping_cost,
            insured,
            insurance_cost,
            total,
        })
    }

    /// [`OrderPricer::quote`] with the shipping option given by name.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidShippingOption`] for unrecognised names, otherwise as
    /// [`OrderPricer::quote`].
    pub fn quote_named(
        &self,
        subtotal: Money<'static, Currency>,
        shipping: &str,
        insured: bool,
    ) -> Result<Quote, PricingError> {
        self.quote(subtotal, shipping.parse()?, insured)
    }
}
