//! Variants
//!
//! A [`VariantSelection`] is what the shopper picked in the product dialog. Resolving it
//! against a [`Product`] validates every axis the product requires, fixes the unit price
//! and derives the [`LineKey`] that decides whether two additions merge.

use std::fmt::{self, Display, Formatter};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::LineKey,
    products::{Product, ProductKind},
};

/// A selectable product attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantAxis {
    /// Merchandise color
    Color,

    /// Merchandise size
    Size,

    /// Ticket class
    TicketClass,

    /// Membership tier
    Tier,
}

impl Display for VariantAxis {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Color => "color",
            Self::Size => "size",
            Self::TicketClass => "ticket class",
            Self::Tier => "membership tier",
        })
    }
}

/// Errors raised when a selection does not match a product's declared options.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariantError {
    /// A required axis was not selected.
    #[error("product {product} requires a {axis}")]
    Missing {
        /// Product id
        product: String,
        /// Missing axis
        axis: VariantAxis,
    },

    /// The selected value is not one of the product's declared options.
    #[error("{value:?} is not a valid {axis} for product {product}")]
    Unknown {
        /// Product id
        product: String,
        /// Offending axis
        axis: VariantAxis,
        /// Selected value
        value: String,
    },
}

/// Variant attributes picked by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSelection {
    /// Merchandise color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Merchandise size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Ticket class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_class: Option<String>,

    /// Membership tier name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

impl VariantSelection {
    /// Color and size selection for merchandise.
    pub fn merchandise(color: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            size: Some(size.into()),
            ..Self::default()
        }
    }

    /// Ticket class selection.
    pub fn ticket(class: impl Into<String>) -> Self {
        Self {
            ticket_class: Some(class.into()),
            ..Self::default()
        }
    }

    /// Membership tier selection.
    pub fn tier(name: impl Into<String>) -> Self {
        Self {
            tier: Some(name.into()),
            ..Self::default()
        }
    }

    /// Short human readable form, e.g. `Green / M`.
    pub fn describe(&self) -> String {
        [&self.color, &self.size, &self.ticket_class, &self.tier]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// A selection validated against its product.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariant {
    /// Merge identity
    pub key: LineKey,

    /// Unit price for this variant
    pub unit_price: Money<'static, Currency>,

    /// Display name for the cart line
    pub name: String,

    /// The selection restricted to the axes the product declares
    pub selection: VariantSelection,
}

/// Validate `selection` against `product` and resolve its price, key and display name.
///
/// Axes the product does not declare are ignored and dropped from the resolved selection.
///
/// # Errors
///
/// Returns a [`VariantError`] when a required axis is missing or names an undeclared option.
pub fn resolve(
    product: &Product,
    selection: &VariantSelection,
) -> Result<ResolvedVariant, VariantError> {
    match &product.kind {
        ProductKind::Merchandise {
            price,
            colors,
            sizes,
        } => {
            let color = require(product, VariantAxis::Color, selection.color.as_deref(), colors)?;
            let size = require(product, VariantAxis::Size, selection.size.as_deref(), sizes)?;

            Ok(ResolvedVariant {
                key: LineKey::derive(&product.id, &[color, size]),
                unit_price: *price,
                name: product.name.clone(),
                selection: VariantSelection::merchandise(color, size),
            })
        }
        ProductKind::Ticket { classes } => {
            let requested = selection.ticket_class.as_deref().ok_or_else(|| {
                VariantError::Missing {
                    product: product.id.clone(),
                    axis: VariantAxis::TicketClass,
                }
            })?;

            let class = classes
                .iter()
                .find(|class| class.name == requested)
                .ok_or_else(|| unknown(product, VariantAxis::TicketClass, requested))?;

            Ok(ResolvedVariant {
                key: LineKey::derive(&product.id, &[&class.name]),
                unit_price: class.price,
                name: format!("{} ({})", product.name, class.name),
                selection: VariantSelection::ticket(&class.name),
            })
        }
        ProductKind::Membership { tiers } => {
            let requested = selection
                .tier
                .as_deref()
                .ok_or_else(|| VariantError::Missing {
                    product: product.id.clone(),
                    axis: VariantAxis::Tier,
                })?;

            let tier = tiers
                .iter()
                .find(|tier| tier.name == requested)
                .ok_or_else(|| unknown(product, VariantAxis::Tier, requested))?;

            Ok(ResolvedVariant {
                key: LineKey::derive(&product.id, &[&tier.name]),
                unit_price: tier.price,
                name: format!("{} Membership ({})", product.name, tier.name),
                selection: VariantSelection::tier(&tier.name),
            })
        }
        ProductKind::Hardware { price, .. }
        | ProductKind::Subscription { price, .. }
        | ProductKind::Offer { price, .. } => Ok(ResolvedVariant {
            key: LineKey::derive(&product.id, &[]),
            unit_price: *price,
            name: product.name.clone(),
            selection: VariantSelection::default(),
        }),
    }
}

fn require<'p>(
    product: &Product,
    axis: VariantAxis,
    value: Option<&str>,
    options: &'p [String],
) -> Result<&'p str, VariantError> {
    let value = value.ok_or_else(|| VariantError::Missing {
        product: product.id.clone(),
        axis,
    })?;

    options
        .iter()
        .find(|option| option.as_str() == value)
        .map(String::as_str)
        .ok_or_else(|| unknown(product, axis, value))
}

fn unknown(product: &Product, axis: VariantAxis, value: &str) -> VariantError {
    VariantError::Unknown {
        product: product.id.clone(),
        axis,
        value: value.to_string(),
    }
}
