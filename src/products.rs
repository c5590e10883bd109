//! Products

use std::fmt::{self, Display, Formatter};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Product family, used for shop tabs and persisted with each line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Jerseys, scarves and other kit.
    Merchandise,

    /// Match tickets.
    Ticket,

    /// Club memberships.
    Membership,

    /// Decoder hardware.
    Hardware,

    /// TV subscriptions.
    Subscription,

    /// Bundled offers.
    Offer,
}

impl ProductType {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merchandise => "merchandise",
            Self::Ticket => "ticket",
            Self::Membership => "membership",
            Self::Hardware => "hardware",
            Self::Subscription => "subscription",
            Self::Offer => "offer",
        }
    }
}

impl Display for ProductType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ticket class (e.g. "Regular", "VIP") and its price.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketClass {
    /// Class name
    pub name: String,

    /// Price of one ticket in this class
    pub price: Money<'static, Currency>,
}

/// A membership tier offered by a club.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipTier {
    /// Tier name
    pub name: String,

    /// Human readable duration, e.g. "1 Year"
    pub duration: String,

    /// Tier price
    pub price: Money<'static, Currency>,
}

/// Type-dependent pricing and variant axes.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductKind {
    /// Single price, selectable color and size.
    Merchandise {
        /// Unit price
        price: Money<'static, Currency>,
        /// Declared colors, in display order
        colors: Vec<String>,
        /// Declared sizes, in display order
        sizes: Vec<String>,
    },

    /// Price per ticket class.
    Ticket {
        /// Declared classes, in display order
        classes: Vec<TicketClass>,
    },

    /// Price per membership tier.
    Membership {
        /// Declared tiers, in display order
        tiers: Vec<MembershipTier>,
    },

    /// Single price, no variants.
    Hardware {
        /// Unit price
        price: Money<'static, Currency>,
        /// Short description
        description: String,
    },

    /// Single price, no variants.
    Subscription {
        /// Unit price
        price: Money<'static, Currency>,
        /// Human readable duration, e.g. "3 Months"
        duration: String,
    },

    /// Discounted bundle, no variants.
    Offer {
        /// Offer price charged at checkout
        price: Money<'static, Currency>,
        /// Price before the offer
        original_price: Money<'static, Currency>,
        /// Short description
        description: String,
    },
}

impl ProductKind {
    /// The product family of this kind.
    pub fn product_type(&self) -> ProductType {
        match self {
            Self::Merchandise { .. } => ProductType::Merchandise,
            Self::Ticket { .. } => ProductType::Ticket,
            Self::Membership { .. } => ProductType::Membership,
            Self::Hardware { .. } => ProductType::Hardware,
            Self::Subscription { .. } => ProductType::Subscription,
            Self::Offer { .. } => ProductType::Offer,
        }
    }
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Catalog identifier
    pub id: String,

    /// Product name
    pub name: String,

    /// Image URL, if any
    pub image: Option<String>,

    /// Pricing and variant axes
    pub kind: ProductKind,
}

impl Product {
    /// Create a product without an image.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ProductKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
            kind,
        }
    }

    /// Attach an image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Product family.
    pub fn product_type(&self) -> ProductType {
        self.kind.product_type()
    }

    /// Every price this product can be sold at.
    ///
    /// Offers report only the offer price; the original price is informational.
    pub fn prices(&self) -> Vec<Money<'static, Currency>> {
        match &self.kind {
            ProductKind::Merchandise { price, .. }
            | ProductKind::Hardware { price, .. }
            | ProductKind::Subscription { price, .. }
            | ProductKind::Offer { price, .. } => vec![*price],
            ProductKind::Ticket { classes } => classes.iter().map(|class| class.price).collect(),
            ProductKind::Membership { tiers } => tiers.iter().map(|tier| tier.price).collect(),
        }
    }

    /// The cheapest price this product can be sold at.
    pub fn from_price(&self) -> Option<Money<'static, Currency>> {
        self.prices()
            .into_iter()
            .min_by_key(Money::to_minor_units)
    }
}
