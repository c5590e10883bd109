//! Orders
//!
//! An [`Order`] is the immutable record of a paid checkout. It copies the cart lines and the
//! quote so that later catalog or cart changes never alter it.

use std::{
    fmt::{self, Display, Formatter},
    io,
};

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use tabled::builder::Builder;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    cart::CartLineItem,
    pricing::{TotalPriceError, total_price},
    quotes::{Quote, ShippingOption},
    render::{self, RenderError},
};

/// Errors building an order.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    /// An order needs at least one line item.
    #[error("order has no items")]
    NoItems,

    /// The items do not add up to the quoted subtotal.
    #[error("items total {items} but the quote subtotal is {quoted}")]
    SubtotalMismatch {
        /// Sum of the item line totals
        items: String,
        /// Subtotal on the quote
        quoted: String,
    },

    /// Error summing line totals.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),
}

/// Order identifier, `ORD-` followed by a time-ordered UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Generate a new identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ORD-{}", self.0.simple())
    }
}

/// Shipment tracking number, `TRACK-` followed by twelve hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Generate a new tracking number.
    pub fn new() -> Self {
        let uuid = Uuid::now_v7().simple().to_string().to_uppercase();
        let suffix = uuid.get(uuid.len().saturating_sub(12)..).unwrap_or(&uuid);

        Self(format!("TRACK-{suffix}"))
    }

    /// The tracking number as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TrackingNumber {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TrackingNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shipment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Paid, not yet shipped
    Processing,

    /// Handed to the courier
    Shipped,

    /// Received by the shopper
    Delivered,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        })
    }
}

/// Order
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    created_at: Timestamp,
    items: Vec<CartLineItem>,
    quote: Quote,
    payment_method: String,
    payment_reference: String,
    status: OrderStatus,
    tracking_number: TrackingNumber,
}

impl Order {
    /// Record a paid checkout.
    ///
    /// The order starts as [`OrderStatus::Processing`] with a fresh id and tracking number.
    ///
    /// # Errors
    ///
    /// - [`OrderError::NoItems`]: `items` is empty.
    /// - [`OrderError::SubtotalMismatch`]: the items do not sum to `quote.subtotal()`.
    /// - [`OrderError::TotalPrice`]: a line total overflows.
    pub fn place(
        items: Vec<CartLineItem>,
        quote: &Quote,
        payment_method: impl Into<String>,
        payment_reference: impl Into<String>,
        created_at: Timestamp,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let items_total = total_price(&items)?;

        if items_total != quote.subtotal() {
            return Err(OrderError::SubtotalMismatch {
                items: items_total.to_string(),
                quoted: quote.subtotal().to_string(),
            });
        }

        Ok(Self {
            id: OrderId::new(),
            created_at,
            items,
            quote: *quote,
            payment_method: payment_method.into(),
            payment_reference: payment_reference.into(),
            status: OrderStatus::Processing,
            tracking_number: TrackingNumber::new(),
        })
    }

    /// Order identifier
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// When the order was placed
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Purchased lines
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// The quote that was paid
    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    /// Subtotal of the purchased lines
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.quote.subtotal()
    }

    /// Shipping option
    pub fn shipping(&self) -> ShippingOption {
        self.quote.shipping()
    }

    /// Whether shipping insurance was bought
    pub fn insured(&self) -> bool {
        self.quote.insured()
    }

    /// Amount charged
    pub fn total(&self) -> Money<'static, Currency> {
        self.quote.total()
    }

    /// Payment method label, e.g. `Credit Card` or `M-Pesa`
    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    /// Gateway reference for the charge
    pub fn payment_reference(&self) -> &str {
        &self.payment_reference
    }

    /// Shipment status
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Tracking number
    pub fn tracking_number(&self) -> &TrackingNumber {
        &self.tracking_number
    }

    /// Render the order as a receipt.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if a line total overflows or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), RenderError> {
        writeln!(out, "\n Order {} ({})", self.id, self.status).map_err(|_err| RenderError::IO)?;
        writeln!(out, " Placed {}", self.created_at.strftime("%Y-%m-%d %H:%M:%S UTC"))
            .map_err(|_err| RenderError::IO)?;

        let mut builder = Builder::default();

        render::push_line_item_header(&mut builder);

        for item in &self.items {
            render::push_line_item_row(&mut builder, item)?;
        }

        render::write_table(&mut out, builder, render::LINE_ITEM_AMOUNTS)?;

        self.quote.write_to(&mut out)?;

        render::write_summary(
            &mut out,
            &[
                (" Paid with:", self.payment_method.clone()),
                (" Reference:", self.payment_reference.clone()),
                (" Tracking:", self.tracking_number.to_string()),
            ],
        )
    }
}
