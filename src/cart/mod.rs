//! Cart

use std::io;

use rusty_money::{Money, iso::Currency};
use tabled::builder::Builder;
use thiserror::Error;

use crate::{
    pricing::{TotalPriceError, total_price},
    products::Product,
    render::{self, RenderError},
    variants::{ResolvedVariant, VariantError},
};

pub mod engine;
pub mod line_item;
pub mod snapshot;

pub use engine::CartEngine;
pub use line_item::{CartLineItem, LineKey};

/// Errors related to cart mutation or totals.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The variant selection does not match the product.
    #[error(transparent)]
    InvalidVariant(#[from] VariantError),

    /// Requested quantity is below 1, or the resulting quantity does not fit.
    #[error("invalid quantity {0}")]
    InvalidQuantity(i64),

    /// A line item has a negative unit price.
    #[error("cart item {0} has a negative unit price")]
    InvalidPrice(LineKey),

    /// No line item has the given key.
    #[error("no cart item with key {0}")]
    ItemNotFound(LineKey),

    /// A line item's price currency differs from the cart currency.
    #[error("Item {key} has currency {item}, but cart has currency {cart}")]
    CurrencyMismatch {
        /// Offending line key
        key: LineKey,
        /// Item currency code
        item: &'static str,
        /// Cart currency code
        cart: &'static str,
    },

    /// Two line items share a key.
    #[error("duplicate cart item {0}")]
    DuplicateItem(LineKey),

    /// Error calculating line or cart totals.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),
}

/// Cart
///
/// Line items are kept in first-add order with unique keys and a quantity of at least 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    items: Vec<CartLineItem>,
    currency: &'static Currency,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Create a cart with the given line items.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if a line item has a mismatched currency, a duplicate key,
    /// a zero quantity or a negative unit price.
    pub fn with_items(
        items: impl Into<Vec<CartLineItem>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();

        items.iter().enumerate().try_for_each(|(i, item)| {
            let item_currency = item.unit_price().currency();

            if item_currency != currency {
                return Err(CartError::CurrencyMismatch {
                    key: item.key().clone(),
                    item: item_currency.iso_alpha_code,
                    cart: currency.iso_alpha_code,
                });
            }

            if item.quantity() == 0 {
                return Err(CartError::InvalidQuantity(0));
            }

            if item.unit_price().is_negative() {
                return Err(CartError::InvalidPrice(item.key().clone()));
            }

            if items.iter().take(i).any(|other| other.key() == item.key()) {
                return Err(CartError::DuplicateItem(item.key().clone()));
            }

            Ok(())
        })?;

        Ok(Cart { items, currency })
    }

    /// Calculate the subtotal of the cart.
    ///
    /// # Errors
    ///
    /// Returns a `TotalPriceError` if there was a money arithmetic or overflow error.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, TotalPriceError> {
        if self.is_empty() {
            return Ok(Money::from_minor(0, self.currency));
        }

        total_price(&self.items)
    }

    /// Total number of units across all line items.
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity()))
            .sum()
    }

    /// Get a line item by key.
    pub fn get(&self, key: &LineKey) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.key() == key)
    }

    /// Iterate over the line items in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartLineItem> {
        self.items.iter()
    }

    /// The line items as a slice.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Get the number of line items in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Merge `quantity` units of a resolved variant into the cart.
    ///
    /// An existing line keeps the unit price it was first added with.
    pub(crate) fn add(
        &mut self,
        product: &Product,
        resolved: ResolvedVariant,
        quantity: u32,
    ) -> Result<LineKey, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }

        let price_currency = resolved.unit_price.currency();

        if price_currency != self.currency {
            return Err(CartError::CurrencyMismatch {
                key: resolved.key,
                item: price_currency.iso_alpha_code,
                cart: self.currency.iso_alpha_code,
            });
        }

        if let Some(existing) = self.items.iter_mut().find(|item| item.key == resolved.key) {
            let current = existing.quantity;

            existing.quantity = current.checked_add(quantity).ok_or_else(|| {
                CartError::InvalidQuantity(i64::from(current) + i64::from(quantity))
            })?;

            return Ok(resolved.key);
        }

        self.items.push(CartLineItem {
            key: resolved.key.clone(),
            product_id: product.id.clone(),
            product_type: product.product_type(),
            variant: resolved.selection,
            name: resolved.name,
            image: product.image.clone(),
            unit_price: resolved.unit_price,
            quantity,
        });

        Ok(resolved.key)
    }

    /// Apply `delta` to a line's quantity, removing the line when it drops to zero or below.
    ///
    /// Returns the new quantity, or `None` if the line was removed.
    pub(crate) fn update_quantity(
        &mut self,
        key: &LineKey,
        delta: i64,
    ) -> Result<Option<u32>, CartError> {
        let idx = self
            .items
            .iter()
            .position(|item| item.key() == key)
            .ok_or_else(|| CartError::ItemNotFound(key.clone()))?;

        let current = self
            .items
            .get(idx)
            .map(CartLineItem::quantity)
            .ok_or_else(|| CartError::ItemNotFound(key.clone()))?;

        let updated = i64::from(current)
            .checked_add(delta)
            .ok_or(CartError::InvalidQuantity(delta))?;

        if updated <= 0 {
            self.items.remove(idx);
            return Ok(None);
        }

        let quantity = u32::try_from(updated).map_err(|_err| CartError::InvalidQuantity(updated))?;

        if let Some(item) = self.items.get_mut(idx) {
            item.quantity = quantity;
        }

        Ok(Some(quantity))
    }

    /// Remove a line outright.
    pub(crate) fn remove(&mut self, key: &LineKey) -> Result<CartLineItem, CartError> {
        let idx = self
            .items
            .iter()
            .position(|item| item.key() == key)
            .ok_or_else(|| CartError::ItemNotFound(key.clone()))?;

        Ok(self.items.remove(idx))
    }

    /// Remove every line.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    /// Render the cart as a table followed by its subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if totals cannot be computed or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), RenderError> {
        if self.is_empty() {
            writeln!(out, "Your cart is empty.").map_err(|_err| RenderError::IO)?;
            return Ok(());
        }

        let mut builder = Builder::default();

        render::push_line_item_header(&mut builder);

        for item in &self.items {
            render::push_line_item_row(&mut builder, item)?;
        }

        render::write_table(&mut out, builder, render::LINE_ITEM_AMOUNTS)?;

        render::write_summary(
            &mut out,
            &[
                (" Items:", self.item_count().to_string()),
                (" Subtotal:", self.subtotal()?.to_string()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{TZS, USD};
    use testresult::TestResult;

    use crate::{
        products::{ProductKind, ProductType},
        variants::{VariantSelection, resolve},
    };

    use super::*;

    fn jersey() -> Product {
        Product::new(
            "yanga_jersey_home",
            "Young Africans Home Jersey 23/24",
            ProductKind::Merchandise {
                price: Money::from_minor(75_000_00, TZS),
                colors: vec!["Green".to_string(), "Yellow".to_string()],
                sizes: vec!["M".to_string(), "L".to_string()],
            },
        )
    }

    fn add(cart: &mut Cart, color: &str, size: &str, quantity: u32) -> Result<LineKey, CartError> {
        let product = jersey();
        let resolved = resolve(&product, &VariantSelection::merchandise(color, size))?;

        cart.add(&product, resolved, quantity)
    }

    fn line(key: &str, quantity: u32) -> CartLineItem {
        CartLineItem {
            key: LineKey::from(key),
            product_id: key.to_string(),
            product_type: ProductType::Hardware,
            variant: VariantSelection::default(),
            name: key.to_string(),
            image: None,
            unit_price: Money::from_minor(100, TZS),
            quantity,
        }
    }

    #[test]
    fn new_with_currency() {
        let cart = Cart::new(TZS);

        assert_eq!(cart.currency(), TZS);
        assert!(cart.is_empty());
    }

    #[test]
    fn subtotal_with_no_items() -> TestResult {
        assert_eq!(Cart::new(TZS).subtotal()?, Money::from_minor(0, TZS));

        Ok(())
    }

    #[test]
    fn adding_same_variant_merges_lines() -> TestResult {
        let mut cart = Cart::new(TZS);

        let first = add(&mut cart, "Green", "M", 1)?;
        let second = add(&mut cart, "Green", "M", 2)?;

        assert_eq!(first, second);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&first).map(CartLineItem::quantity), Some(3));
        assert_eq!(cart.subtotal()?, Money::from_minor(225_000_00, TZS));

        Ok(())
    }

    #[test]
    fn different_variants_keep_separate_lines_in_add_order() -> TestResult {
        let mut cart = Cart::new(TZS);

        add(&mut cart, "Yellow", "L", 1)?;
        add(&mut cart, "Green", "M", 1)?;

        let keys: Vec<&str> = cart.iter().map(|item| item.key().as_str()).collect();

        assert_eq!(keys, ["yanga_jersey_home-Yellow-L", "yanga_jersey_home-Green-M"]);
        assert_eq!(cart.item_count(), 2);

        Ok(())
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut cart = Cart::new(TZS);

        assert_eq!(
            add(&mut cart, "Green", "M", 0),
            Err(CartError::InvalidQuantity(0))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn quantity_overflow_is_rejected() -> TestResult {
        let mut cart = Cart::new(TZS);

        add(&mut cart, "Green", "M", u32::MAX)?;

        assert!(matches!(
            add(&mut cart, "Green", "M", 1),
            Err(CartError::InvalidQuantity(_))
        ));
        assert_eq!(cart.item_count(), u64::from(u32::MAX));

        Ok(())
    }

    #[test]
    fn currency_mismatch_is_rejected() {
        let mut cart = Cart::new(USD);

        assert!(matches!(
            add(&mut cart, "Green", "M", 1),
            Err(CartError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn update_quantity_to_zero_removes_line() -> TestResult {
        let mut cart = Cart::new(TZS);
        let key = add(&mut cart, "Green", "M", 2)?;

        assert_eq!(cart.update_quantity(&key, -1)?, Some(1));
        assert_eq!(cart.update_quantity(&key, -5)?, None);
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn update_unknown_key_is_not_found() {
        let mut cart = Cart::new(TZS);
        let key = LineKey::from("missing");

        assert_eq!(
            cart.update_quantity(&key, 1),
            Err(CartError::ItemNotFound(key))
        );
    }

    #[test]
    fn with_items_rejects_duplicates_and_zero_quantities() {
        assert_eq!(
            Cart::with_items([line("a", 1), line("a", 2)], TZS),
            Err(CartError::DuplicateItem(LineKey::from("a")))
        );
        assert_eq!(
            Cart::with_items([line("a", 0)], TZS),
            Err(CartError::InvalidQuantity(0))
        );
    }

    #[test]
    fn write_to_renders_lines_and_subtotal() -> TestResult {
        let mut cart = Cart::new(TZS);
        add(&mut cart, "Green", "M", 2)?;

        let mut out = Vec::new();
        cart.write_to(&mut out)?;
        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("Young Africans Home Jersey 23/24"));
        assert!(rendered.contains("Green / M"));
        assert!(rendered.contains("Subtotal"));

        Ok(())
    }

    #[test]
    fn write_to_reports_empty_cart() -> TestResult {
        let mut out = Vec::new();
        Cart::new(TZS).write_to(&mut out)?;

        assert_eq!(String::from_utf8(out)?, "Your cart is empty.\n");

        Ok(())
    }
}
