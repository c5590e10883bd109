//! Cart engine
//!
//! Owns the cart and its snapshot store. Every mutation commits in memory first and then
//! writes a full snapshot; a failed write is logged and kept in
//! [`CartEngine::last_persist_error`] but never undoes the mutation.

use rusty_money::{Money, iso::Currency};
use tracing::{debug, warn};

use crate::{
    cart::{
        Cart, CartError, CartLineItem, LineKey,
        snapshot::{CartSnapshot, SnapshotError, SnapshotStore},
    },
    pricing::TotalPriceError,
    products::Product,
    variants::{VariantSelection, resolve},
};

/// Cart engine
#[derive(Debug)]
pub struct CartEngine<S: SnapshotStore> {
    cart: Cart,
    store: S,
    last_persist_error: Option<SnapshotError>,
}

impl<S: SnapshotStore> CartEngine<S> {
    /// Start with an empty cart, ignoring any saved snapshot.
    pub fn new(currency: &'static Currency, store: S) -> Self {
        Self {
            cart: Cart::new(currency),
            store,
            last_persist_error: None,
        }
    }

    /// Start from the last saved snapshot, or an empty cart if there is none.
    ///
    /// A snapshot that cannot be read or does not describe a valid cart in `currency` is
    /// logged and discarded.
    pub fn restore(currency: &'static Currency, store: S) -> Self {
        let cart = match store.load().and_then(|snapshot| {
            snapshot
                .map(|snapshot| snapshot.into_cart(currency))
                .transpose()
        }) {
            Ok(Some(cart)) => {
                debug!(lines = cart.len(), "restored cart snapshot");
                cart
            }
            Ok(None) => Cart::new(currency),
            Err(error) => {
                warn!(%error, "discarding unreadable cart snapshot");
                Cart::new(currency)
            }
        };

        Self {
            cart,
            store,
            last_persist_error: None,
        }
    }

    /// Add `quantity` units of `product` with the given variant selection.
    ///
    /// If a line with the same key already exists its quantity is incremented and its unit
    /// price is left as it was first added. Returns the key of the affected line.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidVariant`]: a required axis is missing or not declared by the product.
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero or the merged quantity overflows.
    /// - [`CartError::CurrencyMismatch`]: the product is priced in another currency.
    pub fn add_item(
        &mut self,
        product: &Product,
        selection: &VariantSelection,
        quantity: u32,
    ) -> Result<LineKey, CartError> {
        let resolved = resolve(product, selection)?;
        let key = self.cart.add(product, resolved, quantity)?;

        debug!(%key, quantity, "added to cart");

        self.persist();

        Ok(key)
    }

    /// Apply `delta` to a line's quantity.
    ///
    /// A resulting quantity of zero or less removes the line. Returns the new quantity, or
    /// `None` if the line was removed.
    ///
    /// # Errors
    ///
    /// - [`CartError::ItemNotFound`]: no line has `key`.
    /// - [`CartError::InvalidQuantity`]: the resulting quantity does not fit.
    pub fn update_quantity(&mut self, key: &LineKey, delta: i64) -> Result<Option<u32>, CartError> {
        let quantity = self.cart.update_quantity(key, delta)?;

        match quantity {
            Some(quantity) => debug!(%key, delta, quantity, "updated cart quantity"),
            None => debug!(%key, delta, "removed cart item"),
        }

        self.persist();

        Ok(quantity)
    }

    /// Remove a line regardless of its quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has `key`.
    pub fn remove_item(&mut self, key: &LineKey) -> Result<CartLineItem, CartError> {
        let removed = self.cart.remove(key)?;

        debug!(%key, "removed cart item");

        self.persist();

        Ok(removed)
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.cart.clear();

        debug!("cleared cart");

        self.persist();
    }

    /// Sum of `unit_price × quantity` over every line; zero for an empty cart.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if a line total overflows.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, TotalPriceError> {
        self.cart.subtotal()
    }

    /// The cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Line items in cart order.
    pub fn items(&self) -> &[CartLineItem] {
        self.cart.items()
    }

    /// Look up a line by key.
    pub fn get(&self, key: &LineKey) -> Option<&CartLineItem> {
        self.cart.get(key)
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.cart.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// The snapshot store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The error from the most recent snapshot write, cleared by the next successful write.
    pub fn last_persist_error(&self) -> Option<&SnapshotError> {
        self.last_persist_error.as_ref()
    }

    fn persist(&mut self) {
        let snapshot = CartSnapshot::from(&self.cart);

        match self.store.save(&snapshot) {
            Ok(()) => self.last_persist_error = None,
            Err(error) => {
                warn!(%error, "failed to persist cart snapshot");
                self.last_persist_error = Some(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{TZS, USD};
    use testresult::TestResult;

    use crate::{
        cart::snapshot::MemorySnapshotStore,
        products::{MembershipTier, ProductKind},
        variants::{VariantAxis, VariantError},
    };

    use super::*;

    fn jersey() -> Product {
        Product::new(
            "jersey-1",
            "Young Africans Home Jersey 23/24",
            ProductKind::Merchandise {
                price: Money::from_minor(75_000_00, TZS),
                colors: vec!["Green".to_string(), "Yellow".to_string()],
                sizes: vec!["M".to_string(), "L".to_string()],
            },
        )
    }

    fn club() -> Product {
        Product::new(
            "yanga",
            "Young Africans SC",
            ProductKind::Membership {
                tiers: vec![MembershipTier {
                    name: "Gold".to_string(),
                    duration: "1 Year".to_string(),
                    price: Money::from_minor(90_000_00, TZS),
                }],
            },
        )
    }

    #[test]
    fn jersey_scenario() -> TestResult {
        let mut engine = CartEngine::new(TZS, MemorySnapshotStore::new());
        let green_m = VariantSelection::merchandise("Green", "M");

        let key = engine.add_item(&jersey(), &green_m, 1)?;
        engine.add_item(&jersey(), &green_m, 1)?;

        assert_eq!(engine.items().len(), 1);
        assert_eq!(engine.cart().get(&key).map(CartLineItem::quantity), Some(2));
        assert_eq!(engine.subtotal()?, Money::from_minor(150_000_00, TZS));

        assert_eq!(engine.update_quantity(&key, -2)?, None);
        assert!(engine.is_empty());
        assert_eq!(engine.subtotal()?, Money::from_minor(0, TZS));

        Ok(())
    }

    #[test]
    fn every_mutation_writes_a_snapshot() -> TestResult {
        let mut engine = CartEngine::new(TZS, MemorySnapshotStore::new());

        let key = engine.add_item(&club(), &VariantSelection::tier("Gold"), 1)?;
        engine.update_quantity(&key, 1)?;
        engine.remove_item(&key)?;
        engine.clear();

        assert_eq!(engine.store().writes(), 4);

        Ok(())
    }

    #[test]
    fn failed_mutation_does_not_write() {
        let mut engine = CartEngine::new(TZS, MemorySnapshotStore::new());

        let result = engine.add_item(&club(), &VariantSelection::tier("Platinum"), 1);

        assert!(matches!(
            result,
            Err(CartError::InvalidVariant(VariantError::Unknown {
                axis: VariantAxis::Tier,
                ..
            }))
        ));
        assert_eq!(engine.store().writes(), 0);
    }

    #[test]
    fn persistence_failure_keeps_in_memory_cart() -> TestResult {
        let mut engine = CartEngine::new(TZS, MemorySnapshotStore::read_only());

        engine.add_item(&club(), &VariantSelection::tier("Gold"), 3)?;

        assert_eq!(engine.item_count(), 3);
        assert!(matches!(
            engine.last_persist_error(),
            Some(SnapshotError::Io(_))
        ));

        Ok(())
    }

    #[test]
    fn restore_reproduces_saved_cart() -> TestResult {
        let mut engine = CartEngine::new(TZS, MemorySnapshotStore::new());

        engine.add_item(&jersey(), &VariantSelection::merchandise("Yellow", "L"), 2)?;
        engine.add_item(&club(), &VariantSelection::tier("Gold"), 1)?;

        let json = engine.store().json().map(str::to_string).ok_or("no snapshot")?;
        let restored = CartEngine::restore(TZS, MemorySnapshotStore::with_json(json));

        assert_eq!(restored.cart(), engine.cart());
        assert_eq!(restored.subtotal()?, engine.subtotal()?);

        Ok(())
    }

    #[test]
    fn restore_discards_snapshot_in_other_currency() -> TestResult {
        let mut engine = CartEngine::new(TZS, MemorySnapshotStore::new());
        engine.add_item(&club(), &VariantSelection::tier("Gold"), 1)?;

        let json = engine.store().json().map(str::to_string).ok_or("no snapshot")?;
        let restored = CartEngine::restore(USD, MemorySnapshotStore::with_json(json));

        assert!(restored.is_empty());
        assert_eq!(restored.cart().currency(), USD);

        Ok(())
    }

    #[test]
    fn restore_discards_snapshot_with_negative_price() -> TestResult {
        let mut engine = CartEngine::new(TZS, MemorySnapshotStore::new());
        engine.add_item(&club(), &VariantSelection::tier("Gold"), 1)?;

        let json = engine
            .store()
            .json()
            .map(|json| json.replace("9000000", "-500"))
            .ok_or("no snapshot")?;
        let restored = CartEngine::restore(TZS, MemorySnapshotStore::with_json(json));

        assert!(restored.is_empty());
        assert_eq!(restored.subtotal()?, Money::from_minor(0, TZS));

        Ok(())
    }

    #[test]
    fn restore_discards_malformed_snapshot() {
        let restored = CartEngine::restore(TZS, MemorySnapshotStore::with_json("{not json"));

        assert!(restored.is_empty());
    }

    #[test]
    fn remove_unknown_item_is_not_found() {
        let mut engine = CartEngine::new(TZS, MemorySnapshotStore::new());

        assert!(matches!(
            engine.remove_item(&LineKey::from("nope")),
            Err(CartError::ItemNotFound(_))
        ));
    }
}
