//! Cart snapshots
//!
//! The cart is persisted as a single JSON document under [`SNAPSHOT_KEY`]. A snapshot
//! carries everything needed to rebuild the cart without consulting the catalog.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartLineItem, LineKey},
    products::ProductType,
    variants::VariantSelection,
};

/// Storage key for the cart snapshot.
pub const SNAPSHOT_KEY: &str = "sportSphereCart";

const SNAPSHOT_VERSION: u32 = 1;

/// Errors reading or writing cart snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error reading or writing the snapshot
    #[error("snapshot io error: {0}")]
    Io(#[from] io::Error),

    /// The snapshot is not valid JSON for this format
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot was written by an unknown format version
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    /// The snapshot currency differs from the cart currency
    #[error("snapshot has currency {found}, expected {expected}")]
    CurrencyMismatch {
        /// Expected currency code
        expected: &'static str,
        /// Currency code found in the snapshot
        found: String,
    },

    /// The snapshot items violate a cart invariant
    #[error("invalid snapshot items: {0}")]
    InvalidCart(#[from] CartError),
}

/// Serialized form of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Format version
    pub version: u32,

    /// ISO currency code of every price in the snapshot
    pub currency: String,

    /// Line items in cart order
    pub items: Vec<SnapshotLineItem>,
}

/// Serialized form of a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLineItem {
    /// Line key
    pub key: LineKey,

    /// Catalog id of the product
    pub product_id: String,

    /// Product family
    pub product_type: ProductType,

    /// Variant selection
    #[serde(default)]
    pub variant: VariantSelection,

    /// Display name
    pub name: String,

    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Unit price in minor units of the snapshot currency
    pub unit_price_minor: i64,

    /// Quantity
    pub quantity: u32,
}

impl From<&Cart> for CartSnapshot {
    fn from(cart: &Cart) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            currency: cart.currency().iso_alpha_code.to_string(),
            items: cart
                .iter()
                .map(|item| SnapshotLineItem {
                    key: item.key().clone(),
                    product_id: item.product_id().to_string(),
                    product_type: item.product_type(),
                    variant: item.variant().clone(),
                    name: item.name().to_string(),
                    image: item.image().map(str::to_string),
                    unit_price_minor: item.unit_price().to_minor_units(),
                    quantity: item.quantity(),
                })
                .collect(),
        }
    }
}

impl CartSnapshot {
    /// Rebuild a cart priced in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the version or currency do not match, or the items
    /// violate a cart invariant.
    pub fn into_cart(self, currency: &'static Currency) -> Result<Cart, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }

        if self.currency != currency.iso_alpha_code {
            return Err(SnapshotError::CurrencyMismatch {
                expected: currency.iso_alpha_code,
                found: self.currency,
            });
        }

        let items: Vec<CartLineItem> = self
            .items
            .into_iter()
            .map(|item| CartLineItem {
                key: item.key,
                product_id: item.product_id,
                product_type: item.product_type,
                variant: item.variant,
                name: item.name,
                image: item.image,
                unit_price: Money::from_minor(item.unit_price_minor, currency),
                quantity: item.quantity,
            })
            .collect();

        Ok(Cart::with_items(items, currency)?)
    }

    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Local key-value storage for the cart snapshot.
pub trait SnapshotStore {
    /// Load the last saved snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the snapshot exists but cannot be read or decoded.
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError>;

    /// Replace the saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the snapshot cannot be written.
    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), SnapshotError>;
}

/// Snapshot stored as `<dir>/sportSphereCart.json`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Store snapshots inside `dir`; the directory is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SNAPSHOT_KEY}.json")),
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(Some(CartSnapshot::from_json(&json)?)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), SnapshotError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        // Replace atomically: write a sibling file, then rename over the snapshot.
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, snapshot.to_json()?)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}

/// In-memory snapshot store holding the encoded JSON document.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    json: Option<String>,
    read_only: bool,
    writes: usize,
}

impl MemorySnapshotStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with an encoded snapshot.
    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
            ..Self::default()
        }
    }

    /// A store whose writes always fail, e.g. to simulate an exhausted quota.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// The stored JSON document, if any.
    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError> {
        self.json
            .as_deref()
            .map(CartSnapshot::from_json)
            .transpose()
    }

    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), SnapshotError> {
        if self.read_only {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "snapshot storage is read-only").into());
        }

        self.json = Some(snapshot.to_json()?);
        self.writes += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{TZS, USD};
    use testresult::TestResult;

    use super::*;

    fn cart() -> Result<Cart, CartError> {
        Cart::with_items(
            [
                CartLineItem {
                    key: LineKey::from("ticket_1-VIP"),
                    product_id: "ticket_1".to_string(),
                    product_type: ProductType::Ticket,
                    variant: VariantSelection::ticket("VIP"),
                    name: "Ticket: Young Africans SC vs Simba SC (VIP)".to_string(),
                    image: Some("https://placehold.co/400x400/22c55e/ffffff?text=Ticket".to_string()),
                    unit_price: Money::from_minor(30_000_00, TZS),
                    quantity: 2,
                },
                CartLineItem {
                    key: LineKey::from("sub_basic_1m"),
                    product_id: "sub_basic_1m".to_string(),
                    product_type: ProductType::Subscription,
                    variant: VariantSelection::default(),
                    name: "Basic".to_string(),
                    image: None,
                    unit_price: Money::from_minor(20_000_00, TZS),
                    quantity: 1,
                },
            ],
            TZS,
        )
    }

    #[test]
    fn snapshot_round_trips_through_json() -> TestResult {
        let cart = cart()?;

        let json = CartSnapshot::from(&cart).to_json()?;
        let restored = CartSnapshot::from_json(&json)?.into_cart(TZS)?;

        assert_eq!(restored, cart);
        assert_eq!(restored.subtotal()?, cart.subtotal()?);

        Ok(())
    }

    #[test]
    fn snapshot_uses_minor_units_and_currency_code() -> TestResult {
        let snapshot = CartSnapshot::from(&cart()?);

        assert_eq!(snapshot.currency, "TZS");
        assert_eq!(snapshot.items.first().map(|item| item.unit_price_minor), Some(3_000_000));

        Ok(())
    }

    #[test]
    fn into_cart_rejects_other_currency() -> TestResult {
        let snapshot = CartSnapshot::from(&cart()?);

        assert!(matches!(
            snapshot.into_cart(USD),
            Err(SnapshotError::CurrencyMismatch { expected: "USD", .. })
        ));

        Ok(())
    }

    #[test]
    fn into_cart_rejects_unknown_version() -> TestResult {
        let mut snapshot = CartSnapshot::from(&cart()?);
        snapshot.version = 7;

        assert!(matches!(
            snapshot.into_cart(TZS),
            Err(SnapshotError::UnsupportedVersion(7))
        ));

        Ok(())
    }

    #[test]
    fn into_cart_rejects_zero_quantity() -> TestResult {
        let json = r#"{
            "version": 1,
            "currency": "TZS",
            "items": [{
                "key": "azam_kit",
                "product_id": "azam_kit",
                "product_type": "hardware",
                "name": "Full Decoder Kit",
                "unit_price_minor": 15000000,
                "quantity": 0
            }]
        }"#;

        assert!(matches!(
            CartSnapshot::from_json(json)?.into_cart(TZS),
            Err(SnapshotError::InvalidCart(CartError::InvalidQuantity(0)))
        ));

        Ok(())
    }

    #[test]
    fn into_cart_rejects_negative_unit_price() -> TestResult {
        let json = r#"{
            "version": 1,
            "currency": "TZS",
            "items": [{
                "key": "azam_kit",
                "product_id": "azam_kit",
                "product_type": "hardware",
                "name": "Full Decoder Kit",
                "unit_price_minor": -500,
                "quantity": 1
            }]
        }"#;

        assert!(matches!(
            CartSnapshot::from_json(json)?.into_cart(TZS),
            Err(SnapshotError::InvalidCart(CartError::InvalidPrice(ref key))) if key.as_str() == "azam_kit"
        ));

        Ok(())
    }

    #[test]
    fn snapshot_fields_use_snake_case_names() -> TestResult {
        let json = CartSnapshot::from(&cart()?).to_json()?;

        assert!(json.contains("\"product_type\": \"ticket\""));
        assert!(json.contains("\"unit_price_minor\": 3000000"));

        Ok(())
    }

    #[test]
    fn memory_store_starts_empty_and_counts_writes() -> TestResult {
        let mut store = MemorySnapshotStore::new();

        assert!(store.load()?.is_none());

        store.save(&CartSnapshot::from(&cart()?))?;

        assert_eq!(store.writes(), 1);
        assert!(store.load()?.is_some());

        Ok(())
    }

    #[test]
    fn read_only_store_rejects_writes() -> TestResult {
        let mut store = MemorySnapshotStore::read_only();

        assert!(matches!(
            store.save(&CartSnapshot::from(&cart()?)),
            Err(SnapshotError::Io(_))
        ));

        Ok(())
    }

    #[test]
    fn file_store_missing_file_loads_none() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileSnapshotStore::new(dir.path());

        assert!(store.load()?.is_none());

        Ok(())
    }

    #[test]
    fn file_store_round_trips() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileSnapshotStore::new(dir.path().join("nested"));
        let snapshot = CartSnapshot::from(&cart()?);

        store.save(&snapshot)?;

        assert!(store.path().ends_with("sportSphereCart.json"));
        assert_eq!(store.load()?, Some(snapshot));

        Ok(())
    }
}
