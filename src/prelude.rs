//! `SportSphere` Shop prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        Cart, CartEngine, CartError, CartLineItem, LineKey,
        snapshot::{
            CartSnapshot, FileSnapshotStore, MemorySnapshotStore, SnapshotError, SnapshotStore,
        },
    },
    catalog::{Catalog, CatalogError},
    checkout::{Checkout, CheckoutError, OrderFailure},
    history::{HistoryError, InMemoryPurchaseHistory, PurchaseHistory},
    orders::{Order, OrderError, OrderId, OrderStatus, TrackingNumber},
    payments::{
        CardDetails, ChargeOutcome, ChargeRequest, PaymentError, PaymentGateway, PaymentMethod,
        SimulatedGateway,
    },
    pricing::TotalPriceError,
    products::{MembershipTier, Product, ProductKind, ProductType, TicketClass},
    quotes::{OrderPricer, PricingConfig, PricingError, Quote, ShippingOption},
    render::RenderError,
    variants::{VariantAxis, VariantError, VariantSelection},
};
