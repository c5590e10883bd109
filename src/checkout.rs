//! Checkout
//!
//! Turns a cart and a quote into an [`Order`]. The gateway charge is the only await point:
//! every cart and history change happens synchronously after it resolves, so dropping the
//! future while the charge is pending leaves no trace.

use std::future::Future;

use jiff::Timestamp;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    cart::{engine::CartEngine, snapshot::SnapshotStore},
    history::{HistoryError, PurchaseHistory},
    orders::{Order, OrderError},
    payments::{ChargeOutcome, ChargeRequest, PaymentError, PaymentGateway, PaymentMethod},
    pricing::TotalPriceError,
    quotes::{OrderPricer, PricingError, Quote, ShippingOption},
};

/// Why an order could not be recorded after a successful charge.
#[derive(Debug, Error, PartialEq)]
pub enum OrderFailure {
    /// The order could not be built from the cart.
    #[error(transparent)]
    Build(#[from] OrderError),

    /// The purchase history refused the order.
    #[error(transparent)]
    Record(#[from] HistoryError),
}

/// Errors that can occur during checkout.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// There is nothing to check out.
    #[error("cart is empty")]
    EmptyCart,

    /// Payment details are incomplete.
    #[error("invalid payment method: {0}")]
    InvalidPaymentMethod(#[from] PaymentError),

    /// The quote was computed for a different cart.
    #[error("quote subtotal {quoted} does not match cart subtotal {current}")]
    StaleQuote {
        /// Subtotal on the quote
        quoted: String,
        /// Current cart subtotal
        current: String,
    },

    /// The gateway declined the charge. Nothing changed; retrying is safe.
    #[error("payment declined: {reason}")]
    PaymentDeclined {
        /// Reason given by the gateway
        reason: String,
    },

    /// The charge succeeded but no order was recorded. The cart is kept for reconciliation.
    #[error("payment {payment_reference} succeeded but the order could not be recorded: {source}")]
    OrderConstructionFailed {
        /// Gateway reference of the captured charge
        payment_reference: String,
        /// What went wrong
        source: OrderFailure,
    },

    /// The shopper left checkout before the charge resolved.
    #[error("checkout abandoned")]
    Abandoned,

    /// Error computing the quote.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Error computing the cart subtotal.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),
}

/// Checkout
#[derive(Debug)]
pub struct Checkout<G, H> {
    pricer: OrderPricer,
    gateway: G,
    history: H,
}

impl<G: PaymentGateway, H: PurchaseHistory> Checkout<G, H> {
    /// Create a checkout over the given pricer, gateway and purchase history.
    pub fn new(pricer: OrderPricer, gateway: G, history: H) -> Self {
        Self {
            pricer,
            gateway,
            history,
        }
    }

    /// The pricer used for quotes.
    pub fn pricer(&self) -> &OrderPricer {
        &self.pricer
    }

    /// The payment gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The purchase history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Quote the engine's current cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::TotalPrice`] if the subtotal overflows, or
    /// [`CheckoutError::Pricing`] as for [`OrderPricer::quote`].
    pub fn quote<S: SnapshotStore>(
        &self,
        engine: &CartEngine<S>,
        shipping: ShippingOption,
        insured: bool,
    ) -> Result<Quote, CheckoutError> {
        Ok(self.pricer.quote(engine.subtotal()?, shipping, insured)?)
    }

    /// Charge the quote total and, on approval, record the order and clear the cart.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`]: the cart has no items.
    /// - [`CheckoutError::InvalidPaymentMethod`]: payment details are incomplete.
    /// - [`CheckoutError::StaleQuote`]: the quote subtotal differs from the cart subtotal.
    /// - [`CheckoutError::PaymentDeclined`]: the gateway declined; the cart is unchanged.
    /// - [`CheckoutError::OrderConstructionFailed`]: the charge succeeded but the order could
    ///   not be built or recorded; the cart is unchanged.
    #[tracing::instrument(
        skip_all,
        fields(total = %quote.total(), method = %payment_method.label())
    )]
    pub async fn finalize_order<S: SnapshotStore>(
        &mut self,
        engine: &mut CartEngine<S>,
        quote: &Quote,
        payment_method: &PaymentMethod,
    ) -> Result<Order, CheckoutError> {
        if engine.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        payment_method.validate()?;

        let current = engine.subtotal()?;

        if current != quote.subtotal() {
            return Err(CheckoutError::StaleQuote {
                quoted: quote.subtotal().to_string(),
                current: current.to_string(),
            });
        }

        let outcome = self
            .gateway
            .charge(ChargeRequest {
                amount: quote.total(),
                method: payment_method.label(),
            })
            .await;

        let payment_reference = match outcome {
            ChargeOutcome::Approved { reference } => reference,
            ChargeOutcome::Declined { reason } => {
                info!(%reason, "payment declined");
                return Err(CheckoutError::PaymentDeclined { reason });
            }
        };

        let order = Order::place(
            engine.items().to_vec(),
            quote,
            payment_method.label(),
            payment_reference.clone(),
            Timestamp::now(),
        )
        .map_err(OrderFailure::from)
        .and_then(|order| {
            self.history.record(order.clone())?;
            Ok(order)
        })
        .map_err(|source| {
            warn!(%payment_reference, error = %source, "charged but failed to record order");
            CheckoutError::OrderConstructionFailed {
                payment_reference: payment_reference.clone(),
                source,
            }
        })?;

        engine.clear();

        info!(
            order_id = %order.id(),
            tracking_number = %order.tracking_number(),
            total = %order.total(),
            "order placed"
        );

        Ok(order)
    }

    /// [`Checkout::finalize_order`], unless `abandon` completes first.
    ///
    /// Abandoning drops the pending charge; a result arriving later is never applied.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Abandoned`] if `abandon` wins, otherwise as
    /// [`Checkout::finalize_order`].
    pub async fn finalize_order_or_abandon<S: SnapshotStore>(
        &mut self,
        engine: &mut CartEngine<S>,
        quote: &Quote,
        payment_method: &PaymentMethod,
        abandon: impl Future<Output = ()>,
    ) -> Result<Order, CheckoutError> {
        tokio::select! {
            biased;

            () = abandon => {
                info!("checkout abandoned");
                Err(CheckoutError::Abandoned)
            }
            result = self.finalize_order(engine, quote, payment_method) => result,
        }
    }
}
