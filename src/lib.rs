//! `SportSphere` Shop
//!
//! Cart, pricing and checkout engine for the `SportSphere` shop: merchandise, match tickets,
//! club memberships, decoder hardware, TV subscriptions and bundled offers.
//!
//! A [`CartEngine`](cart::CartEngine) owns the cart and snapshots it after every mutation, an
//! [`OrderPricer`](quotes::OrderPricer) adds shipping and insurance, and
//! [`Checkout`](checkout::Checkout) charges a [`PaymentGateway`](payments::PaymentGateway) and
//! records the resulting [`Order`](orders::Order).

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod history;
pub mod observability;
pub mod orders;
pub mod payments;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod quotes;
pub mod render;
pub mod variants;
