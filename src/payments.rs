//! Payments
//!
//! The gateway is the only asynchronous collaborator of checkout. [`SimulatedGateway`]
//! stands in for a real provider by approving a configurable share of charges.

use std::{
    fmt::{self, Debug, Formatter},
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use mockall::automock;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::debug;

/// Share of simulated charges that are approved by default.
pub const DEFAULT_SUCCESS_RATE: f64 = 0.9;

/// Mobile money providers offered at checkout.
pub const MOBILE_MONEY_PROVIDERS: [&str; 3] = ["M-Pesa", "Tigo Pesa", "Airtel Money"];

/// Errors validating payment details or gateway settings.
#[derive(Debug, Error, PartialEq)]
pub enum PaymentError {
    /// A required card field is blank.
    #[error("card {0} is required")]
    IncompleteCard(&'static str),

    /// No mobile money provider was given.
    #[error("mobile money provider is required")]
    MissingProvider,

    /// No mobile money number was given.
    #[error("mobile money number is required")]
    MissingNumber,

    /// Success rate outside `[0, 1]`.
    #[error("success rate must be between 0 and 1, got {0}")]
    InvalidSuccessRate(f64),
}

/// Card details as entered by the shopper.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    /// Card number
    pub number: String,

    /// Cardholder name
    pub holder: String,

    /// Expiry, `MM/YY`
    pub expiry: String,

    /// Security code
    pub cvv: String,
}

impl Debug for CardDetails {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let last_four: String = self
            .number
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        f.debug_struct("CardDetails")
            .field("number", &format_args!("****{last_four}"))
            .field("holder", &self.holder)
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .finish()
    }
}

/// How the shopper pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Credit or debit card
    Card(CardDetails),

    /// Mobile money wallet
    MobileMoney {
        /// Provider name, e.g. "M-Pesa"
        provider: String,
        /// Wallet phone number
        number: String,
    },
}

impl PaymentMethod {
    /// Identifier recorded on the order: `Credit Card` or the mobile money provider.
    pub fn label(&self) -> String {
        match self {
            Self::Card(_) => "Credit Card".to_string(),
            Self::MobileMoney { provider, .. } => provider.trim().to_string(),
        }
    }

    /// Check that every required field is filled in.
    ///
    /// # Errors
    ///
    /// Returns the first missing field as a [`PaymentError`].
    pub fn validate(&self) -> Result<(), PaymentError> {
        match self {
            Self::Card(card) => [
                ("number", &card.number),
                ("holder name", &card.holder),
                ("expiry", &card.expiry),
                ("cvv", &card.cvv),
            ]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map_or(Ok(()), |(field, _)| Err(PaymentError::IncompleteCard(field))),
            Self::MobileMoney { provider, number } => {
                if provider.trim().is_empty() {
                    Err(PaymentError::MissingProvider)
                } else if number.trim().is_empty() {
                    Err(PaymentError::MissingNumber)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A single charge attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    /// Amount to charge
    pub amount: Money<'static, Currency>,

    /// Payment method label
    pub method: String,
}

/// Result of a charge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// Funds were captured.
    Approved {
        /// Gateway reference for reconciliation
        reference: String,
    },

    /// The charge was refused; nothing was captured.
    Declined {
        /// Reason given by the gateway
        reason: String,
    },
}

/// Payment gateway.
#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempt to charge `request.amount` using `request.method`.
    async fn charge(&self, request: ChargeRequest) -> ChargeOutcome;
}

/// Gateway that approves a fixed share of charges at random.
pub struct SimulatedGateway {
    success_rate: f64,
    rng: Mutex<StdRng>,
}

impl Debug for SimulatedGateway {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedGateway")
            .field("success_rate", &self.success_rate)
            .finish_non_exhaustive()
    }
}

impl SimulatedGateway {
    /// Approve charges with probability `success_rate`, seeded from the OS.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidSuccessRate`] unless `0 <= success_rate <= 1`.
    pub fn new(success_rate: f64) -> Result<Self, PaymentError> {
        Self::with_rng(success_rate, StdRng::from_entropy())
    }

    /// Like [`SimulatedGateway::new`] but reproducible for a given seed.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidSuccessRate`] unless `0 <= success_rate <= 1`.
    pub fn seeded(success_rate: f64, seed: u64) -> Result<Self, PaymentError> {
        Self::with_rng(success_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(success_rate: f64, rng: StdRng) -> Result<Self, PaymentError> {
        if !(0.0..=1.0).contains(&success_rate) {
            return Err(PaymentError::InvalidSuccessRate(success_rate));
        }

        Ok(Self {
            success_rate,
            rng: Mutex::new(rng),
        })
    }

    /// Share of charges that are approved.
    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: ChargeRequest) -> ChargeOutcome {
        let (approved, reference) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            (rng.gen_bool(self.success_rate), rng.r#gen::<u32>())
        };

        debug!(amount = %request.amount, method = %request.method, approved, "simulated charge");

        if approved {
            ChargeOutcome::Approved {
                reference: format!("PAY-{reference:08X}"),
            }
        } else {
            ChargeOutcome::Declined {
                reason: "Payment failed. Please try again.".to_string(),
            }
        }
    }
}
