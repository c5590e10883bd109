//! Shop configuration
//!
//! Settings come from command line flags with environment fallbacks; a `.env` file is read
//! first when present.

use std::path::PathBuf;

use clap::Args;
use thiserror::Error;

use crate::{
    cart::snapshot::FileSnapshotStore,
    catalog::{Catalog, CatalogError},
    payments::{DEFAULT_SUCCESS_RATE, PaymentError, SimulatedGateway},
};

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The success rate is not a number.
    #[error("payment success rate {0:?} is not a number")]
    NotANumber(String),

    /// The success rate is outside `[0, 1]`.
    #[error("payment success rate must be between 0 and 1, got {0}")]
    SuccessRateOutOfRange(f64),
}

/// Parse a payment success rate in `[0, 1]`.
///
/// # Errors
///
/// Returns a [`ConfigError`] for non-numeric or out-of-range values.
pub fn parse_success_rate(value: &str) -> Result<f64, ConfigError> {
    let rate = value
        .trim()
        .parse::<f64>()
        .map_err(|_err| ConfigError::NotANumber(value.to_string()))?;

    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::SuccessRateOutOfRange(rate))
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Catalog and cart storage settings.
#[derive(Debug, Args)]
pub struct StoreConfig {
    /// Catalog YAML file; the bundled `SportSphere` catalog when omitted
    #[arg(long, env = "SHOP_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Directory holding the cart snapshot
    #[arg(long, env = "SHOP_DATA_DIR", default_value = ".sportsphere", global = true)]
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Load the configured catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the catalog cannot be read or is invalid.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog {
            Some(path) => Catalog::load(path),
            None => Catalog::bundled(),
        }
    }

    /// Snapshot store in the data directory.
    pub fn snapshot_store(&self) -> FileSnapshotStore {
        FileSnapshotStore::new(&self.data_dir)
    }
}

/// Payment simulation settings.
#[derive(Debug, Args)]
pub struct PaymentConfig {
    /// Share of simulated charges that succeed, between 0 and 1
    #[arg(
        long,
        env = "SHOP_PAYMENT_SUCCESS_RATE",
        default_value_t = DEFAULT_SUCCESS_RATE,
        value_parser = parse_success_rate,
        global = true
    )]
    pub payment_success_rate: f64,

    /// Seed for reproducible simulated payments
    #[arg(long, env = "SHOP_PAYMENT_SEED", global = true)]
    pub payment_seed: Option<u64>,
}

impl PaymentConfig {
    /// Build the simulated gateway.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidSuccessRate`] if the rate is outside `[0, 1]`.
    pub fn gateway(&self) -> Result<SimulatedGateway, PaymentError> {
        match self.payment_seed {
            Some(seed) => SimulatedGateway::seeded(self.payment_success_rate, seed),
            None => SimulatedGateway::new(self.payment_success_rate),
        }
    }
}

/// Shop configuration
#[derive(Debug, Args)]
pub struct ShopConfig {
    /// Catalog and storage settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Payment settings.
    #[command(flatten)]
    pub payment: PaymentConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ShopConfig,
    }

    #[test]
    fn success_rate_accepts_bounds() -> TestResult {
        assert!((parse_success_rate("0")? - 0.0).abs() < f64::EPSILON);
        assert!((parse_success_rate(" 1.0 ")? - 1.0).abs() < f64::EPSILON);

        Ok(())
    }

    #[test]
    fn success_rate_rejects_out_of_range() {
        assert_eq!(
            parse_success_rate("1.5"),
            Err(ConfigError::SuccessRateOutOfRange(1.5))
        );
    }

    #[test]
    fn success_rate_rejects_text() {
        assert_eq!(
            parse_success_rate("often"),
            Err(ConfigError::NotANumber("often".to_string()))
        );
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let cli = TestCli::try_parse_from([
            "shop",
            "--catalog",
            "shop.yml",
            "--data-dir",
            "/tmp/cart",
            "--payment-success-rate",
            "0.25",
            "--payment-seed",
            "9",
            "--log-format",
            "json",
        ])?;

        assert_eq!(cli.config.store.catalog, Some(PathBuf::from("shop.yml")));
        assert_eq!(cli.config.store.data_dir, PathBuf::from("/tmp/cart"));
        assert!((cli.config.payment.payment_success_rate - 0.25).abs() < f64::EPSILON);
        assert_eq!(cli.config.payment.payment_seed, Some(9));
        assert_eq!(cli.config.logging.log_format, LogFormat::Json);

        Ok(())
    }

    #[test]
    fn invalid_success_rate_flag_is_a_parse_error() {
        let result = TestCli::try_parse_from(["shop", "--payment-success-rate", "2"]);

        assert!(result.is_err());
    }

    #[test]
    fn seeded_gateway_uses_configured_rate() -> TestResult {
        let cli = TestCli::try_parse_from(["shop", "--payment-success-rate", "0.5", "--payment-seed", "1"])?;

        let gateway = cli.config.payment.gateway()?;

        assert!((gateway.success_rate() - 0.5).abs() < f64::EPSILON);

        Ok(())
    }
}
