//! Configuration

use clap::Args;
use rusty_money::iso::Currency;
use thiserror::Error;
use till::money::find_currency;

mod backend;
mod logging;
mod storage;

pub use backend::BackendConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use storage::StorageConfig;

/// Errors raised while resolving configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured currency is not a known ISO 4217 code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Till configuration, shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct TillConfig {
    /// Backend connection settings.
    #[command(flatten)]
    pub backend: BackendConfig,

    /// Local state and receipt locations.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// ISO 4217 code used to format amounts
    #[arg(long, env = "TILL_CURRENCY", default_value = "CLP", global = true)]
    pub currency: String,
}

impl TillConfig {
    /// Resolve the configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the code is not recognised.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        find_currency(&self.currency)
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }
}
