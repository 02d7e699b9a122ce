//! Application configuration management.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Document store access settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Auto-posting settings.
    #[serde(default)]
    pub posting: PostingConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Upper bound for a single store call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Returns the store timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Auto-posting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PostingConfig {
    /// Account credited with transaction fees.
    #[serde(default = "default_fee_income_account")]
    pub fee_income_account: String,
    /// Account debited with transaction expenses.
    #[serde(default = "default_expense_account")]
    pub expense_account: String,
    /// Also post the principal movement against the client's account.
    #[serde(default)]
    pub post_principal: bool,
    /// Run the post-posting reconciliation synchronously after each posting.
    #[serde(default = "default_true")]
    pub reconcile_after_posting: bool,
    /// USD value of one unit, keyed by currency code, used when the rate
    /// provider has no rate.
    #[serde(default)]
    pub fallback_rates: HashMap<String, Decimal>,
}

fn default_fee_income_account() -> String {
    "4001".to_string()
}

fn default_expense_account() -> String {
    "5001".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            fee_income_account: default_fee_income_account(),
            expense_account: default_expense_account(),
            post_principal: false,
            reconcile_after_posting: true,
            fallback_rates: HashMap::new(),
        }
    }
}

impl PostingConfig {
    /// Returns the configured fallback rate for a currency, if any.
    #[must_use]
    pub fn fallback_rate(&self, currency: Currency) -> Option<Decimal> {
        self.fallback_rates
            .iter()
            .find(|(code, _)| Currency::from_str(code).is_ok_and(|c| c == currency))
            .map(|(_, rate)| *rate)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "cambio=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default`, `config/{RUN_MODE}`, `CAMBIO__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("CAMBIO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but make no sense.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` describing the first invalid value.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.store.timeout_ms == 0 {
            return Err(config::ConfigError::Message(
                "store.timeout_ms must be greater than zero".to_string(),
            ));
        }
        for (code, rate) in &self.posting.fallback_rates {
            Currency::from_str(code)
                .map_err(|e| config::ConfigError::Message(e.to_string()))?;
            if *rate <= Decimal::ZERO {
                return Err(config::ConfigError::Message(format!(
                    "posting.fallback_rates.{code} must be positive"
                )));
            }
        }
        Ok(())
    }
}
