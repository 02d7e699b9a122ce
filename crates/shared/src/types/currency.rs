//! Closed set of currencies handled by the ledger.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Currencies an account may be denominated in.
///
/// Closed set: account documents carrying any other code are rejected
/// when they enter the ledger core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar (reporting currency).
    Usd,
    /// Tether USD stablecoin.
    Usdt,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// UAE Dirham
    Aed,
    /// Turkish Lira
    Try,
}

/// Error returned when a currency code is not part of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown currency: {0}")]
pub struct CurrencyParseError(pub String);

impl Currency {
    /// All supported currencies.
    pub const ALL: [Self; 6] = [
        Self::Usd,
        Self::Usdt,
        Self::Eur,
        Self::Gbp,
        Self::Aed,
        Self::Try,
    ];

    /// Returns true for the reporting currency.
    #[must_use]
    pub const fn is_usd(self) -> bool {
        matches!(self, Self::Usd)
    }

    /// Returns the ISO-style code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Usdt => "USDT",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Aed => "AED",
            Self::Try => "TRY",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = CurrencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "USDT" => Ok(Self::Usdt),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "AED" => Ok(Self::Aed),
            "TRY" => Ok(Self::Try),
            _ => Err(CurrencyParseError(s.to_string())),
        }
    }
}
