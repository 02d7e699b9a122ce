//! Exchange rate resolution.
//!
//! Rates are USD per unit of the quoted currency. A journal entry's debit
//! leg converts at the Buy rate, its credit leg at the Sell rate.

use std::collections::{BTreeMap, HashMap};

use cambio_shared::config::PostingConfig;
use cambio_shared::types::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{EntryType, LedgerError};

/// Side of the quote used for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateDirection {
    /// Rate at which the desk buys the currency.
    Buy,
    /// Rate at which the desk sells the currency.
    Sell,
}

impl RateDirection {
    /// Direction used for a journal leg.
    #[must_use]
    pub const fn for_leg(leg: EntryType) -> Self {
        match leg {
            EntryType::Debit => Self::Buy,
            EntryType::Credit => Self::Sell,
        }
    }
}

impl std::fmt::Display for RateDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

/// Source of exchange rates.
pub trait FxRateProvider: Send + Sync {
    /// USD per unit of `currency` for `direction`, if known.
    fn rate_for(&self, currency: Currency, direction: RateDirection) -> Option<Decimal>;
}

/// A buy/sell quote effective from a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Quoted currency.
    pub currency: Currency,
    /// Buy rate.
    pub buy: Decimal,
    /// Sell rate.
    pub sell: Decimal,
    /// When the quote became effective.
    pub effective_at: DateTime<Utc>,
}

impl RateQuote {
    fn rate(&self, direction: RateDirection) -> Decimal {
        match direction {
            RateDirection::Buy => self.buy,
            RateDirection::Sell => self.sell,
        }
    }
}

/// Time-ordered quote history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateHistory {
    quotes: Vec<RateQuote>,
}

impl RateHistory {
    /// Builds a history from quotes in any order.
    #[must_use]
    pub fn new(mut quotes: Vec<RateQuote>) -> Self {
        quotes.sort_by_key(|q| q.effective_at);
        Self { quotes }
    }

    /// Adds a quote, keeping the history ordered.
    pub fn push(&mut self, quote: RateQuote) {
        let at = self.quotes.partition_point(|q| q.effective_at <= quote.effective_at);
        self.quotes.insert(at, quote);
    }

    /// Most recent quote per currency effective at or before `now`.
    #[must_use]
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> RateSnapshot {
        let mut quotes = BTreeMap::new();
        for quote in self.quotes.iter().take_while(|q| q.effective_at <= now) {
            quotes.insert(quote.currency, quote.clone());
        }
        RateSnapshot { quotes, taken_at: now }
    }
}

/// Rates frozen at one instant and passed explicitly into posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSnapshot {
    quotes: BTreeMap<Currency, RateQuote>,
    /// Instant the snapshot represents.
    pub taken_at: DateTime<Utc>,
}

impl Default for RateSnapshot {
    fn default() -> Self {
        Self {
            quotes: BTreeMap::new(),
            taken_at: Utc::now(),
        }
    }
}

impl RateSnapshot {
    /// Adds or replaces the quote for a currency.
    #[must_use]
    pub fn with_rate(mut self, currency: Currency, buy: Decimal, sell: Decimal) -> Self {
        self.quotes.insert(
            currency,
            RateQuote {
                currency,
                buy,
                sell,
                effective_at: self.taken_at,
            },
        );
        self
    }

    /// Quote for a currency.
    #[must_use]
    pub fn quote(&self, currency: Currency) -> Option<&RateQuote> {
        self.quotes.get(&currency)
    }
}

impl FxRateProvider for RateSnapshot {
    fn rate_for(&self, currency: Currency, direction: RateDirection) -> Option<Decimal> {
        self.quotes.get(&currency).map(|q| q.rate(direction))
    }
}

/// Configured rates used when the provider has nothing usable.
///
/// One rate per currency, used for both directions.
#[derive(Debug, Clone, Default)]
pub struct FallbackRates {
    rates: HashMap<Currency, Decimal>,
}

impl FallbackRates {
    /// Reads fallback rates from posting configuration.
    ///
    /// Keys that are not known currencies are skipped; configuration
    /// validation rejects them at load time.
    #[must_use]
    pub fn from_config(config: &PostingConfig) -> Self {
        let rates = Currency::ALL
            .into_iter()
            .filter_map(|c| config.fallback_rate(c).map(|r| (c, r)))
            .collect();
        Self { rates }
    }

    /// Sets the fallback rate for a currency.
    #[must_use]
    pub fn with_rate(mut self, currency: Currency, rate: Decimal) -> Self {
        self.rates.insert(currency, rate);
        self
    }

    /// Fallback rate for a currency.
    #[must_use]
    pub fn rate(&self, currency: Currency) -> Option<Decimal> {
        self.rates.get(&currency).copied()
    }
}

/// Resolves a usable rate: provider first, then fallback.
pub struct RateResolver<'a> {
    provider: &'a dyn FxRateProvider,
    fallback: &'a FallbackRates,
}

impl<'a> RateResolver<'a> {
    /// Creates a resolver.
    #[must_use]
    pub fn new(provider: &'a dyn FxRateProvider, fallback: &'a FallbackRates) -> Self {
        Self { provider, fallback }
    }

    /// Returns a strictly positive rate for `currency` and `direction`.
    ///
    /// USD is always 1. Zero or negative rates count as missing.
    ///
    /// # Errors
    ///
    /// `RateUnavailable` when neither source has a positive rate.
    pub fn resolve(
        &self,
        currency: Currency,
        direction: RateDirection,
    ) -> Result<Decimal, LedgerError> {
        if currency.is_usd() {
            return Ok(Decimal::ONE);
        }
        self.provider
            .rate_for(currency, direction)
            .filter(|r| *r > Decimal::ZERO)
            .or_else(|| self.fallback.rate(currency).filter(|r| *r > Decimal::ZERO))
            .ok_or(LedgerError::RateUnavailable { currency, direction })
    }
}
