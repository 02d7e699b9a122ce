//! USD conversion with Banker's Rounding.

use cambio_shared::types::Currency;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

use super::rates::{RateDirection, RateResolver};
use crate::ledger::LedgerError;

/// Decimal places kept on converted amounts.
pub const CONVERSION_DP: u32 = 4;

/// Currency service for conversion operations.
///
/// Rates are quoted as USD per unit of the foreign currency. Results are
/// rounded with `RoundingStrategy::MidpointNearestEven`:
/// - 2.5 → 2, 3.5 → 4
/// - 2.25 → 2.2, 2.35 → 2.4 (at 1 decimal)
pub struct CurrencyService;

impl CurrencyService {
    /// Converts `amount` at `rate`, rounded to 4 decimal places.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use cambio_core::currency::CurrencyService;
    ///
    /// let result = CurrencyService::convert(dec!(100), dec!(1.0825));
    /// assert_eq!(result, dec!(108.2500));
    /// ```
    #[must_use]
    pub fn convert(amount: Decimal, rate: Decimal) -> Decimal {
        Self::round(amount * rate, CONVERSION_DP)
    }

    /// Round a decimal value using Banker's Rounding.
    #[must_use]
    pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
    }

    /// Converts a native amount to USD with the rate for `direction`.
    ///
    /// USD amounts pass through unchanged.
    ///
    /// # Errors
    ///
    /// `RateUnavailable` if neither the provider nor the fallback has a
    /// positive rate.
    pub fn to_usd(
        amount: Decimal,
        currency: Currency,
        direction: RateDirection,
        rates: &RateResolver<'_>,
    ) -> Result<Decimal, LedgerError> {
        if currency.is_usd() {
            return Ok(amount);
        }
        let rate = rates.resolve(currency, direction)?;
        Ok(Self::convert(amount, rate))
    }
}
