//! Currency conversion and exchange rate resolution.
//!
//! - USD conversion with Banker's Rounding (4 decimal places)
//! - Buy/Sell rate lookup from an explicit snapshot, with configured fallbacks

pub mod rates;
pub mod service;

pub use rates::{
    FallbackRates, FxRateProvider, RateDirection, RateHistory, RateQuote, RateResolver,
    RateSnapshot,
};
pub use service::CurrencyService;
