//! Common types used across the application.

pub mod currency;
pub mod id;

pub use currency::{Currency, CurrencyParseError};
pub use id::*;
