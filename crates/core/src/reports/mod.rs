//! Financial report generation.
//!
//! Pure functions over a [`crate::ledger::LedgerSnapshot`]:
//! - Account Balances
//! - Account Transactions
//! - Trial Balance
//! - Income Statement
//! - Cash Flow

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
