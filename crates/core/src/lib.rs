//! Ledger integrity and financial reporting engine for Cambio.
//!
//! This crate contains the double-entry core of the exchange back office.
//! It talks to persistence only through the [`store::DocumentStore`] port.
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts registry
//! - `ledger` - Journal entries, balance calculation, posting validation
//! - `reconciliation` - Duplicate/unbalanced posting safeguards and repair
//! - `posting` - Auto-posting of fees, expenses and manual entries
//! - `currency` - USD conversion and FX rate resolution
//! - `reports` - Trial balance, account balances, income statement, cash flow
//! - `store` - Document store port and typed ledger access

pub mod accounts;
pub mod currency;
pub mod ledger;
pub mod posting;
pub mod reconciliation;
pub mod reports;
pub mod store;
