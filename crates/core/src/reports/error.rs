//! Report error types.

use cambio_shared::types::AccountId;
use chrono::NaiveDate;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Group accounts have no transactions of their own.
    #[error("Account {0} is a group account")]
    GroupAccount(AccountId),

    /// Snapshot could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReportError {
    /// Returns the stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::GroupAccount(_) => "GROUP_ACCOUNT",
            Self::Store(e) => e.error_code(),
        }
    }
}
