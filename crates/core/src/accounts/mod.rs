//! Chart of accounts.
//!
//! Accounts are identified by numeric codes and classified into the five
//! top-level classes. Group accounts only roll up their leaf descendants.

pub mod chart;
pub mod registry;
pub mod types;

pub use chart::ChartOfAccounts;
pub use registry::{AccountRegistry, AccountUpdate, validate_account};
pub use types::{Account, AccountRole, Classification, NormalSide};
