//! Reconciliation safeguards.
//!
//! Pre-checks run before posting and fail closed. Post-hoc verification
//! reports duplicates and imbalances but never repairs them; repair is a
//! separate, explicit operator action.

pub mod duplicates;
pub mod guard;
pub mod types;

pub use guard::ReconciliationGuard;
pub use types::{
    CleanupReport, ClientBalanceCheck, DuplicateRecordCheck, DuplicateRecordConflict,
    ExistingEntriesCheck, ReconciliationReport, ReconciliationStatus, RecordUsageCheck,
    RecordUsageConflict,
};
