//! Auto-posting engine.
//!
//! Turns confirmed exchange transactions into fee/expense journal entries
//! and converts manual submissions in foreign currencies into USD-valued
//! entries.

pub mod derive;
pub mod engine;
pub mod manual;
pub mod notify;
pub mod types;

pub use derive::{PostingAccounts, derive_fee_entries, derive_principal_entry};
pub use engine::PostingEngine;
pub use notify::{NotificationSink, NotifyError, NullSink, PostingNotice};
pub use types::{
    Client, ManualEntryLine, ManualSubmission, PostingOutcome, RecordStatus, RecordType,
    SourceRecord, SourceRecordRef, Transaction, TransactionStatus, TransactionType,
};
