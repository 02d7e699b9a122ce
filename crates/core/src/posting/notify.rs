//! Posting notifications.

use async_trait::async_trait;
use cambio_shared::types::{JournalEntryId, TransactionId};
use serde::Serialize;
use thiserror::Error;

/// Emitted after entries are written.
#[derive(Debug, Clone, Serialize)]
pub struct PostingNotice {
    /// Source transaction, if the posting came from one.
    pub transaction_id: Option<TransactionId>,
    /// Description of the posting.
    pub description: String,
    /// Written entry ids.
    pub entries: Vec<JournalEntryId>,
}

/// Delivery failure.
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Receiver of posting notices.
///
/// Delivery is best effort: failures are logged by the caller and never
/// undo a posting.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers a notice.
    async fn notify(&self, notice: &PostingNotice) -> Result<(), NotifyError>;
}

/// Sink that drops every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn notify(&self, _notice: &PostingNotice) -> Result<(), NotifyError> {
        Ok(())
    }
}
