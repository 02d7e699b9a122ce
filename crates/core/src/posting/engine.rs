//! Auto-posting workflow.
//!
//! ```text
//! confirmed? -> guard pre-checks -> derive -> validate -> allocate ids
//!            -> write entries -> mark records used -> notify -> reconcile
//! ```
//!
//! Any failure before the records are marked leaves the journal and the
//! records as they were: written entries are deleted and record statuses
//! restored.

use std::sync::Arc;
use std::time::Duration;

use cambio_shared::config::PostingConfig;
use cambio_shared::types::{JournalEntryId, TransactionId};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use super::derive::{PostingAccounts, derive_fee_entries, derive_principal_entry};
use super::manual::{resolve_submission, submission_currencies};
use super::notify::{NotificationSink, NullSink, PostingNotice};
use super::types::{
    ManualSubmission, PostingOutcome, RecordStatus, SourceRecordRef, TransactionStatus,
};
use crate::accounts::ChartOfAccounts;
use crate::currency::{FallbackRates, FxRateProvider, RateResolver};
use crate::ledger::{LedgerError, NewJournalEntry, validate_posting_set};
use crate::reconciliation::{ReconciliationGuard, ReconciliationStatus};
use crate::store::{DocumentStore, LedgerStore};

/// Posts confirmed transactions and manual submissions to the journal.
pub struct PostingEngine<S: ?Sized> {
    store: LedgerStore<S>,
    guard: ReconciliationGuard<S>,
    accounts: PostingAccounts,
    fallback: FallbackRates,
    post_principal: bool,
    reconcile_after_posting: bool,
    notifier: Arc<dyn NotificationSink>,
    notify_timeout: Duration,
}

impl<S: DocumentStore + ?Sized> PostingEngine<S> {
    /// Creates an engine that drops notifications.
    #[must_use]
    pub fn new(store: LedgerStore<S>, config: &PostingConfig) -> Self {
        let notify_timeout = store.timeout();
        Self {
            guard: ReconciliationGuard::new(store.clone())
                .with_client_balance_check(config.post_principal),
            store,
            accounts: PostingAccounts::from_config(config),
            fallback: FallbackRates::from_config(config),
            post_principal: config.post_principal,
            reconcile_after_posting: config.reconcile_after_posting,
            notifier: Arc::new(NullSink),
            notify_timeout,
        }
    }

    /// Replaces the notification sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The guard used for pre-checks and reconciliation.
    #[must_use]
    pub fn guard(&self) -> &ReconciliationGuard<S> {
        &self.guard
    }

    /// Posts the fee/expense (and optionally principal) entries of a confirmed transaction.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` / `TransactionNotConfirmed`
    /// - guard failures (`DuplicatePosting`, `RecordAlreadyUsed`,
    ///   `RecordNotFound`, `DuplicateRecordUsage`), including store failures
    ///   during the checks
    /// - validation failures of the derived entries
    /// - store failures while writing, after rollback
    #[instrument(skip_all, fields(transaction_id = %transaction_id))]
    pub async fn post_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<PostingOutcome, LedgerError> {
        let transaction = self
            .store
            .transaction(transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.clone()))?;

        if transaction.status != TransactionStatus::Confirmed {
            return Err(LedgerError::TransactionNotConfirmed {
                transaction_id: transaction_id.clone(),
                status: transaction.status,
            });
        }
        transaction.validate()?;

        if let Err(e) = self.guard.pre_check(&transaction).await {
            warn!(error = %e, code = e.error_code(), "pre-check refused posting");
            return Err(e);
        }

        let chart = self.store.chart().await?;
        let mut entries = derive_fee_entries(&transaction, &self.accounts);
        if self.post_principal {
            let client = self.store.client(&transaction.client_id).await?.ok_or_else(|| {
                LedgerError::Validation(format!("client {} not found", transaction.client_id))
            })?;
            entries.extend(derive_principal_entry(&transaction, &client)?);
        }
        if !entries.is_empty() {
            validate_posting_set(&entries, &chart)?;
        }

        let written = self.write_entries(entries, &chart).await?;

        let mut marked: Vec<SourceRecordRef> = Vec::with_capacity(transaction.legs.len());
        for reference in &transaction.legs {
            if let Err(e) = self.store.set_record_status(reference, RecordStatus::Used).await {
                error!(
                    record_id = %reference.record_id,
                    error = %e,
                    "failed to mark record used, rolling back"
                );
                self.rollback(&written, &marked).await;
                return Err(e.into());
            }
            marked.push(reference.clone());
        }

        info!(entries = written.len(), records = marked.len(), "transaction posted");

        self.notify(PostingNotice {
            transaction_id: Some(transaction_id.clone()),
            description: format!("{} Tx #{}", transaction.transaction_type, transaction_id),
            entries: written.clone(),
        })
        .await;

        let reconciliation = if self.reconcile_after_posting {
            let report = self
                .guard
                .reconcile_transaction_posting(transaction_id, Some(&transaction.client_id))
                .await;
            if report.status != ReconciliationStatus::Verified {
                warn!(
                    status = ?report.status,
                    warnings = ?report.warnings,
                    "post-posting reconciliation flagged issues"
                );
            }
            Some(report)
        } else {
            None
        };

        Ok(PostingOutcome {
            transaction_id: transaction_id.clone(),
            entries: written,
            records_marked: marked,
            reconciliation,
        })
    }

    /// Converts and writes a manual submission, all lines or none.
    ///
    /// # Errors
    ///
    /// Conversion, validation and store failures. Nothing stays written on error.
    #[instrument(skip_all, fields(date = %submission.date, lines = submission.lines.len()))]
    pub async fn post_manual_entries(
        &self,
        submission: &ManualSubmission,
        rates: &dyn FxRateProvider,
    ) -> Result<Vec<JournalEntryId>, LedgerError> {
        let chart = self.store.chart().await?;
        let resolver = RateResolver::new(rates, &self.fallback);

        let entries = resolve_submission(submission, &chart, &resolver).inspect_err(|e| {
            warn!(
                error = %e,
                currencies = ?submission_currencies(submission, &chart),
                "manual submission rejected"
            );
        })?;
        validate_posting_set(&entries, &chart)?;

        let written = self.write_entries(entries, &chart).await?;
        info!(entries = written.len(), "manual entries posted");

        self.notify(PostingNotice {
            transaction_id: None,
            description: submission.description.clone(),
            entries: written.clone(),
        })
        .await;

        Ok(written)
    }

    /// Allocates ids and writes entries, deleting partial writes on failure.
    async fn write_entries(
        &self,
        entries: Vec<NewJournalEntry>,
        chart: &ChartOfAccounts,
    ) -> Result<Vec<JournalEntryId>, LedgerError> {
        let ids = self.store.allocate_entry_ids(entries.len()).await?;
        let created_at = Utc::now();

        let mut written = Vec::with_capacity(ids.len());
        for (entry, id) in entries.into_iter().zip(ids) {
            let result = match entry.into_entry(id, chart, created_at) {
                Ok(entry) => self.store.put_entry(&entry).await.map_err(LedgerError::from),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                error!(entry_id = %id, error = %e, "failed to write journal entry, rolling back");
                self.rollback(&written, &[]).await;
                return Err(e);
            }
            written.push(id);
        }
        Ok(written)
    }

    /// Compensates a partial posting. Failures are logged; the guard's
    /// reconciliation will surface anything left behind.
    async fn rollback(&self, written: &[JournalEntryId], marked: &[SourceRecordRef]) {
        for reference in marked {
            if let Err(e) = self.store.set_record_status(reference, RecordStatus::Pending).await {
                error!(
                    record_id = %reference.record_id,
                    error = %e,
                    "failed to restore record status"
                );
            }
        }
        for id in written {
            if let Err(e) = self.store.delete_entry(*id).await {
                error!(
                    entry_id = %id,
                    error = %e,
                    "failed to delete journal entry during rollback"
                );
            }
        }
    }

    async fn notify(&self, notice: PostingNotice) {
        match tokio::time::timeout(self.notify_timeout, self.notifier.notify(&notice)).await {
            Ok(Ok(())) => debug!(entries = notice.entries.len(), "posting notice delivered"),
            Ok(Err(e)) => warn!(error = %e, "posting notice failed"),
            Err(_) => warn!("posting notice timed out"),
        }
    }
}
