//! Posting safeguards and post-hoc verification.

use cambio_shared::types::{ClientId, RecordId, TransactionId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, error, info, instrument, warn};

use super::duplicates::{
    count_duplicates, duplicate_ids_to_remove, record_consumers, same_day_record_conflicts,
};
use super::types::{
    CleanupReport, ClientBalanceCheck, DuplicateRecordCheck, ExistingEntriesCheck,
    ReconciliationReport, ReconciliationStatus, RecordUsageCheck, RecordUsageConflict,
};
use crate::ledger::{JournalEntry, LedgerError, validate_journal_entries_balanced, within_tolerance};
use crate::posting::{RecordStatus, SourceRecordRef, Transaction, TransactionStatus};
use crate::store::{DocumentStore, LedgerStore, StoreError};

/// Guards postings against duplicates and verifies them afterwards.
///
/// Every method is read-only except [`ReconciliationGuard::cleanup_duplicate_journal_entries`].
pub struct ReconciliationGuard<S: ?Sized> {
    store: LedgerStore<S>,
    check_client_balance: bool,
}

impl<S: DocumentStore + ?Sized> ReconciliationGuard<S> {
    /// Creates a guard.
    #[must_use]
    pub fn new(store: LedgerStore<S>) -> Self {
        Self {
            store,
            check_client_balance: true,
        }
    }

    /// Enables or disables the client balance cross-check.
    ///
    /// The ledger only carries client balances when principal entries are
    /// posted; without them the comparison is meaningless and is skipped.
    #[must_use]
    pub fn with_client_balance_check(mut self, enabled: bool) -> Self {
        self.check_client_balance = enabled;
        self
    }

    // ===== Pre-checks =====

    /// Checks that no entry is correlated to the transaction yet.
    ///
    /// # Errors
    ///
    /// Store failures. Callers must treat them as "not clean".
    #[instrument(skip_all, fields(transaction_id = %transaction_id))]
    pub async fn verify_no_existing_entries(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<ExistingEntriesCheck, LedgerError> {
        let entries = self.store.entries_for_transaction(transaction_id).await?;
        let existing: Vec<_> = entries.iter().map(|e| e.id).collect();

        let mut warnings = Vec::new();
        if !existing.is_empty() {
            warn!(count = existing.len(), "transaction already has journal entries");
            warnings.push(format!(
                "Transaction {transaction_id} already has {} journal entries",
                existing.len()
            ));
        }

        Ok(ExistingEntriesCheck {
            transaction_id: transaction_id.clone(),
            is_clean: existing.is_empty(),
            existing,
            warnings,
        })
    }

    /// Checks that every record exists and has not been used.
    ///
    /// For used records, reports which transactions consumed them. The
    /// transaction being posted (`checking`) is never listed as a consumer.
    ///
    /// # Errors
    ///
    /// Store failures.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn verify_records_not_already_used(
        &self,
        records: &[SourceRecordRef],
        checking: Option<&TransactionId>,
    ) -> Result<RecordUsageCheck, LedgerError> {
        let mut check = RecordUsageCheck::default();
        let mut transactions: Option<Vec<Transaction>> = None;

        for reference in records {
            match self.store.record(reference).await? {
                None => {
                    warn!(record_id = %reference.record_id, "source record not found");
                    check.warnings.push(format!("Record {} not found", reference.record_id));
                    check.missing.push(reference.clone());
                }
                Some(record) if record.status == RecordStatus::Used => {
                    if transactions.is_none() {
                        transactions = Some(self.store.transactions().await?);
                    }
                    let mut used_by = transactions
                        .as_deref()
                        .map(|all| record_consumers(all, &reference.record_id))
                        .unwrap_or_default();
                    if let Some(current) = checking {
                        used_by.retain(|id| id != current);
                    }
                    warn!(record_id = %reference.record_id, ?used_by, "source record already used");
                    check.warnings.push(format!(
                        "Record {} already used by {}",
                        reference.record_id,
                        join_ids(&used_by)
                    ));
                    check.conflicts.push(RecordUsageConflict {
                        record: reference.clone(),
                        used_by,
                    });
                }
                Some(_) => {}
            }
        }

        check.is_clean = check.conflicts.is_empty() && check.missing.is_empty();
        Ok(check)
    }

    /// Checks that no record is shared by several live transactions on `date`.
    ///
    /// # Errors
    ///
    /// Store failures.
    #[instrument(skip_all, fields(records = record_ids.len(), %date))]
    pub async fn verify_no_duplicate_record_processing(
        &self,
        record_ids: &[RecordId],
        date: NaiveDate,
    ) -> Result<DuplicateRecordCheck, LedgerError> {
        let transactions = self.store.transactions_on(date).await?;
        let conflicts = same_day_record_conflicts(&transactions, record_ids);

        let warnings: Vec<String> = conflicts
            .iter()
            .map(|c| {
                format!(
                    "Record {} referenced by multiple transactions on {date}: {}",
                    c.record_id,
                    join_ids(&c.transactions)
                )
            })
            .collect();
        for warning in &warnings {
            warn!(%date, "{warning}");
        }

        Ok(DuplicateRecordCheck {
            date,
            is_clean: conflicts.is_empty(),
            conflicts,
            warnings,
        })
    }

    /// Runs all pre-checks for a transaction, failing closed.
    ///
    /// # Errors
    ///
    /// The first failing check as a `LedgerError`, or a store failure.
    pub async fn pre_check(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        self.verify_no_existing_entries(&transaction.id)
            .await?
            .into_result()?;
        self.verify_records_not_already_used(&transaction.legs, Some(&transaction.id))
            .await?
            .into_result()?;

        let record_ids: Vec<RecordId> =
            transaction.legs.iter().map(|l| l.record_id.clone()).collect();
        self.verify_no_duplicate_record_processing(&record_ids, transaction.date)
            .await?
            .into_result()
    }

    // ===== Post-hoc verification =====

    /// Re-reads the transaction's entries and verifies them.
    ///
    /// Never fails: store errors produce a report with status `Error`.
    #[instrument(skip_all, fields(transaction_id = %transaction_id))]
    pub async fn reconcile_transaction_posting(
        &self,
        transaction_id: &TransactionId,
        client_id: Option<&ClientId>,
    ) -> ReconciliationReport {
        match self.reconcile_inner(transaction_id, client_id).await {
            Ok(report) => {
                info!(
                    status = ?report.status,
                    entries = report.journal_entries_created,
                    "reconciliation finished"
                );
                report
            }
            Err(e) => {
                error!(error = %e, "reconciliation could not complete");
                ReconciliationReport::failed(
                    transaction_id.clone(),
                    format!("Reconciliation failed: {e}"),
                )
            }
        }
    }

    async fn reconcile_inner(
        &self,
        transaction_id: &TransactionId,
        client_id: Option<&ClientId>,
    ) -> Result<ReconciliationReport, StoreError> {
        let entries = self.store.entries_for_transaction(transaction_id).await?;
        let mut warnings = Vec::new();

        if entries.is_empty() {
            warnings.push(format!("No journal entries found for transaction {transaction_id}"));
        }

        let duplicate_count = count_duplicates(&entries);
        if duplicate_count > 0 {
            warnings.push(format!("{duplicate_count} duplicate journal entries found"));
        }

        let check = validate_journal_entries_balanced(&entries);
        if !check.is_balanced {
            warnings.push(format!(
                "Entries do not balance: debits {} vs credits {}",
                check.total_debits, check.total_credits
            ));
        }
        let usd_skewed: Vec<&JournalEntry> = entries
            .iter()
            .filter(|e| !within_tolerance(e.debit_leg_usd(), e.credit_leg_usd()))
            .collect();
        for entry in &usd_skewed {
            warnings.push(format!(
                "Entry {} USD legs differ: {} vs {}",
                entry.id,
                entry.debit_leg_usd(),
                entry.credit_leg_usd()
            ));
        }
        let entries_are_balanced = check.is_balanced && usd_skewed.is_empty();

        let client_balance = match client_id {
            Some(id) if self.check_client_balance => self.client_balance(id, &mut warnings).await?,
            Some(id) => {
                debug!(
                    client_id = %id,
                    "principal entries not posted, client balance check skipped"
                );
                None
            }
            None => None,
        };

        let status = if duplicate_count > 0 {
            ReconciliationStatus::DuplicatesFound
        } else if !entries_are_balanced {
            ReconciliationStatus::Unbalanced
        } else {
            ReconciliationStatus::Verified
        };

        Ok(ReconciliationReport {
            transaction_id: transaction_id.clone(),
            status,
            journal_entries_created: entries.len(),
            entries_are_balanced,
            total_debits: check.total_debits,
            total_credits: check.total_credits,
            duplicate_count,
            client_balance,
            warnings,
        })
    }

    /// Compares the client's ledger balance with confirmed transaction flow.
    ///
    /// Mismatches are warnings only.
    async fn client_balance(
        &self,
        client_id: &ClientId,
        warnings: &mut Vec<String>,
    ) -> Result<Option<ClientBalanceCheck>, StoreError> {
        let Some(client) = self.store.client(client_id).await? else {
            warnings.push(format!("Client {client_id} not found"));
            return Ok(None);
        };
        let Some(account_id) = client.account_id else {
            warnings.push(format!("Client {client_id} has no balance account"));
            return Ok(None);
        };
        let Some(account) = self.store.account(&account_id).await? else {
            warnings.push(format!("Client account {account_id} not found"));
            return Ok(None);
        };

        let side = account.normal_side();
        let ledger_balance: Decimal = self
            .store
            .entries_touching(&account_id)
            .await?
            .iter()
            .map(|e| {
                let debit = if e.debit_account == account_id {
                    e.debit_leg_usd()
                } else {
                    Decimal::ZERO
                };
                let credit = if e.credit_account == account_id {
                    e.credit_leg_usd()
                } else {
                    Decimal::ZERO
                };
                side.calculate_balance_change(debit, credit)
            })
            .sum();

        let expected_balance: Decimal = self
            .store
            .transactions_for_client(client_id)
            .await?
            .iter()
            .filter(|t| t.status == TransactionStatus::Confirmed)
            .map(Transaction::signed_amount)
            .sum();

        let matches = within_tolerance(ledger_balance, expected_balance);
        if !matches {
            warn!(%client_id, %ledger_balance, %expected_balance, "client balance mismatch");
            warnings.push(format!(
                "Client {client_id} ledger balance {ledger_balance} \
                 differs from transaction balance {expected_balance}"
            ));
        }

        Ok(Some(ClientBalanceCheck {
            client_id: client_id.clone(),
            account_id,
            ledger_balance,
            expected_balance,
            matches,
        }))
    }

    // ===== Repair =====

    /// Lists the entries the repair tool would delete, without deleting.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn plan_cleanup(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<CleanupReport, LedgerError> {
        let entries = self.store.entries_for_transaction(transaction_id).await?;
        let removed_entry_ids = duplicate_ids_to_remove(&entries);
        Ok(CleanupReport {
            transaction_id: transaction_id.clone(),
            duplicates_removed: 0,
            entries_remaining: entries.len(),
            removed_entry_ids,
        })
    }

    /// Deletes exact duplicates, keeping the lowest id per content key.
    ///
    /// Idempotent: a second run removes nothing.
    ///
    /// # Errors
    ///
    /// Store failures. A failure midway leaves some duplicates; rerunning
    /// finishes the job.
    #[instrument(skip_all, fields(transaction_id = %transaction_id))]
    pub async fn cleanup_duplicate_journal_entries(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<CleanupReport, LedgerError> {
        let entries = self.store.entries_for_transaction(transaction_id).await?;
        let to_remove = duplicate_ids_to_remove(&entries);

        let mut removed_entry_ids = Vec::with_capacity(to_remove.len());
        for id in to_remove {
            match self.store.delete_entry(id).await {
                Ok(true) => removed_entry_ids.push(id),
                Ok(false) => warn!(entry_id = %id, "duplicate entry already gone"),
                Err(e) => {
                    error!(entry_id = %id, error = %e, "failed to delete duplicate entry");
                    return Err(e.into());
                }
            }
        }

        let report = CleanupReport {
            transaction_id: transaction_id.clone(),
            duplicates_removed: removed_entry_ids.len(),
            entries_remaining: entries.len() - removed_entry_ids.len(),
            removed_entry_ids,
        };
        info!(
            removed = report.duplicates_removed,
            remaining = report.entries_remaining,
            "duplicate cleanup finished"
        );
        Ok(report)
    }
}

fn join_ids(ids: &[TransactionId]) -> String {
    ids.iter().map(TransactionId::as_str).collect::<Vec<_>>().join(", ")
}
