//! Pure duplicate detection over entries and transactions.

use std::collections::BTreeMap;

use cambio_shared::types::{JournalEntryId, RecordId, TransactionId};

use super::types::DuplicateRecordConflict;
use crate::ledger::JournalEntry;
use crate::posting::{Transaction, TransactionStatus};

/// Groups entries by content key, each group in id order.
#[must_use]
pub fn group_by_content_key(entries: &[JournalEntry]) -> BTreeMap<String, Vec<&JournalEntry>> {
    let mut groups: BTreeMap<String, Vec<&JournalEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.content_key()).or_default().push(entry);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|e| e.id);
    }
    groups
}

/// Number of entries beyond the first in each content group.
#[must_use]
pub fn count_duplicates(entries: &[JournalEntry]) -> usize {
    group_by_content_key(entries)
        .values()
        .map(|g| g.len().saturating_sub(1))
        .sum()
}

/// Ids to delete so that only the lowest id per content key remains.
#[must_use]
pub fn duplicate_ids_to_remove(entries: &[JournalEntry]) -> Vec<JournalEntryId> {
    let mut ids: Vec<JournalEntryId> = group_by_content_key(entries)
        .values()
        .flat_map(|g| g.iter().skip(1).map(|e| e.id))
        .collect();
    ids.sort();
    ids
}

/// Transactions whose legs reference `record_id`, in id order.
#[must_use]
pub fn record_consumers(transactions: &[Transaction], record_id: &RecordId) -> Vec<TransactionId> {
    let mut ids: Vec<TransactionId> = transactions
        .iter()
        .filter(|t| t.references(record_id))
        .map(|t| t.id.clone())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Records in `record_ids` referenced by more than one non-cancelled transaction.
///
/// `transactions` is expected to hold a single day's transactions.
#[must_use]
pub fn same_day_record_conflicts(
    transactions: &[Transaction],
    record_ids: &[RecordId],
) -> Vec<DuplicateRecordConflict> {
    let live: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.status != TransactionStatus::Cancelled)
        .cloned()
        .collect();

    let mut checked: Vec<&RecordId> = Vec::new();
    let mut conflicts = Vec::new();
    for record_id in record_ids {
        if checked.contains(&record_id) {
            continue;
        }
        checked.push(record_id);

        let consumers = record_consumers(&live, record_id);
        if consumers.len() > 1 {
            conflicts.push(DuplicateRecordConflict {
                record_id: record_id.clone(),
                transactions: consumers,
            });
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posting::{RecordType, SourceRecordRef, TransactionType};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn entry(id: u64, debit: &str, credit: &str, usd: Decimal) -> JournalEntry {
        JournalEntry {
            id: JournalEntryId(id),
            date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            description: "Fee for Deposit Tx #T1".to_string(),
            debit_account: debit.into(),
            credit_account: credit.into(),
            debit_amount: usd,
            credit_amount: usd,
            amount_usd: usd,
            credit_amount_usd: None,
            debit_account_name: String::new(),
            credit_account_name: String::new(),
            source_transaction_id: Some("T1".into()),
            created_at: Utc::now(),
        }
    }

    fn tx(id: &str, status: TransactionStatus, records: &[&str]) -> Transaction {
        Transaction {
            id: id.into(),
            date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            transaction_type: TransactionType::Deposit,
            status,
            amount_usd: dec!(100),
            fee_usd: dec!(0),
            expense_usd: dec!(0),
            bank_account: "1101".into(),
            crypto_account: "1201".into(),
            client_id: "C1".into(),
            legs: records
                .iter()
                .map(|r| SourceRecordRef::new(*r, RecordType::Cash))
                .collect(),
        }
    }

    #[test]
    fn test_duplicates_keep_lowest_id() {
        let entries = vec![
            entry(7, "1101", "4001", dec!(5)),
            entry(3, "1101", "4001", dec!(5.00)),
            entry(4, "5001", "1201", dec!(1)),
            entry(9, "1101", "4001", dec!(5)),
        ];
        assert_eq!(count_duplicates(&entries), 2);
        assert_eq!(duplicate_ids_to_remove(&entries), vec![JournalEntryId(7), JournalEntryId(9)]);
    }

    #[test]
    fn test_no_duplicates_for_distinct_content() {
        let entries = vec![entry(1, "1101", "4001", dec!(5)), entry(2, "1101", "4001", dec!(6))];
        assert_eq!(count_duplicates(&entries), 0);
        assert!(duplicate_ids_to_remove(&entries).is_empty());
    }

    #[test]
    fn test_same_day_conflict_detected() {
        let transactions = vec![
            tx("T1", TransactionStatus::Confirmed, &["R1", "R2"]),
            tx("T2", TransactionStatus::Pending, &["R2"]),
        ];
        let conflicts = same_day_record_conflicts(&transactions, &["R1".into(), "R2".into()]);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].record_id.as_str(), "R2");
        assert_eq!(
            conflicts[0].transactions,
            vec![TransactionId::from("T1"), TransactionId::from("T2")]
        );
    }

    #[test]
    fn test_cancelled_transactions_ignored() {
        let transactions = vec![
            tx("T1", TransactionStatus::Confirmed, &["R2"]),
            tx("T2", TransactionStatus::Cancelled, &["R2"]),
        ];
        assert!(same_day_record_conflicts(&transactions, &["R2".into()]).is_empty());
    }

    #[test]
    fn test_record_consumers() {
        let transactions = vec![
            tx("T2", TransactionStatus::Confirmed, &["R1"]),
            tx("T1", TransactionStatus::Confirmed, &["R1"]),
            tx("T3", TransactionStatus::Confirmed, &["R9"]),
        ];
        assert_eq!(
            record_consumers(&transactions, &"R1".into()),
            vec![TransactionId::from("T1"), TransactionId::from("T2")]
        );
    }
}
