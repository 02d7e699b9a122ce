//! Property-based tests for balance replay.

use cambio_shared::types::JournalEntryId;
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{RunningBalance, compute_balances, running_balances, split_for_trial_balance};
use super::entry::JournalEntry;
use crate::accounts::{Account, AccountRole, ChartOfAccounts, Classification};

const CODES: [&str; 6] = ["1001", "1002", "2001", "3001", "4001", "5001"];

fn chart() -> ChartOfAccounts {
    ChartOfAccounts::new([
        Account::leaf("1001", "Bank", Classification::Assets).with_role(AccountRole::Bank),
        Account::leaf("1002", "Wallet", Classification::Assets)
            .with_role(AccountRole::CryptoWallet),
        Account::leaf("2001", "Client", Classification::Liabilities)
            .with_role(AccountRole::ClientBalance),
        Account::leaf("3001", "Capital", Classification::Equity),
        Account::leaf("4001", "Fees", Classification::Income),
        Account::leaf("5001", "Costs", Classification::Expenses),
    ])
}

fn balance_change_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn balance_changes_strategy(max_len: usize) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(balance_change_strategy(), 1..=max_len)
}

/// Balanced entries between distinct leaf accounts.
fn journal_strategy(max_len: usize) -> impl Strategy<Value = Vec<JournalEntry>> {
    prop::collection::vec(
        (0usize..CODES.len(), 1usize..CODES.len(), 1i64..10_000_000i64, 1u32..28u32),
        0..=max_len,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (debit, offset, cents, day))| {
                let credit = (debit + offset) % CODES.len();
                let usd = Decimal::new(cents, 2);
                JournalEntry {
                    id: JournalEntryId(i as u64 + 1),
                    date: NaiveDate::from_ymd_opt(2025, 2, day).unwrap(),
                    description: String::new(),
                    debit_account: CODES[debit].into(),
                    credit_account: CODES[credit].into(),
                    debit_amount: usd,
                    credit_amount: usd,
                    amount_usd: usd,
                    credit_amount_usd: None,
                    debit_account_name: String::new(),
                    credit_account_name: String::new(),
                    source_transaction_id: None,
                    created_at: Utc::now(),
                }
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every entry adds the same USD to the debit side and the credit side.
    #[test]
    fn prop_side_totals_equal_for_balanced_journal(entries in journal_strategy(40)) {
        let chart = chart();
        let balances = compute_balances(&entries, &chart, None);
        let (debits, credits) = balances.side_totals(&chart);

        prop_assert_eq!(debits, credits);
        prop_assert!(balances.orphan_legs.is_empty());
    }

    /// Debit-normal net change equals credit-normal net change.
    #[test]
    fn prop_accounting_equation_holds(entries in journal_strategy(40)) {
        let chart = chart();
        let balances = compute_balances(&entries, &chart, None);

        let mut debit_normal = Decimal::ZERO;
        let mut credit_normal = Decimal::ZERO;
        for account in chart.leaves() {
            let net = balances.net_change(&account.id);
            match account.classification {
                Classification::Assets | Classification::Expenses => debit_normal += net,
                _ => credit_normal += net,
            }
        }
        prop_assert_eq!(debit_normal, credit_normal);
    }

    /// Trial balance columns foot for a balanced journal.
    #[test]
    fn prop_trial_columns_foot(entries in journal_strategy(40)) {
        let chart = chart();
        let signed = running_balances(&entries, &chart, None);

        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;
        for (id, balance) in &signed.balances {
            let side = chart.get(id).unwrap().normal_side();
            let split = split_for_trial_balance(side, *balance);
            debit_total += split.debit;
            credit_total += split.credit;
        }
        prop_assert_eq!(debit_total, credit_total);
    }

    /// Signed running balance agrees with the normal-side net change.
    #[test]
    fn prop_signed_balance_matches_net_change(entries in journal_strategy(30)) {
        let chart = chart();
        let movements = compute_balances(&entries, &chart, None);
        let signed = running_balances(&entries, &chart, None);

        for account in chart.leaves() {
            let balance = signed.balances.get(&account.id).copied().unwrap_or_default();
            let expected = match account.classification {
                Classification::Assets | Classification::Expenses => {
                    movements.net_change(&account.id)
                }
                _ => -movements.net_change(&account.id),
            };
            prop_assert_eq!(balance, expected);
        }
    }

    /// `balance_after[N] = balance_before[N] + change` and
    /// `balance_before[N] = balance_after[N-1]`.
    #[test]
    fn prop_running_balance_chain(changes in balance_changes_strategy(20)) {
        let mut current = RunningBalance::first_entry(changes[0]);
        prop_assert_eq!(current.balance_after, current.balance_before + changes[0]);

        for change in changes.iter().skip(1) {
            let next = RunningBalance::next_entry(&current, *change);
            prop_assert_eq!(next.balance_before, current.balance_after);
            prop_assert_eq!(next.balance_after, next.balance_before + *change);
            prop_assert_eq!(next.sequence, current.sequence + 1);
            current = next;
        }

        let expected: Decimal = changes.iter().copied().sum();
        prop_assert_eq!(current.balance_after, expected);
        prop_assert_eq!(current.sequence as usize, changes.len());
    }

    /// Opening balance carries through a zero change.
    #[test]
    fn prop_zero_change_preserves_balance(opening in balance_change_strategy()) {
        let start = RunningBalance::opening(opening);
        let next = RunningBalance::next_entry(&start, Decimal::ZERO);
        prop_assert_eq!(next.balance_after, opening);
    }
}
