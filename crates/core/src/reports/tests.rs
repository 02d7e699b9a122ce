//! Property-based tests for reports module.

use cambio_shared::types::{AccountId, JournalEntryId};
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ReportError;
use super::service::ReportService;
use super::types::CashFlowCategory;
use crate::accounts::{Account, AccountRole, ChartOfAccounts, Classification};
use crate::ledger::{JournalEntry, LedgerSnapshot, compute_balances};

const CODES: [&str; 7] = ["1001", "1002", "1101", "2001", "3001", "4001", "5001"];

fn chart() -> ChartOfAccounts {
    ChartOfAccounts::new([
        Account::group("1000", "Assets", Classification::Assets),
        Account::leaf("1001", "Bank", Classification::Assets)
            .with_parent("1000")
            .with_role(AccountRole::Bank),
        Account::leaf("1002", "Wallet", Classification::Assets)
            .with_parent("1000")
            .with_role(AccountRole::CryptoWallet),
        Account::leaf("1101", "Receivables", Classification::Assets).with_parent("1000"),
        Account::leaf("2001", "Client", Classification::Liabilities)
            .with_role(AccountRole::ClientBalance),
        Account::leaf("3001", "Capital", Classification::Equity),
        Account::leaf("4001", "Fees", Classification::Income),
        Account::leaf("5001", "Costs", Classification::Expenses),
    ])
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn entry(id: u64, d: u32, debit: &str, credit: &str, usd: Decimal) -> JournalEntry {
    JournalEntry {
        id: JournalEntryId(id),
        date: day(d),
        description: format!("entry {id}"),
        debit_account: debit.into(),
        credit_account: credit.into(),
        debit_amount: usd,
        credit_amount: usd,
        amount_usd: usd,
        credit_amount_usd: None,
        debit_account_name: debit.to_string(),
        credit_account_name: credit.to_string(),
        source_transaction_id: None,
        created_at: Utc::now(),
    }
}

fn snapshot(entries: Vec<JournalEntry>) -> LedgerSnapshot {
    LedgerSnapshot::new(chart(), entries, Utc::now())
}

fn journal_strategy(max_len: usize) -> impl Strategy<Value = Vec<JournalEntry>> {
    prop::collection::vec(
        (0usize..CODES.len(), 1usize..CODES.len(), 1i64..5_000_000i64, 1u32..29u32),
        0..=max_len,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (debit, offset, cents, d))| {
                let credit = (debit + offset) % CODES.len();
                entry(i as u64 + 1, d, CODES[debit], CODES[credit], Decimal::new(cents, 2))
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A balanced journal always produces a footing trial balance.
    #[test]
    fn prop_trial_balance_foots(entries in journal_strategy(40)) {
        let report = ReportService::trial_balance(&snapshot(entries), None);

        prop_assert_eq!(report.total_debit, report.total_credit);
        prop_assert!(report.is_balanced);
        prop_assert!(report.difference.is_zero());
        prop_assert!(report.warnings.is_empty());
    }

    /// A skewed credit leg shows up as the exact trial balance difference.
    #[test]
    fn prop_trial_balance_difference_equals_injected_skew(
        entries in journal_strategy(20),
        skew_cents in 1i64..10_000i64,
    ) {
        let mut entries = entries;
        let next_id = entries.len() as u64 + 1;
        let mut skewed = entry(next_id, 15, "5001", "1001", dec!(500));
        let skew = Decimal::new(skew_cents, 2);
        skewed.credit_amount_usd = Some(dec!(500) - skew);
        entries.push(skewed);

        let report = ReportService::trial_balance(&snapshot(entries), None);

        prop_assert!(!report.is_balanced);
        prop_assert_eq!(report.difference, skew);
        prop_assert!(!report.warnings.is_empty());
    }

    /// Net income agrees with the income and expense sections of account balances.
    #[test]
    fn prop_income_statement_matches_account_balances(entries in journal_strategy(40)) {
        let snapshot = snapshot(entries);
        let income = ReportService::income_statement(&snapshot, None);
        let balances = ReportService::account_balances(&snapshot, None);

        let subtotal = |classification: Classification| -> Decimal {
            balances
                .sections
                .iter()
                .find(|s| s.classification == classification)
                .map_or(Decimal::ZERO, |s| s.subtotal)
        };

        prop_assert_eq!(income.total_revenue, subtotal(Classification::Income));
        prop_assert_eq!(income.total_expenses, subtotal(Classification::Expenses));
        prop_assert_eq!(income.net_income, income.total_revenue - income.total_expenses);
    }

    /// Cash flow net change equals the calculator's cash account movement.
    #[test]
    fn prop_cash_flow_reconciles_with_balances(
        entries in journal_strategy(40),
        from in 1u32..15,
        len in 0u32..14,
    ) {
        let snapshot = snapshot(entries);
        let range = ReportService::date_range(day(from), day(from + len)).unwrap();
        let report = ReportService::cash_flow(&snapshot, Some(&range));

        let expected = compute_balances(&snapshot.entries, &snapshot.chart, Some(&range))
            .cash_net_change(&snapshot.chart);
        prop_assert_eq!(report.net_change, expected);
        prop_assert!(report.reconciles);
        prop_assert_eq!(report.closing_cash, report.opening_cash + report.net_change);
    }

    /// The last running balance equals opening balance plus interval net change.
    #[test]
    fn prop_account_transactions_close_on_net_change(
        entries in journal_strategy(40),
        code in 0usize..CODES.len(),
        from in 1u32..15,
    ) {
        let snapshot = snapshot(entries);
        let account: AccountId = CODES[code].into();
        let range = ReportService::date_range(day(from), day(28)).unwrap();

        let report =
            ReportService::account_transactions(&snapshot, &account, Some(&range)).unwrap();
        let movement = compute_balances(&snapshot.entries, &snapshot.chart, Some(&range));

        let net_change = movement.net_change(&account);
        prop_assert_eq!(report.closing_balance - report.opening_balance, net_change);
        prop_assert_eq!(report.total_increases - report.total_decreases, net_change);
        for pair in report.lines.windows(2) {
            prop_assert_eq!(pair[0].balance_after, pair[1].balance_before);
            prop_assert!((pair[0].date, pair[0].entry_id) <= (pair[1].date, pair[1].entry_id));
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_fee_posting_across_reports() {
        let snapshot = snapshot(vec![entry(1, 5, "1001", "4001", dec!(100))]);

        let trial = ReportService::trial_balance(&snapshot, None);
        assert_eq!(trial.rows.len(), 2);
        assert_eq!(trial.rows[0].account_id, AccountId::from("1001"));
        assert_eq!(trial.rows[0].debit, dec!(100));
        assert_eq!(trial.rows[1].account_id, AccountId::from("4001"));
        assert_eq!(trial.rows[1].credit, dec!(100));
        assert!(trial.rows.iter().all(|r| !r.abnormal));
        assert!(trial.is_balanced);

        let income = ReportService::income_statement(&snapshot, None);
        assert_eq!(income.total_revenue, dec!(100));
        assert_eq!(income.net_income, dec!(100));
        assert!(income.expenses.is_empty());

        let cash = ReportService::cash_flow(&snapshot, None);
        assert_eq!(cash.lines.len(), 1);
        assert_eq!(cash.lines[0].category, CashFlowCategory::Revenue);
        assert_eq!(cash.net_change, dec!(100));

        let balances = ReportService::account_balances(&snapshot, None);
        let assets = &balances.sections[0];
        assert_eq!(assets.classification, Classification::Assets);
        assert_eq!(assets.accounts.len(), 1);
        assert_eq!(assets.accounts[0].increases, dec!(100));
        assert_eq!(balances.groups.len(), 1);
        assert_eq!(balances.groups[0].net_change, dec!(100));
        assert_eq!(balances.groups[0].leaf_count, 3);
    }

    #[test]
    fn test_trial_balance_as_of_excludes_later_entries() {
        let snapshot = snapshot(vec![
            entry(1, 1, "1001", "2001", dec!(1000)),
            entry(2, 10, "2001", "1001", dec!(400)),
        ]);

        let early = ReportService::trial_balance(&snapshot, Some(day(5)));
        assert_eq!(early.total_debit, dec!(1000));

        let late = ReportService::trial_balance(&snapshot, Some(day(10)));
        assert_eq!(late.total_debit, dec!(600));
        assert!(late.is_balanced);
    }

    #[test]
    fn test_abnormal_balance_flagged() {
        let snapshot = snapshot(vec![entry(1, 1, "5001", "1001", dec!(25))]);
        let trial = ReportService::trial_balance(&snapshot, None);

        let bank = trial.rows.iter().find(|r| r.account_id == AccountId::from("1001")).unwrap();
        assert_eq!(bank.credit, dec!(25));
        assert!(bank.abnormal);
    }

    #[test]
    fn test_account_transactions_opening_balance() {
        let snapshot = snapshot(vec![
            entry(1, 1, "1001", "2001", dec!(500)),
            entry(3, 8, "2001", "1001", dec!(200)),
            entry(2, 8, "1001", "4001", dec!(10)),
        ]);
        let range = ReportService::date_range(day(5), day(20)).unwrap();
        let report =
            ReportService::account_transactions(&snapshot, &"1001".into(), Some(&range)).unwrap();

        assert_eq!(report.opening_balance, dec!(500));
        assert_eq!(report.lines.len(), 2);
        assert_eq!(report.lines[0].entry_id, JournalEntryId(2));
        assert!(report.lines[0].is_increase);
        assert_eq!(report.lines[0].balance_after, dec!(510));
        assert_eq!(report.lines[1].counter_account, AccountId::from("2001"));
        assert!(!report.lines[1].is_increase);
        assert_eq!(report.closing_balance, dec!(310));
    }

    #[test]
    fn test_account_transactions_rejects_group_and_unknown() {
        let snapshot = snapshot(vec![]);
        assert!(matches!(
            ReportService::account_transactions(&snapshot, &"1000".into(), None),
            Err(ReportError::GroupAccount(_))
        ));
        assert!(matches!(
            ReportService::account_transactions(&snapshot, &"9999".into(), None),
            Err(ReportError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_date_range() {
        let err = ReportService::date_range(day(10), day(1)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
    }

    #[test]
    fn test_cash_flow_categories() {
        let snapshot = snapshot(vec![
            entry(1, 1, "1001", "2001", dec!(1000)),
            entry(2, 2, "2001", "1002", dec!(300)),
            entry(3, 3, "5001", "1001", dec!(40)),
            entry(4, 4, "1101", "1001", dec!(60)),
            entry(5, 5, "1002", "1001", dec!(100)),
            entry(6, 6, "1001", "3001", dec!(5)),
        ]);
        let report = ReportService::cash_flow(&snapshot, None);

        let net = |category: CashFlowCategory| {
            report
                .lines
                .iter()
                .find(|l| l.category == category)
                .map(|l| l.net)
        };
        assert_eq!(net(CashFlowCategory::ClientReceipts), Some(dec!(1000)));
        assert_eq!(net(CashFlowCategory::ClientPayments), Some(dec!(-300)));
        assert_eq!(net(CashFlowCategory::OperatingExpenses), Some(dec!(-40)));
        assert_eq!(net(CashFlowCategory::Investing), Some(dec!(-60)));
        assert_eq!(net(CashFlowCategory::Other), Some(dec!(5)));
        assert_eq!(net(CashFlowCategory::Revenue), None);
        assert_eq!(report.net_change, dec!(605));
        assert!(report.reconciles);
    }

    #[test]
    fn test_cash_flow_opening_cash() {
        let snapshot = snapshot(vec![
            entry(1, 1, "1001", "2001", dec!(700)),
            entry(2, 10, "1001", "4001", dec!(30)),
        ]);
        let range = ReportService::date_range(day(5), day(15)).unwrap();
        let report = ReportService::cash_flow(&snapshot, Some(&range));

        assert_eq!(report.opening_cash, dec!(700));
        assert_eq!(report.closing_cash, dec!(730));
    }

    #[test]
    fn test_orphan_legs_become_warnings() {
        let snapshot = snapshot(vec![entry(1, 1, "1001", "9999", dec!(10))]);
        let balances = ReportService::account_balances(&snapshot, None);
        assert_eq!(balances.warnings.len(), 1);
        assert!(balances.warnings[0].contains("9999"));
    }

    #[test]
    fn test_income_statement_sorted_by_magnitude() {
        let chart = ChartOfAccounts::new([
            Account::leaf("1001", "Bank", Classification::Assets).with_role(AccountRole::Bank),
            Account::leaf("4001", "Fees", Classification::Income),
            Account::leaf("4002", "Spread", Classification::Income),
        ]);
        let snapshot = LedgerSnapshot::new(
            chart,
            vec![
                entry(1, 1, "1001", "4001", dec!(5)),
                entry(2, 1, "1001", "4002", dec!(50)),
            ],
            Utc::now(),
        );
        let report = ReportService::income_statement(&snapshot, None);
        assert_eq!(report.revenue[0].account_id, AccountId::from("4002"));
        assert_eq!(report.total_revenue, dec!(55));
    }
}
