//! Report data types.

use cambio_shared::types::{AccountId, JournalEntryId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::Classification;
use crate::ledger::{DateRange, EntryType};

// ===== Account balances =====

/// Interval movement of one leaf account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalanceRow {
    /// Account code.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Classification.
    pub classification: Classification,
    /// USD on the normal side.
    pub increases: Decimal,
    /// USD on the opposite side.
    pub decreases: Decimal,
    /// `increases - decreases`.
    pub net_change: Decimal,
    /// Equal to `net_change` for an interval report.
    pub ending_balance: Decimal,
}

/// Accounts of one classification with their subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationSection {
    /// Classification.
    pub classification: Classification,
    /// Leaf rows, in display order.
    pub accounts: Vec<AccountBalanceRow>,
    /// Σ net change.
    pub subtotal: Decimal,
}

/// Movement of a group account, rolled up from its leaf descendants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRollup {
    /// Group code.
    pub account_id: AccountId,
    /// Group name.
    pub name: String,
    /// Classification.
    pub classification: Classification,
    /// Σ increases of descendants.
    pub increases: Decimal,
    /// Σ decreases of descendants.
    pub decreases: Decimal,
    /// Σ net change of descendants.
    pub net_change: Decimal,
    /// Number of leaf descendants.
    pub leaf_count: usize,
}

/// Account balances report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalancesReport {
    /// Report type identifier.
    pub report_type: String,
    /// Interval, or the whole journal.
    pub range: Option<DateRange>,
    /// One section per classification, in report order.
    pub sections: Vec<ClassificationSection>,
    /// Group rollups with activity.
    pub groups: Vec<GroupRollup>,
    /// Orphan leg warnings.
    pub warnings: Vec<String>,
}

// ===== Account transactions =====

/// One entry as seen from a single account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTransactionLine {
    /// Entry id.
    pub entry_id: JournalEntryId,
    /// Entry date.
    pub date: NaiveDate,
    /// Entry description.
    pub description: String,
    /// Leg touching the account.
    pub leg: EntryType,
    /// Account on the other leg.
    pub counter_account: AccountId,
    /// Name of the counter account at posting time.
    pub counter_account_name: String,
    /// USD carried by this leg.
    pub amount_usd: Decimal,
    /// True if the leg increases the account.
    pub is_increase: bool,
    /// Balance before this entry.
    pub balance_before: Decimal,
    /// Balance after this entry.
    pub balance_after: Decimal,
}

/// Running-balance view of one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTransactionsReport {
    /// Report type identifier.
    pub report_type: String,
    /// Account code.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Classification.
    pub classification: Classification,
    /// Interval, or the whole journal.
    pub range: Option<DateRange>,
    /// Balance from entries before the interval.
    pub opening_balance: Decimal,
    /// Balance after the last line.
    pub closing_balance: Decimal,
    /// Σ increases in the interval.
    pub total_increases: Decimal,
    /// Σ decreases in the interval.
    pub total_decreases: Decimal,
    /// Lines in `(date, id)` order.
    pub lines: Vec<AccountTransactionLine>,
}

// ===== Trial balance =====

/// Trial balance row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account code.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Classification.
    pub classification: Classification,
    /// Debit column.
    pub debit: Decimal,
    /// Credit column.
    pub credit: Decimal,
    /// Balance on the side opposite the normal side.
    pub abnormal: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Report type identifier.
    pub report_type: String,
    /// Cut-off date, inclusive.
    pub as_of: Option<NaiveDate>,
    /// Rows with a balance of at least one cent.
    pub rows: Vec<TrialBalanceRow>,
    /// Σ debit column.
    pub total_debit: Decimal,
    /// Σ credit column.
    pub total_credit: Decimal,
    /// `total_debit - total_credit`.
    pub difference: Decimal,
    /// True when the totals are equal.
    pub is_balanced: bool,
    /// Imbalance and orphan leg warnings.
    pub warnings: Vec<String>,
}

// ===== Income statement =====

/// Net movement of an income or expense account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeStatementLine {
    /// Account code.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Income: credits − debits. Expenses: debits − credits.
    pub amount: Decimal,
}

/// Income statement report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeStatementReport {
    /// Report type identifier.
    pub report_type: String,
    /// Interval, or the whole journal.
    pub range: Option<DateRange>,
    /// Income lines, largest magnitude first.
    pub revenue: Vec<IncomeStatementLine>,
    /// Expense lines, largest magnitude first.
    pub expenses: Vec<IncomeStatementLine>,
    /// Σ revenue.
    pub total_revenue: Decimal,
    /// Σ expenses.
    pub total_expenses: Decimal,
    /// `total_revenue - total_expenses`.
    pub net_income: Decimal,
}

// ===== Cash flow =====

/// Bucket of a cash movement, decided by the counter account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowCategory {
    /// Cash in against a client balance.
    ClientReceipts,
    /// Cash out against a client balance.
    ClientPayments,
    /// Cash in against income.
    Revenue,
    /// Cash out against expenses.
    OperatingExpenses,
    /// Cash against a non-cash asset.
    Investing,
    /// Anything else.
    Other,
}

impl CashFlowCategory {
    /// Report ordering.
    pub const ALL: [Self; 6] = [
        Self::ClientReceipts,
        Self::ClientPayments,
        Self::Revenue,
        Self::OperatingExpenses,
        Self::Investing,
        Self::Other,
    ];
}

/// Totals of one cash flow category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowLine {
    /// Category.
    pub category: CashFlowCategory,
    /// Cash received.
    pub inflow: Decimal,
    /// Cash paid.
    pub outflow: Decimal,
    /// `inflow - outflow`.
    pub net: Decimal,
}

/// Cash flow report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowReport {
    /// Report type identifier.
    pub report_type: String,
    /// Interval, or the whole journal.
    pub range: Option<DateRange>,
    /// Cash balance before the interval.
    pub opening_cash: Decimal,
    /// Cash balance at the end of the interval.
    pub closing_cash: Decimal,
    /// Categories with activity, in report order.
    pub lines: Vec<CashFlowLine>,
    /// Σ inflows.
    pub total_inflows: Decimal,
    /// Σ outflows.
    pub total_outflows: Decimal,
    /// `total_inflows - total_outflows`.
    pub net_change: Decimal,
    /// Combined cash net change from the balance calculator.
    pub calculator_net_change: Decimal,
    /// True when both net changes agree.
    pub reconciles: bool,
    /// Findings.
    pub warnings: Vec<String>,
}
