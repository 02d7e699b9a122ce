//! Account balance calculations replayed from the journal.
//!
//! Two views are derived from the same entries:
//!
//! - interval movements per leaf account (`increases`, `decreases`,
//!   `net_change`), where the normal side decides which leg increases
//! - a signed running balance per account (`+usd` on the debit leg,
//!   `-usd` on the credit leg), split into trial balance columns at
//!   presentation time

use std::collections::BTreeMap;

use cambio_shared::types::{AccountId, JournalEntryId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::{EntryType, JournalEntry};
use super::validation::BALANCE_TOLERANCE;
use crate::accounts::{Account, ChartOfAccounts, NormalSide};

/// Closed date interval `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day (inclusive).
    pub from: NaiveDate,
    /// Last day (inclusive).
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range, or `None` if `from > to`.
    #[must_use]
    pub fn try_new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    /// Returns true if `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Movement of a single leaf account over an interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMovement {
    /// USD applied on the account's normal side.
    pub increases: Decimal,
    /// USD applied on the opposite side.
    pub decreases: Decimal,
}

impl AccountMovement {
    /// `increases - decreases`.
    #[must_use]
    pub fn net_change(&self) -> Decimal {
        self.increases - self.decreases
    }

    /// True when total activity is below one cent.
    #[must_use]
    pub fn is_negligible(&self) -> bool {
        self.increases + self.decreases < BALANCE_TOLERANCE
    }

    fn apply(&mut self, side: NormalSide, leg: EntryType, amount: Decimal) {
        if side.is_increase(leg) {
            self.increases += amount;
        } else {
            self.decreases += amount;
        }
    }
}

/// Why a journal leg could not be attributed to a leaf account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    /// Account code missing from the chart.
    UnknownAccount,
    /// Leg targets a group account.
    GroupAccount,
}

/// A journal leg that references an unusable account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanLeg {
    /// Entry holding the leg.
    pub entry_id: JournalEntryId,
    /// Referenced account code.
    pub account_id: AccountId,
    /// Which leg.
    pub leg: EntryType,
    /// USD carried by the leg.
    pub amount_usd: Decimal,
    /// Why it was not attributed.
    pub reason: OrphanReason,
}

impl OrphanLeg {
    /// Human readable warning line.
    #[must_use]
    pub fn warning(&self) -> String {
        let reason = match self.reason {
            OrphanReason::UnknownAccount => "unknown account",
            OrphanReason::GroupAccount => "group account",
        };
        format!(
            "Entry {} {} leg references {} {} ({} USD not attributed)",
            self.entry_id, self.leg, reason, self.account_id, self.amount_usd
        )
    }
}

/// Resolves a leg to its leaf account, or records it as an orphan.
fn resolve_leg<'c>(
    chart: &'c ChartOfAccounts,
    entry: &JournalEntry,
    leg: EntryType,
    amount_usd: Decimal,
    orphans: &mut Vec<OrphanLeg>,
) -> Option<&'c Account> {
    let account_id = match leg {
        EntryType::Debit => &entry.debit_account,
        EntryType::Credit => &entry.credit_account,
    };
    let reason = match chart.get(account_id) {
        Some(account) if !account.is_group => return Some(account),
        Some(_) => OrphanReason::GroupAccount,
        None => OrphanReason::UnknownAccount,
    };
    orphans.push(OrphanLeg {
        entry_id: entry.id,
        account_id: account_id.clone(),
        leg,
        amount_usd,
        reason,
    });
    None
}

/// Interval movements for every leaf account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntervalBalances {
    /// Movement per leaf account. Every leaf of the chart is present.
    pub movements: BTreeMap<AccountId, AccountMovement>,
    /// Legs that could not be attributed.
    pub orphan_legs: Vec<OrphanLeg>,
}

impl IntervalBalances {
    /// Returns the movement of a leaf account.
    #[must_use]
    pub fn get(&self, id: &AccountId) -> Option<&AccountMovement> {
        self.movements.get(id)
    }

    /// Net change of an account, zero if absent.
    #[must_use]
    pub fn net_change(&self, id: &AccountId) -> Decimal {
        self.get(id).map_or(Decimal::ZERO, AccountMovement::net_change)
    }

    /// Debit-side and credit-side totals across all accounts.
    ///
    /// Debits are increases of debit-normal accounts plus decreases of
    /// credit-normal accounts; credits are the mirror. Equal for a balanced
    /// journal.
    #[must_use]
    pub fn side_totals(&self, chart: &ChartOfAccounts) -> (Decimal, Decimal) {
        let mut debits = Decimal::ZERO;
        let mut credits = Decimal::ZERO;
        for (id, movement) in &self.movements {
            match chart.get(id).map(Account::normal_side) {
                Some(NormalSide::DebitNormal) => {
                    debits += movement.increases;
                    credits += movement.decreases;
                }
                Some(NormalSide::CreditNormal) => {
                    debits += movement.decreases;
                    credits += movement.increases;
                }
                None => {}
            }
        }
        (debits, credits)
    }

    /// Combined net change of all cash accounts.
    #[must_use]
    pub fn cash_net_change(&self, chart: &ChartOfAccounts) -> Decimal {
        chart.cash_accounts().map(|a| self.net_change(&a.id)).sum()
    }
}

/// Computes per-leaf movements for entries inside `range` (all entries if `None`).
///
/// The debit leg carries `amount_usd` and the credit leg carries the
/// credit-leg USD value.
#[must_use]
pub fn compute_balances(
    entries: &[JournalEntry],
    chart: &ChartOfAccounts,
    range: Option<&DateRange>,
) -> IntervalBalances {
    let mut result = IntervalBalances {
        movements: chart
            .leaves()
            .map(|a| (a.id.clone(), AccountMovement::default()))
            .collect(),
        orphan_legs: Vec::new(),
    };

    for entry in entries {
        if range.is_some_and(|r| !r.contains(entry.date)) {
            continue;
        }
        for (leg, amount) in [
            (EntryType::Debit, entry.debit_leg_usd()),
            (EntryType::Credit, entry.credit_leg_usd()),
        ] {
            if let Some(account) = resolve_leg(chart, entry, leg, amount, &mut result.orphan_legs) {
                result
                    .movements
                    .entry(account.id.clone())
                    .or_default()
                    .apply(account.normal_side(), leg, amount);
            }
        }
    }

    result
}

/// Signed (debit-positive) balances per leaf account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignedBalances {
    /// Debit-positive balance per leaf account with activity.
    pub balances: BTreeMap<AccountId, Decimal>,
    /// Legs that could not be attributed.
    pub orphan_legs: Vec<OrphanLeg>,
}

/// Replays the journal up to and including `as_of` into signed balances.
#[must_use]
pub fn running_balances(
    entries: &[JournalEntry],
    chart: &ChartOfAccounts,
    as_of: Option<NaiveDate>,
) -> SignedBalances {
    let mut result = SignedBalances::default();

    for entry in entries {
        if as_of.is_some_and(|d| entry.date > d) {
            continue;
        }
        let debit_usd = entry.debit_leg_usd();
        if let Some(account) =
            resolve_leg(chart, entry, EntryType::Debit, debit_usd, &mut result.orphan_legs)
        {
            *result.balances.entry(account.id.clone()).or_default() += debit_usd;
        }
        let credit_usd = entry.credit_leg_usd();
        if let Some(account) =
            resolve_leg(chart, entry, EntryType::Credit, credit_usd, &mut result.orphan_legs)
        {
            *result.balances.entry(account.id.clone()).or_default() -= credit_usd;
        }
    }

    result
}

/// A signed balance split into trial balance columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSplit {
    /// Debit column.
    pub debit: Decimal,
    /// Credit column.
    pub credit: Decimal,
    /// True when the balance sits on the side opposite the normal side.
    pub abnormal: bool,
}

/// Splits a debit-positive balance into debit/credit columns.
///
/// Positive balances go to the debit column, negative to the credit
/// column; the normal side only decides whether the placement is abnormal.
#[must_use]
pub fn split_for_trial_balance(side: NormalSide, balance: Decimal) -> TrialSplit {
    let (debit, credit) = if balance >= Decimal::ZERO {
        (balance, Decimal::ZERO)
    } else {
        (Decimal::ZERO, -balance)
    };
    let abnormal = match side {
        NormalSide::DebitNormal => balance < Decimal::ZERO,
        NormalSide::CreditNormal => balance > Decimal::ZERO,
    };
    TrialSplit { debit, credit, abnormal }
}

/// Running balance information for one entry on one account.
///
/// - `sequence`: 1-based position of the entry on the account
/// - `balance_before`: balance before this entry
/// - `balance_after`: balance after this entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Position of the entry in the account's history.
    pub sequence: u64,
    /// Balance before this entry.
    pub balance_before: Decimal,
    /// Balance after this entry.
    pub balance_after: Decimal,
}

impl RunningBalance {
    /// Starting point carrying an opening balance, before any entry.
    #[must_use]
    pub fn opening(balance: Decimal) -> Self {
        Self {
            sequence: 0,
            balance_before: balance,
            balance_after: balance,
        }
    }

    /// Running balance of the first entry on an account.
    #[must_use]
    pub fn first_entry(balance_change: Decimal) -> Self {
        Self::next_entry(&Self::opening(Decimal::ZERO), balance_change)
    }

    /// Running balance following `previous`.
    ///
    /// - `balance_after[N] = balance_before[N] + change`
    /// - `balance_before[N] = balance_after[N-1]`
    #[must_use]
    pub fn next_entry(previous: &Self, balance_change: Decimal) -> Self {
        Self {
            sequence: previous.sequence + 1,
            balance_before: previous.balance_after,
            balance_after: previous.balance_after + balance_change,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Classification;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn chart() -> ChartOfAccounts {
        ChartOfAccounts::new([
            Account::leaf("1001", "Bank", Classification::Assets),
            Account::leaf("2001", "Client", Classification::Liabilities),
            Account::leaf("4001", "Fees", Classification::Income),
            Account::leaf("5001", "Costs", Classification::Expenses),
            Account::group("1000", "Assets", Classification::Assets),
        ])
    }

    fn entry(id: u64, day: u32, debit: &str, credit: &str, usd: Decimal) -> JournalEntry {
        JournalEntry {
            id: JournalEntryId(id),
            date: d(day),
            description: String::new(),
            debit_account: debit.into(),
            credit_account: credit.into(),
            debit_amount: usd,
            credit_amount: usd,
            amount_usd: usd,
            credit_amount_usd: None,
            debit_account_name: String::new(),
            credit_account_name: String::new(),
            source_transaction_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_date_range_validation() {
        assert!(DateRange::try_new(d(2), d(1)).is_none());
        let range = DateRange::try_new(d(1), d(1)).unwrap();
        assert!(range.contains(d(1)));
        assert!(!range.contains(d(2)));
    }

    #[test]
    fn test_fee_scenario_movements() {
        let entries = vec![entry(1, 5, "1001", "4001", dec!(100))];
        let result = compute_balances(&entries, &chart(), None);

        let bank = result.get(&"1001".into()).unwrap();
        assert_eq!(bank.increases, dec!(100));
        assert_eq!(bank.decreases, dec!(0));

        let fees = result.get(&"4001".into()).unwrap();
        assert_eq!(fees.increases, dec!(100));
        assert_eq!(fees.net_change(), dec!(100));

        assert!(result.get(&"5001".into()).unwrap().is_negligible());
        assert!(result.get(&"1000".into()).is_none());
    }

    #[test]
    fn test_range_filters_entries() {
        let entries = vec![
            entry(1, 1, "1001", "4001", dec!(10)),
            entry(2, 5, "1001", "4001", dec!(20)),
            entry(3, 9, "1001", "4001", dec!(40)),
        ];
        let range = DateRange::try_new(d(2), d(8)).unwrap();
        let result = compute_balances(&entries, &chart(), Some(&range));
        assert_eq!(result.net_change(&"1001".into()), dec!(20));
    }

    #[test]
    fn test_orphan_legs_are_collected() {
        let entries = vec![
            entry(1, 1, "1001", "9999", dec!(10)),
            entry(2, 1, "1000", "4001", dec!(5)),
        ];
        let result = compute_balances(&entries, &chart(), None);

        assert_eq!(result.orphan_legs.len(), 2);
        assert_eq!(result.orphan_legs[0].reason, OrphanReason::UnknownAccount);
        assert_eq!(result.orphan_legs[1].reason, OrphanReason::GroupAccount);
        assert_eq!(result.net_change(&"1001".into()), dec!(10));
        assert!(result.orphan_legs[0].warning().contains("9999"));
    }

    #[test]
    fn test_side_totals_match_for_balanced_journal() {
        let entries = vec![
            entry(1, 1, "1001", "2001", dec!(500)),
            entry(2, 1, "1001", "4001", dec!(7.5)),
            entry(3, 2, "5001", "1001", dec!(2.25)),
            entry(4, 3, "2001", "1001", dec!(100)),
        ];
        let chart = chart();
        let result = compute_balances(&entries, &chart, None);
        let (debits, credits) = result.side_totals(&chart);
        assert_eq!(debits, credits);
        assert_eq!(debits, dec!(609.75));
    }

    #[test]
    fn test_running_balances_signed() {
        let mut skewed = entry(2, 2, "5001", "1001", dec!(10));
        skewed.credit_amount_usd = Some(dec!(9));
        let entries = vec![entry(1, 1, "1001", "4001", dec!(100)), skewed];

        let signed = running_balances(&entries, &chart(), None);
        assert_eq!(signed.balances[&AccountId::from("1001")], dec!(91));
        assert_eq!(signed.balances[&AccountId::from("4001")], dec!(-100));
        assert_eq!(signed.balances[&AccountId::from("5001")], dec!(10));

        let total: Decimal = signed.balances.values().sum();
        assert_eq!(total, dec!(1));

        let early = running_balances(&entries, &chart(), Some(d(1)));
        assert!(!early.balances.contains_key(&AccountId::from("5001")));
    }

    #[test]
    fn test_trial_split() {
        let split = split_for_trial_balance(NormalSide::DebitNormal, dec!(50));
        assert_eq!((split.debit, split.credit, split.abnormal), (dec!(50), dec!(0), false));

        let split = split_for_trial_balance(NormalSide::DebitNormal, dec!(-5));
        assert_eq!((split.debit, split.credit, split.abnormal), (dec!(0), dec!(5), true));

        let split = split_for_trial_balance(NormalSide::CreditNormal, dec!(-80));
        assert_eq!((split.debit, split.credit, split.abnormal), (dec!(0), dec!(80), false));

        let split = split_for_trial_balance(NormalSide::CreditNormal, dec!(3));
        assert!(split.abnormal);
    }

    #[test]
    fn test_running_balance_from_opening() {
        let opening = RunningBalance::opening(dec!(40));
        let next = RunningBalance::next_entry(&opening, dec!(-15));
        assert_eq!(next.sequence, 1);
        assert_eq!(next.balance_before, dec!(40));
        assert_eq!(next.balance_after, dec!(25));
    }
}
