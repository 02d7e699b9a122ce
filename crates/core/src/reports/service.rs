//! Report generation service.
//!
//! Every report is a pure function of a [`LedgerSnapshot`]; callers read the
//! snapshot once and can derive several reports from it.

use std::collections::BTreeMap;

use cambio_shared::types::AccountId;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{
    AccountBalanceRow, AccountBalancesReport, AccountTransactionLine, AccountTransactionsReport,
    CashFlowCategory, CashFlowLine, CashFlowReport, ClassificationSection, GroupRollup,
    IncomeStatementLine, IncomeStatementReport, TrialBalanceReport, TrialBalanceRow,
};
use crate::accounts::{Account, AccountRole, ChartOfAccounts, Classification};
use crate::ledger::{
    AccountMovement, BALANCE_TOLERANCE, DateRange, EntryType, IntervalBalances, JournalEntry,
    LedgerSnapshot, OrphanLeg, RunningBalance, compute_balances, running_balances,
    split_for_trial_balance,
};

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Builds a report interval.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` when `from > to`.
    pub fn date_range(from: NaiveDate, to: NaiveDate) -> Result<DateRange, ReportError> {
        DateRange::try_new(from, to).ok_or(ReportError::InvalidDateRange { start: from, end: to })
    }

    // ===== Account balances =====

    /// Interval movements per leaf account, grouped by classification.
    ///
    /// Accounts whose activity is below one cent are left out. Group accounts
    /// appear as rollups of their leaf descendants.
    #[must_use]
    pub fn account_balances(
        snapshot: &LedgerSnapshot,
        range: Option<&DateRange>,
    ) -> AccountBalancesReport {
        let chart = &snapshot.chart;
        let balances = compute_balances(&snapshot.entries, chart, range);

        let mut rows: BTreeMap<Classification, Vec<AccountBalanceRow>> = BTreeMap::new();
        for account in chart.ordered() {
            let Some(movement) = balances.get(&account.id) else {
                continue;
            };
            if movement.is_negligible() {
                continue;
            }
            rows.entry(account.classification)
                .or_default()
                .push(Self::balance_row(account, movement));
        }

        let sections = Classification::ALL
            .into_iter()
            .filter_map(|classification| {
                let accounts = rows.remove(&classification)?;
                let subtotal = accounts.iter().map(|r| r.net_change).sum();
                Some(ClassificationSection {
                    classification,
                    accounts,
                    subtotal,
                })
            })
            .collect();

        AccountBalancesReport {
            report_type: "account_balances".to_string(),
            range: range.copied(),
            sections,
            groups: Self::group_rollups(chart, &balances),
            warnings: Self::orphan_warnings(&balances.orphan_legs),
        }
    }

    fn balance_row(account: &Account, movement: &AccountMovement) -> AccountBalanceRow {
        let net_change = movement.net_change();
        AccountBalanceRow {
            account_id: account.id.clone(),
            name: account.name.clone(),
            classification: account.classification,
            increases: movement.increases,
            decreases: movement.decreases,
            net_change,
            ending_balance: net_change,
        }
    }

    fn group_rollups(chart: &ChartOfAccounts, balances: &IntervalBalances) -> Vec<GroupRollup> {
        chart
            .ordered()
            .into_iter()
            .filter(|a| a.is_group)
            .filter_map(|group| {
                let leaves = chart.descendant_leaves(&group.id);
                let mut total = AccountMovement::default();
                for leaf in &leaves {
                    if let Some(movement) = balances.get(&leaf.id) {
                        total.increases += movement.increases;
                        total.decreases += movement.decreases;
                    }
                }
                (!total.is_negligible()).then(|| GroupRollup {
                    account_id: group.id.clone(),
                    name: group.name.clone(),
                    classification: group.classification,
                    increases: total.increases,
                    decreases: total.decreases,
                    net_change: total.net_change(),
                    leaf_count: leaves.len(),
                })
            })
            .collect()
    }

    // ===== Account transactions =====

    /// Entries touching one leaf account with running balances.
    ///
    /// Lines are ordered by `(date, id)`. The opening balance replays every
    /// entry dated before the interval.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` for unknown codes, `GroupAccount` for groups.
    pub fn account_transactions(
        snapshot: &LedgerSnapshot,
        account_id: &AccountId,
        range: Option<&DateRange>,
    ) -> Result<AccountTransactionsReport, ReportError> {
        let account = snapshot
            .chart
            .get(account_id)
            .ok_or_else(|| ReportError::AccountNotFound(account_id.clone()))?;
        if account.is_group {
            return Err(ReportError::GroupAccount(account_id.clone()));
        }
        let side = account.normal_side();

        let mut touching: Vec<(&JournalEntry, EntryType)> = snapshot
            .entries
            .iter()
            .filter_map(|e| e.leg_for(account_id).map(|leg| (e, leg)))
            .collect();
        touching.sort_by_key(|(e, _)| (e.date, e.id));

        let signed_change = |entry: &JournalEntry, leg: EntryType| -> (Decimal, bool) {
            let amount = match leg {
                EntryType::Debit => entry.debit_leg_usd(),
                EntryType::Credit => entry.credit_leg_usd(),
            };
            let increase = side.is_increase(leg);
            (if increase { amount } else { -amount }, increase)
        };

        let opening_balance: Decimal = touching
            .iter()
            .filter(|(e, _)| range.is_some_and(|r| e.date < r.from))
            .map(|(e, leg)| signed_change(e, *leg).0)
            .sum();

        let mut running = RunningBalance::opening(opening_balance);
        let mut total_increases = Decimal::ZERO;
        let mut total_decreases = Decimal::ZERO;
        let mut lines = Vec::new();

        let in_range = touching
            .into_iter()
            .filter(|(e, _)| range.is_none_or(|r| r.contains(e.date)));
        for (entry, leg) in in_range {
            let (change, is_increase) = signed_change(entry, leg);
            if is_increase {
                total_increases += change;
            } else {
                total_decreases -= change;
            }
            running = RunningBalance::next_entry(&running, change);

            let (counter_account, counter_account_name, amount_usd) = match leg {
                EntryType::Debit => (
                    entry.credit_account.clone(),
                    entry.credit_account_name.clone(),
                    entry.debit_leg_usd(),
                ),
                EntryType::Credit => (
                    entry.debit_account.clone(),
                    entry.debit_account_name.clone(),
                    entry.credit_leg_usd(),
                ),
            };

            lines.push(AccountTransactionLine {
                entry_id: entry.id,
                date: entry.date,
                description: entry.description.clone(),
                leg,
                counter_account,
                counter_account_name,
                amount_usd,
                is_increase,
                balance_before: running.balance_before,
                balance_after: running.balance_after,
            });
        }

        Ok(AccountTransactionsReport {
            report_type: "account_transactions".to_string(),
            account_id: account.id.clone(),
            name: account.name.clone(),
            classification: account.classification,
            range: range.copied(),
            opening_balance,
            closing_balance: running.balance_after,
            total_increases,
            total_decreases,
            lines,
        })
    }

    // ===== Trial balance =====

    /// Trial balance as of a date (inclusive), or over the whole journal.
    ///
    /// Totals include every attributed leg, so an unbalanced journal shows up
    /// as a non-zero `difference` even when individual rows are hidden.
    #[must_use]
    pub fn trial_balance(
        snapshot: &LedgerSnapshot,
        as_of: Option<NaiveDate>,
    ) -> TrialBalanceReport {
        let chart = &snapshot.chart;
        let signed = running_balances(&snapshot.entries, chart, as_of);

        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;
        let mut rows = Vec::new();

        for account in chart.ordered() {
            let Some(balance) = signed.balances.get(&account.id).copied() else {
                continue;
            };
            let split = split_for_trial_balance(account.normal_side(), balance);
            total_debit += split.debit;
            total_credit += split.credit;

            if balance.abs() < BALANCE_TOLERANCE {
                continue;
            }
            rows.push(TrialBalanceRow {
                account_id: account.id.clone(),
                name: account.name.clone(),
                classification: account.classification,
                debit: split.debit,
                credit: split.credit,
                abnormal: split.abnormal,
            });
        }

        let difference = total_debit - total_credit;
        let is_balanced = difference.is_zero();

        let mut warnings = Vec::new();
        if !is_balanced {
            tracing::warn!(%total_debit, %total_credit, %difference, "trial balance does not foot");
            warnings.push(format!(
                "Trial balance out of balance by {difference} USD \
                 (debits {total_debit}, credits {total_credit})"
            ));
        }
        warnings.extend(Self::orphan_warnings(&signed.orphan_legs));

        TrialBalanceReport {
            report_type: "trial_balance".to_string(),
            as_of,
            rows,
            total_debit,
            total_credit,
            difference,
            is_balanced,
            warnings,
        }
    }

    // ===== Income statement =====

    /// Revenue and expenses over an interval.
    ///
    /// `net_income = total_revenue - total_expenses`. Lines are sorted by
    /// magnitude, largest first.
    #[must_use]
    pub fn income_statement(
        snapshot: &LedgerSnapshot,
        range: Option<&DateRange>,
    ) -> IncomeStatementReport {
        let chart = &snapshot.chart;
        let balances = compute_balances(&snapshot.entries, chart, range);

        let lines_for = |classification: Classification| -> Vec<IncomeStatementLine> {
            let mut lines: Vec<IncomeStatementLine> = chart
                .leaves()
                .filter(|a| a.classification == classification)
                .filter_map(|account| {
                    let movement = balances.get(&account.id)?;
                    (!movement.is_negligible()).then(|| IncomeStatementLine {
                        account_id: account.id.clone(),
                        name: account.name.clone(),
                        amount: movement.net_change(),
                    })
                })
                .collect();
            lines.sort_by(|a, b| {
                b.amount
                    .abs()
                    .cmp(&a.amount.abs())
                    .then_with(|| a.account_id.cmp(&b.account_id))
            });
            lines
        };

        let revenue = lines_for(Classification::Income);
        let expenses = lines_for(Classification::Expenses);
        let total_revenue: Decimal = revenue.iter().map(|l| l.amount).sum();
        let total_expenses: Decimal = expenses.iter().map(|l| l.amount).sum();

        IncomeStatementReport {
            report_type: "income_statement".to_string(),
            range: range.copied(),
            revenue,
            expenses,
            total_revenue,
            total_expenses,
            net_income: total_revenue - total_expenses,
        }
    }

    // ===== Cash flow =====

    /// Cash movements over an interval, categorized by counter account.
    ///
    /// A leg on a cash account is an inflow when debited and an outflow when
    /// credited. Transfers between two cash accounts cancel out; any USD
    /// difference between their legs is reported under `Other`.
    #[must_use]
    pub fn cash_flow(snapshot: &LedgerSnapshot, range: Option<&DateRange>) -> CashFlowReport {
        let chart = &snapshot.chart;
        let is_cash = |id: &AccountId| chart.get(id).is_some_and(Account::is_cash);

        let mut totals: BTreeMap<CashFlowCategory, (Decimal, Decimal)> = BTreeMap::new();
        let mut warnings = Vec::new();
        let mut opening_cash = Decimal::ZERO;

        for entry in &snapshot.entries {
            let debit_cash = is_cash(&entry.debit_account);
            let credit_cash = is_cash(&entry.credit_account);
            if !debit_cash && !credit_cash {
                continue;
            }
            let inflow = if debit_cash { entry.debit_leg_usd() } else { Decimal::ZERO };
            let outflow = if credit_cash { entry.credit_leg_usd() } else { Decimal::ZERO };

            if range.is_some_and(|r| entry.date < r.from) {
                opening_cash += inflow - outflow;
                continue;
            }
            if range.is_some_and(|r| !r.contains(entry.date)) {
                continue;
            }

            let (category, inflow, outflow) = match (debit_cash, credit_cash) {
                (true, true) => {
                    let skew = inflow - outflow;
                    if skew.is_zero() {
                        continue;
                    }
                    warnings.push(format!(
                        "Entry {} moves cash between {} and {} with a {skew} USD leg difference",
                        entry.id, entry.debit_account, entry.credit_account
                    ));
                    if skew > Decimal::ZERO {
                        (CashFlowCategory::Other, skew, Decimal::ZERO)
                    } else {
                        (CashFlowCategory::Other, Decimal::ZERO, -skew)
                    }
                }
                (true, false) => (
                    Self::categorize(chart.get(&entry.credit_account), true),
                    inflow,
                    Decimal::ZERO,
                ),
                (false, _) => (
                    Self::categorize(chart.get(&entry.debit_account), false),
                    Decimal::ZERO,
                    outflow,
                ),
            };

            let slot = totals.entry(category).or_default();
            slot.0 += inflow;
            slot.1 += outflow;
        }

        let lines: Vec<CashFlowLine> = CashFlowCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let (inflow, outflow) = totals.get(&category).copied()?;
                Some(CashFlowLine {
                    category,
                    inflow,
                    outflow,
                    net: inflow - outflow,
                })
            })
            .collect();

        let total_inflows: Decimal = lines.iter().map(|l| l.inflow).sum();
        let total_outflows: Decimal = lines.iter().map(|l| l.outflow).sum();
        let net_change = total_inflows - total_outflows;

        let calculator_net_change =
            compute_balances(&snapshot.entries, chart, range).cash_net_change(chart);
        let reconciles = net_change == calculator_net_change;
        if !reconciles {
            tracing::warn!(
                %net_change,
                %calculator_net_change,
                "cash flow does not match cash balances"
            );
            warnings.push(format!(
                "Cash flow net change {net_change} differs from \
                 cash account movement {calculator_net_change}"
            ));
        }

        CashFlowReport {
            report_type: "cash_flow".to_string(),
            range: range.copied(),
            opening_cash,
            closing_cash: opening_cash + net_change,
            lines,
            total_inflows,
            total_outflows,
            net_change,
            calculator_net_change,
            reconciles,
            warnings,
        }
    }

    fn categorize(counter: Option<&Account>, inflow: bool) -> CashFlowCategory {
        let Some(counter) = counter.filter(|a| !a.is_group) else {
            return CashFlowCategory::Other;
        };
        match (counter.role, counter.classification) {
            (AccountRole::ClientBalance, _) if inflow => CashFlowCategory::ClientReceipts,
            (AccountRole::ClientBalance, _) => CashFlowCategory::ClientPayments,
            (_, Classification::Income) => CashFlowCategory::Revenue,
            (_, Classification::Expenses) => CashFlowCategory::OperatingExpenses,
            (_, Classification::Assets) => CashFlowCategory::Investing,
            _ => CashFlowCategory::Other,
        }
    }

    fn orphan_warnings(orphans: &[OrphanLeg]) -> Vec<String> {
        orphans.iter().map(OrphanLeg::warning).collect()
    }
}
