//! In-memory view of the chart of accounts.

use std::collections::{BTreeMap, HashSet, VecDeque};

use cambio_shared::types::AccountId;

use super::types::Account;
use crate::ledger::LedgerError;

/// Snapshot of the chart of accounts, keyed by account code.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    accounts: BTreeMap<AccountId, Account>,
}

impl ChartOfAccounts {
    /// Builds a chart from a set of accounts. Later duplicates win.
    #[must_use]
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: accounts.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }

    /// Inserts or replaces an account, returning the previous version.
    pub fn insert(&mut self, account: Account) -> Option<Account> {
        self.accounts.insert(account.id.clone(), account)
    }

    /// Returns the account with the given code.
    #[must_use]
    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Returns the account if it can receive postings.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` for unknown codes, `GroupAccountPosting` for groups.
    pub fn postable(&self, id: &AccountId) -> Result<&Account, LedgerError> {
        let account = self
            .get(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))?;
        if account.is_group {
            return Err(LedgerError::GroupAccountPosting(id.clone()));
        }
        Ok(account)
    }

    /// Iterates all accounts in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Iterates leaf (postable) accounts in code order.
    pub fn leaves(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values().filter(|a| !a.is_group)
    }

    /// Iterates leaf accounts carrying a cash role.
    pub fn cash_accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values().filter(|a| a.is_cash())
    }

    /// Returns all accounts ordered for display: priority, then code.
    #[must_use]
    pub fn ordered(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        accounts
    }

    /// Iterates direct children of an account.
    pub fn children<'a>(&'a self, id: &AccountId) -> impl Iterator<Item = &'a Account> + use<'a> {
        let id = id.clone();
        self.accounts
            .values()
            .filter(move |a| a.parent_id.as_ref() == Some(&id))
    }

    /// Returns true if any account names `id` as its parent.
    #[must_use]
    pub fn has_children(&self, id: &AccountId) -> bool {
        self.children(id).next().is_some()
    }

    /// Returns every leaf below `id`, in code order.
    ///
    /// Tolerates cycles in stored data: each account is visited once.
    #[must_use]
    pub fn descendant_leaves(&self, id: &AccountId) -> Vec<&Account> {
        let mut visited: HashSet<AccountId> = HashSet::new();
        let mut queue: VecDeque<AccountId> = VecDeque::from([id.clone()]);
        let mut leaves: Vec<&Account> = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            for child in self.children(&current) {
                if child.is_group {
                    queue.push_back(child.id.clone());
                } else if visited.insert(child.id.clone()) {
                    leaves.push(child);
                }
            }
        }

        leaves.sort_by(|a, b| a.id.cmp(&b.id));
        leaves
    }

    /// Returns true if `ancestor` appears in the parent chain of `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: &AccountId, id: &AccountId) -> bool {
        let mut seen: HashSet<&AccountId> = HashSet::new();
        let mut current = self.get(id).and_then(|a| a.parent_id.as_ref());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            if !seen.insert(parent) {
                return false;
            }
            current = self.get(parent).and_then(|a| a.parent_id.as_ref());
        }
        false
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the chart has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::types::{AccountRole, Classification};

    fn sample_chart() -> ChartOfAccounts {
        ChartOfAccounts::new([
            Account::group("1000", "Cash & banks", Classification::Assets),
            Account::group("1100", "Banks", Classification::Assets).with_parent("1000"),
            Account::leaf("1001", "Desk", Classification::Assets)
                .with_parent("1000")
                .with_role(AccountRole::Cash),
            Account::leaf("1101", "Bank A", Classification::Assets)
                .with_parent("1100")
                .with_role(AccountRole::Bank),
            Account::leaf("1102", "Bank B", Classification::Assets)
                .with_parent("1100")
                .with_role(AccountRole::Bank),
            Account::leaf("4001", "Fee income", Classification::Income),
        ])
    }

    #[test]
    fn test_postable_rejects_groups_and_unknown() {
        let chart = sample_chart();
        assert!(chart.postable(&"1001".into()).is_ok());
        assert!(matches!(
            chart.postable(&"1000".into()),
            Err(LedgerError::GroupAccountPosting(_))
        ));
        assert!(matches!(
            chart.postable(&"9999".into()),
            Err(LedgerError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_descendant_leaves_walks_nested_groups() {
        let chart = sample_chart();
        let ids: Vec<&str> = chart
            .descendant_leaves(&"1000".into())
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1001", "1101", "1102"]);

        let banks: Vec<&str> = chart
            .descendant_leaves(&"1100".into())
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(banks, vec!["1101", "1102"]);
    }

    #[test]
    fn test_hierarchy_lookups_outlive_the_queried_id() {
        let chart = sample_chart();
        let (leaves, children) = {
            let banks = AccountId::from("1100");
            let children: Vec<&Account> = chart.children(&banks).collect();
            (chart.descendant_leaves(&banks), children)
        };
        assert_eq!(leaves.len(), 2);
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_descendant_leaves_survives_cycles() {
        let chart = ChartOfAccounts::new([
            Account::group("1000", "A", Classification::Assets).with_parent("1100"),
            Account::group("1100", "B", Classification::Assets).with_parent("1000"),
            Account::leaf("1101", "Leaf", Classification::Assets).with_parent("1100"),
        ]);
        assert_eq!(chart.descendant_leaves(&"1000".into()).len(), 1);
        assert!(!chart.is_ancestor(&"9999".into(), &"1000".into()));
    }

    #[test]
    fn test_cash_accounts_and_ancestry() {
        let chart = sample_chart();
        assert_eq!(chart.cash_accounts().count(), 3);
        assert!(chart.is_ancestor(&"1000".into(), &"1101".into()));
        assert!(!chart.is_ancestor(&"1100".into(), &"1001".into()));
        assert!(chart.has_children(&"1100".into()));
        assert!(!chart.has_children(&"1101".into()));
    }

    #[test]
    fn test_ordered_by_priority_then_code() {
        let mut chart = sample_chart();
        let mut income = chart.get(&"4001".into()).unwrap().clone();
        income.priority = -1;
        chart.insert(income);

        let first = chart.ordered()[0];
        assert_eq!(first.id.as_str(), "4001");
    }
}
