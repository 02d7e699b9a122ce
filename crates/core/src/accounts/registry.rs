//! Chart of accounts management.

use cambio_shared::types::{AccountId, Currency};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::chart::ChartOfAccounts;
use super::types::{Account, AccountRole, Classification};
use crate::ledger::LedgerError;
use crate::store::{DocumentStore, LedgerStore};

/// Partial update of an account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountUpdate {
    /// New name.
    pub name: Option<String>,
    /// New classification.
    pub classification: Option<Classification>,
    /// Turn into (or out of) a group.
    pub is_group: Option<bool>,
    /// New parent; `Some(None)` detaches.
    pub parent_id: Option<Option<AccountId>>,
    /// New currency; `Some(None)` resets to USD.
    pub currency: Option<Option<Currency>>,
    /// New priority.
    pub priority: Option<i32>,
    /// New role.
    pub role: Option<AccountRole>,
}

impl AccountUpdate {
    /// Applies the update to a copy of `account`.
    #[must_use]
    pub fn apply(&self, account: &Account) -> Account {
        let mut updated = account.clone();
        if let Some(name) = &self.name {
            updated.name.clone_from(name);
        }
        if let Some(classification) = self.classification {
            updated.classification = classification;
        }
        if let Some(is_group) = self.is_group {
            updated.is_group = is_group;
        }
        if let Some(parent_id) = &self.parent_id {
            updated.parent_id.clone_from(parent_id);
        }
        if let Some(currency) = self.currency {
            updated.currency = currency;
        }
        if let Some(priority) = self.priority {
            updated.priority = priority;
        }
        if let Some(role) = self.role {
            updated.role = role;
        }
        updated
    }
}

/// Validates an account against the chart it is about to join.
///
/// `existing` is the stored version for updates; `has_postings` tells
/// whether any journal leg references the account.
///
/// # Errors
///
/// `Validation` for malformed accounts, `AccountNotFound` for a missing
/// parent, `AccountChangeNotAllowed` for changes that conflict with
/// postings or children.
pub fn validate_account(
    candidate: &Account,
    chart: &ChartOfAccounts,
    existing: Option<&Account>,
    has_postings: bool,
) -> Result<(), LedgerError> {
    if !candidate.id.is_numeric_code() {
        return Err(LedgerError::Validation(format!(
            "account id '{}' must be a numeric code",
            candidate.id
        )));
    }
    if candidate.name.trim().is_empty() {
        return Err(LedgerError::Validation("account name cannot be empty".to_string()));
    }
    if !candidate.role.allows(candidate.classification) {
        return Err(LedgerError::Validation(format!(
            "role {:?} is not allowed on {} accounts",
            candidate.role, candidate.classification
        )));
    }

    if let Some(parent_id) = &candidate.parent_id {
        if parent_id == &candidate.id || chart.is_ancestor(&candidate.id, parent_id) {
            return Err(LedgerError::Validation(format!(
                "parent {parent_id} would create a cycle"
            )));
        }
        let parent = chart
            .get(parent_id)
            .ok_or_else(|| LedgerError::AccountNotFound(parent_id.clone()))?;
        if !parent.is_group {
            return Err(LedgerError::Validation(format!(
                "parent {parent_id} is not a group account"
            )));
        }
        if parent.classification != candidate.classification {
            return Err(LedgerError::Validation(format!(
                "parent {parent_id} is {} but account is {}",
                parent.classification, candidate.classification
            )));
        }
    }

    if let Some(existing) = existing {
        let refuse = |reason: &str| LedgerError::AccountChangeNotAllowed {
            account_id: candidate.id.clone(),
            reason: reason.to_string(),
        };
        if has_postings && candidate.is_group && !existing.is_group {
            return Err(refuse("account has postings and cannot become a group"));
        }
        if has_postings && candidate.classification != existing.classification {
            return Err(refuse("account has postings and cannot change classification"));
        }
        if existing.is_group && !candidate.is_group && chart.has_children(&candidate.id) {
            return Err(refuse("group has child accounts and cannot become a leaf"));
        }
    }

    Ok(())
}

/// Store-backed chart of accounts registry.
pub struct AccountRegistry<S: ?Sized> {
    store: LedgerStore<S>,
}

impl<S: DocumentStore + ?Sized> AccountRegistry<S> {
    /// Creates a registry.
    #[must_use]
    pub fn new(store: LedgerStore<S>) -> Self {
        Self { store }
    }

    /// Reads the chart of accounts.
    pub async fn chart(&self) -> Result<ChartOfAccounts, LedgerError> {
        Ok(self.store.chart().await?)
    }

    /// Returns an account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` or store failures.
    pub async fn get_account(&self, id: &AccountId) -> Result<Account, LedgerError> {
        self.store
            .account(id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))
    }

    /// Lists accounts ordered by priority, then code.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let chart = self.chart().await?;
        Ok(chart.ordered().into_iter().cloned().collect())
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// `AccountExists`, validation failures or store failures.
    #[instrument(skip_all, fields(account_id = %account.id))]
    pub async fn create_account(&self, account: Account) -> Result<Account, LedgerError> {
        let chart = self.chart().await?;
        if chart.get(&account.id).is_some() {
            return Err(LedgerError::AccountExists(account.id));
        }
        validate_account(&account, &chart, None, false)?;

        self.store.put_account(&account).await?;
        info!(
            classification = %account.classification,
            is_group = account.is_group,
            "account created"
        );
        Ok(account)
    }

    /// Applies a partial update to an account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`, validation failures or store failures.
    #[instrument(skip_all, fields(account_id = %id))]
    pub async fn update_account(
        &self,
        id: &AccountId,
        update: &AccountUpdate,
    ) -> Result<Account, LedgerError> {
        let chart = self.chart().await?;
        let existing = chart
            .get(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))?;
        let updated = update.apply(existing);

        let has_postings = !self.store.entries_touching(id).await?.is_empty();
        validate_account(&updated, &chart, Some(existing), has_postings)?;

        self.store.put_account(&updated).await?;
        info!("account updated");
        Ok(updated)
    }
}
