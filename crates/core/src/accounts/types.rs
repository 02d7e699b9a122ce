//! Chart of accounts domain types.

use cambio_shared::types::{AccountId, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::EntryType;

/// Top-level account classification.
///
/// The classification alone decides which side increases the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    /// Assets (debit-normal).
    Assets,
    /// Liabilities (credit-normal).
    Liabilities,
    /// Equity (credit-normal).
    Equity,
    /// Income (credit-normal).
    Income,
    /// Expenses (debit-normal).
    Expenses,
}

impl Classification {
    /// Report ordering of the classifications.
    pub const ALL: [Self; 5] = [
        Self::Assets,
        Self::Liabilities,
        Self::Equity,
        Self::Income,
        Self::Expenses,
    ];

    /// Returns the side that increases accounts of this classification.
    #[must_use]
    pub const fn normal_side(self) -> NormalSide {
        match self {
            Self::Assets | Self::Expenses => NormalSide::DebitNormal,
            Self::Liabilities | Self::Equity | Self::Income => NormalSide::CreditNormal,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Assets => "Assets",
            Self::Liabilities => "Liabilities",
            Self::Equity => "Equity",
            Self::Income => "Income",
            Self::Expenses => "Expenses",
        };
        f.write_str(label)
    }
}

/// Normal balance side of an account.
///
/// - Assets/Expenses: balance += debit - credit (debit-normal)
/// - Liabilities/Equity/Income: balance += credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalSide {
    /// Debit-normal accounts (Assets, Expenses)
    DebitNormal,
    /// Credit-normal accounts (Liabilities, Equity, Income)
    CreditNormal,
}

impl NormalSide {
    /// Calculates the balance change for debit and credit totals.
    #[must_use]
    pub fn calculate_balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::DebitNormal => debit - credit,
            Self::CreditNormal => credit - debit,
        }
    }

    /// Returns true if a leg of the given type increases the account.
    #[must_use]
    pub fn is_increase(self, leg: EntryType) -> bool {
        matches!(
            (self, leg),
            (Self::DebitNormal, EntryType::Debit) | (Self::CreditNormal, EntryType::Credit)
        )
    }
}

/// Operational role of an account.
///
/// Drives the cash-flow report and the auto-posting engine. Cash roles
/// require the `Assets` classification, `ClientBalance` requires
/// `Liabilities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// No special role.
    #[default]
    General,
    /// Physical cash desk.
    Cash,
    /// Bank account.
    Bank,
    /// Crypto wallet.
    CryptoWallet,
    /// Balance owed to a client.
    ClientBalance,
}

impl AccountRole {
    /// Returns true for roles that hold cash or cash equivalents.
    #[must_use]
    pub const fn is_cash(self) -> bool {
        matches!(self, Self::Cash | Self::Bank | Self::CryptoWallet)
    }

    /// Returns true if the role may be carried by an account of `classification`.
    #[must_use]
    pub fn allows(self, classification: Classification) -> bool {
        match self {
            Self::General => true,
            Self::Cash | Self::Bank | Self::CryptoWallet => {
                classification == Classification::Assets
            }
            Self::ClientBalance => classification == Classification::Liabilities,
        }
    }
}

/// An entry in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Numeric account code.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Classification.
    pub classification: Classification,
    /// Group accounts only roll up their descendants and never receive postings.
    #[serde(default)]
    pub is_group: bool,
    /// Parent group account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AccountId>,
    /// Account currency; `None` means USD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    /// Display ordering (ascending).
    #[serde(default)]
    pub priority: i32,
    /// Operational role.
    #[serde(default)]
    pub role: AccountRole,
}

impl Account {
    /// Creates a USD leaf account with the general role.
    #[must_use]
    pub fn leaf(
        id: impl Into<AccountId>,
        name: impl Into<String>,
        classification: Classification,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            classification,
            is_group: false,
            parent_id: None,
            currency: None,
            priority: 0,
            role: AccountRole::General,
        }
    }

    /// Creates a group account.
    #[must_use]
    pub fn group(
        id: impl Into<AccountId>,
        name: impl Into<String>,
        classification: Classification,
    ) -> Self {
        Self {
            is_group: true,
            ..Self::leaf(id, name, classification)
        }
    }

    /// Sets the parent group.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<AccountId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn with_role(mut self, role: AccountRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the currency.
    #[must_use]
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Returns the account currency, defaulting to USD.
    #[must_use]
    pub fn currency_or_usd(&self) -> Currency {
        self.currency.unwrap_or(Currency::Usd)
    }

    /// Returns the normal balance side.
    #[must_use]
    pub fn normal_side(&self) -> NormalSide {
        self.classification.normal_side()
    }

    /// Returns true if this is a cash account (leaf with a cash role).
    #[must_use]
    pub fn is_cash(&self) -> bool {
        !self.is_group && self.role.is_cash()
    }
}
