//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ClientId` where a
//! `TransactionId` is expected. Most identifiers are issued by external
//! producers (forms, SMS ingestion, wallet sync) and are opaque strings;
//! journal entry ids are sequential numbers allocated by the store counter.

use serde::{Deserialize, Serialize};

/// Macro to generate typed string-key wrappers.
macro_rules! typed_key {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Creates an ID from anything convertible into a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

typed_key!(
    AccountId,
    "Numeric account code in the chart of accounts (e.g. `1001`)."
);
typed_key!(TransactionId, "Identifier of an exchange transaction.");
typed_key!(ClientId, "Identifier of a client of the exchange.");
typed_key!(RecordId, "Identifier of a client-submitted cash or USDT record.");

impl AccountId {
    /// Returns true if the code is a non-empty run of ASCII digits.
    #[must_use]
    pub fn is_numeric_code(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Sequential identifier of a journal entry.
///
/// Allocated through the store's atomic counter, so ids are strictly
/// increasing in allocation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JournalEntryId(pub u64);

impl JournalEntryId {
    /// Returns the inner sequence number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JournalEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JournalEntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1001", true)]
    #[case("40010", true)]
    #[case("", false)]
    #[case("10a1", false)]
    #[case(" 1001", false)]
    fn test_account_numeric_code(#[case] code: &str, #[case] expected: bool) {
        assert_eq!(AccountId::from(code).is_numeric_code(), expected);
    }

    #[test]
    fn test_typed_key_display_and_serde() {
        let id = TransactionId::new("T-17");
        assert_eq!(id.to_string(), "T-17");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"T-17\"");

        let back: TransactionId = serde_json::from_str("\"T-17\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_journal_entry_id_ordering_and_parse() {
        let a: JournalEntryId = "7".parse().unwrap();
        let b = JournalEntryId(12);
        assert!(a < b);
        assert_eq!(a.value(), 7);
        assert!("x".parse::<JournalEntryId>().is_err());
    }
}
