//! Account types as the client holds them after normalization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A bank account belonging to one linked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Provider account id, unique within its item
    pub id: String,
    /// Owning item (bank connection)
    pub item_id: String,
    pub name: String,
    pub official_name: Option<String>,
    /// Last digits of the account number, if the provider exposes them
    pub mask: Option<String>,
    pub kind: AccountType,
    pub subtype: Option<String>,
    pub balance: Balance,
}

impl Account {
    /// Balance chosen for display at normalization time.
    pub fn display_balance(&self) -> Option<Decimal> {
        self.balance.display
    }
}

/// Coarse account classification used by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Depository,
    Credit,
    Loan,
    Investment,
    Other,
}

impl AccountType {
    /// Parse the provider's `type` string. Unknown values map to `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "depository" => AccountType::Depository,
            "credit" => AccountType::Credit,
            "loan" => AccountType::Loan,
            "investment" | "brokerage" => AccountType::Investment,
            _ => AccountType::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Depository => "depository",
            AccountType::Credit => "credit",
            AccountType::Loan => "loan",
            AccountType::Investment => "investment",
            AccountType::Other => "other",
        }
    }

    /// Credit and loan balances are money owed.
    pub fn is_liability(&self) -> bool {
        matches!(self, AccountType::Credit | AccountType::Loan)
    }
}

/// Which reported figure to show when both are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BalancePreference {
    #[default]
    Current,
    Available,
}

/// The balances a provider reported for an account.
///
/// Providers are inconsistent about which of `current`/`available` they fill,
/// so the reading keeps track of what was actually present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BalanceReading {
    Both { current: Decimal, available: Decimal },
    CurrentOnly { current: Decimal },
    AvailableOnly { available: Decimal },
    Missing,
}

impl BalanceReading {
    pub fn from_parts(current: Option<Decimal>, available: Option<Decimal>) -> Self {
        match (current, available) {
            (Some(current), Some(available)) => BalanceReading::Both { current, available },
            (Some(current), None) => BalanceReading::CurrentOnly { current },
            (None, Some(available)) => BalanceReading::AvailableOnly { available },
            (None, None) => BalanceReading::Missing,
        }
    }

    pub fn current(&self) -> Option<Decimal> {
        match self {
            BalanceReading::Both { current, .. } | BalanceReading::CurrentOnly { current } => {
                Some(*current)
            }
            _ => None,
        }
    }

    pub fn available(&self) -> Option<Decimal> {
        match self {
            BalanceReading::Both { available, .. } | BalanceReading::AvailableOnly { available } => {
                Some(*available)
            }
            _ => None,
        }
    }

    /// Pick the preferred figure, falling back to the other one.
    pub fn resolve(&self, preference: BalancePreference) -> Option<Decimal> {
        match (preference, self) {
            (_, BalanceReading::Missing) => None,
            (BalancePreference::Current, BalanceReading::Both { current, .. })
            | (_, BalanceReading::CurrentOnly { current }) => Some(*current),
            (BalancePreference::Available, BalanceReading::Both { available, .. })
            | (_, BalanceReading::AvailableOnly { available }) => Some(*available),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub reading: BalanceReading,
    /// ISO currency code, when reported
    pub currency: Option<String>,
    pub display: Option<Decimal>,
}

impl Balance {
    pub fn new(reading: BalanceReading, currency: Option<String>, preference: BalancePreference) -> Self {
        Self {
            display: reading.resolve(preference),
            reading,
            currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_parse() {
        assert_eq!(AccountType::parse("Depository"), AccountType::Depository);
        assert_eq!(AccountType::parse("brokerage"), AccountType::Investment);
        assert_eq!(AccountType::parse("crypto"), AccountType::Other);
        assert!(AccountType::Loan.is_liability());
        assert!(!AccountType::Investment.is_liability());
    }

    #[test]
    fn test_resolve_prefers_then_falls_back() {
        let both = BalanceReading::from_parts(Some(Decimal::new(10000, 2)), Some(Decimal::new(9050, 2)));
        assert_eq!(both.resolve(BalancePreference::Current), Some(Decimal::new(10000, 2)));
        assert_eq!(both.resolve(BalancePreference::Available), Some(Decimal::new(9050, 2)));

        let only_available = BalanceReading::from_parts(None, Some(Decimal::new(42, 0)));
        assert_eq!(only_available.resolve(BalancePreference::Current), Some(Decimal::new(42, 0)));

        let only_current = BalanceReading::from_parts(Some(Decimal::new(7, 0)), None);
        assert_eq!(only_current.resolve(BalancePreference::Available), Some(Decimal::new(7, 0)));

        assert_eq!(BalanceReading::from_parts(None, None).resolve(BalancePreference::Current), None);
    }

    #[test]
    fn test_balance_keeps_reading() {
        let reading = BalanceReading::from_parts(None, Some(Decimal::new(5, 0)));
        let balance = Balance::new(reading, Some("USD".into()), BalancePreference::Current);
        assert_eq!(balance.display, Some(Decimal::new(5, 0)));
        assert_eq!(balance.reading.current(), None);
        assert_eq!(balance.reading.available(), Some(Decimal::new(5, 0)));
    }
}
