//! Transaction types and the sign convention used to read amounts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A posted or pending transaction, read-only on the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    /// Signed amount as reported by the backend; see [`SignConvention`]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub name: String,
    pub merchant_name: Option<String>,
    pub category: Category,
    pub pending: bool,
    pub currency: Option<String>,
}

impl Transaction {
    pub fn flow(&self, convention: SignConvention) -> Flow {
        convention.flow(self.amount)
    }

    /// Amount with inflows positive, whatever the backend convention.
    pub fn net_amount(&self, convention: SignConvention) -> Decimal {
        convention.to_inflow_positive(self.amount)
    }
}

/// Ordered category path, most general first. Empty means uncategorized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub path: Vec<String>,
}

impl Category {
    pub const UNCATEGORIZED: &'static str = "Uncategorized";

    pub fn new(path: Vec<String>) -> Self {
        Self { path }
    }

    pub fn uncategorized() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    /// Most specific element of the path
    pub fn detailed(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    pub fn is_uncategorized(&self) -> bool {
        self.path.is_empty()
    }

    pub fn primary_label(&self) -> &str {
        self.primary().unwrap_or(Self::UNCATEGORIZED)
    }

    /// `Food and Drink > Restaurants`
    pub fn label(&self) -> String {
        if self.path.is_empty() {
            return Self::UNCATEGORIZED.to_string();
        }
        self.path.join(" > ")
    }
}

/// How the backend signs amounts.
///
/// Aggregation providers disagree: some report money leaving the account as
/// positive. The convention is configuration, never guessed per record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignConvention {
    #[default]
    PositiveInflow,
    PositiveOutflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Inflow,
    Outflow,
    Zero,
}

impl SignConvention {
    pub fn to_inflow_positive(&self, amount: Decimal) -> Decimal {
        match self {
            SignConvention::PositiveInflow => amount,
            SignConvention::PositiveOutflow => -amount,
        }
    }

    pub fn flow(&self, amount: Decimal) -> Flow {
        let normalized = self.to_inflow_positive(amount);
        if normalized.is_zero() {
            Flow::Zero
        } else if normalized.is_sign_positive() {
            Flow::Inflow
        } else {
            Flow::Outflow
        }
    }
}
