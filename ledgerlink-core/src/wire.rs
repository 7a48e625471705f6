//! Record shapes exactly as the backend serves them.
//!
//! Every field the backend has been seen to omit is optional, and the two
//! known shape inconsistencies are kept as
//! tagged unions until [`crate::normalize`] resolves them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category arrives either as one string or as a path of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCategory {
    Single(String),
    Path(Vec<String>),
}

/// Provider-style nested balances block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBalances {
    #[serde(default)]
    pub current: Option<Decimal>,
    #[serde(default)]
    pub available: Option<Decimal>,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
}

/// Row from `GET /api/db/accounts`
///
/// Database rows use `id` and flat balance columns, provider payloads use
/// `account_id` and a nested `balances` object; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub balances: Option<RawBalances>,
    #[serde(default)]
    pub current_balance: Option<Decimal>,
    #[serde(default)]
    pub available_balance: Option<Decimal>,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
}

/// Row from `GET /api/db/transactions`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub category: Option<RawCategory>,
    #[serde(default)]
    pub pending: Option<bool>,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
}
