//! The single boundary where backend records become domain types.
//!
//! Everything ambiguous about the wire format (id field names, nested vs
//! flat balances, string vs list categories, date formats) is resolved here
//! and nowhere else.

use anyhow::{Context, Result, bail};

use crate::account::{Account, AccountType, Balance, BalancePreference, BalanceReading};
use crate::time::parse_provider_date;
use crate::transaction::{Category, Transaction};
use crate::wire::{AccountRecord, RawCategory, TransactionRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub balance_preference: BalancePreference,
}

pub fn normalize_account(rec: AccountRecord, opts: &NormalizeOptions) -> Result<Account> {
    let id = non_empty(rec.account_id)
        .or_else(|| non_empty(rec.id))
        .context("account record has neither account_id nor id")?;
    let item_id = non_empty(rec.item_id).with_context(|| format!("account {id} has no item_id"))?;

    let nested = rec.balances.unwrap_or_default();
    let reading = BalanceReading::from_parts(
        nested.current.or(rec.current_balance),
        nested.available.or(rec.available_balance),
    );
    let currency = nested.iso_currency_code.or(rec.iso_currency_code);

    let name = non_empty(rec.name)
        .or_else(|| non_empty(rec.official_name.clone()))
        .unwrap_or_else(|| format!("Account {}", rec.mask.as_deref().unwrap_or(&id)));

    Ok(Account {
        name,
        official_name: rec.official_name,
        mask: rec.mask,
        kind: rec.kind.as_deref().map(AccountType::parse).unwrap_or(AccountType::Other),
        subtype: non_empty(rec.subtype),
        balance: Balance::new(reading, currency, opts.balance_preference),
        id,
        item_id,
    })
}

pub fn normalize_transaction(rec: TransactionRecord) -> Result<Transaction> {
    let id = non_empty(rec.transaction_id)
        .or_else(|| non_empty(rec.id))
        .context("transaction record has neither transaction_id nor id")?;
    let account_id = non_empty(rec.account_id).with_context(|| format!("transaction {id} has no account_id"))?;
    let Some(amount) = rec.amount else {
        bail!("transaction {id} has no amount");
    };
    let date = match rec.date.as_deref() {
        Some(raw) => parse_provider_date(raw).with_context(|| format!("transaction {id}"))?,
        None => bail!("transaction {id} has no date"),
    };

    Ok(Transaction {
        name: non_empty(rec.name)
            .or_else(|| non_empty(rec.merchant_name.clone()))
            .unwrap_or_else(|| "Unknown".to_string()),
        merchant_name: non_empty(rec.merchant_name),
        category: normalize_category(rec.category),
        pending: rec.pending.unwrap_or(false),
        currency: rec.iso_currency_code,
        account_id,
        amount,
        date,
        id,
    })
}

/// Blank elements are dropped; a blank single string is uncategorized.
pub fn normalize_category(raw: Option<RawCategory>) -> Category {
    let path = match raw {
        None => Vec::new(),
        Some(RawCategory::Single(s)) => non_empty(Some(s)).into_iter().collect(),
        Some(RawCategory::Path(parts)) => parts
            .into_iter()
            .filter_map(|p| non_empty(Some(p)))
            .collect(),
    };
    Category::new(path)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
