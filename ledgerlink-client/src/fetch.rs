//! User-scoped reads built on [`BackendApi`]: fetch, normalize, filter.

use ledgerlink_core::{
    Account, NormalizeOptions, Transaction, accounts_for_items, normalize_account, normalize_transaction,
};
use tracing::warn;

use crate::api::{BackendApi, TransactionQuery};
use crate::error::Result;

/// Accounts belonging to `user_id`'s linked items.
///
/// Items and accounts are fetched together; a record that cannot be
/// normalized is skipped with a warning rather than failing the whole list.
pub async fn fetch_user_accounts(
    api: &dyn BackendApi,
    user_id: &str,
    opts: &NormalizeOptions,
) -> Result<Vec<Account>> {
    let (items, records) = tokio::try_join!(api.items(user_id), api.accounts())?;

    let mut accounts = Vec::with_capacity(records.len());
    for rec in records {
        match normalize_account(rec, opts) {
            Ok(a) => accounts.push(a),
            Err(e) => warn!(error = %format!("{e:#}"), "skipping malformed account record"),
        }
    }
    Ok(accounts_for_items(&accounts, &items))
}

pub async fn fetch_transactions(api: &dyn BackendApi, query: &TransactionQuery) -> Result<Vec<Transaction>> {
    let records = api.transactions(query).await?;

    let mut txns = Vec::with_capacity(records.len());
    for rec in records {
        match normalize_transaction(rec) {
            Ok(t) => txns.push(t),
            Err(e) => warn!(error = %format!("{e:#}"), "skipping malformed transaction record"),
        }
    }
    // Newest first, the order every listing wants
    txns.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    Ok(txns)
}
