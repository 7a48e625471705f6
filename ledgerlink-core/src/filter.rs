//! Ownership filters: narrow backend-wide lists down to one user's items.

use std::collections::HashSet;

use crate::account::Account;
use crate::item::Item;
use crate::transaction::Transaction;

/// Accounts whose `item_id` belongs to one of `items`, in input order.
pub fn accounts_for_items(accounts: &[Account], items: &[Item]) -> Vec<Account> {
    let owned: HashSet<&str> = items.iter().map(|i| i.item_id.as_str()).collect();
    accounts
        .iter()
        .filter(|a| owned.contains(a.item_id.as_str()))
        .cloned()
        .collect()
}

/// Transactions posted to one of `accounts`, in input order.
pub fn transactions_for_accounts(transactions: &[Transaction], accounts: &[Account]) -> Vec<Transaction> {
    let owned: HashSet<&str> = accounts.iter().map(|a| a.id.as_str()).collect();
    transactions
        .iter()
        .filter(|t| owned.contains(t.account_id.as_str()))
        .cloned()
        .collect()
}
