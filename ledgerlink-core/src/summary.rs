//! Spending summary: the totals the dashboard charts are drawn from.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::account::{Account, AccountType};
use crate::transaction::{Flow, SignConvention, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    /// Outflow total as a positive number
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeTotal {
    pub kind: AccountType,
    pub total: Decimal,
    pub accounts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpendingSummary {
    pub inflow: Decimal,
    pub outflow: Decimal,
    /// inflow - outflow
    pub net: Decimal,
    /// Outflows grouped by primary category, largest first
    pub by_category: Vec<CategoryTotal>,
    pub balances_by_type: Vec<TypeTotal>,
    /// Assets minus liabilities, over accounts that report a balance
    pub net_worth: Decimal,
    pub pending_count: usize,
}

impl SpendingSummary {
    pub fn build(accounts: &[Account], transactions: &[Transaction], convention: SignConvention) -> Self {
        let mut inflow = Decimal::ZERO;
        let mut outflow = Decimal::ZERO;
        let mut pending_count = 0;
        let mut groups: HashMap<&str, (Decimal, usize)> = HashMap::new();

        for t in transactions {
            if t.pending {
                pending_count += 1;
            }
            let amount = t.net_amount(convention);
            match t.flow(convention) {
                Flow::Inflow => inflow += amount,
                Flow::Outflow => {
                    outflow += -amount;
                    let entry = groups.entry(t.category.primary_label()).or_default();
                    entry.0 += -amount;
                    entry.1 += 1;
                }
                Flow::Zero => {}
            }
        }

        let mut by_category: Vec<CategoryTotal> = groups
            .into_iter()
            .map(|(category, (total, count))| CategoryTotal {
                category: category.to_string(),
                total,
                count,
            })
            .collect();
        // Largest first; name breaks ties so output is stable
        by_category.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

        let mut types: HashMap<AccountType, (Decimal, usize)> = HashMap::new();
        let mut net_worth = Decimal::ZERO;
        for a in accounts {
            let Some(balance) = a.display_balance() else {
                continue;
            };
            let entry = types.entry(a.kind).or_default();
            entry.0 += balance;
            entry.1 += 1;
            if a.kind.is_liability() {
                net_worth -= balance;
            } else {
                net_worth += balance;
            }
        }
        let mut balances_by_type: Vec<TypeTotal> = types
            .into_iter()
            .map(|(kind, (total, accounts))| TypeTotal { kind, total, accounts })
            .collect();
        balances_by_type.sort_by_key(|t| t.kind);

        Self {
            inflow,
            outflow,
            net: inflow - outflow,
            by_category,
            balances_by_type,
            net_worth,
            pending_count,
        }
    }
}
