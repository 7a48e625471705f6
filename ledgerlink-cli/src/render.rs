//! Plain-text tables for terminal output.

use chrono_tz::Tz;
use ledgerlink_core::{Account, SignConvention, Snapshot, SpendingSummary, Transaction};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn money(amount: Decimal, currency: Option<&str>) -> String {
    let rounded = amount.round_dp(2);
    match currency {
        Some(c) => format!("{rounded:.2} {c}"),
        None => format!("{rounded:.2}"),
    }
}

/// Pad or cut `s` to exactly `width` characters.
fn fit(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count <= width {
        return format!("{s:<width$}");
    }
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn accounts_table(accounts: &[Account]) -> String {
    let mut lines = vec![format!(
        "{} {} {:>6} {:>18}",
        fit("ACCOUNT", 28),
        fit("TYPE", 22),
        "MASK",
        "BALANCE"
    )];
    for a in accounts {
        let kind = match &a.subtype {
            Some(sub) => format!("{}/{}", a.kind.label(), sub),
            None => a.kind.label().to_string(),
        };
        let balance = a
            .display_balance()
            .map(|b| money(b, a.balance.currency.as_deref()))
            .unwrap_or_else(|| "n/a".to_string());
        lines.push(format!(
            "{} {} {:>6} {:>18}",
            fit(&a.name, 28),
            fit(&kind, 22),
            a.mask.as_deref().unwrap_or("-"),
            balance
        ));
    }
    lines.join("\n")
}

/// Amounts are shown inflow-positive regardless of the backend's convention.
pub fn transactions_table(transactions: &[Transaction], accounts: &[Account], convention: SignConvention) -> String {
    let names: HashMap<&str, &str> = accounts.iter().map(|a| (a.id.as_str(), a.name.as_str())).collect();

    let mut lines = vec![format!(
        "{:<10} {:>12}  {} {} {}",
        "DATE",
        "AMOUNT",
        fit("DESCRIPTION", 30),
        fit("CATEGORY", 26),
        "ACCOUNT"
    )];
    for t in transactions {
        let mut description = t.name.clone();
        if t.pending {
            description.push_str(" (pending)");
        }
        lines.push(format!(
            "{:<10} {:>12}  {} {} {}",
            t.date.format("%Y-%m-%d").to_string(),
            money(t.net_amount(convention), None),
            fit(&description, 30),
            fit(&t.category.label(), 26),
            names.get(t.account_id.as_str()).copied().unwrap_or(t.account_id.as_str())
        ));
    }
    lines.join("\n")
}

pub fn summary_text(summary: &SpendingSummary) -> String {
    let mut lines = vec![
        format!("Inflow     {:>14}", money(summary.inflow, None)),
        format!("Outflow    {:>14}", money(summary.outflow, None)),
        format!("Net        {:>14}", money(summary.net, None)),
    ];
    if summary.pending_count > 0 {
        lines.push(format!("({} pending)", summary.pending_count));
    }

    if !summary.by_category.is_empty() {
        lines.push(String::new());
        lines.push("Spending by category".to_string());
        for c in &summary.by_category {
            lines.push(format!("  {} {:>14}  x{}", fit(&c.category, 28), money(c.total, None), c.count));
        }
    }

    if !summary.balances_by_type.is_empty() {
        lines.push(String::new());
        lines.push("Balances by account type".to_string());
        for t in &summary.balances_by_type {
            lines.push(format!(
                "  {} {:>14}  ({} accounts)",
                fit(t.kind.label(), 28),
                money(t.total, None),
                t.accounts
            ));
        }
        lines.push(format!("  {} {:>14}", fit("net worth", 28), money(summary.net_worth, None)));
    }
    lines.join("\n")
}

/// One line describing where the loader is, for `watch`.
pub fn status_line(snapshot: &Snapshot, tz: Tz) -> String {
    let updated = snapshot
        .loaded_at
        .map(|t| t.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z").to_string())
        .unwrap_or_else(|| "never".to_string());
    let mut line = format!(
        "{} | {} accounts, {} transactions | updated {}",
        snapshot.phase.describe(),
        snapshot.accounts.len(),
        snapshot.transactions.len(),
        updated
    );
    if let Some(err) = &snapshot.error {
        line.push_str(" | ");
        line.push_str(err);
    }
    line
}
