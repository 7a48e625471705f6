//! CSV export of loaded transactions.

use anyhow::{Context, Result};
use ledgerlink_core::{Account, Flow, SignConvention, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    date: String,
    account: &'a str,
    name: &'a str,
    merchant: &'a str,
    category: String,
    /// Inflow-positive
    amount: Decimal,
    flow: &'static str,
    currency: &'a str,
    pending: bool,
    transaction_id: &'a str,
}

pub fn write_transactions<W: Write>(
    out: W,
    transactions: &[Transaction],
    accounts: &[Account],
    convention: SignConvention,
) -> Result<usize> {
    let names: HashMap<&str, &str> = accounts.iter().map(|a| (a.id.as_str(), a.name.as_str())).collect();
    let mut w = csv::Writer::from_writer(out);

    for t in transactions {
        let flow = match t.flow(convention) {
            Flow::Inflow => "inflow",
            Flow::Outflow => "outflow",
            Flow::Zero => "zero",
        };
        w.serialize(TransactionRow {
            date: t.date.format("%Y-%m-%d").to_string(),
            account: names.get(t.account_id.as_str()).copied().unwrap_or(t.account_id.as_str()),
            name: &t.name,
            merchant: t.merchant_name.as_deref().unwrap_or(""),
            category: t.category.label(),
            amount: t.net_amount(convention),
            flow,
            currency: t.currency.as_deref().unwrap_or(""),
            pending: t.pending,
            transaction_id: &t.id,
        })
        .with_context(|| format!("write transaction {}", t.id))?;
    }
    w.flush().context("flush csv")?;
    Ok(transactions.len())
}

pub fn export_transactions(
    path: &Path,
    transactions: &[Transaction],
    accounts: &[Account],
    convention: SignConvention,
) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_transactions(file, transactions, accounts, convention)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgerlink_core::Category;

    fn txn(id: &str, cents: i64, merchant: Option<&str>) -> Transaction {
        Transaction {
            id: id.into(),
            account_id: "a1".into(),
            amount: Decimal::new(cents, 2),
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            name: "Grocer, Inc".into(),
            merchant_name: merchant.map(String::from),
            category: Category::new(vec!["Shops".into(), "Supermarkets".into()]),
            pending: false,
            currency: Some("USD".into()),
        }
    }

    #[test]
    fn test_write_transactions() {
        let mut buf = Vec::new();
        let n = write_transactions(
            &mut buf,
            &[txn("t1", 4210, Some("Grocer")), txn("t2", -500, None)],
            &[],
            SignConvention::PositiveOutflow,
        )
        .unwrap();
        assert_eq!(n, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "date,account,name,merchant,category,amount,flow,currency,pending,transaction_id"
        );
        assert_eq!(
            lines[1],
            "2026-01-15,a1,\"Grocer, Inc\",Grocer,Shops > Supermarkets,-42.10,outflow,USD,false,t1"
        );
        assert_eq!(
            lines[2],
            "2026-01-15,a1,\"Grocer, Inc\",,Shops > Supermarkets,5.00,inflow,USD,false,t2"
        );
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_transactions(&path, &[txn("t1", 100, None)], &[], SignConvention::PositiveInflow).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
