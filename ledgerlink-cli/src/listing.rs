//! One-shot commands: load a snapshot, print it, exit.

use anyhow::{Context, Result, bail};
use ledgerlink_client::{BackendApi, DataLoader, LoadOutcome};
use ledgerlink_core::{Snapshot, SpendingSummary};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::export::export_transactions;
use crate::render;

async fn load_snapshot(
    api: Arc<dyn BackendApi>,
    cfg: &Config,
    days: Option<u32>,
    cancel: &CancellationToken,
) -> Result<Snapshot> {
    let user_id = cfg.require_user()?;
    let loader = DataLoader::new(api, cfg.loader_config(user_id, days)?);

    match loader.load_initial(cancel).await {
        LoadOutcome::Loaded { attempts } => {
            info!(attempts, "loaded");
            Ok(loader.snapshot())
        }
        LoadOutcome::GaveUp { attempts, reason } => {
            bail!("backend still unavailable after {attempts} attempts: {reason}")
        }
        LoadOutcome::Cancelled => bail!("interrupted"),
    }
}

pub async fn run_accounts(
    api: Arc<dyn BackendApi>,
    cfg: &Config,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    // Accounts don't depend on the window; skip the date math
    let snap = load_snapshot(api, cfg, Some(0), cancel).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(snap.accounts.as_slice()).context("serialize accounts")?);
        return Ok(());
    }
    if snap.accounts.is_empty() {
        println!("No linked accounts. Run: ledgerlink link");
        return Ok(());
    }
    println!("{}", render::accounts_table(&snap.accounts));
    Ok(())
}

pub struct TransactionsArgs {
    pub account: Option<String>,
    pub days: Option<u32>,
    pub limit: Option<usize>,
    pub csv: Option<PathBuf>,
    pub json: bool,
}

pub async fn run_transactions(
    api: Arc<dyn BackendApi>,
    cfg: &Config,
    args: TransactionsArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let snap = load_snapshot(api, cfg, args.days, cancel).await?;

    let mut txns: Vec<_> = match &args.account {
        Some(id) => {
            if snap.account(id).is_none() {
                bail!("unknown account '{id}' (see: ledgerlink accounts)");
            }
            snap.transactions.iter().filter(|t| &t.account_id == id).cloned().collect()
        }
        None => snap.transactions.to_vec(),
    };
    if let Some(limit) = args.limit {
        txns.truncate(limit);
    }

    let convention = cfg.display.sign_convention;
    if let Some(path) = &args.csv {
        let n = export_transactions(path, &txns, &snap.accounts, convention)?;
        println!("Wrote {n} transactions to {}", path.display());
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&txns).context("serialize transactions")?);
        return Ok(());
    }
    if txns.is_empty() {
        println!("No transactions in this window.");
        return Ok(());
    }
    println!("{}", render::transactions_table(&txns, &snap.accounts, convention));
    Ok(())
}

pub async fn run_summary(
    api: Arc<dyn BackendApi>,
    cfg: &Config,
    days: Option<u32>,
    cancel: &CancellationToken,
) -> Result<()> {
    let snap = load_snapshot(api, cfg, days, cancel).await?;
    let summary = SpendingSummary::build(&snap.accounts, &snap.transactions, cfg.display.sign_convention);

    match days.unwrap_or(cfg.display.days) {
        0 => println!("# All transactions\n"),
        n => println!("# Last {n} days\n"),
    }
    println!("{}", render::summary_text(&summary));
    Ok(())
}
