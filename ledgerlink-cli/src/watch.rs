//! `ledgerlink watch`: initial load with retry, then periodic transaction
//! refreshes until interrupted.

use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use ledgerlink_client::{BackendApi, DataLoader, LoadOutcome, LoaderConfig};
use ledgerlink_core::Snapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::render::status_line;

/// Print a status line whenever it changes.
async fn follow(mut rx: watch::Receiver<Snapshot>, tz: Tz) {
    let mut last = String::new();
    loop {
        let line = status_line(&rx.borrow_and_update(), tz);
        if line != last {
            println!("{line}");
            last = line;
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}

pub async fn run_watch(
    api: Arc<dyn BackendApi>,
    loader_cfg: LoaderConfig,
    tz: Tz,
    every: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    let loader = Arc::new(DataLoader::new(api, loader_cfg));
    let printer = tokio::spawn(follow(loader.subscribe(), tz));

    let handle = loader.spawn();
    let outcome = tokio::select! {
        _ = cancel.cancelled() => LoadOutcome::Cancelled,
        o = handle.join() => o,
    };

    let result = match outcome {
        LoadOutcome::Loaded { attempts } => {
            info!(attempts, every_secs = every.as_secs(), "watching for new transactions");
            let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately; the initial load already covered it
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = loader.refetch().await {
                            warn!(error = %e, "refresh failed; keeping last transactions");
                        }
                    }
                }
            }
            Ok(())
        }
        LoadOutcome::GaveUp { attempts, reason } => Err(anyhow!(
            "backend still unavailable after {attempts} attempts: {reason}"
        )),
        LoadOutcome::Cancelled => Ok(()),
    };

    // Let the printer flush the final state before it is torn down
    tokio::task::yield_now().await;
    printer.abort();
    info!("stopped");
    result
}
