//! Data loader: the initial accounts + transactions snapshot, retried until
//! the backend answers, and a one-shot transactions refetch.
//!
//! The loader is the only writer of its [`Snapshot`]. Readers subscribe to a
//! `watch` channel and always see a whole snapshot: accounts and
//! transactions from the same successful round, never a mix.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ledgerlink_core::{
    Account, DateWindow, LoadMachine, LoadPhase, NormalizeOptions, RetryPolicy, Snapshot, Transaction,
    transactions_for_accounts,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{BackendApi, TransactionQuery};
use crate::error::{ClientError, Result};
use crate::fetch::{fetch_transactions, fetch_user_accounts};

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub user_id: String,
    pub policy: RetryPolicy,
    pub normalize: NormalizeOptions,
    /// Restrict transaction fetches to this window
    pub window: Option<DateWindow>,
    pub transaction_count: Option<u32>,
}

impl LoaderConfig {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            policy: RetryPolicy::default(),
            normalize: NormalizeOptions::default(),
            window: None,
            transaction_count: None,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// How a `load_initial` run ended
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded { attempts: u32 },
    GaveUp { attempts: u32, reason: String },
    Cancelled,
}

pub struct DataLoader {
    api: Arc<dyn BackendApi>,
    config: LoaderConfig,
    state: watch::Sender<Snapshot>,
}

impl DataLoader {
    pub fn new(api: Arc<dyn BackendApi>, config: LoaderConfig) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        Self { api, config, state }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Fetch accounts and transactions together until both succeed in the
    /// same round, the policy gives up, or `cancel` fires.
    ///
    /// Never returns an error: failures are logged and become retries or a
    /// [`LoadOutcome::GaveUp`]. Once `cancel` fires no further request is
    /// issued and the snapshot is left as it was.
    #[instrument(skip_all, fields(user_id = %self.config.user_id))]
    pub async fn load_initial(&self, cancel: &CancellationToken) -> LoadOutcome {
        let mut machine = LoadMachine::new(self.config.policy.clone());

        loop {
            if cancel.is_cancelled() {
                return LoadOutcome::Cancelled;
            }

            let attempt = machine.start_attempt();
            self.publish_phase(machine.phase());
            debug!(attempt, "fetching accounts and transactions");

            let round = tokio::select! {
                biased;
                _ = cancel.cancelled() => return LoadOutcome::Cancelled,
                r = self.fetch_round() => r,
            };

            let err = match round {
                Ok((accounts, transactions)) => {
                    machine.succeed();
                    self.commit(accounts, transactions);
                    return LoadOutcome::Loaded { attempts: attempt };
                }
                Err(err) => err,
            };

            match machine.fail(err.to_string(), err.is_transient()).clone() {
                LoadPhase::BackoffWaiting { delay, .. } => {
                    if err.is_timeout() {
                        warn!(attempt, ?delay, error = %err, "backend slow, retrying");
                    } else {
                        warn!(attempt, ?delay, error = %err, "backend unavailable, retrying");
                    }
                    self.publish_phase(machine.phase());

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return LoadOutcome::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                LoadPhase::Failed { attempts, reason } => {
                    error!(attempts, %reason, "giving up on initial load");
                    self.publish_phase(machine.phase());
                    return LoadOutcome::GaveUp { attempts, reason };
                }
                _ => {}
            }
        }
    }

    /// Run [`load_initial`](Self::load_initial) in the background. Dropping
    /// the handle tears the run down.
    pub fn spawn(self: &Arc<Self>) -> LoaderHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let loader = Arc::clone(self);
        let task = tokio::spawn(async move { loader.load_initial(&token).await });
        LoaderHandle {
            cancel,
            task: Some(task),
        }
    }

    /// Re-fetch transactions once, with no retry. On failure the error is
    /// both returned and recorded in the snapshot; accounts and previously
    /// loaded transactions are left untouched.
    ///
    /// Transactions are scoped to the committed accounts, so before the
    /// first successful load this fails with [`ClientError::NotLoaded`]
    /// without issuing a request.
    #[instrument(skip_all, fields(user_id = %self.config.user_id))]
    pub async fn refetch(&self) -> Result<usize> {
        let loaded = self.state.borrow().has_loaded();
        let result = if loaded {
            let query = self.transaction_query();
            self.with_attempt_timeout(fetch_transactions(self.api.as_ref(), &query))
                .await
        } else {
            Err(ClientError::NotLoaded)
        };

        match result {
            Ok(transactions) => {
                let mut count = 0;
                self.state.send_modify(|s| {
                    let owned = transactions_for_accounts(&transactions, &s.accounts);
                    count = owned.len();
                    s.transactions = Arc::new(owned);
                    s.error = None;
                    s.loaded_at = Some(Utc::now());
                    s.generation += 1;
                });
                info!(transactions = count, "transactions refreshed");
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "transaction refetch failed");
                let message = format!("Could not refresh transactions: {err}");
                self.state.send_modify(|s| s.error = Some(message));
                Err(err)
            }
        }
    }

    /// Query used for every transactions fetch.
    pub fn transaction_query(&self) -> TransactionQuery {
        let mut q = TransactionQuery::for_user(&self.config.user_id);
        if let Some(window) = self.config.window {
            q = q.with_window(window);
        }
        if let Some(count) = self.config.transaction_count {
            q = q.with_count(count);
        }
        q
    }

    async fn fetch_round(&self) -> Result<(Vec<Account>, Vec<Transaction>)> {
        let api = self.api.as_ref();
        let query = self.transaction_query();
        let round = async {
            tokio::try_join!(
                fetch_user_accounts(api, &self.config.user_id, &self.config.normalize),
                fetch_transactions(api, &query),
            )
        };
        self.with_attempt_timeout(round).await
    }

    async fn with_attempt_timeout<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.config.policy.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ClientError::Timeout(format!("no answer within {}", fmt_secs(limit))))?,
            None => fut.await,
        }
    }

    fn commit(&self, accounts: Vec<Account>, transactions: Vec<Transaction>) {
        let transactions = transactions_for_accounts(&transactions, &accounts);
        info!(
            accounts = accounts.len(),
            transactions = transactions.len(),
            "snapshot committed"
        );
        self.state.send_modify(|s| {
            s.accounts = Arc::new(accounts);
            s.transactions = Arc::new(transactions);
            s.phase = LoadPhase::Succeeded;
            s.error = None;
            s.loaded_at = Some(Utc::now());
            s.generation += 1;
        });
    }

    fn publish_phase(&self, phase: &LoadPhase) {
        let phase = phase.clone();
        self.state.send_modify(|s| s.phase = phase);
    }
}

fn fmt_secs(d: Duration) -> String {
    format!("{:.1}s", d.as_secs_f64())
}

/// Owns a background `load_initial` run.
pub struct LoaderHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<LoadOutcome>>,
}

impl LoaderHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    pub async fn join(mut self) -> LoadOutcome {
        match self.task.take() {
            Some(task) => match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = %e, "loader task failed");
                    LoadOutcome::Cancelled
                }
            },
            None => LoadOutcome::Cancelled,
        }
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
