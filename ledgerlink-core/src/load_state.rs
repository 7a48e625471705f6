//! Load state machine and the snapshot published to presentation code.
//!
//! Transitions:
//!
//! ```text
//! Idle | Succeeded | Failed --start--> Loading{1}
//! BackoffWaiting{n}        --start--> Loading{n+1}
//! Loading{n} --succeed--> Succeeded
//! Loading{n} --fail-----> BackoffWaiting{n}   (policy allows another try)
//!                       \-> Failed            (policy exhausted, or permanent error
//!                                              under a bounded policy)
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::account::Account;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::transaction::Transaction;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading { attempt: u32 },
    BackoffWaiting { attempt: u32, delay: Duration, reason: String },
    Succeeded,
    Failed { attempts: u32, reason: String },
}

impl LoadPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadPhase::Loading { .. } | LoadPhase::BackoffWaiting { .. })
    }

    /// One-line status for display.
    pub fn describe(&self) -> String {
        match self {
            LoadPhase::Idle => "idle".to_string(),
            LoadPhase::Loading { attempt: 1 } => "loading".to_string(),
            LoadPhase::Loading { attempt } => format!("loading (attempt {attempt})"),
            LoadPhase::BackoffWaiting { delay, .. } => {
                format!("backend unavailable, retrying in {}s", delay.as_secs())
            }
            LoadPhase::Succeeded => "up to date".to_string(),
            LoadPhase::Failed { attempts, reason } => {
                format!("gave up after {attempts} attempts: {reason}")
            }
        }
    }
}

/// Drives [`LoadPhase`] for one `load_initial` run.
#[derive(Debug, Clone)]
pub struct LoadMachine {
    policy: RetryPolicy,
    phase: LoadPhase,
}

impl LoadMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            phase: LoadPhase::Idle,
        }
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    /// Begin the next attempt and return its 1-based number. Calling this
    /// while already loading keeps the current attempt.
    pub fn start_attempt(&mut self) -> u32 {
        let attempt = match &self.phase {
            LoadPhase::Loading { attempt } => *attempt,
            LoadPhase::BackoffWaiting { attempt, .. } => attempt + 1,
            LoadPhase::Idle | LoadPhase::Succeeded | LoadPhase::Failed { .. } => 1,
        };
        self.phase = LoadPhase::Loading { attempt };
        attempt
    }

    pub fn succeed(&mut self) {
        self.phase = LoadPhase::Succeeded;
    }

    /// Record a failed round. `transient` errors follow the policy; permanent
    /// ones end a bounded policy immediately.
    pub fn fail(&mut self, reason: impl Into<String>, transient: bool) -> &LoadPhase {
        let reason = reason.into();
        let attempt = match &self.phase {
            LoadPhase::Loading { attempt } => *attempt,
            _ => 1,
        };

        let decision = if transient || !self.policy.is_bounded() {
            self.policy.decide(attempt)
        } else {
            RetryDecision::GiveUp
        };

        self.phase = match decision {
            RetryDecision::RetryAfter(delay) => LoadPhase::BackoffWaiting { attempt, delay, reason },
            RetryDecision::GiveUp => LoadPhase::Failed {
                attempts: attempt,
                reason,
            },
        };
        &self.phase
    }
}

/// Everything presentation code reads. Replaced wholesale on every commit,
/// so readers never see accounts from one round next to transactions from
/// another.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub accounts: Arc<Vec<Account>>,
    pub transactions: Arc<Vec<Transaction>>,
    pub phase: LoadPhase,
    /// User-visible error from the last one-shot operation
    pub error: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
    /// Bumped on every commit of new data
    pub generation: u64,
}

impl Snapshot {
    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    /// At least one accounts + transactions round has been committed.
    pub fn has_loaded(&self) -> bool {
        self.generation > 0
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }
}
