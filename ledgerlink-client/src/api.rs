//! The backend surface the client depends on.
//!
//! Loader and link flow only ever see `dyn BackendApi`; the HTTP
//! implementation lives in [`crate::http`] and tests substitute fakes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerlink_core::{AccountRecord, DateWindow, Item, LinkToken, PublicToken, TransactionRecord};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[async_trait]
pub trait BackendApi: Send + Sync {
    /// `GET /health`
    async fn health(&self) -> Result<Health>;

    /// `GET /api/db/accounts`
    async fn accounts(&self) -> Result<Vec<AccountRecord>>;

    /// `GET /api/db/items?user_id=<id>`
    async fn items(&self, user_id: &str) -> Result<Vec<Item>>;

    /// `GET /api/db/transactions?<query>`
    async fn transactions(&self, query: &TransactionQuery) -> Result<Vec<TransactionRecord>>;

    /// `GET|POST /api/create_link_token`
    async fn create_link_token(&self, user_id: &str) -> Result<LinkToken>;

    /// `POST /api/exchange_public_token`
    async fn exchange_public_token(&self, token: &PublicToken) -> Result<ExchangeAck>;
}

/// Filters for the transactions endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    pub user_id: Option<String>,
    pub account_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub count: Option<u32>,
}

impl TransactionQuery {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.start_date = Some(window.start);
        self.end_date = Some(window.end);
        self
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Query-string pairs, only for the filters that are set.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(u) = &self.user_id {
            pairs.push(("user_id", u.clone()));
        }
        if let Some(a) = &self.account_id {
            pairs.push(("account_id", a.clone()));
        }
        if let Some(d) = self.start_date {
            pairs.push(("start_date", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(d) = self.end_date {
            pairs.push(("end_date", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(c) = self.count {
            pairs.push(("count", c.to_string()));
        }
        pairs
    }
}

/// Result of the liveness probe. Non-2xx answers are still a report, not an error.
#[derive(Debug, Clone)]
pub struct Health {
    pub status: u16,
    pub latency: Duration,
    pub body: String,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Backend acknowledgement of a public-token exchange
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeAck {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExchangeAck {
    /// An explicit `success: false` or an `error` field means the backend
    /// did not store the credential, even though it answered 2xx.
    pub fn rejection(&self) -> Option<String> {
        if let Some(err) = &self.error {
            return Some(err.clone());
        }
        match self.success {
            Some(false) => Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| "backend reported success=false".to_string()),
            ),
            _ => None,
        }
    }
}
