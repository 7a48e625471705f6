//! Bank-link flow: link token -> hosted UI -> public token -> exchange -> reload.
//!
//! The hosted UI's success and the backend's exchange are two separate steps
//! that fail independently. A flow only reports [`LinkReport::Linked`] once
//! the backend has acknowledged the exchange.

use std::sync::Arc;

use async_trait::async_trait;
use ledgerlink_core::{LinkToken, PublicToken};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::api::{BackendApi, ExchangeAck};
use crate::error::{ClientError, Result};
use crate::loader::{DataLoader, LoadOutcome};

/// What the hosted linking UI reported
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutcome {
    Success {
        public_token: PublicToken,
        institution: Option<String>,
    },
    Exited {
        reason: Option<String>,
    },
}

/// Opens the hosted linking UI for one link token.
///
/// Implementations differ per environment (interactive terminal, scripted
/// runs); the flow picks one at construction and never branches on it.
#[async_trait]
pub trait LinkLauncher: Send + Sync {
    async fn launch(&self, token: &LinkToken) -> Result<LinkOutcome>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkReport {
    Linked {
        ack: ExchangeAck,
        institution: Option<String>,
        /// `None` when no loader was attached to the flow
        reload: Option<LoadOutcome>,
    },
    Abandoned {
        reason: Option<String>,
    },
}

pub struct LinkFlow {
    api: Arc<dyn BackendApi>,
    launcher: Arc<dyn LinkLauncher>,
    user_id: String,
    loader: Option<Arc<DataLoader>>,
}

impl LinkFlow {
    pub fn new(api: Arc<dyn BackendApi>, launcher: Arc<dyn LinkLauncher>, user_id: impl Into<String>) -> Self {
        Self {
            api,
            launcher,
            user_id: user_id.into(),
            loader: None,
        }
    }

    /// Re-run this loader after a successful exchange.
    pub fn with_loader(mut self, loader: Arc<DataLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// A fresh token for every attempt; callers must not keep it around.
    pub async fn get_link_token(&self) -> Result<LinkToken> {
        self.api.create_link_token(&self.user_id).await
    }

    /// Any failure here, transport or an explicit backend refusal, is an
    /// [`ClientError::Exchange`]: the link must not be treated as established.
    pub async fn exchange_public_token(&self, token: &PublicToken) -> Result<ExchangeAck> {
        if token.is_empty() {
            return Err(ClientError::Exchange {
                reason: "empty public token".to_string(),
            });
        }
        let ack = self
            .api
            .exchange_public_token(token)
            .await
            .map_err(|e| ClientError::Exchange { reason: e.to_string() })?;
        if let Some(reason) = ack.rejection() {
            return Err(ClientError::Exchange { reason });
        }
        Ok(ack)
    }

    #[instrument(skip_all, fields(user_id = %self.user_id))]
    pub async fn run(&self, cancel: &CancellationToken) -> Result<LinkReport> {
        let link_token = self.get_link_token().await?;
        info!(token = %link_token.redacted(), "opening link UI");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            o = self.launcher.launch(&link_token) => o?,
        };

        let (public_token, institution) = match outcome {
            LinkOutcome::Success {
                public_token,
                institution,
            } => (public_token, institution),
            LinkOutcome::Exited { reason } => {
                info!(?reason, "link UI exited without linking");
                return Ok(LinkReport::Abandoned { reason });
            }
        };

        self.complete(public_token, institution, cancel).await
    }

    /// Second half of [`run`](Self::run), for a public token obtained
    /// elsewhere: exchange it, then reload. No link token is requested.
    ///
    /// Interrupting the exchange is reported as an [`ClientError::Exchange`]:
    /// the backend may or may not have stored the connection.
    #[instrument(skip_all, fields(user_id = %self.user_id))]
    pub async fn complete(
        &self,
        public_token: PublicToken,
        institution: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<LinkReport> {
        let exchanged = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Exchange {
                reason: "interrupted before the backend acknowledged it".to_string(),
            }),
            r = self.exchange_public_token(&public_token) => r,
        };
        let ack = match exchanged {
            Ok(ack) => ack,
            Err(e) => {
                warn!(
                    error = %e,
                    "public token obtained but the backend did not confirm the connection"
                );
                return Err(e);
            }
        };
        info!(item_id = ?ack.item_id, "public token exchanged");

        let reload = match &self.loader {
            Some(loader) => Some(loader.load_initial(cancel).await),
            None => None,
        };

        Ok(LinkReport::Linked {
            ack,
            institution,
            reload,
        })
    }
}
