//! `reqwest` implementation of [`BackendApi`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ledgerlink_core::{AccountRecord, Item, LinkToken, LinkTokenResponse, PublicToken, TransactionRecord};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::api::{BackendApi, ExchangeAck, Health, TransactionQuery};
use crate::error::{ClientError, Result, truncate_body};

/// Some backend deployments mint link tokens on GET, others on POST.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTokenMethod {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub link_token_method: LinkTokenMethod,
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    link_token_method: LinkTokenMethod,
}

impl HttpBackend {
    pub fn new(cfg: &BackendConfig) -> Result<Self> {
        let base = cfg.base_url.trim().trim_end_matches('/');
        let parsed = reqwest::Url::parse(base)
            .map_err(|e| ClientError::InvalidConfig(format!("backend url '{}': {e}", cfg.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "backend url '{}' must be http or https",
                cfg.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .user_agent(concat!("ledgerlink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::from_reqwest)?;

        Ok(Self {
            client,
            base_url: base.to_string(),
            link_token_method: cfg.link_token_method,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let resp = req.send().await.map_err(ClientError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Backend {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let bytes = resp.bytes().await.map_err(ClientError::from_reqwest)?;
        debug!(what, bytes = bytes.len(), "response received");
        serde_json::from_slice(&bytes).map_err(|e| ClientError::parse(what, e))
    }

    /// A JSON array whose rows are decoded one at a time. The body itself
    /// must be an array; a row that does not fit `T` is dropped with a warning.
    async fn send_rows<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<Vec<T>> {
        let rows: Vec<serde_json::Value> = self.send_json(req, what).await?;
        Ok(decode_rows(rows, what))
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<serde_json::Value>, what: &str) -> Vec<T> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(row, value)| match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(what, row, error = %e, "skipping undecodable row");
                None
            }
        })
        .collect()
}

#[derive(Serialize)]
struct UserBody<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct ExchangeBody<'a> {
    public_token: &'a str,
}

/// Items arrive either as a bare array or wrapped as `{ "items": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsBody {
    Bare(Vec<serde_json::Value>),
    Wrapped { items: Vec<serde_json::Value> },
}

#[async_trait]
impl BackendApi for HttpBackend {
    #[instrument(skip(self))]
    async fn health(&self) -> Result<Health> {
        let started = Instant::now();
        let resp = self
            .request(Method::GET, "/health")
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok(Health {
            status,
            latency: started.elapsed(),
            body: truncate_body(body),
        })
    }

    #[instrument(skip(self))]
    async fn accounts(&self) -> Result<Vec<AccountRecord>> {
        self.send_rows(self.request(Method::GET, "/api/db/accounts"), "accounts")
            .await
    }

    #[instrument(skip(self))]
    async fn items(&self, user_id: &str) -> Result<Vec<Item>> {
        let req = self
            .request(Method::GET, "/api/db/items")
            .query(&[("user_id", user_id)]);
        let body: ItemsBody = self.send_json(req, "items").await?;
        let rows = match body {
            ItemsBody::Bare(rows) | ItemsBody::Wrapped { items: rows } => rows,
        };
        Ok(decode_rows(rows, "items"))
    }

    #[instrument(skip(self))]
    async fn transactions(&self, query: &TransactionQuery) -> Result<Vec<TransactionRecord>> {
        let req = self
            .request(Method::GET, "/api/db/transactions")
            .query(&query.to_pairs());
        self.send_rows(req, "transactions").await
    }

    #[instrument(skip(self))]
    async fn create_link_token(&self, user_id: &str) -> Result<LinkToken> {
        let req = match self.link_token_method {
            LinkTokenMethod::Get => self
                .request(Method::GET, "/api/create_link_token")
                .query(&[("user_id", user_id)]),
            LinkTokenMethod::Post => self
                .request(Method::POST, "/api/create_link_token")
                .json(&UserBody { user_id }),
        };
        let body: LinkTokenResponse = self.send_json(req, "link token").await?;
        if body.link_token.is_empty() {
            return Err(ClientError::parse("link token", "empty link_token"));
        }
        debug!(token = %body.link_token.redacted(), "link token issued");
        Ok(body.link_token)
    }

    #[instrument(skip(self))]
    async fn exchange_public_token(&self, token: &PublicToken) -> Result<ExchangeAck> {
        let req = self
            .request(Method::POST, "/api/exchange_public_token")
            .json(&ExchangeBody {
                public_token: token.as_str(),
            });
        self.send_json(req, "exchange acknowledgement").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(url: &str) -> BackendConfig {
        BackendConfig {
            base_url: url.to_string(),
            request_timeout: Duration::from_secs(5),
            link_token_method: LinkTokenMethod::Get,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let b = HttpBackend::new(&cfg("http://localhost:8000/")).unwrap();
        assert_eq!(b.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            HttpBackend::new(&cfg("localhost:8000")),
            Err(ClientError::InvalidConfig(_))
        ));
        assert!(matches!(
            HttpBackend::new(&cfg("not a url")),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_items_body_shapes() {
        let bare: ItemsBody = serde_json::from_str(r#"[{"item_id":"I1"}]"#).unwrap();
        assert!(matches!(bare, ItemsBody::Bare(ref v) if v.len() == 1));
        let wrapped: ItemsBody = serde_json::from_str(r#"{"items":[{"item_id":"I1"},{"item_id":"I2"}]}"#).unwrap();
        assert!(matches!(wrapped, ItemsBody::Wrapped { ref items } if items.len() == 2));
    }

    #[test]
    fn test_undecodable_rows_are_dropped() {
        let rows: Vec<serde_json::Value> =
            serde_json::from_str(r#"[{"item_id":"I1"},{"item_id":null},{"item_id":7},"junk",{"item_id":"I2"}]"#).unwrap();
        let items: Vec<Item> = decode_rows(rows, "items");
        assert_eq!(items, vec![Item::new("I1"), Item::new("I2")]);
    }
}
