#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ledgerlink_client::{BackendApi, ClientError, ExchangeAck, Health, Result, TransactionQuery};
use ledgerlink_core::{AccountRecord, Item, LinkToken, PublicToken, RawCategory, TransactionRecord};
use rust_decimal::Decimal;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Unavailable,
    Timeout,
    BadPayload,
    Unauthorized,
}

impl Fail {
    fn err(self, what: &str) -> ClientError {
        match self {
            Fail::Unavailable => ClientError::Backend {
                status: 503,
                body: "starting up".into(),
            },
            Fail::Timeout => ClientError::Timeout(format!("{what} timed out")),
            Fail::BadPayload => ClientError::parse(what, "expected a sequence"),
            Fail::Unauthorized => ClientError::Backend {
                status: 401,
                body: "unauthorized".into(),
            },
        }
    }
}

struct FakeState {
    items: std::result::Result<Vec<Item>, Fail>,
    accounts: std::result::Result<Vec<AccountRecord>, Fail>,
    transactions: std::result::Result<Vec<TransactionRecord>, Fail>,
    link_token: std::result::Result<String, Fail>,
    exchange: std::result::Result<ExchangeAck, Fail>,
    delay: Option<Duration>,
    calls: HashMap<&'static str, usize>,
    last_query: Option<TransactionQuery>,
    exchanged: Vec<String>,
    issued_tokens: usize,
}

/// Scriptable backend. Starts healthy with user "u1" owning item I1 (account
/// a1) while item I2 (account a2) belongs to someone else.
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                items: Ok(vec![Item::new("I1")]),
                accounts: Ok(vec![account("a1", "I1", 1000), account("a2", "I2", 250)]),
                transactions: Ok(vec![
                    transaction("t1", "a1", -1250, "2026-02-03", "Food and Drink"),
                    transaction("t2", "a2", -999, "2026-02-02", "Shops"),
                    transaction("t3", "a1", 250000, "2026-02-01", "Transfer"),
                ]),
                link_token: Ok("link-sandbox-0001".into()),
                exchange: Ok(ExchangeAck {
                    success: Some(true),
                    item_id: Some("I3".into()),
                    ..Default::default()
                }),
                delay: None,
                calls: HashMap::new(),
                last_query: None,
                exchanged: Vec::new(),
                issued_tokens: 0,
            }),
        }
    }

    pub fn failing() -> Self {
        let fake = Self::new();
        fake.fail_accounts(Fail::Unavailable);
        fake.fail_transactions(Fail::Unavailable);
        fake
    }

    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut s = self.state.lock().unwrap();
        f(&mut s)
    }

    pub fn set_accounts(&self, accounts: Vec<AccountRecord>) {
        self.with(|s| s.accounts = Ok(accounts));
    }

    pub fn set_transactions(&self, txns: Vec<TransactionRecord>) {
        self.with(|s| s.transactions = Ok(txns));
    }

    pub fn fail_accounts(&self, fail: Fail) {
        self.with(|s| s.accounts = Err(fail));
    }

    pub fn fail_transactions(&self, fail: Fail) {
        self.with(|s| s.transactions = Err(fail));
    }

    pub fn fail_link_token(&self, fail: Fail) {
        self.with(|s| s.link_token = Err(fail));
    }

    pub fn fail_exchange(&self, fail: Fail) {
        self.with(|s| s.exchange = Err(fail));
    }

    pub fn set_exchange_ack(&self, ack: ExchangeAck) {
        self.with(|s| s.exchange = Ok(ack));
    }

    pub fn set_delay(&self, delay: Duration) {
        self.with(|s| s.delay = Some(delay));
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.with(|s| s.calls.get(endpoint).copied().unwrap_or(0))
    }

    pub fn total_calls(&self) -> usize {
        self.with(|s| s.calls.values().sum())
    }

    pub fn last_query(&self) -> Option<TransactionQuery> {
        self.with(|s| s.last_query.clone())
    }

    pub fn exchanged(&self) -> Vec<String> {
        self.with(|s| s.exchanged.clone())
    }

    async fn enter(&self, endpoint: &'static str) {
        let delay = self.with(|s| {
            *s.calls.entry(endpoint).or_insert(0) += 1;
            s.delay
        });
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn health(&self) -> Result<Health> {
        self.enter("health").await;
        Ok(Health {
            status: 200,
            latency: Duration::ZERO,
            body: "ok".into(),
        })
    }

    async fn accounts(&self) -> Result<Vec<AccountRecord>> {
        self.enter("accounts").await;
        self.with(|s| s.accounts.clone().map_err(|f| f.err("accounts")))
    }

    async fn items(&self, _user_id: &str) -> Result<Vec<Item>> {
        self.enter("items").await;
        self.with(|s| s.items.clone().map_err(|f| f.err("items")))
    }

    async fn transactions(&self, query: &TransactionQuery) -> Result<Vec<TransactionRecord>> {
        self.enter("transactions").await;
        self.with(|s| {
            s.last_query = Some(query.clone());
            s.transactions.clone().map_err(|f| f.err("transactions"))
        })
    }

    async fn create_link_token(&self, _user_id: &str) -> Result<LinkToken> {
        self.enter("create_link_token").await;
        self.with(|s| {
            s.issued_tokens += 1;
            let n = s.issued_tokens;
            s.link_token
                .clone()
                .map(|t| LinkToken::new(format!("{t}-{n}")))
                .map_err(|f| f.err("link token"))
        })
    }

    async fn exchange_public_token(&self, token: &PublicToken) -> Result<ExchangeAck> {
        self.enter("exchange_public_token").await;
        self.with(|s| {
            s.exchanged.push(token.as_str().to_string());
            s.exchange.clone().map_err(|f| f.err("exchange"))
        })
    }
}

pub fn account(id: &str, item_id: &str, current: i64) -> AccountRecord {
    AccountRecord {
        id: Some(id.into()),
        item_id: Some(item_id.into()),
        name: Some(format!("Account {id}")),
        kind: Some("depository".into()),
        subtype: Some("checking".into()),
        current_balance: Some(Decimal::from(current)),
        ..Default::default()
    }
}

pub fn transaction(id: &str, account_id: &str, cents: i64, date: &str, category: &str) -> TransactionRecord {
    TransactionRecord {
        transaction_id: Some(id.into()),
        account_id: Some(account_id.into()),
        amount: Some(Decimal::new(cents, 2)),
        date: Some(date.into()),
        name: Some(format!("Txn {id}")),
        category: Some(RawCategory::Single(category.into())),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Throwaway HTTP responder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Route {
    pub fn new(method: &'static str, path: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self {
            method,
            path,
            status,
            body: body.into(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub body: String,
}

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serve `routes` on an ephemeral port; unknown paths get a 404.
pub async fn stub_server(routes: Vec<Route>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            let routes = routes.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let Some(req) = read_request(&mut sock).await else {
                    return;
                };
                let path = req.target.split('?').next().unwrap_or("").to_string();
                let route = routes
                    .iter()
                    .find(|r| r.method == req.method && r.path == path)
                    .cloned();
                recorded.lock().unwrap().push(req);

                let (status, body) = match route {
                    Some(r) => {
                        if let Some(d) = r.delay {
                            tokio::time::sleep(d).await;
                        }
                        (r.status, r.body)
                    }
                    None => (404, r#"{"error":"not found"}"#.to_string()),
                };
                let resp = format!(
                    "HTTP/1.1 {status} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    reason(status),
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });

    StubServer {
        base_url: format!("http://{addr}"),
        requests,
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

async fn read_request(sock: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = sock.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = sock.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = (header_end + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[header_end..end]).to_string();

    let mut first = head.lines().next()?.split_whitespace();
    let method = first.next()?.to_string();
    let target = first.next()?.to_string();
    Some(Recorded { method, target, body })
}
