//! ledgerlink-client: backend access, the retrying data loader, and the bank-link flow

pub mod api;
pub mod error;
pub mod fetch;
pub mod http;
pub mod launcher;
pub mod link;
pub mod loader;

pub use api::{BackendApi, ExchangeAck, Health, TransactionQuery};
pub use error::{ClientError, Result};
pub use fetch::{fetch_transactions, fetch_user_accounts};
pub use http::{BackendConfig, HttpBackend, LinkTokenMethod};
pub use launcher::{DEFAULT_LINK_UI_URL, TerminalLauncher};
pub use link::{LinkFlow, LinkLauncher, LinkOutcome, LinkReport};
pub use loader::{DataLoader, LoadOutcome, LoaderConfig, LoaderHandle};
