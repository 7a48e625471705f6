//! ledgerlink-core: domain types and pure logic for the ledgerlink client

pub mod account;
pub mod filter;
pub mod item;
pub mod link;
pub mod load_state;
pub mod normalize;
pub mod retry;
pub mod summary;
pub mod time;
pub mod transaction;
pub mod wire;

pub use account::{Account, AccountType, Balance, BalancePreference, BalanceReading};
pub use filter::{accounts_for_items, transactions_for_accounts};
pub use item::Item;
pub use link::{LinkToken, LinkTokenResponse, PublicToken};
pub use load_state::{LoadMachine, LoadPhase, Snapshot};
pub use normalize::{NormalizeOptions, normalize_account, normalize_category, normalize_transaction};
pub use retry::{RetryDecision, RetryPolicy};
pub use summary::{CategoryTotal, SpendingSummary, TypeTotal};
pub use time::{DateWindow, parse_provider_date};
pub use transaction::{Category, Flow, SignConvention, Transaction};
pub use wire::{AccountRecord, RawBalances, RawCategory, TransactionRecord};
