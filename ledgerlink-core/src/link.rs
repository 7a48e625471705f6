//! Short-lived credentials of a bank-link session.
//!
//! Neither token is persisted. The durable access credential they are
//! exchanged for stays on the backend and has no client-side type at all.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorizes one session in the hosted linking UI
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkToken(String);

/// Returned by the hosted UI on success; good for exactly one exchange
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicToken(String);

macro_rules! secret_token {
    ($ty:ident, $label:literal) => {
        impl $ty {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Safe to log: keeps the environment prefix, drops the secret part.
            pub fn redacted(&self) -> String {
                redact(&self.0)
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $label, self.redacted())
            }
        }
    };
}

secret_token!(LinkToken, "LinkToken");
secret_token!(PublicToken, "PublicToken");

fn redact(raw: &str) -> String {
    // link-sandbox-5f3c... -> link-sandbox-****
    match raw.rfind('-') {
        Some(idx) if idx + 1 < raw.len() => format!("{}-****", &raw[..idx]),
        _ => "****".to_string(),
    }
}

/// Body of the backend's create-link-token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTokenResponse {
    pub link_token: LinkToken,
    #[serde(default)]
    pub expiration: Option<String>,
}
