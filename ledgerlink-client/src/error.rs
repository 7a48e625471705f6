use thiserror::Error;

/// Everything that can go wrong talking to the backend or the link UI.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("could not parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("public token exchange failed: {reason}")]
    Exchange { reason: String },

    #[error("link UI failed: {0}")]
    Launcher(String),

    #[error("cancelled")]
    Cancelled,

    #[error("no accounts loaded yet to scope transactions to")]
    NotLoaded,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_builder() {
            ClientError::InvalidConfig(err.to_string())
        } else {
            ClientError::Network(err)
        }
    }

    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        ClientError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether trying again later could plausibly succeed.
    ///
    /// A backend that is still starting answers with 5xx from its proxy, or
    /// not at all; both are transient. Other 4xx and bad payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Timeout(_) => true,
            ClientError::Backend { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            _ => false,
        }
    }

    /// Slow vs down: lets callers word the status differently.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }
}

/// Keep error bodies short enough for a status line.
pub(crate) fn truncate_body(body: String) -> String {
    const LIMIT: usize = 300;
    if body.len() <= LIMIT {
        return body;
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
