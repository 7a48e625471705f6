//! [`LinkLauncher`] implementations.

use std::io::{self, BufRead, Write};
use std::process::{Command, Stdio};

use async_trait::async_trait;
use ledgerlink_core::{LinkToken, PublicToken};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::link::{LinkLauncher, LinkOutcome};

/// Hosted link page the provider serves for a given link token
pub const DEFAULT_LINK_UI_URL: &str = "https://cdn.plaid.com/link/v2/stable/link.html";

/// Interactive terminal: show (and optionally open) the hosted page, then
/// read the public token the page hands back.
pub struct TerminalLauncher {
    link_ui_url: String,
    open_browser: bool,
}

impl TerminalLauncher {
    pub fn new(link_ui_url: impl Into<String>, open_browser: bool) -> Self {
        Self {
            link_ui_url: link_ui_url.into(),
            open_browser,
        }
    }

    pub fn hosted_url(&self, token: &LinkToken) -> Result<String> {
        hosted_link_url(&self.link_ui_url, token)
    }
}

pub fn hosted_link_url(base: &str, token: &LinkToken) -> Result<String> {
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| ClientError::InvalidConfig(format!("link UI url '{base}': {e}")))?;
    url.query_pairs_mut()
        .append_pair("isWebview", "true")
        .append_pair("token", token.as_str());
    Ok(url.into())
}

/// Interpret one line typed at the prompt. Blank input means the user backed out.
pub fn parse_public_token_line(line: &str) -> LinkOutcome {
    let line = line.trim();
    if line.is_empty() {
        return LinkOutcome::Exited {
            reason: Some("no public token entered".to_string()),
        };
    }
    // Accept a pasted `public_token=...` fragment from the redirect URL
    let token = line
        .rsplit_once("public_token=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or(rest))
        .unwrap_or(line);
    LinkOutcome::Success {
        public_token: PublicToken::new(token.trim()),
        institution: None,
    }
}

fn open_in_browser(url: &str) -> bool {
    let opener = ["xdg-open", "open"]
        .iter()
        .find_map(|bin| which::which(bin).ok());
    let Some(opener) = opener else {
        debug!("no browser opener found on PATH");
        return false;
    };
    match Command::new(&opener)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, opener = %opener.display(), "could not open browser");
            false
        }
    }
}

#[async_trait]
impl LinkLauncher for TerminalLauncher {
    async fn launch(&self, token: &LinkToken) -> Result<LinkOutcome> {
        let url = self.hosted_url(token)?;
        let opened = self.open_browser && open_in_browser(&url);

        let prompt = if opened {
            "Finish linking in your browser, then paste the public token (blank to cancel)".to_string()
        } else {
            format!("Open this page to link your bank:\n  {url}\n\nPaste the public token (blank to cancel)")
        };

        let line = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut out = io::stdout().lock();
            write!(out, "{prompt}: ")?;
            out.flush()?;
            let mut s = String::new();
            io::stdin().lock().read_line(&mut s)?;
            Ok(s)
        })
        .await
        .map_err(|e| ClientError::Launcher(e.to_string()))?
        .map_err(|e| ClientError::Launcher(format!("reading public token: {e}")))?;

        Ok(parse_public_token_line(&line))
    }
}
