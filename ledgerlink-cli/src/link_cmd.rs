use anyhow::{Context, Result, bail};
use ledgerlink_client::{
    BackendApi, ClientError, DataLoader, LinkFlow, LinkReport, LoadOutcome, LoaderConfig, TerminalLauncher,
};
use ledgerlink_core::PublicToken;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

pub struct LinkArgs {
    pub public_token: Option<String>,
    pub open: bool,
    pub print_token: bool,
}

/// A token handed in up front skips the link token and the UI entirely.
fn preset_token(args: &LinkArgs) -> Option<PublicToken> {
    args.public_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(PublicToken::new)
}

pub async fn run_link(
    api: Arc<dyn BackendApi>,
    cfg: &Config,
    loader_cfg: LoaderConfig,
    args: LinkArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let user_id = loader_cfg.user_id.clone();
    let loader = Arc::new(DataLoader::new(api.clone(), loader_cfg));
    let launcher = Arc::new(TerminalLauncher::new(cfg.backend.link_ui_url.clone(), args.open));
    let flow = LinkFlow::new(api, launcher, user_id).with_loader(loader.clone());

    if args.print_token {
        // For front ends that host the link UI themselves
        let token = flow.get_link_token().await.context("requesting a link token")?;
        println!("{}", token.as_str());
        return Ok(());
    }

    let result = match preset_token(&args) {
        Some(token) => flow.complete(token, None, cancel).await,
        None if args.public_token.is_some() => bail!("--public-token is empty"),
        None => flow.run(cancel).await,
    };

    match result {
        Ok(LinkReport::Linked {
            ack,
            institution,
            reload,
        }) => {
            let what = institution
                .or(ack.item_id)
                .unwrap_or_else(|| "account".to_string());
            println!("Linked {what}.");
            match reload {
                Some(LoadOutcome::Loaded { .. }) => {
                    let snap = loader.snapshot();
                    println!(
                        "{} accounts, {} transactions now available.",
                        snap.accounts.len(),
                        snap.transactions.len()
                    );
                }
                Some(LoadOutcome::GaveUp { reason, .. }) => {
                    println!("Linked, but reloading data failed: {reason}");
                }
                Some(LoadOutcome::Cancelled) | None => {}
            }
            Ok(())
        }
        Ok(LinkReport::Abandoned { reason }) => {
            match reason {
                Some(r) => println!("No account linked ({r})."),
                None => println!("No account linked."),
            }
            Ok(())
        }
        Err(ClientError::Exchange { reason }) => {
            bail!("the bank accepted the login but the backend did not confirm saving the connection: {reason}")
        }
        Err(ClientError::Cancelled) => bail!("interrupted"),
        Err(e) => Err(e).context("linking an account"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(token: Option<&str>) -> LinkArgs {
        LinkArgs {
            public_token: token.map(str::to_string),
            open: false,
            print_token: false,
        }
    }

    #[test]
    fn test_preset_token_is_trimmed() {
        assert_eq!(
            preset_token(&args(Some(" public-sandbox-5 \n"))),
            Some(PublicToken::new("public-sandbox-5"))
        );
        assert_eq!(preset_token(&args(Some("  "))), None);
        assert_eq!(preset_token(&args(None)), None);
    }
}
