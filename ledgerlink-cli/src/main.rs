use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ledgerlink_client::{BackendApi, HttpBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod export;
mod link_cmd;
mod listing;
mod render;
mod state;
mod watch;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "ledgerlink",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("LEDGERLINK_BUILD_SHA"), ")"),
    about = "Accounts and transactions from your ledgerlink backend"
)]
struct Cli {
    /// Config file (default: ~/.ledgerlink/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true, env = "LEDGERLINK_API_URL")]
    api_url: Option<String>,

    /// User whose linked items to show
    #[arg(long, global = true, env = "LEDGERLINK_USER_ID")]
    user: Option<String>,

    /// More logging (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the backend's /health endpoint
    Health,

    /// List linked accounts
    Accounts {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List recent transactions
    Transactions {
        /// Only this account id
        #[arg(long)]
        account: Option<String>,

        /// Window in days (default from config; 0 = everything)
        #[arg(long)]
        days: Option<u32>,

        /// Print at most this many
        #[arg(long)]
        limit: Option<usize>,

        /// Write CSV to this path instead of printing
        #[arg(long, conflicts_with = "json")]
        csv: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Inflow, outflow and spending by category
    Summary {
        #[arg(long)]
        days: Option<u32>,
    },

    /// Load, then keep transactions fresh until Ctrl-C
    Watch {
        /// Seconds between refreshes (default from config)
        #[arg(long)]
        every: Option<u64>,
    },

    /// Link a bank account through the hosted link UI
    Link {
        /// Skip the UI and exchange this public token
        #[arg(long)]
        public_token: Option<String>,

        /// Open the link page in a browser
        #[arg(long)]
        open: bool,

        /// Only request and print a link token
        #[arg(long, conflicts_with = "public_token")]
        print_token: bool,
    },

    /// Manage ~/.ledgerlink/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config (file + overrides)
    Show,
    /// Print the config file path
    Path,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn,ledgerlink=info",
        1 => "info,ledgerlink=debug,ledgerlink_client=debug,ledgerlink_core=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            trigger.cancel();
        }
    });
    token
}

fn connect(cfg: &Config) -> Result<Arc<dyn BackendApi>> {
    let backend = HttpBackend::new(&cfg.backend_config()).context("configuring backend client")?;
    debug!(base_url = backend.base_url(), "backend client ready");
    Ok(Arc::new(backend))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = config::config_path(cli.config.as_deref())?;
    let mut cfg = config::load_config(&config_path)?;
    cfg.apply_overrides(cli.api_url, cli.user);

    let command = match cli.command {
        Command::Config { command } => return run_config(&command, &config_path, &cfg),
        other => other,
    };
    cfg.validate()
        .with_context(|| format!("invalid config {}", config_path.display()))?;

    let api = connect(&cfg)?;
    let cancel = cancel_on_ctrl_c();

    match command {
        Command::Health => health(api.as_ref(), &cfg.backend.base_url).await?,

        Command::Accounts { json } => listing::run_accounts(api, &cfg, json, &cancel).await?,

        Command::Transactions {
            account,
            days,
            limit,
            csv,
            json,
        } => {
            let args = listing::TransactionsArgs {
                account,
                days,
                limit,
                csv,
                json,
            };
            listing::run_transactions(api, &cfg, args, &cancel).await?
        }

        Command::Summary { days } => listing::run_summary(api, &cfg, days, &cancel).await?,

        Command::Watch { every } => {
            let loader_cfg = cfg.loader_config(cfg.require_user()?, None)?;
            let every = Duration::from_secs(every.unwrap_or(cfg.loader.refresh_interval_secs));
            watch::run_watch(api, loader_cfg, cfg.timezone()?, every, cancel).await?
        }

        Command::Link {
            public_token,
            open,
            print_token,
        } => {
            let loader_cfg = cfg.loader_config(cfg.require_user()?, None)?;
            let args = link_cmd::LinkArgs {
                public_token,
                open,
                print_token,
            };
            link_cmd::run_link(api, &cfg, loader_cfg, args, &cancel).await?
        }

        Command::Config { .. } => {}
    }

    Ok(())
}

async fn health(api: &dyn BackendApi, base_url: &str) -> Result<()> {
    let h = api
        .health()
        .await
        .with_context(|| format!("reaching {base_url}"))?;
    println!("{base_url}/health -> {} in {} ms", h.status, h.latency.as_millis());
    if !h.is_healthy() {
        bail!("backend unhealthy: {}", h.body);
    }
    Ok(())
}

fn run_config(command: &ConfigCommand, path: &Path, cfg: &Config) -> Result<()> {
    match command {
        ConfigCommand::Init => {
            if config::init_config(path)? {
                println!("Wrote {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
        ConfigCommand::Show => {
            print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
        }
        ConfigCommand::Path => println!("{}", path.display()),
    }
    Ok(())
}
