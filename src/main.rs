use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use vidwatch::config::{self, Config};
use vidwatch::cycle::Pipeline;
use vidwatch::mailer::SmtpMailer;
use vidwatch::monitor::Monitor;
use vidwatch::store::SnapshotStore;
use vidwatch::youtube::YoutubeClient;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write an example config file
    Init,
    /// Manage the watched channel ids
    Channel {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Manage the alert recipients
    Recipient {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Run one poll cycle and print the result
    Check,
    /// Poll continuously until Ctrl-C
    Watch,
}

#[derive(Debug, Subcommand)]
enum ListAction {
    /// Add an entry
    Add { value: String },
    /// Remove an entry
    Remove { value: String },
    /// Print all entries
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    if matches!(args.command, Command::Init) {
        return init_config(&args.config);
    }

    let mut cfg = config::load(Some(&args.config))?;

    match args.command {
        Command::Init => unreachable!("handled above"),
        Command::Channel { action } => edit_list(&args.config, &mut cfg, ListKind::Channel, action),
        Command::Recipient { action } => {
            edit_list(&args.config, &mut cfg, ListKind::Recipient, action)
        }
        Command::Check => {
            let pipeline = build_pipeline(&cfg)?;
            let outcome = pipeline.run_once().await?;
            println!("{outcome}");
            Ok(())
        }
        Command::Watch => watch(cfg).await,
    }
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing config at {}", path.display());
    }
    std::fs::write(path, config::example())?;
    println!("Wrote example config to {}", path.display());
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Channel,
    Recipient,
}

impl ListKind {
    fn noun(self) -> &'static str {
        match self {
            ListKind::Channel => "channel",
            ListKind::Recipient => "recipient",
        }
    }
}

fn edit_list(path: &Path, cfg: &mut Config, kind: ListKind, action: ListAction) -> Result<()> {
    let noun = kind.noun();
    match action {
        ListAction::Add { value } => {
            let added = match kind {
                ListKind::Channel => cfg.watch.add_channel(&value),
                ListKind::Recipient => cfg.watch.add_recipient(&value),
            };
            if !added {
                bail!("{noun} '{}' is empty or already present", value.trim());
            }
            config::save(path, cfg)?;
            println!("Added {noun} {}.", value.trim());
        }
        ListAction::Remove { value } => {
            let removed = match kind {
                ListKind::Channel => cfg.watch.remove_channel(&value),
                ListKind::Recipient => cfg.watch.remove_recipient(&value),
            };
            if !removed {
                bail!("{noun} '{}' not found", value.trim());
            }
            config::save(path, cfg)?;
            println!("Removed {noun} {}.", value.trim());
        }
        ListAction::List => {
            let entries = match kind {
                ListKind::Channel => &cfg.watch.channels,
                ListKind::Recipient => &cfg.watch.recipients,
            };
            for entry in entries {
                println!("{entry}");
            }
        }
    }
    Ok(())
}

fn build_pipeline(cfg: &Config) -> Result<Pipeline> {
    let api_key =
        std::env::var("VIDWATCH_API_KEY").unwrap_or_else(|_| cfg.api.key.clone());
    if api_key.trim().is_empty() {
        bail!("no API key: set api.key in the config or VIDWATCH_API_KEY");
    }
    let smtp_password =
        std::env::var("VIDWATCH_SMTP_PASSWORD").unwrap_or_else(|_| cfg.email.password.clone());
    if smtp_password.trim().is_empty() {
        bail!("no SMTP password: set email.password in the config or VIDWATCH_SMTP_PASSWORD");
    }
    if cfg.watch.channels.is_empty() {
        bail!("add at least one channel before polling");
    }
    if cfg.watch.recipients.is_empty() {
        bail!("add at least one recipient before polling");
    }

    Ok(Pipeline {
        source: Arc::new(YoutubeClient::new(api_key)),
        store: SnapshotStore::new(&cfg.app.state_path),
        mailer: Arc::new(SmtpMailer::new(
            cfg.email.smtp_host.clone(),
            cfg.email.smtp_port,
            cfg.email.from_address.clone(),
            smtp_password,
        )),
        channels: cfg.watch.channels.clone(),
        recipients: cfg.watch.recipients.clone(),
    })
}

async fn watch(cfg: Config) -> Result<()> {
    let pipeline = build_pipeline(&cfg)?;
    let interval = Duration::from_secs(cfg.app.poll_interval_secs);

    let monitor = Monitor::new();
    let handle = monitor.start(pipeline, interval)?;
    info!("watching; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    handle.stop().await;
    Ok(())
}
