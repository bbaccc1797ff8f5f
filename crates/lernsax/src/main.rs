//! `lernsax` - harvest, browse and send for one profile
//!
//! Usage:
//!
//! ```text
//! lernsax <profile> [mail]                  harvest every mail folder
//! lernsax <profile> groups                  print group and class file trees
//! lernsax <profile> send <subject> [to..]   send stdin as one message
//! ```
//!
//! Settings come from `<config_dir>/lernsax/settings.json` (created with the
//! defaults on first run), credentials from the profile file named there.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use lernsax_auth::{AuthSession, Session};
use lernsax_contract::PageContract;
use lernsax_core::{
    FileNode, GroupBrowser, HarvestConfig, MailHarvester, OutboundSender, OutgoingMail, ProfileStore,
};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: lernsax <profile> [mail | groups | send <subject> [recipient...]]";

enum Command {
    Mail,
    Groups,
    Send { subject: String, to: Vec<String> },
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Option<Self> {
        match args.next().as_deref() {
            None | Some("mail") => Some(Self::Mail),
            Some("groups") => Some(Self::Groups),
            Some("send") => Some(Self::Send {
                subject: args.next()?,
                to: args.collect(),
            }),
            Some(_) => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lernsax=info,lernsax_core=info,lernsax_auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(profile), Some(command)) = (args.next(), Command::parse(&mut args)) else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::from(2));
    };

    let config = HarvestConfig::load().await.context("loading settings")?;
    let profiles = ProfileStore::load(&config.credentials_file)
        .await
        .with_context(|| format!("loading profiles from {}", config.credentials_file.display()))?;
    let credentials = profiles.credentials(&profile)?;

    info!(%profile, "Logging in");
    let contract = PageContract::v1()?;
    let mut auth = AuthSession::new(credentials, config.site()?, contract.clone())?;
    let session = match auth.login().await {
        Ok(session) => session,
        Err(e) => {
            error!(%profile, error = %e, "Login failed");
            return Ok(ExitCode::FAILURE);
        }
    };

    match command {
        Command::Mail => harvest(session, &contract, &config).await,
        Command::Groups => groups(session, &contract, &config).await,
        Command::Send { subject, to } => send(session, &contract, &config, subject, to).await,
    }
}

async fn harvest(session: &Session, contract: &PageContract, config: &HarvestConfig) -> anyhow::Result<ExitCode> {
    let mut harvester = MailHarvester::new(session, contract, config.store())
        .download_attachments(config.download_attachments);
    let report = harvester.harvest_all().await.context("loading mail folders")?;

    for (folder, result) in &report.folders {
        match result {
            Ok(h) => println!(
                "{folder}: {} messages, {} attachments -> {}",
                h.messages,
                h.attachments,
                h.file.display()
            ),
            Err(e) => println!("{folder}: failed: {e}"),
        }
    }
    info!(
        folders = report.folders.len(),
        failures = report.failures(),
        messages = report.messages(),
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "Harvest finished"
    );

    Ok(if report.failures() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(3)
    })
}

async fn groups(session: &Session, contract: &PageContract, config: &HarvestConfig) -> anyhow::Result<ExitCode> {
    let browser = GroupBrowser::new(session, contract);
    let mut all = browser.list_groups().context("listing groups")?;
    all.extend(browser.list_classes().context("listing classes")?);

    let mut failures = 0;
    for group in &all {
        println!("{} ({:?})", group.name, group.kind);
        match browser.walk(group, config.group_depth).await {
            Ok(tree) => print_tree(&tree, 1),
            Err(e) => {
                warn!(group = %group.name, error = %e, "Cannot walk file area");
                println!("  failed: {e}");
                failures += 1;
            }
        }
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(3)
    })
}

fn print_tree(nodes: &[FileNode], level: usize) {
    for node in nodes {
        println!("{}{}", "  ".repeat(level), node.entry.name());
        print_tree(&node.children, level + 1);
    }
}

async fn send(
    session: &Session,
    contract: &PageContract,
    config: &HarvestConfig,
    subject: String,
    to: Vec<String>,
) -> anyhow::Result<ExitCode> {
    let mut body = String::new();
    tokio::io::stdin()
        .read_to_string(&mut body)
        .await
        .context("reading message body from stdin")?;

    let mail = to
        .into_iter()
        .fold(OutgoingMail::new(subject, body), OutgoingMail::to);
    let sender = OutboundSender::new(session, contract).with_pause(config.send_pause());
    let mut failures = 0;
    for result in sender.send_all(std::slice::from_ref(&mail)).await {
        match result {
            Ok(status) => println!("sent: {status}"),
            Err(e) => {
                println!("failed: {e}");
                failures += 1;
            }
        }
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
