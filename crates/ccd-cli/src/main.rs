//! Command-line client for the CCD telephony adapter.
//!
//! Usage:
//! ```bash
//! ccd agents                          # Agent sessions
//! ccd leads 3001234567                # Leads for a phone number
//! ccd calls --user agent001           # Call log
//! ccd pause agent001 --code BREAK     # Pause an agent
//! ccd watch --interval 5              # Follow agent states
//! ```
//!
//! Results are printed to stdout as JSON. Whether they came from the live
//! server or from fallback data is reported on stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ccd::Dialer;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;

#[derive(Debug, Parser)]
#[command(name = "ccd", author, version, about)]
struct Cli {
    /// Path to a ccd.toml file. Skips the config search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show agent sessions
    Agents(commands::query::AgentsArgs),

    /// Show logged-in agents
    LoggedIn(commands::query::LoggedInArgs),

    /// Show real-time campaign counters
    CampaignStats(commands::query::CampaignStatsArgs),

    /// Show the settings of one campaign
    Campaign(commands::query::CampaignArgs),

    /// Search leads by phone number
    Leads(commands::query::LeadsArgs),

    /// Show the call log
    Calls(commands::query::CallsArgs),

    /// Update fields of a lead
    UpdateLead(commands::action::UpdateLeadArgs),

    /// Place an outbound call from an agent session
    Originate(commands::action::OriginateArgs),

    /// Pause an agent
    Pause(commands::action::PauseArgs),

    /// Resume a paused agent
    Unpause(commands::action::UnpauseArgs),

    /// Follow agent states until interrupted
    Watch(commands::watch::WatchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse().context("failed to parse log directive")?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;
    let dialer = Dialer::new(&config).context("failed to create telephony client")?;

    match &cli.command {
        Command::Agents(args) => commands::query::agents(&dialer, args).await,
        Command::LoggedIn(args) => commands::query::logged_in(&dialer, args).await,
        Command::CampaignStats(args) => commands::query::campaign_stats(&dialer, args).await,
        Command::Campaign(args) => commands::query::campaign(&dialer, args).await,
        Command::Leads(args) => commands::query::leads(&dialer, args).await,
        Command::Calls(args) => commands::query::calls(&dialer, args).await,
        Command::UpdateLead(args) => commands::action::update_lead(&dialer, args).await,
        Command::Originate(args) => commands::action::originate(&dialer, args).await,
        Command::Pause(args) => commands::action::pause(&dialer, args).await,
        Command::Unpause(args) => commands::action::unpause(&dialer, args).await,
        Command::Watch(args) => commands::watch::run(&dialer, &config, args).await,
    }
}
