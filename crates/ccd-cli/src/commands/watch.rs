//! `ccd watch` follows agent states through a shared polling feed.

use std::time::Duration;

use anyhow::{Context, Result};
use ccd::{Dialer, Snapshot};
use ccd_core::{Agent, AgentStatus, DialerConfig};
use clap::Args;
use console::style;
use tracing::info;

use crate::output::source_line;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between polls. Defaults to `poll_interval_secs` from the
    /// configuration.
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Stop after this many updates.
    #[arg(short = 'n', long)]
    pub count: Option<u64>,
}

pub async fn run(dialer: &Dialer, config: &DialerConfig, args: &WatchArgs) -> Result<()> {
    let interval = args
        .interval
        .map_or_else(|| config.poll_interval(), Duration::from_secs);

    let feed = dialer.agent_status_feed(config.cache_ttl().min(interval));
    let mut updates = feed.subscribe();
    let poller = feed.spawn_polling(interval);

    let mut printed = 0;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("interrupted");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    print_snapshot(&snapshot);
                    printed += 1;
                }
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
        }
    }

    poller.stop();
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot<Vec<Agent>>) {
    eprintln!(
        "{} {}",
        style(format!("#{}", snapshot.seq)).dim(),
        source_line("agent_status", snapshot.value.source)
    );
    for agent in &snapshot.value.data {
        println!(
            "{:<12} {:<24} {} {:<10} {:>5}",
            agent.user,
            agent.full_name,
            styled_status(agent.status),
            agent.campaign_id,
            agent.calls_today
        );
    }
}

fn styled_status(status: AgentStatus) -> String {
    let name = format!("{:<12}", status.display_name());
    match status {
        AgentStatus::InCall => style(name).green().to_string(),
        AgentStatus::Ready => style(name).cyan().to_string(),
        AgentStatus::Paused | AgentStatus::Dispo => style(name).yellow().to_string(),
        _ => name,
    }
}
