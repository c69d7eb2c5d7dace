//! Read-only telephony lookups.

use anyhow::Result;
use ccd::{CallLogQuery, Dialer};
use clap::Args;

use crate::output::print_sourced;

#[derive(Debug, Args)]
pub struct AgentsArgs {
    /// Only show this agent.
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoggedInArgs {
    /// Only show agents in this campaign.
    #[arg(short, long)]
    pub campaign: Option<String>,
}

#[derive(Debug, Args)]
pub struct CampaignStatsArgs {
    /// Only show this campaign.
    #[arg(short, long)]
    pub campaign: Option<String>,
}

#[derive(Debug, Args)]
pub struct CampaignArgs {
    /// Campaign ID (e.g., "VENTAS").
    pub campaign_id: String,
}

#[derive(Debug, Args)]
pub struct LeadsArgs {
    /// Phone number to search for.
    pub phone_number: String,
}

#[derive(Debug, Args)]
pub struct CallsArgs {
    #[arg(short, long)]
    pub user: Option<String>,

    /// Day to report, `YYYY-MM-DD`.
    #[arg(short, long)]
    pub date: Option<String>,

    #[arg(short, long)]
    pub campaign: Option<String>,
}

pub async fn agents(dialer: &Dialer, args: &AgentsArgs) -> Result<()> {
    let result = dialer.agent_status(args.user.as_deref()).await;
    print_sourced("agent_status", &result)
}

pub async fn logged_in(dialer: &Dialer, args: &LoggedInArgs) -> Result<()> {
    let result = dialer.logged_in_agents(args.campaign.as_deref()).await;
    print_sourced("logged_in_agents", &result)
}

pub async fn campaign_stats(dialer: &Dialer, args: &CampaignStatsArgs) -> Result<()> {
    let result = dialer.campaign_stats(args.campaign.as_deref()).await;
    print_sourced("campaign_stats", &result)
}

pub async fn campaign(dialer: &Dialer, args: &CampaignArgs) -> Result<()> {
    let result = dialer.campaign_detail(&args.campaign_id).await;
    print_sourced("campaign_detail", &result)
}

pub async fn leads(dialer: &Dialer, args: &LeadsArgs) -> Result<()> {
    let result = dialer.lead_search(&args.phone_number).await;
    print_sourced("lead_search", &result)
}

pub async fn calls(dialer: &Dialer, args: &CallsArgs) -> Result<()> {
    let query = CallLogQuery {
        user: args.user.clone(),
        date: args.date.clone(),
        campaign_id: args.campaign.clone(),
    };
    let result = dialer.call_log(&query).await;
    print_sourced("call_log", &result)
}
