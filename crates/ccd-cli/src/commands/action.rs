//! Telephony actions that change server state.
//!
//! A simulated outcome means nothing reached the server; the marker on
//! stderr says so.

use anyhow::Result;
use ccd::{Dialer, LeadUpdate, OriginateRequest};
use clap::Args;

use crate::output::print_sourced;

#[derive(Debug, Args)]
pub struct UpdateLeadArgs {
    pub lead_id: String,

    /// New disposition status (e.g., "SALE").
    #[arg(short, long)]
    pub status: Option<String>,

    #[arg(long)]
    pub comments: Option<String>,

    /// Agent the lead is assigned to.
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Debug, Args)]
pub struct OriginateArgs {
    /// Number to dial.
    pub phone_number: String,

    /// Agent whose session places the call.
    #[arg(short, long)]
    pub user: String,

    #[arg(short, long)]
    pub campaign: Option<String>,

    /// Lead the call belongs to.
    #[arg(short, long)]
    pub lead: Option<String>,
}

#[derive(Debug, Args)]
pub struct PauseArgs {
    pub user: String,

    /// Pause code recorded for the break.
    #[arg(short, long)]
    pub code: Option<String>,
}

#[derive(Debug, Args)]
pub struct UnpauseArgs {
    pub user: String,
}

pub async fn update_lead(dialer: &Dialer, args: &UpdateLeadArgs) -> Result<()> {
    let update = LeadUpdate {
        status: args.status.clone(),
        comments: args.comments.clone(),
        user: args.user.clone(),
        ..LeadUpdate::default()
    };
    let result = dialer.update_lead(&args.lead_id, update).await;
    print_sourced("update_lead", &result)
}

pub async fn originate(dialer: &Dialer, args: &OriginateArgs) -> Result<()> {
    let request = OriginateRequest {
        phone_number: args.phone_number.clone(),
        user: args.user.clone(),
        campaign_id: args.campaign.clone(),
        lead_id: args.lead.clone(),
    };
    let result = dialer.originate_call(&request).await;
    print_sourced("originate_call", &result)
}

pub async fn pause(dialer: &Dialer, args: &PauseArgs) -> Result<()> {
    let result = dialer.pause_agent(&args.user, args.code.as_deref()).await;
    print_sourced("agent_pause", &result)
}

pub async fn unpause(dialer: &Dialer, args: &UnpauseArgs) -> Result<()> {
    let result = dialer.unpause_agent(&args.user).await;
    print_sourced("agent_unpause", &result)
}
