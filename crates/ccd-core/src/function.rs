//! The subset of the telephony server's function catalogue used by the
//! adapter.

use std::{fmt, str::FromStr};

/// A vendor API function, sent as both the URL path segment and the
/// `function` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    AgentStatus,
    LoggedInAgents,
    CampaignStats,
    LeadSearch,
    CallLog,
    UpdateLead,
    OriginateCall,
    AgentPause,
    AgentUnpause,
    CampaignDetail,
}

/// Returned when parsing a function name outside the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown telephony function '{0}'")]
pub struct UnknownFunction(pub String);

impl Function {
    pub const ALL: [Function; 10] = [
        Function::AgentStatus,
        Function::LoggedInAgents,
        Function::CampaignStats,
        Function::LeadSearch,
        Function::CallLog,
        Function::UpdateLead,
        Function::OriginateCall,
        Function::AgentPause,
        Function::AgentUnpause,
        Function::CampaignDetail,
    ];

    /// The wire name of the function.
    pub fn as_str(self) -> &'static str {
        match self {
            Function::AgentStatus => "agent_status",
            Function::LoggedInAgents => "logged_in_agents",
            Function::CampaignStats => "campaign_stats",
            Function::LeadSearch => "lead_search",
            Function::CallLog => "call_log",
            Function::UpdateLead => "update_lead",
            Function::OriginateCall => "originate_call",
            Function::AgentPause => "agent_pause",
            Function::AgentUnpause => "agent_unpause",
            Function::CampaignDetail => "campaign_detail",
        }
    }

    /// Returns `true` for functions that change state on the server.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Function::UpdateLead
                | Function::OriginateCall
                | Function::AgentPause
                | Function::AgentUnpause
        )
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Function {
    type Err = UnknownFunction;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Function::ALL
            .into_iter()
            .find(|function| function.as_str() == name)
            .ok_or_else(|| UnknownFunction(name.to_owned()))
    }
}
