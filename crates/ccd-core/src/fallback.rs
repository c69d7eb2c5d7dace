//! Static substitute responses used when the telephony server is unreachable.
//!
//! Every entry is a canned body in the vendor's wire format, so simulated
//! data goes through the same parser and mapping tables as live data and ends
//! up with exactly the same shape.
//!
//! Entries are keyed by function name only. They do not look at request
//! parameters: a `lead_search` for any phone number returns the same lead.

use crate::{
    function::Function,
    wire::{self, Record},
};

const AGENT_STATUS: &str = "\
user|full_name|status|campaign_id|session_id|login_time|calls_today|talk_time|pause_time|last_call_duration|server_ip|phone_login|phone_pass
agent001|Maria Garcia|INCALL|VENTAS|8600051|2024-01-15 08:00:00|45|12600|1800|180|192.168.1.100|1001|1001pass
agent002|Juan Perez|READY|VENTAS|8600052|2024-01-15 08:15:00|38|10800|2100|240|192.168.1.100|1002|1002pass
";

const LOGGED_IN_AGENTS: &str = AGENT_STATUS;

const CAMPAIGN_STATS: &str = "\
campaign_id|campaign_name|calls_today|answers_today|drops_today|agents_logged_in|agents_in_call|agents_waiting|agents_paused|leads_in_hopper|dialable_leads
VENTAS|Ventas Nacionales|1250|830|21|12|8|3|1|200|5400
";

const LEAD_SEARCH: &str = "\
lead_id|entry_date|modify_date|status|user|vendor_lead_code|source_id|list_id|phone_code|phone_number|title|first_name|middle_initial|last_name|address1|address2|address3|city|state|province|postal_code|country_code|gender|date_of_birth|alt_phone|email|comments|called_count|last_local_call_time|rank|owner
1001|2024-01-10 09:00:00|2024-01-15 10:30:00|NEW|agent001|VND-1001|WEB|101|57|3001234567|Sr.|Carlos||Martinez|Calle 123 #45-67|||Bogota|Cundinamarca||110111|CO|M|1985-03-12||carlos.martinez@example.com|Interesado en plan premium|2|2024-01-15 10:30:00|0|agent001
";

const CALL_LOG: &str = "\
uniqueid|server_ip|channel|phone_number|user|status|campaign_id|list_id|lead_id|start_time|end_time|length_in_sec|term_reason
1705312800.101|192.168.1.100|SIP/1001-00000001|3001234567|agent001|HUNGUP|VENTAS|101|1001|2024-01-15 10:00:00|2024-01-15 10:04:05|245|CALLER
1705313400.102|192.168.1.100|SIP/1002-00000002|3109876543|agent002|INCALL|VENTAS|101|1002|2024-01-15 10:10:00||0|
";

const CAMPAIGN_DETAIL: &str = "\
campaign_id|campaign_name|active|dial_method|auto_dial_level|dial_timeout|dial_prefix|lead_order|hopper_level|campaign_recording|campaign_script|get_call_launch|next_agent_call|local_call_time
VENTAS|Ventas Nacionales|Y|RATIO|2.5|26|9|DOWN|200|ALLFORCE|SCRIPT_VENTAS|SCRIPT|longest_wait_time|9am-9pm
";

const UPDATE_LEAD: &str = "\
status|message
SUCCESS|simulated update_lead accepted
";

const ORIGINATE_CALL: &str = "\
status|message
SUCCESS|simulated originate_call accepted
";

const AGENT_PAUSE: &str = "\
status|message
SUCCESS|simulated agent_pause accepted
";

const AGENT_UNPAUSE: &str = "\
status|message
SUCCESS|simulated agent_unpause accepted
";

/// Returns the canned body for `function`, or `""` if there is none.
pub fn body(function: &str) -> &'static str {
    match function.parse::<Function>() {
        Ok(known) => body_for(known),
        Err(_) => "",
    }
}

/// Returns the canned body for a catalogue function.
pub fn body_for(function: Function) -> &'static str {
    match function {
        Function::AgentStatus => AGENT_STATUS,
        Function::LoggedInAgents => LOGGED_IN_AGENTS,
        Function::CampaignStats => CAMPAIGN_STATS,
        Function::LeadSearch => LEAD_SEARCH,
        Function::CallLog => CALL_LOG,
        Function::UpdateLead => UPDATE_LEAD,
        Function::OriginateCall => ORIGINATE_CALL,
        Function::AgentPause => AGENT_PAUSE,
        Function::AgentUnpause => AGENT_UNPAUSE,
        Function::CampaignDetail => CAMPAIGN_DETAIL,
    }
}

/// Returns the substitute records for `function`; empty if unrecognized.
pub fn records(function: &str) -> Vec<Record> {
    wire::parse(body(function))
}
