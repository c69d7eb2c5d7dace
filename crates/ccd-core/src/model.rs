//! Typed records for the telephony server's agents, calls, leads and
//! campaigns.
//!
//! These are transient projections of vendor tables. Nothing here is
//! persisted; every adapter call builds a fresh snapshot.

use serde::{Deserialize, Serialize};

use crate::{
    mapping::{FieldSpec, FromRecord, Projection, project, unmapped},
    wire::{self, FIELD_SEPARATOR, Record},
};

/// Agent session status as reported by the dialer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentStatus {
    Ready,
    InCall,
    Paused,
    /// Post-call disposition.
    Dispo,
    Queue,
    Closer,
    #[default]
    Unknown,
}

impl AgentStatus {
    /// The vendor's status code.
    pub fn as_code(self) -> &'static str {
        match self {
            AgentStatus::Ready => "READY",
            AgentStatus::InCall => "INCALL",
            AgentStatus::Paused => "PAUSED",
            AgentStatus::Dispo => "DISPO",
            AgentStatus::Queue => "QUEUE",
            AgentStatus::Closer => "CLOSER",
            AgentStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AgentStatus::Ready => "Ready",
            AgentStatus::InCall => "In Call",
            AgentStatus::Paused => "Paused",
            AgentStatus::Dispo => "Disposition",
            AgentStatus::Queue => "Queued",
            AgentStatus::Closer => "Closer",
            AgentStatus::Unknown => "Unknown",
        }
    }
}

impl From<&str> for AgentStatus {
    fn from(code: &str) -> Self {
        match normalize_code(code).as_str() {
            "READY" => AgentStatus::Ready,
            "INCALL" => AgentStatus::InCall,
            "PAUSED" => AgentStatus::Paused,
            "DISPO" => AgentStatus::Dispo,
            "QUEUE" | "QUEUED" => AgentStatus::Queue,
            "CLOSER" => AgentStatus::Closer,
            _ => AgentStatus::Unknown,
        }
    }
}

/// Call leg status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallStatus {
    InCall,
    Queued,
    Parked,
    HungUp,
    #[default]
    Unknown,
}

impl CallStatus {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            CallStatus::InCall | CallStatus::Queued | CallStatus::Parked
        )
    }
}

impl From<&str> for CallStatus {
    fn from(code: &str) -> Self {
        match normalize_code(code).as_str() {
            "INCALL" | "LIVE" => CallStatus::InCall,
            "QUEUE" | "QUEUED" => CallStatus::Queued,
            "PARK" | "PARKED" => CallStatus::Parked,
            "HUNGUP" | "HANGUP" | "DONE" => CallStatus::HungUp,
            _ => CallStatus::Unknown,
        }
    }
}

fn normalize_code(code: &str) -> String {
    code.trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// A logged-in agent session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub user: String,
    pub full_name: String,
    pub status: AgentStatus,
    pub campaign_id: String,
    pub session_id: String,
    pub login_time: String,
    pub calls_today: i64,
    /// Cumulative talk time in seconds.
    pub talk_time: i64,
    /// Cumulative pause time in seconds.
    pub pause_time: i64,
    pub last_call_duration: i64,
    pub server_ip: String,
    pub phone_login: String,
    pub phone_pass: String,
}

impl FromRecord for Agent {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("user", &["user", "User", "user_id"]),
        FieldSpec::text("full_name", &["full_name", "FullName", "name"]),
        FieldSpec::status("status", &["status", "Status", "agent_status"]),
        FieldSpec::text("campaign_id", &["campaign_id", "CampaignId", "campaign"]),
        FieldSpec::text("session_id", &["session_id", "SessionId", "conf_exten"]),
        FieldSpec::text("login_time", &["login_time", "LoginTime", "event_time"]),
        FieldSpec::int("calls_today", &["calls_today", "CallsToday", "calls"]),
        FieldSpec::int("talk_time", &["talk_time", "TalkTime", "talk_sec"]),
        FieldSpec::int("pause_time", &["pause_time", "PauseTime", "pause_sec"]),
        FieldSpec::int(
            "last_call_duration",
            &["last_call_duration", "LastCallDuration", "last_call_sec"],
        ),
        FieldSpec::text("server_ip", &["server_ip", "ServerIp", "server"]),
        FieldSpec::text("phone_login", &["phone_login", "PhoneLogin", "extension"]),
        FieldSpec::text("phone_pass", &["phone_pass", "PhonePass"]),
    ];

    fn from_projection(p: &Projection) -> Self {
        Self {
            user: p.text("user"),
            full_name: p.text("full_name"),
            status: p.status("status"),
            campaign_id: p.text("campaign_id"),
            session_id: p.text("session_id"),
            login_time: p.text("login_time"),
            calls_today: p.int("calls_today"),
            talk_time: p.int("talk_time"),
            pause_time: p.int("pause_time"),
            last_call_duration: p.int("last_call_duration"),
            server_ip: p.text("server_ip"),
            phone_login: p.text("phone_login"),
            phone_pass: p.text("phone_pass"),
        }
    }
}

/// One call leg. Immutable once its status is [`CallStatus::HungUp`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub uniqueid: String,
    pub server_ip: String,
    pub channel: String,
    pub phone_number: String,
    pub user: String,
    pub status: CallStatus,
    pub campaign_id: String,
    pub list_id: String,
    pub lead_id: String,
    pub start_time: String,
    pub end_time: String,
    pub length_in_sec: i64,
    pub term_reason: String,
}

impl FromRecord for CallRecord {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("uniqueid", &["uniqueid", "UniqueId", "call_id"]),
        FieldSpec::text("server_ip", &["server_ip", "ServerIp"]),
        FieldSpec::text("channel", &["channel", "Channel"]),
        FieldSpec::text("phone_number", &["phone_number", "PhoneNumber", "number_dialed"]),
        FieldSpec::text("user", &["user", "User"]),
        FieldSpec::status("status", &["status", "Status"]),
        FieldSpec::text("campaign_id", &["campaign_id", "CampaignId"]),
        FieldSpec::text("list_id", &["list_id", "ListId"]),
        FieldSpec::text("lead_id", &["lead_id", "LeadId"]),
        FieldSpec::text("start_time", &["start_time", "StartTime", "call_date"]),
        FieldSpec::text("end_time", &["end_time", "EndTime"]),
        FieldSpec::int("length_in_sec", &["length_in_sec", "LengthInSec", "duration"]),
        FieldSpec::text("term_reason", &["term_reason", "TermReason"]),
    ];

    fn from_projection(p: &Projection) -> Self {
        Self {
            uniqueid: p.text("uniqueid"),
            server_ip: p.text("server_ip"),
            channel: p.text("channel"),
            phone_number: p.text("phone_number"),
            user: p.text("user"),
            status: p.status("status"),
            campaign_id: p.text("campaign_id"),
            list_id: p.text("list_id"),
            lead_id: p.text("lead_id"),
            start_time: p.text("start_time"),
            end_time: p.text("end_time"),
            length_in_sec: p.int("length_in_sec"),
            term_reason: p.text("term_reason"),
        }
    }
}

/// A contact in a dialing list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: String,
    pub entry_date: String,
    pub modify_date: String,
    pub status: String,
    pub user: String,
    pub vendor_lead_code: String,
    pub source_id: String,
    pub list_id: String,
    pub phone_code: String,
    pub phone_number: String,
    pub title: String,
    pub first_name: String,
    pub middle_initial: String,
    pub last_name: String,
    pub address1: String,
    pub address2: String,
    pub address3: String,
    pub city: String,
    pub state: String,
    pub province: String,
    pub postal_code: String,
    pub country_code: String,
    pub gender: String,
    pub date_of_birth: String,
    pub alt_phone: String,
    pub email: String,
    pub comments: String,
    pub called_count: i64,
    pub last_local_call_time: String,
    pub rank: i64,
    pub owner: String,
}

impl Lead {
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.last_name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromRecord for Lead {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("lead_id", &["lead_id", "LeadId", "id"]),
        FieldSpec::text("entry_date", &["entry_date", "EntryDate"]),
        FieldSpec::text("modify_date", &["modify_date", "ModifyDate"]),
        FieldSpec::text("status", &["status", "Status"]),
        FieldSpec::text("user", &["user", "User"]),
        FieldSpec::text("vendor_lead_code", &["vendor_lead_code", "VendorLeadCode"]),
        FieldSpec::text("source_id", &["source_id", "SourceId"]),
        FieldSpec::text("list_id", &["list_id", "ListId"]),
        FieldSpec::text("phone_code", &["phone_code", "PhoneCode"]),
        FieldSpec::text("phone_number", &["phone_number", "PhoneNumber", "phone"]),
        FieldSpec::text("title", &["title", "Title"]),
        FieldSpec::text("first_name", &["first_name", "FirstName"]),
        FieldSpec::text("middle_initial", &["middle_initial", "MiddleInitial"]),
        FieldSpec::text("last_name", &["last_name", "LastName"]),
        FieldSpec::text("address1", &["address1", "Address1", "address"]),
        FieldSpec::text("address2", &["address2", "Address2"]),
        FieldSpec::text("address3", &["address3", "Address3"]),
        FieldSpec::text("city", &["city", "City"]),
        FieldSpec::text("state", &["state", "State"]),
        FieldSpec::text("province", &["province", "Province"]),
        FieldSpec::text("postal_code", &["postal_code", "PostalCode", "zip"]),
        FieldSpec::text("country_code", &["country_code", "CountryCode"]),
        FieldSpec::text("gender", &["gender", "Gender"]),
        FieldSpec::text("date_of_birth", &["date_of_birth", "DateOfBirth"]),
        FieldSpec::text("alt_phone", &["alt_phone", "AltPhone"]),
        FieldSpec::text("email", &["email", "Email"]),
        FieldSpec::text("comments", &["comments", "Comments"]),
        FieldSpec::int("called_count", &["called_count", "CalledCount"]),
        FieldSpec::text(
            "last_local_call_time",
            &["last_local_call_time", "LastLocalCallTime", "last_call_time"],
        ),
        FieldSpec::int("rank", &["rank", "Rank"]),
        FieldSpec::text("owner", &["owner", "Owner"]),
    ];

    fn from_projection(p: &Projection) -> Self {
        Self {
            lead_id: p.text("lead_id"),
            entry_date: p.text("entry_date"),
            modify_date: p.text("modify_date"),
            status: p.text("status"),
            user: p.text("user"),
            vendor_lead_code: p.text("vendor_lead_code"),
            source_id: p.text("source_id"),
            list_id: p.text("list_id"),
            phone_code: p.text("phone_code"),
            phone_number: p.text("phone_number"),
            title: p.text("title"),
            first_name: p.text("first_name"),
            middle_initial: p.text("middle_initial"),
            last_name: p.text("last_name"),
            address1: p.text("address1"),
            address2: p.text("address2"),
            address3: p.text("address3"),
            city: p.text("city"),
            state: p.text("state"),
            province: p.text("province"),
            postal_code: p.text("postal_code"),
            country_code: p.text("country_code"),
            gender: p.text("gender"),
            date_of_birth: p.text("date_of_birth"),
            alt_phone: p.text("alt_phone"),
            email: p.text("email"),
            comments: p.text("comments"),
            called_count: p.int("called_count"),
            last_local_call_time: p.text("last_local_call_time"),
            rank: p.int("rank"),
            owner: p.text("owner"),
        }
    }
}

/// Dialing configuration of a campaign.
///
/// Only the commonly used columns are typed. Every other vendor column is
/// kept in `extra`, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: String,
    pub campaign_name: String,
    pub active: String,
    pub dial_method: String,
    /// Lines dialed per available agent.
    pub auto_dial_level: f64,
    pub dial_timeout: i64,
    pub dial_prefix: String,
    pub lead_order: String,
    pub hopper_level: i64,
    pub campaign_recording: String,
    pub campaign_script: String,
    pub get_call_launch: String,
    pub next_agent_call: String,
    pub local_call_time: String,
    #[serde(default)]
    pub extra: Record,
}

impl Campaign {
    pub fn is_active(&self) -> bool {
        self.active.trim().eq_ignore_ascii_case("Y")
    }
}

impl FromRecord for Campaign {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("campaign_id", &["campaign_id", "CampaignId"]),
        FieldSpec::text("campaign_name", &["campaign_name", "CampaignName"]),
        FieldSpec::text("active", &["active", "Active"]),
        FieldSpec::text("dial_method", &["dial_method", "DialMethod"]),
        FieldSpec::decimal("auto_dial_level", &["auto_dial_level", "AutoDialLevel", "dial_ratio"]),
        FieldSpec::int("dial_timeout", &["dial_timeout", "DialTimeout"]),
        FieldSpec::text("dial_prefix", &["dial_prefix", "DialPrefix"]),
        FieldSpec::text("lead_order", &["lead_order", "LeadOrder"]),
        FieldSpec::int("hopper_level", &["hopper_level", "HopperLevel"]),
        FieldSpec::text("campaign_recording", &["campaign_recording", "CampaignRecording"]),
        FieldSpec::text("campaign_script", &["campaign_script", "CampaignScript"]),
        FieldSpec::text("get_call_launch", &["get_call_launch", "GetCallLaunch"]),
        FieldSpec::text("next_agent_call", &["next_agent_call", "NextAgentCall"]),
        FieldSpec::text("local_call_time", &["local_call_time", "LocalCallTime"]),
    ];

    fn from_projection(p: &Projection) -> Self {
        Self {
            campaign_id: p.text("campaign_id"),
            campaign_name: p.text("campaign_name"),
            active: p.text("active"),
            dial_method: p.text("dial_method"),
            auto_dial_level: p.decimal("auto_dial_level"),
            dial_timeout: p.int("dial_timeout"),
            dial_prefix: p.text("dial_prefix"),
            lead_order: p.text("lead_order"),
            hopper_level: p.int("hopper_level"),
            campaign_recording: p.text("campaign_recording"),
            campaign_script: p.text("campaign_script"),
            get_call_launch: p.text("get_call_launch"),
            next_agent_call: p.text("next_agent_call"),
            local_call_time: p.text("local_call_time"),
            extra: Record::new(),
        }
    }

    fn from_record(record: &Record) -> Self {
        let mut campaign = Self::from_projection(&project(record, Self::FIELDS));
        campaign.extra = unmapped(record, Self::FIELDS);
        campaign
    }
}

/// Real-time counters for one campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub campaign_id: String,
    pub campaign_name: String,
    pub calls_today: i64,
    pub answers_today: i64,
    pub drops_today: i64,
    pub agents_logged_in: i64,
    pub agents_in_call: i64,
    pub agents_waiting: i64,
    pub agents_paused: i64,
    pub leads_in_hopper: i64,
    pub dialable_leads: i64,
}

impl CampaignStats {
    /// Dropped calls as a percentage of answered calls.
    #[expect(
        clippy::cast_precision_loss,
        reason = "daily call counters are far below 2^52"
    )]
    pub fn drop_rate(&self) -> f64 {
        if self.answers_today <= 0 {
            0.0
        } else {
            self.drops_today as f64 * 100.0 / self.answers_today as f64
        }
    }
}

impl FromRecord for CampaignStats {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("campaign_id", &["campaign_id", "CampaignId"]),
        FieldSpec::text("campaign_name", &["campaign_name", "CampaignName"]),
        FieldSpec::int("calls_today", &["calls_today", "CallsToday"]),
        FieldSpec::int("answers_today", &["answers_today", "AnswersToday"]),
        FieldSpec::int("drops_today", &["drops_today", "DropsToday"]),
        FieldSpec::int("agents_logged_in", &["agents_logged_in", "AgentsLoggedIn"]),
        FieldSpec::int("agents_in_call", &["agents_in_call", "AgentsInCall", "agents_incall"]),
        FieldSpec::int("agents_waiting", &["agents_waiting", "AgentsWaiting"]),
        FieldSpec::int("agents_paused", &["agents_paused", "AgentsPaused"]),
        FieldSpec::int("leads_in_hopper", &["leads_in_hopper", "LeadsInHopper", "hopper"]),
        FieldSpec::int("dialable_leads", &["dialable_leads", "DialableLeads"]),
    ];

    fn from_projection(p: &Projection) -> Self {
        Self {
            campaign_id: p.text("campaign_id"),
            campaign_name: p.text("campaign_name"),
            calls_today: p.int("calls_today"),
            answers_today: p.int("answers_today"),
            drops_today: p.int("drops_today"),
            agents_logged_in: p.int("agents_logged_in"),
            agents_in_call: p.int("agents_in_call"),
            agents_waiting: p.int("agents_waiting"),
            agents_paused: p.int("agents_paused"),
            leads_in_hopper: p.int("leads_in_hopper"),
            dialable_leads: p.int("dialable_leads"),
        }
    }
}

/// Result of a write function such as `update_lead` or `agent_pause`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub status: String,
    pub message: String,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("SUCCESS")
    }

    /// Reads an outcome from a response body.
    ///
    /// Accepts the single-line `SUCCESS: lead updated` form, whose message
    /// may carry pipe-separated data, as well as the tabular form
    /// (`status|message` header, one data row). An empty body yields an
    /// empty outcome.
    pub fn from_body(body: &str) -> Self {
        let Some(first) = body.lines().map(str::trim).find(|line| !line.is_empty()) else {
            return Self::default();
        };

        let prefixed = first
            .split_once(':')
            .filter(|(status, _)| is_status_word(status));
        if let Some((status, message)) = prefixed {
            return Self {
                status: status.to_owned(),
                message: message.trim().to_owned(),
            };
        }

        if first.contains(FIELD_SEPARATOR) {
            return wire::parse(body)
                .first()
                .map(Self::from_record)
                .unwrap_or_default();
        }

        Self {
            status: first.to_owned(),
            message: String::new(),
        }
    }
}

/// `SUCCESS`, `ERROR`, `NOTICE` and the like.
fn is_status_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_uppercase() || c == '_')
}

impl FromRecord for ActionOutcome {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("status", &["status", "result", "Status"]),
        FieldSpec::text("message", &["message", "msg", "details"]),
    ];

    fn from_projection(p: &Projection) -> Self {
        Self {
            status: p.text("status").trim().to_owned(),
            message: p.text("message"),
        }
    }
}
