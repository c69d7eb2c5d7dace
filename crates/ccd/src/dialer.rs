//! Typed telephony calls with transparent fallback.
//!
//! A [`Dialer`] turns each vendor function into a method returning typed
//! records. Every result is wrapped in [`Sourced`], which tells callers
//! whether the data came from the live server or from the static fallback
//! tables. Transport failures never reach the caller: they are logged and
//! replaced with fallback data of the same shape.

use std::{borrow::Cow, sync::Arc, time::Duration};

use ccd_core::{
    ActionOutcome, Agent, CallRecord, Campaign, CampaignStats, DialerConfig, FromRecord, Function,
    Lead, Record, fallback, wire,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::{
    feed::Feed,
    transport::{HttpTransport, Params, Transport, TransportError},
};

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Parsed from a telephony server response.
    Live,
    /// Substituted from static fallback data after a failed call.
    Simulated,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Live => "live",
            Source::Simulated => "simulated",
        }
    }
}

/// A result tagged with its [`Source`].
///
/// Serializes as `{"source": "live" | "simulated", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub source: Source,
    pub data: T,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self {
            source: Source::Live,
            data,
        }
    }

    pub fn simulated(data: T) -> Self {
        Self {
            source: Source::Simulated,
            data,
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == Source::Live
    }

    /// Transforms the data and keeps the source tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            source: self.source,
            data: f(self.data),
        }
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// Filters for [`Dialer::call_log`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLogQuery {
    pub user: Option<String>,
    /// Day to report, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub campaign_id: Option<String>,
}

/// Fields changed by [`Dialer::update_lead`]. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadUpdate {
    pub status: Option<String>,
    pub comments: Option<String>,
    /// Agent the lead is assigned to.
    pub user: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub alt_phone: Option<String>,
}

impl LeadUpdate {
    fn into_params(self, lead_id: &str) -> Params {
        // `user` is a credential on the wire; the lead owner goes as `owner`.
        Params::new()
            .with("lead_id", lead_id)
            .with_opt("status", self.status)
            .with_opt("comments", self.comments)
            .with_opt("owner", self.user)
            .with_opt("first_name", self.first_name)
            .with_opt("last_name", self.last_name)
            .with_opt("email", self.email)
            .with_opt("alt_phone", self.alt_phone)
    }
}

/// An outbound call placed through [`Dialer::originate_call`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginateRequest {
    pub phone_number: String,
    /// Agent whose session places the call.
    pub user: String,
    pub campaign_id: Option<String>,
    pub lead_id: Option<String>,
}

/// Adapter between the CRM and one telephony server.
///
/// Cheap to clone; clones share the transport. Construct one per configured
/// server.
#[derive(Debug, Clone)]
pub struct Dialer {
    transport: Arc<dyn Transport>,
}

impl Dialer {
    /// Creates an adapter talking HTTP to the server in `config`.
    ///
    /// A configuration without a server is valid: every call then serves
    /// fallback data.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &DialerConfig) -> Result<Self, TransportError> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(config)?)))
    }

    /// Creates an adapter over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Calls `function` and returns the raw body, or the fallback body if
    /// the call fails.
    async fn call_body(&self, function: &str, params: &Params) -> Sourced<Cow<'static, str>> {
        match self.transport.call(function, params).await {
            Ok(body) => Sourced::live(Cow::Owned(body)),
            Err(err) => {
                warn!(function, error = %err, "telephony call failed, serving fallback data");
                Sourced::simulated(Cow::Borrowed(fallback::body(function)))
            }
        }
    }

    /// Calls any vendor function and returns its rows as untyped records.
    #[instrument(skip(self, params))]
    pub async fn fetch_records(&self, function: &str, params: &Params) -> Sourced<Vec<Record>> {
        self.call_body(function, params)
            .await
            .map(|body| wire::parse(&body))
    }

    async fn fetch<T: FromRecord>(&self, function: Function, params: Params) -> Sourced<Vec<T>> {
        self.fetch_records(function.as_str(), &params)
            .await
            .map(|records| T::from_records(&records))
    }

    async fn act(&self, function: Function, params: Params) -> Sourced<ActionOutcome> {
        self.call_body(function.as_str(), &params)
            .await
            .map(|body| ActionOutcome::from_body(&body))
    }

    /// Agent sessions, optionally restricted to one agent.
    #[instrument(skip(self))]
    pub async fn agent_status(&self, user: Option<&str>) -> Sourced<Vec<Agent>> {
        let params = Params::new().with_opt("agent_user", user);
        self.fetch(Function::AgentStatus, params).await
    }

    /// Agents currently logged in, optionally within one campaign.
    #[instrument(skip(self))]
    pub async fn logged_in_agents(&self, campaign_id: Option<&str>) -> Sourced<Vec<Agent>> {
        let params = Params::new().with_opt("campaigns", campaign_id);
        self.fetch(Function::LoggedInAgents, params).await
    }

    #[instrument(skip(self))]
    pub async fn campaign_stats(&self, campaign_id: Option<&str>) -> Sourced<Vec<CampaignStats>> {
        let params = Params::new().with_opt("campaign_id", campaign_id);
        self.fetch(Function::CampaignStats, params).await
    }

    /// Leads whose phone number matches `phone_number`.
    #[instrument(skip(self))]
    pub async fn lead_search(&self, phone_number: &str) -> Sourced<Vec<Lead>> {
        let params = Params::new().with("phone_number", phone_number);
        self.fetch(Function::LeadSearch, params).await
    }

    #[instrument(skip(self))]
    pub async fn call_log(&self, query: &CallLogQuery) -> Sourced<Vec<CallRecord>> {
        let params = Params::new()
            .with_opt("agent_user", query.user.as_deref())
            .with_opt("date", query.date.as_deref())
            .with_opt("campaign_id", query.campaign_id.as_deref());
        self.fetch(Function::CallLog, params).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_lead(&self, lead_id: &str, update: LeadUpdate) -> Sourced<ActionOutcome> {
        self.act(Function::UpdateLead, update.into_params(lead_id))
            .await
    }

    #[instrument(skip(self, request), fields(phone_number = %request.phone_number))]
    pub async fn originate_call(&self, request: &OriginateRequest) -> Sourced<ActionOutcome> {
        let params = Params::new()
            .with("phone_number", &request.phone_number)
            .with("agent_user", &request.user)
            .with_opt("campaign_id", request.campaign_id.as_deref())
            .with_opt("lead_id", request.lead_id.as_deref());
        self.act(Function::OriginateCall, params).await
    }

    #[instrument(skip(self))]
    pub async fn pause_agent(&self, user: &str, pause_code: Option<&str>) -> Sourced<ActionOutcome> {
        let params = Params::new()
            .with("agent_user", user)
            .with_opt("pause_code", pause_code);
        self.act(Function::AgentPause, params).await
    }

    #[instrument(skip(self))]
    pub async fn unpause_agent(&self, user: &str) -> Sourced<ActionOutcome> {
        let params = Params::new().with("agent_user", user);
        self.act(Function::AgentUnpause, params).await
    }

    /// Settings of one campaign; `None` if the server returned no rows.
    #[instrument(skip(self))]
    pub async fn campaign_detail(&self, campaign_id: &str) -> Sourced<Option<Campaign>> {
        let params = Params::new().with("campaign_id", campaign_id);
        self.fetch::<Campaign>(Function::CampaignDetail, params)
            .await
            .map(|campaigns| campaigns.into_iter().next())
    }

    /// A shared, cached view of every agent session.
    ///
    /// Dashboards and widgets should read agent state through one feed
    /// instead of polling the server independently.
    pub fn agent_status_feed(&self, ttl: Duration) -> Feed<Vec<Agent>> {
        let dialer = self.clone();
        Feed::new(Function::AgentStatus.as_str(), ttl, move || {
            let dialer = dialer.clone();
            async move { dialer.agent_status(None).await }.boxed()
        })
    }

    /// A shared, cached view of campaign counters.
    pub fn campaign_stats_feed(&self, ttl: Duration) -> Feed<Vec<CampaignStats>> {
        let dialer = self.clone();
        Feed::new(Function::CampaignStats.as_str(), ttl, move || {
            let dialer = dialer.clone();
            async move { dialer.campaign_stats(None).await }.boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, sync::Mutex};

    use async_trait::async_trait;
    use ccd_core::AgentStatus;
    use serde_json::{Value, json};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::*;

    /// Transport that always fails, as if the server were down.
    #[derive(Debug)]
    struct DownTransport;

    #[async_trait]
    impl Transport for DownTransport {
        async fn call(&self, _function: &str, _params: &Params) -> Result<String, TransportError> {
            Err(TransportError::NotConfigured)
        }
    }

    /// Transport that answers with a fixed body and records every call.
    #[derive(Debug)]
    struct RecordingTransport {
        body: String,
        calls: Mutex<Vec<(String, Params)>>,
    }

    impl RecordingTransport {
        fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn last_call(&self) -> (String, Params) {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn call(&self, function: &str, params: &Params) -> Result<String, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((function.to_string(), params.clone()));
            Ok(self.body.clone())
        }
    }

    fn down_dialer() -> Dialer {
        Dialer::with_transport(Arc::new(DownTransport))
    }

    fn object_keys(value: &Value) -> BTreeSet<String> {
        value.as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn test_sourced_serializes_with_source_tag() {
        let value = serde_json::to_value(Sourced::simulated(vec![1, 2])).unwrap();
        assert_eq!(value, json!({"source": "simulated", "data": [1, 2]}));

        let value = serde_json::to_value(Sourced::live("ok")).unwrap();
        assert_eq!(value, json!({"source": "live", "data": "ok"}));
    }

    #[tokio::test]
    async fn test_lead_search_falls_back_to_static_lead_for_any_phone() {
        let dialer = down_dialer();

        for phone in ["3001234567", "5550000000", ""] {
            let result = dialer.lead_search(phone).await;

            assert_eq!(result.source, Source::Simulated);
            assert_eq!(result.data.len(), 1);
            assert_eq!(result.data[0].lead_id, "1001");
            assert_eq!(result.data[0].phone_number, "3001234567");
        }
    }

    #[tokio::test]
    async fn test_fallback_results_are_idempotent() {
        let dialer = down_dialer();

        assert_eq!(dialer.agent_status(None).await, dialer.agent_status(None).await);
        assert_eq!(
            dialer.call_log(&CallLogQuery::default()).await,
            dialer.call_log(&CallLogQuery::default()).await
        );
        assert_eq!(
            dialer.fetch_records("campaign_stats", &Params::new()).await,
            dialer.fetch_records("campaign_stats", &Params::new()).await
        );
    }

    #[tokio::test]
    async fn test_every_operation_serves_fallback_when_server_is_down() {
        let dialer = down_dialer();

        let agents = dialer.agent_status(Some("agent001")).await;
        assert!(!agents.is_live());
        assert_eq!(agents.data.len(), 2);

        assert_eq!(dialer.logged_in_agents(None).await.data.len(), 2);
        assert_eq!(dialer.campaign_stats(None).await.data[0].campaign_id, "VENTAS");
        assert_eq!(dialer.call_log(&CallLogQuery::default()).await.data.len(), 2);

        let campaign = dialer.campaign_detail("VENTAS").await;
        assert_eq!(campaign.source, Source::Simulated);
        assert_eq!(campaign.data.map(|c| c.campaign_id).as_deref(), Some("VENTAS"));

        let outcomes = [
            dialer.update_lead("1001", LeadUpdate::default()).await,
            dialer
                .originate_call(&OriginateRequest {
                    phone_number: "3001234567".into(),
                    user: "agent001".into(),
                    ..OriginateRequest::default()
                })
                .await,
            dialer.pause_agent("agent001", Some("BREAK")).await,
            dialer.unpause_agent("agent001").await,
        ];
        for outcome in outcomes {
            assert_eq!(outcome.source, Source::Simulated);
            assert!(outcome.data.is_success());
        }
    }

    #[tokio::test]
    async fn test_fetch_records_unknown_function_falls_back_to_empty() {
        let result = down_dialer().fetch_records("agent_teleport", &Params::new()).await;

        assert_eq!(result.source, Source::Simulated);
        assert!(result.data.is_empty());
    }

    #[tokio::test]
    async fn test_live_empty_body_is_live_and_empty() {
        let dialer = Dialer::with_transport(RecordingTransport::new(""));

        let result = dialer.agent_status(None).await;

        assert_eq!(result, Sourced::live(Vec::new()));
    }

    #[tokio::test]
    async fn test_operations_send_expected_parameters() {
        let transport = RecordingTransport::new("status|message\nSUCCESS|ok\n");
        let dialer = Dialer::with_transport(transport.clone());

        dialer
            .call_log(&CallLogQuery {
                user: Some("agent001".into()),
                date: Some("2024-01-15".into()),
                campaign_id: None,
            })
            .await;
        let (function, params) = transport.last_call();
        assert_eq!(function, "call_log");
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![("agent_user", "agent001"), ("date", "2024-01-15")]
        );

        let outcome = dialer
            .update_lead(
                "1001",
                LeadUpdate {
                    status: Some("SALE".into()),
                    user: Some("agent002".into()),
                    ..LeadUpdate::default()
                },
            )
            .await;
        assert!(outcome.is_live());
        assert!(outcome.data.is_success());
        let (function, params) = transport.last_call();
        assert_eq!(function, "update_lead");
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![("lead_id", "1001"), ("status", "SALE"), ("owner", "agent002")]
        );
        assert_eq!(params.get("user"), None);

        dialer.pause_agent("agent001", None).await;
        let (function, params) = transport.last_call();
        assert_eq!(function, "agent_pause");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("agent_user", "agent001")]);
    }

    #[tokio::test]
    async fn test_live_agent_status_over_http() {
        let server = MockServer::start().await;
        let body = "User|FullName|Status|CampaignId|CallsToday|TalkTime\n\
                    agent007|Ana Lopez|PAUSED|SOPORTE|12|3600\n";

        Mock::given(method("GET"))
            .and(path("/api/agent_status"))
            .and(query_param("function", "agent_status"))
            .and(query_param("source", "CCD_CRM"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let config = DialerConfig::default().with_base_url(server.uri());
        let dialer = Dialer::new(&config).unwrap();

        let result = dialer.agent_status(None).await;

        assert!(result.is_live());
        assert_eq!(result.data.len(), 1);
        let agent = &result.data[0];
        assert_eq!(agent.user, "agent007");
        assert_eq!(agent.full_name, "Ana Lopez");
        assert_eq!(agent.status, AgentStatus::Paused);
        assert_eq!(agent.calls_today, 12);
        assert_eq!(agent.talk_time, 3600);
        assert_eq!(agent.server_ip, "");
    }

    #[tokio::test]
    async fn test_live_and_simulated_agents_have_the_same_shape() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/agent_status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("user|status|calls_today\nagent009|READY|3\n"),
            )
            .mount(&server)
            .await;

        let config = DialerConfig::default().with_base_url(server.uri());
        let live = Dialer::new(&config).unwrap().agent_status(None).await;
        let simulated = down_dialer().agent_status(None).await;

        assert!(live.is_live());
        assert!(!simulated.is_live());

        let live_value = serde_json::to_value(&live.data[0]).unwrap();
        let simulated_value = serde_json::to_value(&simulated.data[0]).unwrap();
        assert_eq!(object_keys(&live_value), object_keys(&simulated_value));
    }

    #[tokio::test]
    async fn test_server_error_serves_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/lead_search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let config = DialerConfig::default().with_base_url(server.uri());
        let result = Dialer::new(&config)
            .unwrap()
            .lead_search("5551234567")
            .await;

        assert_eq!(result.source, Source::Simulated);
        assert_eq!(result.data[0].lead_id, "1001");
    }

    #[tokio::test]
    async fn test_rejected_write_is_live_and_unsuccessful() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/update_lead"))
            .and(query_param("lead_id", "1001"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("ERROR: update_lead NO MATCHES FOUND IN THE SYSTEM - 1001"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = DialerConfig::default().with_base_url(server.uri());
        let result = Dialer::new(&config)
            .unwrap()
            .update_lead(
                "1001",
                LeadUpdate {
                    status: Some("SALE".into()),
                    ..LeadUpdate::default()
                },
            )
            .await;

        assert_eq!(result.source, Source::Live);
        assert!(!result.data.is_success());
        assert_eq!(result.data.status, "ERROR");
        assert!(result.data.message.contains("NO MATCHES FOUND"));
    }

    #[tokio::test]
    async fn test_vendor_error_on_read_is_live_and_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/lead_search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("ERROR: lead_search NO RESULTS FOUND"),
            )
            .mount(&server)
            .await;

        let config = DialerConfig::default().with_base_url(server.uri());
        let result = Dialer::new(&config).unwrap().lead_search("5550000000").await;

        assert_eq!(result, Sourced::live(Vec::new()));
    }

    #[tokio::test]
    async fn test_unconfigured_dialer_serves_fallback() {
        let dialer = Dialer::new(&DialerConfig::default()).unwrap();

        let result = dialer.campaign_stats(Some("VENTAS")).await;

        assert_eq!(result.source, Source::Simulated);
        assert_eq!(result.data[0].calls_today, 1250);
    }

    #[tokio::test]
    async fn test_agent_status_feed_serves_fallback_snapshot() {
        let feed = down_dialer().agent_status_feed(Duration::from_secs(60));

        let snapshot = feed.get().await;

        assert_eq!(snapshot.seq, 1);
        assert_eq!(snapshot.value.source, Source::Simulated);
        assert_eq!(snapshot.value.data.len(), 2);
    }
}
