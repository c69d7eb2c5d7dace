//! Telephony adapter for the CCD CRM.
//!
//! Builds on [`ccd_core`] to talk to a Vicidial-style telephony server over
//! HTTP. Every query and action is a method on [`Dialer`]; results are typed
//! records tagged with where they came from. When the server cannot be
//! reached the adapter answers from static fallback data instead of failing,
//! so screens keep rendering.
//!
//! # Key Components
//!
//! - **Transport**: [`Transport`] trait and the [`HttpTransport`]
//!   implementation, which build the request URL and return raw bodies
//! - **Adapter**: [`Dialer`] with one typed method per server function,
//!   each returning [`Sourced`] data
//! - **Feeds**: [`Feed`] shares one cached, single-flight polling loop
//!   between every consumer of the same query
//!
//! # Example
//!
//! ```no_run
//! use ccd::{Dialer, Source};
//! use ccd_core::DialerConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DialerConfig::from_env()?;
//! let dialer = Dialer::new(&config)?;
//!
//! let leads = dialer.lead_search("3001234567").await;
//! if leads.source == Source::Simulated {
//!     eprintln!("telephony server unreachable, showing sample data");
//! }
//! for lead in &leads.data {
//!     println!("{} {}", lead.lead_id, lead.full_name());
//! }
//! # Ok(())
//! # }
//! ```

mod dialer;
mod feed;
mod transport;

pub use dialer::{CallLogQuery, Dialer, LeadUpdate, OriginateRequest, Source, Sourced};
pub use feed::{Feed, MIN_POLL_INTERVAL, PollHandle, Snapshot};
pub use transport::{HttpTransport, Params, Transport, TransportError, build_url};
