//! Core types for the CCD telephony adapter.
//!
//! This crate holds everything about the telephony server that does not need
//! a network: the pipe-delimited wire format, the declarative mapping from
//! wire records to typed records, the function catalogue, the static fallback
//! data served when the server is unreachable, and adapter configuration.
//!
//! # Key Components
//!
//! - **Wire format**: [`wire::parse`] turns a response body into ordered
//!   [`Record`]s
//! - **Mapping**: [`FromRecord`] types declare a [`FieldSpec`] table consumed
//!   by one generic projection
//! - **Fallback**: [`fallback::records`] serves canned data keyed by function
//!   name
//! - **Configuration**: [`DialerConfig`] with file and environment resolution
//!
//! # Example
//!
//! ```
//! use ccd_core::{Agent, AgentStatus, FromRecord, wire};
//!
//! let records = wire::parse("User|FullName|status|CallsToday\nagent001|Maria Garcia|INCALL|45\n");
//! let agents = Agent::from_records(&records);
//!
//! assert_eq!(agents[0].user, "agent001");
//! assert_eq!(agents[0].status, AgentStatus::InCall);
//! assert_eq!(agents[0].calls_today, 45);
//! ```

mod config;
pub mod fallback;
mod function;
pub mod mapping;
mod model;
pub mod wire;

pub use config::{CONFIG_FILE_NAME, ConfigError, DEFAULT_API_USER, DEFAULT_SOURCE_TAG, DialerConfig};
pub use function::{Function, UnknownFunction};
pub use mapping::{Coerce, FieldSpec, FromRecord, Projection};
pub use model::{
    ActionOutcome, Agent, AgentStatus, CallRecord, CallStatus, Campaign, CampaignStats, Lead,
};
pub use wire::Record;
