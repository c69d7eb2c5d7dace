//! CLI command implementations for `ccd`.
//!
//! - **`query`**: read-only lookups (agents, campaigns, leads, calls)
//! - **`action`**: state changes (lead updates, outbound calls, pauses)
//! - **`watch`**: follows agent states through a shared polling feed
//!
//! Each module exports `clap::Args` structs and async functions taking the
//! [`ccd::Dialer`] built by `main`.

pub mod action;
pub mod query;
pub mod watch;
