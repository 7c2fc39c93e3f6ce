// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tourbook client: REST glue for a tour-booking API, built around the
//! authenticated-request lifecycle coordinator.
//!
//! The interesting part is the session core ([`session`]): the request
//! gate intercepts every authenticated call, detects an expired access
//! token *before* the request leaves the process, suspends the caller,
//! asks the user whether to continue the session, refreshes credentials,
//! and resumes exactly the calls that were blocked.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod prompt;
pub mod session;
#[cfg(test)]
pub mod test_support;

pub use crate::config::ClientConfig;
pub use crate::error::{GateError, RefreshError};
pub use crate::events::{LogoutReason, SessionEvent};
pub use crate::session::Session;
