//! Core data structures for the slotwatch agent
//!
//! This module defines the main data types used throughout the application:
//! the session credentials, the canonical availability model and the
//! per-cycle outcome reported by the poller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::utils::error::{FailureKind, PollError};
use crate::utils::mask_secret;

/// Placeholder values shipped in sample configuration files
pub const PLACEHOLDER_SENTINELS: &[&str] = &[
    "your_session_key_here",
    "your_user_session_key_here",
    "your_aspnet_cookies_here",
];

/// Value the site issues for `UserSessionKey` when none is bound to the login
pub const DEFAULT_USER_SESSION_KEY: &str = "N";

/// The three-cookie authentication bundle required by the scheduling API
///
/// A credential set is never edited in place: a successful re-login produces
/// a new value which replaces the old one as a whole.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    session_key: String,
    user_session_key: String,
    aspnet_cookies: String,
}

impl CredentialSet {
    /// Create a new credential set
    pub fn new(
        session_key: impl Into<String>,
        user_session_key: impl Into<String>,
        aspnet_cookies: impl Into<String>,
    ) -> Self {
        Self {
            session_key: session_key.into(),
            user_session_key: user_session_key.into(),
            aspnet_cookies: aspnet_cookies.into(),
        }
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn user_session_key(&self) -> &str {
        &self.user_session_key
    }

    pub fn aspnet_cookies(&self) -> &str {
        &self.aspnet_cookies
    }

    /// Check that all three fields are present and none is a placeholder
    pub fn is_valid(&self) -> bool {
        [
            &self.session_key,
            &self.user_session_key,
            &self.aspnet_cookies,
        ]
        .iter()
        .all(|value| {
            let value = value.trim();
            !value.is_empty() && !PLACEHOLDER_SENTINELS.contains(&value)
        })
    }

    /// Compose the `Cookie` header value sent with availability requests
    pub fn cookie_header(&self) -> String {
        format!(
            "SessionKey={}; UserSessionKey={}; .AspNet.Cookies={}",
            self.session_key, self.user_session_key, self.aspnet_cookies
        )
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("session_key", &mask_secret(&self.session_key))
            .field("user_session_key", &self.user_session_key)
            .field("aspnet_cookies", &mask_secret(&self.aspnet_cookies))
            .finish()
    }
}

/// One bookable slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    pub day_label: String,
    pub time_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_label: Option<String>,
}

impl SlotDescriptor {
    pub fn new(day_label: impl Into<String>, time_label: impl Into<String>) -> Self {
        Self {
            day_label: day_label.into(),
            time_label: time_label.into(),
            location_label: None,
        }
    }

    /// Attach a location label
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location_label = Some(location.into());
        self
    }
}

impl fmt::Display for SlotDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day_label, self.time_label)
    }
}

/// Canonical result of normalizing an availability response
///
/// `count` is always derived from `slots`, so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityResult {
    count: usize,
    slots: Vec<SlotDescriptor>,
}

impl AvailabilityResult {
    /// Build a result from the surviving, field-complete slots
    pub fn from_slots(slots: Vec<SlotDescriptor>) -> Self {
        Self {
            count: slots.len(),
            slots,
        }
    }

    /// An empty result
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn slots(&self) -> &[SlotDescriptor] {
        &self.slots
    }

    /// Whether at least one slot is open
    pub fn is_available(&self) -> bool {
        self.count > 0
    }

    /// The `"<day> <time>"` line of every slot, in original order
    pub fn slot_lines(&self) -> Vec<String> {
        self.slots.iter().map(ToString::to_string).collect()
    }
}

/// Terminal state of one poll cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// Slots were found
    Found(AvailabilityResult),
    /// Request succeeded but nothing is open
    NotFound,
    /// The cycle failed; the agent keeps running
    Error(PollError),
}

impl CycleOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Failure kind if the cycle ended in error
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Error(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NotFound => "not_found",
            Self::Error(_) => "error",
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(result) => write!(f, "found {} slot(s)", result.count()),
            Self::NotFound => write!(f, "no slots available"),
            Self::Error(e) => write!(f, "error ({}): {e}", e.kind()),
        }
    }
}

/// What the poller reports back to the scheduler for one cycle
#[derive(Debug)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Whether the cycle went through the re-login branch
    pub relogin_attempted: bool,
    /// A 200 body could not be decoded and was read as no availability
    pub degraded_body: bool,
    pub elapsed: Duration,
}

/// In-process cycle statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleStats {
    pub cycles: u64,
    pub found: u64,
    pub not_found: u64,
    pub transport_errors: u64,
    pub authentication_errors: u64,
    /// Undecodable response bodies, degraded or surfaced as errors
    pub degraded_bodies: u64,
    pub relogins: u64,
}

impl CycleStats {
    /// Record a finished cycle
    pub fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if report.relogin_attempted {
            self.relogins += 1;
        }
        if report.degraded_body {
            self.degraded_bodies += 1;
        }
        match report.outcome.failure_kind() {
            None if report.outcome.is_found() => self.found += 1,
            None => self.not_found += 1,
            Some(FailureKind::Transport) => self.transport_errors += 1,
            Some(FailureKind::Authentication) => self.authentication_errors += 1,
            Some(FailureKind::ResponseFormat) => self.degraded_bodies += 1,
        }
    }

    /// Total failed cycles
    pub fn errors(&self) -> u64 {
        self.transport_errors + self.authentication_errors
    }

    /// Calculate error rate as percentage
    pub fn error_rate(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            (self.errors() as f64 / self.cycles as f64) * 100.0
        }
    }
}
