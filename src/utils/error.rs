//! Error types for the slotwatch agent
//!
//! This module defines the domain error types produced by the poller and
//! its collaborators. Steady-state errors are recovered at cycle granularity;
//! none of these types terminate the process on their own.

use thiserror::Error;

/// Failure kind of a poll cycle
///
/// Every [`PollError`] maps onto exactly one kind, which is what the
/// scheduler's statistics and the log lines are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network, timeout or unexpected HTTP status
    Transport,
    /// Session rejected and could not be recovered within the cycle
    Authentication,
    /// Body could not be interpreted
    ResponseFormat,
}

impl FailureKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Authentication => "authentication",
            Self::ResponseFormat => "response_format",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can end a poll cycle
#[derive(Error, Debug)]
pub enum PollError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Server answered with a status other than 200, 401 or 403
    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),

    /// Session rejected (401/403) and no recovery was possible in this cycle
    #[error("Authentication rejected with HTTP {status} (relogin attempted: {relogin_attempted})")]
    Authentication { status: u16, relogin_attempted: bool },

    /// Availability endpoint is not an absolute http(s) URL
    #[error("Invalid availability URL: {0}")]
    InvalidUrl(String),

    /// Stored credentials cannot be encoded as a header
    #[error("Credentials cannot be sent as a cookie: {0}")]
    InvalidCookie(String),

    /// Re-login was attempted and failed
    #[error("Re-login failed: {0}")]
    Relogin(#[from] AuthError),

    /// Body could not be decoded at all
    #[error("Malformed response: {0}")]
    ResponseFormat(String),
}

impl PollError {
    /// Classify the error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::Timeout | Self::UnexpectedStatus(_) | Self::InvalidUrl(_) => {
                FailureKind::Transport
            }
            Self::Authentication { .. } | Self::InvalidCookie(_) | Self::Relogin(_) => {
                FailureKind::Authentication
            }
            Self::ResponseFormat(_) => FailureKind::ResponseFormat,
        }
    }
}

impl From<reqwest::Error> for PollError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

/// Errors that can occur during the login flow
#[derive(Error, Debug)]
pub enum AuthError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Sign-in page could not be loaded
    #[error("Failed to load login page: HTTP {0}")]
    LoginPageStatus(u16),

    /// Hidden ASP.NET form fields missing from the sign-in page
    #[error("Could not extract form field {0} from login page")]
    MissingFormField(&'static str),

    /// Form submission was rejected
    #[error("Login request failed: HTTP {0}")]
    Rejected(u16),

    /// Login completed but the session cookies were not issued
    #[error("Session cookies missing after login: {0}")]
    MissingCookies(String),

    /// Invalid login URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors that can occur while resolving exam and location names
#[derive(Error, Debug)]
pub enum ResolveError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Resolver endpoint returned HTTP {0}")]
    Status(u16),

    /// Response did not have the expected shape
    #[error("Unexpected response format: {0}")]
    UnexpectedFormat(String),

    /// No candidate matches the requested name
    #[error("No {kind} found matching '{name}'")]
    NotFound { kind: &'static str, name: String },
}
