//! Unified error handling for the slotwatch crate
//!
//! Domain errors live next to the code that raises them and are collected
//! here into one [`Error`] for callers that do not care which layer failed.
//!
//! - [`SlotwatchErrorTrait`] - Recoverability and category of an error
//! - [`ErrorCategory`] - Coarse classification used in logs
//! - [`Error`] - Unified error enum
//!
//! Only [`ErrorCategory::Config`] errors and a failed startup login are allowed
//! to end the process; everything else is logged and the next cycle runs.

use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::notifications::channels::ChannelError;
pub use crate::utils::error::{AuthError, FailureKind, PollError, ResolveError};

/// Common trait for slotwatch error types
pub trait SlotwatchErrorTrait: std::error::Error {
    /// Whether the watcher can keep running after this error
    fn is_recoverable(&self) -> bool;

    /// Get the error category
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Timeouts, refused connections, unexpected HTTP statuses
    Network,
    /// Session rejected or login failed
    Authentication,
    /// Response bodies that could not be decoded
    Parsing,
    /// Missing or invalid settings, unresolvable names
    Config,
    /// Slack or webhook delivery
    Notification,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::Parsing => "parsing",
            Self::Config => "config",
            Self::Notification => "notification",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the slotwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Poll cycle errors
    #[error("Poll error: {0}")]
    Poll(#[from] PollError),

    /// Login flow errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Exam/location resolution errors
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Notification channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl SlotwatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Poll(e) => e.is_recoverable(),
            Self::Auth(e) => e.is_recoverable(),
            Self::Resolve(e) => e.is_recoverable(),
            Self::Channel(e) => e.is_recoverable(),
            Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Poll(e) => e.category(),
            Self::Auth(e) => e.category(),
            Self::Resolve(e) => e.category(),
            Self::Channel(e) => e.category(),
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl SlotwatchErrorTrait for PollError {
    /// A failed cycle never stops the watcher; a bad endpoint stops it from starting
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl(_) => ErrorCategory::Config,
            _ => self.kind().into(),
        }
    }
}

impl SlotwatchErrorTrait for AuthError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl(_) => ErrorCategory::Config,
            Self::Http(_) | Self::LoginPageStatus(_) => ErrorCategory::Network,
            _ => ErrorCategory::Authentication,
        }
    }
}

impl SlotwatchErrorTrait for ResolveError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::Status(_) => ErrorCategory::Network,
            Self::UnexpectedFormat(_) => ErrorCategory::Parsing,
            Self::NotFound { .. } => ErrorCategory::Config,
        }
    }
}

impl SlotwatchErrorTrait for ChannelError {
    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig(_) => ErrorCategory::Config,
            _ => ErrorCategory::Notification,
        }
    }
}

impl From<FailureKind> for ErrorCategory {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Transport => Self::Network,
            FailureKind::Authentication => Self::Authentication,
            FailureKind::ResponseFormat => Self::Parsing,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid TOML: {err}"))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let err = Error::Poll(PollError::Timeout);
        assert_eq!(err.category(), ErrorCategory::Network);

        let err = Error::Poll(PollError::Authentication {
            status: 401,
            relogin_attempted: true,
        });
        assert_eq!(err.category(), ErrorCategory::Authentication);

        let err = Error::Poll(PollError::ResponseFormat("truncated".into()));
        assert_eq!(err.category(), ErrorCategory::Parsing);

        let err = Error::Resolve(ResolveError::Status(502));
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::Poll(PollError::Timeout).is_recoverable());
        assert!(Error::Auth(AuthError::Rejected(500)).is_recoverable());
        assert!(!Error::config("missing API_URL").is_recoverable());
    }

    #[test]
    fn test_resolve_not_found_is_config() {
        let err: Error = ResolveError::NotFound {
            kind: "location",
            name: "CANOPIA".into(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_auth_error_classification() {
        assert_eq!(AuthError::Rejected(401).category(), ErrorCategory::Authentication);
        assert_eq!(AuthError::LoginPageStatus(503).category(), ErrorCategory::Network);
        assert!(!AuthError::InvalidUrl("relative URL".into()).is_recoverable());
    }

    #[test]
    fn test_channel_error_recoverable_when_transient() {
        let err = Error::Channel(ChannelError::Unavailable("429".into()));
        assert!(err.is_recoverable());
        assert_eq!(err.category(), ErrorCategory::Notification);

        let err = ChannelError::Api("channel_not_found".into());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_invalid_endpoint_is_config() {
        let err = Error::Poll(PollError::InvalidUrl("not a url".into()));
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Notification.to_string(), "notification");
    }
}
