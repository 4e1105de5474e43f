//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
///
/// These only arise while building a schedule; a running scheduler never
/// fails, whatever its cycles report.
#[derive(Debug)]
pub enum SchedulerError {
    /// Base interval is zero
    ZeroInterval,

    /// Interval value cannot be represented
    InvalidInterval {
        field: String,
        reason: String,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInterval => {
                write!(f, "Poll interval must be greater than 0")
            }
            Self::InvalidInterval { field, reason } => {
                write!(f, "Invalid interval '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid interval error
    pub fn invalid_interval(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
