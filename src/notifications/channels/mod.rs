//! Delivery channels for slot alerts
//!
//! A channel turns one [`Notification`] into one outbound message. Channels
//! report what happened through [`DeliveryStatus`]; an `Err` is reserved for
//! problems the channel could not even classify (client construction,
//! rate limiting, unreadable responses).

pub mod slack;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

use crate::notifications::Notification;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors raised while delivering through a channel
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Transport failure talking to the remote service
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel settings are unusable
    #[error("Invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// Remote service asked us to back off
    #[error("Channel temporarily unavailable: {0}")]
    Unavailable(String),

    /// Remote service answered with an error status
    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Remote API accepted the request but reported a failure
    #[error("API error: {0}")]
    Api(String),
}

impl ChannelError {
    /// Whether sending the same message again may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Unavailable(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::InvalidConfig(_) | Self::Api(_) => false,
        }
    }
}

/// Outcome of handing one notification to one channel
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryStatus {
    pub channel: &'static str,
    pub success: bool,
    /// Remote message id, destination or failure reason
    pub detail: Option<String>,
    /// Requests made, retries included
    pub attempts: u32,
    pub attempted_at: DateTime<Local>,
}

impl DeliveryStatus {
    /// Delivered on the first attempt
    pub fn delivered(channel: &'static str) -> Self {
        Self {
            channel,
            success: true,
            detail: None,
            attempts: 1,
            attempted_at: Local::now(),
        }
    }

    /// Not delivered, with the reason
    pub fn failed(channel: &'static str, reason: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            detail: Some(reason.into()),
            attempts: 1,
            attempted_at: Local::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.success { "delivered" } else { "failed" };
        write!(f, "{}: {state}", self.channel)?;
        if self.attempts > 1 {
            write!(f, " after {} attempts", self.attempts)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// A destination for slot alerts
#[async_trait]
pub trait Channel: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Deliver a notification through this channel
    async fn send(&self, notification: &Notification) -> ChannelResult<DeliveryStatus>;
}
