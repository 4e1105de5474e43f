//! Slot notifications
//!
//! The poller hands a found [`AvailabilityResult`] to a [`Notifier`] exactly
//! once per cycle. Delivery problems never travel back: the notifier logs and
//! swallows every failure so a broken channel cannot end a cycle in error.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │      NotificationService (Notifier)        │
//! │  - Builds one Notification per cycle       │
//! │  - Fans out to every channel               │
//! │  - Logs and swallows delivery failures     │
//! └────────────────────────────────────────────┘
//!                     │
//!             ┌───────┴───────┐
//!             ▼               ▼
//!       ┌─────────┐     ┌─────────┐
//!       │  Slack  │     │ Webhook │
//!       │ Channel │     │ Channel │
//!       └─────────┘     └─────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use slotwatch::notifications::{NotificationService, SlackChannel, SlackConfig};
//!
//! let mut service = NotificationService::new();
//! service.add_channel(Box::new(SlackChannel::new(SlackConfig::new(token, channel_id))?));
//!
//! service.send("Found 2 available appointment slot(s)!", &result).await;
//! ```

pub mod channels;
mod service;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::{AvailabilityResult, SlotDescriptor};

// Re-exports
pub use channels::slack::{SlackChannel, SlackConfig};
pub use channels::webhook::{WebhookChannel, WebhookConfig};
pub use channels::{Channel, ChannelError, DeliveryStatus};
pub use service::NotificationService;

/// Delivers the per-cycle summary of found slots
///
/// Implementations must handle every failure internally.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, summary: &str, result: &AvailabilityResult);
}

/// Notification payload shared by all channels
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// One-line summary, e.g. `Found 2 available appointment slot(s)!`
    pub summary: String,
    /// Number of open slots
    pub count: usize,
    /// Slots in the order the API returned them
    pub slots: Vec<SlotDescriptor>,
    /// When the notification was built
    pub created_at: DateTime<Local>,
}

impl Notification {
    /// Create a notification from a normalized result
    pub fn new(summary: impl Into<String>, result: &AvailabilityResult) -> Self {
        Self {
            summary: summary.into(),
            count: result.count(),
            slots: result.slots().to_vec(),
            created_at: Local::now(),
        }
    }

    /// `"<day> <time>"` lines, at most `limit`, plus how many were left out
    pub fn slot_lines(&self, limit: usize) -> (Vec<String>, usize) {
        let lines = self.slots.iter().take(limit).map(ToString::to_string).collect();
        (lines, self.slots.len().saturating_sub(limit))
    }

    /// Format notification for plain-text display
    pub fn format_message(&self) -> String {
        let mut output = format!(
            "{}\nSlots found: {}\nTime: {}",
            self.summary,
            self.count,
            self.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        for slot in &self.slots {
            output.push_str(&format!("\n  - {slot}"));
        }
        output
    }
}
