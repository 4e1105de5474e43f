use async_trait::async_trait;

use super::channels::Channel;
use super::{Notification, Notifier};
use crate::error::SlotwatchErrorTrait;
use crate::models::AvailabilityResult;

/// Fans notifications out to every registered channel
pub struct NotificationService {
    channels: Vec<Box<dyn Channel>>,
}

impl NotificationService {
    /// Create a service with no channels
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Register a delivery channel
    pub fn add_channel(&mut self, channel: Box<dyn Channel>) {
        tracing::debug!(channel = channel.name(), "Notification channel registered");
        self.channels.push(channel);
    }

    /// Builder-style variant of [`add_channel`](Self::add_channel)
    pub fn with_channel(mut self, channel: Box<dyn Channel>) -> Self {
        self.add_channel(channel);
        self
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn send(&self, summary: &str, result: &AvailabilityResult) {
        if self.channels.is_empty() {
            tracing::warn!("No notification channel configured, skipping notification");
            return;
        }

        let notification = Notification::new(summary, result);

        for channel in &self.channels {
            match channel.send(&notification).await {
                Ok(status) if status.success => {
                    tracing::info!(channel = channel.name(), %status, "Notification delivered");
                }
                Ok(status) => {
                    tracing::error!(channel = channel.name(), %status, "Notification not delivered");
                }
                Err(e) => {
                    tracing::error!(
                        channel = channel.name(),
                        category = %e.category(),
                        retryable = e.is_recoverable(),
                        error = %e,
                        "Failed to send notification"
                    );
                }
            }
        }
    }
}
