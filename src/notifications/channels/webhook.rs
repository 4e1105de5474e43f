//! Generic JSON webhook channel
//!
//! Each notification becomes one `POST` with this body:
//!
//! ```json
//! {
//!   "summary": "Found 2 available appointment slot(s)!",
//!   "count": 2,
//!   "slots": [
//!     {"day_label": "28 novembre", "time_label": "11:15", "location_label": "IRM CANOPIA"},
//!     {"day_label": "29 novembre", "time_label": "09:30"}
//!   ],
//!   "sent_at": "2025-11-03T12:05:00+01:00"
//! }
//! ```
//!
//! Transport errors and 5xx answers are retried with exponential backoff;
//! 4xx answers are not.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::models::SlotDescriptor;
use crate::notifications::Notification;

/// Webhook channel configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>`
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Retries after the first attempt
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each one after
    #[serde(default = "default_backoff")]
    pub initial_backoff_ms: u64,
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_backoff() -> u64 {
    1000
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("url", &self.url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .finish()
    }
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bearer_token: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            initial_backoff_ms: default_backoff(),
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Delay before retry number `retry` (1-based)
    fn backoff(&self, retry: u32) -> Duration {
        let factor = 2_u64.saturating_pow(retry.saturating_sub(1));
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }

    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.url).map_err(|e| format!("Webhook URL is invalid: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("Webhook URL must use http or https, got {}", url.scheme()));
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    summary: &'a str,
    count: usize,
    slots: &'a [SlotDescriptor],
    sent_at: String,
}

impl<'a> From<&'a Notification> for WebhookPayload<'a> {
    fn from(notification: &'a Notification) -> Self {
        Self {
            summary: &notification.summary,
            count: notification.count,
            slots: &notification.slots,
            sent_at: notification.created_at.to_rfc3339(),
        }
    }
}

/// Webhook notification channel
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Channel with default timeout and retries
    pub fn from_url(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn post_once(&self, payload: &WebhookPayload<'_>) -> ChannelResult<()> {
        let mut request = self.client.post(&self.config.url).json(payload);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// Post with retries, returning the attempts made alongside the result
    async fn post_with_retry(&self, payload: &WebhookPayload<'_>) -> (u32, ChannelResult<()>) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.post_once(payload).await {
                Ok(()) => return (attempt, Ok(())),
                Err(e) if e.is_transient() && attempt <= self.config.max_retries => {
                    let delay = self.config.backoff(attempt);
                    tracing::warn!(
                        url = %self.config.url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Webhook delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return (attempt, Err(e)),
            }
        }
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, notification: &Notification) -> ChannelResult<DeliveryStatus> {
        let payload = WebhookPayload::from(notification);

        let (attempts, result) = self.post_with_retry(&payload).await;
        let status = match result {
            Ok(()) => {
                tracing::debug!(url = %self.config.url, attempts, "Webhook accepted");
                DeliveryStatus::delivered(self.name()).with_detail(self.config.url.clone())
            }
            Err(e) => DeliveryStatus::failed(self.name(), e.to_string()),
        };

        Ok(status.with_attempts(attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AvailabilityResult;

    #[test]
    fn test_webhook_config_validation() {
        assert!(WebhookConfig::new("https://hooks.example.com/slots").validate().is_ok());
        assert!(WebhookConfig::new("").validate().is_err());
        assert!(WebhookConfig::new("hooks.example.com/slots").validate().is_err());
        assert!(WebhookConfig::new("ftp://hooks.example.com").validate().is_err());
        assert!(WebhookConfig::new("https://hooks.example.com")
            .with_timeout(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_backoff_doubles() {
        let config = WebhookConfig::new("https://hooks.example.com")
            .with_initial_backoff(Duration::from_millis(250));
        assert_eq!(config.backoff(1), Duration::from_millis(250));
        assert_eq!(config.backoff(2), Duration::from_millis(500));
        assert_eq!(config.backoff(4), Duration::from_secs(2));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = WebhookConfig::new("https://hooks.example.com").with_bearer_token("s3cr3t");
        assert!(!format!("{config:?}").contains("s3cr3t"));
    }

    #[test]
    fn test_payload_shape() {
        let result = AvailabilityResult::from_slots(vec![
            SlotDescriptor::new("28 novembre", "11:15").with_location("IRM CANOPIA"),
            SlotDescriptor::new("29 novembre", "09:30"),
        ]);
        let notification = Notification::new("Found 2 available appointment slot(s)!", &result);

        let payload = serde_json::to_value(WebhookPayload::from(&notification)).unwrap();

        assert_eq!(payload["summary"], "Found 2 available appointment slot(s)!");
        assert_eq!(payload["count"], 2);
        assert_eq!(payload["slots"][0]["day_label"], "28 novembre");
        assert_eq!(payload["slots"][0]["location_label"], "IRM CANOPIA");
        assert!(payload["slots"][1].get("location_label").is_none());
        assert!(payload["sent_at"].is_string());
    }
}
