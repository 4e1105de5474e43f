//! Slack notification channel
//!
//! Posts found slots to a Slack channel through the Web API
//! (`chat.postMessage`) using a bot token.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::notifications::Notification;
use crate::utils::{mask_secret, truncate_text};

/// Slack Web API base URL
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Slots listed in the message before collapsing into "...and N more"
const MAX_LISTED_SLOTS: usize = 5;

/// Slack rejects section text longer than this
const MAX_SECTION_CHARS: usize = 3000;

const HEADER_TEXT: &str = "🏥 IRM Appointment Slots Available!";

/// Slack channel configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot User OAuth token (`xoxb-...`)
    pub token: String,
    /// Target channel id
    pub channel_id: String,
    /// Web API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout() -> u64 {
    10
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &mask_secret(&self.token))
            .field("channel_id", &self.channel_id)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SlackConfig {
    /// Create a new Slack configuration
    pub fn new(token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            channel_id: channel_id.into(),
            api_base: default_api_base(),
            timeout_secs: default_timeout(),
        }
    }

    /// Point the channel at another Web API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("Slack token cannot be empty".to_string());
        }
        if self.channel_id.trim().is_empty() {
            return Err("Slack channel id cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Subset of the `chat.postMessage` response we care about
#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// Slack notification channel
pub struct SlackChannel {
    config: SlackConfig,
    client: Client,
}

impl SlackChannel {
    /// Create a new Slack channel
    pub fn new(config: SlackConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn channel_id(&self) -> &str {
        &self.config.channel_id
    }

    /// Build the Block Kit layout for a notification
    fn build_blocks(&self, notification: &Notification) -> serde_json::Value {
        let mut blocks = vec![
            serde_json::json!({
                "type": "header",
                "text": {"type": "plain_text", "text": HEADER_TEXT, "emoji": true}
            }),
            serde_json::json!({
                "type": "section",
                "text": {"type": "mrkdwn", "text": format!("*{}*", notification.summary)}
            }),
            serde_json::json!({
                "type": "section",
                "fields": [
                    {"type": "mrkdwn", "text": format!("*Slots Found:*\n{}", notification.count)},
                    {
                        "type": "mrkdwn",
                        "text": format!("*Time:*\n{}", notification.created_at.format("%Y-%m-%d %H:%M:%S"))
                    }
                ]
            }),
        ];

        let (lines, remaining) = notification.slot_lines(MAX_LISTED_SLOTS);
        if !lines.is_empty() {
            let mut text = lines
                .iter()
                .map(|line| format!("• {line}"))
                .collect::<Vec<_>>()
                .join("\n");
            if remaining > 0 {
                text.push_str(&format!("\n_...and {remaining} more_"));
            }

            blocks.push(serde_json::json!({
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": truncate_text(&format!("*Available Slots:*\n{text}"), MAX_SECTION_CHARS)
                }
            }));
        }

        serde_json::Value::Array(blocks)
    }

    fn build_payload(&self, notification: &Notification) -> serde_json::Value {
        serde_json::json!({
            "channel": self.config.channel_id,
            "text": notification.summary,
            "blocks": self.build_blocks(notification),
        })
    }
}

#[async_trait]
impl Channel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, notification: &Notification) -> ChannelResult<DeliveryStatus> {
        let url = format!("{}/chat.postMessage", self.config.api_base.trim_end_matches('/'));
        let payload = self.build_payload(notification);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ChannelError::Unavailable("Slack rate limit hit (HTTP 429)".to_string()));
        }
        if !status.is_success() {
            return Ok(DeliveryStatus::failed(self.name(), format!("HTTP {status}")));
        }

        let body: PostMessageResponse = response.json().await?;
        if body.ok {
            tracing::debug!(channel_id = %self.config.channel_id, ts = ?body.ts, "Slack message posted");
            let status = DeliveryStatus::delivered(self.name());
            Ok(match body.ts {
                Some(ts) => status.with_detail(format!("ts={ts}")),
                None => status,
            })
        } else {
            let reason = body.error.unwrap_or_else(|| "unknown_error".to_string());
            tracing::error!(channel_id = %self.config.channel_id, error = %reason, "Slack API returned ok=false");
            Ok(DeliveryStatus::failed(self.name(), reason))
        }
    }
}
