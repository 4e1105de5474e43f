//! Configuration management for slotwatch
//!
//! This module handles loading and validating configuration from environment
//! variables or a TOML file. Validation reports every missing setting at once
//! so a misconfigured deployment can be fixed in one pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::{LoginCredentials, DEFAULT_LOGIN_URL};
use crate::error::{Error, Result};
use crate::models::CredentialSet;
use crate::poller::QueryTemplate;
use crate::scheduler::JitterSchedule;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Availability endpoint
    pub api: ApiConfig,

    /// What to look for
    pub exam: ExamConfig,

    /// Manually supplied session cookies
    pub session: SessionConfig,

    /// Automated login
    pub login: LoginConfig,

    /// Poll timing
    pub polling: PollingConfig,

    /// Notification channels
    pub notifications: NotificationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Availability endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Full availability endpoint URL
    pub url: String,

    /// Referer sent with availability requests; defaults to the site root
    pub referer: Option<String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Exam and location selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamConfig {
    pub exam_type_id: String,

    /// Exam id; resolved from `exam_name` when absent
    pub exam_id: Option<String>,
    pub exam_name: Option<String>,

    /// Office place id; resolved from `location_name` when absent
    pub location_id: Option<String>,
    pub location_name: Option<String>,

    pub patient_birth_date: String,

    /// Earliest date to search from, defaults to today
    pub min_date: Option<NaiveDate>,
}

/// Session cookies copied from a browser
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub session_key: Option<String>,
    pub user_session_key: Option<String>,
    pub aspnet_cookies: Option<String>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = |value: &Option<String>| value.as_deref().map(crate::utils::mask_secret);
        f.debug_struct("SessionConfig")
            .field("session_key", &masked(&self.session_key))
            .field("user_session_key", &self.user_session_key)
            .field("aspnet_cookies", &masked(&self.aspnet_cookies))
            .finish()
    }
}

/// Automated login configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Log in at startup and whenever the session is rejected
    pub auto_login_enabled: bool,
    pub email: Option<String>,
    pub password: Option<String>,

    /// Booking page visited after sign-in
    pub exam_url: Option<String>,

    /// Sign-in page
    pub login_url: String,
}

impl fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginConfig")
            .field("auto_login_enabled", &self.auto_login_enabled)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("exam_url", &self.exam_url)
            .field("login_url", &self.login_url)
            .finish()
    }
}

/// Poll timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Base delay between cycles in seconds
    pub interval_secs: u64,

    /// Maximum random deviation from the base delay in seconds
    pub jitter_secs: u64,

    /// Stop the watcher once slots are found
    pub stop_on_found: bool,
}

/// Notification configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub slack_token: Option<String>,
    pub slack_channel_id: Option<String>,
    pub webhook_url: Option<String>,
}

impl fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("enabled", &self.enabled)
            .field(
                "slack_token",
                &self.slack_token.as_deref().map(crate::utils::mask_secret),
            )
            .field("slack_channel_id", &self.slack_channel_id)
            .field("webhook_url", &self.webhook_url)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,

    /// Optional plain-text copy of the log
    pub file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            referer: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            auto_login_enabled: false,
            email: None,
            password: None,
            exam_url: None,
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            jitter_secs: 0,
            stop_on_found: true,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slack_token: None,
            slack_channel_id: None,
            webhook_url: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
            file: None,
        }
    }
}

/// How the session is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Cookies are supplied by the user
    ManualCookies,
    /// Cookies are obtained by logging in
    AutoLogin,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManualCookies => write!(f, "manual cookie"),
            Self::AutoLogin => write!(f, "auto-login"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// Empty values count as unset. Malformed numbers and dates are rejected
    /// together in one error.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut invalid = Vec::new();

        let mut parse_secs = |name: &str, default: u64| match get(name) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                invalid.push(format!("{name}={raw} (expected whole seconds)"));
                default
            }),
            None => default,
        };

        let request_timeout_secs = parse_secs("REQUEST_TIMEOUT_SECONDS", 30);
        let interval_secs = parse_secs("POLL_INTERVAL_SECONDS", 60);
        let jitter_secs = parse_secs("POLL_JITTER_SECONDS", 0);

        let min_date = match get("MIN_DATE") {
            Some(raw) => {
                let parsed = parse_date(&raw);
                if parsed.is_none() {
                    invalid.push(format!("MIN_DATE={raw} (expected YYYY-MM-DD)"));
                }
                parsed
            }
            None => None,
        };

        if !invalid.is_empty() {
            return Err(Error::config(format!(
                "Invalid environment variables: {}",
                invalid.join(", ")
            )));
        }

        let defaults = Self::default();

        Ok(Self {
            api: ApiConfig {
                url: get("API_URL").unwrap_or_default(),
                referer: get("API_REFERER"),
                request_timeout_secs,
            },
            exam: ExamConfig {
                exam_type_id: get("EXAM_TYPE_ID").unwrap_or_default(),
                exam_id: get("EXAM_ID"),
                exam_name: get("EXAM_NAME"),
                location_id: get("LOCATION_ID"),
                location_name: get("LOCATION_NAME"),
                patient_birth_date: get("PATIENT_BIRTH_DATE").unwrap_or_default(),
                min_date,
            },
            session: SessionConfig {
                session_key: get("SESSION_KEY"),
                user_session_key: get("USER_SESSION_KEY"),
                aspnet_cookies: get("ASPNET_COOKIES"),
            },
            login: LoginConfig {
                auto_login_enabled: get("AUTO_LOGIN_ENABLED").is_some_and(|v| parse_bool(&v)),
                email: get("EASYDOCT_EMAIL"),
                password: get("EASYDOCT_PASSWORD"),
                exam_url: get("EXAM_URL"),
                login_url: get("LOGIN_URL").unwrap_or(defaults.login.login_url),
            },
            polling: PollingConfig {
                interval_secs,
                jitter_secs,
                stop_on_found: get("STOP_ON_FOUND").map_or(true, |v| parse_bool(&v)),
            },
            notifications: NotificationConfig {
                enabled: get("NOTIFICATIONS_ENABLED").map_or(true, |v| parse_bool(&v)),
                slack_token: get("SLACK_TOKEN"),
                slack_channel_id: get("SLACK_CHANNEL_ID"),
                webhook_url: get("WEBHOOK_URL"),
            },
            logging: LoggingConfig {
                level: get("LOG_LEVEL")
                    .map(|v| v.to_lowercase())
                    .unwrap_or(defaults.logging.level),
                format: get("LOG_FORMAT")
                    .map(|v| v.to_lowercase())
                    .unwrap_or(defaults.logging.format),
                file: get("LOG_FILE").map(PathBuf::from),
            },
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Session mode implied by `login.auto_login_enabled`
    pub fn session_mode(&self) -> SessionMode {
        if self.login.auto_login_enabled {
            SessionMode::AutoLogin
        } else {
            SessionMode::ManualCookies
        }
    }

    /// Validate configuration values
    ///
    /// Missing settings are named by their environment variable.
    pub fn validate(&self) -> Result<()> {
        let mode = self.session_mode();
        let mut missing = Vec::new();

        if self.api.url.trim().is_empty() {
            missing.push("API_URL");
        }
        if self.exam.exam_type_id.trim().is_empty() {
            missing.push("EXAM_TYPE_ID");
        }
        if !non_empty(&self.exam.exam_id) && !non_empty(&self.exam.exam_name) {
            missing.push("EXAM_ID (or EXAM_NAME)");
        }
        if self.exam.patient_birth_date.trim().is_empty() {
            missing.push("PATIENT_BIRTH_DATE");
        }

        match mode {
            SessionMode::AutoLogin => {
                if !non_empty(&self.login.email) {
                    missing.push("EASYDOCT_EMAIL");
                }
                if !non_empty(&self.login.password) {
                    missing.push("EASYDOCT_PASSWORD");
                }
                if !non_empty(&self.login.exam_url) {
                    missing.push("EXAM_URL");
                }
            }
            SessionMode::ManualCookies => {
                if !non_empty(&self.session.session_key) {
                    missing.push("SESSION_KEY");
                }
                if !non_empty(&self.session.user_session_key) {
                    missing.push("USER_SESSION_KEY");
                }
                if !non_empty(&self.session.aspnet_cookies) {
                    missing.push("ASPNET_COOKIES");
                }
            }
        }

        if !missing.is_empty() {
            return Err(Error::config(format!(
                "Missing required settings for {mode} mode: {}",
                missing.join(", ")
            )));
        }

        if url::Url::parse(&self.api.url).is_err() {
            return Err(Error::config(format!("API_URL is not a valid URL: {}", self.api.url)));
        }

        if self.polling.interval_secs == 0 {
            return Err(Error::config("POLL_INTERVAL_SECONDS must be greater than 0"));
        }
        self.schedule()?;

        if self.api.request_timeout_secs == 0 {
            return Err(Error::config("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(Error::config(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Poll schedule built from the polling section
    pub fn schedule(&self) -> Result<JitterSchedule> {
        JitterSchedule::from_secs(self.polling.interval_secs, self.polling.jitter_secs)
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Startup credentials; missing cookies yield an invalid set
    pub fn credentials(&self) -> CredentialSet {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        CredentialSet::new(
            value(&self.session.session_key),
            value(&self.session.user_session_key),
            value(&self.session.aspnet_cookies),
        )
    }

    /// Login account, when automated login is enabled and complete
    pub fn login_credentials(&self) -> Option<LoginCredentials> {
        if !self.login.auto_login_enabled {
            return None;
        }
        Some(LoginCredentials::new(
            self.login.email.clone()?,
            self.login.password.clone()?,
            self.login.exam_url.clone()?,
        ))
    }

    /// Fixed request parameters
    ///
    /// # Errors
    ///
    /// Fails if the exam id has not been configured or resolved yet
    pub fn query_template(&self) -> Result<QueryTemplate> {
        let exam_id = self
            .exam
            .exam_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::config("exam id is neither configured nor resolved"))?;

        Ok(QueryTemplate {
            exam_type_id: self.exam.exam_type_id.clone(),
            exam_id,
            office_place_ids: self.exam.location_id.clone().into_iter().collect(),
            patient_birth_date: self.exam.patient_birth_date.clone(),
            min_date: self.exam.min_date,
        })
    }
}
