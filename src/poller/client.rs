//! HTTP collaborator issuing the availability request
//!
//! The poller only depends on the [`AvailabilityClient`] trait; the concrete
//! [`HttpAvailabilityClient`] speaks to the real endpoint with reqwest.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use super::headers::{build_api_headers, cookie_header};
use crate::models::CredentialSet;
use crate::utils::error::PollError;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON body of the availability `POST`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub exam_type_id: String,
    /// `YYYYMMDD`
    pub min_date: String,
    pub exam_id: String,
    pub exam_set_id: Option<String>,
    pub practitioner_id: Option<String>,
    pub office_place_ids: Option<Vec<String>>,
    pub is_mobile_view: Option<bool>,
    pub patient_birth_date: String,
    pub office_place_hub_id: Option<String>,
}

/// Fixed query parameters from which each request body is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub exam_type_id: String,
    pub exam_id: String,
    pub office_place_ids: Vec<String>,
    pub patient_birth_date: String,
    /// Earliest date to search from; `None` means the day of the request
    pub min_date: Option<NaiveDate>,
}

impl QueryTemplate {
    /// Build the request body for a given day
    pub fn build(&self, today: NaiveDate) -> AvailabilityQuery {
        let min_date = self.min_date.unwrap_or(today);

        AvailabilityQuery {
            exam_type_id: self.exam_type_id.clone(),
            min_date: min_date.format("%Y%m%d").to_string(),
            exam_id: self.exam_id.clone(),
            exam_set_id: None,
            practitioner_id: None,
            office_place_ids: (!self.office_place_ids.is_empty())
                .then(|| self.office_place_ids.clone()),
            is_mobile_view: None,
            patient_birth_date: self.patient_birth_date.clone(),
            office_place_hub_id: None,
        }
    }
}

/// Raw HTTP answer handed back to the poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 401 or 403
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues one availability request
#[async_trait]
pub trait AvailabilityClient: Send + Sync {
    /// Send the query with the given credentials
    ///
    /// Transport-level failures are errors; every HTTP status, including
    /// 401/403, is returned as a response for the poller to interpret.
    async fn fetch(
        &self,
        credentials: &CredentialSet,
        query: &AvailabilityQuery,
    ) -> Result<ApiResponse, PollError>;
}

/// reqwest-backed availability client
pub struct HttpAvailabilityClient {
    client: Client,
    api_url: String,
    origin: String,
    referer: String,
}

impl HttpAvailabilityClient {
    /// Create a client for the given endpoint
    ///
    /// # Arguments
    ///
    /// * `api_url` - Full availability endpoint URL
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `PollError::InvalidUrl` unless `api_url` is an absolute http(s)
    /// URL, and `PollError::Transport` if the HTTP client cannot be created
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, PollError> {
        let url = Url::parse(api_url).map_err(|e| PollError::InvalidUrl(format!("{api_url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PollError::InvalidUrl(format!(
                "{api_url}: scheme must be http or https"
            )));
        }
        let origin = url.origin().ascii_serialization();

        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            referer: format!("{origin}/"),
            origin,
        })
    }

    /// Override the referer page
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl AvailabilityClient for HttpAvailabilityClient {
    async fn fetch(
        &self,
        credentials: &CredentialSet,
        query: &AvailabilityQuery,
    ) -> Result<ApiResponse, PollError> {
        let (cookie_name, cookie_value) = cookie_header(credentials)?;
        let mut headers = build_api_headers(&self.origin, &self.referer);
        headers.insert(cookie_name, cookie_value);

        tracing::debug!(url = %self.api_url, min_date = %query.min_date, "Requesting availability");

        let response = self
            .client
            .post(&self.api_url)
            .headers(headers)
            .json(query)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        tracing::debug!(status, body_len = body.len(), "Availability response received");

        Ok(ApiResponse::new(status, body.to_vec()))
    }
}
