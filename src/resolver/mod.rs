//! Exam and location name resolution
//!
//! Turns the human-readable names a user configures (`IRM pied`, `CANOPIA`)
//! into the numeric ids the availability API expects. Used once at startup
//! and by the `resolve` command; never inside a poll cycle.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::utils::error::ResolveError;
use crate::utils::normalize_whitespace;

/// Public booking API base URL
pub const DEFAULT_BASE_URL: &str = "https://www.easydoct.com/api/rdv";

/// Names listed in the log when nothing matches
const MAX_LISTED_CANDIDATES: usize = 10;

/// One exam or location offered by the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    fn sort_key(&self) -> (String, &str) {
        (self.name.to_lowercase(), self.id.as_str())
    }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ExamTypeResponse {
    #[serde(default)]
    exams: Vec<Candidate>,
}

/// How a candidate was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Partial,
}

/// Pick the best candidate for `query`
///
/// A case-insensitive exact match wins over substring matches. Among several
/// matches of the same kind, the lowest `(lower-cased name, id)` is chosen so
/// the result does not depend on the order the API returned them in.
pub fn pick_match<'a>(
    candidates: &'a [Candidate],
    query: &str,
) -> Option<(&'a Candidate, MatchKind, Vec<&'a Candidate>)> {
    let needle = normalize_whitespace(query).to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let name_of = |c: &Candidate| normalize_whitespace(&c.name).to_lowercase();

    let exact: Vec<&Candidate> = candidates.iter().filter(|c| name_of(c) == needle).collect();
    let (mut matches, kind) = if exact.is_empty() {
        let partial = candidates
            .iter()
            .filter(|c| name_of(c).contains(&needle))
            .collect();
        (partial, MatchKind::Partial)
    } else {
        (exact, MatchKind::Exact)
    };

    matches.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    let best = *matches.first()?;
    Some((best, kind, matches))
}

/// Looks up exam and location ids by name
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn list_exams(&self, exam_type_id: &str) -> Result<Vec<Candidate>, ResolveError>;

    async fn list_locations(
        &self,
        exam_type_id: &str,
        exam_id: &str,
    ) -> Result<Vec<Candidate>, ResolveError>;

    async fn resolve_exam_id(&self, exam_type_id: &str, name: &str) -> Result<String, ResolveError> {
        tracing::info!(name, "Resolving exam id");
        let exams = self.list_exams(exam_type_id).await?;
        select("exam", &exams, name)
    }

    async fn resolve_location_id(
        &self,
        exam_type_id: &str,
        exam_id: &str,
        name: &str,
    ) -> Result<String, ResolveError> {
        tracing::info!(name, "Resolving location id");
        let locations = self.list_locations(exam_type_id, exam_id).await?;
        select("location", &locations, name)
    }
}

fn select(kind: &'static str, candidates: &[Candidate], name: &str) -> Result<String, ResolveError> {
    let Some((best, match_kind, matches)) = pick_match(candidates, name) else {
        tracing::error!(kind, name, "No candidate matches");
        for candidate in candidates.iter().take(MAX_LISTED_CANDIDATES) {
            tracing::info!(kind, id = %candidate.id, name = %candidate.name, "Available");
        }
        return Err(ResolveError::NotFound {
            kind,
            name: name.to_string(),
        });
    };

    if matches.len() > 1 {
        tracing::warn!(kind, name, count = matches.len(), "Several candidates match, using the first in name order");
        for candidate in &matches {
            tracing::warn!(kind, id = %candidate.id, name = %candidate.name, "Candidate");
        }
    }

    tracing::info!(kind, id = %best.id, name = %best.name, exact = match_kind == MatchKind::Exact, "Resolved");
    Ok(best.id.clone())
}

/// reqwest-backed resolver against the public booking API
pub struct HttpResolver {
    client: Client,
    base_url: String,
}

impl HttpResolver {
    /// Create a resolver
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Http` if the HTTP client cannot be created
    pub fn new(timeout: Duration) -> Result<Self, ResolveError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, ResolveError> {
        tracing::debug!(url, "Fetching resolver data");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ResolveError::UnexpectedFormat(e.to_string()))
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn list_exams(&self, exam_type_id: &str) -> Result<Vec<Candidate>, ResolveError> {
        let url = format!("{}/getExamType/{exam_type_id}", self.base_url);
        let value = self.get_json(&url).await?;

        let response: ExamTypeResponse = serde_json::from_value(value)
            .map_err(|e| ResolveError::UnexpectedFormat(e.to_string()))?;
        Ok(response.exams)
    }

    async fn list_locations(
        &self,
        exam_type_id: &str,
        exam_id: &str,
    ) -> Result<Vec<Candidate>, ResolveError> {
        let url = format!(
            "{}/getOfficePlaces/{exam_type_id}/{exam_id}/null/null/null?officePlaceHubId=",
            self.base_url
        );
        let value = self.get_json(&url).await?;

        if !value.is_array() {
            return Err(ResolveError::UnexpectedFormat(
                "expected a list of office places".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| ResolveError::UnexpectedFormat(e.to_string()))
    }
}
