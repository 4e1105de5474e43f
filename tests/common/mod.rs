//! Common test utilities
//!
//! In-memory stand-ins for the poller's collaborators. Each one records what
//! it was asked to do so tests can assert on call counts and arguments.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use slotwatch::auth::{Authenticator, LoginCredentials};
use slotwatch::models::{AvailabilityResult, CredentialSet};
use slotwatch::notifications::Notifier;
use slotwatch::poller::{ApiResponse, AvailabilityClient, AvailabilityQuery, Poller, QueryTemplate};
use slotwatch::session::SessionStore;
use slotwatch::utils::error::{AuthError, PollError};

/// Flat-shape body with one open slot
pub const ONE_SLOT_BODY: &str =
    r#"{"appointments":["None", {"dayAbbr":"28 novembre","startTime":"11:15"}, "None"]}"#;

/// Body with nothing open
pub const NO_SLOT_BODY: &str = r#"{"availabilityCount":0,"availabilityLines":[]}"#;

/// Client answering from a script, one entry per request
///
/// Once the script runs out every request gets an empty 200.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<ApiResponse, PollError>>>,
    cookie_headers: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<ApiResponse, PollError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            cookie_headers: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a script of plain responses
    pub fn statuses(responses: &[(u16, &str)]) -> Self {
        Self::new(
            responses
                .iter()
                .map(|(status, body)| Ok(ApiResponse::new(*status, body.as_bytes())))
                .collect(),
        )
    }

    /// `Cookie` header of every request, in order
    pub fn cookie_headers(&self) -> Vec<String> {
        self.cookie_headers.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.cookie_headers.lock().unwrap().len()
    }
}

#[async_trait]
impl AvailabilityClient for ScriptedClient {
    async fn fetch(
        &self,
        credentials: &CredentialSet,
        _query: &AvailabilityQuery,
    ) -> Result<ApiResponse, PollError> {
        self.cookie_headers
            .lock()
            .unwrap()
            .push(credentials.cookie_header());

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(200, NO_SLOT_BODY)))
    }
}

/// Authenticator returning a fixed credential set, or failing
pub struct FakeAuthenticator {
    fresh: Option<CredentialSet>,
    calls: AtomicUsize,
}

impl FakeAuthenticator {
    pub fn succeeding(fresh: CredentialSet) -> Self {
        Self {
            fresh: Some(fresh),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fresh: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn login(
        &self,
        _email: &str,
        _password: &str,
        _target_url: &str,
    ) -> Result<CredentialSet, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fresh.clone().ok_or(AuthError::Rejected(500))
    }
}

/// Notifier keeping every message it was handed
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, usize)>>,
}

impl RecordingNotifier {
    /// `(summary, count)` of every send
    pub fn sent(&self) -> Vec<(String, usize)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, summary: &str, result: &AvailabilityResult) {
        self.sent
            .lock()
            .unwrap()
            .push((summary.to_string(), result.count()));
    }
}

pub fn old_credentials() -> CredentialSet {
    CredentialSet::new("old-session", "N", "old-aspnet")
}

pub fn new_credentials() -> CredentialSet {
    CredentialSet::new("new-session", "N", "new-aspnet")
}

pub fn query_template() -> QueryTemplate {
    QueryTemplate {
        exam_type_id: "3374".to_string(),
        exam_id: "56796".to_string(),
        office_place_ids: Vec::new(),
        patient_birth_date: "1990-01-01".to_string(),
        min_date: None,
    }
}

pub fn login_credentials() -> LoginCredentials {
    LoginCredentials::new(
        "user@example.com",
        "hunter2",
        "https://www.easydoct.com/rdv/gie-irldr-imagerie-rennes",
    )
}

/// Poller wired to fakes, seeded with [`old_credentials`]
#[allow(dead_code)]
pub fn poller(client: Arc<ScriptedClient>, notifier: Arc<RecordingNotifier>) -> Poller {
    Poller::new(
        client,
        Arc::new(SessionStore::new(old_credentials())),
        query_template(),
        notifier,
    )
}
