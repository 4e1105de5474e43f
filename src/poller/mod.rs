//! Availability poller
//!
//! One [`Poller::check`] call is one cycle: request availability with the
//! current session, recover from a rejected session at most once by logging
//! in again, normalize the body, notify when slots are open, and report a
//! [`CycleOutcome`]. No error escapes a cycle; everything ends up in the
//! outcome so the scheduler can keep going.
//!
//! # Cycle
//!
//! ```text
//!  read session ──► request ──► 401/403? ──no──► 200? ──► normalize ──► notify
//!       ▲                          │yes
//!       │                          ▼
//!       └── replace session ◄── login (once per cycle)
//! ```

pub mod client;
pub mod headers;

use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::{Authenticator, LoginCredentials};
use crate::error::SlotwatchErrorTrait;
use crate::models::{AvailabilityResult, CycleOutcome, CycleReport};
use crate::notifications::Notifier;
use crate::parser::{self, ResponseShape};
use crate::scheduler::CycleRunner;
use crate::session::SessionStore;
use crate::utils::error::{AuthError, PollError};

pub use client::{
    ApiResponse, AvailabilityClient, AvailabilityQuery, HttpAvailabilityClient, QueryTemplate,
};

/// Summary line sent with every notification
pub fn summary_message(count: usize) -> String {
    format!("Found {count} available appointment slot(s)!")
}

/// Per-cycle state, dropped when the cycle ends
#[derive(Debug)]
struct CycleContext {
    relogin_attempted: bool,
    degraded_body: bool,
    started_at: Instant,
}

impl CycleContext {
    fn new() -> Self {
        Self {
            relogin_attempted: false,
            degraded_body: false,
            started_at: Instant::now(),
        }
    }
}

struct AutoLogin {
    authenticator: Arc<dyn Authenticator>,
    credentials: LoginCredentials,
}

/// Runs availability cycles against the scheduling API
pub struct Poller {
    client: Arc<dyn AvailabilityClient>,
    session: Arc<SessionStore>,
    query: QueryTemplate,
    notifier: Arc<dyn Notifier>,
    auto_login: Option<AutoLogin>,
    notifications_enabled: bool,
}

impl Poller {
    /// Create a poller without automated login
    pub fn new(
        client: Arc<dyn AvailabilityClient>,
        session: Arc<SessionStore>,
        query: QueryTemplate,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            session,
            query,
            notifier,
            auto_login: None,
            notifications_enabled: true,
        }
    }

    /// Enable re-login on 401/403
    pub fn with_auto_login(
        mut self,
        authenticator: Arc<dyn Authenticator>,
        credentials: LoginCredentials,
    ) -> Self {
        self.auto_login = Some(AutoLogin {
            authenticator,
            credentials,
        });
        self
    }

    pub fn with_notifications_enabled(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Run one complete cycle
    pub async fn check(&self) -> CycleReport {
        let mut ctx = CycleContext::new();

        let outcome = match self.execute(&mut ctx).await {
            Ok(result) if result.is_available() => {
                tracing::info!(count = result.count(), "Appointments are available");
                for line in result.slot_lines() {
                    tracing::info!(slot = %line, "Open slot");
                }

                if self.notifications_enabled {
                    self.notifier
                        .send(&summary_message(result.count()), &result)
                        .await;
                } else {
                    tracing::info!("Notifications disabled, skipping");
                }

                CycleOutcome::Found(result)
            }
            Ok(_) => {
                tracing::info!("No slots available");
                CycleOutcome::NotFound
            }
            Err(e) => {
                tracing::error!(
                    kind = %e.kind(),
                    category = %e.category(),
                    error = %e,
                    "Availability check failed"
                );
                CycleOutcome::Error(e)
            }
        };

        CycleReport {
            outcome,
            relogin_attempted: ctx.relogin_attempted,
            degraded_body: ctx.degraded_body,
            elapsed: ctx.started_at.elapsed(),
        }
    }

    async fn execute(&self, ctx: &mut CycleContext) -> Result<AvailabilityResult, PollError> {
        let query = self.query.build(Local::now().date_naive());

        let response = loop {
            let credentials = self.session.read();
            let response = self.client.fetch(&credentials, &query).await?;

            if !response.is_auth_failure() {
                break response;
            }

            tracing::warn!(status = response.status, "Authentication rejected, session may have expired");

            let Some(auto_login) = &self.auto_login else {
                return Err(PollError::Authentication {
                    status: response.status,
                    relogin_attempted: false,
                });
            };

            if ctx.relogin_attempted {
                return Err(PollError::Authentication {
                    status: response.status,
                    relogin_attempted: true,
                });
            }
            ctx.relogin_attempted = true;

            self.relogin(auto_login).await?;
            tracing::info!("Retrying request with new session cookies");
        };

        if !response.is_ok() {
            return Err(PollError::UnexpectedStatus(response.status));
        }

        let normalized = parser::normalize_body(&response.body);
        ctx.degraded_body = normalized.shape == ResponseShape::Undecodable;
        Ok(normalized.result)
    }

    async fn relogin(&self, auto_login: &AutoLogin) -> Result<(), PollError> {
        tracing::info!("Attempting automated login");

        let LoginCredentials {
            email,
            password,
            target_url,
        } = &auto_login.credentials;

        let fresh = auto_login
            .authenticator
            .login(email, password, target_url)
            .await?;

        if !fresh.is_valid() {
            return Err(AuthError::MissingCookies(
                "login returned an incomplete credential set".to_string(),
            )
            .into());
        }

        let generation = self.session.replace(fresh);
        tracing::info!(generation, "Automated login successful, session cookies updated");
        Ok(())
    }
}

#[async_trait]
impl CycleRunner for Poller {
    async fn run_cycle(&self) -> CycleReport {
        self.check().await
    }
}
