//! Session (re-)acquisition through the site's login form
//!
//! The poller depends only on the [`Authenticator`] trait. A login is a slow,
//! blocking operation from the cycle's point of view, and implementations
//! must not retry internally: the poller allows exactly one attempt per cycle.

mod easydoct;

pub use easydoct::{parse_cookie_pairs, EasydoctAuthenticator, DEFAULT_LOGIN_URL};

use async_trait::async_trait;
use std::fmt;

use crate::models::CredentialSet;
use crate::utils::error::AuthError;

/// Account used for automated login
#[derive(Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
    /// Booking page visited after sign-in so the session cookies are scoped to it
    pub target_url: String,
}

impl LoginCredentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            target_url: target_url.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("target_url", &self.target_url)
            .finish()
    }
}

/// Performs a login and returns a complete, fresh credential set
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(
        &self,
        email: &str,
        password: &str,
        target_url: &str,
    ) -> Result<CredentialSet, AuthError>;
}
