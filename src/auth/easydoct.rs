//! ASP.NET WebForms login against easydoct.com
//!
//! 1. GET the sign-in page and scrape the hidden ViewState fields
//! 2. POST the login form
//! 3. GET the booking page so the session cookies are issued for it
//! 4. Read `SessionKey`, `UserSessionKey` and `.AspNet.Cookies` from the jar

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

use super::Authenticator;
use crate::models::{CredentialSet, DEFAULT_USER_SESSION_KEY};
use crate::poller::headers::build_navigation_headers;
use crate::utils::error::AuthError;
use crate::utils::mask_secret;

/// Patient sign-in page
pub const DEFAULT_LOGIN_URL: &str = "https://www.easydoct.com/EdPatient/EdPatientSignin";

const EMAIL_FIELD: &str = "ctl00$ContentPlaceHolder1$inputEmail";
const PASSWORD_FIELD: &str = "ctl00$ContentPlaceHolder1$edPatientSigninInputPassword";
const SUBMIT_FIELD: &str = "ctl00$ContentPlaceHolder1$ButtonLogin";

const HIDDEN_FIELDS: [&str; 3] = ["__VIEWSTATE", "__VIEWSTATEGENERATOR", "__EVENTVALIDATION"];

/// Form-based authenticator
pub struct EasydoctAuthenticator {
    login_url: String,
    timeout: Duration,
}

impl EasydoctAuthenticator {
    /// Create an authenticator with the default sign-in URL and a 30s timeout
    pub fn new() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the sign-in URL (useful for testing with mock servers)
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn origin(&self) -> Result<String, AuthError> {
        Url::parse(&self.login_url)
            .map(|url| url.origin().ascii_serialization())
            .map_err(|e| AuthError::InvalidUrl(format!("{}: {e}", self.login_url)))
    }
}

impl Default for EasydoctAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for EasydoctAuthenticator {
    async fn login(
        &self,
        email: &str,
        password: &str,
        target_url: &str,
    ) -> Result<CredentialSet, AuthError> {
        let target = Url::parse(target_url).map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
        let origin = self.origin()?;

        // A fresh jar per attempt keeps stale cookies from leaking into the new session
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(self.timeout)
            .gzip(true)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        tracing::info!(login_url = %self.login_url, "Starting login");

        let response = client
            .get(&self.login_url)
            .headers(build_navigation_headers(&origin, target_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AuthError::LoginPageStatus(response.status().as_u16()));
        }
        let page = response.text().await?;
        let hidden = extract_hidden_fields(&page)?;

        tracing::debug!(
            viewstate_len = hidden.first().map(|(_, value)| value.len()).unwrap_or(0),
            "Extracted ViewState fields, submitting login form"
        );

        let mut form: Vec<(&str, &str)> = hidden
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        form.push((EMAIL_FIELD, email));
        form.push((PASSWORD_FIELD, password));
        form.push((SUBMIT_FIELD, "Connexion"));

        let response = client
            .post(&self.login_url)
            .headers(build_navigation_headers(&origin, &self.login_url))
            .form(&form)
            .send()
            .await?;
        let status = response.status().as_u16();
        if !matches!(status, 200 | 302) {
            return Err(AuthError::Rejected(status));
        }

        let response = client
            .get(target.as_str())
            .headers(build_navigation_headers(&origin, &self.login_url))
            .send()
            .await?;
        tracing::debug!(status = response.status().as_u16(), "Visited booking page");

        let cookies = jar
            .cookies(&target)
            .and_then(|value| value.to_str().ok().map(parse_cookie_pairs))
            .unwrap_or_default();

        let credentials = credentials_from_cookies(&cookies)?;
        tracing::info!(
            session_key = %mask_secret(credentials.session_key()),
            "Login successful"
        );
        Ok(credentials)
    }
}

/// One selector per hidden field, matched by id or by name
fn hidden_field_selectors() -> &'static [Selector] {
    static SELECTORS: OnceLock<Vec<Selector>> = OnceLock::new();

    SELECTORS.get_or_init(|| {
        HIDDEN_FIELDS
            .iter()
            .map(|name| {
                Selector::parse(&format!(r#"input#{name}, input[name="{name}"]"#))
                    .expect("Invalid CSS selector")
            })
            .collect()
    })
}

/// Scrape the ASP.NET hidden form fields
pub(crate) fn extract_hidden_fields(html: &str) -> Result<Vec<(&'static str, String)>, AuthError> {
    let document = Html::parse_document(html);

    HIDDEN_FIELDS
        .iter()
        .zip(hidden_field_selectors())
        .map(|(name, selector)| {
            document
                .select(selector)
                .filter_map(|input| input.value().attr("value"))
                .find(|value| !value.is_empty())
                .map(|value| (*name, value.to_string()))
                .ok_or(AuthError::MissingFormField(*name))
        })
        .collect()
}

/// Split a `Cookie` header value into name/value pairs
pub fn parse_cookie_pairs(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn credentials_from_cookies(cookies: &HashMap<String, String>) -> Result<CredentialSet, AuthError> {
    let present = |name: &str| cookies.get(name).filter(|v| !v.is_empty()).cloned();

    let session_key = present("SessionKey");
    let aspnet_cookies = present(".AspNet.Cookies");

    match (session_key, aspnet_cookies) {
        (Some(session_key), Some(aspnet_cookies)) => {
            let user_session_key = present("UserSessionKey")
                .unwrap_or_else(|| DEFAULT_USER_SESSION_KEY.to_string());
            Ok(CredentialSet::new(session_key, user_session_key, aspnet_cookies))
        }
        (session_key, aspnet_cookies) => {
            let mut missing = Vec::new();
            if session_key.is_none() {
                missing.push("SessionKey");
            }
            if aspnet_cookies.is_none() {
                missing.push(".AspNet.Cookies");
            }
            Err(AuthError::MissingCookies(missing.join(", ")))
        }
    }
}
