use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, ORIGIN,
    REFERER, USER_AGENT,
};

use crate::models::CredentialSet;
use crate::utils::error::PollError;

/// Browser user agent presented to the scheduling site
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:142.0) Gecko/20100101 Firefox/142.0";

/// Build browser-like headers for the availability XHR
///
/// # Arguments
///
/// * `origin` - Site origin, e.g. `https://www.easydoct.com`
/// * `referer` - Booking page the request pretends to come from
///
/// # Examples
///
/// ```
/// use slotwatch::poller::headers::build_api_headers;
///
/// let headers = build_api_headers(
///     "https://www.easydoct.com",
///     "https://www.easydoct.com/rdv/example",
/// );
/// assert_eq!(headers["x-requested-with"], "XMLHttpRequest");
/// ```
pub fn build_api_headers(origin: &str, referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(HeaderName::from_static("sec-gpc"), HeaderValue::from_static("1"));

    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(ORIGIN, value);
    }
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }

    headers
}

/// Build headers for top-level page navigation (used by the login flow)
pub fn build_navigation_headers(origin: &str, referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("fr,en-US;q=0.7,en;q=0.3"),
    );
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );

    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(ORIGIN, value);
    }
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }

    headers
}

/// Encode the credential set as a `Cookie` header
///
/// # Errors
///
/// Returns `PollError::InvalidCookie` if a credential contains bytes that
/// cannot appear in a header
pub fn cookie_header(credentials: &CredentialSet) -> Result<(HeaderName, HeaderValue), PollError> {
    let value = HeaderValue::from_str(&credentials.cookie_header())
        .map_err(|e| PollError::InvalidCookie(e.to_string()))?;
    Ok((COOKIE, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_headers() {
        let headers = build_api_headers("https://www.easydoct.com", "https://www.easydoct.com/rdv/x");

        assert_eq!(headers[USER_AGENT], BROWSER_USER_AGENT);
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[ORIGIN], "https://www.easydoct.com");
        assert_eq!(headers[REFERER], "https://www.easydoct.com/rdv/x");
        assert!(headers.contains_key("sec-fetch-mode"));
        assert!(!headers.contains_key(COOKIE));
    }

    #[test]
    fn test_navigation_headers() {
        let headers = build_navigation_headers("https://www.easydoct.com", "https://www.easydoct.com/");
        assert_eq!(headers["sec-fetch-mode"], "navigate");
        assert!(headers[ACCEPT].to_str().unwrap().starts_with("text/html"));
    }

    #[test]
    fn test_invalid_referer_is_skipped() {
        let headers = build_api_headers("https://www.easydoct.com", "bad\nreferer");
        assert!(!headers.contains_key(REFERER));
    }

    #[test]
    fn test_cookie_header() {
        let (name, value) = cookie_header(&CredentialSet::new("s", "N", "a")).unwrap();
        assert_eq!(name, COOKIE);
        assert_eq!(value, "SessionKey=s; UserSessionKey=N; .AspNet.Cookies=a");

        assert!(cookie_header(&CredentialSet::new("s\n", "N", "a")).is_err());
    }
}
