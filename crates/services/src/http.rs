use std::env;

use percent_encoding::percent_decode_str;
use reqwest::Client;

/// Name of the cookie carrying the backend's request token.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header the backend expects the token on.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Connection settings for the quiz backend, read from the environment.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub cookies: Option<String>,
}

impl ApiConfig {
    /// Returns `None` when no backend is configured, in which case callers
    /// run against local collaborators only.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let cookies = env::var("QUIZ_COOKIES").ok().filter(|c| !c.trim().is_empty());
        Some(Self { base_url, cookies })
    }
}

/// Shared HTTP capability for all backend collaborators.
///
/// Owns the client, the base URL, and the CSRF token pulled from the
/// configured cookie string; collaborators build requests through it
/// instead of talking to the transport directly.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        let csrf_token = config
            .cookies
            .as_deref()
            .and_then(|cookies| cookie_value(cookies, CSRF_COOKIE));
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            csrf_token,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a GET request for a backend path.
    #[must_use]
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.endpoint(path))
    }

    /// Build a POST request for a backend path, carrying the CSRF token
    /// header the backend requires (empty when no token is configured).
    #[must_use]
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.endpoint(path))
            .header(CSRF_HEADER, self.csrf_token.as_deref().unwrap_or(""))
    }
}

/// Extract a named value from a `;`-separated cookie header, decoding
/// percent escapes the way the browser's `decodeURIComponent` does.
#[must_use]
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    for part in cookies.split(';') {
        let part = part.trim();
        if let Some(raw) = part.strip_prefix(name) {
            if let Some(raw) = raw.strip_prefix('=') {
                return Some(percent_decode_str(raw).decode_utf8_lossy().into_owned());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cookie_among_several() {
        let cookies = "sessionid=abc123; csrftoken=tok-42; theme=dark";
        assert_eq!(cookie_value(cookies, "csrftoken").as_deref(), Some("tok-42"));
        assert_eq!(cookie_value(cookies, "theme").as_deref(), Some("dark"));
    }

    #[test]
    fn decodes_percent_escapes() {
        let cookies = "csrftoken=a%2Fb%3Dc";
        assert_eq!(cookie_value(cookies, "csrftoken").as_deref(), Some("a/b=c"));
    }

    #[test]
    fn missing_cookie_returns_none() {
        assert_eq!(cookie_value("sessionid=abc", "csrftoken"), None);
        assert_eq!(cookie_value("", "csrftoken"), None);
    }

    #[test]
    fn name_prefix_does_not_match() {
        // "csrftoken2" must not satisfy a lookup for "csrftoken".
        let cookies = "csrftoken2=wrong";
        assert_eq!(cookie_value(cookies, "csrftoken"), None);
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let api = ApiClient::new(&ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            cookies: None,
        });
        assert_eq!(
            api.endpoint("/api/quiz/questions/"),
            "http://localhost:8000/api/quiz/questions/"
        );
    }
}
