//! Stateless request builder and response parser for the GitHub users API.
//!
//! # Design
//! `GithubClient` holds only configuration (base URL, page size, user agent)
//! and carries no mutable state between calls. Each operation is split into
//! a `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`; a `Transport` executes the round-trip in
//! between. Any status other than exactly 200 is an error.

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::NetworkError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Follower, User};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u32 = 100;
pub const DEFAULT_USER_AGENT: &str = concat!("ghfollowers-core/", env!("CARGO_PKG_VERSION"));

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Builds requests for, and parses responses from, the GitHub users API.
#[derive(Debug, Clone)]
pub struct GithubClient {
    base_url: String,
    per_page: u32,
    user_agent: String,
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl GithubClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page: DEFAULT_PER_PAGE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.base_url)
            .with_per_page(config.per_page)
            .with_user_agent(&config.user_agent)
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of followers requested per page. A page shorter than this is
    /// the last one.
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// `GET {base}/users/{username}/followers?per_page={n}&page={page}`
    pub fn build_list_followers(&self, username: &str, page: u32) -> Result<HttpRequest, NetworkError> {
        let mut url = self.endpoint(&["users", validate_username(username)?, "followers"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(self.api_request(url))
    }

    /// `GET {base}/users/{username}`
    pub fn build_get_user(&self, username: &str) -> Result<HttpRequest, NetworkError> {
        let url = self.endpoint(&["users", validate_username(username)?])?;
        Ok(self.api_request(url))
    }

    /// `GET {url}` for raw bytes, typically an avatar image.
    pub fn build_download(&self, url: &str) -> Result<HttpRequest, NetworkError> {
        let url = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: vec![("user-agent".to_string(), self.user_agent.clone())],
        })
    }

    pub fn parse_list_followers(&self, response: HttpResponse) -> Result<Vec<Follower>, NetworkError> {
        decode_json(response)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, NetworkError> {
        decode_json(response)
    }

    pub fn parse_download(&self, response: HttpResponse) -> Result<Vec<u8>, NetworkError> {
        check_status(&response)?;
        if response.body.is_empty() {
            return Err(NetworkError::EmptyBody);
        }
        Ok(response.body)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, NetworkError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| NetworkError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn api_request(&self, url: Url) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: vec![
                ("accept".to_string(), GITHUB_ACCEPT.to_string()),
                ("user-agent".to_string(), self.user_agent.clone()),
            ],
        }
    }
}

/// Reject usernames that would change the shape of the endpoint path.
fn validate_username(username: &str) -> Result<&str, NetworkError> {
    let breaks_path = |c: char| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '\\');
    if username.is_empty() || username.contains(breaks_path) || username == "." || username == ".." {
        return Err(NetworkError::InvalidUrl(format!("invalid username {username:?}")));
    }
    Ok(username)
}

fn check_status(response: &HttpResponse) -> Result<(), NetworkError> {
    if response.status == 200 {
        Ok(())
    } else {
        Err(NetworkError::InvalidResponse(response.status))
    }
}

fn decode_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, NetworkError> {
    check_status(&response)?;
    if response.body.is_empty() {
        return Err(NetworkError::EmptyBody);
    }
    serde_json::from_slice(&response.body).map_err(|e| NetworkError::Decode(e.to_string()))
}
