//! Runtime configuration for the followers core.
//!
//! Defaults match the public GitHub API. Every field can be overridden from
//! `GHFOLLOWERS_*` environment variables, or deserialized from any serde
//! format the host application already uses for its settings.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::client::{DEFAULT_BASE_URL, DEFAULT_PER_PAGE, DEFAULT_USER_AGENT};
use crate::error::ConfigError;

/// Directory created under the platform data directory when no explicit
/// document directory is configured.
pub const APP_DIR_NAME: &str = "ghfollowers";

/// GitHub caps `per_page` at 100.
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub per_page: u32,
    pub request_timeout_secs: u64,
    /// `None` keeps every avatar for the lifetime of the process.
    pub image_cache_capacity: Option<NonZeroUsize>,
    pub document_dir: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            request_timeout_secs: 30,
            image_cache_capacity: None,
            document_dir: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `GHFOLLOWERS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `GHFOLLOWERS_*` key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(value) = lookup("GHFOLLOWERS_BASE_URL") {
            config.base_url = value;
        }
        if let Some(value) = lookup("GHFOLLOWERS_PER_PAGE") {
            config.per_page = parse_number("GHFOLLOWERS_PER_PAGE", &value)?;
        }
        if let Some(value) = lookup("GHFOLLOWERS_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("GHFOLLOWERS_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("GHFOLLOWERS_IMAGE_CACHE_CAPACITY") {
            let capacity: usize = parse_number("GHFOLLOWERS_IMAGE_CACHE_CAPACITY", &value)?;
            config.image_cache_capacity = NonZeroUsize::new(capacity);
        }
        if let Some(value) = lookup("GHFOLLOWERS_DOCUMENT_DIR") {
            config.document_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("GHFOLLOWERS_USER_AGENT") {
            config.user_agent = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match Url::parse(&self.base_url) {
            Ok(url) if !url.cannot_be_a_base() => {}
            _ => return Err(invalid("base_url", &self.base_url)),
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(invalid("per_page", self.per_page));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", self.request_timeout_secs));
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", &self.user_agent));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Where the bookmark file lives: the explicit `document_dir`, else
    /// `<platform data dir>/ghfollowers`.
    pub fn document_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.document_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(ConfigError::NoDocumentDirectory),
        }
    }
}

fn parse_number<N: std::str::FromStr>(key: &'static str, value: &str) -> Result<N, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}
