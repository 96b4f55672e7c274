//! Domain records decoded from the GitHub users API.
//!
//! # Design
//! Field names follow the API's snake_case keys directly, so no key
//! renaming is needed on either the wire or the bookmark file. `Follower`
//! identity is its `login`; two followers with the same login compare equal
//! even if their avatar URLs differ.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal identity record for a GitHub account appearing in a followers list.
///
/// Also the element type of the bookmark file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follower {
    login: String,
    avatar_url: String,
}

impl Follower {
    pub fn new(login: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            avatar_url: avatar_url.into(),
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn avatar_url(&self) -> &str {
        &self.avatar_url
    }
}

impl PartialEq for Follower {
    fn eq(&self, other: &Self) -> bool {
        self.login == other.login
    }
}

impl Eq for Follower {}

impl Hash for Follower {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.login.hash(state);
    }
}

impl From<&User> for Follower {
    fn from(user: &User) -> Self {
        Follower::new(user.login.clone(), user.avatar_url.clone())
    }
}

/// Full profile of a single GitHub account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub login: String,
    pub avatar_url: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub public_repos: u32,
    pub public_gists: u32,
    pub html_url: String,
    pub following: u32,
    pub followers: u32,
    pub followers_url: String,
    #[serde(with = "created_at")]
    pub created_at: DateTime<Utc>,
}

/// Wire format of `User::created_at`.
///
/// Accepts an RFC 3339 string with an explicit offset (`2011-01-25T18:44:36Z`,
/// the form the API emits) or a bare integer of Unix epoch seconds. Always
/// serializes as RFC 3339 in UTC with second precision.
pub mod created_at {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Epoch(i64),
    }

    pub fn parse(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => parse(&text)
                .map_err(|e| D::Error::custom(format!("invalid created_at {text:?}: {e}"))),
            Raw::Epoch(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| D::Error::custom(format!("created_at epoch out of range: {secs}"))),
        }
    }
}
