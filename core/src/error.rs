//! Error types for the followers core.
//!
//! # Design
//! Network and persistence failures are separate enums so callers can tell
//! "the server said no" from "the bookmark file is broken" without string
//! matching. `InvalidResponse` keeps the raw status; presentation code
//! decides how to word it. `ConfigError` only surfaces at startup.

use std::io;

use thiserror::Error;

/// Errors from building requests, executing them or decoding responses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// The endpoint URL could not be constructed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The transport failed before a response was received.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server answered with a status other than 200.
    #[error("unexpected HTTP status {0}")]
    InvalidResponse(u16),

    /// The server answered 200 with no body.
    #[error("response body was empty")]
    EmptyBody,

    /// The body did not match the expected schema or image format.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Errors from reading or writing the bookmark file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to encode bookmarks: {0}")]
    Encode(String),

    #[error("failed to write bookmarks file")]
    Write(#[source] io::Error),

    /// Reading failed for a reason other than the file being absent.
    #[error("failed to read bookmarks file")]
    Read(#[source] io::Error),

    /// The file exists but is not a valid bookmark list.
    #[error("failed to decode bookmarks file: {0}")]
    Decode(String),

    #[error("user is already bookmarked")]
    BookmarkExists,
}

/// Errors detected while assembling configuration at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no writable document directory could be resolved")]
    NoDocumentDirectory,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
