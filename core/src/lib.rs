//! Client core for browsing GitHub users, their followers and local bookmarks.
//!
//! # Overview
//! `GithubClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network (host-does-IO pattern). A
//! `Transport` performs the round-trip; `UreqTransport` is the production
//! one, tests inject fakes.
//!
//! # Design
//! - Services are constructed explicitly and receive their transport as an
//!   `Arc`, so there is no process-global client or cache.
//! - `FollowerSession` drives pagination for one list screen and drops
//!   duplicate triggers while a page is loading.
//! - `BookmarkStore` serializes read-modify-write cycles on the bookmark file.
//! - `ImageCache` keeps decoded avatars, optionally bounded.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use ghfollowers_core::{BookmarkStore, Config, Follower, FollowerService, GithubClient, UreqTransport};
//!
//! let config = Config::from_env()?;
//! let transport = Arc::new(UreqTransport::new(config.request_timeout()));
//! let service = FollowerService::new(transport, GithubClient::from_config(&config));
//!
//! let session = service.session("octocat");
//! session.fetch_next_page().await?;
//!
//! let user = service.fetch_user("octocat").await?;
//! BookmarkStore::from_config(&config)?.add(&Follower::from(&user)).await?;
//! # Ok(())
//! # }
//! ```

pub mod bookmarks;
pub mod client;
pub mod config;
pub mod error;
pub mod followers;
pub mod http;
pub mod image_cache;
pub mod types;

pub use bookmarks::{BookmarkAction, BookmarkStore};
pub use client::GithubClient;
pub use config::Config;
pub use error::{ConfigError, NetworkError, PersistenceError};
pub use followers::{filter_followers, FollowerService, FollowerSession, PageOutcome};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use image_cache::ImageCache;
pub use types::{Follower, User};
