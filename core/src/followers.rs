//! Follower fetching: single pages and paginated sessions.
//!
//! # Design
//! `FollowerService` is an explicitly constructed handle around a shared
//! `Transport` and a `GithubClient`. It fetches one page at a time and keeps
//! no state of its own.
//!
//! `FollowerSession` owns the cursor for one username's list. At most one
//! page fetch runs per session: a trigger that arrives while a fetch is
//! outstanding returns `PageOutcome::InFlight` without touching the network.
//! Cursor state sits behind a mutex that is never held across an await.
//!
//! Every fetch is tagged with the session's generation and cancellation
//! token. `reset` and `cancel` bump the generation and cancel the token, so
//! an outstanding fetch resolves as `PageOutcome::Cancelled` and its
//! response never reaches the cursor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::GithubClient;
use crate::error::NetworkError;
use crate::http::Transport;
use crate::types::{Follower, User};

/// Fetches followers and profiles through an injected transport.
pub struct FollowerService<T> {
    transport: Arc<T>,
    client: GithubClient,
}

impl<T> Clone for FollowerService<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            client: self.client.clone(),
        }
    }
}

impl<T: Transport> FollowerService<T> {
    pub fn new(transport: Arc<T>, client: GithubClient) -> Self {
        Self { transport, client }
    }

    pub fn client(&self) -> &GithubClient {
        &self.client
    }

    pub fn page_size(&self) -> usize {
        self.client.per_page() as usize
    }

    /// Fetch page `page` (1-based) of `username`'s followers.
    pub async fn fetch_page(&self, username: &str, page: u32) -> Result<Vec<Follower>, NetworkError> {
        let request = self.client.build_list_followers(username, page)?;
        debug!(username, page, "fetching followers page");
        let response = self.transport.execute(request).await?;
        self.client.parse_list_followers(response)
    }

    /// Fetch the full profile of `username`.
    pub async fn fetch_user(&self, username: &str) -> Result<User, NetworkError> {
        let request = self.client.build_get_user(username)?;
        debug!(username, "fetching user");
        let response = self.transport.execute(request).await?;
        self.client.parse_get_user(response)
    }

    /// Start a paginated session for `username` at page 1.
    pub fn session(&self, username: &str) -> FollowerSession<T> {
        FollowerSession::new(self.clone(), username)
    }
}

/// What a call to `FollowerSession::fetch_next_page` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// A page was fetched and appended.
    Loaded { added: usize, has_more: bool },
    /// Another fetch for this session was already outstanding; nothing was sent.
    InFlight,
    /// The last page has already been loaded; nothing was sent.
    Exhausted,
    /// The session was reset or cancelled while the fetch was outstanding;
    /// the response was discarded.
    Cancelled,
}

struct Cursor {
    username: String,
    page: u32,
    has_more: bool,
    followers: Vec<Follower>,
    in_flight: bool,
    generation: u64,
    cancel: CancellationToken,
}

impl Cursor {
    fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            page: 1,
            has_more: true,
            followers: Vec::new(),
            in_flight: false,
            generation: 0,
            cancel: CancellationToken::new(),
        }
    }

    /// Abandon any outstanding fetch and start a new generation.
    fn abandon(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;
        self.in_flight = false;
    }
}

struct Ticket {
    username: String,
    page: u32,
    generation: u64,
    cancel: CancellationToken,
}

/// Clears the in-flight flag when a fetch ends, including when the fetch
/// future is dropped before completing.
struct InFlightGuard<'a, T> {
    session: &'a FollowerSession<T>,
    generation: u64,
}

impl<T> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        let mut cursor = self.session.lock();
        if cursor.generation == self.generation {
            cursor.in_flight = false;
        }
    }
}

/// Pagination state for one username's follower list.
pub struct FollowerSession<T> {
    service: FollowerService<T>,
    cursor: Mutex<Cursor>,
}

impl<T> FollowerSession<T> {
    fn lock(&self) -> MutexGuard<'_, Cursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> FollowerSession<T> {
    pub fn new(service: FollowerService<T>, username: &str) -> Self {
        Self {
            service,
            cursor: Mutex::new(Cursor::new(username)),
        }
    }

    /// Fetch the next page and append it to the accumulated list.
    ///
    /// On error the accumulated list and page number are unchanged, the
    /// in-flight flag is cleared and the error is returned. A caller that
    /// finds the session still empty after an error is expected to leave the
    /// screen.
    pub async fn fetch_next_page(&self) -> Result<PageOutcome, NetworkError> {
        let ticket = match self.begin() {
            Ok(ticket) => ticket,
            Err(outcome) => return Ok(outcome),
        };
        let _guard = InFlightGuard {
            session: self,
            generation: ticket.generation,
        };

        let result = tokio::select! {
            biased;
            _ = ticket.cancel.cancelled() => return Ok(PageOutcome::Cancelled),
            result = self.service.fetch_page(&ticket.username, ticket.page) => result,
        };

        let mut cursor = self.lock();
        if cursor.generation != ticket.generation {
            debug!(username = %ticket.username, page = ticket.page, "discarding stale page");
            return Ok(PageOutcome::Cancelled);
        }
        cursor.in_flight = false;

        match result {
            Ok(batch) => {
                let added = batch.len();
                cursor.has_more = added == self.service.page_size();
                cursor.page += 1;
                cursor.followers.extend(batch);
                debug!(
                    username = %cursor.username,
                    page = ticket.page,
                    added,
                    total = cursor.followers.len(),
                    has_more = cursor.has_more,
                    "followers page loaded"
                );
                Ok(PageOutcome::Loaded {
                    added,
                    has_more: cursor.has_more,
                })
            }
            Err(err) => {
                warn!(username = %cursor.username, page = ticket.page, error = %err, "followers page failed");
                Err(err)
            }
        }
    }

    fn begin(&self) -> Result<Ticket, PageOutcome> {
        let mut cursor = self.lock();
        if cursor.in_flight {
            return Err(PageOutcome::InFlight);
        }
        if !cursor.has_more {
            return Err(PageOutcome::Exhausted);
        }
        cursor.in_flight = true;
        Ok(Ticket {
            username: cursor.username.clone(),
            page: cursor.page,
            generation: cursor.generation,
            cancel: cursor.cancel.clone(),
        })
    }

    /// Restart the session for `username`: page 1, nothing loaded, any
    /// outstanding fetch abandoned.
    pub fn reset(&self, username: &str) {
        let mut cursor = self.lock();
        cursor.abandon();
        cursor.username = username.to_string();
        cursor.page = 1;
        cursor.has_more = true;
        cursor.followers.clear();
        debug!(username, "session reset");
    }

    /// Abandon the outstanding fetch, if any. Loaded followers are kept.
    pub fn cancel(&self) {
        self.lock().abandon();
    }

    pub fn username(&self) -> String {
        self.lock().username.clone()
    }

    /// The next page that will be requested.
    pub fn page(&self) -> u32 {
        self.lock().page
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.lock().in_flight
    }

    /// Snapshot of every follower loaded so far, in fetch order.
    pub fn followers(&self) -> Vec<Follower> {
        self.lock().followers.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().followers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().followers.is_empty()
    }

    /// Loaded followers whose login contains `query`, ignoring case.
    pub fn filter(&self, query: &str) -> Vec<Follower> {
        filter_followers(&self.lock().followers, query)
    }
}

impl<T> Drop for FollowerSession<T> {
    fn drop(&mut self) {
        self.lock().cancel.cancel();
    }
}

/// Followers whose login contains `query`, ignoring case. An empty or
/// whitespace-only query matches everything.
pub fn filter_followers(followers: &[Follower], query: &str) -> Vec<Follower> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return followers.to_vec();
    }
    followers
        .iter()
        .filter(|f| f.login().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
