//! In-memory cache of decoded avatar images keyed by URL.
//!
//! # Design
//! Unbounded by default, matching the lifetime-of-the-process cache the app
//! has always had. With a capacity the cache evicts least-recently-used
//! entries; any capacity is at least one, so the latest image always
//! survives its own insert. Failed downloads are never cached.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::DynamicImage;
use lru::LruCache;
use tracing::{debug, trace};

use crate::client::GithubClient;
use crate::error::NetworkError;
use crate::http::Transport;

pub struct ImageCache<T> {
    transport: Arc<T>,
    client: GithubClient,
    entries: Mutex<LruCache<String, Arc<DynamicImage>>>,
}

impl<T: Transport> ImageCache<T> {
    pub fn new(transport: Arc<T>, client: GithubClient, capacity: Option<NonZeroUsize>) -> Self {
        let entries = match capacity {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            transport,
            client,
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<DynamicImage>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached image for `url`, without touching the network.
    pub fn get(&self, url: &str) -> Option<Arc<DynamicImage>> {
        self.lock().get(url).cloned()
    }

    /// Cached image for `url`, downloading and decoding it on a miss.
    pub async fn fetch(&self, url: &str) -> Result<Arc<DynamicImage>, NetworkError> {
        if let Some(image) = self.get(url) {
            trace!(url, "image cache hit");
            return Ok(image);
        }

        let request = self.client.build_download(url)?;
        debug!(url, "downloading image");
        let response = self.transport.execute(request).await?;
        let bytes = self.client.parse_download(response)?;
        let image = decode(bytes).await?;

        self.lock().put(url.to_string(), Arc::clone(&image));
        Ok(image)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Decode on the blocking pool; large images keep the executor busy otherwise.
async fn decode(bytes: Vec<u8>) -> Result<Arc<DynamicImage>, NetworkError> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| NetworkError::Decode(e.to_string()))?
        .map(Arc::new)
        .map_err(|e| NetworkError::Decode(e.to_string()))
}
