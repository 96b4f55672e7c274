//! `ImageCache` hit/miss behaviour and eviction with a scripted transport.

mod common;

use std::num::NonZeroUsize;
use std::sync::Arc;

use common::{png, ScriptedTransport, BASE_URL};
use ghfollowers_core::{GithubClient, HttpResponse, ImageCache, NetworkError};

const A: &str = "https://avatars.example.com/a";
const B: &str = "https://avatars.example.com/b";
const C: &str = "https://avatars.example.com/c";

fn avatars() -> Arc<ScriptedTransport> {
    Arc::new(ScriptedTransport::new(|request| {
        let shade = request.url.bytes().last().unwrap_or(0);
        Ok(HttpResponse::new(200, png(shade)))
    }))
}

fn cache(transport: &Arc<ScriptedTransport>, capacity: Option<usize>) -> ImageCache<ScriptedTransport> {
    ImageCache::new(
        Arc::clone(transport),
        GithubClient::new(BASE_URL),
        capacity.and_then(NonZeroUsize::new),
    )
}

#[tokio::test]
async fn miss_downloads_then_hit_skips_network() {
    let transport = avatars();
    let cache = cache(&transport, None);

    let first = cache.fetch(A).await.unwrap();
    let second = cache.fetch(A).await.unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(transport.requests()[0].url, A);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!((first.width(), first.height()), (4, 4));
}

#[tokio::test]
async fn get_never_touches_the_network() {
    let transport = avatars();
    let cache = cache(&transport, None);

    assert!(cache.get(A).is_none());
    cache.fetch(A).await.unwrap();
    assert!(cache.get(A).is_some());

    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn failed_download_caches_nothing() {
    let transport = Arc::new(ScriptedTransport::new(|_| Ok(HttpResponse::new(404, "missing"))));
    let cache = cache(&transport, None);

    let err = cache.fetch(A).await.unwrap_err();

    assert_eq!(err, NetworkError::InvalidResponse(404));
    assert!(cache.is_empty());
    assert!(cache.get(A).is_none());

    // A later attempt goes back to the network.
    let _ = cache.fetch(A).await;
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn connection_failure_caches_nothing() {
    let transport = Arc::new(ScriptedTransport::new(|_| {
        Err(NetworkError::Connection("timed out".to_string()))
    }));
    let cache = cache(&transport, None);

    assert!(matches!(cache.fetch(A).await, Err(NetworkError::Connection(_))));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn undecodable_bytes_are_a_decode_error() {
    let transport = Arc::new(ScriptedTransport::new(|_| Ok(HttpResponse::new(200, "<html>nope</html>"))));
    let cache = cache(&transport, None);

    assert!(matches!(cache.fetch(A).await, Err(NetworkError::Decode(_))));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn empty_body_is_reported() {
    let transport = Arc::new(ScriptedTransport::new(|_| Ok(HttpResponse::new(200, Vec::new()))));
    let cache = cache(&transport, None);

    assert_eq!(cache.fetch(A).await.unwrap_err(), NetworkError::EmptyBody);
}

#[tokio::test]
async fn invalid_url_is_rejected_before_the_network() {
    let transport = avatars();
    let cache = cache(&transport, None);

    assert!(matches!(cache.fetch("not a url").await, Err(NetworkError::InvalidUrl(_))));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn unbounded_cache_keeps_everything() {
    let transport = avatars();
    let cache = cache(&transport, None);

    for i in 0..50 {
        cache.fetch(&format!("https://avatars.example.com/{i}")).await.unwrap();
    }

    assert_eq!(cache.len(), 50);
}

#[tokio::test]
async fn capacity_one_keeps_the_latest_entry() {
    let transport = avatars();
    let cache = cache(&transport, Some(1));

    cache.fetch(A).await.unwrap();
    cache.fetch(B).await.unwrap();

    assert_eq!(cache.len(), 1);
    assert!(cache.get(B).is_some());
    assert!(cache.get(A).is_none());
}

#[tokio::test]
async fn bounded_cache_evicts_least_recently_used() {
    let transport = avatars();
    let cache = cache(&transport, Some(2));

    cache.fetch(A).await.unwrap();
    cache.fetch(B).await.unwrap();
    cache.get(A);
    cache.fetch(C).await.unwrap();

    assert!(cache.get(A).is_some());
    assert!(cache.get(B).is_none());
    assert!(cache.get(C).is_some());
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn clear_empties_the_cache() {
    let transport = avatars();
    let cache = cache(&transport, None);
    cache.fetch(A).await.unwrap();

    cache.clear();

    assert!(cache.is_empty());
    cache.fetch(A).await.unwrap();
    assert_eq!(transport.calls(), 2);
}
