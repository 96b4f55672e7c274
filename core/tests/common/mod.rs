//! Scripted transports and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use ghfollowers_core::{
    Follower, FollowerService, GithubClient, HttpRequest, HttpResponse, NetworkError, Transport,
};
use tokio::sync::Semaphore;
use url::Url;

pub const BASE_URL: &str = "https://api.github.com";

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, NetworkError> + Send + Sync>;

/// Answers every request with `handler` and records what it was asked.
///
/// A gated transport records the request, then waits for a permit from
/// `release` before answering, which lets a test hold a fetch in flight.
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
    gate: Option<Semaphore>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, NetworkError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, NetworkError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(handler)
        }
    }

    pub fn release(&self, permits: usize) {
        self.gate
            .as_ref()
            .expect("transport is not gated")
            .add_permits(permits);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        (self.handler)(&request)
    }
}

pub fn service(transport: &Arc<ScriptedTransport>) -> FollowerService<ScriptedTransport> {
    FollowerService::new(Arc::clone(transport), GithubClient::new(BASE_URL))
}

/// The `page` query parameter of a followers request.
pub fn page_of(request: &HttpRequest) -> u32 {
    let url = Url::parse(&request.url).unwrap();
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
        .expect("request has no page parameter")
}

/// JSON body of one followers page with `size` entries.
pub fn follower_page(page: u32, size: usize) -> String {
    let followers: Vec<Follower> = (0..size)
        .map(|i| {
            Follower::new(
                format!("user-{page}-{i}"),
                format!("https://avatars.example.com/{page}/{i}"),
            )
        })
        .collect();
    serde_json::to_string(&followers).unwrap()
}

/// Handler serving pages of the given sizes; pages past the end are empty.
pub fn paged(
    sizes: Vec<usize>,
) -> impl Fn(&HttpRequest) -> Result<HttpResponse, NetworkError> + Send + Sync + 'static {
    move |request| {
        let page = page_of(request);
        let size = sizes.get(page as usize - 1).copied().unwrap_or(0);
        Ok(HttpResponse::new(200, follower_page(page, size)))
    }
}

/// PNG-encoded 4x4 image of a single colour.
pub fn png(shade: u8) -> Vec<u8> {
    let pixels = image::RgbaImage::from_pixel(4, 4, image::Rgba([shade, shade, shade, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(pixels)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub const OCTOCAT_JSON: &str = r#"{
    "login": "octocat",
    "id": 583231,
    "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
    "html_url": "https://github.com/octocat",
    "followers_url": "https://api.github.com/users/octocat/followers",
    "type": "User",
    "name": "The Octocat",
    "company": "@github",
    "location": "San Francisco",
    "bio": null,
    "public_repos": 8,
    "public_gists": 8,
    "followers": 3938,
    "following": 9,
    "created_at": "2011-01-25T18:44:36Z",
    "updated_at": "2023-04-22T12:13:44Z"
}"#;
