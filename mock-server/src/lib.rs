//! In-memory stand-in for the slice of the GitHub users API the client
//! core consumes: user profiles, paginated follower lists and avatar images.

use std::{collections::HashMap, io::Cursor, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

pub const DEFAULT_PER_PAGE: usize = 30;
pub const MAX_PER_PAGE: usize = 100;

/// Avatar login whose image endpoint answers 200 with bytes that are not an image.
pub const BROKEN_AVATAR: &str = "broken";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Follower {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
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
    pub created_at: String,
}

#[derive(Clone, Debug)]
pub struct Account {
    pub user: User,
    pub followers: Vec<Follower>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub per_page: Option<usize>,
    pub page: Option<usize>,
}

pub type Db = Arc<RwLock<HashMap<String, Account>>>;

/// Build an account named `login` with `follower_count` generated followers
/// (`follower-001`, `follower-002`, ...).
pub fn account(base_url: &str, login: &str, follower_count: usize) -> Account {
    let followers: Vec<Follower> = (1..=follower_count)
        .map(|i| {
            let login = format!("follower-{i:03}");
            Follower {
                avatar_url: format!("{base_url}/avatars/{login}"),
                login,
            }
        })
        .collect();
    let user = User {
        login: login.to_string(),
        avatar_url: format!("{base_url}/avatars/{login}"),
        name: None,
        location: None,
        bio: None,
        public_repos: 0,
        public_gists: 0,
        html_url: format!("https://github.com/{login}"),
        following: 0,
        followers: followers.len() as u32,
        followers_url: format!("{base_url}/users/{login}/followers"),
        created_at: "2011-01-25T18:44:36Z".to_string(),
    };
    Account { user, followers }
}

/// Accounts every fresh server starts with:
/// - `octocat`: 237 followers, full profile;
/// - `mojombo`: 3 followers;
/// - `lonely`: no followers.
pub fn seed(base_url: &str) -> Db {
    let mut octocat = account(base_url, "octocat", 237);
    octocat.user.name = Some("The Octocat".to_string());
    octocat.user.location = Some("San Francisco".to_string());
    octocat.user.public_repos = 8;
    octocat.user.public_gists = 8;
    octocat.user.following = 9;

    let mut accounts = HashMap::new();
    for account in [
        octocat,
        account(base_url, "mojombo", 3),
        account(base_url, "lonely", 0),
    ] {
        accounts.insert(account.user.login.clone(), account);
    }
    Arc::new(RwLock::new(accounts))
}

pub fn app() -> Router {
    app_with(seed("http://localhost:3000"))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/users/{username}", get(get_user))
        .route("/users/{username}/followers", get(list_followers))
        .route("/avatars/{login}", get(get_avatar))
        .with_state(db)
}

/// Serve on `listener`, with avatar URLs pointing back at its address.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    let base_url = format!("http://{}", listener.local_addr()?);
    let app = app_with(seed(&base_url)).layer(TraceLayer::new_for_http());
    axum::serve(listener, app).await
}

/// A small solid-colour PNG whose colour depends on `login`.
pub fn avatar_png(login: &str) -> Result<Vec<u8>, image::ImageError> {
    let shade = login.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
    let pixels = image::RgbaImage::from_pixel(8, 8, image::Rgba([shade, 128, 255 - shade, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(pixels)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            message: "Not Found".to_string(),
        }),
    )
}

async fn get_user(
    State(db): State<Db>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    let accounts = db.read().await;
    let account = accounts.get(&username).ok_or_else(not_found)?;
    Ok(Json(account.user.clone()))
}

async fn list_followers(
    State(db): State<Db>,
    Path(username): Path<String>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<Follower>>, ApiError> {
    let accounts = db.read().await;
    let account = accounts.get(&username).ok_or_else(not_found)?;

    let per_page = pagination
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let page = pagination.page.unwrap_or(1).max(1);
    let start = (page - 1).saturating_mul(per_page);

    Ok(Json(
        account
            .followers
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect(),
    ))
}

async fn get_avatar(Path(login): Path<String>) -> Response {
    if login == BROKEN_AVATAR {
        return ([(header::CONTENT_TYPE, "image/png")], "not an image").into_response();
    }
    match avatar_png(&login) {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) => {
            tracing::error!(login = %login, error = %e, "failed to render avatar");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
