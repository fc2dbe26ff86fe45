use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{
    wire::{
        AddEntryRequest, ChatReply, ChatRequest, CredentialsRequest, MessageResponse,
        RemoveEntryRequest, WatchlistResponse,
    },
    Identity, RecommendationResponse, TitleKey, WatchlistEntry, WatchlistStats,
};

use super::catalog;
use super::error::{ApiError, ApiResult};
use super::AppState;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

// Request types

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovieQuery {
    pub movie: Option<String>,
}

/// Session id from the `Cookie` header, if present and well formed
fn session_cookie(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

/// Resolves the caller's session and checks it belongs to `username`
async fn authorize(state: &AppState, headers: &HeaderMap, username: Option<&str>) -> ApiResult<String> {
    let username = username
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing username".to_string()))?;

    let inner = state.inner.read().await;
    match inner.session_user(session_cookie(headers)) {
        Some(owner) if owner == username => Ok(owner.to_string()),
        Some(owner) => {
            tracing::warn!(owner = %owner, requested = %username, "Session does not own watchlist");
            Err(ApiError::Unauthorized("Not allowed to access this watchlist".to_string()))
        }
        None => Err(ApiError::Unauthorized("Login required".to_string())),
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Create an account
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let username = request.username.trim().to_string();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let mut inner = state.inner.write().await;
    if inner.users.contains_key(&username) {
        return Err(ApiError::BadRequest("Username already taken.".to_string()));
    }
    inner.users.insert(username.clone(), request.password);
    tracing::info!(username = %username, "User created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully!")),
    ))
}

/// Check credentials and open a cookie session
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = request.username.trim().to_string();

    let mut inner = state.inner.write().await;
    if inner.users.get(&username) != Some(&request.password) {
        tracing::info!(username = %username, "Rejected login");
        return Err(ApiError::BadRequest(
            "Invalid username or password".to_string(),
        ));
    }

    let session = Uuid::new_v4();
    inner.sessions.insert(session, username.clone());
    tracing::info!(username = %username, "Session opened");

    let cookie = format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly");
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Login successful!")),
    ))
}

/// Close the caller's session, if any
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(session) = session_cookie(&headers) {
        if let Some(username) = state.inner.write().await.sessions.remove(&session) {
            tracing::info!(username = %username, "Session closed");
        }
    }

    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logout successful!")),
    )
}

/// Get a user's watchlist with stats
pub async fn get_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<WatchlistResponse>> {
    let username = authorize(&state, &headers, query.username.as_deref()).await?;

    let inner = state.inner.read().await;
    let watchlist = inner.watchlist(&username).to_vec();

    Ok(Json(WatchlistResponse {
        user: Some(Identity::new(username)),
        stats: WatchlistStats::from_entries(&watchlist),
        watchlist,
    }))
}

/// Add a movie to a user's watchlist
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddEntryRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let username = authorize(&state, &headers, Some(&request.username)).await?;

    let mut entry = WatchlistEntry::from(request.entry);
    entry.title = entry.title.trim().to_string();
    if entry.title.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing username or movie_title".to_string(),
        ));
    }

    let mut inner = state.inner.write().await;
    if inner.position(&username, &entry.key()).is_some() {
        return Err(ApiError::BadRequest("Movie already in watchlist".to_string()));
    }

    if let Some(known) = catalog::find(&inner.catalog, &entry.title) {
        entry.poster_path = entry.poster_path.or_else(|| known.poster_path.clone());
        entry.genres = entry.genres.or_else(|| known.genres.clone());
        entry.overview = entry.overview.or_else(|| known.overview.clone());
    }

    tracing::info!(username = %username, title = %entry.title, status = %entry.status, "Watchlist entry added");
    inner.watchlists.entry(username).or_default().push(entry);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Movie added to watchlist")),
    ))
}

/// Remove a movie from a user's watchlist by title
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RemoveEntryRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let username = authorize(&state, &headers, Some(&request.username)).await?;
    let key = TitleKey::new(&request.movie_title);

    let mut inner = state.inner.write().await;
    let index = inner
        .position(&username, &key)
        .ok_or_else(|| ApiError::NotFound("Movie not in watchlist".to_string()))?;

    if let Some(list) = inner.watchlists.get_mut(&username) {
        list.remove(index);
    }
    tracing::info!(username = %username, title = %key, "Watchlist entry removed");

    Ok(Json(MessageResponse::new("Movie removed from watchlist")))
}

/// Recommendations from every title on a user's watchlist
pub async fn recommend_from_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<RecommendationResponse>> {
    let username = authorize(&state, &headers, query.username.as_deref()).await?;

    let inner = state.inner.read().await;
    let recommendations = catalog::recommend_for_watchlist(&inner.catalog, inner.watchlist(&username));
    let message = recommendations
        .is_empty()
        .then(|| catalog::EMPTY_WATCHLIST_MESSAGE.to_string());

    Ok(Json(RecommendationResponse {
        recommendations,
        message,
    }))
}

/// Recommendations seeded by one title
pub async fn recommendations(
    State(state): State<AppState>,
    Query(query): Query<MovieQuery>,
) -> ApiResult<Json<RecommendationResponse>> {
    let movie = query
        .movie
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing movie parameter".to_string()))?;

    let inner = state.inner.read().await;
    let recommendations = catalog::recommend_for_title(&inner.catalog, &movie)
        .ok_or_else(|| ApiError::NotFound(format!("Movie '{}' not found", movie.trim())))?;

    Ok(Json(RecommendationResponse {
        recommendations,
        message: None,
    }))
}

/// Canned assistant reply
pub async fn chat(Json(request): Json<ChatRequest>) -> Json<ChatReply> {
    Json(ChatReply {
        reply: catalog::chat_reply(&request.message).to_string(),
    })
}
