/// HTTP client for the recommendation service
///
/// Paths follow the service's resource layout:
/// 1. Session: `POST /signup`, `POST /login`, `POST /logout`
/// 2. Watchlist: `GET /watchlist`, `POST /watchlist/add`, `POST /watchlist/remove`
/// 3. Recommendations: `GET /recommend_from_watchlist`, `GET /recommendations`
/// 4. Assistant: `POST /chat`
///
/// The session lives in a cookie, so the underlying client keeps a cookie jar.
use crate::{
    config::Config,
    error::{AppError, AppResult},
    middleware::request_id::REQUEST_ID_HEADER,
    models::{
        wire::{
            AddEntryRequest, ChatReply, ChatRequest, CredentialsRequest, MessageResponse,
            RemoveEntryRequest, WatchlistResponse,
        },
        NewEntry, RecommendationResponse,
    },
    services::providers::RecommendationService,
};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

#[derive(Clone)]
pub struct HttpRecommendationService {
    http_client: HttpClient,
    api_url: String,
}

impl HttpRecommendationService {
    /// Creates a client with a cookie jar and the configured request timeout
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Sends a request tagged with a fresh request ID and maps failures
    async fn send(&self, operation: &'static str, request: RequestBuilder) -> AppResult<Response> {
        let request_id = Uuid::new_v4();
        tracing::debug!(operation, request_id = %request_id, "Remote call");

        let response = request
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        tracing::warn!(
            operation,
            request_id = %request_id,
            status = status.as_u16(),
            message = %message,
            "Remote service rejected request"
        );

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::Unauthorized(message));
        }

        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Reads and decodes a success body; a stalled body is still a timeout
    async fn read_json<T: DeserializeOwned>(
        operation: &'static str,
        response: Response,
    ) -> AppResult<T> {
        response
            .json()
            .await
            .map_err(|e| transport_error(operation, e))
    }

    async fn read_message(operation: &'static str, response: Response) -> AppResult<Option<String>> {
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(operation, e))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let body: MessageResponse = serde_json::from_str(&text)?;
        Ok(body.message)
    }
}

fn transport_error(operation: &'static str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        tracing::warn!(operation, "Remote call timed out");
        AppError::Timeout
    } else {
        tracing::warn!(operation, error = %e, "Remote call failed");
        AppError::HttpClient(e)
    }
}

/// Pulls `message` (or `error`) out of a JSON error body
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["message"]
        .as_str()
        .or_else(|| value["error"].as_str())
        .map(str::to_string)
}

#[async_trait::async_trait]
impl RecommendationService for HttpRecommendationService {
    async fn signup(&self, username: &str, password: &str) -> AppResult<Option<String>> {
        let request = self.http_client.post(self.url("/signup")).json(&CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        });
        let response = self.send("signup", request).await?;
        Self::read_message("signup", response).await
    }

    async fn login(&self, username: &str, password: &str) -> AppResult<Option<String>> {
        let request = self.http_client.post(self.url("/login")).json(&CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        });
        let response = self.send("login", request).await?;
        Self::read_message("login", response).await
    }

    async fn logout(&self) -> AppResult<()> {
        let request = self
            .http_client
            .post(self.url("/logout"))
            .json(&serde_json::json!({}));
        self.send("logout", request).await?;
        Ok(())
    }

    async fn fetch_watchlist(&self, username: &str) -> AppResult<WatchlistResponse> {
        let request = self
            .http_client
            .get(self.url("/watchlist"))
            .query(&[("username", username)]);
        let response = self.send("fetch_watchlist", request).await?;
        let watchlist: WatchlistResponse = Self::read_json("fetch_watchlist", response).await?;

        tracing::info!(
            username = %username,
            entries = watchlist.watchlist.len(),
            service = self.name(),
            "Watchlist fetched"
        );

        Ok(watchlist)
    }

    async fn add_entry(&self, username: &str, entry: NewEntry) -> AppResult<()> {
        let title = entry.title.clone();
        let request = self
            .http_client
            .post(self.url("/watchlist/add"))
            .json(&AddEntryRequest {
                username: username.to_string(),
                entry,
            });
        self.send("add_entry", request).await?;

        tracing::info!(username = %username, title = %title, "Watchlist entry added");
        Ok(())
    }

    async fn remove_entry(&self, username: &str, title: &str) -> AppResult<()> {
        let request = self
            .http_client
            .post(self.url("/watchlist/remove"))
            .json(&RemoveEntryRequest {
                username: username.to_string(),
                movie_title: title.to_string(),
            });
        self.send("remove_entry", request).await?;

        tracing::info!(username = %username, title = %title, "Watchlist entry removed");
        Ok(())
    }

    async fn recommend_from_watchlist(&self, username: &str) -> AppResult<RecommendationResponse> {
        let request = self
            .http_client
            .get(self.url("/recommend_from_watchlist"))
            .query(&[("username", username)]);
        let response = self.send("recommend_from_watchlist", request).await?;
        let recommendations: RecommendationResponse = Self::read_json("recommend_from_watchlist", response).await?;

        tracing::info!(
            username = %username,
            results = recommendations.recommendations.len(),
            service = self.name(),
            "Watchlist recommendations fetched"
        );

        Ok(recommendations)
    }

    async fn recommend_for_title(&self, title: &str) -> AppResult<RecommendationResponse> {
        let request = self
            .http_client
            .get(self.url("/recommendations"))
            .query(&[("movie", title)]);
        let response = self.send("recommend_for_title", request).await?;
        let recommendations: RecommendationResponse = Self::read_json("recommend_for_title", response).await?;

        tracing::info!(
            seed = %title,
            results = recommendations.recommendations.len(),
            service = self.name(),
            "Title recommendations fetched"
        );

        Ok(recommendations)
    }

    async fn chat(&self, message: &str) -> AppResult<String> {
        let request = self.http_client.post(self.url("/chat")).json(&ChatRequest {
            message: message.to_string(),
        });
        let response = self.send("chat", request).await?;
        let reply: ChatReply = Self::read_json("chat", response).await?;
        Ok(reply.reply)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
